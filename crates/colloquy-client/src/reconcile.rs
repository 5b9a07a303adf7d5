//! [`ListReconciler`] reads list pages and prepares their items for display.

use colloquy_core::{
  Error, Result,
  encryption::Encryptor,
  identity::IdentityResolver,
  listing::{Listable, Page},
  normalize::Normalizer,
  transport::{Query, Request, Resource, Target, Transport},
};
use futures::future::try_join_all;

/// Flags every list read carries unless the caller overrides them.
pub fn list_defaults() -> Query {
  Query::new()
    .with("personRefresh", true)
    .with("uuidEntryFormat", true)
    .with("activitiesLimit", 0)
    .with("participantsLimit", 0)
}

/// Put a page in ascending `published` order.
///
/// The backend returns pages fully sorted in one direction or the other, so
/// comparing the two ends is enough. Returns whether the page was reversed.
pub fn order_chronologically<L: Listable>(items: &mut [L]) -> bool {
  let reversed = match (items.first(), items.last()) {
    (Some(first), Some(last)) => {
      matches!((first.published(), last.published()), (Some(f), Some(l)) if l < f)
    }
    _ => false,
  };
  if reversed {
    items.reverse();
  }
  reversed
}

pub struct ListReconciler<'a, T, E, I, N> {
  transport:  &'a T,
  encryptor:  &'a E,
  identity:   &'a I,
  normalizer: &'a N,
}

impl<'a, T, E, I, N> ListReconciler<'a, T, E, I, N>
where
  T: Transport,
  E: Encryptor,
  I: IdentityResolver,
  N: Normalizer,
{
  pub fn new(transport: &'a T, encryptor: &'a E, identity: &'a I, normalizer: &'a N) -> Self {
    Self {
      transport,
      encryptor,
      identity,
      normalizer,
    }
  }

  /// Read one page of `resource`. Every item is decrypted, has its
  /// participants recorded, and is normalised; items run concurrently but
  /// keep their position. Any item failing fails the whole read.
  pub async fn list<L: Listable>(&self, resource: Resource, query: Query) -> Result<Vec<L>> {
    let request =
      Request::get(Target::conversation(resource)).with_query(query.over(list_defaults()));
    let body = self.transport.send(request).await?;
    if body.is_null() {
      return Ok(Vec::new());
    }

    let Page { mut items } = serde_json::from_value::<Page<L>>(body)?;
    if items.is_empty() {
      return Ok(items);
    }

    let reversed = order_chronologically(&mut items);
    tracing::debug!(?resource, count = items.len(), reversed, "reconciling list page");

    try_join_all(items.iter_mut().map(|item| self.process(item))).await?;
    Ok(items)
  }

  /// Decrypt, record identities, normalise.
  pub async fn process<L: Listable>(&self, item: &mut L) -> Result<()> {
    item.decrypt(self.encryptor).await.map_err(Error::encryption)?;
    record_identities(self.identity, item.participants()).await?;
    item.normalize(self.normalizer).await.map_err(Error::normalize)?;
    Ok(())
  }
}

pub(crate) async fn record_identities<I: IdentityResolver>(
  identity: &I,
  participants: &[colloquy_core::conversation::Participant],
) -> Result<()> {
  try_join_all(participants.iter().map(|p| identity.record_identity(p)))
    .await
    .map_err(Error::identity)?;
  Ok(())
}
