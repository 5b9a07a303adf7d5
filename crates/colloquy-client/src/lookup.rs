//! Single-conversation reads and the list entry points.

use colloquy_core::{
  Error, Result,
  activity::{Activity, ActivityEvent},
  conversation::Conversation,
  encryption::Encryptor,
  identity::{IdentityResolver, ResolveOptions},
  listing::Listable,
  normalize::Normalizer,
  transport::{Query, Request, Resource, Target, Transport},
};
use uuid::Uuid;

use crate::{ConversationClient, reconcile::record_identities};

/// Flags a single-conversation read carries unless overridden.
pub fn get_defaults() -> Query {
  Query::new()
    .with("uuidEntryFormat", true)
    .with("personRefresh", true)
    .with("activitiesLimit", 0)
    .with("includeParticipants", false)
}

impl<T, E, I, N> ConversationClient<T, E, I, N>
where
  T: Transport,
  E: Encryptor,
  I: IdentityResolver,
  N: Normalizer,
{
  /// Read a conversation by its url (inferred from its id if needed).
  pub async fn get(&self, conversation: &mut Conversation, query: Query) -> Result<Conversation> {
    self.resolver().resolve(conversation).await?;
    let url = conversation
      .url
      .clone()
      .ok_or_else(|| Error::validation("conversation has neither `id` nor `url`"))?;
    self.fetch(Target::Uri(url), query).await
  }

  /// Read the conversation shared with `user`, whatever kind of reference
  /// that is.
  pub async fn get_by_user(&self, user: &str, query: Query) -> Result<Conversation> {
    let id = self
      .identity()
      .resolve_id(user, ResolveOptions::default())
      .await
      .map_err(Error::identity)?;
    self.get_by_user_id(id, query).await
  }

  pub async fn get_by_user_id(&self, id: Uuid, query: Query) -> Result<Conversation> {
    self
      .fetch(Target::conversation(Resource::ConversationsForUser(id)), query)
      .await
  }

  async fn fetch(&self, target: Target, query: Query) -> Result<Conversation> {
    let request = Request::get(target).with_query(query.over(get_defaults()));
    let body = self.transport().send(request).await?;
    let conversation: Conversation = serde_json::from_value(body)?;
    record_identities(self.identity(), conversation.participants()).await?;
    Ok(conversation)
  }

  // ── Lists ─────────────────────────────────────────────────────────────

  pub async fn list(&self, query: Query) -> Result<Vec<Conversation>> {
    self.list_resource(Resource::Conversations, query).await
  }

  /// Conversations the caller has left.
  pub async fn list_left(&self, query: Query) -> Result<Vec<Conversation>> {
    self.list_resource(Resource::ConversationsLeft, query).await
  }

  pub async fn list_activities(&self, query: Query) -> Result<Vec<Activity>> {
    self.list_resource(Resource::Activities, query).await
  }

  pub async fn list_mentions(&self, query: Query) -> Result<Vec<Activity>> {
    self.list_resource(Resource::Mentions, query).await
  }

  async fn list_resource<L: Listable>(&self, resource: Resource, query: Query) -> Result<Vec<L>> {
    self.reconciler().list(resource, query).await
  }

  /// Decrypt and normalise an activity pushed outside of a list read.
  pub async fn process_activity_event(&self, mut event: ActivityEvent) -> Result<ActivityEvent> {
    self
      .encryptor()
      .decrypt_activity(&mut event.activity)
      .await
      .map_err(Error::encryption)?;
    self
      .normalizer()
      .normalize_activity(&mut event.activity)
      .await
      .map_err(Error::normalize)?;
    Ok(event)
  }
}
