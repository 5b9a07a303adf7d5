//! [`Listable`] — the items a paginated list read can return.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::{
  activity::Activity,
  conversation::{Conversation, ItemList, Participant},
  encryption::Encryptor,
  normalize::Normalizer,
};

/// A list page as returned by the backend.
pub type Page<T> = ItemList<T>;

/// An item the list pipeline can order, decrypt, and normalise.
pub trait Listable: DeserializeOwned + Send + Sync {
  fn published(&self) -> Option<DateTime<Utc>>;

  /// Participants whose identities should be recorded.
  fn participants(&self) -> &[Participant];

  fn decrypt<'a, E: Encryptor>(
    &'a mut self,
    encryptor: &'a E,
  ) -> impl Future<Output = Result<(), E::Error>> + Send + 'a;

  fn normalize<'a, N: Normalizer>(
    &'a mut self,
    normalizer: &'a N,
  ) -> impl Future<Output = Result<(), N::Error>> + Send + 'a;
}

impl Listable for Activity {
  fn published(&self) -> Option<DateTime<Utc>> { self.published }

  fn participants(&self) -> &[Participant] { &[] }

  fn decrypt<'a, E: Encryptor>(
    &'a mut self,
    encryptor: &'a E,
  ) -> impl Future<Output = Result<(), E::Error>> + Send + 'a {
    encryptor.decrypt_activity(self)
  }

  fn normalize<'a, N: Normalizer>(
    &'a mut self,
    normalizer: &'a N,
  ) -> impl Future<Output = Result<(), N::Error>> + Send + 'a {
    normalizer.normalize_activity(self)
  }
}

impl Listable for Conversation {
  fn published(&self) -> Option<DateTime<Utc>> { self.published }

  fn participants(&self) -> &[Participant] { Conversation::participants(self) }

  fn decrypt<'a, E: Encryptor>(
    &'a mut self,
    encryptor: &'a E,
  ) -> impl Future<Output = Result<(), E::Error>> + Send + 'a {
    encryptor.decrypt_conversation(self)
  }

  fn normalize<'a, N: Normalizer>(
    &'a mut self,
    normalizer: &'a N,
  ) -> impl Future<Output = Result<(), N::Error>> + Send + 'a {
    normalizer.normalize_conversation(self)
  }
}
