//! The normaliser collaborator derives display-ready fields on decrypted
//! items.

use std::future::Future;

use crate::{activity::Activity, conversation::Conversation};

pub trait Normalizer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn normalize_activity<'a>(
    &'a self,
    activity: &'a mut Activity,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn normalize_conversation<'a>(
    &'a self,
    conversation: &'a mut Conversation,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
