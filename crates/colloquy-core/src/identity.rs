//! The identity collaborator: turns caller-supplied references (email
//! addresses, ids) into opaque user ids and knows where services live.

use std::future::Future;

use uuid::Uuid;

use crate::conversation::Participant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
  /// Create an identity when the reference is not yet known.
  pub create: bool,
}

pub trait IdentityResolver: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The id of the user this client acts as.
  fn current_user_id(&self) -> Uuid;

  fn resolve_id<'a>(
    &'a self,
    reference: &'a str,
    options: ResolveOptions,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + 'a;

  /// Remember a participant seen in a backend response.
  fn record_identity<'a>(
    &'a self,
    participant: &'a Participant,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Base url of a named service, e.g. [`CONVERSATION_SERVICE`].
  ///
  /// [`CONVERSATION_SERVICE`]: crate::transport::CONVERSATION_SERVICE
  fn service_base_url<'a>(
    &'a self,
    service: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
