//! The Colloquy conversation activity layer.
//!
//! [`ConversationClient`] turns a caller's intent ("post a message", "add a
//! participant", "rotate the key") into a canonical activity, binds it to
//! the conversation's key state, submits it, and reconciles the lists the
//! backend returns. Transport, encryption, identity, and normalisation are
//! injected collaborators.
//!
//! ```rust,ignore
//! let client = ConversationClient::new(transport, encryptor, identity, normalizer, config);
//! let mut conversation = Conversation::from_id(id);
//! client.post(&mut conversation, "hello", None).await?;
//! ```

pub mod builder;
pub mod config;
pub mod download;
pub mod gateway;
pub mod http;
pub mod keys;
pub mod lookup;
pub mod normalizer;
pub mod one_on_one;
pub mod reconcile;
pub mod resolver;
pub mod share;
pub mod verbs;

#[cfg(test)]
mod fakes;

pub use colloquy_core::{Error, Result};
pub use config::{ClientConfig, Diagnostics};

use colloquy_core::{
  encryption::Encryptor,
  identity::IdentityResolver,
  normalize::Normalizer,
  transport::Transport,
};

use builder::ActivityBuilder;
use gateway::SubmissionGateway;
use keys::KeyManager;
use one_on_one::OneOnOneCoordinator;
use reconcile::ListReconciler;
use resolver::ConversationResolver;

/// Entry point for every conversation operation.
pub struct ConversationClient<T, E, I, N> {
  transport:  T,
  encryptor:  E,
  identity:   I,
  normalizer: N,
  config:     ClientConfig,
}

impl<T, E, I, N> ConversationClient<T, E, I, N>
where
  T: Transport,
  E: Encryptor,
  I: IdentityResolver,
  N: Normalizer,
{
  pub fn new(transport: T, encryptor: E, identity: I, normalizer: N, config: ClientConfig) -> Self {
    Self {
      transport,
      encryptor,
      identity,
      normalizer,
      config,
    }
  }

  // ── Components ────────────────────────────────────────────────────────

  pub fn builder(&self) -> ActivityBuilder { ActivityBuilder::new(self.identity.current_user_id()) }

  pub fn gateway(&self) -> SubmissionGateway<'_, T> { SubmissionGateway::new(&self.transport) }

  pub fn resolver(&self) -> ConversationResolver<'_, I> {
    ConversationResolver::new(&self.identity, &self.config.diagnostics)
  }

  pub fn keys(&self) -> KeyManager<'_, E, T> {
    KeyManager::new(&self.encryptor, self.builder(), self.gateway())
  }

  pub fn reconciler(&self) -> ListReconciler<'_, T, E, I, N> {
    ListReconciler::new(&self.transport, &self.encryptor, &self.identity, &self.normalizer)
  }

  pub fn one_on_one(&self) -> OneOnOneCoordinator<'_, T, E, I, N> { OneOnOneCoordinator::new(self) }

  // ── Collaborators ─────────────────────────────────────────────────────

  pub fn transport(&self) -> &T { &self.transport }

  pub fn encryptor(&self) -> &E { &self.encryptor }

  pub fn identity(&self) -> &I { &self.identity }

  pub fn normalizer(&self) -> &N { &self.normalizer }

  pub fn config(&self) -> &ClientConfig { &self.config }
}
