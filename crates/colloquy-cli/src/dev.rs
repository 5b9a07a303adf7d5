//! Development collaborators: a static directory for identity and an
//! encryptor for backends that store plaintext.

use std::{collections::BTreeMap, sync::Mutex};

use colloquy_core::{
  activity::Activity,
  conversation::{Conversation, Participant},
  encryption::{DownloadedFile, Encryptor, Key, KeyBatch, ProgressSender, SecureContentRef},
  identity::{IdentityResolver, ResolveOptions},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DevError {
  #[error("no user known as `{0}`")]
  UnknownUser(String),

  #[error("no base url configured for service `{0}`")]
  UnknownService(String),

  #[error("encrypted content cannot be downloaded without a key service")]
  EncryptedContent,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Resolves references against the configured directory. Unknown people
/// are minted a fresh id for the rest of the session when creation is
/// allowed.
pub struct DirectoryIdentity {
  me:        Uuid,
  directory: Mutex<BTreeMap<String, Uuid>>,
  services:  BTreeMap<String, String>,
}

impl DirectoryIdentity {
  pub fn new(me: Uuid, directory: BTreeMap<String, Uuid>, services: BTreeMap<String, String>) -> Self {
    Self {
      me,
      directory: Mutex::new(directory),
      services,
    }
  }

  fn directory(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Uuid>> {
    // A poisoned directory is still a consistent map.
    self.directory.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl IdentityResolver for DirectoryIdentity {
  type Error = DevError;

  fn current_user_id(&self) -> Uuid { self.me }

  async fn resolve_id<'a>(&'a self, reference: &'a str, options: ResolveOptions) -> Result<Uuid, DevError> {
    if let Ok(id) = Uuid::parse_str(reference) {
      return Ok(id);
    }
    let key = reference.to_lowercase();
    let mut directory = self.directory();
    if let Some(id) = directory.get(&key) {
      return Ok(*id);
    }
    if !options.create {
      return Err(DevError::UnknownUser(reference.to_owned()));
    }
    let id = Uuid::new_v4();
    tracing::info!(%reference, %id, "minted identity");
    directory.insert(key, id);
    Ok(id)
  }

  async fn record_identity<'a>(&'a self, participant: &'a Participant) -> Result<(), DevError> {
    if let Some(email) = &participant.email_address {
      self.directory().insert(email.to_lowercase(), participant.id);
    }
    Ok(())
  }

  async fn service_base_url<'a>(&'a self, service: &'a str) -> Result<String, DevError> {
    self
      .services
      .get(service)
      .cloned()
      .ok_or_else(|| DevError::UnknownService(service.to_owned()))
  }
}

// ─── Encryption ──────────────────────────────────────────────────────────────

/// Issues placeholder keys and leaves content untouched.
pub struct PlaintextEncryptor;

impl Encryptor for PlaintextEncryptor {
  type Error = DevError;

  async fn create_unbound_keys(&self, count: usize) -> Result<KeyBatch, DevError> {
    let keys = (0..count.max(1))
      .map(|_| Key {
        uri: format!("kms://local/keys/{}", Uuid::new_v4()),
      })
      .collect();
    Ok(KeyBatch::Many(keys))
  }

  async fn decrypt_activity<'a>(&'a self, _: &'a mut Activity) -> Result<(), DevError> { Ok(()) }

  async fn decrypt_conversation<'a>(&'a self, _: &'a mut Conversation) -> Result<(), DevError> { Ok(()) }

  async fn download<'a>(
    &'a self,
    _: &'a SecureContentRef,
    _: Option<&'a ProgressSender>,
  ) -> Result<DownloadedFile, DevError> {
    Err(DevError::EncryptedContent)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn identity() -> DirectoryIdentity {
    let ada = Uuid::new_v4();
    DirectoryIdentity::new(
      Uuid::new_v4(),
      [("ada@example.com".to_owned(), ada)].into(),
      [("conversation".to_owned(), "https://conv.example.com/api".to_owned())].into(),
    )
  }

  #[tokio::test]
  async fn directory_lookups_ignore_case() {
    let identity = identity();
    let id = identity
      .resolve_id("Ada@Example.com", ResolveOptions::default())
      .await
      .unwrap();
    assert_eq!(Some(&id), identity.directory().get("ada@example.com"));
  }

  #[tokio::test]
  async fn unknown_people_are_minted_only_on_request() {
    let identity = identity();
    let err = identity
      .resolve_id("grace@example.com", ResolveOptions::default())
      .await
      .unwrap_err();
    assert!(matches!(err, DevError::UnknownUser(_)));

    let minted = identity
      .resolve_id("grace@example.com", ResolveOptions { create: true })
      .await
      .unwrap();
    let again = identity
      .resolve_id("grace@example.com", ResolveOptions::default())
      .await
      .unwrap();
    assert_eq!(minted, again);
  }

  #[tokio::test]
  async fn services_come_from_configuration() {
    let identity = identity();
    assert_eq!(
      identity.service_base_url("conversation").await.unwrap(),
      "https://conv.example.com/api"
    );
    assert!(identity.service_base_url("files").await.is_err());
  }

  #[tokio::test]
  async fn plaintext_keys_are_issued_one_per_request() {
    let batch = PlaintextEncryptor.create_unbound_keys(1).await.unwrap();
    assert!(batch.into_first().unwrap().uri.starts_with("kms://local/keys/"));
  }
}
