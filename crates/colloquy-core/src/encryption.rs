//! The encryption / key-management collaborator.
//!
//! This layer performs no cryptography itself. It asks the collaborator for
//! keys, hands it items to decrypt in place, and routes encrypted downloads
//! through it.

use std::future::Future;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{activity::Activity, conversation::Conversation};

/// An encryption key issued by the key-management service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
  pub uri: String,
}

/// The key service answers a request for keys with either one key or a
/// batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBatch {
  One(Key),
  Many(Vec<Key>),
}

impl KeyBatch {
  pub fn into_first(self) -> Option<Key> {
    match self {
      Self::One(key) => Some(key),
      Self::Many(keys) => keys.into_iter().next(),
    }
  }
}

/// Opaque secure-content reference attached to an encrypted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecureContentRef(pub Value);

/// Download progress, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
  pub loaded: u64,
  pub total:  Option<u64>,
}

pub type ProgressSender = tokio::sync::mpsc::UnboundedSender<DownloadProgress>;

/// A downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
  pub name:      Option<String>,
  pub mime_type: Option<String>,
  pub bytes:     Bytes,
}

impl DownloadedFile {
  pub fn new(bytes: Bytes) -> Self {
    Self {
      name: None,
      mime_type: None,
      bytes,
    }
  }
}

/// Abstraction over the encryption and key-management subsystem.
pub trait Encryptor: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Request `count` keys not yet bound to any resource.
  fn create_unbound_keys(
    &self,
    count: usize,
  ) -> impl Future<Output = Result<KeyBatch, Self::Error>> + Send + '_;

  /// Decrypt an activity in place.
  fn decrypt_activity<'a>(
    &'a self,
    activity: &'a mut Activity,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Decrypt a conversation (and any activities it carries) in place.
  fn decrypt_conversation<'a>(
    &'a self,
    conversation: &'a mut Conversation,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Download and decrypt secure content.
  fn download<'a>(
    &'a self,
    scr: &'a SecureContentRef,
    progress: Option<&'a ProgressSender>,
  ) -> impl Future<Output = Result<DownloadedFile, Self::Error>> + Send + 'a;
}
