//! In-memory collaborators for unit tests.

use std::{
  collections::BTreeMap,
  convert::Infallible,
  io,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use bytes::Bytes;
use chrono::Utc;
use colloquy_core::{
  activity::Activity,
  conversation::{Conversation, Participant},
  encryption::{DownloadProgress, DownloadedFile, Encryptor, Key, KeyBatch, ProgressSender, SecureContentRef},
  identity::{IdentityResolver, ResolveOptions},
  normalize::Normalizer,
  transport::{Request, Transport, TransportError},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{ClientConfig, ConversationClient};

pub const BASE_URL: &str = "https://conv.example.com/conversation/api/v1";

// ─── Transport ───────────────────────────────────────────────────────────────

type Responder = Box<dyn Fn(&Request) -> Result<Value, TransportError> + Send + Sync>;

/// Answers every request with a closure and keeps a log of what was sent.
pub struct FakeTransport {
  respond:  Responder,
  requests: Mutex<Vec<Request>>,
  files:    BTreeMap<String, Bytes>,
}

impl FakeTransport {
  pub fn new(
    respond: impl Fn(&Request) -> Result<Value, TransportError> + Send + Sync + 'static,
  ) -> Self {
    Self {
      respond:  Box::new(respond),
      requests: Mutex::new(Vec::new()),
      files:    BTreeMap::new(),
    }
  }

  pub fn with_file(mut self, url: &str, bytes: &'static [u8]) -> Self {
    self.files.insert(url.to_owned(), Bytes::from_static(bytes));
    self
  }

  pub fn requests(&self) -> Vec<Request> { self.requests.lock().unwrap().clone() }
}

/// Persist whatever was posted: the body comes back with an id and a
/// publication time.
pub fn echo_activity(request: &Request) -> Result<Value, TransportError> {
  let mut body = request.body.clone().unwrap_or_else(|| json!({}));
  body["id"] = json!(Uuid::new_v4().to_string());
  body["published"] = json!(Utc::now());
  Ok(body)
}

impl Transport for FakeTransport {
  async fn send(&self, request: Request) -> Result<Value, TransportError> {
    let response = (self.respond)(&request);
    self.requests.lock().unwrap().push(request);
    response
  }

  async fn download(
    &self,
    uri: &str,
    progress: Option<&ProgressSender>,
  ) -> Result<Bytes, TransportError> {
    let bytes = self
      .files
      .get(uri)
      .cloned()
      .ok_or_else(|| TransportError::with_status(404, uri.to_owned()))?;
    if let Some(progress) = progress {
      let len = bytes.len() as u64;
      let _ = progress.send(DownloadProgress {
        loaded: len,
        total:  Some(len),
      });
    }
    Ok(bytes)
  }
}

// ─── Encryption ──────────────────────────────────────────────────────────────

/// Marks items as decrypted and hands out numbered keys.
#[derive(Default)]
pub struct FakeEncryptor {
  batches:      bool,
  slow:         bool,
  failing_on:   Option<String>,
  key_requests: Mutex<Vec<usize>>,
  decrypted:    Mutex<Vec<String>>,
}

impl FakeEncryptor {
  pub fn new() -> Self { Self::default() }

  /// Answer key requests with a batch of two rather than a single key.
  pub fn issuing_batches(mut self) -> Self {
    self.batches = true;
    self
  }

  /// Activity `n` takes `(4 - n) * 10ms` to decrypt.
  pub fn slower_for_lower_ids(mut self) -> Self {
    self.slow = true;
    self
  }

  pub fn failing_on(mut self, id: &str) -> Self {
    self.failing_on = Some(id.to_owned());
    self
  }

  pub fn key_requests(&self) -> Vec<usize> { self.key_requests.lock().unwrap().clone() }

  /// Ids of decrypted activities, in completion order.
  pub fn decrypted(&self) -> Vec<String> { self.decrypted.lock().unwrap().clone() }
}

impl Encryptor for FakeEncryptor {
  type Error = io::Error;

  async fn create_unbound_keys(&self, count: usize) -> Result<KeyBatch, io::Error> {
    let n = {
      let mut requests = self.key_requests.lock().unwrap();
      requests.push(count);
      requests.len()
    };
    if self.batches {
      let keys = (0..count.max(2))
        .map(|i| Key { uri: format!("kms://keys/{n}-{i}") })
        .collect();
      return Ok(KeyBatch::Many(keys));
    }
    Ok(KeyBatch::One(Key { uri: format!("kms://keys/{n}") }))
  }

  async fn decrypt_activity<'a>(&'a self, activity: &'a mut Activity) -> Result<(), io::Error> {
    let id = activity.id.clone().unwrap_or_default();
    if self.slow {
      let n: u64 = id.parse().unwrap_or(0);
      tokio::time::sleep(Duration::from_millis(4u64.saturating_sub(n) * 10)).await;
    }
    if self.failing_on.as_deref() == Some(id.as_str()) {
      return Err(io::Error::other(format!("cannot decrypt {id}")));
    }
    activity.extra.insert("decrypted".into(), json!(true));
    self.decrypted.lock().unwrap().push(id);
    Ok(())
  }

  async fn decrypt_conversation<'a>(&'a self, conversation: &'a mut Conversation) -> Result<(), io::Error> {
    if let Some(activities) = &mut conversation.activities {
      for activity in &mut activities.items {
        self.decrypt_activity(activity).await?;
      }
    }
    conversation.extra.insert("decrypted".into(), json!(true));
    Ok(())
  }

  async fn download<'a>(
    &'a self,
    scr: &'a SecureContentRef,
    progress: Option<&'a ProgressSender>,
  ) -> Result<DownloadedFile, io::Error> {
    let plaintext = scr.0["plaintext"].as_str().unwrap_or_default().to_owned();
    if let Some(progress) = progress {
      let len = plaintext.len() as u64;
      let _ = progress.send(DownloadProgress {
        loaded: len,
        total:  Some(len),
      });
    }
    Ok(DownloadedFile::new(Bytes::from(plaintext)))
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Uuid references pass through; other references are looked up in a table
/// and minted on demand when creation is allowed.
pub struct FakeIdentity {
  me:               Uuid,
  known:            Mutex<BTreeMap<String, Uuid>>,
  recorded:         Mutex<Vec<Uuid>>,
  base_url_lookups: AtomicUsize,
}

impl FakeIdentity {
  pub fn new() -> Self {
    Self {
      me:               Uuid::new_v4(),
      known:            Mutex::new(BTreeMap::new()),
      recorded:         Mutex::new(Vec::new()),
      base_url_lookups: AtomicUsize::new(0),
    }
  }

  pub fn knowing(self, reference: &str, id: Uuid) -> Self {
    self.known.lock().unwrap().insert(reference.to_owned(), id);
    self
  }

  /// The id `reference` resolved to, if it ever did.
  pub fn id_of(&self, reference: &str) -> Option<Uuid> {
    self.known.lock().unwrap().get(reference).copied()
  }

  pub fn recorded(&self) -> Vec<Uuid> { self.recorded.lock().unwrap().clone() }

  pub fn base_url_lookups(&self) -> usize { self.base_url_lookups.load(Ordering::SeqCst) }
}

impl IdentityResolver for FakeIdentity {
  type Error = io::Error;

  fn current_user_id(&self) -> Uuid { self.me }

  async fn resolve_id<'a>(&'a self, reference: &'a str, options: ResolveOptions) -> Result<Uuid, io::Error> {
    if let Ok(id) = Uuid::parse_str(reference) {
      return Ok(id);
    }
    let mut known = self.known.lock().unwrap();
    if let Some(id) = known.get(reference) {
      return Ok(*id);
    }
    if !options.create {
      return Err(io::Error::new(io::ErrorKind::NotFound, format!("unknown user {reference}")));
    }
    let id = Uuid::new_v4();
    known.insert(reference.to_owned(), id);
    Ok(id)
  }

  async fn record_identity<'a>(&'a self, participant: &'a Participant) -> Result<(), io::Error> {
    self.recorded.lock().unwrap().push(participant.id);
    Ok(())
  }

  async fn service_base_url<'a>(&'a self, _service: &'a str) -> Result<String, io::Error> {
    self.base_url_lookups.fetch_add(1, Ordering::SeqCst);
    Ok(BASE_URL.to_owned())
  }
}

// ─── Normalisation ───────────────────────────────────────────────────────────

pub struct FakeNormalizer;

impl Normalizer for FakeNormalizer {
  type Error = Infallible;

  async fn normalize_activity<'a>(&'a self, activity: &'a mut Activity) -> Result<(), Infallible> {
    activity.extra.insert("normalized".into(), json!(true));
    Ok(())
  }

  async fn normalize_conversation<'a>(
    &'a self,
    conversation: &'a mut Conversation,
  ) -> Result<(), Infallible> {
    conversation.extra.insert("normalized".into(), json!(true));
    Ok(())
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

pub type FakeClient = ConversationClient<FakeTransport, FakeEncryptor, FakeIdentity, FakeNormalizer>;

pub fn client(transport: FakeTransport) -> FakeClient {
  client_with(transport, FakeEncryptor::new(), FakeIdentity::new())
}

pub fn client_with(transport: FakeTransport, encryptor: FakeEncryptor, identity: FakeIdentity) -> FakeClient {
  ConversationClient::new(transport, encryptor, identity, FakeNormalizer, ClientConfig::default())
}
