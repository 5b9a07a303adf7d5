//! The request model and the [`Transport`] trait.
//!
//! Transport implementations own retries, timeouts, and authentication. The
//! conversation layer issues exactly one request per call and interprets no
//! failure beyond the status code.

use std::{collections::BTreeMap, future::Future};

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{BoxError, encryption::ProgressSender};

/// Name of the conversation service, as known to service discovery.
pub const CONVERSATION_SERVICE: &str = "conversation";

// ─── Resources ───────────────────────────────────────────────────────────────

/// A backend resource relative to the conversation service base url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  Conversations,
  ConversationsForUser(Uuid),
  ConversationsLeft,
  Activities,
  Mentions,
  Content,
}

impl Resource {
  pub fn path(&self) -> String {
    match self {
      Self::Conversations => "conversations".to_owned(),
      Self::ConversationsForUser(id) => format!("conversations/user/{id}"),
      Self::ConversationsLeft => "conversations/left".to_owned(),
      Self::Activities => "activities".to_owned(),
      Self::Mentions => "mentions".to_owned(),
      Self::Content => "content".to_owned(),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Query-string flags, kept sorted so requests are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(BTreeMap<String, String>);

impl Query {
  pub fn new() -> Self { Self::default() }

  pub fn with(mut self, key: &str, value: impl ToString) -> Self {
    self.set(key, value);
    self
  }

  pub fn set(&mut self, key: &str, value: impl ToString) {
    self.0.insert(key.to_owned(), value.to_string());
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str)
  }

  /// `self` layered over `defaults`: keys set here win.
  pub fn over(self, defaults: Query) -> Query {
    let mut merged = defaults.0;
    merged.extend(self.0);
    Query(merged)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
}

/// Where a request is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  /// A resource of a named service; the transport resolves the base url.
  Service { service: String, resource: Resource },
  /// An absolute url, e.g. a conversation's own `url`.
  Uri(String),
}

/// One backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
  pub method: Method,
  pub target: Target,
  pub query:  Query,
  pub body:   Option<Value>,
}

impl Request {
  pub fn get(target: Target) -> Self {
    Self {
      method: Method::Get,
      target,
      query: Query::new(),
      body: None,
    }
  }

  pub fn post(target: Target, body: Value) -> Self {
    Self {
      method: Method::Post,
      target,
      query: Query::new(),
      body: Some(body),
    }
  }

  pub fn with_query(mut self, query: Query) -> Self {
    self.query = query;
    self
  }

  /// The resource addressed on the conversation service, if any.
  pub fn resource(&self) -> Option<Resource> {
    match &self.target {
      Target::Service { resource, .. } => Some(*resource),
      Target::Uri(_) => None,
    }
  }
}

impl Target {
  pub fn conversation(resource: Resource) -> Self {
    Self::Service {
      service: CONVERSATION_SERVICE.to_owned(),
      resource,
    }
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

fn status_suffix(status: &Option<u16>) -> String {
  status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Any network or backend failure.
#[derive(Debug, Error)]
#[error("transport failure{}: {message}", status_suffix(.status))]
pub struct TransportError {
  /// The HTTP-class status, when the backend answered.
  pub status:  Option<u16>,
  pub message: String,
  #[source]
  pub source:  Option<BoxError>,
}

impl TransportError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      status:  None,
      message: message.into(),
      source:  None,
    }
  }

  pub fn with_status(status: u16, message: impl Into<String>) -> Self {
    Self {
      status: Some(status),
      ..Self::new(message)
    }
  }

  pub fn from_source(
    status: Option<u16>,
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self {
      status,
      message: e.to_string(),
      source: Some(Box::new(e)),
    }
  }

  /// The "resource absent" signal.
  pub fn is_not_found(&self) -> bool { self.status == Some(404) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the backend connection.
pub trait Transport: Send + Sync {
  /// Perform one request and return the response body. An empty body is
  /// returned as [`Value::Null`].
  fn send(
    &self,
    request: Request,
  ) -> impl Future<Output = Result<Value, TransportError>> + Send + '_;

  /// Fetch raw bytes from an absolute url, reporting progress if asked.
  fn download<'a>(
    &'a self,
    uri: &'a str,
    progress: Option<&'a ProgressSender>,
  ) -> impl Future<Output = Result<Bytes, TransportError>> + Send + 'a;
}
