//! [`HttpTransport`] — the reqwest implementation of [`Transport`].

use std::{collections::BTreeMap, time::Duration};

use bytes::{Bytes, BytesMut};
use colloquy_core::{
  encryption::{DownloadProgress, ProgressSender},
  transport::{Method, Request, Target, Transport, TransportError},
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

fn default_timeout() -> u64 { 30 }

/// Connection settings for the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
  /// Base url per service name, e.g. `conversation`.
  #[serde(default)]
  pub services:     BTreeMap<String, String>,
  /// Sent as a bearer token when set.
  #[serde(default)]
  pub access_token: Option<String>,
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      services:     BTreeMap::new(),
      access_token: None,
      timeout_secs: default_timeout(),
    }
  }
}

/// Async HTTP transport.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpTransport {
  client: Client,
  config: HttpConfig,
}

impl HttpTransport {
  pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| TransportError::from_source(None, e))?;
    Ok(Self { client, config })
  }

  /// The absolute url a request addresses.
  pub fn url(&self, target: &Target) -> Result<String, TransportError> {
    match target {
      Target::Uri(uri) => Ok(uri.clone()),
      Target::Service { service, resource } => {
        let base = self
          .config
          .services
          .get(service)
          .ok_or_else(|| TransportError::new(format!("no base url configured for service `{service}`")))?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), resource.path()))
      }
    }
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.config.access_token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn checked(
    &self,
    req: reqwest::RequestBuilder,
  ) -> Result<reqwest::Response, TransportError> {
    let resp = self
      .auth(req)
      .send()
      .await
      .map_err(|e| TransportError::from_source(e.status().map(|s| s.as_u16()), e))?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TransportError::with_status(
      status.as_u16(),
      if body.is_empty() { status.to_string() } else { body },
    ))
  }
}

impl Transport for HttpTransport {
  async fn send(&self, request: Request) -> Result<Value, TransportError> {
    let url = self.url(&request.target)?;
    let query: Vec<(&str, &str)> = request.query.iter().collect();

    let mut req = match request.method {
      Method::Get => self.client.get(&url),
      Method::Post => self.client.post(&url),
    }
    .query(&query);
    if let Some(body) = &request.body {
      req = req.json(body);
    }

    let text = self
      .checked(req)
      .await?
      .text()
      .await
      .map_err(|e| TransportError::from_source(None, e))?;
    if text.trim().is_empty() {
      return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| TransportError::from_source(None, e))
  }

  async fn download(
    &self,
    uri: &str,
    progress: Option<&ProgressSender>,
  ) -> Result<Bytes, TransportError> {
    let mut resp = self.checked(self.client.get(uri)).await?;
    let total = resp.content_length();
    let mut buf = BytesMut::new();

    while let Some(chunk) = resp
      .chunk()
      .await
      .map_err(|e| TransportError::from_source(None, e))?
    {
      buf.extend_from_slice(&chunk);
      if let Some(progress) = progress {
        // A dropped receiver only means nobody is watching.
        let _ = progress.send(DownloadProgress {
          loaded: buf.len() as u64,
          total,
        });
      }
    }
    Ok(buf.freeze())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{
    Json, Router,
    extract::{Query as AxumQuery, State},
    http::StatusCode,
    routing::{get, post},
  };
  use colloquy_core::transport::{Query, Resource};
  use serde_json::json;
  use tokio::net::TcpListener;

  use super::*;

  type Seen = Arc<Mutex<Vec<BTreeMap<String, String>>>>;

  async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{address}")
  }

  async fn backend() -> (HttpTransport, Seen) {
    let seen: Seen = Arc::default();
    let router = Router::new()
      .route(
        "/conversation/api/v1/activities",
        post(
          |State(seen): State<Seen>,
           AxumQuery(q): AxumQuery<BTreeMap<String, String>>,
           Json(mut body): Json<Value>| async move {
            seen.lock().unwrap().push(q);
            body["id"] = json!("a-1");
            Json(body)
          },
        ),
      )
      .route(
        "/conversation/api/v1/conversations/user/{id}",
        get(|| async { (StatusCode::NOT_FOUND, "no such conversation") }),
      )
      .route("/empty", post(|| async { StatusCode::NO_CONTENT }))
      .route("/files/deck.pdf", get(|| async { vec![7u8; 2048] }))
      .with_state(seen.clone());

    let base = serve(router).await;
    let transport = HttpTransport::new(HttpConfig {
      services: [("conversation".to_owned(), format!("{base}/conversation/api/v1/"))].into(),
      ..HttpConfig::default()
    })
    .unwrap();
    (transport, seen)
  }

  #[tokio::test]
  async fn posts_json_with_query_flags() {
    let (transport, seen) = backend().await;
    let request = Request::post(Target::conversation(Resource::Activities), json!({ "verb": "post" }))
      .with_query(Query::new().with("personRefresh", true));

    let body = transport.send(request).await.unwrap();
    assert_eq!(body, json!({ "verb": "post", "id": "a-1" }));
    assert_eq!(seen.lock().unwrap()[0].get("personRefresh").map(String::as_str), Some("true"));
  }

  #[tokio::test]
  async fn not_found_keeps_its_status() {
    let (transport, _) = backend().await;
    let request = Request::get(Target::conversation(Resource::ConversationsForUser(uuid::Uuid::new_v4())));

    let err = transport.send(request).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message, "no such conversation");
  }

  #[tokio::test]
  async fn empty_bodies_are_null() {
    let (transport, _) = backend().await;
    let base = transport.url(&Target::conversation(Resource::Activities)).unwrap();
    let origin = base.trim_end_matches("/conversation/api/v1/activities");

    let body = transport
      .send(Request::post(Target::Uri(format!("{origin}/empty")), json!({})))
      .await
      .unwrap();
    assert_eq!(body, Value::Null);
  }

  #[tokio::test]
  async fn unknown_services_fail_before_sending() {
    let transport = HttpTransport::new(HttpConfig::default()).unwrap();
    let err = transport
      .send(Request::get(Target::conversation(Resource::Conversations)))
      .await
      .unwrap_err();
    assert!(err.status.is_none());
    assert!(err.message.contains("conversation"), "{err}");
  }

  #[tokio::test]
  async fn downloads_report_progress() {
    let (transport, _) = backend().await;
    let base = transport.url(&Target::conversation(Resource::Activities)).unwrap();
    let origin = base.trim_end_matches("/conversation/api/v1/activities");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let bytes = transport
      .download(&format!("{origin}/files/deck.pdf"), Some(&tx))
      .await
      .unwrap();
    assert_eq!(bytes.len(), 2048);

    drop(tx);
    let mut last = None;
    while let Some(p) = rx.recv().await {
      last = Some(p);
    }
    assert_eq!(last.map(|p| p.loaded), Some(2048));
  }
}
