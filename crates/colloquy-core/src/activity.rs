//! Activities: verb-tagged events submitted to or read from a conversation.
//!
//! An [`ActivityDraft`] is the partial record a caller hands in; the client
//! turns it into a canonical [`Activity`]. Unknown wire fields survive the
//! round trip through the flattened `extra` maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  conversation::ItemList,
  encryption::SecureContentRef,
  object_type,
  verb::Verb,
};

/// Placeholder the encryption collaborator substitutes with the
/// conversation's key-resource object.
pub const KRO_PLACEHOLDER: &str = "<KRO>";

// ─── Objects ─────────────────────────────────────────────────────────────────

/// The shape shared by an activity's `actor`, `object`, and `target`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityObject {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:                                  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:                                 Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub object_type:                         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name:                        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content:                             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email_address:                       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tags:                                Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub files:                               Option<ItemList<SharedFile>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_activity_encryption_key_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kms_resource_object_url:             Option<String>,
  #[serde(flatten)]
  pub extra:                               Map<String, Value>,
}

impl ActivityObject {
  pub fn with_type(object_type: &str) -> Self {
    Self {
      object_type: Some(object_type.to_owned()),
      ..Self::default()
    }
  }

  /// A person reference.
  pub fn person(id: impl Into<String>) -> Self {
    Self {
      id: Some(id.into()),
      ..Self::with_type(object_type::PERSON)
    }
  }

  /// A comment whose text is carried in `displayName`.
  pub fn comment(display_name: impl Into<String>) -> Self {
    Self {
      display_name: Some(display_name.into()),
      ..Self::with_type(object_type::COMMENT)
    }
  }

  /// Fill every field that is absent here from `defaults`. Fields already
  /// set win.
  pub fn fill_absent(&mut self, defaults: &ActivityObject) {
    fill(&mut self.id, &defaults.id);
    fill(&mut self.url, &defaults.url);
    fill(&mut self.object_type, &defaults.object_type);
    fill(&mut self.display_name, &defaults.display_name);
    fill(&mut self.content, &defaults.content);
    fill(&mut self.email_address, &defaults.email_address);
    fill(&mut self.tags, &defaults.tags);
    fill(&mut self.files, &defaults.files);
    fill(
      &mut self.default_activity_encryption_key_url,
      &defaults.default_activity_encryption_key_url,
    );
    fill(&mut self.kms_resource_object_url, &defaults.kms_resource_object_url);
    for (key, value) in &defaults.extra {
      self.extra.entry(key.clone()).or_insert_with(|| value.clone());
    }
  }

  /// Overwrite the addressing fields (`id`, `url`, `objectType`,
  /// `kmsResourceObjectUrl`, `defaultActivityEncryptionKeyUrl`) with those
  /// set on `source`. Nothing else is copied.
  pub fn merge_reference(&mut self, source: &ActivityObject) {
    overwrite(&mut self.id, &source.id);
    overwrite(&mut self.url, &source.url);
    overwrite(&mut self.object_type, &source.object_type);
    overwrite(&mut self.kms_resource_object_url, &source.kms_resource_object_url);
    overwrite(
      &mut self.default_activity_encryption_key_url,
      &source.default_activity_encryption_key_url,
    );
  }

  /// Derive `id` from the final path segment of `url` when only the url is
  /// known.
  pub fn infer_id_from_url(&mut self) {
    if self.id.is_some() {
      return;
    }
    self.id = self
      .url
      .as_deref()
      .and_then(|url| url.rsplit('/').next())
      .filter(|segment| !segment.is_empty())
      .map(str::to_owned);
  }
}

fn fill<T: Clone>(slot: &mut Option<T>, default: &Option<T>) {
  if slot.is_none() {
    slot.clone_from(default);
  }
}

fn overwrite<T: Clone>(slot: &mut Option<T>, source: &Option<T>) {
  if source.is_some() {
    slot.clone_from(source);
  }
}

/// An activity may name its actor by bare id or by a full person object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActorRef {
  Id(String),
  Object(ActivityObject),
}

impl ActorRef {
  pub fn into_object(self) -> ActivityObject {
    match self {
      Self::Id(id) => ActivityObject::person(id),
      Self::Object(object) => object,
    }
  }
}

impl From<Uuid> for ActorRef {
  fn from(id: Uuid) -> Self { Self::Id(id.to_string()) }
}

impl From<&str> for ActorRef {
  fn from(id: &str) -> Self { Self::Id(id.to_owned()) }
}

impl From<ActivityObject> for ActorRef {
  fn from(object: ActivityObject) -> Self { Self::Object(object) }
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// A file attached to a share activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFile {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub object_type:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:          Option<String>,
  /// Present when the file content is encrypted.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scr:          Option<SecureContentRef>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mime_type:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_size:    Option<u64>,
  #[serde(flatten)]
  pub extra:        Map<String, Value>,
}

// ─── Key messages ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KmsMethod {
  Create,
  Update,
  Delete,
}

/// The instruction for the key-management subsystem that rides alongside an
/// activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KmsMessage {
  pub method:       KmsMethod,
  pub uri:          String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub resource_uri: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_ids:     Option<Vec<Uuid>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub key_uris:     Option<Vec<String>>,
}

impl KmsMessage {
  /// Create a key resource scoped to `user_ids`.
  pub fn create_resource(user_ids: Vec<Uuid>, key_uris: Vec<String>) -> Self {
    Self {
      method:       KmsMethod::Create,
      uri:          "/resources".to_owned(),
      resource_uri: None,
      user_ids:     Some(user_ids),
      key_uris:     Some(key_uris),
    }
  }

  /// Rotate the key bound to an existing key resource.
  pub fn update_key(resource_uri: impl Into<String>, key_uri: impl Into<String>) -> Self {
    Self {
      method:       KmsMethod::Update,
      uri:          key_uri.into(),
      resource_uri: Some(resource_uri.into()),
      user_ids:     None,
      key_uris:     None,
    }
  }

  /// Authorize `user_id` on the conversation's key resource.
  pub fn authorize(user_id: Uuid) -> Self {
    Self {
      method:       KmsMethod::Create,
      uri:          "/authorizations".to_owned(),
      resource_uri: Some(KRO_PLACEHOLDER.to_owned()),
      user_ids:     Some(vec![user_id]),
      key_uris:     None,
    }
  }

  /// Revoke `user_id`'s authorization on the conversation's key resource.
  pub fn deauthorize(user_id: Uuid) -> Self {
    Self {
      method:       KmsMethod::Delete,
      uri:          format!("{KRO_PLACEHOLDER}/authorizations?authId={user_id}"),
      resource_uri: None,
      user_ids:     None,
      key_uris:     None,
    }
  }
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// A partial activity supplied by a caller. Every field is optional; the
/// builder fills what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub verb:           Option<Verb>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub actor:          Option<ActorRef>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub object:         Option<ActivityObject>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target:         Option<ActivityObject>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kms_message:    Option<KmsMessage>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub client_temp_id: Option<Uuid>,
  #[serde(flatten)]
  pub extra:          Map<String, Value>,
}

// ─── Activity ────────────────────────────────────────────────────────────────

fn activity_type() -> String { object_type::ACTIVITY.to_owned() }

/// A canonical activity. `published` and `id` are absent until the server
/// has accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:            Option<String>,
  pub verb:           Verb,
  pub actor:          ActivityObject,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub object:         Option<ActivityObject>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target:         Option<ActivityObject>,
  #[serde(default = "activity_type")]
  pub object_type:    String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub client_temp_id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kms_message:    Option<KmsMessage>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub published:      Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub extra:          Map<String, Value>,
}

/// An activity pushed to the client outside of a list read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
  pub activity: Activity,
  #[serde(flatten)]
  pub extra:    Map<String, Value>,
}
