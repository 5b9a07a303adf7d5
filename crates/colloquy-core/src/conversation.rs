//! Conversations and their participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
  activity::{Activity, ActivityObject, KmsMessage},
  object_type,
};

/// Tag marking a conversation created through the one-on-one path.
pub const ONE_ON_ONE_TAG: &str = "ONE_ON_ONE";

/// Notification tags applied through `tag` / `untag`.
pub mod notification_tags {
  pub const MENTION_NOTIFICATIONS_OFF: &str = "MENTION_NOTIFICATIONS_OFF";
  pub const MENTION_NOTIFICATIONS_ON: &str = "MENTION_NOTIFICATIONS_ON";
  pub const MESSAGE_NOTIFICATIONS_OFF: &str = "MESSAGE_NOTIFICATIONS_OFF";
  pub const MESSAGE_NOTIFICATIONS_ON: &str = "MESSAGE_NOTIFICATIONS_ON";

  pub const ALL: [&str; 4] = [
    MENTION_NOTIFICATIONS_OFF,
    MENTION_NOTIFICATIONS_ON,
    MESSAGE_NOTIFICATIONS_OFF,
    MESSAGE_NOTIFICATIONS_ON,
  ];
}

/// The `{ "items": [...] }` wrapper the backend uses for collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList<T> {
  #[serde(default = "Vec::new")]
  pub items: Vec<T>,
}

impl<T> Default for ItemList<T> {
  fn default() -> Self { Self { items: Vec::new() } }
}

impl<T> From<Vec<T>> for ItemList<T> {
  fn from(items: Vec<T>) -> Self { Self { items } }
}

fn person_type() -> String { object_type::PERSON.to_owned() }

fn conversation_type() -> String { object_type::CONVERSATION.to_owned() }

/// A member of a conversation, identified by an opaque uuid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
  pub id:            Uuid,
  #[serde(default = "person_type")]
  pub object_type:   String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email_address: Option<String>,
  #[serde(flatten)]
  pub extra:         Map<String, Value>,
}

impl Participant {
  pub fn new(id: Uuid) -> Self {
    Self {
      id,
      object_type: person_type(),
      display_name: None,
      email_address: None,
      extra: Map::new(),
    }
  }
}

/// An addressable container of activities and participants.
///
/// Callers often hold only a partial reference (a bare `id`); the `url` is
/// inferred lazily before the conversation is addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:                                  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:                                 Option<String>,
  #[serde(default = "conversation_type")]
  pub object_type:                         String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name:                        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub participants:                        Option<ItemList<Participant>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub activities:                          Option<ItemList<Activity>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_activity_encryption_key_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kms_resource_object_url:             Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags:                                Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub published:                           Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub extra:                               Map<String, Value>,
}

impl Default for Conversation {
  fn default() -> Self {
    Self {
      id: None,
      url: None,
      object_type: conversation_type(),
      display_name: None,
      participants: None,
      activities: None,
      default_activity_encryption_key_url: None,
      kms_resource_object_url: None,
      tags: Vec::new(),
      published: None,
      extra: Map::new(),
    }
  }
}

impl Conversation {
  /// A partial reference holding only an id.
  pub fn from_id(id: impl Into<String>) -> Self {
    Self {
      id: Some(id.into()),
      ..Self::default()
    }
  }

  /// A reference holding only a url.
  pub fn from_url(url: impl Into<String>) -> Self {
    Self {
      url: Some(url.into()),
      ..Self::default()
    }
  }

  /// The canonical reference used as an activity's `target` (or `object`):
  /// `id`, `url`, and `objectType` only.
  pub fn reference(&self) -> ActivityObject {
    ActivityObject {
      id: self.id.clone(),
      url: self.url.clone(),
      ..ActivityObject::with_type(&self.object_type)
    }
  }

  pub fn participants(&self) -> &[Participant] {
    self
      .participants
      .as_ref()
      .map(|list| list.items.as_slice())
      .unwrap_or_default()
  }

  pub fn participant_ids(&self) -> Vec<Uuid> {
    self.participants().iter().map(|p| p.id).collect()
  }

  /// Append an activity to the locally held activity stream.
  pub fn push_activity(&mut self, activity: Activity) {
    self
      .activities
      .get_or_insert_with(ItemList::default)
      .items
      .push(activity);
  }
}

/// The payload that creates a conversation and seeds its activity stream in
/// one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
  pub object_type:  String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  pub activities:   ItemList<Activity>,
  pub kms_message:  KmsMessage,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags:         Vec<String>,
}
