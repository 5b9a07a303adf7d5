//! [`KeyManager`] — binds or rotates a conversation's encryption key.
//!
//! A conversation's key-resource binding is a two-state machine:
//!
//! | State   | Transition on `bind_key`                         |
//! |---------|--------------------------------------------------|
//! | Unbound | `create` a key resource for every participant    |
//! | Bound   | `update` the key resource with the new key       |
//!
//! There is no transition back to unbound here.

use colloquy_core::{
  Error, Result,
  activity::{Activity, ActivityDraft, ActivityObject, KRO_PLACEHOLDER, KmsMessage},
  conversation::Conversation,
  encryption::{Encryptor, Key},
  object_type,
  transport::Transport,
  verb::Verb,
};
use uuid::Uuid;

use crate::{
  builder::{ActivityBuilder, PrepareParams},
  gateway::SubmissionGateway,
};

/// Where a conversation stands with respect to its key resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBinding {
  Unbound { participants: Vec<Uuid> },
  Bound { resource_uri: String },
}

impl KeyBinding {
  pub fn of(conversation: &Conversation) -> Self {
    if conversation.default_activity_encryption_key_url.is_some() {
      // The key resource url is only meaningful once a default key exists.
      Self::Bound {
        resource_uri: conversation
          .kms_resource_object_url
          .clone()
          .unwrap_or_else(|| KRO_PLACEHOLDER.to_owned()),
      }
    } else {
      Self::Unbound {
        participants: conversation.participant_ids(),
      }
    }
  }

  /// The key-management instruction that moves this binding onto `key`.
  pub fn transition(self, key: &Key) -> KmsMessage {
    match self {
      Self::Unbound { participants } => {
        KmsMessage::create_resource(participants, vec![key.uri.clone()])
      }
      Self::Bound { resource_uri } => KmsMessage::update_key(resource_uri, key.uri.clone()),
    }
  }
}

pub struct KeyManager<'a, E, T> {
  encryptor: &'a E,
  builder:   ActivityBuilder,
  gateway:   SubmissionGateway<'a, T>,
}

impl<'a, E: Encryptor, T: Transport> KeyManager<'a, E, T> {
  pub fn new(encryptor: &'a E, builder: ActivityBuilder, gateway: SubmissionGateway<'a, T>) -> Self {
    Self {
      encryptor,
      builder,
      gateway,
    }
  }

  /// Build the `updateKey` activity for `conversation` without submitting
  /// it. Requests one unbound key when `key` is not supplied.
  pub async fn prepare(
    &self,
    conversation: &Conversation,
    key: Option<Key>,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    let key = match key {
      Some(key) => key,
      None => self
        .encryptor
        .create_unbound_keys(1)
        .await
        .map_err(Error::encryption)?
        .into_first()
        .ok_or(Error::MissingKey)?,
    };

    let binding = KeyBinding::of(conversation);
    tracing::debug!(?binding, key = %key.uri, "binding conversation key");

    let params = PrepareParams::verb(Verb::UpdateKey)
      .target(conversation.reference())
      .object(ActivityObject {
        default_activity_encryption_key_url: Some(key.uri.clone()),
        ..ActivityObject::with_type(object_type::CONVERSATION)
      })
      .kms_message(binding.transition(&key));
    self.builder.prepare(draft, params)
  }

  /// Bind (or rotate) the conversation's key and submit the activity.
  pub async fn bind_key(
    &self,
    conversation: &Conversation,
    key: Option<Key>,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    let activity = self.prepare(conversation, key, draft).await?;
    self.gateway.submit(&activity).await
  }
}
