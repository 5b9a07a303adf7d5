//! Verb operations on a conversation.
//!
//! Verbs with bespoke flows (post, add, leave, share, updateKey) have their
//! own methods. Everything in [`VERB_TABLE`] goes through
//! [`ConversationClient::submit_activity`].
//!
//! [`VERB_TABLE`]: colloquy_core::verb::VERB_TABLE

use colloquy_core::{
  Error, Result,
  activity::{Activity, ActivityDraft, ActivityObject, KmsMessage},
  conversation::{Conversation, notification_tags},
  encryption::{Encryptor, Key},
  identity::{IdentityResolver, ResolveOptions},
  normalize::Normalizer,
  object_type,
  transport::{Query, Transport},
  verb::Verb,
};

use crate::{ConversationClient, builder::PrepareParams, share::ShareActivity};

/// The message of a `post`: plain text becomes the comment's
/// `displayName`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
  Text(String),
  Object(ActivityObject),
}

impl Message {
  fn into_object(self) -> ActivityObject {
    let mut object = match self {
      Self::Text(text) => ActivityObject {
        display_name: Some(text),
        ..ActivityObject::default()
      },
      Self::Object(object) => object,
    };
    object.object_type.get_or_insert_with(|| object_type::COMMENT.to_owned());
    object
  }
}

impl From<&str> for Message {
  fn from(text: &str) -> Self { Self::Text(text.to_owned()) }
}

impl From<String> for Message {
  fn from(text: String) -> Self { Self::Text(text) }
}

impl From<ActivityObject> for Message {
  fn from(object: ActivityObject) -> Self { Self::Object(object) }
}

/// The caller-supplied part of a table-driven verb.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum VerbPayload {
  #[default]
  None,
  /// A person reference, for moderation verbs. Defaults to the caller.
  Person(String),
  /// A structured object, for content verbs.
  Object(ActivityObject),
}

impl<T, E, I, N> ConversationClient<T, E, I, N>
where
  T: Transport,
  E: Encryptor,
  I: IdentityResolver,
  N: Normalizer,
{
  pub async fn post(
    &self,
    conversation: &mut Conversation,
    message: impl Into<Message>,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    let object = message.into().into_object();
    self.resolver().resolve(conversation).await?;
    let params = PrepareParams::verb(Verb::Post)
      .target(conversation.reference())
      .object(object);
    self.prepare_and_submit(draft, params).await
  }

  /// Add a participant, creating their identity if it does not exist yet.
  pub async fn add(
    &self,
    conversation: &mut Conversation,
    participant: &str,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    self.resolver().resolve(conversation).await?;
    let id = self
      .identity()
      .resolve_id(participant, ResolveOptions { create: true })
      .await
      .map_err(Error::identity)?;
    let params = PrepareParams::verb(Verb::Add)
      .target(conversation.reference())
      .object(ActivityObject::person(id.to_string()))
      .kms_message(KmsMessage::authorize(id));
    self.prepare_and_submit(draft, params).await
  }

  /// Remove a participant; the caller when `participant` is `None`.
  pub async fn leave(
    &self,
    conversation: &mut Conversation,
    participant: Option<&str>,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    self.resolver().resolve(conversation).await?;
    let id = match participant {
      Some(reference) => self
        .identity()
        .resolve_id(reference, ResolveOptions::default())
        .await
        .map_err(Error::identity)?,
      None => self.identity().current_user_id(),
    };
    let params = PrepareParams::verb(Verb::Leave)
      .target(conversation.reference())
      .object(ActivityObject::person(id.to_string()))
      .kms_message(KmsMessage::deauthorize(id));
    self.prepare_and_submit(draft, params).await
  }

  /// Start a share; submit it with [`Self::share`].
  pub fn make_share(&self) -> ShareActivity { ShareActivity::default() }

  pub async fn share(&self, conversation: &mut Conversation, share: ShareActivity) -> Result<Activity> {
    self.resolver().resolve(conversation).await?;
    let activity = self
      .builder()
      .prepare(share, PrepareParams::default().target(conversation.reference()))?;
    self.gateway().submit(&activity).await
  }

  /// Rotate (or first bind) the conversation's encryption key. The
  /// conversation is re-read with its participants first.
  pub async fn update_key(
    &self,
    conversation: &mut Conversation,
    key: Option<Key>,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    let query = Query::new()
      .with("activitiesLimit", 0)
      .with("includeParticipants", true);
    let current = self.get(conversation, query).await?;
    self.keys().bind_key(&current, key, draft).await
  }

  /// The generic entry point for every verb in the verb table.
  pub async fn submit_activity(
    &self,
    verb: Verb,
    conversation: &mut Conversation,
    payload: VerbPayload,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    let shape = verb
      .shape()
      .ok_or_else(|| Error::validation(format!("`{verb}` has its own operation")))?;

    if shape.requires_content_object && !matches!(payload, VerbPayload::Object(_)) {
      return Err(Error::validation("`object` must be an object"));
    }
    let acts_on_conversation =
      !(shape.requires_moderation_object || shape.requires_content_object || shape.extends_conversation);
    if acts_on_conversation && payload != VerbPayload::None {
      return Err(Error::validation(format!("`{verb}` takes no payload")));
    }

    self.resolver().resolve(conversation).await?;
    let reference = conversation.reference();

    let object = if shape.requires_moderation_object {
      let id = match payload {
        VerbPayload::Person(reference) => self
          .identity()
          .resolve_id(&reference, ResolveOptions::default())
          .await
          .map_err(Error::identity)?,
        VerbPayload::None => self.identity().current_user_id(),
        VerbPayload::Object(_) => {
          return Err(Error::validation("`moderator` must be a person reference"));
        }
      };
      ActivityObject::person(id.to_string())
    } else if let VerbPayload::Object(mut object) = payload {
      if shape.extends_conversation {
        object.fill_absent(&reference);
      }
      object
    } else {
      reference.clone()
    };

    let mut params = PrepareParams::verb(verb).object(object);
    if shape.requires_target {
      params = params.target(reference);
    }
    self.prepare_and_submit(draft, params).await
  }

  // ── Notification tags ─────────────────────────────────────────────────

  pub async fn mute_mentions(&self, conversation: &mut Conversation, draft: Option<ActivityDraft>) -> Result<Activity> {
    self.tag_with(Verb::Tag, conversation, &[notification_tags::MENTION_NOTIFICATIONS_OFF], draft).await
  }

  pub async fn unmute_mentions(&self, conversation: &mut Conversation, draft: Option<ActivityDraft>) -> Result<Activity> {
    self.tag_with(Verb::Tag, conversation, &[notification_tags::MENTION_NOTIFICATIONS_ON], draft).await
  }

  pub async fn mute_messages(&self, conversation: &mut Conversation, draft: Option<ActivityDraft>) -> Result<Activity> {
    self.tag_with(Verb::Tag, conversation, &[notification_tags::MESSAGE_NOTIFICATIONS_OFF], draft).await
  }

  pub async fn unmute_messages(&self, conversation: &mut Conversation, draft: Option<ActivityDraft>) -> Result<Activity> {
    self.tag_with(Verb::Tag, conversation, &[notification_tags::MESSAGE_NOTIFICATIONS_ON], draft).await
  }

  pub async fn remove_all_mute_tags(
    &self,
    conversation: &mut Conversation,
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    self.tag_with(Verb::Untag, conversation, &notification_tags::ALL, draft).await
  }

  async fn tag_with(
    &self,
    verb: Verb,
    conversation: &mut Conversation,
    tags: &[&str],
    draft: Option<ActivityDraft>,
  ) -> Result<Activity> {
    let object = ActivityObject {
      tags: Some(tags.iter().map(|t| (*t).to_owned()).collect()),
      ..ActivityObject::default()
    };
    self
      .submit_activity(verb, conversation, VerbPayload::Object(object), draft)
      .await
  }

  async fn prepare_and_submit(&self, draft: Option<ActivityDraft>, params: PrepareParams) -> Result<Activity> {
    let activity = self.builder().prepare(draft, params)?;
    self.gateway().submit(&activity).await
  }
}
