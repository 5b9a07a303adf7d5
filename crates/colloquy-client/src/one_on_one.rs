//! [`OneOnOneCoordinator`] — conversation creation.
//!
//! A conversation between exactly two people is looked up before it is
//! created; anything larger (or explicitly grouped) is created directly. The
//! lookup and the create are separate requests: two concurrent calls for the
//! same pair can both miss and both create.

use colloquy_core::{
  Error, Result,
  activity::{ActivityObject, KmsMessage},
  conversation::{Conversation, ItemList, NewConversation, ONE_ON_ONE_TAG},
  encryption::Encryptor,
  identity::{IdentityResolver, ResolveOptions},
  normalize::Normalizer,
  object_type,
  transport::{Query, Transport},
  verb::Verb,
};
use futures::future::try_join_all;
use uuid::Uuid;

use crate::ConversationClient;

#[derive(Debug, Clone, Default)]
pub struct CreateParams {
  /// References to everyone but the caller (emails, ids, ...).
  pub participants: Vec<String>,
  /// Posted into the conversation once it exists.
  pub comment:      Option<String>,
  pub display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions {
  /// Always create a new grouped conversation, even for two people.
  pub force_grouped: bool,
}

pub struct OneOnOneCoordinator<'a, T, E, I, N> {
  client: &'a ConversationClient<T, E, I, N>,
}

impl<'a, T, E, I, N> OneOnOneCoordinator<'a, T, E, I, N>
where
  T: Transport,
  E: Encryptor,
  I: IdentityResolver,
  N: Normalizer,
{
  pub fn new(client: &'a ConversationClient<T, E, I, N>) -> Self { Self { client } }

  pub async fn create(&self, params: CreateParams, options: CreateOptions) -> Result<Conversation> {
    if params.participants.is_empty() {
      return Err(Error::validation("`participants` is required"));
    }

    let identity = self.client.identity();
    let resolved = try_join_all(
      params
        .participants
        .iter()
        .map(|p| identity.resolve_id(p, ResolveOptions { create: true })),
    )
    .await
    .map_err(Error::identity)?;

    let mut members = vec![identity.current_user_id()];
    for id in resolved {
      if !members.contains(&id) {
        members.push(id);
      }
    }

    if members.len() == 2 && !options.force_grouped {
      return self.find_or_create(&members, &params).await;
    }
    let payload = self.creation_payload(&members, &params);
    self.client.gateway().create_conversation(&payload).await
  }

  /// `members[1]` is always the other person: the caller is first and the
  /// list is deduplicated.
  async fn find_or_create(&self, members: &[Uuid], params: &CreateParams) -> Result<Conversation> {
    match self.client.get_by_user_id(members[1], Query::new()).await {
      Ok(mut conversation) => {
        if let Some(comment) = &params.comment {
          let activity = self
            .client
            .post(&mut conversation, comment.as_str(), None)
            .await?;
          conversation.push_activity(activity);
        }
        Ok(conversation)
      }
      Err(e) if e.is_not_found() => {
        tracing::debug!(other = %members[1], "no one-on-one conversation yet; creating one");
        let mut payload = self.creation_payload(members, params);
        payload.tags = vec![ONE_ON_ONE_TAG.to_owned()];
        self.client.gateway().create_conversation(&payload).await
      }
      Err(e) => Err(e),
    }
  }

  /// A `create` activity, one `add` per member, and an optional trailing
  /// `post`, with a key resource scoped to the members.
  pub fn creation_payload(&self, members: &[Uuid], params: &CreateParams) -> NewConversation {
    let builder = self.client.builder();
    let mut activities = vec![builder.expand(Verb::Create, None)];
    activities.extend(
      members
        .iter()
        .map(|id| builder.expand(Verb::Add, Some(ActivityObject::person(id.to_string())))),
    );
    if let Some(comment) = &params.comment {
      activities.push(builder.expand(Verb::Post, Some(ActivityObject::comment(comment.as_str()))));
    }

    NewConversation {
      object_type:  object_type::CONVERSATION.to_owned(),
      display_name: params.display_name.clone(),
      activities:   ItemList::from(activities),
      kms_message:  KmsMessage::create_resource(members.to_vec(), Vec::new()),
      tags:         Vec::new(),
    }
  }
}

impl<T, E, I, N> ConversationClient<T, E, I, N>
where
  T: Transport,
  E: Encryptor,
  I: IdentityResolver,
  N: Normalizer,
{
  pub async fn create(&self, params: CreateParams, options: CreateOptions) -> Result<Conversation> {
    self.one_on_one().create(params, options).await
  }
}
