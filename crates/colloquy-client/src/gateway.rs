//! [`SubmissionGateway`] — routes canonical activities to the backend.

use colloquy_core::{
  Result,
  activity::Activity,
  conversation::{Conversation, NewConversation},
  transport::{Query, Request, Resource, Target, Transport},
  verb::Verb,
};

pub struct SubmissionGateway<'a, T> {
  transport: &'a T,
}

impl<'a, T: Transport> SubmissionGateway<'a, T> {
  pub fn new(transport: &'a T) -> Self { Self { transport } }

  /// The request that submits `activity`: shares go to `content` with
  /// transcoding flags, everything else to `activities`.
  pub fn request_for(activity: &Activity) -> Result<Request> {
    let mut query = Query::new().with("personRefresh", true);
    let resource = if activity.verb == Verb::Share {
      query.set("transcode", true);
      query.set("async", false);
      Resource::Content
    } else {
      Resource::Activities
    };

    let body = serde_json::to_value(activity)?;
    Ok(Request::post(Target::conversation(resource), body).with_query(query))
  }

  /// Submit once and return the persisted activity. No retries. A backend
  /// that accepts with an empty body gets the submitted activity back.
  pub async fn submit(&self, activity: &Activity) -> Result<Activity> {
    let request = Self::request_for(activity)?;
    tracing::debug!(
      verb = %activity.verb,
      client_temp_id = ?activity.client_temp_id,
      resource = ?request.resource(),
      "submitting activity"
    );
    let body = self.transport.send(request).await?;
    if body.is_null() {
      return Ok(activity.clone());
    }
    Ok(serde_json::from_value(body)?)
  }

  /// Create a conversation and seed its activity stream in one request. An
  /// empty response yields the conversation as it was submitted.
  pub async fn create_conversation(&self, payload: &NewConversation) -> Result<Conversation> {
    let submitted = serde_json::to_value(payload)?;
    let request = Request::post(Target::conversation(Resource::Conversations), submitted.clone());
    tracing::debug!(
      activities = payload.activities.items.len(),
      tags = ?payload.tags,
      "creating conversation"
    );
    let body = self.transport.send(request).await?;
    Ok(serde_json::from_value(if body.is_null() { submitted } else { body })?)
  }
}
