//! [`DisplayNormalizer`] — the default normaliser.
//!
//! Lower-cases email addresses and gives untitled conversations a display
//! name built from the other participants.

use std::convert::Infallible;

use colloquy_core::{
  activity::Activity,
  conversation::Conversation,
  normalize::Normalizer,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct DisplayNormalizer {
  current_user: Uuid,
}

impl DisplayNormalizer {
  pub fn new(current_user: Uuid) -> Self { Self { current_user } }
}

fn lowercase(email: &mut Option<String>) {
  if let Some(email) = email {
    *email = email.to_lowercase();
  }
}

impl Normalizer for DisplayNormalizer {
  type Error = Infallible;

  async fn normalize_activity(&self, activity: &mut Activity) -> Result<(), Infallible> {
    lowercase(&mut activity.actor.email_address);
    if let Some(object) = &mut activity.object {
      lowercase(&mut object.email_address);
    }
    Ok(())
  }

  async fn normalize_conversation(&self, conversation: &mut Conversation) -> Result<(), Infallible> {
    if let Some(participants) = &mut conversation.participants {
      for participant in &mut participants.items {
        lowercase(&mut participant.email_address);
      }
    }

    if conversation.display_name.is_none() {
      let others: Vec<&str> = conversation
        .participants()
        .iter()
        .filter(|p| p.id != self.current_user)
        .filter_map(|p| p.display_name.as_deref().or(p.email_address.as_deref()))
        .collect();
      if !others.is_empty() {
        conversation.display_name = Some(others.join(", "));
      }
    }

    if let Some(activities) = &mut conversation.activities {
      for activity in &mut activities.items {
        self.normalize_activity(activity).await?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use colloquy_core::conversation::Participant;

  use super::*;

  fn participant(id: Uuid, name: Option<&str>, email: &str) -> Participant {
    Participant {
      display_name: name.map(str::to_owned),
      email_address: Some(email.to_owned()),
      ..Participant::new(id)
    }
  }

  #[tokio::test]
  async fn untitled_conversations_are_named_after_the_others() {
    let me = Uuid::new_v4();
    let mut conversation = Conversation {
      participants: Some(
        vec![
          participant(me, Some("Me"), "me@example.com"),
          participant(Uuid::new_v4(), Some("Ada"), "Ada@Example.com"),
          participant(Uuid::new_v4(), None, "Grace@Example.com"),
        ]
        .into(),
      ),
      ..Conversation::from_id("c-1")
    };

    DisplayNormalizer::new(me)
      .normalize_conversation(&mut conversation)
      .await
      .unwrap();
    assert_eq!(conversation.display_name.as_deref(), Some("Ada, grace@example.com"));
    assert_eq!(
      conversation.participants()[1].email_address.as_deref(),
      Some("ada@example.com")
    );
  }

  #[tokio::test]
  async fn titled_conversations_keep_their_name() {
    let mut conversation = Conversation {
      display_name: Some("Planning".into()),
      participants: Some(vec![participant(Uuid::new_v4(), Some("Ada"), "ada@example.com")].into()),
      ..Conversation::from_id("c-1")
    };
    DisplayNormalizer::new(Uuid::new_v4())
      .normalize_conversation(&mut conversation)
      .await
      .unwrap();
    assert_eq!(conversation.display_name.as_deref(), Some("Planning"));
  }
}
