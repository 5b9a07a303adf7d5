//! Activity verbs and the static table describing how each table-driven verb
//! shapes its activity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The verb carried by an [`Activity`](crate::activity::Activity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verb {
  Post,
  Add,
  Leave,
  Share,
  Tag,
  Untag,
  Acknowledge,
  Delete,
  Update,
  Favorite,
  Hide,
  Lock,
  Mute,
  Unfavorite,
  Unhide,
  Unlock,
  Unmute,
  AssignModerator,
  UnassignModerator,
  UpdateKey,
  Create,
  /// A verb reported by the backend that this layer does not issue.
  #[serde(other)]
  Other,
}

impl Verb {
  /// The wire name. Must match the `rename_all = "camelCase"` serde tags.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Post => "post",
      Self::Add => "add",
      Self::Leave => "leave",
      Self::Share => "share",
      Self::Tag => "tag",
      Self::Untag => "untag",
      Self::Acknowledge => "acknowledge",
      Self::Delete => "delete",
      Self::Update => "update",
      Self::Favorite => "favorite",
      Self::Hide => "hide",
      Self::Lock => "lock",
      Self::Mute => "mute",
      Self::Unfavorite => "unfavorite",
      Self::Unhide => "unhide",
      Self::Unlock => "unlock",
      Self::Unmute => "unmute",
      Self::AssignModerator => "assignModerator",
      Self::UnassignModerator => "unassignModerator",
      Self::UpdateKey => "updateKey",
      Self::Create => "create",
      Self::Other => "other",
    }
  }

  /// The table entry for verbs submitted through the generic entry point.
  /// Verbs with bespoke flows (post, add, leave, share, updateKey, create)
  /// return `None`.
  pub fn shape(self) -> Option<VerbShape> {
    VERB_TABLE
      .iter()
      .find(|(verb, _)| *verb == self)
      .map(|(_, shape)| *shape)
  }
}

impl fmt::Display for Verb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Verb table ──────────────────────────────────────────────────────────────

/// How a table-driven verb builds its activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbShape {
  /// The conversation reference goes in `target`. Otherwise it is the
  /// activity's `object`.
  pub requires_target:            bool,
  /// `object` is a person: the moderator, defaulting to the caller.
  pub requires_moderation_object: bool,
  /// `object` is a caller-supplied structured value.
  pub requires_content_object:    bool,
  /// The caller's object is layered over the conversation reference.
  pub extends_conversation:       bool,
}

const CONVERSATION_OBJECT: VerbShape = VerbShape {
  requires_target:            false,
  requires_moderation_object: false,
  requires_content_object:    false,
  extends_conversation:       false,
};

const MODERATION: VerbShape = VerbShape {
  requires_target:            true,
  requires_moderation_object: true,
  requires_content_object:    false,
  extends_conversation:       false,
};

const TAGGING: VerbShape = VerbShape {
  requires_target:            true,
  requires_moderation_object: false,
  requires_content_object:    true,
  extends_conversation:       true,
};

const CONTENT: VerbShape = VerbShape {
  requires_target:            true,
  requires_moderation_object: false,
  requires_content_object:    true,
  extends_conversation:       false,
};

pub static VERB_TABLE: &[(Verb, VerbShape)] = &[
  (Verb::Favorite, CONVERSATION_OBJECT),
  (Verb::Hide, CONVERSATION_OBJECT),
  (Verb::Lock, CONVERSATION_OBJECT),
  (Verb::Mute, CONVERSATION_OBJECT),
  (Verb::Unfavorite, CONVERSATION_OBJECT),
  (Verb::Unhide, CONVERSATION_OBJECT),
  (Verb::Unlock, CONVERSATION_OBJECT),
  (Verb::Unmute, CONVERSATION_OBJECT),
  (Verb::AssignModerator, MODERATION),
  (Verb::UnassignModerator, MODERATION),
  (Verb::Tag, TAGGING),
  (Verb::Untag, TAGGING),
  (Verb::Acknowledge, CONTENT),
  (Verb::Delete, CONTENT),
  (Verb::Update, CONTENT),
];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_names_match_serde() {
    for verb in [Verb::AssignModerator, Verb::UpdateKey, Verb::Post, Verb::Unfavorite] {
      let json = serde_json::to_value(verb).unwrap();
      assert_eq!(json, serde_json::Value::String(verb.as_str().to_owned()));
    }
  }

  #[test]
  fn unknown_verbs_deserialize_as_other() {
    let verb: Verb = serde_json::from_str(r#""spark""#).unwrap();
    assert_eq!(verb, Verb::Other);
  }

  #[test]
  fn bespoke_verbs_are_not_table_driven() {
    for verb in [Verb::Post, Verb::Add, Verb::Leave, Verb::Share, Verb::UpdateKey, Verb::Create] {
      assert!(verb.shape().is_none(), "{verb} should not be in the table");
    }
  }

  #[test]
  fn tagging_layers_over_the_conversation() {
    let shape = Verb::Tag.shape().unwrap();
    assert!(shape.requires_target && shape.requires_content_object);
    assert!(shape.extends_conversation);

    let shape = Verb::Mute.shape().unwrap();
    assert!(!shape.requires_target);
  }
}
