//! [`ActivityBuilder`] normalises a draft and verb parameters into a
//! canonical, validated [`Activity`].

use colloquy_core::{
  Error, Result,
  activity::{Activity, ActivityDraft, ActivityObject, ActorRef, KmsMessage},
  object_type,
  verb::Verb,
};
use uuid::Uuid;

/// Verb-specific values merged into a draft.
#[derive(Debug, Clone, Default)]
pub struct PrepareParams {
  pub verb:        Option<Verb>,
  pub kms_message: Option<KmsMessage>,
  pub target:      Option<ActivityObject>,
  pub actor:       Option<ActivityObject>,
  pub object:      Option<ActivityObject>,
}

impl PrepareParams {
  pub fn verb(verb: Verb) -> Self {
    Self {
      verb: Some(verb),
      ..Self::default()
    }
  }

  pub fn target(mut self, target: ActivityObject) -> Self {
    self.target = Some(target);
    self
  }

  pub fn object(mut self, object: ActivityObject) -> Self {
    self.object = Some(object);
    self
  }

  pub fn kms_message(mut self, kms_message: KmsMessage) -> Self {
    self.kms_message = Some(kms_message);
    self
  }
}

/// A value that can become an [`ActivityDraft`]. Drafts with a preparation
/// hook of their own (e.g. [`ShareActivity`](crate::share::ShareActivity))
/// run it here, before the builder merges anything.
pub trait IntoDraft {
  fn into_draft(self, params: &PrepareParams) -> ActivityDraft;
}

impl IntoDraft for ActivityDraft {
  fn into_draft(self, _: &PrepareParams) -> ActivityDraft { self }
}

impl IntoDraft for Option<ActivityDraft> {
  fn into_draft(self, _: &PrepareParams) -> ActivityDraft { self.unwrap_or_default() }
}

/// Builds activities on behalf of one device user.
#[derive(Debug, Clone, Copy)]
pub struct ActivityBuilder {
  actor: Uuid,
}

impl ActivityBuilder {
  pub fn new(actor: Uuid) -> Self { Self { actor } }

  /// Merge `draft` with `params` and validate the result. Fields already
  /// present on the draft win over `params`, except for `target`, whose
  /// addressing fields are taken from `params`.
  pub fn prepare(&self, draft: impl IntoDraft, params: PrepareParams) -> Result<Activity> {
    let ActivityDraft {
      verb,
      actor,
      object,
      target,
      kms_message,
      client_temp_id,
      extra,
    } = draft.into_draft(&params);

    let verb = verb
      .or(params.verb)
      .ok_or_else(|| Error::validation("`activity.verb` must be defined"))?;

    let mut actor = actor.unwrap_or_else(|| ActorRef::from(self.actor)).into_object();
    if let Some(defaults) = &params.actor {
      actor.fill_absent(defaults);
    }

    let mut object = match (object, &params.object) {
      (Some(mut object), Some(defaults)) => {
        object.fill_absent(defaults);
        Some(object)
      }
      (None, Some(defaults)) => Some(defaults.clone()),
      (object, None) => object,
    };

    let mut target = target;
    if let Some(source) = &params.target {
      target.get_or_insert_with(ActivityObject::default).merge_reference(source);
    }

    for value in [&mut object, &mut target].into_iter().flatten() {
      value.infer_id_from_url();
    }

    require_object_type("actor", Some(&actor))?;
    require_object_type("object", object.as_ref())?;
    require_object_type("target", target.as_ref())?;

    if let Some(object) = &object
      && object.content.is_some()
      && object.display_name.is_none()
    {
      return Err(Error::validation(
        "cannot submit activity object with `content` but no `displayName`",
      ));
    }

    Ok(Activity {
      id: None,
      url: None,
      verb,
      actor,
      object,
      target,
      object_type: object_type::ACTIVITY.to_owned(),
      client_temp_id: Some(client_temp_id.unwrap_or_else(Uuid::new_v4)),
      kms_message: kms_message.or(params.kms_message),
      published: None,
      extra,
    })
  }

  /// A bare activity for embedding in a creation payload. No
  /// `clientTempId`, no validation.
  pub fn expand(&self, verb: Verb, object: Option<ActivityObject>) -> Activity {
    Activity {
      id: None,
      url: None,
      verb,
      actor: ActivityObject::person(self.actor.to_string()),
      object,
      target: None,
      object_type: object_type::ACTIVITY.to_owned(),
      client_temp_id: None,
      kms_message: None,
      published: None,
      extra: Default::default(),
    }
  }
}

fn require_object_type(field: &str, value: Option<&ActivityObject>) -> Result<()> {
  match value {
    Some(value) if value.object_type.is_none() => Err(Error::validation(format!(
      "`activity.{field}.objectType` must be defined"
    ))),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn builder() -> (Uuid, ActivityBuilder) {
    let me = Uuid::new_v4();
    (me, ActivityBuilder::new(me))
  }

  fn conversation_target() -> ActivityObject {
    ActivityObject {
      url: Some("https://conv.example.com/conversations/c-1".into()),
      ..ActivityObject::with_type(object_type::CONVERSATION)
    }
  }

  #[test]
  fn empty_draft_gets_canonical_defaults() {
    let (me, builder) = builder();
    let a = builder.prepare(ActivityDraft::default(), PrepareParams::verb(Verb::Hide)).unwrap();
    let b = builder.prepare(ActivityDraft::default(), PrepareParams::verb(Verb::Hide)).unwrap();

    assert_eq!(a.object_type, "activity");
    assert_eq!(a.verb, Verb::Hide);
    assert_eq!(a.actor, ActivityObject::person(me.to_string()));
    assert!(a.client_temp_id.is_some());
    assert_ne!(a.client_temp_id, b.client_temp_id);
    assert!(a.published.is_none());
  }

  #[test]
  fn bare_string_actor_becomes_a_person() {
    let (_, builder) = builder();
    let draft = ActivityDraft {
      actor: Some(ActorRef::from("someone-else")),
      ..ActivityDraft::default()
    };
    let activity = builder.prepare(draft, PrepareParams::verb(Verb::Post)).unwrap();
    assert_eq!(activity.actor, ActivityObject::person("someone-else"));
  }

  #[test]
  fn draft_fields_win_over_params() {
    let (_, builder) = builder();
    let draft = ActivityDraft {
      verb: Some(Verb::Update),
      object: Some(ActivityObject {
        display_name: Some("edited".into()),
        ..ActivityObject::default()
      }),
      ..ActivityDraft::default()
    };
    let params = PrepareParams::verb(Verb::Post).object(ActivityObject::comment("original"));

    let activity = builder.prepare(draft, params).unwrap();
    assert_eq!(activity.verb, Verb::Update);
    let object = activity.object.unwrap();
    assert_eq!(object.display_name.as_deref(), Some("edited"));
    assert_eq!(object.object_type.as_deref(), Some("comment"));
  }

  #[test]
  fn target_takes_only_whitelisted_fields_and_infers_id() {
    let (_, builder) = builder();
    let mut target = conversation_target();
    target.display_name = Some("Planning".into());
    target.kms_resource_object_url = Some("kms://kro/1".into());

    let activity = builder
      .prepare(ActivityDraft::default(), PrepareParams::verb(Verb::Post).target(target).object(ActivityObject::comment("hi")))
      .unwrap();
    let target = activity.target.unwrap();
    assert_eq!(target.id.as_deref(), Some("c-1"));
    assert_eq!(target.kms_resource_object_url.as_deref(), Some("kms://kro/1"));
    assert!(target.display_name.is_none());
  }

  #[test]
  fn missing_object_type_fails() {
    let (_, builder) = builder();

    let untyped_object = PrepareParams::verb(Verb::Update).object(ActivityObject {
      id: Some("a-1".into()),
      ..ActivityObject::default()
    });
    let err = builder.prepare(ActivityDraft::default(), untyped_object).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("activity.object.objectType"), "{err}");

    let untyped_actor = ActivityDraft {
      actor: Some(ActorRef::Object(ActivityObject {
        id: Some("x".into()),
        ..ActivityObject::default()
      })),
      ..ActivityDraft::default()
    };
    let err = builder.prepare(untyped_actor, PrepareParams::verb(Verb::Post)).unwrap_err();
    assert!(err.to_string().contains("activity.actor.objectType"), "{err}");

    let untyped_target = PrepareParams::verb(Verb::Post).target(ActivityObject {
      id: Some("c-1".into()),
      ..ActivityObject::default()
    });
    let err = builder.prepare(ActivityDraft::default(), untyped_target).unwrap_err();
    assert!(err.to_string().contains("activity.target.objectType"), "{err}");
  }

  #[test]
  fn content_without_display_name_fails() {
    let (_, builder) = builder();
    let object = ActivityObject {
      content: Some("<b>hi</b>".into()),
      ..ActivityObject::with_type(object_type::COMMENT)
    };
    let err = builder.prepare(ActivityDraft::default(), PrepareParams::verb(Verb::Post).object(object)).unwrap_err();
    assert!(err.is_validation());

    let object = ActivityObject {
      content: Some("<b>hi</b>".into()),
      ..ActivityObject::comment("hi")
    };
    assert!(builder.prepare(ActivityDraft::default(), PrepareParams::verb(Verb::Post).object(object)).is_ok());
  }

  #[test]
  fn missing_verb_fails() {
    let (_, builder) = builder();
    let err = builder.prepare(ActivityDraft::default(), PrepareParams::default()).unwrap_err();
    assert!(err.is_validation());
  }

  #[test]
  fn expand_has_actor_but_no_temp_id() {
    let (me, builder) = builder();
    let activity = builder.expand(Verb::Create, None);
    assert_eq!(activity.actor.id, Some(me.to_string()));
    assert!(activity.client_temp_id.is_none());
  }
}
