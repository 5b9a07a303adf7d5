//! [`ShareActivity`] — a draft that shares already-uploaded files.

use colloquy_core::{
  activity::{ActivityDraft, ActivityObject, SharedFile},
  conversation::ItemList,
  object_type,
  verb::Verb,
};

use crate::builder::{IntoDraft, PrepareParams};

/// A share in progress. Files are added as they finish uploading; the draft
/// becomes a `share` activity when prepared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShareActivity {
  pub files:        Vec<SharedFile>,
  pub display_name: Option<String>,
  pub content:      Option<String>,
  pub draft:        ActivityDraft,
}

impl ShareActivity {
  pub fn new(files: Vec<SharedFile>) -> Self {
    let mut share = Self::default();
    for file in files {
      share.add_file(file);
    }
    share
  }

  pub fn add_file(&mut self, mut file: SharedFile) {
    file.object_type.get_or_insert_with(|| object_type::FILE.to_owned());
    self.files.push(file);
  }

  /// Attach a caption to the share.
  pub fn caption(mut self, display_name: impl Into<String>) -> Self {
    self.display_name = Some(display_name.into());
    self
  }
}

impl IntoDraft for ShareActivity {
  fn into_draft(self, _: &PrepareParams) -> ActivityDraft {
    let Self {
      files,
      display_name,
      content,
      mut draft,
    } = self;
    draft.verb.get_or_insert(Verb::Share);

    let object = draft
      .object
      .get_or_insert_with(|| ActivityObject::with_type(object_type::CONTENT));
    object.object_type.get_or_insert_with(|| object_type::CONTENT.to_owned());
    if object.display_name.is_none() {
      object.display_name = display_name;
    }
    if object.content.is_none() {
      object.content = content;
    }
    object.files = Some(ItemList::from(files));
    draft
  }
}
