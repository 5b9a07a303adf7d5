//! [`ConversationResolver`] makes partial conversation references
//! addressable.

use colloquy_core::{
  Error, Result,
  conversation::Conversation,
  identity::IdentityResolver,
  transport::CONVERSATION_SERVICE,
};

use crate::config::Diagnostics;

pub struct ConversationResolver<'a, I> {
  identity:    &'a I,
  diagnostics: &'a Diagnostics,
}

impl<'a, I: IdentityResolver> ConversationResolver<'a, I> {
  pub fn new(identity: &'a I, diagnostics: &'a Diagnostics) -> Self {
    Self {
      identity,
      diagnostics,
    }
  }

  /// Fill in `conversation.url` from its id when only the id is known.
  ///
  /// A reference with neither id nor url passes through untouched; the
  /// call that needs an address reports it.
  pub async fn resolve(&self, conversation: &mut Conversation) -> Result<()> {
    if conversation.url.is_some() {
      return Ok(());
    }
    let Some(id) = conversation.id.as_deref() else {
      return Ok(());
    };

    let base = self
      .identity
      .service_base_url(CONVERSATION_SERVICE)
      .await
      .map_err(Error::identity)?;
    let url = format!("{}/conversations/{id}", base.trim_end_matches('/'));

    if self.diagnostics.warn_on_inferred_url {
      tracing::warn!(
        %url,
        "inferred conversation url from conversation id; pass whole conversation objects instead"
      );
    }
    conversation.url = Some(url);
    Ok(())
  }
}
