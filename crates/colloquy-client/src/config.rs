//! Client configuration, passed at construction.

use serde::Deserialize;

/// Advisory diagnostics. Never read from process state.
#[derive(Debug, Clone, Deserialize)]
pub struct Diagnostics {
  /// Warn when a conversation url had to be inferred from its id.
  #[serde(default = "enabled")]
  pub warn_on_inferred_url: bool,
}

fn enabled() -> bool { true }

impl Default for Diagnostics {
  fn default() -> Self {
    Self {
      warn_on_inferred_url: true,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
  #[serde(default)]
  pub diagnostics: Diagnostics,
}
