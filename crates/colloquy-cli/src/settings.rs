use std::{collections::BTreeMap, path::Path};

use anyhow::Context as _;
use colloquy_client::{Diagnostics, http::HttpConfig};
use serde::Deserialize;
use uuid::Uuid;

/// Shape of `colloquy.toml`.
///
/// ```toml
/// user_id = "6f1c…"
///
/// [http]
/// access_token = "…"
/// services = { conversation = "https://conv.example.com/conversation/api/v1" }
///
/// [directory]
/// "ada@example.com" = "0b6e…"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// The user this client acts as.
  pub user_id:     Uuid,
  #[serde(default)]
  pub http:        HttpConfig,
  /// Known people, by email address or handle.
  #[serde(default)]
  pub directory:   BTreeMap<String, Uuid>,
  #[serde(default)]
  pub diagnostics: Diagnostics,
}

impl CliConfig {
  /// The file (if present) layered under `COLLOQUY_*` environment
  /// variables; nested keys use `__`, e.g. `COLLOQUY_HTTP__ACCESS_TOKEN`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("COLLOQUY")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }
}
