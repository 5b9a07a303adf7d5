//! `colloquy` — drive a conversation service from the terminal.
//!
//! # Usage
//!
//! ```
//! colloquy --config colloquy.toml list
//! colloquy post c-1 "hello there"
//! colloquy create ada@example.com --comment "got a minute?"
//! COLLOQUY_HTTP__ACCESS_TOKEN=… colloquy verb mute c-1
//! ```
//!
//! Every command prints the resulting JSON on stdout.

mod dev;
mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colloquy_client::{
  ClientConfig, ConversationClient,
  http::HttpTransport,
  normalizer::DisplayNormalizer,
  one_on_one::{CreateOptions, CreateParams},
  verbs::VerbPayload,
};
use colloquy_core::{
  activity::{ActivityObject, SharedFile},
  conversation::Conversation,
  encryption::DownloadProgress,
  transport::Query,
  verb::Verb,
};
use dev::{DirectoryIdentity, PlaintextEncryptor};
use serde::Serialize;
use settings::CliConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

type Client = ConversationClient<HttpTransport, PlaintextEncryptor, DirectoryIdentity, DisplayNormalizer>;

#[derive(Parser)]
#[command(author, version, about = "Conversation activity client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "colloquy.toml")]
  config: PathBuf,

  /// Bearer token; overrides the configured one.
  #[arg(long, env = "COLLOQUY_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

/// A conversation is named by its url or by its bare id.
#[derive(clap::Args)]
struct Target {
  conversation: String,
}

impl Target {
  fn conversation(&self) -> Conversation {
    if self.conversation.starts_with("http://") || self.conversation.starts_with("https://") {
      Conversation::from_url(&self.conversation)
    } else {
      Conversation::from_id(&self.conversation)
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Read one conversation.
  Get {
    #[command(flatten)]
    target: Target,
    /// Query flags, e.g. `-q activitiesLimit=20`.
    #[arg(short, long = "query", value_parser = parse_flag)]
    query:  Vec<(String, String)>,
  },
  /// Read the conversation shared with a person.
  With {
    person: String,
  },
  /// List conversations.
  List {
    /// Conversations the user has left.
    #[arg(long)]
    left:  bool,
    #[arg(short, long = "query", value_parser = parse_flag)]
    query: Vec<(String, String)>,
  },
  /// List activities.
  Activities {
    /// Only activities mentioning the user.
    #[arg(long)]
    mentions: bool,
    #[arg(short, long = "query", value_parser = parse_flag)]
    query:    Vec<(String, String)>,
  },
  /// Start a conversation, reusing an existing one-on-one when possible.
  Create {
    #[arg(required = true)]
    participants: Vec<String>,
    #[arg(long)]
    comment:      Option<String>,
    #[arg(long)]
    name:         Option<String>,
    /// Always create a new group conversation.
    #[arg(long)]
    grouped:      bool,
  },
  Post {
    #[command(flatten)]
    target:  Target,
    message: String,
  },
  Add {
    #[command(flatten)]
    target:      Target,
    participant: String,
  },
  /// Remove a participant; yourself by default.
  Leave {
    #[command(flatten)]
    target:      Target,
    participant: Option<String>,
  },
  /// Share already-uploaded files by url.
  Share {
    #[command(flatten)]
    target:  Target,
    #[arg(required = true)]
    urls:    Vec<String>,
    #[arg(long)]
    caption: Option<String>,
  },
  /// Bind or rotate the conversation key.
  UpdateKey {
    #[command(flatten)]
    target: Target,
  },
  /// Notification preferences.
  Notifications {
    #[command(flatten)]
    target: Target,
    change: NotificationChange,
  },
  /// Submit any table-driven verb (mute, lock, tag, assignModerator, ...).
  Verb {
    verb:   String,
    #[command(flatten)]
    target: Target,
    /// Person reference, for moderator verbs.
    #[arg(long, conflicts_with = "object")]
    person: Option<String>,
    /// JSON object, for content and tag verbs.
    #[arg(long)]
    object: Option<String>,
  },
  /// Download a plain shared file.
  Download {
    url: String,
    #[arg(short, long)]
    out: PathBuf,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum NotificationChange {
  MuteMentions,
  UnmuteMentions,
  MuteMessages,
  UnmuteMessages,
  Reset,
}

fn parse_flag(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn query(flags: Vec<(String, String)>) -> Query {
  flags
    .into_iter()
    .fold(Query::new(), |query, (key, value)| query.with(&key, value))
}

fn print(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut config = CliConfig::load(&cli.config)?;
  if cli.token.is_some() {
    config.http.access_token = cli.token;
  }

  let identity = DirectoryIdentity::new(
    config.user_id,
    config.directory,
    config.http.services.clone(),
  );
  let transport = HttpTransport::new(config.http).context("failed to build http client")?;
  let client = ConversationClient::new(
    transport,
    PlaintextEncryptor,
    identity,
    DisplayNormalizer::new(config.user_id),
    ClientConfig {
      diagnostics: config.diagnostics,
    },
  );

  run(&client, cli.command).await
}

async fn run(client: &Client, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Get { target, query: flags } => {
      let conversation = client
        .get(&mut target.conversation(), query(flags))
        .await
        .context("failed to read conversation")?;
      print(&conversation)
    }
    Command::With { person } => print(&client.get_by_user(&person, Query::new()).await?),
    Command::List { left, query: flags } => {
      let conversations = if left {
        client.list_left(query(flags)).await?
      } else {
        client.list(query(flags)).await?
      };
      print(&conversations)
    }
    Command::Activities { mentions, query: flags } => {
      let activities = if mentions {
        client.list_mentions(query(flags)).await?
      } else {
        client.list_activities(query(flags)).await?
      };
      print(&activities)
    }
    Command::Create {
      participants,
      comment,
      name,
      grouped,
    } => {
      let params = CreateParams {
        participants,
        comment,
        display_name: name,
      };
      let conversation = client
        .create(params, CreateOptions { force_grouped: grouped })
        .await
        .context("failed to create conversation")?;
      print(&conversation)
    }
    Command::Post { target, message } => {
      print(&client.post(&mut target.conversation(), message, None).await?)
    }
    Command::Add { target, participant } => {
      print(&client.add(&mut target.conversation(), &participant, None).await?)
    }
    Command::Leave { target, participant } => {
      let activity = client
        .leave(&mut target.conversation(), participant.as_deref(), None)
        .await?;
      print(&activity)
    }
    Command::Share { target, urls, caption } => {
      let mut conversation = target.conversation();
      let mut share = client.make_share();
      for url in urls {
        let display_name = url.rsplit('/').next().map(str::to_owned);
        share.add_file(SharedFile {
          url: Some(url),
          display_name,
          ..SharedFile::default()
        });
      }
      if let Some(caption) = caption {
        share = share.caption(caption);
      }
      print(&client.share(&mut conversation, share).await?)
    }
    Command::UpdateKey { target } => {
      let activity = client
        .update_key(&mut target.conversation(), None, None)
        .await
        .context("failed to update conversation key")?;
      print(&activity)
    }
    Command::Notifications { target, change } => {
      let mut conversation = target.conversation();
      let activity = match change {
        NotificationChange::MuteMentions => client.mute_mentions(&mut conversation, None).await?,
        NotificationChange::UnmuteMentions => client.unmute_mentions(&mut conversation, None).await?,
        NotificationChange::MuteMessages => client.mute_messages(&mut conversation, None).await?,
        NotificationChange::UnmuteMessages => client.unmute_messages(&mut conversation, None).await?,
        NotificationChange::Reset => client.remove_all_mute_tags(&mut conversation, None).await?,
      };
      print(&activity)
    }
    Command::Verb {
      verb,
      target,
      person,
      object,
    } => {
      let parsed: Verb = serde_json::from_value(serde_json::Value::String(verb.clone()))?;
      if parsed == Verb::Other {
        bail!("unknown verb `{verb}`");
      }
      let payload = match (person, object) {
        (Some(person), _) => VerbPayload::Person(person),
        (None, Some(raw)) => {
          let object: ActivityObject = serde_json::from_str(&raw).context("--object must be a JSON object")?;
          VerbPayload::Object(object)
        }
        (None, None) => VerbPayload::None,
      };
      let activity = client
        .submit_activity(parsed, &mut target.conversation(), payload, None)
        .await
        .with_context(|| format!("failed to submit `{verb}`"))?;
      print(&activity)
    }
    Command::Download { url, out } => {
      let file = SharedFile {
        url: Some(url),
        ..SharedFile::default()
      };
      let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<DownloadProgress>();
      let progress = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
          tracing::debug!(loaded = p.loaded, total = ?p.total, "downloading");
        }
      });
      let downloaded = client.download(&file, Some(tx)).await?;
      progress.await.ok();
      tokio::fs::write(&out, &downloaded.bytes)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;
      print(&serde_json::json!({
        "path": out,
        "bytes": downloaded.bytes.len(),
      }))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_split_on_the_first_equals() {
    assert_eq!(parse_flag("a=b=c"), Ok(("a".to_owned(), "b=c".to_owned())));
    assert!(parse_flag("activitiesLimit").is_err());
  }

  #[test]
  fn targets_distinguish_urls_from_ids() {
    let by_url = Target {
      conversation: "https://conv.example.com/conversations/c-1".into(),
    };
    assert!(by_url.conversation().id.is_none());

    let by_id = Target {
      conversation: "c-1".into(),
    };
    assert_eq!(by_id.conversation().id.as_deref(), Some("c-1"));
  }

  #[test]
  fn the_command_line_parses() {
    let cli = Cli::try_parse_from(["colloquy", "verb", "assignModerator", "c-1", "--person", "ada@example.com"]).unwrap();
    assert!(matches!(cli.command, Command::Verb { ref verb, .. } if verb == "assignModerator"));
  }
}
