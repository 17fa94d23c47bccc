//! `wicket`: fetch, merge, enrich and serve the cricket venue set.
//!
//! # Usage
//!
//! ```text
//! wicket fetch                      # every configured provider → tmp/*.geojson
//! wicket merge                      # tmp/*.geojson → data/grounds.json
//! wicket enrich images
//! wicket enrich play-cricket --county "Greater London"
//! wicket serve --port 8787
//! ```

mod enrich;
mod fetch;
mod merge;
mod serve;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wicket_sources::SourceKind;

use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "wicket", author, version, about = "Cricket venue aggregation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "wicket.toml", env = "WICKET_CONFIG")]
  config: PathBuf,

  /// Canonical venue document (overrides `data.grounds`).
  #[arg(long, global = true, value_name = "FILE")]
  grounds: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Download provider payloads and write normalized batch files.
  Fetch {
    /// Only these sources (default: all fetchable sources).
    #[arg(short, long = "source", value_name = "SOURCE")]
    sources: Vec<SourceKind>,
  },

  /// Merge batch files into the canonical venue document.
  Merge {
    /// Batch files in merge order (default: the fetched batches, registry
    /// sources first).
    batches: Vec<PathBuf>,

    /// Print the report without saving.
    #[arg(long)]
    dry_run: bool,

    /// Also write the per-candidate report as JSON.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
  },

  /// Add images or club details to the canonical venues.
  Enrich {
    #[command(subcommand)]
    pass: EnrichPass,
  },

  /// Serve the rating and venue API.
  Serve {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
  },
}

#[derive(Subcommand, Debug)]
enum EnrichPass {
  /// Wikipedia thumbnails and Commons search results.
  Images,
  /// Play-Cricket club names, ids and leagues (needs an API token).
  PlayCricket {
    /// Only venues whose county mentions one of these.
    #[arg(long = "county", value_name = "COUNTY")]
    counties: Vec<String>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(grounds) = cli.grounds {
    settings.data.grounds = grounds;
  }

  match cli.command {
    Command::Fetch { sources } => fetch::run(&settings, &sources).await,
    Command::Merge { batches, dry_run, report } => {
      merge::run(&settings, &batches, dry_run, report.as_deref()).await
    }
    Command::Enrich { pass: EnrichPass::Images } => enrich::images(&settings).await,
    Command::Enrich { pass: EnrichPass::PlayCricket { counties } } => {
      enrich::play_cricket(&mut settings, counties).await
    }
    Command::Serve { host, port } => {
      if let Some(host) = host {
        settings.server.host = host;
      }
      if let Some(port) = port {
        settings.server.port = port;
      }
      serve::run(&settings).await
    }
  }
}
