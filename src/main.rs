use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

use starcats::app::App;
use starcats::config::{CacheMode, Config};
use starcats::logging;

#[derive(Parser, Debug)]
#[command(name = "starcats")]
#[command(about = "Browse the Star Wars cats catalog, online or from cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/starcats/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Feed URL to load instead of the configured one
  #[arg(long)]
  feed_url: Option<String>,

  /// Disable the persistent cache for this run
  #[arg(long)]
  no_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List record names
  List {
    /// Only names containing this text (case-sensitive)
    #[arg(short, long, default_value = "")]
    search: String,
  },
  /// Show one record's details and its image status
  Show {
    /// Exact record name
    name: String,
  },
  /// Load the images of all listed records
  Images {
    /// Only records whose name contains this text (case-sensitive)
    #[arg(short, long, default_value = "")]
    search: String,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(url) = args.feed_url {
    config.feed.url = url;
  }
  if args.no_cache {
    config.cache.mode = CacheMode::Off;
  }

  let _log_guard = logging::init(&config.log)?;

  let app = App::new(&config)?;
  let mut out = std::io::stdout().lock();

  match args.command {
    Command::List { search } => app.list(&search, &mut out).await?,
    Command::Show { name } => app.show(&name, &mut out).await?,
    Command::Images { search } => app.images(&search, &mut out).await?,
  }

  Ok(())
}
