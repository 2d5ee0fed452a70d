use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::*;
use tracing::info;
use twine_core::config::load_client_config;
use twine_core::logging::init_tracing;
use twine_engine::{RefreshPriority, RefreshRuntime, RefreshTimer};
use twine_timeline::{
    build_session, parse_timeline_specifiers, FetchParams, SourceTimelineFactory, TimelineSpec,
};

mod refresh;
mod render;
mod replay;

use refresh::run_round;
use render::render_session;
use replay::ReplaySource;

#[derive(Parser)]
#[command(name = "twine")]
#[command(about = "Twine - terminal micro-blogging client", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Environment variables are used otherwise.
    #[arg(long, global = true, env = "TWINE_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the session and refresh it from a recorded replay file
    Refresh(RefreshArgs),
    /// Show how a timeline specifier string is understood
    Tokenize {
        /// Comma-separated timeline specifiers, e.g. "home, search:rust"
        specifiers: String,
    },
    /// Show version information
    Version,
}

#[derive(Args)]
struct RefreshArgs {
    /// JSON file mapping fetch kinds to recorded messages
    #[arg(long)]
    replay: PathBuf,
    /// Visible timelines, overriding the configured session
    #[arg(long)]
    timelines: Option<String>,
    /// Buffers opened behind the visible timelines
    #[arg(long)]
    buffers: Option<String>,
    /// Number of refresh rounds, spaced by the update frequency
    #[arg(long, default_value_t = 1)]
    rounds: u32,
    /// Messages printed per timeline
    #[arg(long, default_value_t = 5)]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("Twine v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Tokenize { specifiers } => {
            for token in parse_timeline_specifiers(&specifiers) {
                match token.parse::<TimelineSpec>() {
                    Ok(spec) => println!("{} → {}", token, spec.name().green()),
                    Err(err) => println!("{} → {}", token, err.to_string().red()),
                }
            }
            Ok(())
        }
        Commands::Refresh(args) => refresh(cli.config, args).await,
    }
}

async fn refresh(config_path: Option<PathBuf>, args: RefreshArgs) -> anyhow::Result<()> {
    let mut config =
        load_client_config(config_path.as_deref()).context("failed to load configuration")?;
    init_tracing(Some(&config.log_level))?;

    if let Some(visible) = args.timelines {
        config.session.visible = visible;
    }
    if let Some(buffers) = args.buffers {
        config.session.buffers = buffers;
    }

    let source = ReplaySource::load(&args.replay)?;
    info!(
        path = %args.replay.display(),
        feeds = source.feed_keys().count(),
        "replay loaded"
    );
    let factory = SourceTimelineFactory::new(Arc::new(source))
        .with_params(FetchParams::default().with_count(config.fetch_count));
    let mut list = build_session(&config.session, &factory);

    let (mut runtime, mut outcomes) = RefreshRuntime::new();
    runtime.start(config.refresh_workers);
    let handle = runtime.handle();
    let mut timer = RefreshTimer::new(config.update_frequency);

    for round in 0..args.rounds.max(1) {
        let (priority, newer_only) = if round == 0 {
            (RefreshPriority::UserInitiated, false)
        } else {
            timer.tick().await;
            (RefreshPriority::Periodic, true)
        };
        let summary = run_round(&mut list, &handle, &mut outcomes, priority, newer_only).await?;
        if summary.failed > 0 {
            eprintln!(
                "{}",
                format!("{} timeline(s) failed to refresh", summary.failed).yellow()
            );
        }
    }

    runtime.shutdown().await;
    print!("{}", render_session(&list, args.limit));
    Ok(())
}
