//! Archiver CLI
//!
//! Stands in for the chat front end: commands are passed as the same free
//! text an operator would post, and replies are printed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use archiver::{
    config::BotData,
    error::Result,
    models::Config,
    pipeline::{self, AnalysisCache, Context, NominationWatcher},
    services::{parse_command, parse_review_command},
    storage::{LocalWiki, MediaWikiClient, WikiStore},
    utils::{Clock, SystemClock},
};
use chrono::Duration;
use clap::{Parser, Subcommand};

/// Status article nomination archiver
#[derive(Parser, Debug)]
#[command(name = "archiver", version, about = "Archives status article nominations")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Use a local wiki directory instead of the live wiki
    #[arg(long, global = true)]
    local: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an archival command, e.g. "successful FAN: Darth Bane"
    Archive {
        text: String,
        /// User issuing the command
        #[arg(long = "by")]
        requested_by: String,
        /// Skip the nominator check
        #[arg(long)]
        bypass: bool,
    },

    /// Run a review command, e.g. "create review for Revan"
    Review {
        text: String,
        #[arg(long = "by")]
        requested_by: String,
    },

    /// Report objections on active nominations
    Objections {
        #[arg(long = "type", default_value = "FA")]
        nom_type: String,
        /// Report every objection past the notification threshold
        #[arg(long)]
        include: bool,
    },

    /// Group active reviews by objection state
    Reviews {
        #[arg(long = "type", default_value = "FA")]
        nom_type: String,
    },

    /// Prepare new nomination pages
    Intake {
        #[arg(long = "type", default_value = "FA")]
        nom_type: String,
        /// Keep polling at this interval (seconds), processing only new pages
        #[arg(long)]
        watch: Option<u64>,
    },

    /// Compare a listing page with its status category
    Analyze {
        #[arg(long = "type", default_value = "FA")]
        nom_type: String,
    },

    /// Validate configuration and bot data
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Print a workflow failure the way the chat front end would reply.
fn reply_error(e: &archiver::error::AppError) {
    if e.is_reported() {
        println!("✗ {}", e.user_message());
    } else {
        log::error!("{e:?}");
        println!("✗ {}", e.user_message());
    }
}

async fn open_store(cli: &Cli, config: &Config, clock: Arc<dyn Clock>) -> Result<Arc<dyn WikiStore>> {
    match &cli.local {
        Some(dir) => {
            log::info!("Using local wiki at {}", dir.display());
            Ok(Arc::new(
                LocalWiki::new(dir)
                    .with_clock(clock)
                    .with_editor(config.wiki.user.clone())
                    .with_base_url(config.wiki.base_url.clone()),
            ))
        }
        None => Ok(Arc::new(MediaWikiClient::new(&config.wiki)?)),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);

    let base = cli.config.parent().unwrap_or(Path::new("."));
    config.paths = config.paths.resolve(base);

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        config.validate()?;
        log::info!("✓ Config OK");
        let data = BotData::load(&config.paths)?;
        log::info!(
            "✓ Bot data OK: {} nomination types ({})",
            data.types.len(),
            data.types.abbreviations().join(", ")
        );
        return Ok(());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(&cli, &config, clock.clone()).await?;
    let data = BotData::load(&config.paths)?;
    let mut ctx = Context::new(config, data, store, clock.clone());

    match &cli.command {
        Command::Archive {
            text,
            requested_by,
            bypass,
        } => match parse_command(text, requested_by, &ctx.data.types) {
            Ok(mut command) => {
                command.bypass = *bypass;
                let result = pipeline::run_archive(&ctx, &command).await;
                if result.completed {
                    println!("✓ {}", serde_json::to_string_pretty(&result)?);
                } else {
                    println!("✗ {}", result.message);
                }
            }
            Err(rejection) => println!("✗ {rejection}"),
        },

        Command::Review { text, requested_by } => match parse_review_command(text, requested_by) {
            Ok(command) => match pipeline::run_review(&ctx, &command).await {
                Ok(message) => println!("✓ {message}"),
                Err(e) => reply_error(&e),
            },
            Err(rejection) => println!("✗ {rejection}"),
        },

        Command::Objections { nom_type, include } => {
            match pipeline::check_active_nominations(&ctx, nom_type, *include).await {
                Ok(reports) => {
                    for (page, report) in reports {
                        println!("{page} (nominated by {})", report.nominator);
                        for line in &report.overdue {
                            println!("  overdue: {line}");
                        }
                        for notification in &report.notifications {
                            println!("  to {}: {}", notification.recipient, notification.message);
                        }
                    }
                }
                Err(e) => reply_error(&e),
            }
        }

        Command::Reviews { nom_type } => match pipeline::check_active_reviews(&ctx, nom_type).await {
            Ok(report) => report.lines().iter().for_each(|line| println!("{line}")),
            Err(e) => reply_error(&e),
        },

        Command::Intake { nom_type, watch } => {
            let mut watcher = NominationWatcher::new(clock.clone());
            let Some(interval) = watch else {
                match pipeline::run_intake(&ctx, &mut watcher, nom_type).await {
                    Ok(pages) => pages.iter().for_each(|page| println!("✓ {page}")),
                    Err(e) => reply_error(&e),
                }
                return Ok(());
            };

            watcher.prime(&ctx, nom_type).await?;
            loop {
                tokio::time::sleep(StdDuration::from_secs(*interval)).await;
                if let Err(e) = ctx.data.reload(&ctx.config.paths) {
                    log::warn!("Keeping previous bot data: {e}");
                }
                match pipeline::run_intake(&ctx, &mut watcher, nom_type).await {
                    Ok(pages) => pages.iter().for_each(|page| println!("✓ {page}")),
                    Err(e) => reply_error(&e),
                }
            }
        }

        Command::Analyze { nom_type } => {
            let mut cache = AnalysisCache::new(clock.clone());
            match pipeline::run_analysis(&ctx, &mut cache, nom_type, Duration::hours(1)).await {
                Ok(analysis) => {
                    let nom_type = ctx.data.types.get(nom_type);
                    let (page, category) = nom_type
                        .map(|t| (t.page.as_str(), t.category.as_str()))
                        .unwrap_or_default();
                    if analysis.is_clean() {
                        println!("✓ No discrepancies");
                    }
                    analysis
                        .report(page, category)
                        .iter()
                        .for_each(|line| println!("{line}"));
                }
                Err(e) => reply_error(&e),
            }
        }

        Command::Validate => {}
    }

    Ok(())
}
