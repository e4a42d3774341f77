use std::io::IsTerminal;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use podlist::{
    Config, JobError, JobFailure, JobOutcome, LogFormat, LogReporter, ProgressEvent,
    ProgressReporter, ReqwestClient, RetryPolicy, RetryingClient, SharedProgressReporter,
    execute, init_logging,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static BROOM: Emoji<'_, '_> = Emoji("🧹 ", "[-] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Keep a playlist in sync with a set of podcast shows
#[derive(Parser, Debug)]
#[command(name = "podlist")]
#[command(about = "Keep a playlist in sync with a set of podcast shows")]
#[command(version)]
struct Args {
    /// Print the run outcome as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Log level for this tool; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Maximum number of concurrent show lookups (overrides DISCOVERY_CONCURRENCY)
    #[arg(short = 'c', long)]
    concurrent: Option<NonZeroUsize>,
}

/// Progress reporter using an indicatif spinner for terminal output
struct IndicatifReporter {
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let main_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = ProgressBar::new_spinner();
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(Duration::from_millis(100));

        Self { main_bar }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::LoadingSnapshot { playlist_id } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Loading playlist: {}", playlist_id.cyan()));
            }

            ProgressEvent::SnapshotLoaded { entries, skipped } => {
                self.main_bar.println(format!(
                    "{HEADPHONES}Playlist has {} episodes ({} skipped)",
                    entries.to_string().cyan(),
                    skipped.to_string().dimmed()
                ));
            }

            ProgressEvent::CheckingShow { show_name } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Checking {}", show_name.bold()));
            }

            ProgressEvent::ShowFailed { show_name, error } => {
                self.main_bar.println(format!(
                    "{FAILURE}{} - {}",
                    show_name.red(),
                    error.red()
                ));
            }

            ProgressEvent::EpisodeAdded {
                show_name,
                episode_name,
            } => {
                self.main_bar.println(format!(
                    "{SUCCESS}{} {}",
                    truncate_title(&episode_name, 50).green(),
                    format!("({show_name})").dimmed()
                ));
            }

            ProgressEvent::EpisodeAddFailed {
                show_name,
                episode_name,
                error,
            } => {
                self.main_bar.println(format!(
                    "{FAILURE}{} {} - {}",
                    truncate_title(&episode_name, 40).red(),
                    format!("({show_name})").dimmed(),
                    error.red()
                ));
            }

            ProgressEvent::CleanupCompleted { pass, removed } => {
                self.main_bar.println(format!(
                    "{BROOM}{}: {} removed",
                    pass.to_string().bold(),
                    removed.to_string().cyan()
                ));
            }

            ProgressEvent::CleanupFailed { pass, error } => {
                self.main_bar.println(format!(
                    "{FAILURE}{} failed - {}",
                    pass.to_string().bold(),
                    error.red()
                ));
            }

            ProgressEvent::JobCompleted {
                added_count,
                removed_count,
                failed_shows,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} added, {} removed, {} shows failed",
                    "Sync complete:".bold().green(),
                    added_count.to_string().green().bold(),
                    removed_count.to_string().yellow(),
                    if failed_shows > 0 {
                        failed_shows.to_string().red().bold()
                    } else {
                        failed_shows.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let head: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

fn print_failures(outcome: &JobOutcome) {
    let failed_episodes: Vec<_> = outcome
        .results
        .iter()
        .flat_map(|result| result.failed_episodes.iter())
        .collect();

    if failed_episodes.is_empty() {
        return;
    }

    println!("\n{}", "Episodes not added (will retry next run):".red().bold());
    for episode in failed_episodes {
        println!(
            "  {}{} - {}",
            CROSS,
            episode.name.yellow(),
            episode.error.dimmed()
        );
    }
}

/// Report a fatal failure in the requested format and exit
fn fail(args: &Args, error: JobError) -> ! {
    error!(kind = %error.kind(), error = %error, "Run failed");

    if args.json {
        match serde_json::to_string_pretty(&JobFailure::from(&error)) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize failure: {e}"),
        }
    } else if !args.quiet {
        eprintln!("\n{FAILURE}{} {}", "Run failed:".red().bold(), error);
    }

    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_format, &args.log_level).context("Failed to set up logging")?;

    let interactive = !args.quiet && !args.json && std::io::stderr().is_terminal();

    if interactive {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podlist".bold().magenta(),
            "- Podcast Playlist Sync".dimmed()
        );
    }

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => fail(&args, e.into()),
    };
    if let Some(concurrent) = args.concurrent {
        config.job.discovery_concurrency = concurrent.get();
    }

    let transport =
        ReqwestClient::with_timeout(config.http.timeout).context("Failed to build HTTP client")?;
    let http = RetryingClient::new(
        transport,
        RetryPolicy {
            max_retries: config.http.max_retries,
            ..RetryPolicy::default()
        },
    );

    let reporter: SharedProgressReporter = if interactive {
        Arc::new(IndicatifReporter::new())
    } else {
        LogReporter::shared()
    };

    let outcome = match execute(http, &config, Utc::now(), reporter).await {
        Ok(outcome) => outcome,
        Err(e) => fail(&args, e),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
        );
    } else if interactive {
        print_failures(&outcome);
        println!();
    }

    Ok(())
}
