use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lrclib_upload::batch::BatchOrchestrator;
use lrclib_upload::config::{FileConfig, Overrides, RunConfig};
use lrclib_upload::engine::ResolutionEngine;
use lrclib_upload::journal::RunJournal;
use lrclib_upload::locator::LocalLyricLocator;
use lrclib_upload::metadata::TagReader;
use lrclib_upload::models::{ProcessingOutcome, RunSummary};
use lrclib_upload::pow::ChallengeSigner;
use lrclib_upload::progress::{format_duration, Progress};
use lrclib_upload::prompt::TerminalPrompter;
use lrclib_upload::store::LrclibClient;

#[derive(Parser)]
#[command(name = "lrclib-upload")]
#[command(about = "Resolve missing lyrics for local tracks and publish them to LRCLIB")]
struct Args {
    /// Publish and archive without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Look everything up but publish and move nothing
    #[arg(long)]
    dry_run: bool,

    /// Process one file (relative to the tracks directory unless absolute)
    #[arg(long)]
    single: Option<PathBuf>,

    /// Directory holding tracks/, lrc-files/, done-tracks/ and done-lrc-files/
    #[arg(long)]
    root: Option<PathBuf>,

    #[arg(long)]
    tracks_dir: Option<PathBuf>,

    #[arg(long)]
    lrc_dir: Option<PathBuf>,

    #[arg(long)]
    done_tracks_dir: Option<PathBuf>,

    #[arg(long)]
    done_lrc_dir: Option<PathBuf>,

    /// TOML file with defaults for any of these options
    #[arg(long)]
    config: Option<PathBuf>,

    /// LRCLIB API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Minimum artist and title similarity for a local LRC match (0-1]
    #[arg(long)]
    threshold: Option<f64>,

    /// Audio extensions to scan (comma-separated)
    #[arg(long, value_delimiter = ',')]
    exts: Option<Vec<String>>,

    /// Record outcomes in this SQLite file
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Disable progress bars (for logging to file)
    #[arg(long)]
    log_only: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            root: self.root.clone(),
            tracks: self.tracks_dir.clone(),
            lrc_files: self.lrc_dir.clone(),
            done_tracks: self.done_tracks_dir.clone(),
            done_lrc_files: self.done_lrc_dir.clone(),
            api_base: self.api_base.clone(),
            threshold: self.threshold,
            extensions: self.exts.clone(),
            journal: self.journal.clone(),
            single: self.single.clone(),
            yes: self.yes,
            dry_run: self.dry_run,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "lrclib_upload=debug"
    } else {
        "lrclib_upload=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_summary(summary: &RunSummary, elapsed: std::time::Duration) {
    let c = summary.counts();
    println!();
    println!(
        "=== Summary{} ({}) ===",
        if summary.dry_run { " (dry run)" } else { "" },
        format_duration(elapsed)
    );
    println!("Tracks:          {}", summary.reports.len());
    println!("Already cached:  {}", c.already_cached);
    println!(
        "{} {}",
        if summary.dry_run { "Would publish:  " } else { "Published:      " },
        c.published
    );
    println!("No lyric found:  {}", c.no_lyric_found);
    println!("Declined:        {}", c.declined);
    println!("Failed:          {}", c.failed);
    println!("Archived:        {}", c.archived);
    if c.archive_failed > 0 || c.partial_archive > 0 {
        println!("Archive failed:  {}", c.archive_failed);
        println!("Partial archive: {}", c.partial_archive);
    }

    for report in summary.failures() {
        if let ProcessingOutcome::Failed(reason) = &report.outcome {
            println!("  FAILED  {}: {}", report.path.display(), reason);
        }
    }
    for report in summary.archive_problems() {
        println!(
            "  {}  {}: needs manual attention",
            report.archive.label().to_uppercase(),
            report.path.display()
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path).context("Failed to load config file")?,
        None => FileConfig::default(),
    };
    let config = RunConfig::build(&file_config, args.overrides()).context("Invalid configuration")?;

    let client = LrclibClient::new(&config.api.base_url, &config.api.user_agent, config.api.timeout)
        .context("Failed to create HTTP client")?;
    let signer = ChallengeSigner::new(client.clone());
    let locator = LocalLyricLocator::new(config.match_threshold);
    let engine = ResolutionEngine::new(client, signer, locator);

    let journal = match &config.journal {
        Some(path) => Some(RunJournal::open(path, config.dry_run).context("Failed to open journal")?),
        None => None,
    };

    let start = Instant::now();
    let prompter = TerminalPrompter::new(!config.confirm_before_write);
    // Bars would redraw over interactive prompts
    let progress = Progress::new(args.log_only || config.confirm_before_write);
    let mut orchestrator =
        BatchOrchestrator::new(config, engine, TagReader, prompter).with_progress(progress);
    if let Some(journal) = journal {
        orchestrator = orchestrator.with_journal(journal);
    }

    let summary = orchestrator.run().context("Run aborted")?;
    print_summary(&summary, start.elapsed());

    let code = summary.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
