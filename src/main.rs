use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use console::style;

use salvage::config::Config;
use salvage::logging::init_logging;
use salvage::manifest::{manifest_path, Manifest};
use salvage::scanner::{DedupMode, ScanConfig, ScanReport, Scanner};
use salvage::session_log::SessionLog;
use salvage::utils::{calculate_percentage, format_elapsed, format_file_size};
use salvage::verify::{verify_directory, EntryStatus, VerifyReport};
use salvage::walker::WalkFilter;
use salvage::Mode;

#[derive(Parser)]
#[command(
    name = "salvage",
    version,
    about = "Checksum, verify and deduplicate recovered file collections",
    long_about = "Record checksum manifests for directories of recovered files, verify directories against those manifests, and find or remove exact duplicates by content hash and size."
)]
struct Cli {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a checksum manifest (checkSum.txt) for the files in a directory
    Checksum {
        /// Directory to checksum (not recursive)
        #[arg(short = 't', long = "target", alias = "target_path", value_name = "DIR")]
        target: Option<PathBuf>,

        /// Append a session log to this file
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,
    },

    /// Compare a directory against its checksum manifest
    Verify {
        /// Directory holding the files and their checkSum.txt
        #[arg(short = 't', long = "target", alias = "target_path", value_name = "DIR")]
        target: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Append a session log to this file
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,
    },

    /// Find duplicate files by content and optionally remove them
    Dedup {
        /// Directories to scan recursively (can be specified multiple times)
        #[arg(
            short = 's',
            long = "source",
            alias = "source_path",
            value_name = "PATH",
            num_args = 1..
        )]
        sources: Vec<PathBuf>,

        /// test = report only, remove = delete duplicates
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,

        /// Minimum file size in bytes to consider
        #[arg(long, default_value = "0", value_name = "BYTES")]
        min_size: u64,

        /// Only consider these file extensions (comma-separated)
        #[arg(long = "type", value_name = "EXT", value_delimiter = ',')]
        file_types: Vec<String>,

        /// Number of hashing threads (0 = auto-detect)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Append a session log to this file
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,

        /// Skip the confirmation prompt in remove mode
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli.command) {
        eprintln!("{}", style(format!("ERROR: {:#}", err)).red().bold());
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    let start = Instant::now();

    let json = match command {
        Command::Checksum { target, log } => {
            let config = Config {
                target_path: target,
                ..Config::default()
            };
            checksum(&config, log.map(SessionLog::new))?;
            false
        }
        Command::Verify { target, json, log } => {
            let config = Config {
                target_path: target,
                ..Config::default()
            };
            verify(&config, json, log.map(SessionLog::new))?;
            json
        }
        Command::Dedup {
            sources,
            mode,
            min_size,
            file_types,
            threads,
            json,
            log,
            yes,
        } => {
            let config = Config {
                mode,
                source_paths: sources,
                file_types: file_types.into_iter().collect::<HashSet<_>>(),
                min_size,
                ..Config::default()
            };
            dedup(&config, threads, json, yes, log.map(SessionLog::new))?;
            json
        }
    };

    if !json {
        println!();
        println!(
            "{}",
            style(format!("Total process time: {}", format_elapsed(start.elapsed()))).dim()
        );
    }
    Ok(())
}

fn checksum(config: &Config, session: Option<SessionLog>) -> Result<()> {
    let target = config.target_dir()?;
    record(&session, &format!("Checksum {}", target.display()));

    println!("{}", style("Processing files, please wait as this might take a while.").cyan());

    let (manifest, skipped) = Manifest::generate_with_skipped(target)
        .with_context(|| format!("Failed to checksum {}", target.display()))?;
    let path = manifest.write(target)?;

    for error in &skipped {
        let line = format!("Skipped: {}", error);
        println!("{}", style(&line).yellow());
        record(&session, &line);
    }

    let summary = format!("Total files: {}", manifest.len());
    record(&session, &summary);

    println!();
    println!("{}", summary);
    println!("Manifest written to: {}", path.display());
    Ok(())
}

fn verify(config: &Config, json: bool, session: Option<SessionLog>) -> Result<()> {
    let target = config.target_dir()?;
    record(&session, &format!("Verify {}", manifest_path(target).display()));

    if !json {
        println!("{}", style("Processing files, please wait as this might take a while.").cyan());
    }

    let report = verify_directory(target)?;

    for result in report.mismatches() {
        let line = match &result.status {
            EntryStatus::NotFound => format!("File not found: {}", result.path.display()),
            EntryStatus::ContentDiffers => format!("File not the same: {}", result.path.display()),
            EntryStatus::Unreadable(reason) => {
                format!("File unreadable: {} ({})", result.path.display(), reason)
            }
            EntryStatus::Matched => continue,
        };
        if !json {
            println!("{}", style(&line).yellow());
        }
        record(&session, &line);
    }

    let summary = format!("Matched {} of {} files", report.matched(), report.total());
    record(&session, &summary);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_verify_summary(&report, &summary);
    }
    Ok(())
}

fn print_verify_summary(report: &VerifyReport, summary: &str) {
    println!();
    let line = format!(
        "{} ({:.1}%)",
        summary,
        calculate_percentage(report.matched(), report.total())
    );
    if report.all_matched() {
        println!("{}", style(line).green().bold());
    } else {
        println!("{}", style(line).red().bold());
    }
}

fn dedup(
    config: &Config,
    threads: usize,
    json: bool,
    yes: bool,
    session: Option<SessionLog>,
) -> Result<()> {
    let sources = config.source_dirs()?;
    let mode = config.dedup_mode()?;

    if mode == DedupMode::Remove && !yes {
        let proceed = dialoguer::Confirm::new()
            .with_prompt("Duplicate files will be deleted permanently. Continue?")
            .default(false)
            .interact()
            .context("Could not read confirmation; pass --yes to skip it")?;

        if !proceed {
            println!("{}", style("Operation cancelled").yellow());
            return Ok(());
        }
    }

    record(&session, "Open log");
    for source in sources {
        record(&session, &format!("Source Path: {}", source.display()));
    }

    if !json {
        println!(
            "{}",
            style(format!(
                "Scanning {} source path(s) for duplicate files...",
                sources.len()
            ))
            .cyan()
            .bold()
        );
    }

    let scanner = Scanner::new(ScanConfig {
        mode,
        filter: WalkFilter {
            min_size: config.min_size,
            file_types: config.normalized_file_types(),
        },
        threads,
        show_progress: !json,
    });
    let report = scanner.scan(sources)?;

    for dupe in &report.duplicates {
        let outcome = match &dupe.delete {
            Some(outcome) => format!(" ({})", outcome),
            None => String::new(),
        };
        record(
            &session,
            &format!(
                "Duplicate: {} of {}{}",
                dupe.path.display(),
                dupe.original.display(),
                outcome
            ),
        );
    }
    for skipped in &report.skipped {
        record(&session, &format!("Skipped: {}", skipped.error));
    }
    record(&session, &summary_line(&report));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_scan_results(&report);
    }
    Ok(())
}

fn summary_line(report: &ScanReport) -> String {
    if report.duplicates_found() > 0 {
        format!("Total duplicate files found: {}", report.duplicates_found())
    } else {
        "No duplicate files found.".to_string()
    }
}

fn display_scan_results(report: &ScanReport) {
    for skipped in &report.skipped {
        println!("{}", style(format!("Skipped: {}", skipped.error)).yellow());
    }

    if report.mode == DedupMode::Test {
        for dupe in &report.duplicates {
            println!(
                "{} {} {}",
                style("Duplicate:").yellow(),
                dupe.path.display(),
                style(format!("(same as {})", dupe.original.display())).dim()
            );
        }
    } else {
        for dupe in &report.duplicates {
            if let Some(outcome) = dupe.delete.as_ref().filter(|o| !o.is_deleted()) {
                println!(
                    "{} {}: {}",
                    style("Not removed:").red(),
                    dupe.path.display(),
                    outcome
                );
            }
        }
    }

    println!();
    println!("Files scanned: {}", report.files_visited);
    if report.duplicates_found() > 0 {
        println!("{}", style(summary_line(report)).yellow().bold());
        match report.mode {
            DedupMode::Test => println!(
                "Duplicates occupy {}. Run with --mode remove to delete them.",
                format_file_size(report.duplicate_bytes())
            ),
            DedupMode::Remove => println!(
                "Removed {} file(s), freeing {}.",
                report.removed(),
                format_file_size(report.bytes_reclaimed())
            ),
        }
    } else {
        println!("{}", style(summary_line(report)).green().bold());
    }
}

fn record(session: &Option<SessionLog>, msg: &str) {
    if let Some(log) = session.as_ref() {
        log.record(msg);
    }
}
