//! mylog CLI: write test records and look after rotated log files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mylog::record::TIMESTAMP_FORMAT;
use mylog::rotation;
use mylog::{parse_line, Level, Logger, LoggerConfig};

#[derive(Parser)]
#[command(
    name = "mylog",
    about = "Leveled logging to the terminal or to size-rotated files",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a message through a logger built from flags or a config file
    Emit {
        /// Message to log
        message: String,
        /// Logger kind: console or file
        #[arg(long, default_value = "console")]
        kind: String,
        /// Logger threshold level
        #[arg(long, default_value = "debug")]
        level: String,
        /// Log directory (file loggers)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Log file name (file loggers)
        #[arg(long)]
        name: Option<String>,
        /// Rotate files at this many bytes
        #[arg(long, default_value_t = 10 * 1024 * 1024)]
        max_size: u64,
        /// YAML logger config; overrides the flags above
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Level of the emitted message
        #[arg(long, default_value = "info")]
        at: String,
        /// How many times to write the message
        #[arg(long, short = 'n', default_value_t = 1)]
        count: usize,
    },
    /// List rotated backups of a log file
    Backups {
        /// Log directory
        dir: PathBuf,
        /// Log file name (e.g. app.log or app.log.err)
        name: String,
    },
    /// Remove old backups, keeping the N most recent
    Clean {
        /// Log directory
        dir: PathBuf,
        /// Log file name
        name: String,
        /// Number of most recent backups to keep
        #[arg(long, short, default_value_t = 5)]
        keep: usize,
        /// Actually delete (default: dry run)
        #[arg(long)]
        force: bool,
    },
    /// Summarize a log file: lines per level and time span
    Inspect {
        /// Path to the log file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout belongs to the console logger.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Emit {
            message,
            kind,
            level,
            dir,
            name,
            max_size,
            config,
            at,
            count,
        } => {
            let config = match config {
                Some(path) => LoggerConfig::load(&path)?,
                None => LoggerConfig::from_args(
                    &kind,
                    &level,
                    max_size,
                    dir.as_deref(),
                    name.as_deref(),
                )?,
            };
            cmd_emit(config, &message, &at, count)?;
        }
        Commands::Backups { dir, name } => {
            cmd_backups(dir, name)?;
        }
        Commands::Clean {
            dir,
            name,
            keep,
            force,
        } => {
            cmd_clean(dir, name, keep, force)?;
        }
        Commands::Inspect { file } => {
            cmd_inspect(file)?;
        }
    }

    Ok(())
}

// ─── Command implementations ──────────────────────────────────────────────────

fn cmd_emit(config: LoggerConfig, message: &str, at: &str, count: usize) -> Result<()> {
    let at = Level::parse(at)?;
    let logger = Logger::new(&config)?;

    for _ in 0..count {
        mylog::log!(logger, at, "{}", message);
    }

    if let Logger::File(file) = &logger {
        let dropped = file.dropped();
        info!(
            file = %file.path().display(),
            written = count as u64 - dropped,
            dropped,
            "Emitted records"
        );
    }
    logger.close();
    Ok(())
}

fn cmd_backups(dir: PathBuf, name: String) -> Result<()> {
    let backups = rotation::list_backups(&dir, &name)?;

    if backups.is_empty() {
        println!("No backups of '{}' in '{}'", name, dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Backup", "Size"]);
    for backup in &backups {
        table.add_row([backup.name.as_str(), &format_size(backup.size)]);
    }

    println!("Backups of {} in {}", name, dir.display());
    println!("{}", table);
    Ok(())
}

fn cmd_clean(dir: PathBuf, name: String, keep: usize, force: bool) -> Result<()> {
    let doomed = rotation::prune_plan(&dir, &name, keep)?;

    if doomed.is_empty() {
        println!("Nothing to clean: '{}' has at most {} backup(s)", name, keep);
        return Ok(());
    }

    println!(
        "Will delete {} backup(s) of '{}' (keeping {} most recent):",
        doomed.len(),
        name,
        keep
    );
    for backup in &doomed {
        println!("  - {}", backup.name);
    }

    if !force {
        println!("\nDry run. Use --force to actually delete.");
        return Ok(());
    }

    for backup in rotation::prune_backups(&dir, &name, keep)? {
        println!("  ✓ Deleted {}", backup.name);
    }

    println!("Done.");
    Ok(())
}

fn cmd_inspect(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Log file not found: {}", file.display());
    }

    let content = std::fs::read_to_string(&file)?;
    let mut counts: BTreeMap<Level, usize> = Level::ALL.iter().map(|l| (*l, 0)).collect();
    let mut unparsed = 0usize;
    let mut first = None;
    let mut last = None;

    for line in content.lines() {
        match parse_line(line) {
            Some(parsed) => {
                *counts.entry(parsed.level).or_default() += 1;
                first.get_or_insert(parsed.timestamp);
                last = Some(parsed.timestamp);
            }
            None => unparsed += 1,
        }
    }

    println!("File: {}", file.display());
    if let (Some(first), Some(last)) = (first, last) {
        println!("First: {}", first.format(TIMESTAMP_FORMAT));
        println!("Last:  {}", last.format(TIMESTAMP_FORMAT));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Level", "Lines"]);
    for (level, n) in &counts {
        table.add_row([level.as_str(), &n.to_string()]);
    }
    if unparsed > 0 {
        table.add_row(["(unparsed)", &unparsed.to_string()]);
    }
    println!("{}", table);

    Ok(())
}

// ─── Utilities ────────────────────────────────────────────────────────────────

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
