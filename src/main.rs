//! http-recorder CLI

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use http_recorder::config::{Config, Mode};
use http_recorder::matcher::{RecordMatcher, SimpleMatcher};
use http_recorder::storage;

#[derive(Parser)]
#[command(name = "http-recorder", version, about = "Inspect HTTP record/playback sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show what a recording directory holds
    Inspect {
        /// Recording directory
        #[arg(long, default_value = "SessionRecords")]
        dir: PathBuf,
        /// Records archive file name
        #[arg(long, default_value = "records.zip")]
        records: String,
        /// Asset names file name
        #[arg(long, default_value = "names.json")]
        names: String,
        /// Headers taking part in the match-key
        #[arg(long = "match-header")]
        match_headers: Vec<String>,
    },
    /// Print the mode selected by the environment
    Mode,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Inspect {
            dir,
            records,
            names,
            match_headers,
        } => {
            let config = Config {
                recording_dir: dir,
                records_file: records,
                names_file: names,
                ..Config::default()
            };
            inspect(&config, &SimpleMatcher::with_headers(match_headers))
        }
        Command::Mode => {
            let mode = Mode::from_env()?;
            println!("{mode}");
            Ok(())
        }
    }
}

fn inspect(config: &Config, matcher: &dyn RecordMatcher) -> anyhow::Result<()> {
    let records_path = config.records_path();
    let members = storage::read_archive(&records_path)
        .with_context(|| format!("reading {}", records_path.display()))?;

    println!("Records: {}", records_path.display());
    let mut keys: BTreeMap<String, usize> = BTreeMap::new();
    for member in &members {
        println!("  {} ({} entries)", member.name, member.entries.len());
        for entry in &member.entries {
            *keys.entry(matcher.entry_key(entry)).or_default() += 1;
        }
    }

    println!();
    println!("Keys:");
    for (key, count) in &keys {
        println!("  {count:>4}  {key}");
    }

    let names_path = config.names_path();
    if names_path.is_file() {
        let names = storage::read_names(&names_path)
            .with_context(|| format!("reading {}", names_path.display()))?;
        println!();
        println!("Names: {}", names_path.display());
        for (test, generated) in &names {
            println!("  {test}: {}", generated.join(", "));
        }
    }

    Ok(())
}
