//! # XDSCTL CLI
//!
//! Offline command-line tool for `NodeConfigCache` manifests.
//!
//! Runs the controller's own decoding against local files, so a broken
//! resource is caught before it is applied to a cluster.
//!
//! ## Usage
//!
//! ```bash
//! # Decode every inline resource of a manifest and print the snapshot summary
//! xdsctl validate -f cache.yaml
//!
//! # Re-encode a cluster written as YAML into base64 JSON
//! xdsctl convert --kind cluster --from human-readable --to encoded-structured -f cluster.yaml
//!
//! # Same, reading stdin
//! cat cluster.json | xdsctl convert --kind cluster --to human-readable
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use xds_snapshot_controller::envoy::{Format, ResourceKind};

mod convert;
mod validate;

/// xDS Snapshot Controller CLI
#[derive(Parser)]
#[command(name = "xdsctl")]
#[command(
    about = "xDS Snapshot Controller CLI",
    long_about = None,
    after_help = "\
Formats:
  structured (or 'json'), human-readable (or 'yaml'), encoded-structured (or 'b64json')

Kinds:
  endpoint, cluster, route, listener, secret, runtime

Examples:
  xdsctl validate -f cache.yaml
  xdsctl convert --kind listener --from yaml --to json -f listener.yaml
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every inline resource of NodeConfigCache manifests
    /// Secret references are listed but not resolved
    Validate {
        /// Manifest file, may hold several YAML documents ('-' for stdin)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Re-encode one resource value between formats
    Convert {
        /// Resource kind of the value
        #[arg(short, long, value_parser = parse_kind)]
        kind: ResourceKind,

        /// Format of the input
        #[arg(long, value_parser = parse_format, default_value = "structured")]
        from: Format,

        /// Format to write
        #[arg(long, value_parser = parse_format)]
        to: Format,

        /// Input file (stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

fn parse_kind(value: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(value).ok_or_else(|| format!("unknown resource kind '{value}'"))
}

fn parse_format(value: &str) -> Result<Format, String> {
    Format::parse(value).ok_or_else(|| format!("unknown format '{value}'"))
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xdsctl=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { file } => {
            let input = read_input(Some(&file))?;
            validate::validate_command(&input)
        }
        Commands::Convert {
            kind,
            from,
            to,
            file,
        } => {
            let input = read_input(file.as_deref())?;
            let output = convert::convert(&input, kind, from, to)?;
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}
