use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "docscan", version, about = "Offline identity document capture")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enhance, OCR, classify and extract fields from an uploaded document
    Scan(commands::ScanArgs),
    /// List the most recently saved scans
    Recent {
        /// How many records to show (defaults to `recent_limit` from config)
        #[arg(short, long)]
        limit: Option<u32>,
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for --json output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = docscan_core::Config::load()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration resolved");

    match cli.command {
        Command::Scan(args) => commands::scan(&config, args).await,
        Command::Recent { limit, json } => commands::recent(&config, limit, json).await,
        Command::Config => commands::show_config(&config),
    }
}

/// `FIELD=VALUE` pairs from `--set`.
pub(crate) fn parse_field_edit(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("empty field name in '{s}'"));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

pub(crate) fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
