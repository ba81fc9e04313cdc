use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indirect_engine::{
    Field, ProviderRegistry, Value,
    provider::{DEFAULT, DefaultHttpFetcher},
};
use indirect_util::HttpFetchConfig;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "indirect", version, about = "Resolve and wrap provider-tagged JSON values")]
struct Cli {
    /// Overall timeout in seconds for `url` fetches (0 disables it)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a tagged record and print the materialized value
    Resolve {
        /// File holding the record; reads stdin when omitted
        path: Option<PathBuf>,
    },
    /// Wrap a JSON document as a `static` tagged record
    Wrap {
        /// File holding the document; reads stdin when omitted
        path: Option<PathBuf>,
    },
    /// List registered providers
    Providers,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = HttpFetchConfig::from_env();
    if let Some(seconds) = cli.timeout {
        config = config.with_timeout((seconds > 0).then(|| Duration::from_secs(seconds)));
    }
    let registry = ProviderRegistry::with_fetcher(DefaultHttpFetcher::new(config));

    match cli.command {
        Command::Resolve { path } => resolve(&registry, path.as_deref()),
        Command::Wrap { path } => wrap(path.as_deref()),
        Command::Providers => {
            for name in registry.names() {
                println!("{}", if name == DEFAULT { "(default)" } else { name });
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(io::stderr)
        .try_init();
}

fn log_filter() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
}

fn resolve(registry: &ProviderRegistry, path: Option<&Path>) -> Result<()> {
    let input = read_input(path)?;
    let value = Value::<serde_json::Value>::decode_with(registry, &input).context("failed to resolve tagged record")?;
    debug!(provider = %value.effective_provider(), "record resolved");
    println!("{}", serde_json::to_string_pretty(&value.value)?);
    Ok(())
}

fn wrap(path: Option<&Path>) -> Result<()> {
    let input = read_input(path)?;
    let document: serde_json::Value = serde_json::from_slice(&input).context("input is not valid JSON")?;
    if let Some(encoded) = Field::new("input", &document).encode()? {
        println!("{}", String::from_utf8(encoded)?);
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer).context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}
