//! muninn: ticker resolution CLI
//!
//! Resolve company names to symbols, inspect provider and cache state.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use muninn::cache::FileStore;
use muninn::{
    Config, Muninn, ResolutionMode, ResolutionResult, ResolveOptions, TickerResolutionService,
};

/// Muninn ticker resolver
#[derive(Parser)]
#[command(name = "muninn")]
#[command(version = muninn::PKG_VERSION)]
#[command(about = "Resolve company names and aliases to ticker symbols")]
struct Args {
    /// Config file (default: ~/.muninn/config.toml, then /etc/muninn/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolution mode, overriding config and MUNINN_MODE
    #[arg(short, long)]
    mode: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a query to a ticker symbol
    Resolve {
        /// Company name, alias or symbol
        query: String,
        /// Bypass the name→symbol cache
        #[arg(long)]
        skip_cache: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show mode, provider and cache status
    Status,

    /// Empty both resolution caches
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let service = build_service(&args)?;
    service.initialize()?;

    let code = match args.command {
        Command::Resolve {
            query,
            skip_cache,
            json,
        } => {
            let options = ResolveOptions::new().skip_cache(skip_cache);
            let result = service.resolve(&query, &options).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }

        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&service.status())?);
            ExitCode::SUCCESS
        }

        Command::ClearCache => {
            service.clear_cache();
            println!("caches cleared");
            ExitCode::SUCCESS
        }
    };

    service.persist()?;
    Ok(code)
}

fn build_service(args: &Args) -> muninn::Result<TickerResolutionService> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_mode_override(args.mode.as_deref())?;

    let mut builder = Muninn::builder().from_config(&config);
    if config.cache.dir.is_none() {
        builder = builder.store(std::sync::Arc::new(FileStore::default_location()?));
    }
    if config.mode == ResolutionMode::Mock {
        tracing::info!("running in mock mode, no network access");
    }
    builder.build()
}

fn print_result(result: &ResolutionResult) {
    match result {
        ResolutionResult::Success(t) => {
            let cached = if t.from_cache { ", cached" } else { "" };
            println!("{}  {}", t.symbol, t.name);
            println!("  sector: {}", t.sector);
            println!(
                "  confidence: {:.2} (source: {}{cached})",
                t.confidence, t.source
            );
        }
        ResolutionResult::Candidates {
            candidates,
            message,
        } => {
            println!("{message}");
            for c in candidates {
                println!("  {}  {}  ({:.2})", c.symbol, c.name, c.confidence);
            }
        }
        ResolutionResult::Error(e) => {
            eprintln!("error: {e}");
            if let Some(suggestions) = &e.suggestions {
                eprintln!("  did you mean: {}", suggestions.join(", "));
            }
            if let Some(ms) = e.retry_after_ms() {
                eprintln!("  retry after {:.0}s", ms as f64 / 1000.0);
            }
        }
    }
}
