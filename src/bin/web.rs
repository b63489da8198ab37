#![cfg(not(tarpaulin_include))]

use catalog_lookup::app;
use catalog_lookup::config::LookupConfig;
use clap::Parser;

/// Serve the product lookup as a JSON API
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Catalog feed URL or local CSV file
    #[arg(long)]
    source: Option<String>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,
}

/// Main entry point for the web application
///
/// Logging defaults to `info` and can be changed with `RUST_LOG`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = LookupConfig::from_overrides(args.source.as_deref(), args.bind.as_deref());

    app::run(config).await
}
