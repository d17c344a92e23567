use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::Result;
use arbolito::render::reply_to;
use arbolito::{Collector, Config, QueryService, QuoteStore, bot, source};
use clap::{Parser, Subcommand};
use log::{error, info};

#[derive(Parser)]
#[command(name = "arbolito")]
#[command(about = "USD/ARS bank quote collector and query bot", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collection cycle and append the batch to the store
    Collect,

    /// Answer a query such as `BNA 2025-04-25` or `TODOS`
    Query { words: Vec<String> },

    /// Serve the Telegram webhook and JSON query endpoints
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_logging(&cli.log_level, config.log_file.as_deref())?;

    match cli.command {
        Commands::Collect => collect(&config).await?,
        Commands::Query { words } => {
            let service = QueryService::new(QuoteStore::new(&config.data_file));
            println!("{}", reply_to(&service, &words.join(" ")));
        }
        Commands::Serve => bot::serve(&config).await?,
    }

    Ok(())
}

async fn collect(config: &Config) -> Result<()> {
    let sources = source::default_sources(config)?;
    let records = Collector::new(sources).collect().await;

    let store = QuoteStore::new(&config.data_file);
    info!("Saving data to CSV at: {}", store.path().display());
    match store.append(&records) {
        Ok(count) => info!("Successfully saved {count} records to CSV"),
        Err(e) => error!("Failed to save to CSV: {e}"),
    }

    Ok(())
}

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
