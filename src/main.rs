mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use crawl_store::logging::{init_logging, init_stderr_logging, LogGuard};
use crawl_store::{CrawlStore, StoreConfig, StoreError};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl MainError {
    fn exit_code(&self) -> ExitCode {
        match self {
            MainError::Store(StoreError::QueueEmpty) => ExitCode::from(1),
            _ => ExitCode::from(3),
        }
    }
}

fn build_config(cli: &Cli) -> Result<StoreConfig, StoreError> {
    if let Some(path) = &cli.config {
        return StoreConfig::from_json_file(path);
    }

    let mut config = StoreConfig::new(&cli.path).with_prefix(cli.prefix.clone());
    if let Some(bucket) = &cli.bucket {
        config = config.with_bucket(bucket.clone());
    }
    Ok(config)
}

fn setup_logging(cli: &Cli) -> Result<Option<LogGuard>, MainError> {
    match &cli.log_dir {
        Some(dir) => init_logging(dir)
            .map(Some)
            .map_err(|e| MainError::Logging(e.to_string())),
        None => init_stderr_logging()
            .map(|_| None)
            .map_err(|e| MainError::Logging(e.to_string())),
    }
}

fn run(cli: Cli) -> Result<(), MainError> {
    let config = build_config(&cli)?;
    let store = CrawlStore::open(&config)?;

    match cli.command {
        Commands::Init => {
            println!("Initialized {} (bucket {})", config.path.display(), config.bucket_name());
        }
        Commands::Clear => {
            store.clear()?;
            println!("Cleared bucket {}", config.bucket_name());
        }
        Commands::Size => {
            println!("{}", store.queue_size()?);
        }
        Commands::Enqueue { payload } => {
            store.enqueue(payload.as_bytes())?;
        }
        Commands::Dequeue => {
            let payload = store.dequeue()?;
            println!("{}", String::from_utf8_lossy(&payload));
        }
        Commands::Peek => match store.peek()? {
            Some(payload) => println!("{}", String::from_utf8_lossy(&payload)),
            None => return Err(StoreError::QueueEmpty.into()),
        },
        Commands::Visit { fingerprint } => {
            store.mark_visited(fingerprint)?;
        }
        Commands::IsVisited { fingerprint } => {
            println!("{}", store.is_visited(fingerprint)?);
        }
        Commands::SetCookies { host, cookies } => {
            store.try_set_cookies(&host, &cookies)?;
        }
        Commands::Cookies { host } => {
            println!("{}", store.cookies(&host));
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            return e.exit_code();
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            e.exit_code()
        }
    }
}
