use anyhow::{Context, Result};
use clap::Parser;
use httpexec::commands::{self, Config, Overrides};
use log::debug;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// httpexec - HTTP requests with retries, timeouts and batching
///
/// Settings are read from the file given by --config, or from
/// <config dir>/httpexec/config.json when it exists. Flags win over the file.
///
/// Examples:
///   httpexec send https://example.com/health
///   httpexec send -X POST -H "Content-Type: application/json" -d '{}' https://example.com/items
///   httpexec batch requests.json --concurrency 4
#[derive(Parser, Debug)]
#[command(author, version = env!("HTTPEXEC_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (JSON)
    #[arg(long, env = "HTTPEXEC_CONFIG", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Total time budget per request in seconds
    #[arg(long, env = "HTTPEXEC_TIMEOUT", value_name = "SECONDS", global = true)]
    timeout: Option<u64>,

    /// Retries after the first attempt
    #[arg(long, env = "HTTPEXEC_MAX_RETRIES", value_name = "N", global = true)]
    max_retries: Option<u32>,

    /// Status codes to retry, comma separated (e.g. 429,503)
    #[arg(long, value_delimiter = ',', value_name = "CODES", global = true)]
    retry_status: Option<Vec<u16>>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a single request and print the response body
    Send(SendArgs),

    /// Run requests from a JSON file and print the outcomes as JSON
    Batch(BatchArgs),
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Request URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request header, repeatable ("Name: value")
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Request body
    #[arg(short = 'd', long = "data", value_name = "BODY")]
    pub body: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// JSON file with an array of requests ("-" for stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Maximum number of requests in flight
    #[arg(long, env = "HTTPEXEC_CONCURRENCY", value_name = "N")]
    pub concurrency: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let concurrency_limit = match &self.command {
            Commands::Batch(args) => args.concurrency,
            Commands::Send(_) => None,
        };
        Overrides {
            timeout_seconds: self.timeout,
            max_retries: self.max_retries,
            retryable_status_codes: self.retry_status.clone(),
            concurrency_limit,
        }
    }
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read requests from stdin")?;
        Ok(input)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .init();

    let config = Config::new(cli.config.as_deref(), &cli.overrides())?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted, cancelling");
            trigger.cancel();
        }
    });

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Send(args) => {
            let request = commands::build_request(
                &args.method,
                &args.url,
                &args.headers,
                args.body.as_deref(),
            )?;
            commands::send(
                &config.executor,
                &request,
                &config.settings,
                &cancel,
                &mut stdout,
            )
            .await?;
        }
        Commands::Batch(args) => {
            let input = read_input(&args.file)?;
            commands::batch(
                &config.executor,
                &input,
                &config.settings,
                &cancel,
                &mut stdout,
            )
            .await?;
        }
    }
    Ok(())
}
