//! Runwire command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Run a file against a local backend and exit when it finishes
//! runwire --file hello.ddp
//!
//! # Read the program from stdin and keep the session open until Ctrl-C
//! echo 'Schreibe "Hallo".' | runwire --page-url https://play.example.org/ --keep-open
//! ```

use std::{
    io::{self, Read},
    path::PathBuf,
    time::Duration,
};

use clap::Parser;
use runwire_app::{Runtime, RuntimeConfig};
use runwire_cli::{CliError, TerminalDriver, page_location};
use runwire_client::{RunSession, transport::TransportConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Runwire client
#[derive(Parser, Debug)]
#[command(name = "runwire")]
#[command(about = "Submit a program to a run backend and stream its output")]
#[command(version)]
struct Args {
    /// Page location the socket address is derived from
    #[arg(short, long, default_value = "http://localhost:3000/")]
    page_url: String,

    /// Source file to run (standard input when omitted)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Keep the session open after the first run finishes
    #[arg(long)]
    keep_open: bool,

    /// Quiet period after a run and bound on the close handshake, in
    /// milliseconds
    #[arg(long, default_value = "250")]
    close_grace_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn read_source(file: Option<&PathBuf>) -> Result<String, CliError> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let page = page_location(&args.page_url)?;
    let session = RunSession::for_page(&page)?;
    let source = read_source(args.file.as_ref())?;
    if source.is_empty() && !args.keep_open {
        tracing::warn!("empty source, nothing to run");
        return Ok(());
    }
    tracing::info!(socket = %session.connection().url(), bytes = source.len(), "starting session");

    let close_grace = Duration::from_millis(args.close_grace_ms);
    let driver = TerminalDriver::new(source, TransportConfig { close_grace });
    let closed = driver.closed();

    let config = RuntimeConfig {
        exit_after_run: !args.keep_open,
        exit_on_close: true,
        drain_grace: close_grace,
    };
    Runtime::new(driver, session, config).run().await?;

    // Let the transport flush the close notice before the process exits
    if tokio::time::timeout(close_grace * 2, closed).await.is_err() {
        tracing::debug!("connection still open at exit");
    }

    Ok(())
}
