use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use burrow_core::{init_logging, LogFormat, Result};
use burrow_gopherd::Gopherd;

/// Minimal file-backed Gopher server for local demos.
#[derive(Debug, Parser)]
#[command(name = "burrow-gopherd", version, about)]
struct Args {
    /// Directory to serve.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 picks a free port).
    #[arg(long, default_value_t = 7070)]
    port: u16,

    /// Increase verbosity (-v, -vv, ...).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write logs to a file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(args.verbose, args.log_file.as_deref(), format)?;

    let server = Gopherd::bind(&format!("{}:{}", args.host, args.port), args.root).await?;
    info!(addr = %server.local_addr(), "serving; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown().await;
    Ok(())
}
