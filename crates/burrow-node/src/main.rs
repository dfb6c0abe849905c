use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{info, warn};

use burrow_core::chunk::OrderedTransport;
use burrow_core::gopher::GopherClient;
use burrow_core::{init_logging, Result};
use burrow_node::cli::Args;
use burrow_node::Navigator;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.log_file.as_deref(), args.log_format())?;

    let client = Arc::new(GopherClient::new());
    if args.stdio {
        run_stdio(&args, client).await
    } else {
        run_bridge(&args, client).await
    }
}

/// Development mode: `identity<TAB>command` lines on stdin, replies on
/// stdout. A line without a tab gets the `local` identity.
async fn run_stdio(args: &Args, client: Arc<GopherClient>) -> Result<()> {
    struct StdioTransport;

    #[async_trait::async_trait]
    impl OrderedTransport for StdioTransport {
        async fn send_text(&self, destination: &str, text: &str) -> Result<()> {
            let mut out = tokio::io::stdout();
            out.write_all(format!(">> {destination}\n{text}\n\n").as_bytes())
                .await?;
            out.flush().await?;
            Ok(())
        }
    }

    let navigator = Navigator::new(
        client,
        Arc::new(StdioTransport),
        args.store_config(),
        args.chunk_sender(),
    );

    info!("stdio mode; type: identity<TAB>command");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (identity, command) = match line.split_once('\t') {
            Some((identity, command)) => (identity, command),
            None => ("local", line),
        };
        navigator.handle_message(identity, command).await;
    }
    Ok(())
}

/// Bridge mode: a JSON-lines TCP peer delivers packet events inbound
/// and accepts `{"to": ..., "text": ...}` lines outbound.
async fn run_bridge(args: &Args, client: Arc<GopherClient>) -> Result<()> {
    struct JsonLineTransport {
        writer: Mutex<OwnedWriteHalf>,
    }

    #[async_trait::async_trait]
    impl OrderedTransport for JsonLineTransport {
        async fn send_text(&self, destination: &str, text: &str) -> Result<()> {
            let mut line = json!({"to": destination, "text": text}).to_string();
            line.push('\n');
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
            Ok(())
        }
    }

    info!(
        host = args.mesh_host,
        port = args.mesh_port,
        "connecting to mesh bridge"
    );
    let stream = TcpStream::connect((args.mesh_host.as_str(), args.mesh_port)).await?;
    let (read, write) = stream.into_split();
    let navigator = Navigator::new(
        client,
        Arc::new(JsonLineTransport {
            writer: Mutex::new(write),
        }),
        args.store_config(),
        args.chunk_sender(),
    );

    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(packet) => {
                navigator.handle_packet(&packet);
            }
            Err(e) => warn!(error = %e, "unparseable bridge line, skipped"),
        }
    }
    info!("bridge connection closed");
    Ok(())
}
