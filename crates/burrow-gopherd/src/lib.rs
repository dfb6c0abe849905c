//! Minimal file-backed Gopher server for local demos and tests.
//!
//! Serves a directory tree: `gophermap`/`.gophermap` files become
//! menus, other files are served as text, and anything else answers
//! with a type-`3` error menu. One task per connection; a connection
//! carries exactly one transaction.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use burrow_core::Result;

const CRLF: &str = "\r\n";
const SELECTOR_READ_TIMEOUT: Duration = Duration::from_secs(10);
const GOPHERMAP_NAMES: [&str; 2] = ["gophermap", ".gophermap"];

/// A running server; dropping it does not stop the accept loop, call
/// [`shutdown`](Gopherd::shutdown).
pub struct Gopherd {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl Gopherd {
    /// Bind `addr` (e.g. `127.0.0.1:0`) and start serving `root`.
    pub async fn bind(addr: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let root: Arc<PathBuf> = Arc::new(tokio::fs::canonicalize(root.into()).await?);
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        info!(%local_addr, root = %root.display(), "gopherd listening");
        let accept_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    accepted = listener.accept() => {
                        let (stream, peer) = match accepted {
                            Ok(pair) => pair,
                            Err(e) => {
                                warn!(error = %e, "accept failed");
                                continue;
                            }
                        };
                        let root = Arc::clone(&root);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &root).await {
                                debug!(%peer, error = %e, "connection ended with error");
                            }
                        });
                    }
                }
            }
        });

        Ok(Self {
            local_addr,
            shutdown_tx,
            accept_task,
        })
    }

    /// Address the server actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.accept_task.await;
    }
}

/// One transaction: read the selector line, answer, close.
async fn handle_connection(mut stream: TcpStream, root: &Path) -> Result<()> {
    let selector = read_selector(&mut stream).await?;
    debug!(selector, "request");
    let response = respond(root, &selector).await;
    stream.write_all(&response).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read up to the first LF, bounded by the idle timeout; CR is
/// stripped. EOF before any newline yields what was read so far.
async fn read_selector(stream: &mut TcpStream) -> Result<String> {
    let mut collected = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = tokio::time::timeout(SELECTOR_READ_TIMEOUT, stream.read(&mut buf))
            .await
            .map_err(|_| burrow_core::Error::Timeout)??;
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&buf[..n]);
        if buf[..n].contains(&b'\n') {
            break;
        }
    }
    let raw = String::from_utf8_lossy(&collected);
    let line = raw.split('\n').next().unwrap_or("");
    Ok(line.trim_end_matches('\r').to_string())
}

/// Map a selector to filesystem content. Anything after a tab (search
/// queries, Gopher+ markers) is ignored.
async fn respond(root: &Path, selector: &str) -> Vec<u8> {
    let path_part = selector.split('\t').next().unwrap_or("");
    let rel = path_part.trim_start_matches('/');

    // Selectors never escape the served root.
    if rel.split('/').any(|segment| segment == "..") {
        return error_menu(&format!("Invalid selector: {path_part}"));
    }

    if rel.is_empty() {
        return serve_menu(root).await;
    }

    let fs_path = root.join(rel);
    match tokio::fs::metadata(&fs_path).await {
        Ok(md) if md.is_dir() => serve_menu(&fs_path).await,
        Ok(md) if md.is_file() => serve_text_file(&fs_path).await,
        _ => error_menu(&format!(
            "Selector not found: {}",
            if path_part.is_empty() { "/" } else { path_part }
        )),
    }
}

async fn serve_menu(dir: &Path) -> Vec<u8> {
    let Some(map_path) = find_gophermap(dir).await else {
        return error_menu(&format!("No gophermap in {}", dir.display()));
    };
    match tokio::fs::read_to_string(&map_path).await {
        Ok(content) => {
            let mut lines: Vec<&str> = content.lines().collect();
            if lines.last() != Some(&".") {
                lines.push(".");
            }
            let mut out = lines.join(CRLF);
            out.push_str(CRLF);
            out.into_bytes()
        }
        Err(e) => error_menu(&format!("Failed to read menu: {e}")),
    }
}

async fn serve_text_file(path: &Path) -> Vec<u8> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let content = String::from_utf8_lossy(&bytes);
            let body = content.replace("\r\n", "\n").replace('\r', "\n");
            let body = body.trim_end_matches('\n');
            format!("{body}{CRLF}.{CRLF}").into_bytes()
        }
        Err(e) => error_menu(&format!("Failed to read file: {e}")),
    }
}

fn error_menu(message: &str) -> Vec<u8> {
    format!("3{message}\tfake\tlocalhost\t0{CRLF}.{CRLF}").into_bytes()
}

async fn find_gophermap(dir: &Path) -> Option<PathBuf> {
    for name in GOPHERMAP_NAMES {
        let candidate = dir.join(name);
        if tokio::fs::metadata(&candidate)
            .await
            .map(|md| md.is_file())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
    }
    None
}
