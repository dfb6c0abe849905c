//! The Gopher transaction client.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::constants::SOCKET_TIMEOUT;
use crate::url::GopherUrl;
use crate::{Error, Result};

use super::plus::looks_extended;
use super::{parse_extended_menu, parse_menu, Fetch, FetchResult, MenuEntry};

/// TCP Gopher client performing one request/response exchange per call.
#[derive(Debug, Clone)]
pub struct GopherClient {
    /// Idle timeout applied to connect and each read.
    timeout: Duration,
}

impl GopherClient {
    pub fn new() -> Self {
        Self {
            timeout: SOCKET_TIMEOUT,
        }
    }

    /// Override the idle timeout (tests use a short one).
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// One full wire exchange: connect, send `request CRLF`, half-close
    /// the write side, read until EOF or idle timeout, decode lossy and
    /// split into lines.
    ///
    /// Gopher has no length framing; a read timeout ends the loop and
    /// whatever arrived so far is decoded rather than discarded.
    async fn exchange(&self, host: &str, port: u16, request: &str) -> Result<Vec<String>> {
        trace!(host, port, request, "gopher exchange");
        let mut stream = timeout(self.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Error::Timeout)??;

        stream.write_all(request.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        // FIN the write side; classic servers wait for it before replying.
        stream.shutdown().await?;

        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match timeout(self.timeout, stream.read(&mut buf)).await {
                Err(_) => {
                    debug!(host, port, received = data.len(), "read idle timeout");
                    break;
                }
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => data.extend_from_slice(&buf[..n]),
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        let text = String::from_utf8_lossy(&data);
        Ok(text.lines().map(str::to_string).collect())
    }

    /// Fetch a menu, probing for a Gopher+ extended response first.
    ///
    /// The probe appends `TAB +` to the selector; if the reply doesn't
    /// look extended (or the probe fails outright), a plain request is
    /// issued and decoded classically. Only the plain request's errors
    /// surface.
    async fn fetch_menu(&self, url: &GopherUrl) -> Result<Vec<MenuEntry>> {
        let probe = format!("{}\t+", url.selector);
        match self.exchange(&url.host, url.port, &probe).await {
            Ok(lines) if looks_extended(&lines) => {
                debug!(%url, "decoding Gopher+ menu");
                return Ok(parse_extended_menu(&lines));
            }
            Ok(_) => debug!(%url, "Gopher+ probe not extended, refetching plain"),
            Err(e) => debug!(%url, error = %e, "Gopher+ probe failed, refetching plain"),
        }
        let lines = self.exchange(&url.host, url.port, &url.selector).await?;
        Ok(parse_menu(&lines))
    }
}

impl Default for GopherClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for GopherClient {
    async fn fetch(&self, url: &GopherUrl) -> Result<FetchResult> {
        match url.item_type {
            '1' => Ok(FetchResult::Menu(self.fetch_menu(url).await?)),
            // Search endpoints need user terms before any request goes
            // out; hand back an entry carrying the endpoint coordinates.
            '7' | 't' | 'T' => Ok(FetchResult::Search(MenuEntry {
                item_type: '7',
                display: "[SEARCH]".to_string(),
                selector: url.selector.clone(),
                host: url.host.clone(),
                port: url.port,
                attributes: None,
            })),
            '0' => {
                let lines = self.exchange(&url.host, url.port, &url.selector).await?;
                Ok(FetchResult::File(lines))
            }
            _ => match self.exchange(&url.host, url.port, &url.selector).await {
                Ok(lines) => Ok(FetchResult::Binary {
                    byte_len: lines.join("\n").len(),
                    note: "Non-text gopher type".to_string(),
                }),
                // Unknown types have no better representation, so the
                // failure becomes part of the result instead of an error.
                Err(e) => Ok(FetchResult::Binary {
                    byte_len: 0,
                    note: format!("Error fetching: {e}"),
                }),
            },
        }
    }

    async fn search(&self, endpoint: &MenuEntry, payload: &str) -> Result<Vec<MenuEntry>> {
        let request = format!("{}\t{}", endpoint.selector, payload);
        let lines = self
            .exchange(&endpoint.host, endpoint.port, &request)
            .await?;
        Ok(parse_menu(&lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Serve one canned response per connection, forever, recording the
    /// request lines received.
    async fn spawn_server(response: &'static str) -> (std::net::SocketAddr, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let tx = tx.clone();
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut line = String::new();
                    let mut reader = BufReader::new(read);
                    let _ = reader.read_line(&mut line).await;
                    let _ = tx.send(line.trim_end_matches(['\r', '\n']).to_string());
                    let _ = write.write_all(response.as_bytes()).await;
                });
            }
        });
        (addr, rx)
    }

    fn menu_url(addr: std::net::SocketAddr, selector: &str) -> GopherUrl {
        GopherUrl {
            host: addr.ip().to_string(),
            port: addr.port(),
            item_type: '1',
            selector: selector.to_string(),
        }
    }

    #[tokio::test]
    async fn classic_menu_fetch() {
        let (addr, mut reqs) = spawn_server("1Menu\t/sel\thost\t70\r\n.\r\n").await;
        let client = GopherClient::new();
        let result = client.fetch(&menu_url(addr, "/world")).await.unwrap();
        let FetchResult::Menu(entries) = result else {
            panic!("expected menu");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].selector, "/sel");
        // Probe first, then the plain request.
        assert_eq!(reqs.recv().await.unwrap(), "/world\t+");
        assert_eq!(reqs.recv().await.unwrap(), "/world");
    }

    #[tokio::test]
    async fn extended_menu_detected_on_probe() {
        let (addr, mut reqs) =
            spawn_server("+INFO:7Find\t/find\th\t70\r\n+FIELDS:\r\nq\r\n.\r\n").await;
        let client = GopherClient::new();
        let result = client.fetch(&menu_url(addr, "")).await.unwrap();
        let FetchResult::Menu(entries) = result else {
            panic!("expected menu");
        };
        assert_eq!(entries[0].search_fields().unwrap(), &vec!["q".to_string()]);
        assert_eq!(reqs.recv().await.unwrap(), "\t+");
        // No second request: the probe response was used directly.
        assert!(reqs.try_recv().is_err());
    }

    #[tokio::test]
    async fn file_fetch_returns_lines_verbatim() {
        let (addr, _reqs) = spawn_server("first\r\nsecond\r\n").await;
        let client = GopherClient::new();
        let url = GopherUrl {
            item_type: '0',
            ..menu_url(addr, "/f.txt")
        };
        let result = client.fetch(&url).await.unwrap();
        assert_eq!(
            result,
            FetchResult::File(vec!["first".to_string(), "second".to_string()])
        );
    }

    #[tokio::test]
    async fn search_type_returns_endpoint_without_io() {
        let client = GopherClient::new();
        let url = GopherUrl {
            host: "unreachable.invalid".to_string(),
            port: 70,
            item_type: '7',
            selector: "/search".to_string(),
        };
        let FetchResult::Search(entry) = client.fetch(&url).await.unwrap() else {
            panic!("expected search");
        };
        assert_eq!(entry.item_type, '7');
        assert_eq!(entry.selector, "/search");
        assert_eq!(entry.host, "unreachable.invalid");
    }

    #[tokio::test]
    async fn binary_fetch_reports_length() {
        let (addr, _reqs) = spawn_server("abcd\r\nef\r\n").await;
        let client = GopherClient::new();
        let url = GopherUrl {
            item_type: '9',
            ..menu_url(addr, "/blob")
        };
        let FetchResult::Binary { byte_len, note } = client.fetch(&url).await.unwrap() else {
            panic!("expected binary");
        };
        assert_eq!(byte_len, "abcd\nef".len());
        assert_eq!(note, "Non-text gopher type");
    }

    /// Bind then drop a listener so the port is closed.
    async fn dead_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    #[tokio::test]
    async fn connection_error_propagates_for_menus() {
        let addr = dead_addr().await;
        let client = GopherClient::with_timeout(Duration::from_millis(500));
        let err = client.fetch(&menu_url(addr, "")).await.unwrap_err();
        assert!(matches!(err, Error::Io(_) | Error::Timeout));
    }

    #[tokio::test]
    async fn connection_error_is_captured_for_binary() {
        let addr = dead_addr().await;
        let client = GopherClient::with_timeout(Duration::from_millis(500));
        let url = GopherUrl {
            item_type: '9',
            ..menu_url(addr, "/blob")
        };
        let FetchResult::Binary { byte_len, note } = client.fetch(&url).await.unwrap() else {
            panic!("expected binary");
        };
        assert_eq!(byte_len, 0);
        assert!(note.starts_with("Error fetching: "));
    }

    #[tokio::test]
    async fn search_appends_tab_separated_payload() {
        let (addr, mut reqs) = spawn_server("1Hit\t/hit\th\t70\r\n.\r\n").await;
        let client = GopherClient::new();
        let endpoint = MenuEntry {
            item_type: '7',
            display: "[SEARCH]".to_string(),
            selector: "/find".to_string(),
            host: addr.ip().to_string(),
            port: addr.port(),
            attributes: None,
        };
        let entries = client.search(&endpoint, "Herbert\tDune").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(reqs.recv().await.unwrap(), "/find\tHerbert\tDune");
    }
}
