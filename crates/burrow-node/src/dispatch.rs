//! Routing inbound packets to sessions and replies back out.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use burrow_core::chunk::{ChunkSender, OrderedTransport};
use burrow_core::gopher::Fetch;
use burrow_core::session::{SessionStore, StoreConfig};

use crate::packet::{extract_sender, extract_text};

/// Ties the pieces together: per-identity sessions, the Gopher client
/// behind them, and the chunked reply path.
///
/// Each inbound message runs on its own task; messages from one
/// identity serialize on that identity's session lock while different
/// identities proceed in parallel.
#[derive(Clone)]
pub struct Navigator {
    store: Arc<SessionStore>,
    chunker: ChunkSender,
    transport: Arc<dyn OrderedTransport>,
}

impl Navigator {
    pub fn new(
        client: Arc<dyn Fetch>,
        transport: Arc<dyn OrderedTransport>,
        store_config: StoreConfig,
        chunker: ChunkSender,
    ) -> Self {
        Self {
            store: Arc::new(SessionStore::new(client, store_config)),
            chunker,
            transport,
        }
    }

    /// Sessions currently held.
    pub async fn session_count(&self) -> usize {
        self.store.session_count().await
    }

    /// Handle one packet event. Packets without text or a sender
    /// identity are not commands for us and are ignored. Returns the
    /// spawned task handle when the packet was dispatched.
    pub fn handle_packet(&self, packet: &Value) -> Option<JoinHandle<()>> {
        let Some(text) = extract_text(packet) else {
            trace!("packet without text, ignored");
            return None;
        };
        let Some(identity) = extract_sender(packet) else {
            trace!("packet without sender identity, ignored");
            return None;
        };
        let nav = self.clone();
        Some(tokio::spawn(async move {
            nav.handle_message(&identity, &text).await;
        }))
    }

    /// Run one command for one identity and deliver the reply.
    pub async fn handle_message(&self, identity: &str, text: &str) {
        debug!(identity, command = text, "inbound command");
        let session = self.store.get_or_create(identity).await;
        let reply = session.lock().await.handle_line(text).await;
        if let Err(e) = self
            .chunker
            .send(self.transport.as_ref(), identity, &reply)
            .await
        {
            warn!(identity, error = %e, "reply delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use burrow_core::gopher::{FetchResult, MenuEntry};
    use burrow_core::url::GopherUrl;
    use burrow_core::Result;

    struct EchoFetch;

    #[async_trait]
    impl Fetch for EchoFetch {
        async fn fetch(&self, url: &GopherUrl) -> Result<FetchResult> {
            Ok(FetchResult::File(vec![format!("fetched {}", url.selector)]))
        }

        async fn search(&self, _: &MenuEntry, _: &str) -> Result<Vec<MenuEntry>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl OrderedTransport for RecordingTransport {
        async fn send_text(&self, destination: &str, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((destination.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn navigator(transport: Arc<RecordingTransport>) -> Navigator {
        Navigator::new(
            Arc::new(EchoFetch),
            transport,
            StoreConfig::default(),
            ChunkSender {
                pacing: Duration::ZERO,
                retry_backoff: Duration::ZERO,
                ..ChunkSender::default()
            },
        )
    }

    #[tokio::test]
    async fn packets_without_text_or_sender_are_ignored() {
        let nav = navigator(Arc::new(RecordingTransport::default()));
        assert!(nav.handle_packet(&json!({"fromId": "!a"})).is_none());
        assert!(nav
            .handle_packet(&json!({"decoded": {"text": "n"}}))
            .is_none());
        assert_eq!(nav.session_count().await, 0);
    }

    #[tokio::test]
    async fn dispatched_packet_replies_to_its_sender() {
        let transport = Arc::new(RecordingTransport::default());
        let nav = navigator(Arc::clone(&transport));
        let packet = json!({
            "fromId": "!node1",
            "decoded": {"text": "u gopher://x.org/0/doc.txt"}
        });
        nav.handle_packet(&packet).unwrap().await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "!node1");
        assert!(sent[0].1.contains("fetched /doc.txt"), "got: {}", sent[0].1);
    }

    #[tokio::test]
    async fn identities_get_separate_sessions() {
        let transport = Arc::new(RecordingTransport::default());
        let nav = navigator(Arc::clone(&transport));
        nav.handle_message("!a", "u gopher://x.org/0/doc.txt").await;
        nav.handle_message("!b", "x").await;
        assert_eq!(nav.session_count().await, 2);

        let sent = transport.sent.lock().unwrap();
        // !b never opened anything; its session is independent of !a's.
        let to_b: Vec<_> = sent.iter().filter(|(d, _)| d == "!b").collect();
        assert_eq!(to_b.len(), 1);
        assert_eq!(to_b[0].1, "Nothing open yet.");
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        struct FailingTransport;

        #[async_trait]
        impl OrderedTransport for FailingTransport {
            async fn send_text(&self, _: &str, _: &str) -> Result<()> {
                Err(burrow_core::Error::transport("radio gone"))
            }
        }

        let nav = Navigator::new(
            Arc::new(EchoFetch),
            Arc::new(FailingTransport),
            StoreConfig::default(),
            ChunkSender {
                pacing: Duration::ZERO,
                retry_backoff: Duration::ZERO,
                ..ChunkSender::default()
            },
        );
        // Must not panic or poison the session.
        nav.handle_message("!a", "x").await;
        assert_eq!(nav.session_count().await, 1);
    }
}
