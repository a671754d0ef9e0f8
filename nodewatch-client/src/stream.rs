use crate::error::ClientError;
use crate::model::StreamEvent;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What the reader task hands to the single consumer.
#[derive(Debug)]
pub enum StreamItem {
    Event(StreamEvent),
    /// The connection failed or ended. Nothing more will follow on this stream.
    TransportError(String),
}

/// Incremental decoder for `text/event-stream` bodies. Only the `data`
/// field matters to us; `event`, `id` and `retry` lines are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning the payload of every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned();
            let line = text.strip_suffix('\r').unwrap_or(text.as_str());

            if line.is_empty() {
                if !self.data.is_empty() {
                    payloads.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }

        payloads
    }
}

/// The receiving half of one progress connection.
///
/// At most one should be live per controller; closing (or dropping) it aborts
/// the reader task so a replaced connection never delivers stale events.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<StreamItem>,
    task: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Wrap an existing channel. Used by the HTTP client and by tests that
    /// script a feed by hand.
    pub fn from_channel(rx: mpsc::UnboundedReceiver<StreamItem>) -> Self {
        Self { rx, task: None }
    }

    pub(crate) fn with_task(rx: mpsc::UnboundedReceiver<StreamItem>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Wait for the next item. `None` once the sender side is gone.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.rx.recv().await
    }

    /// Non-blocking read for redraw loops. A sender that went away without
    /// saying so shows up as a transport error.
    pub fn try_next(&mut self) -> Option<StreamItem> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(StreamItem::TransportError(
                ClientError::StreamClosed.to_string(),
            )),
        }
    }

    pub fn close(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Create a channel pair suitable for [`EventStream::from_channel`].
pub fn event_channel() -> (mpsc::UnboundedSender<StreamItem>, mpsc::UnboundedReceiver<StreamItem>) {
    mpsc::unbounded_channel()
}

pub(crate) fn spawn_reader(response: reqwest::Response) -> EventStream {
    let (tx, rx) = event_channel();

    let task = tokio::spawn(async move {
        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tx.send(StreamItem::TransportError(ClientError::from(e).to_string()));
                    return;
                }
            };

            for payload in decoder.feed(&chunk) {
                match serde_json::from_str::<StreamEvent>(&payload) {
                    Ok(event) => {
                        if tx.send(StreamItem::Event(event)).is_err() {
                            debug!("Progress consumer went away, stopping reader");
                            return;
                        }
                    }
                    Err(e) => warn!("Skipping undecodable progress frame: {} ({})", payload, e),
                }
            }
        }

        let _ = tx.send(StreamItem::TransportError(ClientError::StreamClosed.to_string()));
    });

    EventStream::with_task(rx, task)
}
