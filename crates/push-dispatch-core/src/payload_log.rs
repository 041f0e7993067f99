//! Broadcast + history record of payloads seen by handlers.

use std::{
    collections::VecDeque,
    sync::{PoisonError, RwLock},
    time::SystemTime,
};

use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Default history size limit (1 MB).
const HISTORY_BYTES: usize = 1024 * 1024;

/// A payload as recorded for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedPayload {
    /// Message type the payload arrived with.
    pub message_type: String,
    /// The payload itself, unmodified.
    pub payload: Value,
    /// When the payload was recorded.
    pub recorded_at: SystemTime,
}

impl RecordedPayload {
    fn approx_bytes(&self) -> usize {
        const OVERHEAD: usize = 32;
        self.message_type.len() + self.payload.to_string().len() + OVERHEAD
    }
}

#[derive(Clone)]
struct StoredPayload {
    entry: RecordedPayload,
    bytes: usize,
}

struct Inner {
    history: VecDeque<StoredPayload>,
    total_bytes: usize,
}

/// Payload log with broadcast and history support.
///
/// Late subscribers receive the retained history, then live entries.
/// Oldest entries are evicted once the history exceeds its byte limit.
pub struct PayloadLog {
    inner: RwLock<Inner>,
    sender: broadcast::Sender<RecordedPayload>,
    limit_bytes: usize,
}

impl Default for PayloadLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadLog {
    /// Create a payload log with the default history limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(HISTORY_BYTES)
    }

    /// Create a payload log retaining roughly `limit_bytes` of history.
    #[must_use]
    pub fn with_limit(limit_bytes: usize) -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            inner: RwLock::new(Inner {
                history: VecDeque::with_capacity(32),
                total_bytes: 0,
            }),
            sender,
            limit_bytes,
        }
    }

    /// Record a payload for both live listeners and history.
    pub fn record(&self, message_type: impl Into<String>, payload: Value) {
        let entry = RecordedPayload {
            message_type: message_type.into(),
            payload,
            recorded_at: SystemTime::now(),
        };
        let _ = self.sender.send(entry.clone()); // live listeners
        let bytes = entry.approx_bytes();

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        while inner.total_bytes.saturating_add(bytes) > self.limit_bytes {
            if let Some(front) = inner.history.pop_front() {
                inner.total_bytes = inner.total_bytes.saturating_sub(front.bytes);
            } else {
                break;
            }
        }
        inner.history.push_back(StoredPayload { entry, bytes });
        inner.total_bytes = inner.total_bytes.saturating_add(bytes);
    }

    /// Get a receiver for live entries.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RecordedPayload> {
        self.sender.subscribe()
    }

    /// Get a snapshot of the history.
    #[must_use]
    pub fn history(&self) -> Vec<RecordedPayload> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .iter()
            .map(|s| s.entry.clone())
            .collect()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .len()
    }

    /// Whether nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stream that yields history first, then live entries.
    ///
    /// Entries missed by a lagging subscriber are skipped.
    #[must_use]
    pub fn history_plus_stream(&self) -> futures::stream::BoxStream<'static, RecordedPayload> {
        let (history, rx) = (self.history(), self.subscribe());

        let hist = futures::stream::iter(history);
        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        Box::pin(hist.chain(live))
    }
}
