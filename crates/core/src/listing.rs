//! Cancellable listing streams
//!
//! A listing is produced by a background task and pulled one item at a time
//! by the consumer. The consumer owns a one-shot stop signal; the producer
//! checks it before every item and returns as soon as it fires, dropping
//! whatever connections it held.

use std::future::Future;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::Result;

/// Number of items buffered between producer and consumer
const CHANNEL_CAPACITY: usize = 64;

/// One entry produced while enumerating keys under a prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingItem {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size: i64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Owner display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Common prefix from a single-level listing rather than a stored object
    #[serde(default)]
    pub is_prefix: bool,
}

impl ListingItem {
    /// Create an item for a stored object
    pub fn object(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            owner: None,
            is_prefix: false,
        }
    }

    /// Create an item for a common prefix
    pub fn prefix(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: 0,
            last_modified: None,
            owner: None,
            is_prefix: true,
        }
    }

    pub fn with_last_modified(mut self, ts: Timestamp) -> Self {
        self.last_modified = Some(ts);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Producer half of a listing stream
pub struct ListingSink {
    items: mpsc::Sender<Result<ListingItem>>,
    stop: oneshot::Receiver<()>,
    stopped: bool,
}

impl ListingSink {
    /// Emit one item
    ///
    /// Returns `false` once the consumer has cancelled or dropped the stream.
    /// The producer must stop and return when that happens.
    pub async fn send(&mut self, item: Result<ListingItem>) -> bool {
        if self.stopped {
            return false;
        }
        let sent = tokio::select! {
            biased;
            _ = &mut self.stop => false,
            sent = self.items.send(item) => sent.is_ok(),
        };
        self.stopped = !sent;
        sent
    }

    /// Whether the consumer has asked the producer to stop
    pub fn is_cancelled(&mut self) -> bool {
        if !self.stopped {
            self.stopped = !matches!(
                self.stop.try_recv(),
                Err(oneshot::error::TryRecvError::Empty)
            );
        }
        self.stopped
    }
}

/// Consumer half of a listing stream
pub struct ListingStream {
    items: mpsc::Receiver<Result<ListingItem>>,
    stop: Option<oneshot::Sender<()>>,
}

impl ListingStream {
    /// Create a connected sink/stream pair
    pub fn channel() -> (ListingSink, ListingStream) {
        let (item_tx, item_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = oneshot::channel();
        (
            ListingSink {
                items: item_tx,
                stop: stop_rx,
                stopped: false,
            },
            ListingStream {
                items: item_rx,
                stop: Some(stop_tx),
            },
        )
    }

    /// Run `produce` on the tokio runtime and return the consuming end
    pub fn spawn<F, Fut>(produce: F) -> ListingStream
    where
        F: FnOnce(ListingSink) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sink, stream) = Self::channel();
        tokio::spawn(produce(sink));
        stream
    }

    /// Stream a fixed list of items
    pub fn from_items(items: Vec<Result<ListingItem>>) -> ListingStream {
        Self::spawn(|mut sink| async move {
            for item in items {
                if !sink.send(item).await {
                    tracing::trace!("listing cancelled by consumer");
                    return;
                }
            }
        })
    }

    /// Wait for the next item; `None` once the producer has finished
    pub async fn next(&mut self) -> Option<Result<ListingItem>> {
        self.items.recv().await
    }

    /// Ask the producer to stop
    ///
    /// Only the first call sends anything. Cancelling a stream whose producer
    /// has already finished is a no-op.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.items.close();
    }

    /// Whether `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.stop.is_none()
    }
}

impl Drop for ListingStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ListingStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingStream")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
