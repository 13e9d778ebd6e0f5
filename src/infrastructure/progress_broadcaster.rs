//! Progress sinks for observers outside the pipeline
//!
//! [`ProgressBroadcaster`] fans snapshots out over a `tokio` broadcast
//! channel so any number of live listeners (an SSE stream, a websocket,
//! a terminal UI) can subscribe. [`LoggingProgressSink`] writes them to
//! the log.

use tokio::sync::broadcast;
use tracing::{info, trace};

use crate::domain::{ProgressSink, ProgressSnapshot};

/// Default number of snapshots a slow subscriber may fall behind
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts snapshots to every current subscriber.
///
/// Sending never blocks; with no subscribers the snapshot is dropped and
/// lagging subscribers skip ahead.
#[derive(Debug, Clone)]
pub struct ProgressBroadcaster {
    sender: broadcast::Sender<ProgressSnapshot>,
}

impl ProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressSnapshot> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Snapshot as a server-sent event frame (`data: {...}\n\n`).
    pub fn to_sse_frame(snapshot: &ProgressSnapshot) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(snapshot)?))
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ProgressSink for ProgressBroadcaster {
    fn notify(&self, snapshot: ProgressSnapshot) {
        if self.sender.send(snapshot).is_err() {
            trace!("No progress subscribers, snapshot dropped");
        }
    }
}

/// Logs each snapshot at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn notify(&self, snapshot: ProgressSnapshot) {
        if snapshot.done {
            info!(
                "✅ Batch finished: {}/{} items, {} succeeded, {} failed",
                snapshot.current, snapshot.total, snapshot.success, snapshot.errors
            );
        } else {
            info!(
                "📊 Progress {}/{} ({:.1}%) - ok: {}, errors: {}",
                snapshot.current,
                snapshot.total,
                snapshot.percentage(),
                snapshot.success,
                snapshot.errors
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(current: usize, done: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            current,
            total: 2,
            success: current,
            errors: 0,
            done,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let broadcaster = ProgressBroadcaster::default();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        broadcaster.notify(snapshot(1, false));
        broadcaster.notify(snapshot(2, true));

        for receiver in [&mut first, &mut second] {
            assert_eq!(receiver.recv().await.unwrap(), snapshot(1, false));
            assert_eq!(receiver.recv().await.unwrap(), snapshot(2, true));
        }
    }

    #[test]
    fn test_notify_without_subscribers_does_not_fail() {
        let broadcaster = ProgressBroadcaster::new(0);
        broadcaster.notify(snapshot(1, false));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_sse_frame() {
        let frame = ProgressBroadcaster::to_sse_frame(&snapshot(1, false)).unwrap();
        assert_eq!(
            frame,
            "data: {\"current\":1,\"total\":2,\"success\":1,\"errors\":0,\"done\":false}\n\n"
        );
    }
}
