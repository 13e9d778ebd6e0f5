//! Progress events emitted while a batch is running
//!
//! The pipeline pushes an immutable [`ProgressSnapshot`] to a
//! [`ProgressSink`] after every settled item and once more when the
//! batch is done. Sinks are plain synchronous callbacks; they must be
//! cheap because the pipeline calls them inline.

use serde::{Deserialize, Serialize};

/// Point-in-time counters of a running batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Items settled so far
    pub current: usize,
    /// Items in the batch
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    /// Set only on the final snapshot
    pub done: bool,
}

impl ProgressSnapshot {
    /// Completion ratio in percent (100 for an empty batch).
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.current as f64 / self.total as f64 * 100.0
        }
    }
}

/// Receiver of progress snapshots.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, snapshot: ProgressSnapshot);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressSnapshot) + Send + Sync,
{
    fn notify(&self, snapshot: ProgressSnapshot) {
        self(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink_receives_snapshots() {
        let seen = Mutex::new(Vec::new());
        let sink = |snapshot: ProgressSnapshot| seen.lock().unwrap().push(snapshot);

        let started = ProgressSnapshot {
            current: 0,
            total: 3,
            success: 0,
            errors: 0,
            done: false,
        };
        sink.notify(started);
        sink.notify(ProgressSnapshot { current: 1, success: 1, ..started });

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].current, 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = ProgressSnapshot {
            current: 2,
            total: 4,
            success: 1,
            errors: 1,
            done: false,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"current":2,"total":4,"success":1,"errors":1,"done":false}"#);
        assert!((snapshot.percentage() - 50.0).abs() < f64::EPSILON);
    }
}
