//! Progress reporting boundary.

/// Receives lane progress updates.
///
/// The engine never depends on how progress is rendered; frontends implement
/// this to draw bars, print lines or log.
pub trait ProgressSink: Send + Sync {
    /// `completed` out of `total` entries are done on `lane`; `status` is free text.
    fn update(&self, lane: usize, completed: usize, total: usize, status: &str);

    /// Out-of-band message (warnings, summaries).
    fn message(&self, _message: &str) {}
}

/// A no-op progress sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _lane: usize, _completed: usize, _total: usize, _status: &str) {}
}

/// Progress handle bound to one lane.
///
/// Tracks the lane's completed count so extraction code only supplies the
/// status text.
pub struct LaneProgress<'a> {
    sink: &'a dyn ProgressSink,
    lane: usize,
    total: usize,
    completed: usize,
}

impl<'a> LaneProgress<'a> {
    pub fn new(sink: &'a dyn ProgressSink, lane: usize, total: usize) -> Self {
        Self {
            sink,
            lane,
            total,
            completed: 0,
        }
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Report a new status for the current entry.
    pub fn status(&self, status: &str) {
        self.sink
            .update(self.lane, self.completed, self.total, status);
    }

    /// Forward an out-of-band message.
    pub fn message(&self, message: &str) {
        self.sink.message(message);
    }

    /// Count one more finished entry. The new count goes out with the next
    /// status update.
    pub fn entry_done(&mut self) {
        self.completed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(usize, usize, usize, String)>>);

    impl ProgressSink for Recorder {
        fn update(&self, lane: usize, completed: usize, total: usize, status: &str) {
            self.0
                .lock()
                .unwrap()
                .push((lane, completed, total, status.to_string()));
        }
    }

    #[test]
    fn test_lane_progress_counts_entries() {
        let recorder = Recorder::default();
        let mut progress = LaneProgress::new(&recorder, 2, 5);

        progress.status("first - Indexing...");
        progress.entry_done();
        progress.status("second - Indexing...");

        let updates = recorder.0.lock().unwrap().clone();
        assert_eq!(
            updates,
            vec![
                (2, 0, 5, "first - Indexing...".to_string()),
                (2, 1, 5, "second - Indexing...".to_string()),
            ]
        );
        assert_eq!(progress.completed(), 1);
    }
}
