use harvest::ProgressSink;

/// Renders progress updates as log events.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn update(&self, lane: usize, completed: usize, total: usize, status: &str) {
        tracing::info!(lane, completed, total, "{}", status);
    }

    fn message(&self, message: &str) {
        tracing::info!("{}", message);
    }
}
