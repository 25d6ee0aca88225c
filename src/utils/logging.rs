use anyhow::Error;
use tracing::span::Span;

/// Logs an error that ended the handling of an event, within the span of that event.
pub trait LogError {
    fn log_error(&self, error: Error);
}

impl LogError for Span {
    fn log_error(&self, error: Error) {
        self.in_scope(|| {
            tracing::error!("Dispatch failed: {error:?}");
        });
    }
}
