use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::error::Error;

/// Receives responses the classifier could not interpret.
pub trait DiagnosticSink: Sync {
    fn record(&self, response: &Value, fault: &Error);
}

/// Default sink: one `warn` event per anomaly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, response: &Value, fault: &Error) {
        tracing::warn!(
            fault = %fault,
            response = %response,
            "failed to classify broadcast error response"
        );
    }
}

/// Hands the anomaly to `sink`, swallowing a panicking sink.
pub(crate) fn report(sink: &dyn DiagnosticSink, response: &Value, fault: &Error) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| sink.record(response, fault)));
}
