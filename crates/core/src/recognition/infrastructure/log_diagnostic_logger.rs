use serde_json::Value;

use crate::recognition::domain::diagnostic_logger::DiagnosticLogger;

const DEFAULT_TARGET: &str = "face_collection";

/// Diagnostic logger that forwards to the `log` facade.
///
/// Payloads are rendered as compact JSON; errors include their full
/// `source()` chain on one line.
pub struct LogDiagnosticLogger {
    target: String,
}

impl LogDiagnosticLogger {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogDiagnosticLogger {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl DiagnosticLogger for LogDiagnosticLogger {
    fn debug(&self, message: &str, payload: &Value) {
        log::debug!(target: &self.target, "{}", format_payload(message, payload));
    }

    fn error(&self, error: &dyn std::error::Error) {
        log::error!(target: &self.target, "{}", format_error_chain(error));
    }
}

fn format_payload(message: &str, payload: &Value) -> String {
    format!("{message}: {payload}")
}

/// `outer: inner: root`, following `source()` to the end.
pub fn format_error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // thiserror messages often already embed the source text
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
