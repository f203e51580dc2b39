use serde_json::Value;

/// Sink for provider payloads and failures.
///
/// Fire-and-forget: nothing returned from here influences control flow.
pub trait DiagnosticLogger: Send + Sync {
    /// Record a message with a structured payload, typically a raw response.
    fn debug(&self, message: &str, payload: &Value);

    /// Record a failure about to be returned to the caller.
    fn error(&self, error: &dyn std::error::Error);
}

/// Logger that discards everything.
pub struct NullDiagnosticLogger;

impl DiagnosticLogger for NullDiagnosticLogger {
    fn debug(&self, _message: &str, _payload: &Value) {}
    fn error(&self, _error: &dyn std::error::Error) {}
}
