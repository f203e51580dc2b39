pub mod log_diagnostic_logger;
pub mod rekognition_http_provider;
mod sigv4;
