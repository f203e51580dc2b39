pub mod client_config;
pub mod constants;
pub mod image_payload;
