pub mod diagnostic_logger;
pub mod face_collection_provider;
pub mod face_count_detector;
pub mod face_record;
pub mod provider_error;
