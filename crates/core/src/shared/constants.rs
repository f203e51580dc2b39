pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Largest page `ListFaces` accepts. Collections beyond this are truncated.
pub const LIST_FACES_MAX_RESULTS: u32 = 4096;

/// Default similarity (percent) a match must reach in `get_by_image`.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 80.0;

pub const SERVICE_NAME: &str = "rekognition";
pub const TARGET_PREFIX: &str = "RekognitionService";
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// HTTP status the provider reports for a successful call.
pub const STATUS_OK: u16 = 200;
