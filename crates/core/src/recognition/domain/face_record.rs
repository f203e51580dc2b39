use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A face enrolled in a remote collection.
///
/// Only the identifier is modeled; bounding box, confidence and the rest of
/// the provider's attributes are carried through untouched in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    #[serde(rename = "FaceId")]
    pub face_id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl FaceRecord {
    pub fn new(face_id: impl Into<String>) -> Self {
        Self {
            face_id: face_id.into(),
            attributes: Map::new(),
        }
    }
}

/// One entry of an index response: the stored face plus the detection
/// details the provider computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexedFace {
    pub face: FaceRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_detail: Option<Value>,
}

/// A candidate returned by a search, with similarity in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceMatch {
    pub similarity: f64,
    pub face: FaceRecord,
}

/// Best match for a query image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub face_id: String,
    /// Percent in `[0, 100]`, rounded to one decimal place.
    pub similarity: f64,
}
