use serde::{Deserialize, Serialize};

use crate::recognition::domain::face_record::{FaceMatch, FaceRecord, IndexedFace};
use crate::recognition::domain::provider_error::ProviderError;

/// Response to an index request. `status_code` is the HTTP status the
/// provider answered with; the rest mirrors the provider's body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexFacesOutput {
    #[serde(skip_deserializing)]
    pub status_code: u16,
    #[serde(default)]
    pub face_records: Vec<IndexedFace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListFacesOutput {
    #[serde(skip_deserializing)]
    pub status_code: u16,
    #[serde(default)]
    pub faces: Vec<FaceRecord>,
    /// Set when the collection holds more faces than were returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchFacesOutput {
    #[serde(skip_deserializing)]
    pub status_code: u16,
    #[serde(default)]
    pub face_matches: Vec<FaceMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteFacesOutput {
    #[serde(skip_deserializing)]
    pub status_code: u16,
    #[serde(default)]
    pub deleted_faces: Vec<String>,
}

/// Domain interface for the remote face collection service.
///
/// Implementations are stateless request/response round trips; collection
/// lifecycle and consistency belong to the provider.
pub trait FaceCollectionProvider: Send + Sync {
    /// Detects the faces in `image` and adds them to the collection,
    /// requesting every detection attribute.
    fn index_faces(
        &self,
        collection_id: &str,
        image: &[u8],
    ) -> Result<IndexFacesOutput, ProviderError>;

    /// Lists up to `max_results` faces in a single request.
    fn list_faces(
        &self,
        collection_id: &str,
        max_results: u32,
    ) -> Result<ListFacesOutput, ProviderError>;

    /// Searches the collection for faces matching the largest face in
    /// `image` with at least `threshold` percent similarity.
    fn search_faces_by_image(
        &self,
        collection_id: &str,
        image: &[u8],
        threshold: f64,
        max_faces: u32,
    ) -> Result<SearchFacesOutput, ProviderError>;

    fn delete_faces(
        &self,
        collection_id: &str,
        face_ids: &[String],
    ) -> Result<DeleteFacesOutput, ProviderError>;
}
