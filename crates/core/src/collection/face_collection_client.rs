use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::recognition::domain::diagnostic_logger::DiagnosticLogger;
use crate::recognition::domain::face_collection_provider::FaceCollectionProvider;
use crate::recognition::domain::face_count_detector::FaceCountDetector;
use crate::recognition::domain::face_record::{FaceRecord, MatchResult};
use crate::recognition::domain::provider_error::ProviderError;
use crate::shared::constants::{DEFAULT_MATCH_THRESHOLD, LIST_FACES_MAX_RESULTS, STATUS_OK};
use crate::shared::image_payload;

/// What the single-face precondition is guarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacePurpose {
    Register,
    Match,
}

impl fmt::Display for FacePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacePurpose::Register => write!(f, "register"),
            FacePurpose::Match => write!(f, "match"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("face not detected")]
    NoFaceDetected,
    #[error("cannot {purpose} an image containing more than one face ({count} detected)")]
    MultipleFacesDetected { purpose: FacePurpose, count: usize },
    #[error("this image does not include faces")]
    NoFaceInImage,
    #[error("collection face registration failed with status {status}")]
    RegistrationFailed { status: u16 },
    #[error("collection face listing failed with status {status}")]
    ListFailed { status: u16 },
    #[error("collection face search failed with status {status}")]
    SearchFailed { status: u16 },
    #[error("collection face deletion failed with status {status}")]
    DeletionFailed { status: u16 },
    #[error("match threshold must be between 0 and 100, got {0}")]
    InvalidThreshold(f64),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Manages face membership of named collections held by a remote provider.
///
/// Holds no state besides its collaborators and the debug flag, so a single
/// instance can serve concurrent callers. Every failure is handed to the
/// diagnostic logger once, then returned unchanged.
pub struct FaceCollectionClient {
    provider: Box<dyn FaceCollectionProvider>,
    detector: Box<dyn FaceCountDetector>,
    logger: Box<dyn DiagnosticLogger>,
    debug: bool,
}

impl FaceCollectionClient {
    pub fn new(
        provider: Box<dyn FaceCollectionProvider>,
        detector: Box<dyn FaceCountDetector>,
        logger: Box<dyn DiagnosticLogger>,
        debug: bool,
    ) -> Self {
        Self {
            provider,
            detector,
            logger,
            debug,
        }
    }

    /// Enrols the single face in `image` and returns its provider-assigned id.
    ///
    /// `image` may be raw bytes or base64 text.
    pub fn add(&self, collection_id: &str, image: &[u8]) -> Result<String, CollectionError> {
        self.logged(self.try_add(collection_id, image, true))
    }

    /// Like [`add`](Self::add) but skips the face-count precondition.
    pub fn add_without_validation(
        &self,
        collection_id: &str,
        image: &[u8],
    ) -> Result<String, CollectionError> {
        self.logged(self.try_add(collection_id, image, false))
    }

    /// Returns the collection's faces as the provider reports them.
    ///
    /// Only a single page of up to [`LIST_FACES_MAX_RESULTS`] is fetched;
    /// larger collections are truncated.
    pub fn get_all(&self, collection_id: &str) -> Result<Vec<FaceRecord>, CollectionError> {
        self.logged(self.try_get_all(collection_id))
    }

    /// Finds the enrolled face most similar to the face in `image`, using
    /// the default threshold of 80 percent.
    pub fn get_by_image(
        &self,
        collection_id: &str,
        image: &[u8],
    ) -> Result<Option<MatchResult>, CollectionError> {
        self.get_by_image_with_threshold(collection_id, image, DEFAULT_MATCH_THRESHOLD)
    }

    /// `Ok(None)` means no enrolled face reached `threshold` percent.
    pub fn get_by_image_with_threshold(
        &self,
        collection_id: &str,
        image: &[u8],
        threshold: f64,
    ) -> Result<Option<MatchResult>, CollectionError> {
        self.logged(self.try_get_by_image(collection_id, image, threshold))
    }

    /// Removes faces and returns the ids the provider confirmed as deleted.
    ///
    /// Duplicate ids are sent once. Ids the provider does not know are not
    /// an error; they are simply absent from the result.
    pub fn delete<S: AsRef<str>>(
        &self,
        collection_id: &str,
        face_ids: &[S],
    ) -> Result<Vec<String>, CollectionError> {
        self.logged(self.try_delete(collection_id, face_ids))
    }

    fn try_add(
        &self,
        collection_id: &str,
        image: &[u8],
        do_validation: bool,
    ) -> Result<String, CollectionError> {
        let image = image_payload::normalize(image);
        if do_validation {
            self.require_single_face(&image, FacePurpose::Register)?;
        }

        let res = self.provider.index_faces(collection_id, &image)?;
        self.log_response("Face creation result", &res);
        if res.status_code != STATUS_OK {
            return Err(CollectionError::RegistrationFailed {
                status: res.status_code,
            });
        }

        res.face_records
            .into_iter()
            .next()
            .map(|record| record.face.face_id)
            .filter(|id| !id.is_empty())
            .ok_or(CollectionError::NoFaceInImage)
    }

    fn try_get_all(&self, collection_id: &str) -> Result<Vec<FaceRecord>, CollectionError> {
        let res = self
            .provider
            .list_faces(collection_id, LIST_FACES_MAX_RESULTS)?;
        self.log_response("All face search results", &res);
        if res.status_code != STATUS_OK {
            return Err(CollectionError::ListFailed {
                status: res.status_code,
            });
        }

        if res.next_token.is_some() {
            log::warn!(
                "Collection {collection_id} holds more than {LIST_FACES_MAX_RESULTS} faces; \
                 only the first page was returned"
            );
        }
        Ok(res.faces)
    }

    fn try_get_by_image(
        &self,
        collection_id: &str,
        image: &[u8],
        threshold: f64,
    ) -> Result<Option<MatchResult>, CollectionError> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(CollectionError::InvalidThreshold(threshold));
        }

        let image = image_payload::normalize(image);
        self.require_single_face(&image, FacePurpose::Match)?;

        let res = self
            .provider
            .search_faces_by_image(collection_id, &image, threshold, 1)?;
        self.log_response("Face search results", &res);
        if res.status_code != STATUS_OK {
            return Err(CollectionError::SearchFailed {
                status: res.status_code,
            });
        }

        Ok(res.face_matches.into_iter().next().map(|m| MatchResult {
            face_id: m.face.face_id,
            similarity: round_similarity(m.similarity),
        }))
    }

    fn try_delete<S: AsRef<str>>(
        &self,
        collection_id: &str,
        face_ids: &[S],
    ) -> Result<Vec<String>, CollectionError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let requested: Vec<String> = face_ids
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();

        let res = self.provider.delete_faces(collection_id, &requested)?;
        self.log_response("Face removal result", &res);
        if res.status_code != STATUS_OK {
            return Err(CollectionError::DeletionFailed {
                status: res.status_code,
            });
        }

        let (deleted, unexpected): (Vec<String>, Vec<String>) = res
            .deleted_faces
            .into_iter()
            .partition(|id| seen.contains(id.as_str()));
        if !unexpected.is_empty() {
            log::warn!(
                "Provider reported {} deleted face(s) that were not requested: {unexpected:?}",
                unexpected.len()
            );
        }
        Ok(deleted)
    }

    fn require_single_face(&self, image: &[u8], purpose: FacePurpose) -> Result<(), CollectionError> {
        match self.detector.count(image)? {
            0 => Err(CollectionError::NoFaceDetected),
            1 => Ok(()),
            count => Err(CollectionError::MultipleFacesDetected { purpose, count }),
        }
    }

    fn log_response(&self, message: &str, response: &impl Serialize) {
        if self.debug {
            let payload = serde_json::to_value(response).unwrap_or(Value::Null);
            self.logger.debug(message, &payload);
        }
    }

    fn logged<T>(&self, result: Result<T, CollectionError>) -> Result<T, CollectionError> {
        result.map_err(|e| {
            self.logger.error(&e);
            e
        })
    }
}

/// Clamps to `[0, 100]` and rounds half away from zero to one decimal.
fn round_similarity(similarity: f64) -> f64 {
    (similarity.clamp(0.0, 100.0) * 10.0).round() / 10.0
}
