use crate::recognition::domain::provider_error::ProviderError;

/// Counts the faces visible in an image.
///
/// Used only as a precondition gate before enrolment and matching; the
/// detection details themselves are not interpreted.
pub trait FaceCountDetector: Send + Sync {
    fn count(&self, image: &[u8]) -> Result<usize, ProviderError>;
}
