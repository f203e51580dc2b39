use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

const DATA_URI_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

/// Normalizes an image supplied either as raw bytes or as base64 text into
/// the raw bytes sent to the provider.
///
/// Accepted base64 forms are a `data:image/<fmt>;base64,<payload>` URI and a
/// bare base64 string. Either is only decoded when the result sniffs as an
/// image, so binary input that happens to be valid base64 is left alone.
/// Anything else passes through unchanged; malformed images are reported by
/// the provider, not here.
pub fn normalize(input: &[u8]) -> Cow<'_, [u8]> {
    match decode_base64_image(input) {
        Some(bytes) => Cow::Owned(bytes),
        None => Cow::Borrowed(input),
    }
}

fn decode_base64_image(input: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(input).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    let payload = match text.strip_prefix(DATA_URI_PREFIX) {
        Some(rest) => rest.split_once(BASE64_MARKER)?.1,
        None => text,
    };

    // Only image bytes count as decoded; otherwise a second pass could decode again.
    let decoded = decode_lenient(payload)?;
    image::guess_format(&decoded).ok().map(|_| decoded)
}

/// Standard-alphabet decode that tolerates embedded line breaks and spaces.
fn decode_lenient(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    STANDARD.decode(compact).ok()
}
