use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::recognition::domain::face_collection_provider::{
    DeleteFacesOutput, FaceCollectionProvider, IndexFacesOutput, ListFacesOutput,
    SearchFacesOutput,
};
use crate::recognition::domain::face_count_detector::FaceCountDetector;
use crate::recognition::domain::provider_error::ProviderError;
use crate::recognition::infrastructure::sigv4::{self, SigningRequest};
use crate::shared::client_config::{ClientConfig, ConfigError, Credentials};
use crate::shared::constants::{JSON_CONTENT_TYPE, SERVICE_NAME, TARGET_PREFIX};

#[derive(Error, Debug)]
pub enum ProviderSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Face collection provider backed by the Rekognition JSON API.
///
/// Every call is a single signed POST; the client is cheap to clone and
/// holds no per-request state. Timeouts come from the config, retries are
/// left to the caller.
#[derive(Clone)]
pub struct RekognitionHttpProvider {
    client: Client,
    endpoint: Url,
    host: String,
    region: String,
    credentials: Credentials,
}

impl RekognitionHttpProvider {
    pub fn new(config: &ClientConfig) -> Result<Self, ProviderSetupError> {
        let credentials = config.credentials()?;
        let url = config.endpoint_url();
        let endpoint = Url::parse(&url).map_err(|e| ProviderSetupError::InvalidEndpoint {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let host = host_header(&endpoint).ok_or_else(|| ProviderSetupError::InvalidEndpoint {
            url: url.clone(),
            reason: "no host".to_string(),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ProviderSetupError::HttpClient)?;

        log::debug!("Rekognition endpoint: {endpoint} (region {})", config.region);
        Ok(Self {
            client,
            endpoint,
            host,
            region: config.region.clone(),
            credentials,
        })
    }

    /// Sends one signed request and decodes a 2xx body into `T`.
    fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        payload: &Value,
    ) -> Result<(u16, T), ProviderError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| ProviderError::Encode { operation, source: e })?;
        let target = format!("{TARGET_PREFIX}.{operation}");

        let signed = sigv4::sign(
            &SigningRequest {
                host: &self.host,
                path: self.endpoint.path(),
                content_type: JSON_CONTENT_TYPE,
                target: &target,
                body: &body,
            },
            &self.credentials,
            &self.region,
            SERVICE_NAME,
            Utc::now(),
        )
        .map_err(|_| ProviderError::Signing { operation })?;

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header(AUTHORIZATION, &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let transport = |e: reqwest::Error| ProviderError::Transport {
            url: self.endpoint.to_string(),
            source: e,
        };
        let response = request.body(body).send().map_err(transport)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().map_err(transport)?;
        log::trace!("{operation} -> {status} ({} bytes)", bytes.len());

        if !(200..300).contains(&status) {
            return Err(service_error(status, &bytes));
        }
        decode_body(operation, &bytes).map(|out| (status, out))
    }
}

impl FaceCollectionProvider for RekognitionHttpProvider {
    fn index_faces(
        &self,
        collection_id: &str,
        image: &[u8],
    ) -> Result<IndexFacesOutput, ProviderError> {
        let (status, mut out): (u16, IndexFacesOutput) =
            self.call("IndexFaces", &index_faces_payload(collection_id, image))?;
        out.status_code = status;
        Ok(out)
    }

    fn list_faces(
        &self,
        collection_id: &str,
        max_results: u32,
    ) -> Result<ListFacesOutput, ProviderError> {
        let (status, mut out): (u16, ListFacesOutput) =
            self.call("ListFaces", &list_faces_payload(collection_id, max_results))?;
        out.status_code = status;
        Ok(out)
    }

    fn search_faces_by_image(
        &self,
        collection_id: &str,
        image: &[u8],
        threshold: f64,
        max_faces: u32,
    ) -> Result<SearchFacesOutput, ProviderError> {
        let payload = search_faces_by_image_payload(collection_id, image, threshold, max_faces);
        let (status, mut out): (u16, SearchFacesOutput) =
            self.call("SearchFacesByImage", &payload)?;
        out.status_code = status;
        Ok(out)
    }

    fn delete_faces(
        &self,
        collection_id: &str,
        face_ids: &[String],
    ) -> Result<DeleteFacesOutput, ProviderError> {
        let (status, mut out): (u16, DeleteFacesOutput) =
            self.call("DeleteFaces", &delete_faces_payload(collection_id, face_ids))?;
        out.status_code = status;
        Ok(out)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectFacesOutput {
    #[serde(default)]
    face_details: Vec<Value>,
}

impl FaceCountDetector for RekognitionHttpProvider {
    fn count(&self, image: &[u8]) -> Result<usize, ProviderError> {
        let (_, out): (u16, DetectFacesOutput) =
            self.call("DetectFaces", &detect_faces_payload(image))?;
        Ok(out.face_details.len())
    }
}

/// `Host` header value as reqwest will send it: port only when non-default.
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn image_field(image: &[u8]) -> Value {
    json!({ "Bytes": STANDARD.encode(image) })
}

fn index_faces_payload(collection_id: &str, image: &[u8]) -> Value {
    json!({
        "CollectionId": collection_id,
        "DetectionAttributes": ["ALL"],
        "Image": image_field(image),
    })
}

fn list_faces_payload(collection_id: &str, max_results: u32) -> Value {
    json!({
        "CollectionId": collection_id,
        "MaxResults": max_results,
    })
}

fn search_faces_by_image_payload(
    collection_id: &str,
    image: &[u8],
    threshold: f64,
    max_faces: u32,
) -> Value {
    json!({
        "CollectionId": collection_id,
        "FaceMatchThreshold": threshold,
        "Image": image_field(image),
        "MaxFaces": max_faces,
    })
}

fn delete_faces_payload(collection_id: &str, face_ids: &[String]) -> Value {
    json!({
        "CollectionId": collection_id,
        "FaceIds": face_ids,
    })
}

fn detect_faces_payload(image: &[u8]) -> Value {
    json!({
        "Attributes": ["DEFAULT"],
        "Image": image_field(image),
    })
}

fn decode_body<T: DeserializeOwned>(operation: &'static str, bytes: &[u8]) -> Result<T, ProviderError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| ProviderError::Decode { operation, source: e })
}

/// Builds a service error from a non-2xx reply. The provider sends
/// `{"__type": "...#Code", "message": "..."}`; anything else is kept as text.
fn service_error(status: u16, bytes: &[u8]) -> ProviderError {
    let parsed: Option<Value> = serde_json::from_slice(bytes).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let code = field("__type")
        .map(|t| t.rsplit('#').next().unwrap_or_default().to_string())
        .unwrap_or_else(|| "UnknownError".to_string());
    let message = field("message")
        .or_else(|| field("Message"))
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).trim().to_string());

    ProviderError::Service {
        status,
        code,
        message,
    }
}
