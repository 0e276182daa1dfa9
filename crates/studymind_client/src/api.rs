use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use studymind_logging::sm_debug;
use url::Url;

use crate::upload::progress_body;
use crate::{
    ApiError, AskRequest, AskResponse, ClientEvent, ClientSettings, FailureKind, ParsedSyllabus,
    StatusReport, UploadAccepted,
};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ClientEvent);
}

/// The backend surface consumed by the client.
#[async_trait::async_trait]
pub trait StudyApi: Send + Sync {
    /// `POST /ingest/`, reporting `UploadProgress` events to `sink` while the body is sent.
    async fn upload_document(
        &self,
        name: &str,
        bytes: Bytes,
        sink: Arc<dyn EventSink>,
    ) -> Result<UploadAccepted, ApiError>;

    /// `GET /ingest/status?filename=`. `None` when the server answered with an empty or `null` body.
    async fn ingest_status(&self, name: &str) -> Result<Option<StatusReport>, ApiError>;

    /// `GET /ingest/status` without a filename.
    async fn list_status(&self) -> Result<BTreeMap<String, StatusReport>, ApiError>;

    async fn delete_document(&self, name: &str) -> Result<(), ApiError>;

    async fn reset_documents(&self) -> Result<(), ApiError>;

    async fn upload_syllabus(&self, name: &str, bytes: Bytes) -> Result<ParsedSyllabus, ApiError>;

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    base_url: Url,
    upload_chunk_size: usize,
}

impl ReqwestApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim())
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            upload_chunk_size: settings.upload_chunk_size.max(1),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait::async_trait]
impl StudyApi for ReqwestApi {
    async fn upload_document(
        &self,
        name: &str,
        bytes: Bytes,
        sink: Arc<dyn EventSink>,
    ) -> Result<UploadAccepted, ApiError> {
        let length = bytes.len() as u64;
        let body = progress_body(name, bytes, self.upload_chunk_size, sink);
        let part = Part::stream_with_length(body, length)
            .file_name(name.to_string())
            .mime_str(content_type_for(name))
            .map_err(map_reqwest_error)?;
        let form = Form::new().part("file", part);

        sm_debug!("Uploading {} ({} bytes)", name, length);
        let response = self
            .client
            .post(self.endpoint(&["ingest", ""]))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }

    async fn ingest_status(&self, name: &str) -> Result<Option<StatusReport>, ApiError> {
        let mut url = self.endpoint(&["ingest", "status"]);
        url.query_pairs_mut().append_pair("filename", name);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(map_reqwest_error)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        decode_slice(&body)
    }

    async fn list_status(&self) -> Result<BTreeMap<String, StatusReport>, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["ingest", "status"]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }

    async fn delete_document(&self, name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoint(&["ingest", "delete", name]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await.map(drop)
    }

    async fn reset_documents(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoint(&["ingest", "reset"]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await.map(drop)
    }

    async fn upload_syllabus(&self, name: &str, bytes: Bytes) -> Result<ParsedSyllabus, ApiError> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(name.to_string())
            .mime_str(content_type_for(name))
            .map_err(map_reqwest_error)?;
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(self.endpoint(&["syllabus", "upload"]))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint(&["qa", "ask"]))
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }
}

/// Content type the backend expects for an uploaded document.
pub fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else if lower.ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|body| match body.detail {
            serde_json::Value::String(text) => Some(text),
            _ => None,
        });
    Err(ApiError {
        kind: FailureKind::HttpStatus(status.as_u16()),
        message: status.to_string(),
        detail,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    decode_slice(&body)
}

fn decode_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
