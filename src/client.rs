//! Seal API Client - JSON over HTTP
//!
//! [`SealApi`] is the seam to the external server. [`HttpSealApi`] talks to
//! it with reqwest; tests substitute their own implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::OptionCatalog;
use crate::compositor::PreviewResult;
use crate::config::ClientConfig;
use crate::selection::{SealSubmission, Selection};

pub const OPTIONS_PATH: &str = "/options";
pub const PREVIEW_PATH: &str = "/preview-urls";
pub const SUBMIT_PATH: &str = "/submit-seal";
pub const HEALTH_PATH: &str = "/health";
pub const SEALS_PATH: &str = "/seals";
pub const PREDICT_PATH: &str = "/predict";
pub const UPLOAD_PATH: &str = "/upload-local";

/// First eight bytes of every PNG file.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Server returned an empty seal identifier")]
    EmptyId,

    #[error("Upload rejected: {0} is not a PNG image")]
    NotPng(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Server-assigned seal identifier. The server may send a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SealId {
    Numeric(i64),
    Text(String),
}

impl SealId {
    pub fn is_empty(&self) -> bool {
        matches!(self, SealId::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for SealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SealId::Numeric(n) => write!(f, "{}", n),
            SealId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: SealId,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    ok: bool,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predicted_value: f64,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    image_path: String,
}

/// Durable seal record as listed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSeal {
    pub id: SealId,
    pub timestamp: String,
    #[serde(flatten)]
    pub selection: Selection,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub predicted_value: Option<f64>,
    #[serde(default)]
    pub actual_value: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub true_value: Option<f64>,
}

#[async_trait]
pub trait SealApi: Send + Sync {
    /// `GET /options`
    async fn fetch_options(&self) -> Result<OptionCatalog, ApiError>;

    /// `POST /preview-urls`
    async fn resolve_preview(&self, selection: &Selection) -> Result<PreviewResult, ApiError>;

    /// `POST /submit-seal`
    async fn submit_seal(&self, submission: &SealSubmission) -> Result<SealId, ApiError>;

    /// `GET /health`
    async fn health(&self) -> Result<bool, ApiError> {
        Err(ApiError::Unsupported("health"))
    }

    /// `GET /seals`, newest first.
    async fn list_seals(&self, _limit: u32, _offset: u32) -> Result<Vec<PersistedSeal>, ApiError> {
        Err(ApiError::Unsupported("list_seals"))
    }

    /// `POST /predict`
    async fn predict_value(&self, _selection: &Selection) -> Result<f64, ApiError> {
        Err(ApiError::Unsupported("predict_value"))
    }

    /// `POST /upload-local` as multipart; returns the stored `image_path`.
    async fn upload_png(&self, _file_name: &str, _data: Vec<u8>) -> Result<String, ApiError> {
        Err(ApiError::Unsupported("upload_png"))
    }
}

pub struct HttpSealApi {
    client: Client,
    config: ClientConfig,
}

impl HttpSealApi {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        request = request.header(REQUEST_ID_HEADER, request_id.as_str());
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(endpoint, request_id = %request_id, "sending request");

        let response = request.send().await.map_err(|e| ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(endpoint, request_id = %request_id, status = status.as_u16(), "non-success response");
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(endpoint, request_id = %request_id, status = status.as_u16(), "response received");

        response.json::<T>().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SealApi for HttpSealApi {
    async fn fetch_options(&self) -> Result<OptionCatalog, ApiError> {
        let request = self.client.get(self.config.endpoint(OPTIONS_PATH));
        self.send_json(request, OPTIONS_PATH).await
    }

    async fn resolve_preview(&self, selection: &Selection) -> Result<PreviewResult, ApiError> {
        let request = self
            .client
            .post(self.config.endpoint(PREVIEW_PATH))
            .json(selection);
        self.send_json(request, PREVIEW_PATH).await
    }

    async fn submit_seal(&self, submission: &SealSubmission) -> Result<SealId, ApiError> {
        let request = self
            .client
            .post(self.config.endpoint(SUBMIT_PATH))
            .json(submission);
        let response: SubmitResponse = self.send_json(request, SUBMIT_PATH).await?;
        if response.id.is_empty() {
            return Err(ApiError::EmptyId);
        }
        Ok(response.id)
    }

    async fn health(&self) -> Result<bool, ApiError> {
        let request = self.client.get(self.config.endpoint(HEALTH_PATH));
        let response: HealthResponse = self.send_json(request, HEALTH_PATH).await?;
        Ok(response.ok)
    }

    async fn list_seals(&self, limit: u32, offset: u32) -> Result<Vec<PersistedSeal>, ApiError> {
        let request = self
            .client
            .get(self.config.endpoint(SEALS_PATH))
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(request, SEALS_PATH).await
    }

    async fn predict_value(&self, selection: &Selection) -> Result<f64, ApiError> {
        let request = self
            .client
            .post(self.config.endpoint(PREDICT_PATH))
            .json(selection);
        let response: PredictResponse = self.send_json(request, PREDICT_PATH).await?;
        Ok(response.predicted_value)
    }

    async fn upload_png(&self, file_name: &str, data: Vec<u8>) -> Result<String, ApiError> {
        if !data.starts_with(&PNG_SIGNATURE) {
            return Err(ApiError::NotPng(file_name.to_string()));
        }
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .map_err(|e| ApiError::Transport {
                endpoint: UPLOAD_PATH.to_string(),
                message: e.to_string(),
            })?;
        let request = self
            .client
            .post(self.config.endpoint(UPLOAD_PATH))
            .multipart(Form::new().part("file", part));
        let response: UploadResponse = self.send_json(request, UPLOAD_PATH).await?;
        Ok(response.image_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_id_accepts_number_or_string() {
        let n: SubmitResponse = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(n.id, SealId::Numeric(42));
        assert_eq!(n.id.to_string(), "42");

        let s: SubmitResponse = serde_json::from_str(r#"{"id": "seal-7"}"#).unwrap();
        assert_eq!(s.id.to_string(), "seal-7");
        assert!(!s.id.is_empty());
        assert!(SealId::Text(" ".into()).is_empty());
    }

    #[test]
    fn test_persisted_seal_decodes_server_row() {
        let row = r#"{
            "id": 3, "timestamp": "2026-10-18T09:30:00.000Z",
            "image_id": null, "image_path": null,
            "eyes": 2, "mouth": 1, "hair": 0, "pattern": 4,
            "base_color": 12, "pattern_color": 5,
            "predicted_value": 12345.0, "actual_value": null,
            "label": null, "true_value": null
        }"#;
        let seal: PersistedSeal = serde_json::from_str(row).unwrap();
        assert_eq!(seal.id, SealId::Numeric(3));
        assert_eq!(seal.selection.base_color, 12);
        assert_eq!(seal.predicted_value, Some(12345.0));
        assert_eq!(seal.label, None);
    }

    #[test]
    fn test_status_accessor() {
        let err = ApiError::Status {
            endpoint: SUBMIT_PATH.into(),
            status: 422,
            body: "eyes 1..6".into(),
        };
        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("422"));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_png_before_sending() {
        let api = HttpSealApi::new(ClientConfig::new("http://127.0.0.1:9").unwrap());
        let err = api
            .upload_png("seal.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotPng(name) if name == "seal.jpg"));
    }
}
