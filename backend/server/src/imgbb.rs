//! # Image Hosting
//!
//! Dish photos live on ImgBB. The upload is a multipart POST carrying the API
//! key and the base64 encoded image; the response carries the hosted URL.
//!
//! Nothing is retried here. A failed upload surfaces as [`UploadError`] and the
//! participant re-submits.
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, multipart::Form};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image host unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image host rejected the upload: {0}")]
    Rejected(String),

    #[error("no image host API key configured")]
    Disabled,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads raw image bytes and returns the public URL.
    async fn upload(&self, image: &[u8]) -> Result<String, UploadError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
}

#[derive(Deserialize)]
struct UploadData {
    url: String,
}

pub struct ImgBb {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ImgBb {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl ImageHost for ImgBb {
    async fn upload(&self, image: &[u8]) -> Result<String, UploadError> {
        let api_key = self.api_key.as_ref().ok_or(UploadError::Disabled)?;

        let form = Form::new()
            .text("key", api_key.clone())
            .text("image", STANDARD.encode(image));

        let res = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = res.status();
        let body = res.text().await?;

        let parsed: Option<UploadResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(UploadResponse {
                success: true,
                data: Some(data),
            }) => {
                info!(url = %data.url, bytes = image.len(), "Uploaded photo");
                Ok(data.url)
            }
            _ => {
                warn!(%status, "Image host rejected upload");
                Err(UploadError::Rejected(format!("{status}: {body}")))
            }
        }
    }
}
