//! HTTP client for the external media host.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::media::{MediaError, MediaResult, MediaStore, UploadedImage};

/// Media host configuration.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// Base URL of the media host API
    pub base_url: String,
    /// Upload preset authorizing unsigned uploads
    pub upload_preset: Option<String>,
    /// Folder the catalog's assets are stored under
    pub folder: String,
}

impl MediaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            upload_preset: None,
            folder: "products".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `MEDIA_BASE_URL` (required) - base URL of the media host API
    /// - `MEDIA_UPLOAD_PRESET` (optional) - unsigned upload preset
    /// - `MEDIA_FOLDER` (optional, default: "products")
    pub fn from_env() -> MediaResult<Self> {
        let base_url = std::env::var("MEDIA_BASE_URL")
            .map_err(|_| MediaError::Config("MEDIA_BASE_URL is required".to_string()))?;

        let upload_preset = std::env::var("MEDIA_UPLOAD_PRESET").ok();

        let folder = std::env::var("MEDIA_FOLDER").unwrap_or_else(|_| "products".to_string());

        Ok(Self {
            base_url,
            upload_preset,
            folder,
        })
    }
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    file: &'a str,
    folder: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_preset: Option<&'a str>,
}

#[derive(Serialize)]
struct DestroyRequest<'a> {
    public_id: &'a str,
}

/// Media host client over HTTP.
#[derive(Clone)]
pub struct HttpMediaClient {
    client: reqwest::Client,
    config: MediaConfig,
}

impl HttpMediaClient {
    /// Create a new media client with the given configuration.
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a media client from environment variables.
    pub fn from_env() -> MediaResult<Self> {
        Ok(Self::new(MediaConfig::from_env()?))
    }

    fn upload_url(&self) -> String {
        format!("{}/image/upload", self.config.base_url.trim_end_matches('/'))
    }

    fn destroy_url(&self) -> String {
        format!(
            "{}/image/destroy",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl MediaStore for HttpMediaClient {
    #[instrument(skip(self, payload))]
    async fn upload(&self, payload: &str) -> MediaResult<UploadedImage> {
        let request = UploadRequest {
            file: payload,
            folder: &self.config.folder,
            upload_preset: self.config.upload_preset.as_deref(),
        };

        let response = self
            .client
            .post(self.upload_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Media upload failed");
            return Err(MediaError::Upstream(format!(
                "Upload failed with status {}: {}",
                status, body
            )));
        }

        let image: UploadedImage = response.json().await?;
        info!(public_id = %image.public_id, "Image uploaded to media host");
        Ok(image)
    }

    #[instrument(skip(self))]
    async fn destroy(&self, public_id: &str) -> MediaResult<()> {
        let request = DestroyRequest { public_id };

        let response = self
            .client
            .post(self.destroy_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Media destroy failed");
            return Err(MediaError::Upstream(format!(
                "Destroy failed with status {}: {}",
                status, body
            )));
        }

        info!(public_id = %public_id, "Image removed from media host");
        Ok(())
    }
}
