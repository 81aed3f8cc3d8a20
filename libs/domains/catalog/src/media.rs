//! External media host contract.
//!
//! Product images live on a third-party media host. The catalog only consumes
//! two operations: upload a raw payload, and remove a stored asset (used to
//! compensate partially-completed product creation).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Identifier + URL pair the media host returns for a stored asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadedImage {
    /// Media-host identifier of the stored asset
    pub public_id: String,
    /// Retrievable URL
    pub secure_url: String,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media host request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Media host rejected the request: {0}")]
    Upstream(String),

    #[error("Media configuration error: {0}")]
    Config(String),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// Client trait for the external media host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a raw image payload, returning the stored asset's identifiers.
    async fn upload(&self, payload: &str) -> MediaResult<UploadedImage>;

    /// Remove a previously uploaded asset.
    async fn destroy(&self, public_id: &str) -> MediaResult<()>;
}
