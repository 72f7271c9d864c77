//! Winner photo upload collaborator.
//!
//! Photos arrive as `data:image/...;base64,` URLs. With blob storage configured they are stored
//! remotely and replaced by a stable URL; otherwise the data URL itself is kept in memory.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{info, warn};

use crate::dto::validation::IMAGE_DATA_URL_PREFIX;

/// Extension used when the data URL does not name a usable image subtype.
const DEFAULT_IMAGE_EXTENSION: &str = "jpeg";

/// Failures that can occur while storing a winner photo.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The data URL could not be split into a header and a payload.
    #[error("malformed image data URL: {0}")]
    InvalidDataUrl(&'static str),
    /// The payload is not valid base64.
    #[error("failed to decode image payload")]
    Decode {
        #[source]
        source: base64::DecodeError,
    },
    /// The upload did not finish within the configured bound.
    #[error("upload timed out")]
    TimedOut,
    /// Building the HTTP client failed.
    #[cfg(feature = "blob-upload")]
    #[error("failed to build blob storage client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The PUT request could not be sent.
    #[cfg(feature = "blob-upload")]
    #[error("failed to send blob upload for `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Blob storage answered with a non-success status.
    #[cfg(feature = "blob-upload")]
    #[error("unexpected blob storage status {status} for `{path}`")]
    RequestStatus {
        path: String,
        status: reqwest::StatusCode,
    },
    /// Blob storage answered with a body lacking the object URL.
    #[cfg(feature = "blob-upload")]
    #[error("failed to decode blob storage response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A validated `data:image/...` URL split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrlImage {
    data_url: String,
    extension: String,
    base64: bool,
    payload_start: usize,
}

impl DataUrlImage {
    /// Split `data_url` into media type and payload.
    pub fn parse(data_url: impl Into<String>) -> Result<Self, UploadError> {
        let data_url = data_url.into();
        let header_end = data_url
            .find(',')
            .ok_or(UploadError::InvalidDataUrl("missing payload separator"))?;
        let header = &data_url[..header_end];
        let subtype = header
            .strip_prefix(IMAGE_DATA_URL_PREFIX)
            .ok_or(UploadError::InvalidDataUrl("not an image data URL"))?;

        let extension: String = subtype
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        let extension = if extension.is_empty() {
            DEFAULT_IMAGE_EXTENSION.to_string()
        } else {
            extension.to_ascii_lowercase()
        };
        let base64 = header.split(';').any(|part| part == "base64");

        Ok(Self {
            extension,
            base64,
            payload_start: header_end + 1,
            data_url,
        })
    }

    /// File extension derived from the image subtype, e.g. `png`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// MIME type sent alongside the decoded bytes.
    pub fn content_type(&self) -> String {
        format!("image/{}", self.extension)
    }

    /// Decode the payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, UploadError> {
        if !self.base64 {
            return Err(UploadError::InvalidDataUrl("payload is not base64 encoded"));
        }
        STANDARD
            .decode(&self.data_url[self.payload_start..])
            .map_err(|source| UploadError::Decode { source })
    }

    /// Consume the image, returning the original data URL.
    pub fn into_data_url(self) -> String {
        self.data_url
    }
}

/// Abstraction over where winner photos end up.
pub trait PhotoUploader: Send + Sync {
    /// Store the image and return the reference to keep in the game state.
    fn upload(&self, image: DataUrlImage) -> BoxFuture<'static, Result<String, UploadError>>;
    /// Short label reported by the health endpoint.
    fn kind(&self) -> &'static str;
}

/// Keeps the data URL itself. Photos are lost on restart.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineUploader;

impl PhotoUploader for InlineUploader {
    fn upload(&self, image: DataUrlImage) -> BoxFuture<'static, Result<String, UploadError>> {
        Box::pin(async move { Ok(image.into_data_url()) })
    }

    fn kind(&self) -> &'static str {
        "inline"
    }
}

#[cfg(feature = "blob-upload")]
pub use self::blob::{BlobConfig, BlobUploader};

#[cfg(feature = "blob-upload")]
mod blob {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use reqwest::{Client, header::CONTENT_TYPE};
    use serde::Deserialize;
    use time::OffsetDateTime;
    use tracing::debug;
    use uuid::Uuid;

    use super::{DataUrlImage, PhotoUploader, UploadError};

    const DEFAULT_BLOB_BASE_URL: &str = "https://blob.vercel-storage.com";
    const DEFAULT_BLOB_PATH_PREFIX: &str = "unicorn-game";

    /// Runtime configuration describing where blobs are written.
    #[derive(Debug, Clone)]
    pub struct BlobConfig {
        pub token: String,
        pub base_url: String,
        pub path_prefix: String,
    }

    impl BlobConfig {
        /// Construct a configuration with the default endpoint and prefix.
        pub fn new(token: impl Into<String>) -> Self {
            Self {
                token: token.into(),
                base_url: DEFAULT_BLOB_BASE_URL.to_string(),
                path_prefix: DEFAULT_BLOB_PATH_PREFIX.to_string(),
            }
        }

        /// Build a configuration from the environment. `None` when no token is set.
        pub fn from_env() -> Option<Self> {
            let token = std::env::var("BLOB_READ_WRITE_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty())?;
            let mut config = Self::new(token);

            if let Some(base_url) = non_empty_env("BLOB_BASE_URL") {
                config.base_url = base_url;
            }
            if let Some(prefix) = non_empty_env("BLOB_PATH_PREFIX") {
                config.path_prefix = prefix;
            }

            Some(config)
        }

        /// Object path for a new photo, unique per call.
        pub fn object_path(&self, extension: &str, millis: i64) -> String {
            format!(
                "{}/winner-photo-{millis}-{}.{extension}",
                self.path_prefix.trim_matches('/'),
                Uuid::new_v4().simple()
            )
        }
    }

    fn non_empty_env(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    #[derive(Debug, Deserialize)]
    struct BlobPutResponse {
        url: String,
    }

    /// Uploads photos to an HTTP blob store with a bearer token.
    #[derive(Clone)]
    pub struct BlobUploader {
        client: Client,
        config: Arc<BlobConfig>,
    }

    impl BlobUploader {
        /// Build the HTTP client used for uploads.
        pub fn new(config: BlobConfig) -> Result<Self, UploadError> {
            let client = Client::builder()
                .build()
                .map_err(|source| UploadError::ClientBuilder { source })?;
            Ok(Self {
                client,
                config: Arc::new(config),
            })
        }
    }

    impl PhotoUploader for BlobUploader {
        fn upload(&self, image: DataUrlImage) -> BoxFuture<'static, Result<String, UploadError>> {
            let client = self.client.clone();
            let config = Arc::clone(&self.config);

            Box::pin(async move {
                let bytes = image.decode()?;
                let millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
                let path = config.object_path(image.extension(), millis);
                let url = format!("{}/{}", config.base_url.trim_end_matches('/'), path);
                debug!(%path, size = bytes.len(), "uploading winner photo");

                let response = client
                    .put(&url)
                    .bearer_auth(&config.token)
                    .header(CONTENT_TYPE, image.content_type())
                    .body(bytes)
                    .send()
                    .await
                    .map_err(|source| UploadError::RequestSend {
                        path: path.clone(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(UploadError::RequestStatus { path, status });
                }

                let body = response
                    .json::<BlobPutResponse>()
                    .await
                    .map_err(|source| UploadError::DecodeResponse {
                        path: path.clone(),
                        source,
                    })?;
                Ok(body.url)
            })
        }

        fn kind(&self) -> &'static str {
            "blob"
        }
    }
}

/// Pick the uploader for this process from the environment.
///
/// Blob storage is used when `BLOB_READ_WRITE_TOKEN` is set; every other case keeps photos
/// inline.
pub fn uploader_from_env() -> Arc<dyn PhotoUploader> {
    #[cfg(feature = "blob-upload")]
    {
        if let Some(config) = BlobConfig::from_env() {
            match BlobUploader::new(config) {
                Ok(uploader) => {
                    info!("winner photos will be uploaded to blob storage");
                    return Arc::new(uploader);
                }
                Err(err) => {
                    warn!(error = %err, "blob storage unavailable; keeping photos inline");
                }
            }
        }
    }

    #[cfg(not(feature = "blob-upload"))]
    {
        if std::env::var_os("BLOB_READ_WRITE_TOKEN").is_some() {
            warn!("BLOB_READ_WRITE_TOKEN is set but blob uploads are not compiled in");
        }
    }

    info!("winner photos are kept inline in memory");
    Arc::new(InlineUploader)
}
