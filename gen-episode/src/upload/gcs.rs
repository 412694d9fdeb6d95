//! Google Cloud Storage uploader using the JSON API media upload.

use super::{UploadError, Uploader};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::path::Path;

const GCS_UPLOAD_URL: &str = "https://storage.googleapis.com/upload/storage/v1";
const GCS_PUBLIC_URL: &str = "https://storage.googleapis.com";

/// Environment variable holding the OAuth access token for uploads.
pub const TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Uploads objects into one bucket.
pub struct GcsUploader {
    bucket: String,
    token: String,
    client: Client,
}

impl GcsUploader {
    pub fn new(bucket: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            token: token.into(),
            client: Client::new(),
        }
    }

    /// Create an uploader with the access token from the environment.
    /// A blank token counts as missing.
    pub fn from_env(bucket: impl Into<String>) -> anyhow::Result<Self> {
        let token = usable_token(std::env::var(TOKEN_ENV_VAR).ok())
            .ok_or_else(|| anyhow::anyhow!("Please set the {} environment variable.", TOKEN_ENV_VAR))?;
        Ok(Self::new(bucket, token))
    }

    fn upload_url(&self) -> String {
        format!("{}/b/{}/o", GCS_UPLOAD_URL, self.bucket)
    }
}

fn usable_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl Uploader for GcsUploader {
    async fn upload(&self, local: &Path, remote_key: &str) -> Result<(), UploadError> {
        let body = tokio::fs::read(local).await.map_err(|e| UploadError::Read {
            path: local.display().to_string(),
            source: e,
        })?;

        debug!("Uploading {} bytes to gs://{}/{}", body.len(), self.bucket, remote_key);

        let response = self
            .client
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", remote_key)])
            .bearer_auth(&self.token)
            .header("Content-Type", "audio/mpeg")
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    fn url_for(&self, remote_key: &str) -> String {
        format!("{}/{}/{}", GCS_PUBLIC_URL, self.bucket, remote_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let uploader = GcsUploader::new("podcasts", "token");
        assert_eq!(
            uploader.upload_url(),
            "https://storage.googleapis.com/upload/storage/v1/b/podcasts/o"
        );
        assert_eq!(
            uploader.url_for("lib/attention.mp3"),
            "https://storage.googleapis.com/podcasts/lib/attention.mp3"
        );
    }

    #[test]
    fn test_blank_token_is_missing() {
        assert_eq!(usable_token(None), None);
        assert_eq!(usable_token(Some(String::new())), None);
        assert_eq!(usable_token(Some("  \n".to_string())), None);
        assert_eq!(usable_token(Some("ya29.abc".to_string())).as_deref(), Some("ya29.abc"));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let uploader = GcsUploader::new("podcasts", "token");
        let err = uploader
            .upload(Path::new("/nonexistent/episode.mp3"), "lib/episode.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Read { .. }));
    }
}
