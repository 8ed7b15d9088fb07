use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::metadata::VideoMetadata;

/// Public YouTube Data API host
pub const DEFAULT_API_ADDRESS: &str = "https://www.googleapis.com";

const INSERT_PATH: &str = "/upload/youtube/v3/videos";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid API address '{0}'")]
    InvalidAddress(String),

    #[error("Error making YouTube API call: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API rejected the upload (status {status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("Upload session response has no usable Location header")]
    MissingSessionUri,
}

/// Video resource returned by `videos.insert`
#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(default)]
    pub status: Option<VideoStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    #[serde(default)]
    pub upload_status: Option<String>,
    #[serde(default)]
    pub privacy_status: Option<String>,
}

/// Uploads videos with an already authorized HTTP client
pub struct VideoClient {
    http: reqwest::Client,
    base_url: Url,
}

impl VideoClient {
    pub fn new(http: reqwest::Client, api_address: &str) -> Result<Self, UploadError> {
        let base_url =
            Url::parse(api_address).map_err(|_| UploadError::InvalidAddress(api_address.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// Insert a video, streaming `body` of `content_length` bytes as its media
    pub async fn insert<R>(
        &self,
        metadata: &VideoMetadata,
        body: R,
        content_length: u64,
        content_type: &str,
    ) -> Result<Video, UploadError>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let session_uri = self
            .start_session(metadata, content_length, content_type)
            .await?;
        log::debug!("Resumable upload session: {}", session_uri);

        let response = self
            .http
            .put(session_uri)
            .header(CONTENT_LENGTH, content_length)
            .header(CONTENT_TYPE, content_type)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(body)))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Open a resumable session carrying the metadata, returning its upload URI
    async fn start_session(
        &self,
        metadata: &VideoMetadata,
        content_length: u64,
        content_type: &str,
    ) -> Result<Url, UploadError> {
        let mut url = self
            .base_url
            .join(INSERT_PATH)
            .map_err(|_| UploadError::InvalidAddress(self.base_url.to_string()))?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("part", "snippet,status");

        let response = self
            .http
            .post(url)
            .header("X-Upload-Content-Length", content_length)
            .header("X-Upload-Content-Type", content_type)
            .json(&metadata.to_resource())
            .send()
            .await?;

        let response = check_status(response).await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(UploadError::MissingSessionUri)?;

        self.base_url
            .join(location)
            .map_err(|_| UploadError::MissingSessionUri)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, UploadError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await?;
    Err(UploadError::Api { status, body })
}
