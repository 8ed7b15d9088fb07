//! Client for uploading videos through the YouTube Data API `videos.insert`
//! resumable upload endpoint.

mod client;
mod metadata;
mod progress;

pub use client::{DEFAULT_API_ADDRESS, UploadError, Video, VideoClient, VideoSnippet, VideoStatus};
pub use metadata::{DEFAULT_CATEGORY_ID, DEFAULT_PRIVACY_STATUS, VideoMetadata, content_type_for};
pub use progress::ProgressReader;
