use serde::Serialize;
use std::path::Path;

/// "People & Blogs"
pub const DEFAULT_CATEGORY_ID: &str = "22";
pub const DEFAULT_PRIVACY_STATUS: &str = "private";

/// Metadata sent along with an uploaded video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy_status: String,
}

impl VideoMetadata {
    /// Private video titled after the file name without its extension
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = match file_name.rfind('.') {
            Some(dot) => file_name[..dot].to_string(),
            None => file_name,
        };

        Self {
            title,
            description: String::new(),
            tags: Vec::new(),
            category_id: DEFAULT_CATEGORY_ID.to_string(),
            privacy_status: DEFAULT_PRIVACY_STATUS.to_string(),
        }
    }

    /// JSON `video` resource with the `snippet` and `status` parts
    pub(crate) fn to_resource(&self) -> VideoResource<'_> {
        VideoResource {
            snippet: Snippet {
                title: &self.title,
                description: &self.description,
                tags: &self.tags,
                category_id: &self.category_id,
            },
            status: Status {
                privacy_status: &self.privacy_status,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    category_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
}

/// MIME type announced for the upload, guessed from the extension
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mpg" | "mpeg") => "video/mpeg",
        _ => "application/octet-stream",
    }
}
