use std::path::Path;
use yt_video_client::{ProgressReader, VideoClient, VideoMetadata, content_type_for};

/// Upload one video file and delete it once YouTube has accepted it.
///
/// Returns the id assigned to the new video. The file is left untouched
/// unless the API call reports success.
pub async fn upload_video(
    client: &VideoClient,
    video_path: &Path,
) -> Result<String, Box<dyn std::error::Error>> {
    let file = tokio::fs::File::open(video_path)
        .await
        .map_err(|e| format!("Error opening video file '{}': {}", video_path.display(), e))?;

    let file_size = file
        .metadata()
        .await
        .map_err(|e| format!("Unable to get file info: {}", e))?
        .len();

    let metadata = VideoMetadata::from_path(video_path);
    let content_type = content_type_for(video_path);
    log::debug!(
        "Uploading {} bytes of {} as '{}'",
        file_size,
        content_type,
        metadata.title
    );

    println!("Uploading {}", metadata.title);

    let reader = ProgressReader::new(file, file_size);
    let bar = reader.bar().clone();

    // The file handle moves into the request body and is closed with it
    let video = match client
        .insert(&metadata, reader, file_size, content_type)
        .await
    {
        Ok(video) => video,
        Err(e) => {
            bar.abandon();
            return Err(e.into());
        }
    };

    bar.finish();

    if let Some(status) = &video.status {
        log::debug!(
            "Upload status: {}, privacy: {}",
            status.upload_status.as_deref().unwrap_or("unknown"),
            status.privacy_status.as_deref().unwrap_or("unknown")
        );
    }
    println!("Upload successful! Video ID: {}", video.id);

    tokio::fs::remove_file(video_path)
        .await
        .map_err(|e| format!("Error removing video: {}", e))?;
    log::info!("Removed {}", video_path.display());

    Ok(video.id)
}
