// src/thumbnail.rs
//! Two-phase thumbnail upload: reserve an upload slot, then send the bytes.

use crate::api::NotionRepository;
use crate::constants::THUMBNAIL_FILE_NAME;
use crate::error::{AppError, UploadStage};
use crate::model::ImageData;
use crate::types::FileUploadId;

/// Uploads `image` and returns the handle a page can reference.
///
/// Every failure comes back as [`AppError::UploadFailed`] tagged with the
/// phase it happened in.
pub async fn upload_thumbnail<R>(repo: &R, image: &ImageData) -> Result<FileUploadId, AppError>
where
    R: NotionRepository + ?Sized,
{
    let slot = repo
        .create_file_upload()
        .await
        .map_err(|e| into_upload_error(e, UploadStage::CreateSlot))?;
    log::debug!("Reserved file upload {} for {:?}", slot.id, image);

    repo.send_file_upload(&slot, image, THUMBNAIL_FILE_NAME)
        .await
        .map_err(|e| into_upload_error(e, UploadStage::Transfer))?;
    log::info!("Uploaded thumbnail {} ({} bytes)", slot.id, image.len());

    Ok(slot.id)
}

/// Decodes a captured data URL and uploads it.
pub async fn upload_data_url<R>(repo: &R, data_url: &str) -> Result<FileUploadId, AppError>
where
    R: NotionRepository + ?Sized,
{
    let image = ImageData::from_data_url(data_url)?;
    upload_thumbnail(repo, &image).await
}

fn into_upload_error(error: AppError, stage: UploadStage) -> AppError {
    match error {
        already @ AppError::UploadFailed { .. } => already,
        other => AppError::UploadFailed {
            stage,
            message: other.to_string(),
        },
    }
}
