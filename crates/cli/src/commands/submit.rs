//! Submission commands.
//!
//! # Usage
//!
//! ```bash
//! # Submit two reference photos for a dish
//! snapdish submit --restaurant "Bistro Zuid" --contact Daan -e chef@bistro.nl \
//!     --item-name "Steak tartare" --item-type starter \
//!     --image photos/tartare-1.jpg --image photos/tartare-2.jpg
//!
//! # Move a submission to another client
//! snapdish link-submission --submission-id 1b4e... --client-id 9a7c...
//! ```

use std::path::Path;

use snapdish_core::{AuthUserId, ClientId, SubmissionId};
use snapdish_service::AppState;
use snapdish_service::services::{ImageUpload, ItemDetails, SubmissionForm, SubmissionReceipt};

use super::{ClientArgs, CommandError};

/// Content type for an image file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

async fn read_image(path: &Path) -> Result<ImageUpload, CommandError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_owned(), |name| name.to_string_lossy().into_owned());
    Ok(ImageUpload {
        file_name,
        content_type: content_type_for(path).to_owned(),
        bytes,
    })
}

/// Upload the images and store the submission.
pub async fn submit(
    state: &AppState,
    client: ClientArgs,
    item: ItemDetails,
    images: &[impl AsRef<Path>],
    notes: Option<String>,
    auth_user_id: Option<AuthUserId>,
) -> Result<SubmissionReceipt, CommandError> {
    let mut uploads = Vec::with_capacity(images.len());
    for path in images {
        uploads.push(read_image(path.as_ref()).await?);
    }

    let form = SubmissionForm {
        client: client.into_details()?,
        item,
        images: uploads,
        notes,
    };

    let receipt = state.pipeline().submit(form, auth_user_id).await?;
    tracing::info!(
        client_id = %receipt.client_id,
        item_id = %receipt.item_id,
        submission_id = %receipt.submission_id,
        images = receipt.image_urls.len(),
        notified = receipt.notified,
        "Submission stored"
    );
    Ok(receipt)
}

/// Reassign a submission to another client.
pub async fn link(
    state: &AppState,
    submission_id: SubmissionId,
    client_id: ClientId,
) -> Result<(), CommandError> {
    state
        .pipeline()
        .link_submission(submission_id, client_id)
        .await?;
    Ok(())
}
