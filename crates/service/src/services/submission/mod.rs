//! Submission pipeline.
//!
//! Turns a filled-in submission form into stored rows: resolve the client,
//! upload the reference images, store the menu item and the submission, then
//! notify the automation webhook.

mod error;

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use snapdish_core::{
    AuthUserId, ClientDetails, ClientId, ItemId, SubmissionId, SubmissionStatus,
};

use crate::gateway::{NewItem, NewSubmission, StorageGateway, SubmissionGateway, SubmissionNotifier};
use crate::services::identity::ClientIdentityResolver;
use crate::webhook::SubmissionWebhookPayload;

pub use error::SubmissionError;

/// Event name sent with every submission webhook.
pub const SUBMISSION_EVENT: &str = "submission.created";

/// The dish being photographed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDetails {
    pub item_name: String,
    pub item_type: Option<String>,
    pub description: Option<String>,
}

/// One reference image from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything the customer submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub client: ClientDetails,
    pub item: ItemDetails,
    pub images: Vec<ImageUpload>,
    pub notes: Option<String>,
}

/// What a successful submission stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub client_id: ClientId,
    pub item_id: ItemId,
    pub submission_id: SubmissionId,
    pub image_urls: Vec<String>,
    /// Whether the webhook accepted the notification.
    pub notified: bool,
}

/// Stores submissions end to end.
#[derive(Clone)]
pub struct SubmissionPipeline {
    resolver: ClientIdentityResolver,
    submissions: Arc<dyn SubmissionGateway>,
    storage: Arc<dyn StorageGateway>,
    notifier: Arc<dyn SubmissionNotifier>,
}

impl SubmissionPipeline {
    #[must_use]
    pub fn new(
        resolver: ClientIdentityResolver,
        submissions: Arc<dyn SubmissionGateway>,
        storage: Arc<dyn StorageGateway>,
        notifier: Arc<dyn SubmissionNotifier>,
    ) -> Self {
        Self {
            resolver,
            submissions,
            storage,
            notifier,
        }
    }

    /// Store a submission.
    ///
    /// Images are uploaded one at a time; the first failure aborts and leaves
    /// earlier uploads in storage. If the submission row cannot be stored the
    /// item row created for it is deleted again.
    ///
    /// # Errors
    ///
    /// See [`SubmissionError`]. A webhook failure is not an error.
    #[instrument(skip(self, form), fields(item = %form.item.item_name, images = form.images.len()))]
    pub async fn submit(
        &self,
        form: SubmissionForm,
        auth_user_id: Option<AuthUserId>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        validate(&form)?;

        let client_id = self.resolver.resolve(&form.client, auth_user_id).await?;
        let image_urls = self.upload_images(client_id, &form.images).await?;

        let item_id = self
            .submissions
            .insert_item(NewItem {
                client_id,
                item_name: form.item.item_name.trim().to_owned(),
                item_type: form.item.item_type.clone(),
                description: form.item.description.clone(),
            })
            .await
            .map_err(|e| SubmissionError::ItemInsert(e.message))?;

        let submission_id = self
            .insert_submission(client_id, item_id, &image_urls, form.notes.clone())
            .await?;

        info!(%client_id, %item_id, %submission_id, "Submission stored");

        let payload = SubmissionWebhookPayload {
            event: SUBMISSION_EVENT.to_owned(),
            client_id,
            submission_id,
            item_id,
            restaurant_name: form.client.restaurant_name,
            contact_name: form.client.contact_name,
            phone_number: form.client.phone_number,
            email: form.client.email,
            item_name: form.item.item_name,
            item_type: form.item.item_type,
            description: form.item.description,
            image_urls: image_urls.clone(),
            submitted_at: Utc::now(),
        };
        let notified = match self.notifier.notify(&payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%submission_id, error = %e, "Submission webhook failed");
                false
            }
        };

        Ok(SubmissionReceipt {
            client_id,
            item_id,
            submission_id,
            image_urls,
            notified,
        })
    }

    /// Reassign a submission (and its item) to `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Link`] if the store rejects the update.
    #[instrument(skip(self))]
    pub async fn link_submission(
        &self,
        submission_id: SubmissionId,
        client_id: ClientId,
    ) -> Result<(), SubmissionError> {
        self.submissions
            .link_submission(submission_id, client_id)
            .await
            .map_err(|e| SubmissionError::Link {
                submission_id,
                message: e.message,
            })?;
        info!(%submission_id, %client_id, "Submission linked");
        Ok(())
    }

    async fn upload_images(
        &self,
        client_id: ClientId,
        images: &[ImageUpload],
    ) -> Result<Vec<String>, SubmissionError> {
        let batch = Uuid::new_v4();
        let mut urls = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            let path = upload_path(client_id, batch, index, &image.file_name);
            self.storage
                .upload(&path, image.bytes.clone(), &image.content_type)
                .await
                .map_err(|e| {
                    warn!(%client_id, uploaded = urls.len(), file = %image.file_name, "Image upload failed, aborting");
                    SubmissionError::Upload {
                        file_name: image.file_name.clone(),
                        message: e.message,
                    }
                })?;
            urls.push(self.storage.public_url(&path));
        }

        Ok(urls)
    }

    async fn insert_submission(
        &self,
        client_id: ClientId,
        item_id: ItemId,
        image_urls: &[String],
        notes: Option<String>,
    ) -> Result<SubmissionId, SubmissionError> {
        let submission = NewSubmission {
            client_id,
            item_id,
            status: SubmissionStatus::Pending,
            original_image_urls: image_urls.to_vec(),
            notes,
        };

        match self.submissions.insert_submission(submission).await {
            Ok(submission_id) => Ok(submission_id),
            Err(e) => {
                let item_removed = match self.submissions.delete_item(item_id).await {
                    Ok(()) => true,
                    Err(cleanup) => {
                        warn!(%item_id, error = %cleanup, "Failed to remove orphaned item");
                        false
                    }
                };
                Err(SubmissionError::SubmissionInsert {
                    message: e.message,
                    item_removed,
                })
            }
        }
    }
}

fn validate(form: &SubmissionForm) -> Result<(), SubmissionError> {
    if form.item.item_name.trim().is_empty() {
        return Err(SubmissionError::Validation(
            "item name is required".to_owned(),
        ));
    }
    if form.images.is_empty() {
        return Err(SubmissionError::Validation(
            "at least one image is required".to_owned(),
        ));
    }
    Ok(())
}

/// Storage path for the `index`th image of a batch.
fn upload_path(client_id: ClientId, batch: Uuid, index: usize, file_name: &str) -> String {
    let file_name = file_name.replace(['/', '\\'], "-");
    format!("{client_id}/{batch}/{index:02}-{file_name}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use snapdish_core::Client;

    use super::*;
    use crate::gateway::{
        MockAuthGateway, MockClientGateway, MockPackageGateway, MockStorageGateway,
        MockSubmissionGateway, MockSubmissionNotifier, StoreError,
    };
    use crate::webhook::WebhookError;

    fn form(images: usize) -> SubmissionForm {
        SubmissionForm {
            client: ClientDetails {
                restaurant_name: "Bistro Zuid".to_owned(),
                contact_name: "Daan".to_owned(),
                phone_number: "+31 6 1234 5678".to_owned(),
                email: "chef@bistro.nl".to_owned(),
            },
            item: ItemDetails {
                item_name: "Steak tartare".to_owned(),
                item_type: Some("starter".to_owned()),
                description: None,
            },
            images: (0..images)
                .map(|i| ImageUpload {
                    file_name: format!("photo{i}.jpg"),
                    content_type: "image/jpeg".to_owned(),
                    bytes: vec![0xFF, 0xD8],
                })
                .collect(),
            notes: None,
        }
    }

    /// Resolver that always finds the same anonymous client by email.
    fn resolver(client_id: ClientId) -> ClientIdentityResolver {
        let mut auth = MockAuthGateway::new();
        auth.expect_current_session_user().returning(|| Ok(None));
        let mut clients = MockClientGateway::new();
        clients.expect_find_by_email().returning(move |email| {
            Ok(vec![Client {
                client_id,
                email: email.to_owned(),
                user_auth_id: None,
                restaurant_name: "Bistro Zuid".to_owned(),
                contact_name: "Daan".to_owned(),
                phone: String::new(),
                current_package_id: None,
                remaining_servings: 0,
            }])
        });
        ClientIdentityResolver::new(
            Arc::new(clients),
            Arc::new(MockPackageGateway::new()),
            Arc::new(auth),
        )
    }

    fn storage() -> MockStorageGateway {
        let mut storage = MockStorageGateway::new();
        storage.expect_upload().returning(|_, _, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|path| format!("https://cdn.test/{path}"));
        storage
    }

    fn pipeline(
        client_id: ClientId,
        submissions: MockSubmissionGateway,
        storage: MockStorageGateway,
        notifier: MockSubmissionNotifier,
    ) -> SubmissionPipeline {
        SubmissionPipeline::new(
            resolver(client_id),
            Arc::new(submissions),
            Arc::new(storage),
            Arc::new(notifier),
        )
    }

    #[test]
    fn test_upload_path_layout() {
        let client_id = ClientId::random();
        let batch = Uuid::new_v4();
        assert_eq!(
            upload_path(client_id, batch, 3, "a/b.jpg"),
            format!("{client_id}/{batch}/03-a-b.jpg")
        );
    }

    #[tokio::test]
    async fn stores_submission_and_notifies() {
        let client_id = ClientId::random();
        let item_id = ItemId::random();
        let submission_id = SubmissionId::random();

        let mut submissions = MockSubmissionGateway::new();
        submissions
            .expect_insert_item()
            .withf(move |item| item.client_id == client_id && item.item_name == "Steak tartare")
            .times(1)
            .return_once(move |_| Ok(item_id));
        submissions
            .expect_insert_submission()
            .withf(move |s| {
                s.item_id == item_id
                    && s.status == SubmissionStatus::Pending
                    && s.original_image_urls.len() == 2
            })
            .times(1)
            .return_once(move |_| Ok(submission_id));
        submissions.expect_delete_item().never();

        let mut notifier = MockSubmissionNotifier::new();
        notifier
            .expect_notify()
            .withf(move |p| p.submission_id == submission_id && p.image_urls.len() == 2)
            .times(1)
            .returning(|_| Ok(()));

        let receipt = pipeline(client_id, submissions, storage(), notifier)
            .submit(form(2), None)
            .await
            .unwrap();

        assert_eq!(receipt.client_id, client_id);
        assert_eq!(receipt.submission_id, submission_id);
        assert!(receipt.notified);
        assert!(receipt.image_urls[0].starts_with(&format!("https://cdn.test/{client_id}/")));
        assert!(receipt.image_urls[1].ends_with("/01-photo1.jpg"));
    }

    #[tokio::test]
    async fn failed_submission_insert_removes_item() {
        let client_id = ClientId::random();
        let item_id = ItemId::random();

        let mut submissions = MockSubmissionGateway::new();
        submissions
            .expect_insert_item()
            .return_once(move |_| Ok(item_id));
        submissions
            .expect_insert_submission()
            .return_once(|_| Err(StoreError::other("violates check constraint")));
        submissions
            .expect_delete_item()
            .withf(move |id| *id == item_id)
            .times(1)
            .returning(|_| Ok(()));

        let mut notifier = MockSubmissionNotifier::new();
        notifier.expect_notify().never();

        let err = pipeline(client_id, submissions, storage(), notifier)
            .submit(form(1), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::SubmissionInsert {
                message: "violates check constraint".to_owned(),
                item_removed: true,
            }
        );
    }

    #[tokio::test]
    async fn webhook_failure_does_not_fail_submission() {
        let mut submissions = MockSubmissionGateway::new();
        submissions
            .expect_insert_item()
            .returning(|_| Ok(ItemId::random()));
        submissions
            .expect_insert_submission()
            .returning(|_| Ok(SubmissionId::random()));

        let mut notifier = MockSubmissionNotifier::new();
        notifier.expect_notify().times(1).returning(|_| {
            Err(WebhookError::Rejected {
                status: 502,
                message: "bad gateway".to_owned(),
            })
        });

        let receipt = pipeline(ClientId::random(), submissions, storage(), notifier)
            .submit(form(1), None)
            .await
            .unwrap();
        assert!(!receipt.notified);
    }

    #[tokio::test]
    async fn upload_failure_aborts_before_any_row_is_written() {
        let uploaded = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&uploaded);

        let mut storage = MockStorageGateway::new();
        storage.expect_upload().returning(move |path, _, _| {
            let mut seen = seen.lock().unwrap();
            seen.push(path.to_owned());
            if seen.len() == 2 {
                Err(StoreError::other("quota exceeded"))
            } else {
                Ok(())
            }
        });
        storage
            .expect_public_url()
            .returning(|path| format!("https://cdn.test/{path}"));

        let mut submissions = MockSubmissionGateway::new();
        submissions.expect_insert_item().never();
        submissions.expect_insert_submission().never();

        let err = pipeline(
            ClientId::random(),
            submissions,
            storage,
            MockSubmissionNotifier::new(),
        )
        .submit(form(3), None)
        .await
        .unwrap_err();

        assert_eq!(
            err,
            SubmissionError::Upload {
                file_name: "photo1.jpg".to_owned(),
                message: "quota exceeded".to_owned(),
            }
        );
        assert_eq!(uploaded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejects_form_without_images() {
        let err = pipeline(
            ClientId::random(),
            MockSubmissionGateway::new(),
            MockStorageGateway::new(),
            MockSubmissionNotifier::new(),
        )
        .submit(form(0), None)
        .await
        .unwrap_err();
        assert!(matches!(err, SubmissionError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_blank_item_name() {
        let mut blank = form(1);
        blank.item.item_name = "   ".to_owned();
        let err = pipeline(
            ClientId::random(),
            MockSubmissionGateway::new(),
            MockStorageGateway::new(),
            MockSubmissionNotifier::new(),
        )
        .submit(blank, None)
        .await
        .unwrap_err();
        assert!(matches!(err, SubmissionError::Validation(_)));
    }

    #[tokio::test]
    async fn link_failure_names_submission() {
        let submission_id = SubmissionId::random();
        let mut submissions = MockSubmissionGateway::new();
        submissions
            .expect_link_submission()
            .return_once(|_, _| Err(StoreError::not_found("no rows")));

        let err = pipeline(
            ClientId::random(),
            submissions,
            MockStorageGateway::new(),
            MockSubmissionNotifier::new(),
        )
        .link_submission(submission_id, ClientId::random())
        .await
        .unwrap_err();
        assert!(matches!(err, SubmissionError::Link { submission_id: id, .. } if id == submission_id));
    }
}
