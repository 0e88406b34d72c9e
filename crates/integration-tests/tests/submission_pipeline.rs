//! Integration tests for the submission pipeline.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use snapdish_core::{AuthUserId, SubmissionStatus};
use snapdish_integration_tests::{EMAIL, details, existing_client, tasting_package};
use snapdish_service::AppState;
use snapdish_service::gateway::StoreError;
use snapdish_service::services::{
    DEFAULT_FREE_PACKAGE_NAME, ImageUpload, ItemDetails, SubmissionError, SubmissionForm,
};
use snapdish_service::test_support::{InMemoryBackend, Operation, RecordingNotifier};

fn form(email: &str, images: usize) -> SubmissionForm {
    SubmissionForm {
        client: details(email),
        item: ItemDetails {
            item_name: "Bitterballen".to_owned(),
            item_type: Some("snack".to_owned()),
            description: Some("Six pieces with mustard".to_owned()),
        },
        images: (1..=images)
            .map(|i| ImageUpload {
                file_name: format!("bitterballen-{i}.jpg"),
                content_type: "image/jpeg".to_owned(),
                bytes: vec![0xFF, 0xD8, 0xFF, u8::try_from(i).unwrap_or(0)],
            })
            .collect(),
        notes: Some("Shoot from above".to_owned()),
    }
}

fn setup(notifier: RecordingNotifier) -> (Arc<InMemoryBackend>, Arc<RecordingNotifier>, AppState) {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(notifier);
    let state = AppState::from_gateways(
        backend.gateways(notifier.clone()),
        DEFAULT_FREE_PACKAGE_NAME,
    );
    (backend, notifier, state)
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_submission_stores_rows_and_notifies() {
    let (backend, notifier, state) = setup(RecordingNotifier::new());
    backend.add_package(tasting_package(true));

    let receipt = state.pipeline().submit(form(EMAIL, 3), None).await.unwrap();

    let objects = backend.objects();
    assert_eq!(objects.len(), 3);
    assert!(objects.keys().all(|path| path.starts_with(&format!("{}/", receipt.client_id))));
    assert!(objects.values().all(|o| o.content_type == "image/jpeg"));

    let items = backend.items();
    let item = items.get(&receipt.item_id).unwrap();
    assert_eq!(item.client_id, receipt.client_id);
    assert_eq!(item.item_name, "Bitterballen");

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    let stored = submissions.first().unwrap();
    assert_eq!(stored.submission_id, receipt.submission_id);
    assert_eq!(stored.row.status, SubmissionStatus::Pending);
    assert_eq!(stored.row.original_image_urls, receipt.image_urls);
    assert!(receipt.image_urls.iter().all(|url| url.starts_with("memory://submissions/")));

    assert!(receipt.notified);
    let payloads = notifier.payloads();
    assert_eq!(payloads.len(), 1);
    let payload = payloads.first().unwrap();
    assert_eq!(payload.submission_id, receipt.submission_id);
    assert_eq!(payload.restaurant_name, "X");
    assert_eq!(payload.email, EMAIL);
    assert_eq!(payload.image_urls, receipt.image_urls);
}

#[tokio::test]
async fn test_images_are_uploaded_in_form_order() {
    let (backend, _, state) = setup(RecordingNotifier::new());

    let receipt = state.pipeline().submit(form(EMAIL, 2), None).await.unwrap();

    assert!(receipt.image_urls.first().unwrap().ends_with("/00-bitterballen-1.jpg"));
    assert!(receipt.image_urls.get(1).unwrap().ends_with("/01-bitterballen-2.jpg"));
    assert_eq!(backend.calls(Operation::Upload), 2);
}

#[tokio::test]
async fn test_repeat_submissions_share_one_client() {
    let (backend, _, state) = setup(RecordingNotifier::new());
    let auth_id = AuthUserId::random();

    let first = state.pipeline().submit(form(EMAIL, 1), Some(auth_id)).await.unwrap();
    let second = state.pipeline().submit(form(EMAIL, 1), Some(auth_id)).await.unwrap();

    assert_eq!(first.client_id, second.client_id);
    assert_ne!(first.submission_id, second.submission_id);
    assert_eq!(backend.clients().len(), 1);
    assert_eq!(backend.submissions().len(), 2);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_failed_submission_insert_removes_item() {
    let (backend, notifier, state) = setup(RecordingNotifier::new());
    backend.fail(Operation::InsertSubmission, StoreError::other("check constraint"));

    let err = state.pipeline().submit(form(EMAIL, 1), None).await.unwrap_err();

    assert_eq!(
        err,
        SubmissionError::SubmissionInsert {
            message: "check constraint".to_owned(),
            item_removed: true,
        }
    );
    assert_eq!(backend.calls(Operation::DeleteItem), 1);
    assert!(backend.items().is_empty());
    assert!(notifier.payloads().is_empty());
    // Uploaded images are not cleaned up
    assert_eq!(backend.objects().len(), 1);
}

#[tokio::test]
async fn test_failed_cleanup_is_reported() {
    let (backend, _, state) = setup(RecordingNotifier::new());
    backend.fail(Operation::InsertSubmission, StoreError::other("check constraint"));
    backend.fail(Operation::DeleteItem, StoreError::other("permission denied"));

    let err = state.pipeline().submit(form(EMAIL, 1), None).await.unwrap_err();

    assert!(matches!(
        err,
        SubmissionError::SubmissionInsert {
            item_removed: false,
            ..
        }
    ));
    assert_eq!(backend.items().len(), 1);
}

#[tokio::test]
async fn test_webhook_rejection_keeps_submission() {
    let (backend, notifier, state) = setup(RecordingNotifier::rejecting(500));

    let receipt = state.pipeline().submit(form(EMAIL, 1), None).await.unwrap();

    assert!(!receipt.notified);
    assert_eq!(notifier.payloads().len(), 1);
    assert_eq!(backend.submissions().len(), 1);
}

#[tokio::test]
async fn test_upload_failure_stops_before_rows() {
    let (backend, _, state) = setup(RecordingNotifier::new());
    backend.fail(Operation::Upload, StoreError::other("quota exceeded"));

    let err = state.pipeline().submit(form(EMAIL, 2), None).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Upload { ref file_name, .. } if file_name == "bitterballen-1.jpg"));
    assert_eq!(backend.calls(Operation::Upload), 1);
    assert_eq!(backend.calls(Operation::InsertItem), 0);
}

#[tokio::test]
async fn test_conflict_stops_submission() {
    let (backend, _, state) = setup(RecordingNotifier::new());
    backend.add_client(existing_client(Some(AuthUserId::random())));

    let err = state
        .pipeline()
        .submit(form(EMAIL, 1), Some(AuthUserId::random()))
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::Resolve(_)));
    assert_eq!(backend.calls(Operation::Upload), 0);
}

// =============================================================================
// Admin linking
// =============================================================================

#[tokio::test]
async fn test_link_submission_moves_item_too() {
    let (backend, _, state) = setup(RecordingNotifier::new());
    let receipt = state.pipeline().submit(form(EMAIL, 1), None).await.unwrap();
    let other = backend.add_client(existing_client(None));

    state
        .pipeline()
        .link_submission(receipt.submission_id, other)
        .await
        .unwrap();

    let submissions = backend.submissions();
    assert_eq!(submissions.first().unwrap().row.client_id, other);
    assert_eq!(backend.items().get(&receipt.item_id).unwrap().client_id, other);
}
