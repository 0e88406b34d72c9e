//! Submission pipeline error types.

use thiserror::Error;

use snapdish_core::SubmissionId;

use crate::services::identity::ResolveError;

/// Errors that fail a submission.
///
/// Webhook delivery failures are absent on purpose: they are logged and the
/// submission still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The form is missing something the pipeline needs.
    #[error("invalid submission: {0}")]
    Validation(String),

    /// No client could be resolved for the form.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// An image failed to upload. Earlier uploads stay in storage.
    #[error("failed to upload {file_name}: {message}")]
    Upload { file_name: String, message: String },

    /// The menu item row could not be stored.
    #[error("failed to store menu item: {0}")]
    ItemInsert(String),

    /// The submission row could not be stored.
    ///
    /// `item_removed` reports whether the orphaned item row was deleted.
    #[error("failed to store submission: {message}")]
    SubmissionInsert { message: String, item_removed: bool },

    /// Reassigning a submission to another client failed.
    #[error("failed to link submission {submission_id}: {message}")]
    Link {
        submission_id: SubmissionId,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_is_transparent() {
        let err: SubmissionError = ResolveError::EmailConflict {
            email: "chef@bistro.nl".to_owned(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "the email chef@bistro.nl is already registered to a different account"
        );
    }

    #[test]
    fn test_upload_error_names_file() {
        let err = SubmissionError::Upload {
            file_name: "burger.jpg".to_owned(),
            message: "payload too large".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "failed to upload burger.jpg: payload too large"
        );
    }
}
