//! Client identity resolution error types.

use thiserror::Error;

use snapdish_core::ClientId;

/// Errors that stop a client from being resolved.
///
/// Lookup failures never appear here: a failed lookup is treated as "no
/// match" and resolution moves on to the next step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The email belongs to a client owned by another auth account.
    #[error("the email {email} is already registered to a different account")]
    EmailConflict { email: String },

    /// Attaching the auth account to an anonymous client failed.
    #[error("failed to link client {client_id} to the signed-in account: {message}")]
    LinkUpdateFailed { client_id: ClientId, message: String },

    /// Inserting a brand-new client failed.
    #[error("failed to create client: {message}")]
    CreationFailed { message: String },

    /// Resolution finished without an id or an error.
    #[error("client resolution finished without a client id")]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_conflict_message() {
        let err = ResolveError::EmailConflict {
            email: "chef@bistro.nl".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "the email chef@bistro.nl is already registered to a different account"
        );
    }

    #[test]
    fn test_link_failure_names_client() {
        let client_id = ClientId::random();
        let err = ResolveError::LinkUpdateFailed {
            client_id,
            message: "permission denied".to_owned(),
        };
        let message = err.to_string();
        assert!(message.contains(&client_id.to_string()));
        assert!(message.contains("permission denied"));
    }
}
