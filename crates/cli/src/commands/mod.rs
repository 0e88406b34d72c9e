//! Command implementations.

pub mod affiliate;
pub mod client;
pub mod packages;
pub mod submit;

use clap::Args;
use secrecy::SecretString;
use thiserror::Error;

use snapdish_core::{ClientDetails, Email, EmailError};
use snapdish_service::services::{ResolveError, SubmissionError};
use snapdish_service::state::StateError;
use snapdish_service::{AppState, ConfigError, ServiceConfig};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialise services: {0}")]
    State(#[from] StateError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Backend error: {0}")]
    Store(#[from] snapdish_service::gateway::StoreError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(std::io::Error),
}

/// Contact details as entered on the submission form.
#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Restaurant name
    #[arg(long)]
    pub restaurant: String,

    /// Contact person
    #[arg(long)]
    pub contact: String,

    /// Contact phone number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Contact email; leave empty to skip matching by email
    #[arg(short, long, default_value = "")]
    pub email: String,
}

impl ClientArgs {
    /// Form details, with the email validated when one was given.
    pub fn into_details(self) -> Result<ClientDetails, CommandError> {
        let email = if self.email.trim().is_empty() {
            String::new()
        } else {
            Email::parse(&self.email)?.into_inner()
        };
        Ok(ClientDetails {
            restaurant_name: self.restaurant,
            contact_name: self.contact,
            phone_number: self.phone,
            email,
        })
    }
}

/// Build service state, acting as the session owner when a token is given.
pub fn connect(
    config: &ServiceConfig,
    session_token: Option<String>,
) -> Result<AppState, CommandError> {
    Ok(AppState::new(
        config,
        session_token.map(SecretString::from),
    )?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(email: &str) -> ClientArgs {
        ClientArgs {
            restaurant: "Bistro Zuid".to_owned(),
            contact: "Daan".to_owned(),
            phone: String::new(),
            email: email.to_owned(),
        }
    }

    #[test]
    fn test_empty_email_is_allowed() {
        let details = args("").into_details().unwrap();
        assert!(details.email.is_empty());
    }

    #[test]
    fn test_email_is_trimmed() {
        let details = args("  chef@bistro.nl ").into_details().unwrap();
        assert_eq!(details.email, "chef@bistro.nl");
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        assert!(matches!(
            args("not-an-email").into_details(),
            Err(CommandError::InvalidEmail(EmailError::MissingAtSymbol))
        ));
    }
}
