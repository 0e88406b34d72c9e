//! Status enums stored alongside commissions and submissions.

use serde::{Deserialize, Serialize};

/// Payment status of an affiliate commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Earned, awaiting review.
    #[default]
    Pending,
    /// Reviewed and scheduled for payout.
    Approved,
    /// Paid out to the affiliate.
    Paid,
    /// Voided (refund, fraud, or duplicate referral).
    Cancelled,
}

impl CommissionStatus {
    /// Whether the commission still counts towards the affiliate's earnings.
    #[must_use]
    pub const fn is_earning(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether the commission is earned but not yet paid out.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl std::fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Paid => write!(f, "paid"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Processing status of a photo submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Uploaded, waiting for an editor.
    #[default]
    Pending,
    /// An editor is working on it.
    Processing,
    /// Final images delivered.
    Completed,
    Cancelled,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid submission status: {s}")),
        }
    }
}
