//! Row and payload types exchanged with the gateways.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use snapdish_core::{
    AffiliateId, AuthUserId, ClientId, CommissionId, CommissionStatus, ItemId, SubmissionStatus,
};

/// The authenticated user behind the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: AuthUserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Insert payload for a `menu_items` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewItem {
    pub client_id: ClientId,
    pub item_name: String,
    pub item_type: Option<String>,
    pub description: Option<String>,
}

/// Insert payload for a `submissions` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSubmission {
    pub client_id: ClientId,
    pub item_id: ItemId,
    pub status: SubmissionStatus,
    pub original_image_urls: Vec<String>,
    pub notes: Option<String>,
}

/// A commission earned by an affiliate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub commission_id: CommissionId,
    pub affiliate_id: AffiliateId,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    pub amount: Decimal,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
}
