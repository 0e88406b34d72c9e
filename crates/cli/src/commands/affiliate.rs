//! Affiliate reporting commands.
//!
//! # Usage
//!
//! ```bash
//! snapdish affiliate summary --affiliate-id 3f2b...
//! snapdish affiliate referrals --affiliate-id 3f2b...
//! ```

use chrono::Utc;

use snapdish_core::AffiliateId;
use snapdish_service::AppState;

use super::CommandError;

/// Log commission totals for an affiliate as of now.
pub async fn summary(state: &AppState, affiliate_id: AffiliateId) -> Result<(), CommandError> {
    let summary = state.dashboard().summary(affiliate_id, Utc::now()).await?;
    tracing::info!(
        %affiliate_id,
        total_paid = %summary.total_paid,
        pending = %summary.pending,
        this_month = %summary.this_month,
        referrals = summary.referral_count,
        "Affiliate summary"
    );
    Ok(())
}

/// Log every client the affiliate referred.
pub async fn referrals(state: &AppState, affiliate_id: AffiliateId) -> Result<(), CommandError> {
    let clients = state.dashboard().referred_clients(affiliate_id).await?;
    tracing::info!(%affiliate_id, count = clients.len(), "Referred clients");
    for client in clients {
        tracing::info!(
            client_id = %client.client_id,
            restaurant = %client.restaurant_name,
            email = %client.email,
            remaining_servings = client.remaining_servings,
            "Referral"
        );
    }
    Ok(())
}
