//! Package tier listing.
//!
//! # Usage
//!
//! ```bash
//! # Show every tier
//! snapdish packages
//!
//! # Remaining dishes for a client on the full menu tier
//! snapdish packages --tier full_menu --used 7
//! ```

use snapdish_core::PackageTier;
use snapdish_service::services::package_usage;

/// One line per tier: dishes, images, price and affiliate commission.
pub fn describe_tiers() -> Vec<String> {
    PackageTier::ALL
        .iter()
        .map(|tier| {
            let terms = tier.terms();
            format!(
                "{tier}: {} dishes, {} images, {} (commission {})",
                terms.dishes,
                terms.images,
                terms.price,
                terms.commission()
            )
        })
        .collect()
}

/// Log the tier table, or the usage of a single tier.
pub fn run(tier: Option<PackageTier>, used: u32) {
    match tier {
        Some(tier) => {
            let usage = package_usage(tier, used);
            tracing::info!(
                %tier,
                total = usage.total,
                used = usage.used,
                remaining = usage.remaining(),
                "Package usage"
            );
        }
        None => {
            for line in describe_tiers() {
                tracing::info!("{line}");
            }
        }
    }
}
