//! Affiliate dashboard: commission totals and referred clients.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use snapdish_core::{
    AffiliateId, Client, CommissionStatus, CurrencyCode, PackageTier, PackageUsage, Price,
};

use crate::gateway::{AffiliateGateway, ClientGateway, Commission, StoreError};

/// Usage of a package tier after `used_dishes` dishes.
#[must_use]
pub fn package_usage(tier: PackageTier, used_dishes: u32) -> PackageUsage {
    tier.usage(used_dishes)
}

/// Headline numbers on the affiliate dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    /// Commissions already paid out.
    pub total_paid: Price,
    /// Commissions pending or approved but not yet paid.
    pub pending: Price,
    /// Every non-cancelled commission created this calendar month (UTC).
    pub this_month: Price,
    pub referral_count: usize,
}

impl DashboardSummary {
    /// Aggregate commissions relative to `now`.
    ///
    /// Commissions say nothing about referrals, so `referral_count` starts at
    /// zero; set it with [`Self::with_referral_count`].
    #[must_use]
    pub fn from_commissions(commissions: &[Commission], now: DateTime<Utc>) -> Self {
        let month_start = month_start(now);

        Self {
            total_paid: total(commissions, |c| c.status == CommissionStatus::Paid),
            pending: total(commissions, |c| c.status.is_outstanding()),
            this_month: total(commissions, |c| {
                c.status.is_earning() && c.created_at >= month_start
            }),
            referral_count: 0,
        }
    }

    #[must_use]
    pub const fn with_referral_count(mut self, referral_count: usize) -> Self {
        self.referral_count = referral_count;
        self
    }
}

fn total(commissions: &[Commission], keep: impl Fn(&Commission) -> bool) -> Price {
    let amount: Decimal = commissions
        .iter()
        .filter(|c| keep(c))
        .map(|c| c.amount)
        .sum();
    Price::new(amount, CurrencyCode::EUR)
}

/// First instant of `now`'s month in UTC.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map_or(now, |start| start.and_utc())
}

/// Loads dashboard data for one affiliate.
#[derive(Clone)]
pub struct AffiliateDashboard {
    affiliates: Arc<dyn AffiliateGateway>,
    clients: Arc<dyn ClientGateway>,
}

impl AffiliateDashboard {
    #[must_use]
    pub fn new(affiliates: Arc<dyn AffiliateGateway>, clients: Arc<dyn ClientGateway>) -> Self {
        Self {
            affiliates,
            clients,
        }
    }

    /// Commission totals and referral count as of `now`.
    ///
    /// # Errors
    ///
    /// Returns the store error if commissions or referrals cannot be loaded.
    #[instrument(skip(self))]
    pub async fn summary(
        &self,
        affiliate_id: AffiliateId,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, StoreError> {
        let commissions = self.affiliates.commissions_for(affiliate_id).await?;
        let referrals = self.affiliates.referred_clients(affiliate_id).await?;
        debug!(
            commissions = commissions.len(),
            referrals = referrals.len(),
            "Loaded affiliate data"
        );
        Ok(DashboardSummary::from_commissions(&commissions, now).with_referral_count(referrals.len()))
    }

    /// Client records for everyone this affiliate referred.
    ///
    /// # Errors
    ///
    /// Returns the store error if referrals or clients cannot be loaded.
    #[instrument(skip(self))]
    pub async fn referred_clients(&self, affiliate_id: AffiliateId) -> Result<Vec<Client>, StoreError> {
        let ids = self.affiliates.referred_clients(affiliate_id).await?;
        self.clients.find_by_ids(&ids).await
    }
}
