//! Service packages and the affiliate pricing table.
//!
//! Two related concepts live here:
//!
//! - [`ServicePackage`] is a row in the hosted `service_packages` table. The
//!   free tasting package is looked up by name when a new client is created
//!   and seeds that client's `remaining_servings`.
//! - [`PackageTier`] is the fixed catalogue affiliates sell from. Each tier
//!   maps to static [`PackageTerms`].

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::PackageId;
use super::price::{CurrencyCode, Price};

/// A package row from the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePackage {
    pub package_id: PackageId,
    pub package_name: String,
    /// Servings (dish credits) granted when the package is assigned.
    pub total_servings: u32,
    pub is_active: bool,
}

/// The tiers affiliates can sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Tasting,
    FullMenu,
    Deluxe,
}

/// What a tier includes and what an affiliate earns selling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageTerms {
    /// Dishes photographed.
    pub dishes: u32,
    /// Final images delivered.
    pub images: u32,
    pub price: Price,
    /// Share of `price` paid to the referring affiliate (0.20 = 20%).
    pub commission_rate: Decimal,
}

impl PackageTerms {
    /// Commission an affiliate earns on one sale of this tier.
    #[must_use]
    pub fn commission(&self) -> Price {
        self.price.commission(self.commission_rate)
    }
}

impl PackageTier {
    /// All tiers, cheapest first.
    pub const ALL: [Self; 3] = [Self::Tasting, Self::FullMenu, Self::Deluxe];

    /// The static terms for this tier.
    #[must_use]
    pub fn terms(&self) -> PackageTerms {
        let (dishes, images, euros, rate_percent) = match self {
            Self::Tasting => (5, 10, 249, 20),
            Self::FullMenu => (25, 50, 999, 20),
            Self::Deluxe => (50, 100, 1_799, 25),
        };
        PackageTerms {
            dishes,
            images,
            price: Price::new(Decimal::from(euros), CurrencyCode::EUR),
            commission_rate: Decimal::new(rate_percent, 2),
        }
    }

    /// The identifier used in stored rows and on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tasting => "tasting",
            Self::FullMenu => "full_menu",
            Self::Deluxe => "deluxe",
        }
    }

    /// Usage report for a client on this tier that has consumed
    /// `used_dishes` dishes.
    #[must_use]
    pub fn usage(&self, used_dishes: u32) -> PackageUsage {
        PackageUsage::new(self.terms().dishes, used_dishes)
    }
}

impl fmt::Display for PackageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown package tier: {0}")]
pub struct UnknownPackageTier(pub String);

impl std::str::FromStr for PackageTier {
    type Err = UnknownPackageTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasting" => Ok(Self::Tasting),
            "full_menu" => Ok(Self::FullMenu),
            "deluxe" => Ok(Self::Deluxe),
            _ => Err(UnknownPackageTier(s.to_owned())),
        }
    }
}

/// Consumption of a package: how much was bought and how much is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUsage {
    pub total: u32,
    pub used: u32,
}

impl PackageUsage {
    #[must_use]
    pub const fn new(total: u32, used: u32) -> Self {
        Self { total, used }
    }

    /// Remaining credits: `total - used`, never below zero.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.used)
    }
}
