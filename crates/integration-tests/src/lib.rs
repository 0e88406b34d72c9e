//! Integration tests for SnapDish.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p snapdish-integration-tests
//! ```
//!
//! No external services are needed: service-level tests run against the
//! in-memory gateways from `snapdish_service::test_support`, and REST adapter
//! tests run against [`fake_backend::FakeBackend`], a local axum server that
//! speaks just enough of the hosted backend's dialect.
//!
//! # Test Categories
//!
//! - `client_identity` - Client resolution scenarios
//! - `submission_pipeline` - Uploads, compensation and webhook behaviour
//! - `affiliate_dashboard` - Commission aggregation over stored rows
//! - `backend_rest` - Wire format of the REST adapter

pub mod fake_backend;

use snapdish_core::{AuthUserId, Client, ClientDetails, ClientId, PackageId, ServicePackage};

/// Email used by the fixtures.
pub const EMAIL: &str = "a@b.com";

/// Contact details as typed into the form.
#[must_use]
pub fn details(email: &str) -> ClientDetails {
    ClientDetails {
        restaurant_name: "X".to_owned(),
        contact_name: "Sanne de Vries".to_owned(),
        phone_number: "+31 20 123 4567".to_owned(),
        email: email.to_owned(),
    }
}

/// An existing client row with [`EMAIL`].
#[must_use]
pub fn existing_client(user_auth_id: Option<AuthUserId>) -> Client {
    Client {
        client_id: ClientId::random(),
        email: EMAIL.to_owned(),
        user_auth_id,
        restaurant_name: "X".to_owned(),
        contact_name: "Sanne de Vries".to_owned(),
        phone: "+31 20 123 4567".to_owned(),
        current_package_id: None,
        remaining_servings: 0,
    }
}

/// The free tasting package as stored in `service_packages`.
#[must_use]
pub fn tasting_package(is_active: bool) -> ServicePackage {
    ServicePackage {
        package_id: PackageId::random(),
        package_name: snapdish_service::services::DEFAULT_FREE_PACKAGE_NAME.to_owned(),
        total_servings: 5,
        is_active,
    }
}
