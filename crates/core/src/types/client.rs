//! Client records and the contact details that identify them.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::{AuthUserId, ClientId, PackageId};

/// Contact details collected by a submission form.
///
/// Ephemeral input. `email` is the matching key for returning clients; it may
/// be empty, in which case only the auth-id lookup can find an existing
/// client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub restaurant_name: String,
    pub contact_name: String,
    pub phone_number: String,
    pub email: String,
}

/// A restaurant/business account that submissions attach to.
///
/// Owned by the hosted backend. `user_auth_id` is `None` for clients that
/// only ever submitted anonymously. Null or missing text columns read as
/// empty strings so an incomplete row still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: ClientId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    pub user_auth_id: Option<AuthUserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub restaurant_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    pub current_package_id: Option<PackageId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remaining_servings: u32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert payload for a brand-new client row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub restaurant_name: String,
    pub contact_name: String,
    pub phone: String,
    pub email: String,
    pub user_auth_id: Option<AuthUserId>,
    pub current_package_id: Option<PackageId>,
    pub remaining_servings: u32,
}

impl NewClient {
    /// Build the insert payload from form details.
    ///
    /// The package fields start empty; see [`NewClient::with_package`].
    #[must_use]
    pub fn from_details(details: &ClientDetails, user_auth_id: Option<AuthUserId>) -> Self {
        Self {
            restaurant_name: details.restaurant_name.clone(),
            contact_name: details.contact_name.clone(),
            phone: details.phone_number.clone(),
            email: details.email.clone(),
            user_auth_id,
            current_package_id: None,
            remaining_servings: 0,
        }
    }

    /// Seed the client with a package and its servings.
    #[must_use]
    pub const fn with_package(mut self, package_id: PackageId, servings: u32) -> Self {
        self.current_package_id = Some(package_id);
        self.remaining_servings = servings;
        self
    }
}

impl Client {
    /// Whether this client is already owned by an authenticated account.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.user_auth_id.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details() -> ClientDetails {
        ClientDetails {
            restaurant_name: "De Gouden Lepel".to_owned(),
            contact_name: "Sanne".to_owned(),
            phone_number: "+31 20 123 4567".to_owned(),
            email: "sanne@goudenlepel.nl".to_owned(),
        }
    }

    #[test]
    fn test_new_client_copies_details() {
        let auth = AuthUserId::random();
        let new_client = NewClient::from_details(&details(), Some(auth));
        assert_eq!(new_client.restaurant_name, "De Gouden Lepel");
        assert_eq!(new_client.phone, "+31 20 123 4567");
        assert_eq!(new_client.user_auth_id, Some(auth));
        assert_eq!(new_client.current_package_id, None);
        assert_eq!(new_client.remaining_servings, 0);
    }

    #[test]
    fn test_with_package() {
        let package = PackageId::random();
        let new_client = NewClient::from_details(&details(), None).with_package(package, 3);
        assert_eq!(new_client.current_package_id, Some(package));
        assert_eq!(new_client.remaining_servings, 3);
    }

    #[test]
    fn test_client_row_deserializes_nulls() {
        let client_id = ClientId::random();
        let json = serde_json::json!({
            "client_id": client_id,
            "email": "sanne@goudenlepel.nl",
            "user_auth_id": null,
            "restaurant_name": "De Gouden Lepel",
            "contact_name": "Sanne",
            "phone": "",
            "current_package_id": null,
        });
        let client: Client = serde_json::from_value(json).unwrap();
        assert_eq!(client.client_id, client_id);
        assert!(!client.is_linked());
        assert_eq!(client.remaining_servings, 0);
    }

    #[test]
    fn test_client_row_tolerates_null_text_columns() {
        let client_id = ClientId::random();
        let json = serde_json::json!({
            "client_id": client_id,
            "email": "sanne@goudenlepel.nl",
            "user_auth_id": null,
            "restaurant_name": null,
            "contact_name": null,
            "phone": null,
            "current_package_id": null,
            "remaining_servings": null,
        });
        let client: Client = serde_json::from_value(json).unwrap();
        assert_eq!(client.client_id, client_id);
        assert_eq!(client.email, "sanne@goudenlepel.nl");
        assert_eq!(client.restaurant_name, "");
        assert_eq!(client.phone, "");
        assert_eq!(client.remaining_servings, 0);
    }

    #[test]
    fn test_client_row_still_requires_an_id() {
        let json = serde_json::json!({ "client_id": null, "email": "sanne@goudenlepel.nl" });
        assert!(serde_json::from_value::<Client>(json).is_err());
    }
}
