//! Client resolution command.
//!
//! # Usage
//!
//! ```bash
//! # Anonymous: reuse a client by email or create a new one
//! snapdish resolve-client --restaurant "Bistro Zuid" --contact Daan -e chef@bistro.nl
//!
//! # As a signed-in user
//! snapdish resolve-client --restaurant "Bistro Zuid" --contact Daan -e chef@bistro.nl \
//!     --auth-user-id 7c9e6679-7425-40de-944b-e07fc1f90ae7
//! ```

use std::io::Write;

use snapdish_core::{AuthUserId, ClientId};

use super::{ClientArgs, CommandError};
use snapdish_service::AppState;

/// Resolve (or create) the client for the given details.
///
/// The client id goes to stdout so scripts can capture it.
pub async fn resolve(
    state: &AppState,
    client: ClientArgs,
    auth_user_id: Option<AuthUserId>,
) -> Result<ClientId, CommandError> {
    let details = client.into_details()?;
    let client_id = state.resolver().resolve(&details, auth_user_id).await?;
    tracing::info!(%client_id, "Resolved client");
    write_client_id(&mut std::io::stdout().lock(), client_id)?;
    Ok(client_id)
}

fn write_client_id(out: &mut impl Write, client_id: ClientId) -> Result<(), CommandError> {
    writeln!(out, "{client_id}").map_err(CommandError::Output)
}
