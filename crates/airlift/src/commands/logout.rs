use derive_more::{Display, Error, From};

use crate::client::{ApiClient, ApiError};
use crate::config::{AuthenticationConfig, AuthenticationConfigError};

/// `logout` subcommand errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum LogoutError {
    /// Authentication configuration error.
    Authentication(AuthenticationConfigError),

    /// Update server API error.
    Api(ApiError),

    /// No stored session to close.
    #[display(fmt = "no session is open, nothing to log out from")]
    NotLoggedIn,
}

/// `logout` flow entrypoint.
pub(crate) async fn logout() -> Result<(), LogoutError> {
    let auth = AuthenticationConfig::new().map_err(|_| LogoutError::NotLoggedIn)?;

    ApiClient::from_auth(&auth).logout().await?;

    AuthenticationConfig::delete()?;

    println!("Logged out");

    Ok(())
}
