use std::io::{self, Write};

use derive_more::{Display, Error, From};

use crate::client::{self, ApiError};
use crate::commands::Login;
use crate::config::{AuthenticationConfig, AuthenticationConfigError};

/// `login` subcommand errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum LoginError {
    /// Authentication configuration error.
    Authentication(AuthenticationConfigError),

    /// Update server API error.
    Api(ApiError),

    /// IO-related error.
    Io(io::Error),

    /// No server address was given and none is stored yet.
    #[display(fmt = "no update server address is known, pass --server-path")]
    MissingServerPath,

    /// Server address does not look like an HTTP(S) URL.
    #[display(fmt = "server address {} should start with http:// or https://", _0)]
    #[from(ignore)]
    InvalidServerPath(#[error(not(source))] String),

    /// Password was empty.
    #[display(fmt = "password is empty")]
    EmptyPassword,
}

/// `login` flow entrypoint.
pub(crate) async fn login(
    Login {
        username,
        password,
        server_path,
    }: Login,
) -> Result<(), LoginError> {
    let server_path = match server_path {
        Some(path) => path,
        // Fall back to the address from a previous login.
        None => AuthenticationConfig::new()
            .map(|config| config.server_path().to_owned())
            .map_err(|_| LoginError::MissingServerPath)?,
    };

    if !server_path.starts_with("http://") && !server_path.starts_with("https://") {
        return Err(LoginError::InvalidServerPath(server_path));
    }

    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    if password.is_empty() {
        return Err(LoginError::EmptyPassword);
    }

    let token = client::login(&server_path, &username, &password).await?;

    AuthenticationConfig::write_token(token, server_path.clone())?;

    println!("Logged in to {server_path} as {username}");

    Ok(())
}

/// Reads the password from stdin.
fn prompt_password() -> io::Result<String> {
    print!("Password: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim_end().to_owned())
}
