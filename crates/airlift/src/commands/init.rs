use std::path::Path;
use std::{env, io};

use derive_more::{Display, Error, From};

use crate::commands::Init;
use crate::config::{ProjectConfig, ProjectConfigError, PROJECT_CONFIG_FILE};

/// `init` subcommand errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum InitError {
    /// IO-related error.
    Io(io::Error),

    /// Project configuration error.
    Config(ProjectConfigError),

    /// Project config file already present.
    #[display(fmt = "project is already initialized ({} exists)", "PROJECT_CONFIG_FILE")]
    AlreadyInitialized,

    /// App code contains characters outside `[0-9a-zA-Z_-]`.
    #[display(fmt = "app code {} should be alphanumeric (dashes and underscores allowed)", _0)]
    #[from(ignore)]
    InvalidAppCode(#[error(not(source))] String),

    /// No app code was given and none could be derived from the directory.
    #[display(fmt = "unable to derive an app code from the current directory, pass one explicitly")]
    MissingAppCode,
}

/// `init` flow entrypoint.
pub(crate) fn init(Init { app_code }: Init) -> Result<(), InitError> {
    if Path::new(PROJECT_CONFIG_FILE).exists() {
        return Err(InitError::AlreadyInitialized);
    }

    let app_code = match app_code {
        Some(code) => code,
        None => default_app_code()?,
    };

    if app_code.is_empty() || !is_valid_app_code(&app_code) {
        return Err(InitError::InvalidAppCode(app_code));
    }

    let config = ProjectConfig::bootstrap(app_code);
    config.save()?;

    println!("{PROJECT_CONFIG_FILE} has been created for app {}", config.app_code);
    println!("You can run `airlift login <username> --server-path <url>` to open a session");

    Ok(())
}

/// Derives an app code from the current directory name.
fn default_app_code() -> Result<String, InitError> {
    env::current_dir()?
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or(InitError::MissingAppCode)
}

/// App codes are restricted to `[0-9a-zA-Z_-]`.
fn is_valid_app_code(code: &str) -> bool {
    code.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
