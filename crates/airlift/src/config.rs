use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

use derive_more::{Display, Error, From};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Project configuration file, located at the project root.
pub(crate) const PROJECT_CONFIG_FILE: &str = "Airlift.toml";

/// Authentication configuration errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum AuthenticationConfigError {
    /// Unable to load the configuration using [`figment`].
    Figment(figment::Error),

    /// IO-related error.
    Io(io::Error),

    /// Unable to serialize the configuration using [`toml`] crate.
    Toml(toml::ser::Error),

    /// User's home directory cannot be determined.
    #[display(fmt = "unable to find home directory")]
    HomeDirNotFound,
}

/// Primary authentication config.
#[derive(Serialize, Deserialize)]
pub(crate) struct AuthenticationConfig {
    /// Session token obtained via `airlift login`.
    token: String,

    /// Update server API address.
    server_path: String,
}

impl AuthenticationConfig {
    /// Create new authentication config using the default configuration file
    /// or environment variables.
    ///
    /// See [`Env`] for more details on how to use environment variables
    /// configuration.
    pub fn new() -> Result<Self, AuthenticationConfigError> {
        Ok(Figment::new()
            .merge(Toml::file(Self::config_path()?))
            .merge(Env::prefixed("AIRLIFT_AUTH_"))
            .extract()?)
    }

    /// Write the configuration file to the default file location.
    pub fn write_token(token: String, server_path: String) -> Result<(), AuthenticationConfigError> {
        let path = Self::config_path()?;
        fs::create_dir_all(path.ancestors().nth(1).expect("incorrect config path"))?;
        fs::write(
            path,
            toml::to_string(&AuthenticationConfig { token, server_path })?,
        )?;
        Ok(())
    }

    /// Remove the stored credentials file, if any.
    pub fn delete() -> Result<(), AuthenticationConfigError> {
        let path = Self::config_path()?;

        if path.exists() {
            fs::remove_file(path)?;
        }

        Ok(())
    }

    /// Get session token from the current configuration.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Get API server path from the current configuration.
    pub fn server_path(&self) -> &str {
        &self.server_path
    }

    /// Get authentication configuration storage path.
    ///
    /// Returns [`Err`] if home directory cannot be determined.
    fn config_path() -> Result<PathBuf, AuthenticationConfigError> {
        let mut home_dir = home::home_dir().ok_or(AuthenticationConfigError::HomeDirNotFound)?;
        home_dir.push(".airlift/auth.toml");
        Ok(home_dir)
    }
}

/// Project configuration errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum ProjectConfigError {
    /// Unable to load the configuration using [`figment`].
    Figment(figment::Error),

    /// IO-related error.
    Io(io::Error),

    /// Unable to serialize the configuration using [`toml`] crate.
    Toml(toml::ser::Error),

    /// Project config file is missing.
    #[display(fmt = "project is not initialized, run `airlift init` first")]
    NotInitialized,

    /// Requested platform has no entry in the project config.
    #[display(fmt = "platform {} is not configured, run `airlift platform add {}` first", _0, _0)]
    #[from(ignore)]
    UnknownPlatform(#[error(not(source))] String),

    /// Requested platform has no channels yet.
    #[display(fmt = "no channels exist for platform {}, run `airlift channel add` first", _0)]
    #[from(ignore)]
    NoChannels(#[error(not(source))] String),

    /// Requested channel key is not configured.
    #[display(
        fmt = "channel {} does not exist for platform {}; existing channels are: {}",
        key,
        platform,
        available
    )]
    UnknownChannel {
        /// Requested channel key.
        key: String,

        /// Platform the key was looked up under.
        platform: String,

        /// Comma-separated list of configured channel keys.
        available: String,
    },

    /// No channel key was given and no channel is marked as default.
    #[display(
        fmt = "no default channel is configured for platform {}; existing channels are: {}",
        platform,
        available
    )]
    NoDefaultChannel {
        /// Platform the default was looked up under.
        platform: String,

        /// Comma-separated list of configured channel keys.
        available: String,
    },
}

/// Project configuration, stored at the project root and mirrored against
/// the update server by the record-management commands.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProjectConfig {
    /// Unique machine-readable app code.
    pub app_code: String,

    /// Human-readable app name, set when the app record is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Server-assigned app record identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Release version used by the deploy version gate.
    pub version: String,

    /// Per-platform configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub platforms: BTreeMap<String, PlatformConfig>,
}

impl ProjectConfig {
    /// The configuration written by `airlift init`.
    pub fn bootstrap(app_code: String) -> Self {
        Self {
            app_code,
            app_name: None,
            app_id: None,
            version: String::from("0.1.0"),
            platforms: BTreeMap::new(),
        }
    }

    /// Create new config using the project configuration file and
    /// environment variables.
    pub fn load() -> Result<Self, ProjectConfigError> {
        if !Path::new(PROJECT_CONFIG_FILE).exists() {
            return Err(ProjectConfigError::NotInitialized);
        }

        Ok(Figment::new()
            .merge(Toml::file(PROJECT_CONFIG_FILE))
            .merge(Env::prefixed("AIRLIFT_"))
            .extract()?)
    }

    /// Write the configuration back to the project configuration file.
    pub fn save(&self) -> Result<(), ProjectConfigError> {
        fs::write(PROJECT_CONFIG_FILE, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Get the configuration of a platform entry.
    pub fn platform(&self, name: &str) -> Result<&PlatformConfig, ProjectConfigError> {
        self.platforms
            .get(name)
            .ok_or_else(|| ProjectConfigError::UnknownPlatform(name.to_owned()))
    }

    /// Resolve a channel by key, or the platform's default channel when no
    /// key is given.
    pub fn resolve_channel<'a>(
        &'a self,
        platform: &str,
        key: Option<&str>,
    ) -> Result<(&'a str, &'a ChannelConfig), ProjectConfigError> {
        let channels = &self.platform(platform)?.channels;

        if channels.is_empty() {
            return Err(ProjectConfigError::NoChannels(platform.to_owned()));
        }

        let available = || channels.keys().cloned().collect::<Vec<_>>().join(", ");

        match key {
            Some(key) => channels
                .get_key_value(key)
                .map(|(key, channel)| (key.as_str(), channel))
                .ok_or_else(|| ProjectConfigError::UnknownChannel {
                    key: key.to_owned(),
                    platform: platform.to_owned(),
                    available: available(),
                }),
            None => channels
                .iter()
                .find(|(_, channel)| channel.is_default)
                .map(|(key, channel)| (key.as_str(), channel))
                .ok_or_else(|| ProjectConfigError::NoDefaultChannel {
                    platform: platform.to_owned(),
                    available: available(),
                }),
        }
    }
}

/// Per-platform project configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct PlatformConfig {
    /// Web-asset output directory override for this platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,

    /// Update channels keyed by channel key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub channels: BTreeMap<String, ChannelConfig>,
}

impl PlatformConfig {
    /// The directory whose contents are fingerprinted and published.
    pub fn assets_root(&self, platform: &str) -> PathBuf {
        self.assets_dir
            .clone()
            .unwrap_or_else(|| Path::new("platforms").join(platform).join("www"))
    }
}

/// A locally mirrored update channel record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct ChannelConfig {
    /// Server-assigned channel record identifier.
    pub id: String,

    /// Human-readable channel name.
    pub name: String,

    /// Whether `airlift deploy` targets this channel when no key is given.
    #[serde(default, rename = "default")]
    pub is_default: bool,
}

/// Validate and normalize a platform name.
pub(crate) fn normalize_platform(name: &str) -> Option<String> {
    let name = name.trim().to_ascii_lowercase();

    matches!(name.as_str(), "ios" | "android").then_some(name)
}
