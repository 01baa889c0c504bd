use derive_more::{Display, Error, From};

use crate::client::{ApiClient, ApiError};
use crate::commands::{Channel, ChannelAdd, ChannelCommand, ChannelList};
use crate::config::{
    self, AuthenticationConfig, AuthenticationConfigError, ChannelConfig, ProjectConfig,
    ProjectConfigError,
};

/// `channel` subcommand errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum ChannelError {
    /// Authentication configuration error.
    Authentication(AuthenticationConfigError),

    /// Project configuration error.
    Config(ProjectConfigError),

    /// Update server API error.
    #[display(fmt = "fail to add channel: {}", _0)]
    Api(ApiError),

    /// Platform name is not one of the supported ones.
    #[display(fmt = "platform name {} is not supported, use ios or android", _0)]
    #[from(ignore)]
    InvalidPlatform(#[error(not(source))] String),

    /// The app record does not exist yet.
    #[display(fmt = "app is not created on server, run `airlift app add` first")]
    AppNotCreated,

    /// The channel key is already taken on this platform.
    #[display(fmt = "channel {} already exists on platform {}", key, platform)]
    ChannelExists {
        /// Requested channel key.
        key: String,

        /// Platform the key is taken on.
        platform: String,
    },
}

/// `channel` flow entrypoint.
pub(crate) async fn channel(Channel { command }: Channel) -> Result<(), ChannelError> {
    match command {
        ChannelCommand::Add(args) => add(args).await,
        ChannelCommand::List(args) => list(args),
    }
}

/// Creates an update channel on the server and mirrors it locally.
async fn add(
    ChannelAdd {
        platform,
        key,
        name,
        default,
    }: ChannelAdd,
) -> Result<(), ChannelError> {
    let Some(platform) = config::normalize_platform(&platform) else {
        return Err(ChannelError::InvalidPlatform(platform));
    };

    let mut project = ProjectConfig::load()?;
    let Some(app_id) = project.app_id.clone() else {
        return Err(ChannelError::AppNotCreated);
    };

    // Validates the platform entry exists before any server call.
    if project.platform(&platform)?.channels.contains_key(&key) {
        return Err(ChannelError::ChannelExists { key, platform });
    }

    let auth = AuthenticationConfig::new()?;
    let client = ApiClient::from_auth(&auth);

    let name = name.unwrap_or_else(|| key.clone());
    let created = client.create_channel(&app_id, &platform, &key, &name).await?;

    let channels = &mut project
        .platforms
        .get_mut(&platform)
        .expect("platform entry was just validated")
        .channels;

    if default {
        for channel in channels.values_mut() {
            channel.is_default = false;
        }
    }

    channels.insert(
        key.clone(),
        ChannelConfig {
            id: created.id.clone(),
            name: name.clone(),
            is_default: default,
        },
    );

    project.save()?;

    println!("Channel {name} has been created. Key: {key} id: {}", created.id);

    Ok(())
}

/// Prints the channels configured for a platform.
fn list(ChannelList { platform }: ChannelList) -> Result<(), ChannelError> {
    let Some(platform) = config::normalize_platform(&platform) else {
        return Err(ChannelError::InvalidPlatform(platform));
    };

    let project = ProjectConfig::load()?;
    let channels = &project.platform(&platform)?.channels;

    if channels.is_empty() {
        println!("No channels exist for {platform}, run `airlift channel add {platform} <key>`");
        return Ok(());
    }

    for (key, channel) in channels {
        println!(
            "{key}: {} id: {}{}",
            channel.name,
            channel.id,
            if channel.is_default { " (default)" } else { "" }
        );
    }

    Ok(())
}
