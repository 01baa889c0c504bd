use derive_more::{Display, Error, From};

use crate::client::{ApiClient, ApiError};
use crate::commands::{Platform, PlatformAdd, PlatformCommand};
use crate::config::{
    self, AuthenticationConfig, AuthenticationConfigError, ChannelConfig, PlatformConfig,
    ProjectConfig, ProjectConfigError,
};

/// Channels created by `platform add --with-default-channels`.
const DEFAULT_CHANNELS: [(&str, &str, bool); 3] = [
    ("dev", "Development", true),
    ("stage", "Staging", false),
    ("prod", "Production", false),
];

/// `platform` subcommand errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum PlatformError {
    /// Authentication configuration error.
    Authentication(AuthenticationConfigError),

    /// Project configuration error.
    Config(ProjectConfigError),

    /// Update server API error.
    Api(ApiError),

    /// Platform name is not one of the supported ones.
    #[display(fmt = "platform name {} is not supported, use ios or android", _0)]
    #[from(ignore)]
    InvalidPlatform(#[error(not(source))] String),

    /// The app record does not exist yet.
    #[display(fmt = "app is not created on server, run `airlift app add` first")]
    AppNotCreated,
}

/// `platform` flow entrypoint.
pub(crate) async fn platform(Platform { command }: Platform) -> Result<(), PlatformError> {
    match command {
        PlatformCommand::Add(args) => add(args).await,
        PlatformCommand::List => list(),
    }
}

/// Adds a platform entry, optionally seeding the conventional channels.
async fn add(
    PlatformAdd {
        platform,
        with_default_channels,
    }: PlatformAdd,
) -> Result<(), PlatformError> {
    let Some(platform) = config::normalize_platform(&platform) else {
        return Err(PlatformError::InvalidPlatform(platform));
    };

    let mut project = ProjectConfig::load()?;
    let Some(app_id) = project.app_id.clone() else {
        return Err(PlatformError::AppNotCreated);
    };

    if project.platforms.contains_key(&platform) {
        println!("Platform {platform} is already added");
        return Ok(());
    }

    let mut platform_config = PlatformConfig::default();

    if with_default_channels {
        let auth = AuthenticationConfig::new()?;
        let client = ApiClient::from_auth(&auth);

        for (key, name, is_default) in DEFAULT_CHANNELS {
            let created = client.create_channel(&app_id, &platform, key, name).await?;

            println!("Channel {name} has been created. Key: {key} id: {}", created.id);

            platform_config.channels.insert(
                String::from(key),
                ChannelConfig {
                    id: created.id,
                    name: String::from(name),
                    is_default,
                },
            );
        }
    }

    project.platforms.insert(platform.clone(), platform_config);
    project.save()?;

    println!("Platform {platform} has been added");
    println!("You can run `airlift channel add {platform} <key>` to add a channel");

    Ok(())
}

/// Prints the configured platforms.
fn list() -> Result<(), PlatformError> {
    let project = ProjectConfig::load()?;

    if project.platforms.is_empty() {
        println!("No platforms are configured yet, run `airlift platform add <ios|android>`");
        return Ok(());
    }

    for (name, platform) in &project.platforms {
        println!(
            "{name}: {} channel(s), assets at {}",
            platform.channels.len(),
            platform.assets_root(name).display()
        );
    }

    Ok(())
}
