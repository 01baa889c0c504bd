use std::time::Duration;

use derive_more::{Display, Error, From};
use indicatif::ProgressBar;

use crate::client::ApiClient;
use crate::commands::Deploy;
use crate::config::{self, AuthenticationConfig, AuthenticationConfigError, ProjectConfig, ProjectConfigError};
use crate::extras;
use crate::pipeline::{self, PublishError, PublishOutcome};

/// `deploy` subcommand errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum DeployError {
    /// Authentication configuration error.
    Authentication(AuthenticationConfigError),

    /// Project configuration error.
    Config(ProjectConfigError),

    /// Release publishing error.
    Publish(PublishError),

    /// Platform name is not one of the supported ones.
    #[display(fmt = "platform name {} is not supported, use ios or android", _0)]
    #[from(ignore)]
    InvalidPlatform(#[error(not(source))] String),
}

/// `deploy` flow entrypoint.
pub(crate) async fn deploy(
    Deploy {
        platform,
        channel,
        extras,
    }: Deploy,
) -> Result<(), DeployError> {
    let Some(platform) = config::normalize_platform(&platform) else {
        return Err(DeployError::InvalidPlatform(platform));
    };

    let project = ProjectConfig::load()?;
    let auth = AuthenticationConfig::new()?;

    let (channel_key, channel_config) = project.resolve_channel(&platform, channel.as_deref())?;
    if channel.is_none() {
        println!("Channel key was not provided, using default channel {channel_key}");
    }

    let assets_dir = project.platform(&platform)?.assets_root(&platform);
    let extras = extras::parse_extra_args(&extras);

    let client = ApiClient::from_auth(&auth);

    let progress = ProgressBar::new_spinner();
    progress.enable_steady_tick(Duration::from_millis(150));

    let outcome = match pipeline::publish_update(
        &client,
        &channel_config.id,
        &project.version,
        &assets_dir,
        extras,
        &progress,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            progress.finish_and_clear();
            return Err(err.into());
        }
    };

    match outcome {
        PublishOutcome::VersionRejected { local, server } => {
            progress.finish_and_clear();
            println!("Version of a new release should be greater than the one on the server");
            println!("Local version: {local}");
            println!("Server version: {server}");
        }
        PublishOutcome::Published {
            total_files,
            pushed_files,
            archive_size: Some(size),
        } => {
            progress.finish_with_message(format!(
                "Release {} published to {channel_key}: {pushed_files} of {total_files} file(s) uploaded ({size} bytes)",
                project.version
            ));
        }
        PublishOutcome::Published { total_files, .. } => {
            progress.finish_with_message(format!(
                "Release {} published to {channel_key}: all {total_files} file(s) already on server, manifest only",
                project.version
            ));
        }
    }

    Ok(())
}
