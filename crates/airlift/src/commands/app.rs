use derive_more::{Display, Error, From};

use crate::client::{ApiClient, ApiError};
use crate::commands::{App, AppAdd, AppCommand};
use crate::config::{AuthenticationConfig, AuthenticationConfigError, ProjectConfig, ProjectConfigError};

/// `app` subcommand errors.
#[derive(Debug, Display, From, Error)]
pub(crate) enum AppError {
    /// Authentication configuration error.
    Authentication(AuthenticationConfigError),

    /// Project configuration error.
    Config(ProjectConfigError),

    /// Update server API error.
    #[display(fmt = "app creation on server failed: {}", _0)]
    Api(ApiError),
}

/// `app` flow entrypoint.
pub(crate) async fn app(App { command }: App) -> Result<(), AppError> {
    match command {
        AppCommand::Add(args) => add(args).await,
        AppCommand::List => list(),
    }
}

/// Creates the app record on the server and mirrors it locally.
async fn add(AppAdd { name }: AppAdd) -> Result<(), AppError> {
    let mut project = ProjectConfig::load()?;

    if let Some(id) = &project.app_id {
        println!("App is already created with id {id}");
        return Ok(());
    }

    let auth = AuthenticationConfig::new()?;
    let client = ApiClient::from_auth(&auth);

    let name = name.unwrap_or_else(|| project.app_code.clone());
    let created = client.create_app(&project.app_code, &name).await?;

    project.app_name = Some(name.clone());
    project.app_id = Some(created.id.clone());
    project.save()?;

    println!("App {name} has been created with id {}", created.id);
    println!("You can run `airlift platform add <ios|android>` to add a platform");

    Ok(())
}

/// Prints the locally mirrored app record.
fn list() -> Result<(), AppError> {
    let project = ProjectConfig::load()?;

    match (&project.app_id, &project.app_name) {
        (Some(id), name) => println!(
            "{} ({}) id: {id}",
            project.app_code,
            name.as_deref().unwrap_or(&project.app_code)
        ),
        (None, _) => println!(
            "App {} is not created on the server yet, run `airlift app add`",
            project.app_code
        ),
    }

    Ok(())
}
