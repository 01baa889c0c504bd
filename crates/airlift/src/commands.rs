/// `app` subcommand.
mod app;

/// `channel` subcommand.
mod channel;

/// `deploy` subcommand.
mod deploy;

/// `init` subcommand.
mod init;

/// `login` subcommand.
mod login;

/// `logout` subcommand.
mod logout;

/// `platform` subcommand.
mod platform;

pub(crate) use app::app;
pub(crate) use channel::channel;
pub(crate) use deploy::deploy;
pub(crate) use init::init;
pub(crate) use login::login;
pub(crate) use logout::logout;
pub(crate) use platform::platform;

use clap::{Args, Parser, Subcommand};

/// CLI configuration.
#[derive(Parser)]
#[command(name = "airlift", about)]
pub(crate) struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

/// Supported subcommands.
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Initialize the project configuration file.
    Init(Init),

    /// Open a session on the update server and store its token.
    Login(Login),

    /// Close the current session and discard the stored token.
    Logout,

    /// Manage the app record.
    App(App),

    /// Manage platform entries.
    Platform(Platform),

    /// Manage update channels.
    Channel(Channel),

    /// Publish a release to an update channel.
    Deploy(Deploy),
}

/// `init` subcommand configuration.
#[derive(Args)]
pub struct Init {
    /// App code; defaults to the name of the current directory.
    app_code: Option<String>,
}

/// `login` subcommand configuration.
#[derive(Args)]
pub struct Login {
    /// Account name on the update server.
    username: String,

    /// Account password; read from stdin when omitted.
    #[arg(short, long)]
    password: Option<String>,

    /// Update server API address (Ex: https://update.domain.com/api).
    #[arg(short, long)]
    server_path: Option<String>,
}

/// `app` subcommand configuration.
#[derive(Args)]
pub struct App {
    /// Selected operation.
    #[command(subcommand)]
    command: AppCommand,
}

/// Operations on the app record.
#[derive(Subcommand)]
enum AppCommand {
    /// Create the app record on the update server.
    Add(AppAdd),

    /// Show the locally mirrored app record.
    List,
}

/// `app add` configuration.
#[derive(Args)]
pub struct AppAdd {
    /// Human-readable app name; defaults to the app code.
    #[arg(short, long)]
    name: Option<String>,
}

/// `platform` subcommand configuration.
#[derive(Args)]
pub struct Platform {
    /// Selected operation.
    #[command(subcommand)]
    command: PlatformCommand,
}

/// Operations on platform entries.
#[derive(Subcommand)]
enum PlatformCommand {
    /// Add a platform entry to the project.
    Add(PlatformAdd),

    /// List configured platforms.
    List,
}

/// `platform add` configuration.
#[derive(Args)]
pub struct PlatformAdd {
    /// Platform name (ios or android).
    platform: String,

    /// Also create the conventional dev/stage/prod channels.
    #[arg(long)]
    with_default_channels: bool,
}

/// `channel` subcommand configuration.
#[derive(Args)]
pub struct Channel {
    /// Selected operation.
    #[command(subcommand)]
    command: ChannelCommand,
}

/// Operations on update channels.
#[derive(Subcommand)]
enum ChannelCommand {
    /// Create an update channel on the update server.
    Add(ChannelAdd),

    /// List channels configured for a platform.
    List(ChannelList),
}

/// `channel add` configuration.
#[derive(Args)]
pub struct ChannelAdd {
    /// Platform name (ios or android).
    platform: String,

    /// Channel key used to address the channel from the CLI.
    key: String,

    /// Human-readable channel name; defaults to the key.
    #[arg(short, long)]
    name: Option<String>,

    /// Make this channel the platform's default one.
    #[arg(short, long)]
    default: bool,
}

/// `channel list` configuration.
#[derive(Args)]
pub struct ChannelList {
    /// Platform name (ios or android).
    platform: String,
}

/// `deploy` subcommand configuration.
#[derive(Args)]
#[clap(trailing_var_arg = true)]
pub struct Deploy {
    /// Target platform to publish for (ios or android).
    platform: String,

    /// Channel key; the platform's default channel is used when omitted.
    #[arg(short, long)]
    channel: Option<String>,

    /// Extra manifest values in the form `--extra.<dotted.path>=<value>`.
    #[clap(allow_hyphen_values = true)]
    extras: Vec<String>,
}
