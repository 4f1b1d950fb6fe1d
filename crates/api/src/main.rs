//! StreamSnap - Google Drive and YouTube account manager
//!
//! Command-line entry point. Every subcommand prints the same JSON envelope
//! the UI commands return.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use streamsnap_domain::{DriveUpload, FolderPageRequest, YouTubeUpload};
use streamsnap_lib::{commands, AppContext, CommandResponse, VideoSource};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "streamsnap", version, about = "Manage linked Google Drive and YouTube accounts")]
struct Cli {
    /// Log output format (`text` or `json`)
    #[arg(long, env = "STREAMSNAP_LOG_FORMAT", default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Google Drive accounts, folders and uploads
    #[command(subcommand)]
    Drive(DriveCommand),
    /// YouTube accounts, playlists and uploads
    #[command(subcommand)]
    Youtube(YouTubeCommand),
}

#[derive(Debug, Subcommand)]
enum DriveCommand {
    /// List linked accounts
    Accounts {
        /// Only active accounts
        #[arg(long)]
        active: bool,
    },
    /// Sign in with the browser and link a new account
    Link {
        #[arg(long)]
        name: Option<String>,
    },
    /// Unlink an account and delete its tokens
    Remove { account_id: String },
    /// List folders
    Folders(FolderArgs),
    /// Upload a video file
    Upload {
        account_id: String,
        path: PathBuf,
        /// Name in Drive; defaults to the file name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        folder: Option<String>,
        /// restricted, anyoneWithLink, anyone or domain
        #[arg(long, default_value = "restricted")]
        privacy: String,
    },
    /// Refresh tokens that are about to expire
    Refresh,
}

#[derive(Debug, Args)]
struct FolderArgs {
    account_id: String,
    /// Fetch one page instead of the picker listing
    #[arg(long)]
    paged: bool,
    /// Follow every page until exhausted (Ctrl-C stops early)
    #[arg(long, conflicts_with = "paged")]
    all: bool,
    #[arg(long, default_value_t = 40)]
    page_size: u32,
    #[arg(long)]
    page_token: Option<String>,
    /// Name contains
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    shared: bool,
}

#[derive(Debug, Subcommand)]
enum YouTubeCommand {
    /// List linked accounts
    Accounts {
        #[arg(long)]
        active: bool,
    },
    /// Sign in with the browser and link the channel
    Link,
    Remove { account_id: String },
    /// List the channel's playlists
    Playlists { account_id: String },
    /// Show the channel behind an account
    Channel { account_id: String },
    /// Upload a video file
    Upload {
        account_id: String,
        path: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// private, unlisted or public
        #[arg(long)]
        privacy: Option<String>,
        #[arg(long)]
        playlist: Option<String>,
    },
    Refresh,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_format);

    match run(cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("fatal: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(format: &str) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        "json" => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init(),
    };
    drop(result);
}

async fn run(command: Command) -> anyhow::Result<bool> {
    let ctx = AppContext::new().await?;
    // Awaited so a rotated refresh token is persisted before the process exits.
    ctx.run_maintenance().await;

    match command {
        Command::Drive(command) => run_drive(&ctx, command).await,
        Command::Youtube(command) => run_youtube(&ctx, command).await,
    }
}

async fn run_drive(ctx: &AppContext, command: DriveCommand) -> anyhow::Result<bool> {
    match command {
        DriveCommand::Accounts { active: false } => print(commands::drive_list_accounts(ctx).await),
        DriveCommand::Accounts { active: true } => {
            print(commands::drive_get_active_accounts(ctx).await)
        }
        DriveCommand::Link { name } => print(commands::drive_create_account(ctx, name).await),
        DriveCommand::Remove { account_id } => {
            print(commands::drive_remove_account(ctx, &account_id).await)
        }
        DriveCommand::Folders(args) => {
            let request = FolderPageRequest {
                page_size: args.page_size,
                page_token: args.page_token,
                name_query: args.query,
                shared_with_me: args.shared,
            };
            if args.paged {
                print(commands::drive_list_folders_paged(ctx, &args.account_id, request).await)
            } else if args.all {
                let cancel = CancellationToken::new();
                let on_interrupt = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("interrupted; returning folders listed so far");
                        on_interrupt.cancel();
                    }
                });
                let listed =
                    commands::drive_list_all_folders(ctx, &args.account_id, request, cancel).await;
                print(listed)
            } else {
                print(commands::drive_list_folders(ctx, &args.account_id).await)
            }
        }
        DriveCommand::Upload { account_id, path, name, folder, privacy } => {
            let upload = DriveUpload::new(name.unwrap_or_default(), folder, parse_enum(&privacy)?);
            let source = VideoSource::Path(path);
            print(commands::drive_upload_video(ctx, &account_id, upload, source).await)
        }
        DriveCommand::Refresh => print(commands::drive_refresh_all_tokens(ctx).await),
    }
}

async fn run_youtube(ctx: &AppContext, command: YouTubeCommand) -> anyhow::Result<bool> {
    match command {
        YouTubeCommand::Accounts { active: false } => {
            print(commands::youtube_list_accounts(ctx).await)
        }
        YouTubeCommand::Accounts { active: true } => {
            print(commands::youtube_get_active_accounts(ctx).await)
        }
        YouTubeCommand::Link => print(commands::youtube_sign_in(ctx).await),
        YouTubeCommand::Remove { account_id } => {
            print(commands::youtube_remove_account(ctx, &account_id).await)
        }
        YouTubeCommand::Playlists { account_id } => {
            print(commands::youtube_get_playlists(ctx, &account_id).await)
        }
        YouTubeCommand::Channel { account_id } => {
            print(commands::youtube_get_channel_info(ctx, &account_id).await)
        }
        YouTubeCommand::Upload { account_id, path, title, description, privacy, playlist } => {
            let privacy = privacy.as_deref().map(parse_enum).transpose()?;
            let upload = YouTubeUpload { title, description, privacy, playlist_id: playlist };
            let source = VideoSource::Path(path);
            print(commands::youtube_upload_video(ctx, &account_id, upload, source).await)
        }
        YouTubeCommand::Refresh => print(commands::youtube_refresh_all_tokens(ctx).await),
    }
}

/// Parse a privacy flag through its serde name.
fn parse_enum<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| anyhow::anyhow!("unknown privacy value: {raw}"))
}

fn print<T: Serialize>(response: CommandResponse<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.success)
}
