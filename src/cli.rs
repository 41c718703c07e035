use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use sf_app::{DiagnosticLog, GuardHandle, LogRecord};
use sf_bootstrap::{wire_services, AppServices};
use sf_core::config::AppConfig;
use sf_core::ids::{PostId, UserId};
use sf_core::media::content_type_for_path;
use sf_core::post::LikeState;
use sf_core::GuardSnapshot;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Upper bound for the guard to settle after startup or a command.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "snapfeed", version)]
#[command(about = "Headless Snapfeed client: session, profile, account and post commands")]
pub struct Cli {
    /// Configuration file (default: <config dir>/snapfeed/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Include the in-session diagnostics log in the output
    #[arg(long, global = true)]
    pub dump_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snapfeed")
        .join(CONFIG_FILE_NAME)
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the settled session, profile and route
    Status,

    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account
    SignUp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    SignOut,

    /// Complete onboarding by creating the profile
    Onboard {
        #[arg(long)]
        name: String,
    },

    /// Replace the avatar with a JPEG, PNG or GIF file
    UploadAvatar {
        file: PathBuf,
        /// Override the content type guessed from the file extension
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Edit name, bio and website of the profile
    EditProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },

    ChangePassword {
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        confirm: String,
    },

    /// Request an email change; it applies once the new address is verified
    ChangeEmail {
        #[arg(long)]
        email: String,
    },

    ChangePhone {
        #[arg(long)]
        phone: String,
    },

    /// Publish an image post; hashtags are taken from the caption
    Post {
        file: PathBuf,
        #[arg(long, default_value = "")]
        caption: String,
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Like or unlike a post, starting from the state the viewer currently sees
    ToggleLike {
        post_id: String,
        /// The post is currently liked by the viewer
        #[arg(long)]
        liked: bool,
        /// Like count currently shown
        #[arg(long, default_value_t = 0)]
        likes: u32,
    },

    /// Follow a user, or unfollow when already following
    ToggleFollow { user_id: String },
}

#[derive(Debug, Serialize)]
pub struct CommandOutput {
    pub snapshot: GuardSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogRecord>>,
}

/// Wire the services, run one command and report the settled guard state.
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<CommandOutput> {
    let services = wire_services(&config).context("Failed to start services")?;

    let result = async {
        services.mount_navigation()?;
        settle(&services.guard).await?;
        let detail = execute(&services, &cli.command).await?;
        let snapshot = settle(&services.guard).await?;
        anyhow::Ok((detail, snapshot))
    }
    .await;
    services.shutdown().await;

    let (detail, snapshot) = result?;
    Ok(CommandOutput {
        snapshot,
        detail,
        logs: cli.dump_logs.then(|| DiagnosticLog::global().records()),
    })
}

async fn execute(services: &AppServices, command: &Command) -> anyhow::Result<Option<String>> {
    match command {
        Command::Status => Ok(None),

        Command::SignIn { email, password } => {
            let session = services.sign_in.execute(email, password).await?;
            wait_until_authenticated(&services.guard).await?;
            info!(user_id = %session.user_id(), "signed in");
            Ok(Some(format!("signed in as {}", session.user_id())))
        }

        Command::SignUp {
            name,
            email,
            password,
        } => match services.sign_up.execute(name, email, password).await? {
            Some(session) => {
                wait_until_authenticated(&services.guard).await?;
                Ok(Some(format!("account created for {}", session.user_id())))
            }
            None => Ok(Some(format!("confirmation email sent to {}", email.trim()))),
        },

        Command::SignOut => {
            services.guard.sign_out().await?;
            Ok(Some("signed out".to_string()))
        }

        Command::Onboard { name } => {
            let profile = services.complete_onboarding.execute(name).await?;
            services.guard.flush().await?;
            Ok(Some(format!("welcome, {}", profile.handle())))
        }

        Command::UploadAvatar { file, content_type } => {
            let (content_type, bytes) = read_image(file, content_type.as_deref()).await?;
            let url = services.upload_avatar.execute(&content_type, bytes).await?;
            services.guard.flush().await?;
            Ok(Some(url))
        }

        Command::EditProfile { name, bio, website } => {
            let profile = services
                .edit_profile
                .execute(name, bio.as_deref(), website.as_deref())
                .await?;
            services.guard.flush().await?;
            Ok(Some(format!("profile saved for {}", profile.handle())))
        }

        Command::ChangePassword {
            new_password,
            confirm,
        } => {
            services
                .update_account
                .change_password(new_password, confirm)
                .await?;
            Ok(Some("password updated".to_string()))
        }

        Command::ChangeEmail { email } => {
            services.update_account.change_email(email).await?;
            Ok(Some(format!(
                "verification sent to {}; the change applies once confirmed",
                email.trim()
            )))
        }

        Command::ChangePhone { phone } => {
            let user = services.update_account.change_phone(phone).await?;
            Ok(Some(format!(
                "phone set to {}",
                user.phone.as_deref().unwrap_or(phone.trim())
            )))
        }

        Command::Post {
            file,
            caption,
            content_type,
        } => {
            let (content_type, bytes) = read_image(file, content_type.as_deref()).await?;
            let post = services
                .create_post
                .execute(&content_type, bytes, caption)
                .await?;
            Ok(Some(format!("posted {}", post.id)))
        }

        Command::ToggleLike {
            post_id,
            liked,
            likes,
        } => {
            let (state, _seen) = watch::channel(LikeState::new(*liked, *likes));
            let confirmed = services
                .toggle_like
                .execute(&PostId::new(post_id.as_str()), &state)
                .await?;
            let verb = if confirmed.liked { "liked" } else { "unliked" };
            Ok(Some(format!("{verb} ({} likes)", confirmed.likes_count)))
        }

        Command::ToggleFollow { user_id } => {
            let following = services
                .toggle_follow
                .execute(&UserId::new(user_id.as_str()))
                .await?;
            let verb = if following { "following" } else { "unfollowed" };
            Ok(Some(format!("{verb} {user_id}")))
        }
    }
}

/// Content type (explicit, or guessed from the extension) and bytes of an image file.
async fn read_image(file: &Path, content_type: Option<&str>) -> anyhow::Result<(String, Vec<u8>)> {
    let content_type = match content_type {
        Some(explicit) => explicit.to_string(),
        None => content_type_for_path(&file.to_string_lossy())
            .map(str::to_string)
            .with_context(|| format!("Cannot tell the image type of {}", file.display()))?,
    };
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    Ok((content_type, bytes))
}

async fn settle(guard: &GuardHandle) -> anyhow::Result<GuardSnapshot> {
    tokio::time::timeout(SETTLE_TIMEOUT, guard.settled())
        .await
        .context("Timed out waiting for the session guard to settle")?
        .map_err(Into::into)
}

// The guard hears about a new session through the auth change stream, which
// can lag behind the call that created it.
async fn wait_until_authenticated(guard: &GuardHandle) -> anyhow::Result<()> {
    tokio::time::timeout(SETTLE_TIMEOUT, guard.wait_for(|s| s.is_authenticated()))
        .await
        .context("Timed out waiting for the new session")??;
    Ok(())
}
