//! Watchdog CLI
//!
//! Runs the connectivity watchdog, and manages the locally persisted session
//! and its notifications.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use watchdog::api::HttpNotificationApi;
use watchdog::io::ReqwestHttpClient;
use watchdog::session::{Role, Session, SessionContext, SessionUser};
use watchdog::{load_config, Config};

#[derive(Parser)]
#[command(name = "watchdog")]
#[command(about = "Connectivity watchdog for the civic issue-reporting platform")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the backend until it is reachable, then navigate back (default)
    Watch {
        /// Health endpoint URL (overrides config file)
        #[arg(long)]
        health_url: Option<String>,

        /// Route to return to once the backend is back
        #[arg(long)]
        redirect: Option<String>,

        /// Dashboard port (overrides config file)
        #[arg(long)]
        dashboard_port: Option<u16>,

        /// Do not serve the status dashboard
        #[arg(long)]
        no_dashboard: bool,
    },
    /// Store a session for a token issued by the platform
    Login {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Resident)]
        role: RoleArg,
        #[arg(long)]
        token: String,
    },
    /// End the stored session
    Logout,
    /// Work with the signed-in user's notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationsAction,
    },
}

#[derive(Subcommand)]
enum NotificationsAction {
    /// Fetch and print notifications
    List,
    /// Mark one notification read
    Read { id: String },
    /// Mark every notification read
    ReadAll,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Resident,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Resident => Role::Resident,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, log_level={:?}",
        args.config,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    let command = args.command.unwrap_or(Command::Watch {
        health_url: None,
        redirect: None,
        dashboard_port: None,
        no_dashboard: false,
    });

    match command {
        Command::Watch {
            health_url,
            redirect,
            dashboard_port,
            no_dashboard,
        } => {
            if let Some(health_url) = health_url {
                config.health.url = health_url;
            }
            if redirect.is_some() {
                config.watchdog.redirect = redirect;
            }
            if let Some(dashboard_port) = dashboard_port {
                config.dashboard.port = dashboard_port;
            }
            if no_dashboard {
                config.dashboard.enabled = false;
            }

            tracing::info!("Starting connectivity watchdog");
            watchdog::run(config).await?;
        }
        Command::Login {
            id,
            name,
            email,
            role,
            token,
        } => {
            let session = SessionContext::open(&config.api.session_file)?;
            session
                .begin(Session {
                    user: SessionUser {
                        id,
                        name,
                        email,
                        role: role.into(),
                    },
                    token,
                })
                .await?;
        }
        Command::Logout => {
            SessionContext::open(&config.api.session_file)?.end().await?;
        }
        Command::Notifications { action } => {
            let session = SessionContext::open(&config.api.session_file)?;
            let http = Arc::new(ReqwestHttpClient::with_timeout(config.health.timeout)?);
            let api = HttpNotificationApi::new(&config.api.base_url, http);

            match action {
                NotificationsAction::List => {
                    session.refresh_notifications(&api).await?;
                    for notification in session.notifications().await {
                        let marker = if notification.read { " " } else { "*" };
                        println!("{} {}  {}", marker, notification.id, notification.message);
                    }
                    println!("{} unread", session.unread_count().await);
                }
                NotificationsAction::Read { id } => {
                    session.mark_read(&api, &id).await?;
                }
                NotificationsAction::ReadAll => {
                    session.mark_all_read(&api).await?;
                }
            }
        }
    }

    Ok(())
}
