//! Socksd - SOCKS5 Proxy Server
//!
//! This is the main entry point for the Socksd application.

use anyhow::Result;
use clap::{Parser, Subcommand};
use socksd::config::{load_config, Config};
use socksd::credentials::{CredentialStore, UserStore};
use socksd::server::Server;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Socksd - SOCKS5 proxy server with optional username/password authentication
#[derive(Parser, Debug)]
#[command(name = "socksd")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_log: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the proxy
    Serve {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to listen on, overriding the configuration file
        #[arg(long)]
        listen: Option<String>,

        /// Enable username/password authentication
        #[arg(long)]
        auth: bool,

        /// Path to the users file, overriding the configuration file
        #[arg(long)]
        users: Option<PathBuf>,
    },

    /// Manage proxy users
    User {
        #[command(subcommand)]
        action: UserAction,

        /// Path to the users file
        #[arg(long, default_value = "users.toml")]
        users: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum UserAction {
    /// List configured users
    List,
    /// Add a user
    Add {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// Remove a user
    Remove {
        /// Username
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    match args.command {
        Command::Serve {
            config,
            listen,
            auth,
            users,
        } => {
            let mut config = match config {
                Some(path) => {
                    let config = load_config(&path)?;
                    info!("Configuration loaded from: {:?}", path);
                    config
                }
                None => Config::default(),
            };

            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            if auth {
                config.auth.enabled = true;
            }
            if let Some(users) = users {
                config.auth.users_file = users;
            }

            serve(config).await
        }
        Command::User { action, users } => manage_users(action, users),
    }
}

async fn serve(config: Config) -> Result<()> {
    config.validate()?;

    info!("Socksd v{}", socksd::VERSION);

    let store = if config.auth.enabled {
        let store = UserStore::load(&config.auth.users_file)?;
        if store.is_empty() {
            warn!("Authentication enabled but no users configured; accepting all clients");
        }
        store
    } else {
        UserStore::new()
    };

    let handle = Server::new(config, Arc::new(store)).start()?;

    wait_for_signal().await?;
    handle.shutdown().await;

    Ok(())
}

fn manage_users(action: UserAction, users: PathBuf) -> Result<()> {
    let mut store = UserStore::load(&users)?;

    match action {
        UserAction::List => {
            if store.is_empty() {
                println!("No users configured in {:?}", users);
            }
            for name in store.usernames() {
                println!("{}", name);
            }
        }
        UserAction::Add { username, password } => {
            store.add_user(&username, &password)?;
            println!("User {} added", username);
        }
        UserAction::Remove { username } => {
            store.remove_user(&username)?;
            println!("User {} removed", username);
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        // On Windows, only handle Ctrl+C
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down...");
    }

    Ok(())
}

/// Setup logging based on command-line options
///
/// `RUST_LOG` takes precedence over `--log-level` when set.
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
