//! Directory client CLI
//!
//! Browse domains, manage connections and log in from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use directory::{
    error::{AppError, Result},
    models::{Config, DiscoveryOutcome, Domain},
    pipeline::{ConnectionsList, DomainCache, DomainDiscovery},
    services::{DomainProvider, EndpointUsersProvider, HttpDirectoryClient},
    session::{LoginState, Session},
    storage::{LocalStorage, SnapshotStore},
    utils::url::display_address,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Directory - virtual-world domain and people browser
#[derive(Parser, Debug)]
#[command(
    name = "directory",
    version,
    about = "Browse virtual-world domains and connections"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Directory holding the cached domains and session
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List domains matching a filter (curated ones when empty)
    Domains {
        /// Search words; every word must occur in the name
        filter: Vec<String>,

        /// Only print the cached list, without a network pass
        #[arg(long)]
        cached: bool,
    },

    /// Filter domains interactively; ":r" refreshes, ":q" quits
    Browse,

    /// List social connections
    Connections {
        /// Access token (default: remembered session)
        #[arg(long)]
        token: Option<String>,
    },

    /// Add or remove a friend
    Friend {
        #[command(subcommand)]
        action: FriendAction,

        #[arg(long, global = true)]
        token: Option<String>,
    },

    /// Remove a connection
    Disconnect {
        username: String,

        #[arg(long)]
        token: Option<String>,
    },

    /// Log in with username and password
    Login {
        username: String,

        #[arg(short, long)]
        password: String,

        /// Remember the login for later runs
        #[arg(long)]
        keep: bool,
    },

    /// Create an account and log into it
    Signup {
        email: String,
        username: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        keep: bool,
    },

    /// Forget the remembered login
    Logout,

    /// Record the address shown as "last location"
    Goto { url: String },

    /// Validate configuration
    Validate,

    /// Show cache and session info
    Info,
}

#[derive(Subcommand, Debug)]
enum FriendAction {
    /// Star a connection as friend
    Add { username: String },
    /// Unstar a friend
    Remove { username: String },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_domains(outcome: &DiscoveryOutcome) {
    if outcome.is_empty() {
        println!("No domains found.");
        return;
    }
    for domain in &outcome.domains {
        print_domain(domain);
    }
}

fn print_domain(domain: &Domain) {
    println!("{:<32} {}", domain.name, domain.url);
}

/// Build the discovery pipeline with the cache seeded from storage.
async fn discovery(
    config: &Config,
    client: &Arc<HttpDirectoryClient>,
    storage: &LocalStorage,
) -> Result<(DomainDiscovery, Arc<DomainCache>)> {
    let cache = match storage.load_domains().await {
        Ok(Some(snapshot)) => Arc::new(DomainCache::with_snapshot(snapshot)),
        Ok(None) => Arc::new(DomainCache::new()),
        Err(e) => {
            log::warn!("Ignoring unreadable domain cache: {}", e);
            Arc::new(DomainCache::new())
        }
    };

    let provider = DomainProvider::new(client.clone(), config);
    let mut discovery = DomainDiscovery::new(provider, Arc::clone(&cache), &config.discovery);
    discovery.set_last_location(storage.load_session().await?.last_location);
    Ok((discovery, cache))
}

async fn save_cache(cache: &DomainCache, storage: &LocalStorage) {
    if let Some(snapshot) = cache.snapshot().await {
        if let Err(e) = storage.save_domains(&snapshot).await {
            log::warn!("Failed to save domain cache: {}", e);
        }
    }
}

/// Token from the flag, or from the remembered session.
async fn resolve_token(token: Option<String>, session: &Session) -> Result<String> {
    if let Some(token) = token {
        return Ok(token);
    }
    session.restore().await?;
    session
        .access_token()
        .await
        .ok_or_else(|| AppError::auth("not logged in; run 'login --keep' or pass --token"))
}

async fn connections(config: &Config, client: &Arc<HttpDirectoryClient>, token: String) -> Result<ConnectionsList> {
    let provider = EndpointUsersProvider::new(client.clone(), token, &config.connections)?;
    Ok(ConnectionsList::new(Arc::new(provider)))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);

    log::debug!("Loaded configuration from {}", cli.config.display());

    let storage = LocalStorage::new(&cli.storage_dir);
    let store: Arc<dyn SnapshotStore> = Arc::new(storage.clone());
    let client = Arc::new(HttpDirectoryClient::new(&config.api)?);
    let session = Session::new(client.clone()).with_store(store);

    match cli.command {
        Command::Domains { filter, cached } => {
            let (mut discovery, cache) = discovery(&config, &client, &storage).await?;
            if cached {
                let domains = discovery.cached().await;
                log::info!("{} cached domains", domains.len());
                domains.iter().for_each(print_domain);
                return Ok(());
            }

            let outcome = discovery.retrieve(&filter.join(" "), false).await?;
            print_domains(&outcome);
            save_cache(&cache, &storage).await;
        }

        Command::Browse => {
            let (mut discovery, cache) = discovery(&config, &client, &storage).await?;
            let cached = discovery.cached().await;
            if !cached.is_empty() {
                log::info!("Showing {} cached domains while fetching", cached.len());
                cached.iter().for_each(print_domain);
            }

            let mut filter = String::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut refresh = false;
            loop {
                match discovery.retrieve(&filter, refresh).await {
                    Ok(outcome) => print_domains(&outcome),
                    Err(e) if e.is_transport() => {
                        log::warn!("Directory unreachable, keeping cached domains: {}", e)
                    }
                    Err(e) => log::error!("{}", e),
                }
                save_cache(&cache, &storage).await;

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                match line.trim() {
                    ":q" => break,
                    ":r" => refresh = true,
                    text => {
                        refresh = false;
                        filter = text.to_string();
                    }
                }
            }
        }

        Command::Connections { token } => {
            let token = resolve_token(token, &session).await?;
            let mut list = connections(&config, &client, token).await?;
            for entry in list.refresh().await? {
                let user = &entry.user;
                println!(
                    "{} {:<24} {:<8} {}",
                    if user.connection.is_friend() { "★" } else { "☆" },
                    user.name,
                    if user.online { "online" } else { "offline" },
                    user.location_name
                );
            }
        }

        Command::Friend { action, token } => {
            let token = resolve_token(token, &session).await?;
            let mut list = connections(&config, &client, token).await?;
            list.refresh().await?;

            let (username, want_friend) = match &action {
                FriendAction::Add { username } => (username.as_str(), true),
                FriendAction::Remove { username } => (username.as_str(), false),
            };
            let is_friend = list
                .get(username)
                .map(|e| e.user.connection.is_friend())
                .ok_or_else(|| AppError::validation(format!("no connection named '{username}'")))?;

            if is_friend == want_friend {
                log::info!("Nothing to do for {}", username);
            } else {
                let now_friend = list.toggle_friend(username).await?;
                log::info!(
                    "{} is {} a friend",
                    username,
                    if now_friend { "now" } else { "no longer" }
                );
            }
        }

        Command::Disconnect { username, token } => {
            let token = resolve_token(token, &session).await?;
            let mut list = connections(&config, &client, token).await?;
            list.refresh().await?;
            list.remove_connection(&username).await?;
            log::info!("Removed connection {}", username);
        }

        Command::Login {
            username,
            password,
            keep,
        } => match session.login(&username, &password, keep).await? {
            LoginState::LoggedIn { .. } => log::info!("Logged in as {}", username),
            other => log::warn!("Login ended in state {:?}", other),
        },

        Command::Signup {
            email,
            username,
            password,
            keep,
        } => {
            session.signup(&email, &username, &password, keep).await?;
            log::info!("Account {} created", username);
        }

        Command::Logout => session.logout().await?,

        Command::Goto { url } => {
            let mut saved = storage.load_session().await?;
            saved.last_location = Some(url.clone());
            storage.save_session(&saved).await?;
            log::info!("Last location set to {}", display_address(&url));
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Storage directory: {}", storage.root().display());

            match storage.load_domains().await? {
                Some(snapshot) => log::info!(
                    "Cached domains: {} (updated {})",
                    snapshot.domains.len(),
                    snapshot.updated_at
                ),
                None => log::info!("No cached domains yet."),
            }

            let saved = storage.load_session().await?;
            if let Some(location) = &saved.last_location {
                log::info!("Last location: {}", display_address(location));
            }
            match session.restore().await? {
                LoginState::LoggedIn { username } => log::info!(
                    "Logged in as {}",
                    username.as_deref().unwrap_or("<unknown>")
                ),
                _ => log::info!("Not logged in."),
            }
        }
    }

    Ok(())
}
