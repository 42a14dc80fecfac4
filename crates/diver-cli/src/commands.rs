//! Command handlers for `diver ucp`.
//!
//! This is the only layer that decides what a failure means for the user.
//! The core library returns errors; here they become hints or exit codes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use diver_core::{ApiError, ClientConfig, StoreError, TokenStore, UcpClient};
use tracing::{debug, info, warn};

use crate::cli::{Cli, Commands, ContainerCommands, LoginArgs, UcpCommands};
use crate::utils::{format_bytes, truncate_string};

const LOGIN_HINT: &str = "Unable to find existing session, please login with `diver ucp login`";
const EXPIRED_HINT: &str = "Session has expired, please login with `diver ucp login`";

pub async fn run(cli: Cli) -> Result<()> {
    let store = match cli.session_file {
        Some(path) => TokenStore::new(path),
        None => TokenStore::default_location()?,
    };

    match cli.command {
        Commands::Ucp { command: None } => status(&store).await,
        Commands::Ucp {
            command: Some(command),
        } => match command {
            UcpCommands::Login(args) => login(args, &store).await,
            UcpCommands::Logout => logout(&store).await,
            UcpCommands::Containers {
                command: ContainerCommands::List,
            } => containers_list(&store).await,
            UcpCommands::Containers {
                command: ContainerCommands::Top,
            } => containers_top(&store).await,
            UcpCommands::Network => networks(&store).await,
            UcpCommands::ClientBundle { output } => client_bundle(&store, output).await,
        },
    }
}

/// Load the stored session, turning "never logged in" into a login hint
fn load_client(store: &TokenStore) -> Result<UcpClient> {
    store.load_client().map_err(|e| match e {
        StoreError::NotFound(_) => anyhow::Error::new(e).context(LOGIN_HINT),
        other => anyhow::Error::new(other).context("Failed to restore UCP session"),
    })
}

/// A rejected token means the stored session is stale
fn api_failure(err: ApiError) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow::Error::new(err).context(EXPIRED_HINT)
    } else {
        err.into()
    }
}

async fn status(store: &TokenStore) -> Result<()> {
    let data = match store.load() {
        Ok(data) => data,
        Err(e) if e.is_not_found() => {
            warn!("{}", LOGIN_HINT);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to read UCP session"),
    };

    let client = UcpClient::from_session(&data)?;
    match client.auth_status().await {
        Ok(account) => {
            println!("Current user [{}]", account.display_name());
            println!("Control plane {} (logged in {})", data.url, data.age_display());
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "{}", EXPIRED_HINT);
            Ok(())
        }
    }
}

async fn login(args: LoginArgs, store: &TokenStore) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let config = ClientConfig::new(args.username, password, args.url, args.ignore_cert);
    let client = UcpClient::connect(&config)
        .await
        .with_context(|| format!("Failed to log into [{}]", config.url))?;

    store.save(&client.session_data()?)?;
    info!(url = %config.url, "Session stored");
    println!("Successfully logged into [{}]", config.url);
    Ok(())
}

async fn logout(store: &TokenStore) -> Result<()> {
    match store.load_client() {
        Ok(mut client) => client.disconnect().await?,
        Err(e) => debug!(error = %e, "No usable session to disconnect"),
    }
    store.clear()?;
    println!("Logged out");
    Ok(())
}

async fn containers_list(store: &TokenStore) -> Result<()> {
    let client = load_client(store)?;
    let containers = client.list_containers().await.map_err(api_failure)?;

    println!("{:<14}{:<16}{:<28}{:<30}{}", "ID", "NODE", "NAME", "IMAGE", "STATUS");
    for c in &containers {
        println!(
            "{:<14}{:<16}{:<28}{:<30}{}",
            c.short_id(),
            truncate_string(c.node().as_deref().unwrap_or("-"), 15),
            truncate_string(&c.display_name(), 27),
            truncate_string(&c.image, 29),
            c.status.as_deref().or(c.state.as_deref()).unwrap_or("-"),
        );
    }
    info!(count = containers.len(), "Listed containers");
    Ok(())
}

async fn containers_top(store: &TokenStore) -> Result<()> {
    let client = load_client(store)?;
    let usage = client.container_top().await.map_err(api_failure)?;

    println!("{:<14}{:<16}{:<28}{:>8}  {:>10}", "ID", "NODE", "NAME", "CPU %", "MEM");
    for u in &usage {
        println!(
            "{:<14}{:<16}{:<28}{:>8.2}  {:>10}",
            u.id,
            truncate_string(u.node.as_deref().unwrap_or("-"), 15),
            truncate_string(&u.name, 27),
            u.cpu_percent,
            u.memory_bytes.map(format_bytes).unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

async fn networks(store: &TokenStore) -> Result<()> {
    let client = load_client(store)?;
    let networks = client.list_networks().await.map_err(api_failure)?;

    println!("{:<14}{:<30}{:<12}{}", "ID", "NAME", "DRIVER", "SCOPE");
    for n in &networks {
        println!(
            "{:<14}{:<30}{:<12}{}",
            n.short_id(),
            truncate_string(&n.name, 29),
            n.driver.as_deref().unwrap_or("-"),
            n.scope.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn client_bundle(store: &TokenStore, output: Option<PathBuf>) -> Result<()> {
    let client = load_client(store)?;
    let bundle = client.client_bundle().await.map_err(api_failure)?;

    let path = output.unwrap_or_else(|| default_bundle_path(client.username()));
    std::fs::write(&path, &bundle)
        .with_context(|| format!("Failed to write client bundle to {}", path.display()))?;

    println!(
        "Client bundle written to {} ({})",
        path.display(),
        format_bytes(bundle.len() as u64)
    );
    Ok(())
}

fn default_bundle_path(username: &str) -> PathBuf {
    if username.is_empty() {
        PathBuf::from("ucp-bundle.zip")
    } else {
        PathBuf::from(format!("ucp-bundle-{}.zip", username))
    }
}
