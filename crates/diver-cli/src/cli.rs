//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};

/// Diver - operator tooling for Docker EE.
#[derive(Parser, Debug)]
#[command(name = "diver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Where the UCP session is stored between runs.
    #[arg(long, env = "DIVER_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Universal Control Plane. Without a subcommand, shows the current session.
    Ucp {
        #[command(subcommand)]
        command: Option<UcpCommands>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UcpCommands {
    /// Authenticate against the Universal Control Plane
    Login(LoginArgs),

    /// Forget the stored session
    Logout,

    /// Interact with containers
    Containers {
        #[command(subcommand)]
        command: ContainerCommands,
    },

    /// List container networks
    Network,

    /// Download the client bundle for UCP
    ClientBundle {
        /// File to write the bundle to [default: ucp-bundle-<username>.zip]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContainerCommands {
    /// List all containers across all nodes in UCP
    List,

    /// Running containers and their CPU usage, busiest first
    Top,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username that has permissions to authenticate to Docker EE
    #[arg(long, env = "DIVER_USERNAME")]
    pub username: String,

    /// Password for the user; prompted for when not given
    #[arg(long, env = "DIVER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// URL for Docker EE, e.g. https://10.0.0.1
    #[arg(long, env = "DIVER_URL")]
    pub url: String,

    /// Ignore x509 certificate errors. From the environment, anything but
    /// false/no/off/0/empty turns it on.
    #[arg(long = "ignorecert", env = "DIVER_INSECURE", value_parser = FalseyValueParser::new())]
    pub ignore_cert: bool,
}
