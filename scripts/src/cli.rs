//! Definitions of CLI arguments and commands for the deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{deploy, print_accounts},
    errors::ScriptError,
};

/// Deploy the ssvETH contracts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arguments shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Private keys of the signers, comma separated. The first is account index 0.
    /// At least one is needed to talk to the network.
    #[arg(short, long = "priv-key", env = "PRIV_KEYS", value_delimiter = ',', global = true)]
    pub priv_keys: Vec<String>,

    /// The network to deploy to, naming its deployments ledger
    #[arg(short, long, env = "NETWORK", default_value = "localhost", global = true)]
    pub network: String,

    /// Network RPC URL, overriding the configured one
    #[arg(short, long, env = "RPC_URL", global = true)]
    pub rpc_url: Option<String>,

    /// Whether the network is live, overriding the configured value
    #[arg(long, global = true)]
    pub live: Option<bool>,

    /// Path to the network and named-account configuration
    #[arg(short, long, default_value = "deploy.config.json", global = true)]
    pub config: PathBuf,

    /// Directory holding the compiled contract artifacts
    #[arg(short, long, default_value = "artifacts", global = true)]
    pub artifacts: PathBuf,

    /// Directory holding the per-network deployments ledgers
    #[arg(short, long, default_value = "deployments", global = true)]
    pub deployments: PathBuf,
}

/// The commands of the deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Run the deploy steps against the network
    Deploy(DeployArgs),
    /// Print the address every named account resolves to on the network
    Accounts,
}

impl Command {
    /// Run the command
    pub async fn run(self, global: &GlobalArgs) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(global, args).await,
            Command::Accounts => print_accounts(global),
        }
    }
}

/// Arguments of the `deploy` command
#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Only run the steps carrying one of these tags, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Forget the network's recorded deployments and executed steps first
    #[arg(long)]
    pub reset: bool,
}
