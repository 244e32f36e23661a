//! Implementations of the CLI commands

use tracing::info;

use crate::{
    artifacts::ArtifactRegistry,
    chain::RpcChainClient,
    cli::{DeployArgs, GlobalArgs},
    config::{DeployConfig, NamedAccounts},
    deployments::DeploymentsLedger,
    environment::ChainEnvironment,
    errors::ScriptError,
    runner::run_steps,
    steps::all_steps,
};

/// Run the selected deploy steps against the configured network
pub async fn deploy(global: &GlobalArgs, args: DeployArgs) -> Result<(), ScriptError> {
    let config = DeployConfig::load(&global.config)?;
    let network = config.network(&global.network, global.rpc_url.clone(), global.live)?;
    info!(
        "Deploying to `{}` at {} (live: {})",
        network.name, network.rpc_url, network.live
    );

    let client = RpcChainClient::new(&network.rpc_url, &global.priv_keys)?;
    let accounts = NamedAccounts::new(
        config.named_account_specs(),
        network.name.clone(),
        client.signers().to_vec(),
    );
    let artifacts = ArtifactRegistry::load(&global.artifacts)?;

    let mut ledger = if network.is_ephemeral() {
        DeploymentsLedger::in_memory()
    } else {
        DeploymentsLedger::open(&global.deployments, &network.name)?
    };
    if args.reset {
        info!("Resetting deployments of `{}`", network.name);
        ledger.reset()?;
    }

    let mut env = ChainEnvironment::new(network, accounts, artifacts, ledger, client).await?;
    let summary = run_steps(&all_steps(), &args.tags, &mut env).await?;

    info!(
        "Ran {} step(s), skipped {}, recorded {}",
        summary.ran.len(),
        summary.skipped.len(),
        summary.recorded.len()
    );
    for name in env.ledger().names() {
        if let Some(deployment) = env.ledger().get(name) {
            info!("{}: {}", name, deployment.address);
        }
    }
    if let Some(path) = env.ledger().path() {
        info!("Deployments written to {}", path.display());
    }

    Ok(())
}

/// Print the named accounts resolved against the configured network
pub fn print_accounts(global: &GlobalArgs) -> Result<(), ScriptError> {
    let config = DeployConfig::load(&global.config)?;
    let client = RpcChainClient::new(
        &config
            .network(&global.network, global.rpc_url.clone(), global.live)?
            .rpc_url,
        &global.priv_keys,
    )?;
    let accounts = NamedAccounts::new(
        config.named_account_specs(),
        global.network.clone(),
        client.signers().to_vec(),
    );

    for name in accounts.names() {
        match accounts.get(name) {
            Ok(address) => println!("{}: {}", name, address),
            Err(e) => println!("{}: {}", name, e),
        }
    }

    Ok(())
}
