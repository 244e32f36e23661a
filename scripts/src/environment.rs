//! The execution context handed to deploy steps, and its chain-backed implementation
//!
//! Steps describe deployments declaratively through [`DeployOptions`]; the
//! environment decides what actually happens on chain. In particular, proxy
//! options are only honoured on non-live networks: on a live network the
//! contract is deployed directly and its constructor does the setup.

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    primitives::{keccak256, Address, Bytes},
};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    artifacts::{Artifact, ArtifactRegistry},
    chain::ChainClient,
    config::{NamedAccounts, NetworkSettings},
    constants::{IMPLEMENTATION_SUFFIX, PROXY_SUFFIX},
    deployments::{Deployment, DeploymentsLedger},
    errors::ScriptError,
    solidity::{ownerCall, upgradeAndCallCall},
};

// -----------
// | Options |
// -----------

/// A declarative deployment request
#[derive(Debug, Clone, PartialEq)]
pub struct DeployOptions {
    /// The account sending the deployment transactions
    pub from: Address,
    /// The artifact to deploy, when it differs from the deployment name
    pub contract: Option<String>,
    /// The constructor arguments
    pub args: Vec<DynSolValue>,
    /// Reuse an existing deployment under the same name without comparing code
    pub skip_if_already_deployed: bool,
    /// Log progress at `info` rather than `debug`
    pub log: bool,
    /// Mine a block after each transaction on development networks
    pub auto_mine: bool,
    /// Deploy behind a proxy, on networks that allow it
    pub proxy: Option<ProxyOptions>,
}

impl DeployOptions {
    /// A request to deploy from the given account with no arguments
    pub fn new(from: Address) -> Self {
        Self {
            from,
            contract: None,
            args: Vec::new(),
            skip_if_already_deployed: false,
            log: false,
            auto_mine: false,
            proxy: None,
        }
    }

    /// Deploy the given artifact rather than the one named like the deployment
    pub fn contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    /// Set the constructor arguments
    pub fn args(mut self, args: Vec<DynSolValue>) -> Self {
        self.args = args;
        self
    }

    /// Set whether an existing deployment is reused unconditionally
    pub fn skip_if_already_deployed(mut self, skip: bool) -> Self {
        self.skip_if_already_deployed = skip;
        self
    }

    /// Set whether progress is logged at `info`
    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Set whether blocks are mined after each transaction on development networks
    pub fn auto_mine(mut self, auto_mine: bool) -> Self {
        self.auto_mine = auto_mine;
        self
    }

    /// Deploy behind a proxy
    pub fn proxy(mut self, proxy: ProxyOptions) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// The artifact to deploy under the given deployment name
    pub fn artifact_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.contract.as_deref().unwrap_or(name)
    }
}

/// How to wrap a deployment in an upgradeable proxy
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyOptions {
    /// The account allowed to upgrade the proxy through its admin
    pub owner: Address,
    /// The proxy artifact, constructed as `(implementation, admin, data)`
    pub proxy_contract: String,
    /// The deployment name of the admin contract governing the proxy
    pub via_admin_contract: String,
    /// The call made through the proxy when it is created
    pub init: Option<ProxyInit>,
}

/// An initializer call made through a freshly created proxy
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyInit {
    /// The implementation method to call
    pub method_name: String,
    /// The method arguments
    pub args: Vec<DynSolValue>,
}

// ----------
// | Traits |
// ----------

/// The execution context of a deploy step
#[async_trait]
pub trait DeployEnvironment: Send {
    /// The name of the network being deployed to
    fn network_name(&self) -> &str;

    /// Whether the network is live, i.e. persistent and production-like
    fn is_live(&self) -> bool;

    /// Resolve a named account to its address
    fn named_account(&self, name: &str) -> Result<Address, ScriptError>;

    /// Deploy a contract under the given name, or reuse an existing deployment
    async fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> Result<Deployment, ScriptError>;
}

/// The record of which deploy steps have completed for good
pub trait MigrationLog {
    /// Whether the step with the given id has been recorded as executed
    fn has_executed(&self, step_id: &str) -> bool;

    /// Record the step with the given id as executed
    fn record_executed(&mut self, step_id: &str) -> Result<(), ScriptError>;
}

// -------------------------
// | Chain-backed context |
// -------------------------

/// A [`DeployEnvironment`] that deploys through a [`ChainClient`] and records
/// the results in a [`DeploymentsLedger`]
pub struct ChainEnvironment<C: ChainClient> {
    /// The network being deployed to
    network: NetworkSettings,
    /// The named accounts of the network
    accounts: NamedAccounts,
    /// The deployable artifacts
    artifacts: ArtifactRegistry,
    /// The network's deployments ledger
    ledger: DeploymentsLedger,
    /// The chain client
    chain: C,
}

impl<C: ChainClient> ChainEnvironment<C> {
    /// Constructor, binding the ledger to the chain the client is connected to
    pub async fn new(
        network: NetworkSettings,
        accounts: NamedAccounts,
        artifacts: ArtifactRegistry,
        mut ledger: DeploymentsLedger,
        chain: C,
    ) -> Result<Self, ScriptError> {
        let chain_id = chain.chain_id().await?;
        ledger.check_chain_id(chain_id)?;
        debug!("deploying to `{}` (chain {})", network.name, chain_id);

        Ok(Self {
            network,
            accounts,
            artifacts,
            ledger,
            chain,
        })
    }

    /// The deployments ledger
    pub fn ledger(&self) -> &DeploymentsLedger {
        &self.ledger
    }

    /// The chain client
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Whether transactions should be followed by a mined block
    fn should_mine(&self, options: &DeployOptions) -> bool {
        options.auto_mine && !self.network.live
    }

    /// The recorded deployment under the given name, if its code is still on chain
    async fn live_deployment(&self, name: &str) -> Result<Option<Deployment>, ScriptError> {
        let Some(deployment) = self.ledger.get(name) else {
            return Ok(None);
        };

        if self.chain.code_at(deployment.address).await?.is_empty() {
            warn!(
                "`{}` is recorded at {} but has no code there, redeploying",
                name, deployment.address
            );
            return Ok(None);
        }

        Ok(Some(deployment.clone()))
    }

    /// Deploy the artifact directly, reusing an identical existing deployment
    async fn deploy_direct(
        &mut self,
        name: &str,
        artifact: &Artifact,
        args: &[DynSolValue],
        options: &DeployOptions,
    ) -> Result<Deployment, ScriptError> {
        if artifact.bytecode.is_empty() {
            return Err(ScriptError::ContractDeployment(format!(
                "artifact `{}` has no bytecode",
                artifact.contract_name
            )));
        }

        let args_data = encode_constructor_args(artifact, args)?;
        let init_code = Bytes::from([artifact.bytecode.as_ref(), args_data.as_ref()].concat());
        let init_code_hash = keccak256(&init_code);

        if let Some(existing) = self.live_deployment(name).await? {
            if existing.init_code_hash == init_code_hash {
                report(options.log, &format!("reusing \"{}\" at {}", name, existing.address));
                return Ok(existing);
            }
        }

        report(
            options.log,
            &format!("deploying \"{}\" ({})", name, artifact.contract_name),
        );
        let outcome = self
            .chain
            .deploy(options.from, init_code, self.should_mine(options))
            .await?;
        let address = outcome.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!("no address created for `{}`", name))
        })?;
        report(
            options.log,
            &format!(
                "deployed \"{}\" at {} (tx: {}) with {} gas",
                name, address, outcome.transaction_hash, outcome.gas_used
            ),
        );

        let deployment = Deployment {
            address,
            abi: artifact.abi.clone(),
            transaction_hash: Some(outcome.transaction_hash),
            args_data,
            init_code_hash,
            implementation: None,
        };
        self.ledger.record(name, deployment.clone())?;
        Ok(deployment)
    }

    /// Deploy the artifact as the implementation behind a transparent proxy,
    /// creating the proxy or upgrading it as needed
    async fn deploy_proxied(
        &mut self,
        name: &str,
        artifact: &Artifact,
        options: &DeployOptions,
        proxy: &ProxyOptions,
    ) -> Result<Deployment, ScriptError> {
        let implementation_name = format!("{}{}", name, IMPLEMENTATION_SUFFIX);
        let proxy_name = format!("{}{}", name, PROXY_SUFFIX);

        let implementation = self
            .deploy_direct(&implementation_name, artifact, &options.args, options)
            .await?;
        let admin = self
            .live_deployment(&proxy.via_admin_contract)
            .await?
            .ok_or_else(|| ScriptError::MissingDeployment(proxy.via_admin_contract.clone()))?;

        let proxy_deployment = match self.live_deployment(&proxy_name).await? {
            None => {
                let init_data = match &proxy.init {
                    Some(init) => encode_function_call(artifact, &init.method_name, &init.args)?,
                    None => Bytes::new(),
                };
                let proxy_artifact = self.artifacts.get(&proxy.proxy_contract)?;
                let proxy_args = [
                    DynSolValue::Address(implementation.address),
                    DynSolValue::Address(admin.address),
                    DynSolValue::Bytes(init_data.to_vec()),
                ];

                self.deploy_direct(&proxy_name, &proxy_artifact, &proxy_args, options)
                    .await?
            }
            Some(existing) => {
                let current = self.ledger.get(name).and_then(|d| d.implementation);
                if current != Some(implementation.address) {
                    self.upgrade_proxy(
                        name,
                        existing.address,
                        &admin,
                        implementation.address,
                        proxy,
                        options,
                    )
                    .await?;
                }
                existing
            }
        };

        let deployment = Deployment {
            address: proxy_deployment.address,
            abi: artifact.abi.clone(),
            transaction_hash: proxy_deployment.transaction_hash,
            args_data: implementation.args_data,
            init_code_hash: implementation.init_code_hash,
            implementation: Some(implementation.address),
        };
        self.ledger.record(name, deployment.clone())?;
        Ok(deployment)
    }

    /// Point an existing proxy at a new implementation through its admin contract
    async fn upgrade_proxy(
        &mut self,
        name: &str,
        proxy_address: Address,
        admin: &Deployment,
        implementation: Address,
        proxy: &ProxyOptions,
        options: &DeployOptions,
    ) -> Result<(), ScriptError> {
        let raw_owner = self
            .chain
            .call(admin.address, ownerCall {}.abi_encode().into())
            .await?;
        let admin_owner = ownerCall::abi_decode_returns(&raw_owner)
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        if admin_owner != proxy.owner {
            return Err(ScriptError::ProxyAdminOwnerMismatch(format!(
                "`{}` at {} is owned by {}, not by the proxy owner {}",
                proxy.via_admin_contract, admin.address, admin_owner, proxy.owner
            )));
        }

        report(
            options.log,
            &format!(
                "upgrading \"{}\" at {} to implementation {}",
                name, proxy_address, implementation
            ),
        );
        let calldata = upgradeAndCallCall {
            proxy: proxy_address,
            implementation,
            data: Bytes::new(),
        }
        .abi_encode();
        self.chain
            .send(proxy.owner, admin.address, calldata.into(), self.should_mine(options))
            .await?;

        Ok(())
    }
}

#[async_trait]
impl<C: ChainClient> DeployEnvironment for ChainEnvironment<C> {
    fn network_name(&self) -> &str {
        &self.network.name
    }

    fn is_live(&self) -> bool {
        self.network.live
    }

    fn named_account(&self, name: &str) -> Result<Address, ScriptError> {
        self.accounts.get(name)
    }

    async fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> Result<Deployment, ScriptError> {
        if options.skip_if_already_deployed {
            if let Some(existing) = self.live_deployment(name).await? {
                report(options.log, &format!("reusing \"{}\" at {}", name, existing.address));
                return Ok(existing);
            }
        }

        let artifact = self.artifacts.get(options.artifact_name(name))?;
        match &options.proxy {
            Some(proxy) if !self.network.live => {
                self.deploy_proxied(name, &artifact, &options, proxy).await
            }
            _ => {
                self.deploy_direct(name, &artifact, &options.args, &options)
                    .await
            }
        }
    }
}

impl<C: ChainClient> MigrationLog for ChainEnvironment<C> {
    fn has_executed(&self, step_id: &str) -> bool {
        self.ledger.has_migration(step_id)
    }

    fn record_executed(&mut self, step_id: &str) -> Result<(), ScriptError> {
        self.ledger.record_migration(step_id)
    }
}

// -----------
// | Helpers |
// -----------

/// Log a progress message at `info` if requested, at `debug` otherwise
fn report(log: bool, message: &str) {
    if log {
        info!("{}", message);
    } else {
        debug!("{}", message);
    }
}

/// ABI-encode constructor arguments against the artifact's constructor
fn encode_constructor_args(
    artifact: &Artifact,
    args: &[DynSolValue],
) -> Result<Bytes, ScriptError> {
    match &artifact.abi.constructor {
        Some(constructor) => constructor
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| {
                ScriptError::CalldataConstruction(format!(
                    "`{}` constructor: {}",
                    artifact.contract_name, e
                ))
            }),
        None if args.is_empty() => Ok(Bytes::new()),
        None => Err(ScriptError::CalldataConstruction(format!(
            "`{}` has no constructor but {} argument(s) were given",
            artifact.contract_name,
            args.len()
        ))),
    }
}

/// ABI-encode a call to the artifact method with the given name and arity
fn encode_function_call(
    artifact: &Artifact,
    method_name: &str,
    args: &[DynSolValue],
) -> Result<Bytes, ScriptError> {
    let function = artifact
        .abi
        .function(method_name)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
        .ok_or_else(|| {
            ScriptError::CalldataConstruction(format!(
                "`{}` has no method `{}` taking {} argument(s)",
                artifact.contract_name,
                method_name,
                args.len()
            ))
        })?;

    function.abi_encode_input(args).map(Bytes::from).map_err(|e| {
        ScriptError::CalldataConstruction(format!(
            "`{}.{}`: {}",
            artifact.contract_name, method_name, e
        ))
    })
}
