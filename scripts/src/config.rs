//! Network and named-account configuration for the deploy scripts
//!
//! The configuration file is optional. Without one, `hardhat` and `localhost`
//! are development networks served at [`DEFAULT_DEV_RPC_URL`], every other
//! network is live, and no named accounts are configured.

use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::Address;
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{
        DEFAULT_ACCOUNT_KEY, DEFAULT_DEV_RPC_URL, HARDHAT_NETWORK, LOCALHOST_NETWORK,
    },
    errors::ScriptError,
};

/// The contents of the deploy configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// Per-network settings, keyed by network name
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Named accounts, keyed by name
    #[serde(default)]
    pub named_accounts: BTreeMap<String, AccountSpec>,
}

/// The configurable settings of a network
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// The RPC URL of the network
    pub url: Option<String>,
    /// Whether the network is live, i.e. persistent and production-like
    pub live: Option<bool>,
}

/// How a named account maps to an address
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AccountSpec {
    /// The signer at the given index
    Index(usize),
    /// A fixed address
    Address(Address),
    /// A per-network choice, with a `default` fallback
    PerNetwork(BTreeMap<String, AccountSpec>),
}

/// The resolved settings of the network being deployed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    /// The network name, which also names its deployments ledger
    pub name: String,
    /// The RPC URL of the network
    pub rpc_url: String,
    /// Whether the network is live
    pub live: bool,
}

impl NetworkSettings {
    /// Whether the network's state lives only as long as the process
    pub fn is_ephemeral(&self) -> bool {
        self.name == HARDHAT_NETWORK
    }
}

impl DeployConfig {
    /// Load the configuration file, falling back to the defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|e| ScriptError::ReadConfig(e.to_string()))?;
        serde_json::from_str(&raw)
            .map_err(|e| ScriptError::ReadConfig(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the settings of the given network.
    ///
    /// `rpc_url` and `live` override the configured values when given.
    pub fn network(
        &self,
        name: &str,
        rpc_url: Option<String>,
        live: Option<bool>,
    ) -> Result<NetworkSettings, ScriptError> {
        let configured = self.networks.get(name).cloned().unwrap_or_default();
        let dev_network = is_dev_network(name);

        let rpc_url = rpc_url
            .or(configured.url)
            .or_else(|| dev_network.then(|| DEFAULT_DEV_RPC_URL.to_string()))
            .ok_or_else(|| {
                ScriptError::ReadConfig(format!("no RPC URL configured for network `{}`", name))
            })?;
        let live = live.or(configured.live).unwrap_or(!dev_network);

        Ok(NetworkSettings {
            name: name.to_string(),
            rpc_url,
            live,
        })
    }

    /// The named account specs, exactly as configured
    pub fn named_account_specs(&self) -> BTreeMap<String, AccountSpec> {
        self.named_accounts.clone()
    }
}

/// Whether the given network is a local development network
fn is_dev_network(name: &str) -> bool {
    name == HARDHAT_NETWORK || name == LOCALHOST_NETWORK
}

/// Named accounts resolved against a network and its signers
#[derive(Debug, Clone)]
pub struct NamedAccounts {
    /// The account specs, keyed by name
    specs: BTreeMap<String, AccountSpec>,
    /// The network to resolve per-network specs against
    network: String,
    /// The addresses of the configured signers, in order
    signers: Vec<Address>,
}

impl NamedAccounts {
    /// Constructor
    pub fn new(
        specs: BTreeMap<String, AccountSpec>,
        network: impl Into<String>,
        signers: Vec<Address>,
    ) -> Self {
        Self {
            specs,
            network: network.into(),
            signers,
        }
    }

    /// Resolve the named account to an address
    pub fn get(&self, name: &str) -> Result<Address, ScriptError> {
        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| ScriptError::UnknownNamedAccount(name.to_string()))?;

        self.resolve(spec).ok_or_else(|| {
            ScriptError::UnknownNamedAccount(format!(
                "`{}` does not resolve on network `{}` with {} signer(s)",
                name,
                self.network,
                self.signers.len()
            ))
        })
    }

    /// The configured account names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// Resolve a spec, returning `None` if it points at no signer
    fn resolve(&self, spec: &AccountSpec) -> Option<Address> {
        match spec {
            AccountSpec::Index(index) => self.signers.get(*index).copied(),
            AccountSpec::Address(address) => Some(*address),
            AccountSpec::PerNetwork(by_network) => by_network
                .get(&self.network)
                .or_else(|| by_network.get(DEFAULT_ACCOUNT_KEY))
                .and_then(|spec| self.resolve(spec)),
        }
    }
}
