//! The deployments ledger: a per-network record of deployed contracts and
//! executed deploy steps, persisted as `<deployments_dir>/<network>.json`

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, Bytes, B256},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{constants::JSON_EXTENSION, errors::ScriptError};

/// A recorded deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// The address at which the contract is callable. For proxied
    /// deployments this is the proxy address.
    pub address: Address,
    /// The ABI to call the contract with
    pub abi: JsonAbi,
    /// The hash of the creating transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// The ABI-encoded constructor arguments
    #[serde(default)]
    pub args_data: Bytes,
    /// The keccak hash of the creation code, constructor arguments included
    pub init_code_hash: B256,
    /// The implementation behind a proxied deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Address>,
}

/// The serialized contents of a ledger file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerContents {
    /// The chain the deployments were made on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chain_id: Option<u64>,
    /// Deployments keyed by name
    #[serde(default)]
    deployments: BTreeMap<String, Deployment>,
    /// Executed step ids, mapped to the unix time at which they were recorded
    #[serde(default)]
    migrations: BTreeMap<String, u64>,
}

/// The deployments ledger of a single network
#[derive(Debug, Default)]
pub struct DeploymentsLedger {
    /// The file backing the ledger, `None` for ephemeral networks
    path: Option<PathBuf>,
    /// The ledger contents
    contents: LedgerContents,
}

impl DeploymentsLedger {
    /// Open the ledger for the given network, starting empty if no file exists yet
    pub fn open(deployments_dir: &Path, network: &str) -> Result<Self, ScriptError> {
        let path = deployments_dir.join(format!("{network}.{JSON_EXTENSION}"));
        let contents = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
            serde_json::from_str(&raw).map_err(|e| {
                ScriptError::ReadDeployments(format!("{}: {}", path.display(), e))
            })?
        } else {
            LedgerContents::default()
        };

        debug!("opened deployments ledger at {}", path.display());
        Ok(Self {
            path: Some(path),
            contents,
        })
    }

    /// A ledger that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// The file backing the ledger, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The chain ID the ledger was recorded against, if known
    pub fn chain_id(&self) -> Option<u64> {
        self.contents.chain_id
    }

    /// Bind the ledger to the given chain, failing if it already holds
    /// deployments from another chain
    pub fn check_chain_id(&mut self, chain_id: u64) -> Result<(), ScriptError> {
        match self.contents.chain_id {
            Some(recorded) if recorded != chain_id => Err(ScriptError::ChainIdMismatch {
                recorded,
                actual: chain_id,
            }),
            Some(_) => Ok(()),
            None => {
                self.contents.chain_id = Some(chain_id);
                self.save()
            }
        }
    }

    /// Get the deployment recorded under the given name
    pub fn get(&self, name: &str) -> Option<&Deployment> {
        self.contents.deployments.get(name)
    }

    /// The names of all recorded deployments
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contents.deployments.keys().map(String::as_str)
    }

    /// Record a deployment under the given name, replacing any previous record
    pub fn record(&mut self, name: &str, deployment: Deployment) -> Result<(), ScriptError> {
        self.contents
            .deployments
            .insert(name.to_string(), deployment);
        self.save()
    }

    /// Whether the step with the given id has been recorded as executed
    pub fn has_migration(&self, step_id: &str) -> bool {
        self.contents.migrations.contains_key(step_id)
    }

    /// Record the step with the given id as executed
    pub fn record_migration(&mut self, step_id: &str) -> Result<(), ScriptError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.contents
            .migrations
            .insert(step_id.to_string(), timestamp);
        self.save()
    }

    /// Forget every deployment and executed step
    pub fn reset(&mut self) -> Result<(), ScriptError> {
        self.contents = LedgerContents::default();
        self.save()
    }

    /// Write the ledger to its backing file, if it has one
    fn save(&self) -> Result<(), ScriptError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        }

        let serialized = serde_json::to_string_pretty(&self.contents)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(path, serialized).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
    }
}
