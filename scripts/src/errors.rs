//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading or parsing the deploy configuration file
    ReadConfig(String),
    /// Error reading the deployments ledger
    ReadDeployments(String),
    /// Error writing the deployments ledger
    WriteDeployments(String),
    /// The chain ID recorded in the deployments ledger does not match the network
    ChainIdMismatch {
        /// The chain ID recorded in the ledger
        recorded: u64,
        /// The chain ID reported by the RPC node
        actual: u64,
    },
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// No compilation artifact exists for the given contract name
    MissingArtifact(String),
    /// The named account is not configured, or resolves to no signer
    UnknownNamedAccount(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method or constructor
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// A deployment that another deployment depends on is not recorded
    MissingDeployment(String),
    /// The proxy admin is not owned by the account expected to upgrade through it
    ProxyAdminOwnerMismatch(String),
    /// A deploy step asked to be recorded as executed but declares no id
    MissingStepId(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ReadConfig(s) => write!(f, "error reading config: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ChainIdMismatch { recorded, actual } => write!(
                f,
                "deployments were recorded for chain {} but the network reports chain {}",
                recorded, actual
            ),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::MissingArtifact(s) => write!(f, "no artifact found for contract: {}", s),
            ScriptError::UnknownNamedAccount(s) => write!(f, "unknown named account: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::MissingDeployment(s) => write!(f, "no deployment recorded for: {}", s),
            ScriptError::ProxyAdminOwnerMismatch(s) => {
                write!(f, "proxy admin owner mismatch: {}", s)
            }
            ScriptError::MissingStepId(s) => {
                write!(f, "deploy step returned true without an id: {}", s)
            }
        }
    }
}

impl Error for ScriptError {}
