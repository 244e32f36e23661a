//! Lookup of compiled contract artifacts by contract name
//!
//! Both hardhat (`artifacts/`) and foundry (`out/`) layouts are supported: the
//! directory is walked for `<ContractName>.json` files, and the bytecode is read
//! either as a hex string or as an `{ "object": ... }` wrapper.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    constants::{DEBUG_ARTIFACT_SUFFIX, JSON_EXTENSION},
    errors::ScriptError,
};

/// A compiled contract: its ABI and creation bytecode
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// The name of the contract
    pub contract_name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

/// The on-disk shape of an artifact, as emitted by hardhat or foundry
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: RawBytecode,
}

/// Hardhat emits the bytecode as a hex string, foundry wraps it in an object
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// A bare hex string
    Hex(Bytes),
    /// A `{ "object": "0x..." }` wrapper
    Object {
        /// The hex bytecode
        object: Bytes,
    },
}

impl RawBytecode {
    /// Unwrap the bytecode
    fn into_bytes(self) -> Bytes {
        match self {
            RawBytecode::Hex(bytes) | RawBytecode::Object { object: bytes } => bytes,
        }
    }
}

/// A registry of the artifacts available for deployment
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    /// Paths to artifact files, keyed by contract name
    paths: HashMap<String, PathBuf>,
    /// Artifacts already held in memory, keyed by contract name
    loaded: HashMap<String, Artifact>,
}

impl ArtifactRegistry {
    /// Index every artifact file under the given directory
    pub fn load(dir: &Path) -> Result<Self, ScriptError> {
        if !dir.is_dir() {
            return Err(ScriptError::ArtifactParsing(format!(
                "artifacts directory {} does not exist",
                dir.display()
            )));
        }

        let mut paths: HashMap<String, PathBuf> = HashMap::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry.map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
            let path = entry.path();
            let Some(contract_name) = artifact_name(path) else {
                continue;
            };

            if let Some(existing) = paths.get(&contract_name) {
                warn!(
                    "duplicate artifact for `{}`: keeping {}, ignoring {}",
                    contract_name,
                    existing.display(),
                    path.display()
                );
                continue;
            }
            paths.insert(contract_name, path.to_path_buf());
        }

        debug!("indexed {} artifacts under {}", paths.len(), dir.display());
        Ok(Self {
            paths,
            loaded: HashMap::new(),
        })
    }

    /// Build a registry from artifacts already in memory
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        let loaded = artifacts
            .into_iter()
            .map(|artifact| (artifact.contract_name.clone(), artifact))
            .collect();

        Self {
            paths: HashMap::new(),
            loaded,
        }
    }

    /// Get the artifact for the given contract name
    pub fn get(&self, contract_name: &str) -> Result<Artifact, ScriptError> {
        if let Some(artifact) = self.loaded.get(contract_name) {
            return Ok(artifact.clone());
        }

        let path = self
            .paths
            .get(contract_name)
            .ok_or_else(|| ScriptError::MissingArtifact(contract_name.to_string()))?;

        parse_artifact_file(contract_name, path)
    }
}

/// The contract name an artifact file is indexed under, if it is an artifact file
fn artifact_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.ends_with(DEBUG_ARTIFACT_SUFFIX) {
        return None;
    }

    if path.extension()? != JSON_EXTENSION {
        return None;
    }

    path.file_stem()?.to_str().map(str::to_string)
}

/// Read and parse an artifact file
fn parse_artifact_file(contract_name: &str, path: &Path) -> Result<Artifact, ScriptError> {
    let contents =
        fs::read_to_string(path).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
    let raw: RawArtifact = serde_json::from_str(&contents).map_err(|e| {
        ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e))
    })?;

    Ok(Artifact {
        contract_name: contract_name.to_string(),
        abi: raw.abi,
        bytecode: raw.bytecode.into_bytes(),
    })
}
