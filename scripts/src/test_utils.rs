//! Helpers shared by the unit tests: an in-memory chain and a recording
//! deploy environment

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Mutex,
};

use alloy::{
    json_abi::JsonAbi,
    primitives::{address, keccak256, Address, Bytes, B256},
};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;

use crate::{
    artifacts::{Artifact, ArtifactRegistry},
    chain::{ChainClient, TxOutcome},
    config::{AccountSpec, NamedAccounts, NetworkSettings},
    deployments::Deployment,
    environment::{DeployEnvironment, DeployOptions, MigrationLog},
    errors::ScriptError,
    solidity::ownerCall,
};

/// The first default development account
pub const DEPLOYER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// The gas reported for every fake transaction
const FAKE_GAS_USED: u64 = 21_000;

const PROXY_ADMIN_ABI: &str = r#"[
    {
        "type": "function",
        "name": "owner",
        "inputs": [],
        "outputs": [{ "name": "", "type": "address" }],
        "stateMutability": "view"
    },
    {
        "type": "function",
        "name": "upgradeAndCall",
        "inputs": [
            { "name": "proxy", "type": "address" },
            { "name": "implementation", "type": "address" },
            { "name": "data", "type": "bytes" }
        ],
        "outputs": [],
        "stateMutability": "payable"
    }
]"#;

const VAULT_ABI: &str = r#"[
    {
        "type": "constructor",
        "inputs": [{ "name": "asset", "type": "address" }],
        "stateMutability": "nonpayable"
    },
    {
        "type": "function",
        "name": "initialize",
        "inputs": [
            { "name": "name", "type": "string" },
            { "name": "symbol", "type": "string" }
        ],
        "outputs": [],
        "stateMutability": "nonpayable"
    }
]"#;

const PROXY_ABI: &str = r#"[
    {
        "type": "constructor",
        "inputs": [
            { "name": "_logic", "type": "address" },
            { "name": "admin_", "type": "address" },
            { "name": "_data", "type": "bytes" }
        ],
        "stateMutability": "payable"
    }
]"#;

/// The settings of a network with the given name and liveness
pub fn network(name: &str, live: bool) -> NetworkSettings {
    NetworkSettings {
        name: name.to_string(),
        rpc_url: "http://127.0.0.1:8545".to_string(),
        live,
    }
}

/// Named accounts mapping `deployer` to [`DEPLOYER`]
pub fn test_accounts() -> NamedAccounts {
    let specs = BTreeMap::from([("deployer".to_string(), AccountSpec::Index(0))]);
    NamedAccounts::new(specs, "localhost", vec![DEPLOYER])
}

/// The proxy admin, proxy, and ssvETH artifacts, with the given ssvETH bytecode
pub fn test_artifacts(vault_bytecode: &[u8]) -> ArtifactRegistry {
    let artifact = |name: &str, abi: &str, bytecode: &[u8]| Artifact {
        contract_name: name.to_string(),
        abi: serde_json::from_str::<JsonAbi>(abi).unwrap(),
        bytecode: Bytes::copy_from_slice(bytecode),
    };

    ArtifactRegistry::from_artifacts([
        artifact("ProxyAdmin2Step", PROXY_ADMIN_ABI, &[0x01]),
        artifact("ssvETH", VAULT_ABI, vault_bytecode),
        artifact("TransparentUpgradeableProxy", PROXY_ABI, &[0x03]),
    ])
}

// --------------
// | Fake chain |
// --------------

/// A transaction sent to an existing contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTx {
    /// The sender
    pub from: Address,
    /// The recipient contract
    pub to: Address,
    /// The calldata
    pub data: Bytes,
}

/// The mutable state of a [`FakeChain`]
#[derive(Default)]
struct FakeChainState {
    nonces: HashMap<Address, u64>,
    code: HashMap<Address, Bytes>,
    owners: HashMap<Address, Address>,
    deployed: Vec<Bytes>,
    sent: Vec<SentTx>,
    tx_count: u64,
    mined_blocks: usize,
}

/// An in-memory chain: contracts get `CREATE` addresses, their code is the
/// init code they were deployed with, and every contract is owned by its deployer
pub struct FakeChain {
    chain_id: u64,
    state: Mutex<FakeChainState>,
}

impl FakeChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: Mutex::default(),
        }
    }

    /// The init code of every contract creation, in order
    pub fn deployed_init_codes(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().deployed.clone()
    }

    /// Every non-creation transaction, in order
    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn mined_blocks(&self) -> usize {
        self.state.lock().unwrap().mined_blocks
    }

    /// Drop all code and nonces, as a restarted development node would
    pub fn wipe(&self) {
        let mut state = self.state.lock().unwrap();
        state.nonces.clear();
        state.code.clear();
        state.owners.clear();
    }

    /// Record a mined transaction and return its hash
    fn mine_tx(state: &mut FakeChainState, auto_mine: bool) -> B256 {
        state.tx_count += 1;
        if auto_mine {
            state.mined_blocks += 1;
        }
        keccak256(state.tx_count.to_be_bytes())
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn chain_id(&self) -> Result<u64, ScriptError> {
        Ok(self.chain_id)
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError> {
        let state = self.state.lock().unwrap();
        Ok(state.code.get(&address).cloned().unwrap_or_default())
    }

    async fn deploy(
        &self,
        from: Address,
        init_code: Bytes,
        auto_mine: bool,
    ) -> Result<TxOutcome, ScriptError> {
        let mut state = self.state.lock().unwrap();
        let nonce = state.nonces.entry(from).or_default();
        let address = from.create(*nonce);
        *nonce += 1;

        state.code.insert(address, init_code.clone());
        state.owners.insert(address, from);
        state.deployed.push(init_code);

        Ok(TxOutcome {
            transaction_hash: Self::mine_tx(&mut state, auto_mine),
            contract_address: Some(address),
            gas_used: FAKE_GAS_USED,
        })
    }

    async fn send(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        auto_mine: bool,
    ) -> Result<TxOutcome, ScriptError> {
        let mut state = self.state.lock().unwrap();
        if !state.code.contains_key(&to) {
            return Err(ScriptError::ContractInteraction(format!("no code at {}", to)));
        }

        state.sent.push(SentTx { from, to, data });
        Ok(TxOutcome {
            transaction_hash: Self::mine_tx(&mut state, auto_mine),
            contract_address: None,
            gas_used: FAKE_GAS_USED,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError> {
        let state = self.state.lock().unwrap();
        if !data.starts_with(&ownerCall::SELECTOR) {
            return Err(ScriptError::ContractInteraction("unsupported call".to_string()));
        }

        state
            .owners
            .get(&to)
            .map(|owner| owner.abi_encode().into())
            .ok_or_else(|| ScriptError::ContractInteraction(format!("no code at {}", to)))
    }
}

// -------------------------
// | Recording environment |
// -------------------------

/// A [`DeployEnvironment`] recording every deploy request, deploying nothing
#[derive(Debug, Default)]
pub struct RecordingEnvironment {
    /// Whether the network is live
    pub live: bool,
    /// Named accounts
    pub accounts: BTreeMap<String, Address>,
    /// Every deploy request, in order
    pub requests: Vec<(String, DeployOptions)>,
    /// The step ids recorded as executed
    pub executed: BTreeSet<String>,
    /// A deployment name whose deploy request fails
    pub fail_on: Option<String>,
}

impl RecordingEnvironment {
    /// An environment with `deployer` configured
    pub fn new(live: bool) -> Self {
        Self {
            live,
            accounts: BTreeMap::from([("deployer".to_string(), DEPLOYER)]),
            ..Default::default()
        }
    }

    /// The names of the requested deployments, in order
    pub fn requested_names(&self) -> Vec<&str> {
        self.requests.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[async_trait]
impl DeployEnvironment for RecordingEnvironment {
    fn network_name(&self) -> &str {
        if self.live {
            "mainnet"
        } else {
            "localhost"
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn named_account(&self, name: &str) -> Result<Address, ScriptError> {
        self.accounts
            .get(name)
            .copied()
            .ok_or_else(|| ScriptError::UnknownNamedAccount(name.to_string()))
    }

    async fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> Result<Deployment, ScriptError> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(ScriptError::ContractDeployment(format!("{} reverted", name)));
        }

        self.requests.push((name.to_string(), options));
        Ok(Deployment {
            address: Address::with_last_byte(self.requests.len() as u8),
            abi: JsonAbi::default(),
            transaction_hash: None,
            args_data: Bytes::new(),
            init_code_hash: B256::ZERO,
            implementation: None,
        })
    }
}

impl MigrationLog for RecordingEnvironment {
    fn has_executed(&self, step_id: &str) -> bool {
        self.executed.contains(step_id)
    }

    fn record_executed(&mut self, step_id: &str) -> Result<(), ScriptError> {
        self.executed.insert(step_id.to_string());
        Ok(())
    }
}
