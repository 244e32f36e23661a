//! The chain access used by the deployment environment

use std::str::FromStr;

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use tracing::debug;

use crate::{constants::EVM_MINE_METHOD, errors::ScriptError};

/// The result of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// The transaction hash
    pub transaction_hash: B256,
    /// The address of the created contract, for deployments
    pub contract_address: Option<Address>,
    /// The gas used by the transaction
    pub gas_used: u64,
}

/// The chain operations needed to deploy and upgrade contracts
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The chain ID of the network
    async fn chain_id(&self) -> Result<u64, ScriptError>;

    /// The runtime code at the given address, empty if there is none
    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError>;

    /// Send a contract creation transaction and wait for it to be mined
    async fn deploy(
        &self,
        from: Address,
        init_code: Bytes,
        auto_mine: bool,
    ) -> Result<TxOutcome, ScriptError>;

    /// Send a transaction to a contract and wait for it to be mined
    async fn send(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        auto_mine: bool,
    ) -> Result<TxOutcome, ScriptError>;

    /// Execute a read-only call against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError>;
}

/// A [`ChainClient`] talking to a JSON-RPC node over HTTP, signing with local keys
pub struct RpcChainClient {
    /// The provider, with a wallet holding every configured signer
    provider: DynProvider,
    /// The addresses of the configured signers, in the order they were given
    signers: Vec<Address>,
}

impl RpcChainClient {
    /// Connect to the given RPC URL, signing with the given private keys
    pub fn new(rpc_url: &str, priv_keys: &[String]) -> Result<Self, ScriptError> {
        let url =
            Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

        let mut keys = priv_keys
            .iter()
            .map(|key| PrivateKeySigner::from_str(key.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
            .into_iter();

        let first = keys.next().ok_or_else(|| {
            ScriptError::ClientInitialization("no private keys configured".to_string())
        })?;

        let mut signers = vec![first.address()];
        let mut wallet = EthereumWallet::from(first);
        for key in keys {
            signers.push(key.address());
            wallet.register_signer(key);
        }

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);
        Ok(Self {
            provider: DynProvider::new(provider),
            signers,
        })
    }

    /// The addresses of the configured signers
    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    /// Send a transaction, mine it if requested, and wait for a successful receipt
    async fn send_and_confirm(
        &self,
        tx: TransactionRequest,
        auto_mine: bool,
        to_error: fn(String) -> ScriptError,
    ) -> Result<TxOutcome, ScriptError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| to_error(e.to_string()))?;
        let transaction_hash = *pending.tx_hash();
        debug!("sent transaction {}", transaction_hash);

        if auto_mine {
            self.mine().await?;
        }

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| to_error(e.to_string()))?;
        if !receipt.status() {
            return Err(to_error(format!("transaction {} reverted", transaction_hash)));
        }

        Ok(TxOutcome {
            transaction_hash,
            contract_address: receipt.contract_address,
            gas_used: receipt.gas_used,
        })
    }

    /// Ask a development node to mine a block
    async fn mine(&self) -> Result<(), ScriptError> {
        self.provider
            .raw_request::<_, serde_json::Value>(
                EVM_MINE_METHOD.into(),
                Vec::<serde_json::Value>::new(),
            )
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> Result<u64, ScriptError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ScriptError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn deploy(
        &self,
        from: Address,
        init_code: Bytes,
        auto_mine: bool,
    ) -> Result<TxOutcome, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(init_code);
        let outcome = self
            .send_and_confirm(tx, auto_mine, ScriptError::ContractDeployment)
            .await?;

        if outcome.contract_address.is_none() {
            return Err(ScriptError::ContractDeployment(format!(
                "no contract address in receipt of {}",
                outcome.transaction_hash
            )));
        }
        Ok(outcome)
    }

    async fn send(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        auto_mine: bool,
    ) -> Result<TxOutcome, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data);
        self.send_and_confirm(tx, auto_mine, ScriptError::ContractInteraction)
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.provider
            .call(tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}
