//! Deploys the ssvETH vault wrapper.
//!
//! On development networks ssvETH sits behind a `TransparentUpgradeableProxy`
//! administered by `ProxyAdmin`, so its code can be replaced in place and the
//! step re-runs on every invocation. On live networks the environment ignores
//! the proxy, the constructor is invoked directly, and the step is recorded as
//! executed so it never runs again.

use std::str::FromStr;

use alloy::{dyn_abi::DynSolValue, primitives::Address};
use async_trait::async_trait;
use tracing::info;

use crate::{
    constants::{
        DEPLOYER_ACCOUNT, DEPLOY_SSVETH_STEP_ID, PROXY_ADMIN_CONTRACT, PROXY_ADMIN_DEPLOYMENT,
        SAETH_ADDRESS, SSVETH_DEPLOYMENT, SSVETH_INITIALIZER, SSVETH_TAG, SSVETH_TOKEN_NAME,
        SSVETH_TOKEN_SYMBOL, TRANSPARENT_PROXY_CONTRACT,
    },
    environment::{DeployEnvironment, DeployOptions, ProxyInit, ProxyOptions},
    errors::ScriptError,
};

use super::DeployStep;

/// The ssvETH deploy step
pub struct DeploySsvEth;

#[async_trait]
impl DeployStep for DeploySsvEth {
    fn name(&self) -> &'static str {
        "deploy_ssveth"
    }

    fn id(&self) -> Option<&'static str> {
        Some(DEPLOY_SSVETH_STEP_ID)
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SSVETH_TAG]
    }

    async fn run(&self, env: &mut dyn DeployEnvironment) -> Result<bool, ScriptError> {
        let deployer = env.named_account(DEPLOYER_ACCOUNT)?;
        info!("Deployer address is: {}", deployer);

        let use_proxy = !env.is_live();
        let sa_eth = Address::from_str(SAETH_ADDRESS)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

        env.deploy(PROXY_ADMIN_DEPLOYMENT, proxy_admin_options(deployer))
            .await?;
        env.deploy(SSVETH_DEPLOYMENT, ssveth_options(deployer, sa_eth))
            .await?;

        Ok(!use_proxy)
    }
}

/// The `ProxyAdmin` request, deployed once and reused from then on
fn proxy_admin_options(deployer: Address) -> DeployOptions {
    DeployOptions::new(deployer)
        .contract(PROXY_ADMIN_CONTRACT)
        .log(true)
        .skip_if_already_deployed(true)
}

/// The `ssvETH` request. The proxy is always described; whether it is used is
/// up to the environment.
fn ssveth_options(deployer: Address, sa_eth: Address) -> DeployOptions {
    DeployOptions::new(deployer)
        .args(vec![DynSolValue::Address(sa_eth)])
        .proxy(ProxyOptions {
            owner: deployer,
            proxy_contract: TRANSPARENT_PROXY_CONTRACT.to_string(),
            via_admin_contract: PROXY_ADMIN_DEPLOYMENT.to_string(),
            init: Some(ProxyInit {
                method_name: SSVETH_INITIALIZER.to_string(),
                args: vec![
                    DynSolValue::String(SSVETH_TOKEN_NAME.to_string()),
                    DynSolValue::String(SSVETH_TOKEN_SYMBOL.to_string()),
                ],
            }),
        })
        .log(true)
        .auto_mine(true)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::{
        config::{DeployConfig, NamedAccounts},
        deployments::DeploymentsLedger,
        environment::ChainEnvironment,
        test_utils::{
            network, test_accounts, test_artifacts, FakeChain, RecordingEnvironment, DEPLOYER,
        },
    };

    const SAETH: Address = address!("0x92a38d33007896DbE401eF1Ac4986D811874C8B7");

    #[test]
    fn test_saeth_literal() {
        assert_eq!(SAETH_ADDRESS, "0x92a38d33007896DbE401eF1Ac4986D811874C8B7");
        assert_eq!(Address::from_str(SAETH_ADDRESS).unwrap(), SAETH);
    }

    #[test]
    fn test_metadata() {
        assert_eq!(DeploySsvEth.id(), Some("deploy_ssvETH"));
        assert_eq!(DeploySsvEth.tags(), &["ssvETH"]);
    }

    #[tokio::test]
    async fn test_dev_network_returns_false() {
        let mut env = RecordingEnvironment::new(false /* live */);

        let done = DeploySsvEth.run(&mut env).await.unwrap();

        assert!(!done);
        assert_eq!(env.requested_names(), vec!["ProxyAdmin", "ssvETH"]);
        assert!(env.requests[1].1.proxy.is_some());
    }

    #[tokio::test]
    async fn test_live_network_returns_true() {
        let mut env = RecordingEnvironment::new(true /* live */);

        let done = DeploySsvEth.run(&mut env).await.unwrap();

        assert!(done);
        assert_eq!(env.requested_names(), vec!["ProxyAdmin", "ssvETH"]);
        // The proxy is still described; the environment decides to ignore it
        assert!(env.requests[1].1.proxy.is_some());
    }

    #[tokio::test]
    async fn test_proxy_admin_request() {
        let mut env = RecordingEnvironment::new(false /* live */);
        DeploySsvEth.run(&mut env).await.unwrap();

        let (name, options) = &env.requests[0];
        assert_eq!(name, "ProxyAdmin");
        assert_eq!(options.from, DEPLOYER);
        assert_eq!(options.contract.as_deref(), Some("ProxyAdmin2Step"));
        assert!(options.args.is_empty());
        assert!(options.skip_if_already_deployed);
        assert!(options.proxy.is_none());
    }

    #[tokio::test]
    async fn test_ssveth_request() {
        let mut env = RecordingEnvironment::new(false /* live */);
        DeploySsvEth.run(&mut env).await.unwrap();

        let (name, options) = &env.requests[1];
        assert_eq!(name, "ssvETH");
        assert_eq!(options.from, DEPLOYER);
        assert_eq!(options.contract, None);
        assert_eq!(options.args, vec![DynSolValue::Address(SAETH)]);
        assert!(options.auto_mine);

        let proxy = options.proxy.as_ref().unwrap();
        assert_eq!(proxy.owner, DEPLOYER);
        assert_eq!(proxy.proxy_contract, "TransparentUpgradeableProxy");
        assert_eq!(proxy.via_admin_contract, "ProxyAdmin");

        let init = proxy.init.as_ref().unwrap();
        assert_eq!(init.method_name, "initialize");
        assert_eq!(
            init.args,
            vec![
                DynSolValue::String("dForce ssvETH".to_string()),
                DynSolValue::String("ssvETH".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_requests_identical_across_runs() {
        let mut env = RecordingEnvironment::new(false /* live */);

        assert!(!DeploySsvEth.run(&mut env).await.unwrap());
        assert!(!DeploySsvEth.run(&mut env).await.unwrap());

        assert_eq!(env.requests.len(), 4);
        assert_eq!(env.requests[0], env.requests[2]);
        assert_eq!(env.requests[1], env.requests[3]);
    }

    #[tokio::test]
    async fn test_missing_deployer() {
        let mut env = RecordingEnvironment::new(false /* live */);
        env.accounts.clear();

        let result = DeploySsvEth.run(&mut env).await;

        assert!(matches!(
            result,
            Err(ScriptError::UnknownNamedAccount(name)) if name == "deployer"
        ));
        assert!(env.requests.is_empty());
    }

    #[tokio::test]
    async fn test_deploy_failure_propagates() {
        let mut env = RecordingEnvironment::new(false /* live */);
        env.fail_on = Some("ProxyAdmin".to_string());

        let result = DeploySsvEth.run(&mut env).await;

        assert!(matches!(result, Err(ScriptError::ContractDeployment(_))));
        assert!(env.requests.is_empty());
    }

    #[tokio::test]
    async fn test_rerun_on_dev_chain_reuses_proxy_admin() {
        let mut env = ChainEnvironment::new(
            network("localhost", false),
            test_accounts(),
            test_artifacts(&[0x02]),
            DeploymentsLedger::in_memory(),
            FakeChain::new(31337),
        )
        .await
        .unwrap();

        assert!(!DeploySsvEth.run(&mut env).await.unwrap());
        let admin = env.ledger().get("ProxyAdmin").cloned().unwrap();
        let vault = env.ledger().get("ssvETH").cloned().unwrap();

        assert!(!DeploySsvEth.run(&mut env).await.unwrap());
        assert_eq!(env.ledger().get("ProxyAdmin"), Some(&admin));
        assert_eq!(env.ledger().get("ssvETH"), Some(&vault));

        // Admin, implementation, and proxy, each created once
        assert_eq!(env.chain().deployed_init_codes().len(), 3);
    }

    #[tokio::test]
    async fn test_live_chain_deploys_without_proxy() {
        let mut env = ChainEnvironment::new(
            network("mainnet", true),
            test_accounts(),
            test_artifacts(&[0x02]),
            DeploymentsLedger::in_memory(),
            FakeChain::new(1),
        )
        .await
        .unwrap();

        assert!(DeploySsvEth.run(&mut env).await.unwrap());

        let vault = env.ledger().get("ssvETH").unwrap();
        assert_eq!(vault.implementation, None);
        assert!(env.ledger().get("ssvETH_Proxy").is_none());
        assert_eq!(env.chain().deployed_init_codes().len(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_deployer_fails_before_deploying() {
        let config: DeployConfig = serde_json::from_str(r#"{ "networks": {} }"#).unwrap();
        let accounts =
            NamedAccounts::new(config.named_account_specs(), "localhost", vec![DEPLOYER]);
        let mut env = ChainEnvironment::new(
            network("localhost", false),
            accounts,
            test_artifacts(&[0x02]),
            DeploymentsLedger::in_memory(),
            FakeChain::new(31337),
        )
        .await
        .unwrap();

        let result = DeploySsvEth.run(&mut env).await;

        assert!(matches!(
            result,
            Err(ScriptError::UnknownNamedAccount(name)) if name == "deployer"
        ));
        assert!(env.chain().deployed_init_codes().is_empty());
        assert!(env.ledger().get("ProxyAdmin").is_none());
    }
}
