//! Constants used in the deploy scripts

// ---------------------
// | ssvETH deployment |
// ---------------------

/// The id under which the ssvETH deploy step is recorded once complete
pub const DEPLOY_SSVETH_STEP_ID: &str = "deploy_ssvETH";

/// The tag selecting the ssvETH deploy step
pub const SSVETH_TAG: &str = "ssvETH";

/// The deployment name of the ssvETH contract, also its artifact name
pub const SSVETH_DEPLOYMENT: &str = "ssvETH";

/// The deployment name of the proxy admin contract
pub const PROXY_ADMIN_DEPLOYMENT: &str = "ProxyAdmin";

/// The artifact deployed under the `ProxyAdmin` name
pub const PROXY_ADMIN_CONTRACT: &str = "ProxyAdmin2Step";

/// The proxy artifact wrapping upgradeable deployments
pub const TRANSPARENT_PROXY_CONTRACT: &str = "TransparentUpgradeableProxy";

/// The address of the saETH asset wrapped by ssvETH.
///
/// Kept as the literal string it is configured as; it is parsed at deploy time.
pub const SAETH_ADDRESS: &str = "0x92a38d33007896DbE401eF1Ac4986D811874C8B7";

/// The method invoked through the proxy after it is deployed
pub const SSVETH_INITIALIZER: &str = "initialize";

/// The ERC20 name passed to the ssvETH initializer
pub const SSVETH_TOKEN_NAME: &str = "dForce ssvETH";

/// The ERC20 symbol passed to the ssvETH initializer
pub const SSVETH_TOKEN_SYMBOL: &str = "ssvETH";

// ------------
// | Accounts |
// ------------

/// The named account that signs and pays for deployments
pub const DEPLOYER_ACCOUNT: &str = "deployer";

/// The key under which a named account's fallback entry is configured
pub const DEFAULT_ACCOUNT_KEY: &str = "default";

// ------------
// | Networks |
// ------------

/// The in-process development network, whose state is never persisted
pub const HARDHAT_NETWORK: &str = "hardhat";

/// The local development node network
pub const LOCALHOST_NETWORK: &str = "localhost";

/// The RPC URL used for development networks with no configured URL
pub const DEFAULT_DEV_RPC_URL: &str = "http://127.0.0.1:8545";

/// The RPC method mining a single block on development nodes
pub const EVM_MINE_METHOD: &str = "evm_mine";

// ---------------
// | Deployments |
// ---------------

/// The suffix of the deployment recording a proxied contract's implementation
pub const IMPLEMENTATION_SUFFIX: &str = "_Implementation";

/// The suffix of the deployment recording a proxied contract's proxy
pub const PROXY_SUFFIX: &str = "_Proxy";

/// The extension of artifact and ledger files
pub const JSON_EXTENSION: &str = "json";

/// The suffix of hardhat debug artifacts, which carry no ABI or bytecode
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";
