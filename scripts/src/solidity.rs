//! Definitions of Solidity functions called during deployment

use alloy_sol_types::sol;

sol! {
    /// The subset of the proxy admin interface used to upgrade proxies
    interface IProxyAdmin {
        function owner() external view returns (address);
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }
}

pub use IProxyAdmin::{ownerCall, upgradeAndCallCall};
