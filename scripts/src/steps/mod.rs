//! Deploy steps, run in order by the step runner

use async_trait::async_trait;

use crate::{environment::DeployEnvironment, errors::ScriptError};

mod deploy_ssveth;

pub use deploy_ssveth::DeploySsvEth;

/// A unit of deployment work
#[async_trait]
pub trait DeployStep: Send + Sync {
    /// A human-readable name for logs
    fn name(&self) -> &'static str;

    /// The id under which the step is recorded once it reports itself complete
    fn id(&self) -> Option<&'static str> {
        None
    }

    /// The tags selecting the step
    fn tags(&self) -> &'static [&'static str] {
        &[]
    }

    /// Run the step, returning `true` if it must never run again on this network
    async fn run(&self, env: &mut dyn DeployEnvironment) -> Result<bool, ScriptError>;
}

/// Every deploy step, in execution order
pub fn all_steps() -> Vec<Box<dyn DeployStep>> {
    vec![Box::new(DeploySsvEth)]
}
