//! Runs deploy steps against an environment, honouring tags and the record
//! of steps that have completed for good

use tracing::{debug, info};

use crate::{
    environment::{DeployEnvironment, MigrationLog},
    errors::ScriptError,
    steps::DeployStep,
};

/// What happened during a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The names of the steps that ran
    pub ran: Vec<&'static str>,
    /// The names of the steps skipped because they were recorded as executed
    pub skipped: Vec<&'static str>,
    /// The ids recorded as executed during this run
    pub recorded: Vec<&'static str>,
}

/// Whether the step is selected by the given tags; no tags selects every step
fn is_selected(step: &dyn DeployStep, tags: &[String]) -> bool {
    tags.is_empty() || step.tags().iter().any(|tag| tags.iter().any(|t| t == tag))
}

/// Run the selected steps in order, stopping at the first failure
pub async fn run_steps<E>(
    steps: &[Box<dyn DeployStep>],
    tags: &[String],
    env: &mut E,
) -> Result<RunSummary, ScriptError>
where
    E: DeployEnvironment + MigrationLog,
{
    let mut summary = RunSummary::default();

    for step in steps.iter().filter(|step| is_selected(step.as_ref(), tags)) {
        if let Some(id) = step.id() {
            if env.has_executed(id) {
                info!("`{}` was already executed on `{}`, skipping", id, env.network_name());
                summary.skipped.push(step.name());
                continue;
            }
        }

        debug!("running deploy step `{}`", step.name());
        let completed = step.run(&mut *env).await?;
        summary.ran.push(step.name());

        if completed {
            let id = step
                .id()
                .ok_or_else(|| ScriptError::MissingStepId(step.name().to_string()))?;
            env.record_executed(id)?;
            summary.recorded.push(id);
        }
    }

    Ok(summary)
}
