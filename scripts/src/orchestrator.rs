//! Executing a deployment plan in dependency order

use alloy::primitives::Address;
use tracing::{error, info};

use crate::{
    deployer::Deployer,
    errors::{DeployError, RunError},
    types::{
        ConstructorArg, DeploymentPlan, DeploymentResult, DeploymentStep, Deployments,
        ResolvedArg,
    },
};

/// Where an orchestrator is in its single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// `run` has not been called
    NotStarted,
    /// Steps are being deployed
    Running,
    /// Every step was confirmed
    Completed,
    /// A step or the plan itself failed; the run was aborted
    Failed,
}

/// Runs a [`DeploymentPlan`] against a [`Deployer`], one step at a time
pub struct Orchestrator<D> {
    /// The deployer each step is handed to
    deployer: D,
    /// The state of the run
    state: RunState,
}

impl<D: Deployer> Orchestrator<D> {
    /// Create an orchestrator that has not yet run
    pub fn new(deployer: D) -> Self {
        Self {
            deployer,
            state: RunState::NotStarted,
        }
    }

    /// The state of the run
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The underlying deployer
    pub fn deployer(&self) -> &D {
        &self.deployer
    }

    /// Deploy every step of `plan` in order, stopping at the first failure.
    ///
    /// The plan is validated, and every contract and its arguments checked
    /// against the deployer, before anything is submitted. On failure the returned error carries
    /// every deployment confirmed before it; those contracts stay on-chain.
    pub async fn run(&mut self, plan: &DeploymentPlan) -> Result<Deployments, RunError> {
        if self.state != RunState::NotStarted {
            return Err(RunError {
                error: DeployError::RunAlreadyStarted,
                completed: Deployments::new(),
            });
        }

        self.state = RunState::Running;
        info!("deploying {} step(s)", plan.len());

        let mut deployments = Deployments::with_capacity(plan.len());
        match self.execute(plan, &mut deployments).await {
            Ok(()) => {
                self.state = RunState::Completed;
                info!("deployment complete");
                Ok(deployments)
            }
            Err(error) => {
                self.state = RunState::Failed;
                error!(
                    "deployment aborted after {} of {} step(s): {}",
                    deployments.len(),
                    plan.len(),
                    error
                );
                Err(RunError {
                    error,
                    completed: deployments,
                })
            }
        }
    }

    /// The body of a run; `deployments` collects results as steps confirm
    async fn execute(
        &self,
        plan: &DeploymentPlan,
        deployments: &mut Deployments,
    ) -> Result<(), DeployError> {
        plan.validate()?;
        if let Some(step) = plan
            .steps
            .iter()
            .find(|step| !self.deployer.supports(step.contract()))
        {
            return Err(DeployError::UnknownContract(step.contract().to_string()));
        }
        for step in &plan.steps {
            self.deployer.check_args(step.contract(), &placeholder_args(step))?;
        }

        for (i, step) in plan.steps.iter().enumerate() {
            let args = resolve_args(step, deployments)?;
            info!(
                "[{}/{}] deploying {} as {}",
                i + 1,
                plan.len(),
                step.contract(),
                step.name
            );

            let deployed = self.deployer.deploy(step.contract(), &args).await?;
            let result = DeploymentResult {
                name: step.name.clone(),
                ..deployed
            };

            info!("{result}");
            deployments.insert(step.name.clone(), result);
        }

        Ok(())
    }
}

/// Substitute each address reference in `step` with the confirmed address of
/// the step it names
pub fn resolve_args(
    step: &DeploymentStep,
    deployments: &Deployments,
) -> Result<Vec<ResolvedArg>, DeployError> {
    step.args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Literal(value) => Ok(ResolvedArg::Literal(value.clone())),
            ConstructorArg::Ref(target) => deployments
                .get(target)
                .filter(|d| d.confirmed)
                .map(|d| ResolvedArg::Address(d.address))
                .ok_or_else(|| DeployError::UnresolvedReference {
                    step: step.name.clone(),
                    target: target.clone(),
                }),
        })
        .collect()
}

/// Resolve the arguments of `step` for checking alone, with every reference
/// standing in as the zero address
pub fn placeholder_args(step: &DeploymentStep) -> Vec<ResolvedArg> {
    step.args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Literal(value) => ResolvedArg::Literal(value.clone()),
            ConstructorArg::Ref(_) => ResolvedArg::Address(Address::ZERO),
        })
        .collect()
}
