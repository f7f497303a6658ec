//! Implementations of the deploy script commands

use std::time::SystemTime;

use alloy::primitives::U256;
use tracing::info;

use crate::{
    artifacts::ArtifactRegistry,
    cli::DeployArgs,
    constants::{BASE_CONTRACT, FACTORY_CONTRACT, LOCKED_AMOUNT_WEI, LOCK_DURATION},
    deployer::RpcDeployer,
    errors::DeployError,
    lock::LockParams,
    orchestrator::{placeholder_args, Orchestrator},
    types::{ConstructorArg, DeploymentPlan, DeploymentStep, Deployments},
};

/// The default plan: the base contract, then the factory constructed with
/// the base contract's address
pub fn plant_plan() -> DeploymentPlan {
    DeploymentPlan::new(vec![
        DeploymentStep::new(BASE_CONTRACT, vec![]),
        DeploymentStep::new(
            FACTORY_CONTRACT,
            vec![ConstructorArg::reference(BASE_CONTRACT)],
        ),
    ])
}

/// Deploy every step of `plan`, printing each deployed address.
///
/// On failure the deployments confirmed before it are still printed, since
/// those contracts remain on-chain. The lock line names the first deployed
/// contract.
pub async fn deploy_plan(
    args: DeployArgs,
    plan: &DeploymentPlan,
    registry: ArtifactRegistry,
) -> Result<(), DeployError> {
    let deployer =
        RpcDeployer::connect(&args.network_config(), registry, args.deploy_config()).await?;

    let lock = LockParams::compute(
        SystemTime::now(),
        LOCK_DURATION,
        U256::from(LOCKED_AMOUNT_WEI),
    );

    let mut orchestrator = Orchestrator::new(deployer);
    let (deployments, result) = match orchestrator.run(plan).await {
        Ok(deployments) => (deployments, Ok(())),
        Err(e) => (e.completed, Err(e.error)),
    };

    print_deployments(&deployments);
    if let Some((_, first)) = deployments.first() {
        info!("{}", lock.deployed_to(first.address));
    }
    result
}

/// Check that `plan` is well formed and that every step's arguments fit its
/// contract's constructor, without connecting to a network.
///
/// References are checked against the constructor's types using a
/// placeholder address.
pub fn check_plan(plan: &DeploymentPlan, registry: &ArtifactRegistry) -> Result<(), DeployError> {
    plan.validate()?;

    for step in &plan.steps {
        let artifact = registry
            .get(step.contract())
            .ok_or_else(|| DeployError::UnknownContract(step.contract().to_string()))?;

        artifact.deploy_code(&placeholder_args(step))?;

        println!("{} ({}) ok", step.name, step.contract());
    }

    Ok(())
}

/// Print each deployment on its own line, in plan order
fn print_deployments(deployments: &Deployments) {
    for result in deployments.values() {
        println!("{result}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{
        tests::{BASE_ARTIFACT, FACTORY_ARTIFACT},
        ContractArtifact,
    };

    /// A registry holding both plant contracts
    fn plant_registry() -> ArtifactRegistry {
        let mut registry = ArtifactRegistry::default();
        registry.insert(ContractArtifact::from_json(BASE_ARTIFACT, BASE_CONTRACT).unwrap());
        registry.insert(ContractArtifact::from_json(FACTORY_ARTIFACT, FACTORY_CONTRACT).unwrap());
        registry
    }

    #[test]
    fn test_default_plan() {
        let plan = plant_plan();

        assert_eq!(plan.validate(), Ok(()));
        assert_eq!(plan.steps[0].name, BASE_CONTRACT);
        assert_eq!(
            plan.steps[1].references().collect::<Vec<_>>(),
            vec![BASE_CONTRACT]
        );
    }

    #[test]
    fn test_check_default_plan() {
        assert_eq!(check_plan(&plant_plan(), &plant_registry()), Ok(()));
    }

    #[test]
    fn test_check_unknown_contract() {
        let plan = DeploymentPlan::new(vec![DeploymentStep::new("Missing", vec![])]);
        assert_eq!(
            check_plan(&plan, &plant_registry()),
            Err(DeployError::UnknownContract("Missing".to_string()))
        );
    }

    #[test]
    fn test_check_literal_for_address() {
        let plan = DeploymentPlan::new(vec![DeploymentStep::new(
            FACTORY_CONTRACT,
            vec![ConstructorArg::literal("not an address")],
        )]);

        assert!(matches!(
            check_plan(&plan, &plant_registry()),
            Err(DeployError::ArgumentMismatch { .. })
        ));
    }
}
