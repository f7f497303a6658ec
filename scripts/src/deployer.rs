//! Submitting contract-creation transactions and awaiting their confirmation

use std::{fmt, future::Future, time::Duration};

use alloy::{
    network::TransactionBuilder,
    primitives::Bytes,
    providers::{DynProvider, Provider},
    rpc::types::TransactionRequest,
};
use tracing::{debug, info};

use crate::{
    artifacts::{ArtifactRegistry, ContractArtifact},
    constants::{DEFAULT_DEPLOY_TIMEOUT, NUM_DEPLOY_CONFIRMATIONS},
    errors::{DeployError, FailureReason},
    types::{DeploymentResult, ResolvedArg},
    utils::setup_client,
};

/// The network and signing configuration of a deployment
#[derive(Clone)]
pub struct NetworkConfig {
    /// The RPC endpoint of the target network
    pub endpoint: String,
    /// The chain ID the endpoint is expected to report, if any
    pub chain_id: Option<u64>,
    /// The hex-encoded private key deployments are signed with
    pub credential: String,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("endpoint", &self.endpoint)
            .field("chain_id", &self.chain_id)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// How long, and how deeply, to wait for each deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployConfig {
    /// The number of confirmations required before a deployment counts
    pub confirmations: u64,
    /// How long to wait for each deployment, from submission to the code check
    pub timeout: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            confirmations: NUM_DEPLOY_CONFIRMATIONS,
            timeout: DEFAULT_DEPLOY_TIMEOUT,
        }
    }
}

/// Turns one contract name and its resolved constructor arguments into one
/// confirmed deployment
pub trait Deployer {
    /// Whether `contract` names something this deployer can create
    fn supports(&self, _contract: &str) -> bool {
        true
    }

    /// Check that `args` fit the constructor of `contract`, without submitting
    /// anything
    fn check_args(&self, _contract: &str, _args: &[ResolvedArg]) -> Result<(), DeployError> {
        Ok(())
    }

    /// Submit a single creation transaction for `contract` and wait until the
    /// network confirms the contract exists
    fn deploy(
        &self,
        contract: &str,
        args: &[ResolvedArg],
    ) -> impl Future<Output = Result<DeploymentResult, DeployError>> + Send;
}

/// A [`Deployer`] that creates contracts from compiled artifacts over JSON-RPC
pub struct RpcDeployer {
    /// The signing provider connected to the target network
    provider: DynProvider,
    /// The contracts that can be deployed
    registry: ArtifactRegistry,
    /// Confirmation depth and timeout
    config: DeployConfig,
}

impl RpcDeployer {
    /// Connect to the configured network
    pub async fn connect(
        network: &NetworkConfig,
        registry: ArtifactRegistry,
        config: DeployConfig,
    ) -> Result<Self, DeployError> {
        let (provider, sender) = setup_client(network).await?;
        info!("deploying from {sender:#x} via {}", network.endpoint);

        Ok(Self {
            provider,
            registry,
            config,
        })
    }

    /// Submit the creation transaction, await its receipt and check that code
    /// exists at the created address
    async fn submit(&self, contract: &str, code: Bytes) -> Result<DeploymentResult, DeployError> {
        let failed = |reason: FailureReason| DeployError::DeploymentFailed {
            contract: contract.to_string(),
            reason,
        };

        let tx = TransactionRequest::default().with_deploy_code(code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| failed(FailureReason::Rejected(e.to_string())))?;

        let tx_hash = *pending.tx_hash();
        debug!("{contract} creation transaction submitted: {tx_hash:#x}");

        let receipt = pending
            .with_required_confirmations(self.config.confirmations)
            .get_receipt()
            .await
            .map_err(|e| failed(FailureReason::Rejected(e.to_string())))?;

        if !receipt.status() {
            return Err(failed(FailureReason::Reverted));
        }
        let address = receipt
            .contract_address
            .ok_or_else(|| failed(FailureReason::NoCode))?;

        // The receipt alone does not prove the code is observable at the address
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| failed(FailureReason::Rejected(e.to_string())))?;
        if code.is_empty() {
            return Err(failed(FailureReason::NoCode));
        }

        Ok(DeploymentResult {
            name: contract.to_string(),
            address,
            tx_hash,
            confirmed: true,
        })
    }

    /// The artifact for `contract`
    fn artifact(&self, contract: &str) -> Result<&ContractArtifact, DeployError> {
        self.registry
            .get(contract)
            .ok_or_else(|| DeployError::UnknownContract(contract.to_string()))
    }
}

impl Deployer for RpcDeployer {
    fn supports(&self, contract: &str) -> bool {
        self.registry.contains(contract)
    }

    fn check_args(&self, contract: &str, args: &[ResolvedArg]) -> Result<(), DeployError> {
        self.artifact(contract)?.deploy_code(args).map(|_| ())
    }

    async fn deploy(
        &self,
        contract: &str,
        args: &[ResolvedArg],
    ) -> Result<DeploymentResult, DeployError> {
        let code = self.artifact(contract)?.deploy_code(args)?;

        // Bounds every call to the node, not just the wait for the receipt
        tokio::time::timeout(self.config.timeout, self.submit(contract, code))
            .await
            .unwrap_or_else(|_| {
                Err(DeployError::DeploymentFailed {
                    contract: contract.to_string(),
                    reason: FailureReason::Timeout,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted() {
        let network = NetworkConfig {
            endpoint: "http://127.0.0.1:8545".to_string(),
            chain_id: Some(31337),
            credential: "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .to_string(),
        };

        let debug = format!("{network:?}");
        assert!(!debug.contains("ac0974"));
        assert!(debug.contains("31337"));
    }
}
