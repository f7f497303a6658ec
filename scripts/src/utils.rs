//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};

use crate::{deployer::NetworkConfig, errors::DeployError, types::DeploymentPlan};

/// Sets up a signing provider for the configured network, returning it along
/// with the address it signs for.
///
/// Fails if the node reports a different chain ID than the one configured.
pub async fn setup_client(network: &NetworkConfig) -> Result<(DynProvider, Address), DeployError> {
    let signer = PrivateKeySigner::from_str(&network.credential)
        .map_err(|e| DeployError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();

    let url = Url::parse(&network.endpoint)
        .map_err(|e| DeployError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| DeployError::ClientInitialization(e.to_string()))?;
    check_chain_id(network.chain_id, chain_id)?;

    Ok((DynProvider::new(provider), sender))
}

/// Compare the chain ID reported by the node with the expected one, if any
pub fn check_chain_id(expected: Option<u64>, actual: u64) -> Result<(), DeployError> {
    match expected {
        Some(expected) if expected != actual => Err(DeployError::ClientInitialization(format!(
            "expected chain ID {expected}, but the endpoint reports {actual}"
        ))),
        _ => Ok(()),
    }
}

/// Read a deployment plan from a JSON file
pub fn read_plan(path: &Path) -> Result<DeploymentPlan, DeployError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| DeployError::ReadPlan(format!("{}: {}", path.display(), e)))?;

    serde_json::from_str(&contents)
        .map_err(|e| DeployError::ReadPlan(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConstructorArg;

    #[test]
    fn test_check_chain_id() {
        assert!(check_chain_id(None, 1).is_ok());
        assert!(check_chain_id(Some(11155111), 11155111).is_ok());
        assert!(matches!(
            check_chain_id(Some(1), 31337),
            Err(DeployError::ClientInitialization(_))
        ));
    }

    #[test]
    fn test_read_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(
            &path,
            r#"{ "steps": [ { "name": "A" }, { "name": "B", "contract": "Factory", "args": [ { "ref": "A" } ] } ] }"#,
        )
        .unwrap();

        let plan = read_plan(&path).unwrap();
        assert_eq!(plan.steps[1].contract(), "Factory");
        assert_eq!(plan.steps[1].args, vec![ConstructorArg::reference("A")]);
    }

    #[test]
    fn test_read_missing_plan() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_plan(&dir.path().join("missing.json")),
            Err(DeployError::ReadPlan(_))
        ));
    }
}
