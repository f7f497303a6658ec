//! Constants used in the deploy scripts

use std::time::Duration;

/// The base (implementation) contract of the plant system
pub const BASE_CONTRACT: &str = "ElectronicPlantBase";

/// The factory contract, constructed with the base contract's address
pub const FACTORY_CONTRACT: &str = "ElectronicPlantFactory";

/// The default RPC endpoint, a local Anvil or Hardhat node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default directory searched for compiled artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The number of confirmations to wait for the contract deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// How long to wait for a deployment to be confirmed before giving up
pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(120);

/// The extension of an artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The suffix of the Hardhat debug files written alongside each artifact
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// How far in the future the lock's unlock time is set
pub const LOCK_DURATION: Duration = Duration::from_secs(60);

/// The amount reported as locked, in wei (0.001 ether)
pub const LOCKED_AMOUNT_WEI: u128 = 1_000_000_000_000_000;
