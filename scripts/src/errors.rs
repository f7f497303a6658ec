//! Definitions of errors that can occur while deploying the plant contracts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use crate::types::Deployments;

/// The reason a contract-creation transaction did not produce a contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The node refused the transaction, e.g. insufficient funds or a bad nonce
    Rejected(String),
    /// The transaction was included but the constructor reverted
    Reverted,
    /// No receipt arrived before the confirmation timeout elapsed
    Timeout,
    /// The receipt carries no contract address, or no code lives there
    NoCode,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected(s) => write!(f, "transaction rejected: {}", s),
            FailureReason::Reverted => write!(f, "constructor reverted"),
            FailureReason::Timeout => write!(f, "timed out awaiting confirmation"),
            FailureReason::NoCode => write!(f, "no contract code at the resulting address"),
        }
    }
}

/// Errors that can occur while running a deployment plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// No compiled artifact is known for the named contract
    UnknownContract(String),
    /// The constructor arguments do not match the constructor's ABI
    ArgumentMismatch {
        /// The contract being deployed
        contract: String,
        /// What did not match
        detail: String,
    },
    /// A step references a step that has not been deployed before it
    UnresolvedReference {
        /// The step holding the reference
        step: String,
        /// The referenced step name
        target: String,
    },
    /// Two steps in the plan share a name
    DuplicateStepName(String),
    /// The orchestrator was asked to run more than once
    RunAlreadyStarted,
    /// The network did not confirm a contract-creation transaction
    DeploymentFailed {
        /// The contract being deployed
        contract: String,
        /// Why the deployment failed
        reason: FailureReason,
    },
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error reading a deployment plan file
    ReadPlan(String),
}

impl DeployError {
    /// Whether the error was raised before anything was submitted to the network
    pub fn is_plan_error(&self) -> bool {
        matches!(
            self,
            DeployError::UnknownContract(_)
                | DeployError::ArgumentMismatch { .. }
                | DeployError::UnresolvedReference { .. }
                | DeployError::DuplicateStepName(_)
                | DeployError::RunAlreadyStarted
        )
    }
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::UnknownContract(s) => write!(f, "unknown contract: {}", s),
            DeployError::ArgumentMismatch { contract, detail } => {
                write!(f, "constructor arguments for {} do not match: {}", contract, detail)
            }
            DeployError::UnresolvedReference { step, target } => write!(
                f,
                "step {} references {}, which has not been deployed before it",
                step, target
            ),
            DeployError::DuplicateStepName(s) => write!(f, "duplicate step name: {}", s),
            DeployError::RunAlreadyStarted => write!(f, "deployment run already started"),
            DeployError::DeploymentFailed { contract, reason } => {
                write!(f, "error deploying {}: {}", contract, reason)
            }
            DeployError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            DeployError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            DeployError::ReadPlan(s) => write!(f, "error reading deployment plan: {}", s),
        }
    }
}

impl Error for DeployError {}

/// A failed run, along with everything deployed before the failure
///
/// Contracts in `completed` are live on-chain; they are not rolled back.
#[derive(Debug)]
pub struct RunError {
    /// The error that aborted the run
    pub error: DeployError,
    /// The deployments confirmed before the failing step
    pub completed: Deployments,
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} step(s) deployed)", self.error, self.completed.len())
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}
