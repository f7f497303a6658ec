//! Type definitions used throughout the scripts

use std::{
    collections::HashSet,
    fmt::{self, Display},
};

use alloy::primitives::{Address, TxHash};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// The results of a run, keyed by step name, in the order the steps executed
pub type Deployments = IndexMap<String, DeploymentResult>;

/// A constructor argument as declared in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructorArg {
    /// A value parsed against the constructor input's Solidity type
    Literal(String),
    /// The address produced by an earlier step, by step name
    Ref(String),
}

impl ConstructorArg {
    /// A literal argument
    pub fn literal(value: impl Into<String>) -> Self {
        ConstructorArg::Literal(value.into())
    }

    /// A reference to the address deployed by the named step
    pub fn reference(step: impl Into<String>) -> Self {
        ConstructorArg::Ref(step.into())
    }
}

/// A constructor argument once references have been substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedArg {
    /// A literal value, passed through from the plan unchanged
    Literal(String),
    /// The address of an already confirmed deployment
    Address(Address),
}

impl Display for ResolvedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedArg::Literal(s) => write!(f, "{}", s),
            ResolvedArg::Address(a) => write!(f, "{:#x}", a),
        }
    }
}

/// One contract to deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStep {
    /// The unique name of the step, used as the result key and reference target
    pub name: String,
    /// The artifact to instantiate, if it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// The constructor arguments, in order
    #[serde(default)]
    pub args: Vec<ConstructorArg>,
}

impl DeploymentStep {
    /// A step deploying the contract of the same name
    pub fn new(name: impl Into<String>, args: Vec<ConstructorArg>) -> Self {
        Self {
            name: name.into(),
            contract: None,
            args,
        }
    }

    /// Deploy a differently named artifact under this step's name
    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    /// The name of the artifact this step instantiates
    pub fn contract(&self) -> &str {
        self.contract.as_deref().unwrap_or(&self.name)
    }

    /// The step names this step's arguments refer to
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|arg| match arg {
            ConstructorArg::Ref(target) => Some(target.as_str()),
            ConstructorArg::Literal(_) => None,
        })
    }
}

/// An ordered list of deployment steps; order is execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// The steps, in execution order
    pub steps: Vec<DeploymentStep>,
}

impl DeploymentPlan {
    /// Create a plan from a list of steps
    pub fn new(steps: Vec<DeploymentStep>) -> Self {
        Self { steps }
    }

    /// Append a step to the end of the plan
    pub fn push(&mut self, step: DeploymentStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// The number of steps in the plan
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check that step names are unique and that every reference points
    /// strictly backwards in the plan
    pub fn validate(&self) -> Result<(), DeployError> {
        if let Some(dup) = self.steps.iter().map(|s| s.name.as_str()).duplicates().next() {
            return Err(DeployError::DuplicateStepName(dup.to_string()));
        }

        let mut earlier = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if let Some(target) = step.references().find(|t| !earlier.contains(t)) {
                return Err(DeployError::UnresolvedReference {
                    step: step.name.clone(),
                    target: target.to_string(),
                });
            }
            earlier.insert(step.name.as_str());
        }

        Ok(())
    }
}

/// A confirmed contract deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    /// The step name the deployment is recorded under
    pub name: String,
    /// The address the contract was created at
    pub address: Address,
    /// The hash of the creation transaction
    pub tx_hash: TxHash,
    /// Whether the network confirmed the contract code is present
    pub confirmed: bool,
}

impl Display for DeploymentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deployed to {:#x}", self.name, self.address)
    }
}
