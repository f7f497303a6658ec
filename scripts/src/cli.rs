//! Definitions of CLI arguments and commands for deploy scripts

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

use crate::{
    artifacts::ArtifactRegistry,
    commands::{check_plan, deploy_plan, plant_plan},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOY_TIMEOUT, DEFAULT_RPC_URL, NUM_DEPLOY_CONFIRMATIONS,
    },
    deployer::{DeployConfig, NetworkConfig},
    errors::DeployError,
    utils::read_plan,
};

/// Deploy the electronic plant contracts to an EVM chain
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory searched recursively for compiled contract artifacts
    #[arg(short, long, env = "ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// JSON deployment plan; defaults to the base contract followed by the factory
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Log verbosity
    #[arg(short, long, value_enum, default_value_t = Verbosity::Info)]
    pub verbosity: Verbosity,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The deploy script commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy every step of the plan, in order
    Deploy(DeployArgs),
    /// Validate the plan against the artifacts without touching the network
    Check,
}

impl Command {
    /// Load the plan and the artifacts, then run the command against them
    pub async fn run(self, artifacts: &Path, plan: Option<&Path>) -> Result<(), DeployError> {
        let plan = match plan {
            Some(path) => read_plan(path)?,
            None => plant_plan(),
        };
        let registry = ArtifactRegistry::load_dir(artifacts)?;

        match self {
            Command::Deploy(args) => deploy_plan(args, &plan, registry).await,
            Command::Check => check_plan(&plan, &registry),
        }
    }
}

/// Deploy the plan to a live network
#[derive(Args)]
pub struct DeployArgs {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// The chain ID the RPC endpoint must report
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// The number of confirmations to wait for on each deployment
    #[arg(
        long,
        default_value_t = NUM_DEPLOY_CONFIRMATIONS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub confirmations: u64,

    /// Seconds to wait for each deployment to be confirmed
    #[arg(
        long,
        default_value_t = DEFAULT_DEPLOY_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,
}

impl DeployArgs {
    /// The network and signing configuration
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            endpoint: self.rpc_url.clone(),
            chain_id: self.chain_id,
            credential: self.priv_key.clone(),
        }
    }

    /// The confirmation settings
    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            confirmations: self.confirmations,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// How much to log
#[derive(ValueEnum, Copy, Clone, Debug)]
pub enum Verbosity {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Progress of each deployment step
    Info,
    /// Transaction hashes and artifact loading
    Debug,
    /// Everything, including the RPC layer
    Trace,
}

impl Verbosity {
    /// The maximum level of events to log
    pub fn level(self) -> Level {
        match self {
            Verbosity::Error => Level::ERROR,
            Verbosity::Warn => Level::WARN,
            Verbosity::Info => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from([
            "deploy",
            "--plan",
            "plan.json",
            "deploy",
            "--priv-key",
            "0x01",
            "--chain-id",
            "11155111",
            "--timeout-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.plan, Some(PathBuf::from("plan.json")));
        let Command::Deploy(args) = cli.command else {
            panic!("expected the deploy command");
        };
        assert_eq!(args.network_config().chain_id, Some(11155111));
        assert_eq!(args.deploy_config().timeout, Duration::from_secs(30));
        assert_eq!(args.deploy_config().confirmations, NUM_DEPLOY_CONFIRMATIONS);
    }

    #[test]
    fn test_zero_waits_rejected() {
        for flag in ["--confirmations", "--timeout-secs"] {
            let parsed = Cli::try_parse_from(["deploy", "deploy", "--priv-key", "0x01", flag, "0"]);
            assert!(parsed.is_err(), "{flag} 0 should be rejected");
        }
    }
}
