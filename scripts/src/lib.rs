//! Scripts for deploying the electronic plant contracts in dependency order.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod constants;
pub mod deployer;
pub mod errors;
pub mod lock;
pub mod orchestrator;
pub mod types;
pub mod utils;

pub use commands::{check_plan, plant_plan};
