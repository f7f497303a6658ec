//! The lock parameters reported alongside a deployment.
//!
//! These feed no constructor; they are computed once per run and only printed.

use std::{
    fmt::{self, Display},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use alloy::primitives::{utils::format_ether, Address, U256};

/// An unlock timestamp and the amount reported as locked until then
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockParams {
    /// Unix timestamp, in seconds, at which the lock opens
    pub unlock_time: u64,
    /// The locked amount, in wei
    pub locked_amount: U256,
}

impl LockParams {
    /// Compute the parameters for a lock opening `offset` after `now`
    ///
    /// `now` is rounded to the nearest second.
    pub fn compute(now: SystemTime, offset: Duration, locked_amount: U256) -> Self {
        let millis = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let now_secs = ((millis + 500) / 1000) as u64;

        Self {
            unlock_time: now_secs + offset.as_secs(),
            locked_amount,
        }
    }

    /// The report line for a lock alongside the contract deployed at `address`
    pub fn deployed_to(&self, address: Address) -> String {
        format!("{self} deployed to {address:#x}")
    }
}

impl Display for LockParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ether = format_ether(self.locked_amount);
        let ether = ether.trim_end_matches('0').trim_end_matches('.');
        write!(
            f,
            "Lock with {}ETH and unlock timestamp {}",
            ether, self.unlock_time
        )
    }
}
