//! Configuration for sweeps, the ledger client and the router client
//!
//! The sweep reserve and fee are conservative fixed estimates, not
//! queried from the network at call time. They live here as parameters
//! so a network fee change is a config edit, not a code change.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lamports kept behind in a swept account so it stays rent-exempt.
pub const DEFAULT_RENT_RESERVE: u64 = 890_880;

/// Conservative per-transaction fee estimate in lamports.
pub const DEFAULT_FEE_ESTIMATE: u64 = 5_000;

/// Default bound on how long a composed swap plan stays signable.
pub const DEFAULT_PLAN_MAX_AGE: Duration = Duration::from_secs(30);

/// Default deadline for any single network call.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

/// Amounts reserved before computing a sweep transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Minimum rent-exempt balance left in the source account.
    pub rent_reserve: u64,
    /// Fixed fee estimate subtracted from the transferred amount.
    pub fee_estimate: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            rent_reserve: DEFAULT_RENT_RESERVE,
            fee_estimate: DEFAULT_FEE_ESTIMATE,
        }
    }
}

impl SweepConfig {
    /// Spendable amount of `balance` after reserving rent and fee.
    /// Zero means "nothing to sweep", never an error.
    pub fn spendable(&self, balance: u64) -> u64 {
        balance.saturating_sub(self.rent_reserve.saturating_add(self.fee_estimate))
    }
}

/// Ledger RPC endpoint settings.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub timeout: Duration,
}

impl LedgerConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            timeout: DEFAULT_NETWORK_TIMEOUT,
        }
    }
}

/// Route-quoting service endpoint settings.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl RouterConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_NETWORK_TIMEOUT,
        }
    }
}
