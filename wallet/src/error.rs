//! Error taxonomy for the wallet core
//!
//! Every manager operation returns a tagged failure from this enum, never
//! an untyped panic across the API boundary. The kinds are distinct so a
//! caller can tell a locally-detectable problem (validation, insufficient
//! funds) from a transport failure worth retrying.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    /// Bad input caught before any I/O (address format, amount).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Secret store read/write/delete failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Referenced id/address/index absent, or an integrity check failed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ledger RPC or router unreachable.
    #[error("Network error: {0}")]
    Network(String),

    /// A bounded network call exceeded its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Locally detectable shortfall against the last-known balance.
    #[error("Insufficient funds: need {needed} lamports, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// The router refused or failed to produce a quote.
    #[error("Quote failed: {0}")]
    Quote(String),

    /// Instruction deserialization or lookup-table resolution failure.
    #[error("Swap composition failed: {0}")]
    Compose(String),

    /// The ledger rejected a signed transaction.
    #[error("Broadcast failed: {0}")]
    Broadcast(String),
}

pub type Result<T> = std::result::Result<T, WalletError>;
