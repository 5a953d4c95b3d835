//! Sable wallet core - the privacy and transaction subsystem
//!
//! Three managers built on a shared derivation engine and an encrypted
//! key-value store:
//!
//! - [`stealth::StealthAddressManager`]: one-time receiving addresses
//!   re-derived on demand from a single master secret plus an index.
//! - [`burner::BurnerWalletManager`]: fully isolated disposable keypairs
//!   with irreversible destruction.
//! - [`swap::GaslessSwapComposer`]: fee-sponsored swap assembly from a
//!   route-quoting service's raw instruction data.
//!
//! External collaborators (secret store, ledger RPC, router) are reached
//! only through the interfaces in [`store`], [`ledger`] and
//! [`swap::RouterClient`]; everything else is pure, deterministic logic.

pub mod burner;
pub mod config;
pub mod error;
pub mod kdf;
pub mod ledger;
pub mod stealth;
pub mod store;
pub mod swap;

#[cfg(test)]
pub(crate) mod testutil;

#[cfg(test)]
mod tests;

pub use config::{LedgerConfig, RouterConfig, SweepConfig};
pub use error::{Result, WalletError};
