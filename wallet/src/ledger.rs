//! Ledger RPC collaborator interface
//!
//! The managers only ever touch the chain through [`Ledger`], so tests
//! run against a mock and the production wiring stays in one place.
//! [`SolanaLedger`] implements it over the blocking RPC client with a
//! per-call timeout; a timed-out call surfaces as
//! [`WalletError::Timeout`], never an indefinite hang.

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};

use crate::config::LedgerConfig;
use crate::error::{Result, WalletError};

/// A recent blockhash with the height it stays valid until.
#[derive(Debug, Clone, Copy)]
pub struct Blockhash {
    pub hash: Hash,
    pub last_valid_block_height: u64,
}

/// Interface to the distributed ledger RPC collaborator.
pub trait Ledger: Send + Sync {
    /// Balance of `address` in lamports.
    fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    /// A recent blockhash for transaction assembly.
    fn latest_blockhash(&self) -> Result<Blockhash>;

    /// Submit a fully signed transaction and wait for confirmation.
    fn submit_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// Resolve an on-chain address lookup table into its current
    /// snapshot, or `None` if no table exists at `address`.
    fn resolve_lookup_table(&self, address: &Pubkey) -> Result<Option<AddressLookupTableAccount>>;
}

/// [`Ledger`] implementation over the Solana JSON-RPC client.
pub struct SolanaLedger {
    client: RpcClient,
}

impl SolanaLedger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(
                config.rpc_url.clone(),
                config.timeout,
                CommitmentConfig::confirmed(),
            ),
        }
    }
}

impl Ledger for SolanaLedger {
    fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.client.get_balance(address).map_err(map_client_error)
    }

    fn latest_blockhash(&self) -> Result<Blockhash> {
        let (hash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.client.commitment())
            .map_err(map_client_error)?;
        Ok(Blockhash {
            hash,
            last_valid_block_height,
        })
    }

    fn submit_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.client
            .send_and_confirm_transaction(transaction)
            .map_err(|e| match map_client_error(e) {
                timeout @ WalletError::Timeout(_) => timeout,
                other => WalletError::Broadcast(other.to_string()),
            })
    }

    fn resolve_lookup_table(&self, address: &Pubkey) -> Result<Option<AddressLookupTableAccount>> {
        let account = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .map_err(map_client_error)?
            .value;

        let account = match account {
            Some(account) => account,
            None => return Ok(None),
        };

        let table = AddressLookupTable::deserialize(&account.data).map_err(|e| {
            WalletError::Compose(format!("invalid lookup table account {address}: {e}"))
        })?;

        Ok(Some(AddressLookupTableAccount {
            key: *address,
            addresses: table.addresses.to_vec(),
        }))
    }
}

fn map_client_error(err: ClientError) -> WalletError {
    match err.kind() {
        ClientErrorKind::Reqwest(e) if e.is_timeout() => WalletError::Timeout(err.to_string()),
        _ => WalletError::Network(err.to_string()),
    }
}
