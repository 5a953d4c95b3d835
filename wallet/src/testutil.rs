//! Test collaborators shared across the crate's test modules.

use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{Result, WalletError};
use crate::ledger::{Blockhash, Ledger};

/// In-memory stand-in for the ledger RPC collaborator.
///
/// Balances and lookup tables are seeded per test; submitted transactions
/// are recorded for inspection. Individual addresses can be marked as
/// failing to exercise per-entity degradation paths.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    balances: HashMap<Pubkey, u64>,
    failing_balances: HashSet<Pubkey>,
    tables: HashMap<Pubkey, Vec<Pubkey>>,
    submitted: Vec<Transaction>,
    fail_submissions: bool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state.lock().unwrap().balances.insert(address, lamports);
    }

    pub fn fail_balance(&self, address: Pubkey) {
        self.state.lock().unwrap().failing_balances.insert(address);
    }

    pub fn set_lookup_table(&self, address: Pubkey, entries: Vec<Pubkey>) {
        self.state.lock().unwrap().tables.insert(address, entries);
    }

    pub fn fail_submissions(&self) {
        self.state.lock().unwrap().fail_submissions = true;
    }

    pub fn submitted(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().submitted.clone()
    }
}

impl Ledger for MockLedger {
    fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        let state = self.state.lock().unwrap();
        if state.failing_balances.contains(address) {
            return Err(WalletError::Network(format!(
                "balance fetch failed for {address}"
            )));
        }
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    fn latest_blockhash(&self) -> Result<Blockhash> {
        Ok(Blockhash {
            hash: Hash::new_unique(),
            last_valid_block_height: 1_000,
        })
    }

    fn submit_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let mut state = self.state.lock().unwrap();
        if state.fail_submissions {
            return Err(WalletError::Broadcast("submission refused".into()));
        }
        state.submitted.push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    fn resolve_lookup_table(&self, address: &Pubkey) -> Result<Option<AddressLookupTableAccount>> {
        let state = self.state.lock().unwrap();
        Ok(state.tables.get(address).map(|entries| {
            AddressLookupTableAccount {
                key: *address,
                addresses: entries.clone(),
            }
        }))
    }
}
