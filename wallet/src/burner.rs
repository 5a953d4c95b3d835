//! Burner wallet manager
//!
//! Burner wallets are fully isolated disposable keypairs: generated
//! independently per wallet, no cryptographic relation to the master
//! secret or to each other. The private key exists only as an encrypted
//! store entry keyed by the wallet id; destroying a burner deletes that
//! entry permanently, with no reconstruction path.
//!
//! Burners pay their own fees. The send path never touches the primary
//! passkey signing flow.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    pubkey::Pubkey, signature::Keypair, signature::Signature, signer::Signer, system_instruction,
    transaction::Transaction,
};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::warn;

use crate::config::SweepConfig;
use crate::error::{Result, WalletError};
use crate::ledger::Ledger;
use crate::store::SecretStore;

const BURNER_LIST_KEY: &str = "burner_wallets";
const BURNER_SECRET_PREFIX: &str = "burner_secret:";

/// Public record of a burner wallet. The private key is never part of
/// this record; it lives only in the secret store under the wallet id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnerWallet {
    pub id: String,
    pub label: String,
    pub public_key: Pubkey,
    pub created_at: String,
}

/// Persisted form of [`BurnerWallet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredBurner {
    id: String,
    label: String,
    public_key: String,
    created_at: String,
}

impl StoredBurner {
    fn to_wallet(&self) -> Result<BurnerWallet> {
        let public_key = Pubkey::from_str(&self.public_key)
            .map_err(|_| WalletError::Storage(format!("corrupt burner record {}", self.id)))?;
        Ok(BurnerWallet {
            id: self.id.clone(),
            label: self.label.clone(),
            public_key,
            created_at: self.created_at.clone(),
        })
    }
}

/// Manager owning the burner list and each burner's persisted secret.
///
/// List mutations (create append, destroy removal) serialize on an
/// in-process mutex so concurrent create and destroy on different ids
/// cannot corrupt the shared list. The lock is never held across a
/// network call.
pub struct BurnerWalletManager<S: SecretStore> {
    store: S,
    list_lock: Mutex<()>,
}

impl<S: SecretStore> BurnerWalletManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            list_lock: Mutex::new(()),
        }
    }

    /// Create a fresh burner wallet with a human label.
    ///
    /// The secret is committed before the list entry; if the list write
    /// fails the secret is rolled back so neither half survives alone.
    pub fn create(&self, label: &str) -> Result<BurnerWallet> {
        let keypair = Keypair::new();
        let id = self.fresh_id()?;
        let secret_key = secret_key_for(&id);

        self.store.set(&secret_key, &keypair.to_bytes())?;

        let record = StoredBurner {
            id: id.clone(),
            label: label.to_string(),
            public_key: keypair.pubkey().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let list_result = (|| {
            let _guard = self.lock()?;
            let mut list = self.read_list()?;
            list.push(record.clone());
            self.write_list(&list)
        })();

        if let Err(e) = list_result {
            // Roll the secret back rather than leaving an orphan without
            // a list entry.
            if let Err(cleanup) = self.store.delete(&secret_key) {
                warn!(id = %id, error = %cleanup, "failed to roll back orphaned burner secret");
            }
            return Err(e);
        }

        record.to_wallet()
    }

    /// All live burner wallets, in creation order.
    pub fn list(&self) -> Result<Vec<BurnerWallet>> {
        self.read_list()?.iter().map(StoredBurner::to_wallet).collect()
    }

    /// All live burner wallets with their current balances. A failed
    /// lookup for one wallet yields balance 0 for that wallet only.
    pub fn list_with_balances(&self, ledger: &dyn Ledger) -> Result<Vec<(BurnerWallet, u64)>> {
        self.list()?
            .into_iter()
            .map(|wallet| {
                let balance = match ledger.get_balance(&wallet.public_key) {
                    Ok(balance) => balance,
                    Err(e) => {
                        warn!(id = %wallet.id, error = %e, "balance fetch failed, reporting zero");
                        0
                    }
                };
                Ok((wallet, balance))
            })
            .collect()
    }

    /// Send `amount` lamports from a burner to `recipient`.
    ///
    /// Recipient format and amount positivity are validated before any
    /// network call. The local balance check is advisory; the ledger's
    /// own rejection is authoritative.
    pub fn send(
        &self,
        id: &str,
        recipient: &str,
        amount: u64,
        ledger: &dyn Ledger,
        config: &SweepConfig,
    ) -> Result<Signature> {
        let recipient = Pubkey::from_str(recipient)
            .map_err(|_| WalletError::Validation(format!("invalid recipient address: {recipient}")))?;
        if amount == 0 {
            return Err(WalletError::Validation("amount must be positive".into()));
        }

        let keypair = self.keypair(id)?;
        let sender = keypair.pubkey();

        // The burner pays its own fee on top of the transfer.
        let needed = amount.checked_add(config.fee_estimate).ok_or_else(|| {
            WalletError::Validation(format!(
                "amount {amount} plus fee estimate overflows the lamport range"
            ))
        })?;
        match ledger.get_balance(&sender) {
            Ok(available) if available < needed => {
                return Err(WalletError::InsufficientFunds { needed, available });
            }
            Ok(_) => {}
            Err(e) => {
                warn!(id = %id, error = %e, "balance check unavailable, deferring to the ledger");
            }
        }

        let blockhash = ledger.latest_blockhash()?;
        let instruction = system_instruction::transfer(&sender, &recipient, amount);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&sender),
            &[&keypair],
            blockhash.hash,
        );

        ledger.submit_transaction(&transaction)
    }

    /// Permanently destroy a burner wallet.
    ///
    /// If `sweep_to` is given and the wallet holds more than the fee
    /// estimate, one best-effort sweep is attempted first; its failure is
    /// logged, never propagated, and destruction proceeds regardless.
    /// Secret deletion and list removal are then attempted independently
    /// so one failing step cannot leave the other half undeletable.
    pub fn destroy(
        &self,
        id: &str,
        sweep_to: Option<&Pubkey>,
        ledger: &dyn Ledger,
        config: &SweepConfig,
    ) -> Result<Option<Signature>> {
        let keypair = self.keypair(id)?;

        let sweep_signature = match sweep_to {
            Some(destination) => self.sweep_before_destroy(id, &keypair, destination, ledger, config),
            None => None,
        };

        let secret_result = self.store.delete(&secret_key_for(id));
        let list_result = (|| {
            let _guard = self.lock()?;
            let mut list = self.read_list()?;
            list.retain(|record| record.id != id);
            self.write_list(&list)
        })();

        match (secret_result, list_result) {
            (Ok(()), Ok(())) => Ok(sweep_signature),
            (Err(e), Ok(())) => Err(WalletError::Storage(format!(
                "burner {id} removed from list but secret deletion failed: {e}"
            ))),
            (Ok(()), Err(e)) => Err(WalletError::Storage(format!(
                "burner {id} secret deleted but list removal failed: {e}"
            ))),
            (Err(secret_err), Err(list_err)) => Err(WalletError::Storage(format!(
                "burner {id} destruction failed on both halves: secret: {secret_err}; list: {list_err}"
            ))),
        }
    }

    fn sweep_before_destroy(
        &self,
        id: &str,
        keypair: &Keypair,
        destination: &Pubkey,
        ledger: &dyn Ledger,
        config: &SweepConfig,
    ) -> Option<Signature> {
        let sender = keypair.pubkey();
        let attempt = || -> Result<Option<Signature>> {
            let balance = ledger.get_balance(&sender)?;
            if balance <= config.fee_estimate {
                return Ok(None);
            }
            let amount = balance - config.fee_estimate;
            let blockhash = ledger.latest_blockhash()?;
            let instruction = system_instruction::transfer(&sender, destination, amount);
            let transaction = Transaction::new_signed_with_payer(
                &[instruction],
                Some(&sender),
                &[keypair],
                blockhash.hash,
            );
            ledger.submit_transaction(&transaction).map(Some)
        };

        match attempt() {
            Ok(signature) => signature,
            Err(e) => {
                warn!(id = %id, error = %e, "best-effort sweep failed; destroying anyway");
                None
            }
        }
    }

    /// Load the keypair for a live burner. Fails with `NotFound` once the
    /// wallet has been destroyed; there is no resurrection path.
    fn keypair(&self, id: &str) -> Result<Keypair> {
        let bytes = self
            .store
            .get(&secret_key_for(id))?
            .ok_or_else(|| WalletError::NotFound(format!("no burner wallet with id {id}")))?;
        Keypair::from_bytes(&bytes)
            .map_err(|_| WalletError::Storage(format!("corrupt secret for burner {id}")))
    }

    /// Generate an id that is not currently in use.
    fn fresh_id(&self) -> Result<String> {
        loop {
            let mut bytes = [0u8; 16];
            OsRng.fill_bytes(&mut bytes);
            let id = hex::encode(bytes);
            if self.store.get(&secret_key_for(&id))?.is_none() {
                return Ok(id);
            }
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.list_lock
            .lock()
            .map_err(|_| WalletError::Storage("burner list lock poisoned".into()))
    }

    fn read_list(&self) -> Result<Vec<StoredBurner>> {
        match self.store.get(BURNER_LIST_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| WalletError::Storage(format!("corrupt burner list: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn write_list(&self, list: &[StoredBurner]) -> Result<()> {
        let json = serde_json::to_vec(list)
            .map_err(|e| WalletError::Storage(format!("serialization failed: {e}")))?;
        self.store.set(BURNER_LIST_KEY, &json)
    }
}

fn secret_key_for(id: &str) -> String {
    format!("{BURNER_SECRET_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SecretStore};
    use crate::testutil::MockLedger;
    use std::sync::Arc;

    fn manager() -> BurnerWalletManager<MemoryStore> {
        BurnerWalletManager::new(MemoryStore::new())
    }

    fn config() -> SweepConfig {
        SweepConfig {
            rent_reserve: 1_000,
            fee_estimate: 100,
        }
    }

    #[test]
    fn create_and_list() {
        let manager = manager();
        let a = manager.create("hot").unwrap();
        let b = manager.create("cold").unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.public_key, b.public_key);

        let listed = manager.list().unwrap();
        assert_eq!(listed, vec![a, b]);
    }

    #[test]
    fn create_rolls_back_secret_on_list_failure() {
        let store = Arc::new(FailOnKeyStore::new(BURNER_LIST_KEY));
        let manager = BurnerWalletManager::new(Arc::clone(&store));

        let err = manager.create("doomed").unwrap_err();
        assert!(matches!(err, WalletError::Storage(_)));

        // No orphaned secret survives the failed create.
        assert!(store.inner.get(BURNER_LIST_KEY).unwrap().is_none());
        assert_eq!(store.secret_count(), 0);
    }

    #[test]
    fn send_validates_before_any_network_call() {
        let manager = manager();
        let wallet = manager.create("payer").unwrap();
        let ledger = MockLedger::new();

        let err = manager
            .send(&wallet.id, "not-a-pubkey", 1_000, &ledger, &config())
            .unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        let recipient = Pubkey::new_unique().to_string();
        let err = manager
            .send(&wallet.id, &recipient, 0, &ledger, &config())
            .unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));

        assert!(ledger.submitted().is_empty());
    }

    #[test]
    fn send_checks_funds_and_submits() {
        let manager = manager();
        let wallet = manager.create("payer").unwrap();
        let recipient = Pubkey::new_unique();
        let ledger = MockLedger::new();

        ledger.set_balance(wallet.public_key, 500);
        let err = manager
            .send(&wallet.id, &recipient.to_string(), 500, &ledger, &config())
            .unwrap_err();
        assert!(matches!(
            err,
            WalletError::InsufficientFunds {
                needed: 600,
                available: 500
            }
        ));

        ledger.set_balance(wallet.public_key, 10_000);
        manager
            .send(&wallet.id, &recipient.to_string(), 500, &ledger, &config())
            .unwrap();

        let submitted = ledger.submitted();
        assert_eq!(submitted.len(), 1);
        assert!(submitted[0].message.account_keys.contains(&recipient));
        submitted[0].verify().unwrap();
    }

    #[test]
    fn send_rejects_amount_that_overflows_with_fee() {
        let manager = manager();
        let wallet = manager.create("payer").unwrap();
        let ledger = MockLedger::new();
        ledger.set_balance(wallet.public_key, 1_000_000);

        let err = manager
            .send(
                &wallet.id,
                &Pubkey::new_unique().to_string(),
                u64::MAX,
                &ledger,
                &config(),
            )
            .unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
        assert!(ledger.submitted().is_empty());
    }

    #[test]
    fn send_proceeds_when_balance_check_is_unavailable() {
        let manager = manager();
        let wallet = manager.create("payer").unwrap();
        let recipient = Pubkey::new_unique();
        let ledger = MockLedger::new();
        ledger.fail_balance(wallet.public_key);

        // The ledger's own rejection is authoritative; a failed local
        // check must not block the attempt.
        manager
            .send(&wallet.id, &recipient.to_string(), 500, &ledger, &config())
            .unwrap();
        assert_eq!(ledger.submitted().len(), 1);
    }

    #[test]
    fn destroy_is_irreversible() {
        let manager = manager();
        let wallet = manager.create("test").unwrap();
        let ledger = MockLedger::new();

        let balances = manager.list_with_balances(&ledger).unwrap();
        assert_eq!(balances, vec![(wallet.clone(), 0)]);

        let swept = manager.destroy(&wallet.id, None, &ledger, &config()).unwrap();
        assert!(swept.is_none());
        assert!(manager.list().unwrap().is_empty());

        let err = manager
            .send(
                &wallet.id,
                &Pubkey::new_unique().to_string(),
                1,
                &ledger,
                &config(),
            )
            .unwrap_err();
        assert!(matches!(err, WalletError::NotFound(_)));

        let err = manager
            .destroy(&wallet.id, None, &ledger, &config())
            .unwrap_err();
        assert!(matches!(err, WalletError::NotFound(_)));
    }

    #[test]
    fn destroy_sweeps_remaining_balance_first() {
        let manager = manager();
        let wallet = manager.create("funded").unwrap();
        let destination = Pubkey::new_unique();
        let ledger = MockLedger::new();
        ledger.set_balance(wallet.public_key, 10_000);

        let signature = manager
            .destroy(&wallet.id, Some(&destination), &ledger, &config())
            .unwrap();
        assert!(signature.is_some());

        let submitted = ledger.submitted();
        assert_eq!(submitted.len(), 1);
        assert!(submitted[0].message.account_keys.contains(&destination));
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn destroy_proceeds_when_sweep_fails() {
        let manager = manager();
        let wallet = manager.create("funded").unwrap();
        let destination = Pubkey::new_unique();
        let ledger = MockLedger::new();
        ledger.set_balance(wallet.public_key, 10_000);
        ledger.fail_submissions();

        let signature = manager
            .destroy(&wallet.id, Some(&destination), &ledger, &config())
            .unwrap();
        assert!(signature.is_none());
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn destroy_skips_sweep_below_fee() {
        let manager = manager();
        let wallet = manager.create("dust").unwrap();
        let ledger = MockLedger::new();
        ledger.set_balance(wallet.public_key, 50); // below the fee estimate

        let signature = manager
            .destroy(&wallet.id, Some(&Pubkey::new_unique()), &ledger, &config())
            .unwrap();
        assert!(signature.is_none());
        assert!(ledger.submitted().is_empty());
    }

    #[test]
    fn list_with_balances_degrades_per_wallet() {
        let manager = manager();
        let a = manager.create("a").unwrap();
        let b = manager.create("b").unwrap();
        let ledger = MockLedger::new();
        ledger.set_balance(a.public_key, 900);
        ledger.fail_balance(b.public_key);

        let balances = manager.list_with_balances(&ledger).unwrap();
        assert_eq!(balances[0].1, 900);
        assert_eq!(balances[1].1, 0);
    }

    /// Store that fails every write to one specific key and tracks which
    /// keys are currently live.
    struct FailOnKeyStore {
        inner: MemoryStore,
        fail_key: &'static str,
        live_keys: std::sync::Mutex<std::collections::HashSet<String>>,
    }

    impl FailOnKeyStore {
        fn new(fail_key: &'static str) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_key,
                live_keys: std::sync::Mutex::new(std::collections::HashSet::new()),
            }
        }

        fn secret_count(&self) -> usize {
            self.live_keys
                .lock()
                .unwrap()
                .iter()
                .filter(|k| k.starts_with(BURNER_SECRET_PREFIX))
                .count()
        }
    }

    impl SecretStore for FailOnKeyStore {
        fn get(&self, key: &str) -> crate::error::Result<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> crate::error::Result<()> {
            if key == self.fail_key {
                return Err(WalletError::Storage("injected write failure".into()));
            }
            self.live_keys.lock().unwrap().insert(key.to_string());
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> crate::error::Result<()> {
            self.live_keys.lock().unwrap().remove(key);
            self.inner.delete(key)
        }
    }
}
