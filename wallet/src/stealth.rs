//! Stealth address manager
//!
//! Owns the master secret and the monotonic address-index counter. One-time
//! receiving addresses are never stored as private keys; only the index is
//! persisted and the key material is re-derived on demand. That trades a
//! small recomputation cost for eliminating a whole class of secret-at-rest
//! leak risk, so do not cache derived private keys.
//!
//! Indices are append-only and never reused, even after an address is fully
//! swept and abandoned.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    pubkey::Pubkey, signature::Keypair, signature::Signature, signer::Signer, system_instruction,
    transaction::Transaction,
};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::warn;
use zeroize::Zeroizing;

use crate::config::SweepConfig;
use crate::error::{Result, WalletError};
use crate::kdf::{derive_keypair, SCAN_LABEL, SPEND_LABEL, STEALTH_LABEL};
use crate::ledger::Ledger;
use crate::store::SecretStore;

const MASTER_SECRET_KEY: &str = "master_secret";
const INDEX_KEY: &str = "stealth_index";
const ADDRESS_META_KEY: &str = "stealth_addresses";

/// Public receiving identifier: a scan/spend key pair derived from the
/// master secret with fixed domain labels. Stable for the lifetime of the
/// installation and safe to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StealthMetaAddress {
    pub scan: Pubkey,
    pub spend: Pubkey,
}

impl fmt::Display for StealthMetaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(&self.scan.to_bytes());
        combined[32..].copy_from_slice(&self.spend.to_bytes());
        write!(f, "stealth:{}", bs58::encode(&combined).into_string())
    }
}

impl FromStr for StealthMetaAddress {
    type Err = WalletError;

    fn from_str(input: &str) -> Result<Self> {
        let encoded = input.strip_prefix("stealth:").unwrap_or(input);
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| WalletError::Validation(format!("invalid meta-address encoding: {e}")))?;

        if bytes.len() != 64 {
            return Err(WalletError::Validation(format!(
                "invalid meta-address length: expected 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut scan = [0u8; 32];
        let mut spend = [0u8; 32];
        scan.copy_from_slice(&bytes[..32]);
        spend.copy_from_slice(&bytes[32..]);

        Ok(Self {
            scan: Pubkey::new_from_array(scan),
            spend: Pubkey::new_from_array(spend),
        })
    }
}

/// One-time receiving address. The index is the only source of truth for
/// re-deriving the private key; the public address is derived, not secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthAddress {
    pub index: u64,
    pub public_address: Pubkey,
    pub created_at: String,
    pub label: Option<String>,
}

/// Auxiliary per-address metadata. Addresses themselves are reproducible
/// from the counter alone; this only carries what cannot be re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AddressMeta {
    index: u64,
    created_at: String,
    label: Option<String>,
}

/// Per-address sweep result. One address failing never aborts the rest.
#[derive(Debug)]
pub enum SweepOutcome {
    /// Transfer of exactly `balance - rent_reserve - fee_estimate` submitted.
    Swept {
        address: Pubkey,
        amount: u64,
        signature: Signature,
    },
    /// Nothing spendable after reserving rent and fee.
    Skipped { address: Pubkey, balance: u64 },
    /// This address's transfer failed; others proceed independently.
    Failed { address: Pubkey, error: WalletError },
}

/// Manager owning the master secret and the address-index counter.
///
/// The counter read-modify-write in [`generate_address`] is serialized by
/// an in-process mutex; two concurrent calls can never observe the same
/// index. The lock guards only store metadata mutation, never an RPC
/// round trip.
///
/// [`generate_address`]: StealthAddressManager::generate_address
pub struct StealthAddressManager<S: SecretStore> {
    store: S,
    master: Zeroizing<[u8; 32]>,
    counter_lock: Mutex<()>,
}

impl<S: SecretStore> StealthAddressManager<S> {
    /// Open the manager, creating the master secret on first use.
    ///
    /// Initialization is idempotent for a given store; callers must
    /// serialize the very first open if the store lacks atomic
    /// read-check-write.
    pub fn open(store: S) -> Result<Self> {
        let master = match store.get(MASTER_SECRET_KEY)? {
            Some(stored) => {
                let hex_str = std::str::from_utf8(&stored)
                    .map_err(|_| WalletError::Storage("corrupt master secret encoding".into()))?;
                let bytes = hex::decode(hex_str)
                    .map_err(|_| WalletError::Storage("corrupt master secret encoding".into()))?;
                let bytes: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| WalletError::Storage("corrupt master secret length".into()))?;
                Zeroizing::new(bytes)
            }
            None => {
                let mut bytes = Zeroizing::new([0u8; 32]);
                OsRng.fill_bytes(bytes.as_mut());
                store.set(MASTER_SECRET_KEY, hex::encode(bytes.as_ref()).as_bytes())?;
                bytes
            }
        };

        Ok(Self {
            store,
            master,
            counter_lock: Mutex::new(()),
        })
    }

    /// The public scan/spend meta-address. Deterministic; safe to call
    /// repeatedly.
    pub fn meta_address(&self) -> StealthMetaAddress {
        let scan = derive_keypair(&self.master, SCAN_LABEL, None);
        let spend = derive_keypair(&self.master, SPEND_LABEL, None);
        StealthMetaAddress {
            scan: scan.pubkey(),
            spend: spend.pubkey(),
        }
    }

    /// Generate the next one-time address.
    ///
    /// The incremented counter is committed before the address metadata:
    /// a partial failure burns an index (harmless) rather than ever
    /// handing the same index to two callers.
    pub fn generate_address(&self, label: Option<&str>) -> Result<StealthAddress> {
        let _guard = self
            .counter_lock
            .lock()
            .map_err(|_| WalletError::Storage("counter lock poisoned".into()))?;

        let index = self.read_counter()?;
        let keypair = derive_keypair(&self.master, STEALTH_LABEL, Some(index));

        self.store
            .set(INDEX_KEY, &(index + 1).to_le_bytes())?;

        let record = StealthAddress {
            index,
            public_address: keypair.pubkey(),
            created_at: chrono::Utc::now().to_rfc3339(),
            label: label.map(str::to_string),
        };

        let mut metas = self.read_metas()?;
        metas.push(AddressMeta {
            index,
            created_at: record.created_at.clone(),
            label: record.label.clone(),
        });
        self.write_metas(&metas)?;

        Ok(record)
    }

    /// All generated addresses, re-derived from the counter, ordered by
    /// index ascending.
    pub fn list_addresses(&self) -> Result<Vec<StealthAddress>> {
        let counter = self.read_counter()?;
        let metas: HashMap<u64, AddressMeta> = self
            .read_metas()?
            .into_iter()
            .map(|m| (m.index, m))
            .collect();

        let mut addresses = Vec::with_capacity(counter as usize);
        for index in 0..counter {
            let keypair = derive_keypair(&self.master, STEALTH_LABEL, Some(index));
            let meta = metas.get(&index);
            addresses.push(StealthAddress {
                index,
                public_address: keypair.pubkey(),
                created_at: meta.map(|m| m.created_at.clone()).unwrap_or_default(),
                label: meta.and_then(|m| m.label.clone()),
            });
        }
        Ok(addresses)
    }

    /// Re-derive the keypair for a previously generated address.
    ///
    /// The derived public key must match `address` exactly; a mismatch
    /// means the record is corrupt and fails rather than silently
    /// returning the wrong key.
    pub fn derive_keypair_for(&self, address: &Pubkey, index: u64) -> Result<Keypair> {
        let keypair = derive_keypair(&self.master, STEALTH_LABEL, Some(index));
        if keypair.pubkey() != *address {
            return Err(WalletError::NotFound(format!(
                "index {index} does not derive address {address}; record is unrecoverable"
            )));
        }
        Ok(keypair)
    }

    /// Sweep spendable funds from the given addresses to `destination`.
    ///
    /// Each address is handled independently: a failed transfer is
    /// reported for that address and sweeping continues. Addresses whose
    /// balance minus reserve and fee is non-positive are skipped, not
    /// failed.
    pub fn sweep(
        &self,
        addresses: &[StealthAddress],
        destination: &Pubkey,
        ledger: &dyn Ledger,
        config: &SweepConfig,
    ) -> Vec<SweepOutcome> {
        addresses
            .iter()
            .map(|addr| self.sweep_one(addr, destination, ledger, config))
            .collect()
    }

    fn sweep_one(
        &self,
        addr: &StealthAddress,
        destination: &Pubkey,
        ledger: &dyn Ledger,
        config: &SweepConfig,
    ) -> SweepOutcome {
        let address = addr.public_address;

        let keypair = match self.derive_keypair_for(&address, addr.index) {
            Ok(keypair) => keypair,
            Err(error) => return SweepOutcome::Failed { address, error },
        };

        let balance = match ledger.get_balance(&address) {
            Ok(balance) => balance,
            Err(error) => return SweepOutcome::Failed { address, error },
        };

        let amount = config.spendable(balance);
        if amount == 0 {
            return SweepOutcome::Skipped { address, balance };
        }

        let blockhash = match ledger.latest_blockhash() {
            Ok(blockhash) => blockhash,
            Err(error) => return SweepOutcome::Failed { address, error },
        };

        let instruction = system_instruction::transfer(&address, destination, amount);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&address),
            &[&keypair],
            blockhash.hash,
        );

        match ledger.submit_transaction(&transaction) {
            Ok(signature) => SweepOutcome::Swept {
                address,
                amount,
                signature,
            },
            Err(error) => SweepOutcome::Failed { address, error },
        }
    }

    /// Total balance across all generated addresses. A failed fetch for
    /// one address degrades to zero for that address only.
    pub fn total_balance(&self, ledger: &dyn Ledger) -> Result<u64> {
        let mut total = 0u64;
        for addr in self.list_addresses()? {
            match ledger.get_balance(&addr.public_address) {
                Ok(balance) => total += balance,
                Err(e) => {
                    warn!(address = %addr.public_address, error = %e, "balance fetch failed, counting as zero");
                }
            }
        }
        Ok(total)
    }

    fn read_counter(&self) -> Result<u64> {
        match self.store.get(INDEX_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| WalletError::Storage("corrupt index counter".into()))?;
                Ok(u64::from_le_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    fn read_metas(&self) -> Result<Vec<AddressMeta>> {
        match self.store.get(ADDRESS_META_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| WalletError::Storage(format!("corrupt address metadata: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn write_metas(&self, metas: &[AddressMeta]) -> Result<()> {
        let json = serde_json::to_vec(metas)
            .map_err(|e| WalletError::Storage(format!("serialization failed: {e}")))?;
        self.store.set(ADDRESS_META_KEY, &json)
    }
}
