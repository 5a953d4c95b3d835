//! End-to-end scenarios across the managers
//!
//! Module-level unit tests live next to their subjects; these exercise
//! the flows a client walks through, with the in-memory store and mock
//! ledger standing in for the external collaborators.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use solana_sdk::{compute_budget, pubkey::Pubkey, signer::Signer};
use std::sync::Arc;

use crate::burner::BurnerWalletManager;
use crate::config::SweepConfig;
use crate::error::WalletError;
use crate::kdf;
use crate::stealth::{StealthAddressManager, SweepOutcome};
use crate::store::{MemoryStore, SecretStore};
use crate::swap::{
    assemble_instructions, resolve_lookup_tables, RouterAccountMeta, RouterInstruction,
    SwapInstructionsResponse,
};
use crate::testutil::MockLedger;

#[test]
fn stealth_addresses_reproduce_from_counter_alone() {
    let store = Arc::new(MemoryStore::new());
    let manager = StealthAddressManager::open(Arc::clone(&store)).unwrap();

    for _ in 0..3 {
        manager.generate_address(None).unwrap();
    }

    let listed = manager.list_addresses().unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(
        listed.iter().map(|a| a.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    // An external holder of the master secret re-derives index 1 exactly.
    let master_hex = store.get("master_secret").unwrap().unwrap();
    let master: [u8; 32] = hex::decode(std::str::from_utf8(&master_hex).unwrap())
        .unwrap()
        .try_into()
        .unwrap();
    let external = kdf::derive_keypair(&master, kdf::STEALTH_LABEL, Some(1));
    assert_eq!(external.pubkey(), listed[1].public_address);
}

#[test]
fn burner_lifecycle_create_to_destroy() {
    let manager = BurnerWalletManager::new(MemoryStore::new());
    let ledger = MockLedger::new();
    let config = SweepConfig::default();

    let wallet = manager.create("test").unwrap();
    assert_eq!(wallet.label, "test");

    let listed = manager.list_with_balances(&ledger).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].0.id, wallet.id);
    assert_eq!(listed[0].1, 0);

    manager.destroy(&wallet.id, None, &ledger, &config).unwrap();
    assert!(manager.list().unwrap().is_empty());

    let err = manager
        .send(
            &wallet.id,
            &Pubkey::new_unique().to_string(),
            1,
            &ledger,
            &config,
        )
        .unwrap_err();
    assert!(matches!(err, WalletError::NotFound(_)));
}

#[test]
fn swap_composition_filters_and_resolves() {
    // Router returns 2 setup instructions, a swap and a cleanup, where
    // setup[0] targets the compute-budget program.
    let table_address = Pubkey::new_unique();
    let response = SwapInstructionsResponse {
        setup_instructions: vec![
            raw_ix(compute_budget::id(), 0),
            raw_ix(Pubkey::new_unique(), 1),
        ],
        swap_instruction: raw_ix(Pubkey::new_unique(), 2),
        cleanup_instruction: Some(raw_ix(Pubkey::new_unique(), 3)),
        address_lookup_table_addresses: vec![table_address.to_string()],
    };

    let ledger = MockLedger::new();
    ledger.set_lookup_table(table_address, vec![Pubkey::new_unique()]);

    let instructions = assemble_instructions(&response).unwrap();
    let tags: Vec<u8> = instructions.iter().map(|ix| ix.data[0]).collect();
    assert_eq!(tags, vec![1, 2, 3]);

    let tables =
        resolve_lookup_tables(&response.address_lookup_table_addresses, &ledger).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].key, table_address);
}

#[test]
fn managers_share_one_store_without_collisions() {
    let store = Arc::new(MemoryStore::new());
    let stealth = StealthAddressManager::open(Arc::clone(&store)).unwrap();
    let burners = BurnerWalletManager::new(Arc::clone(&store));

    let addr = stealth.generate_address(Some("receiving")).unwrap();
    let burner = burners.create("spending").unwrap();

    // A burner's key has no relation to the derived address space.
    assert_ne!(addr.public_address, burner.public_key);

    assert_eq!(stealth.list_addresses().unwrap().len(), 1);
    assert_eq!(burners.list().unwrap().len(), 1);

    // Destroying the burner leaves the stealth state untouched.
    let ledger = MockLedger::new();
    burners
        .destroy(&burner.id, None, &ledger, &SweepConfig::default())
        .unwrap();
    assert_eq!(stealth.list_addresses().unwrap().len(), 1);
    assert_eq!(stealth.list_addresses().unwrap()[0].index, addr.index);
}

#[test]
fn sweep_into_burner_wallet() {
    let store = Arc::new(MemoryStore::new());
    let stealth = StealthAddressManager::open(Arc::clone(&store)).unwrap();
    let burners = BurnerWalletManager::new(Arc::clone(&store));
    let ledger = MockLedger::new();
    let config = SweepConfig {
        rent_reserve: 1_000,
        fee_estimate: 100,
    };

    let addr = stealth.generate_address(None).unwrap();
    let burner = burners.create("collector").unwrap();
    ledger.set_balance(addr.public_address, 50_000);

    let outcomes = stealth.sweep(
        &[addr.clone()],
        &burner.public_key,
        &ledger,
        &config,
    );
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        SweepOutcome::Swept { amount, .. } => assert_eq!(*amount, 48_900),
        other => panic!("expected Swept, got {other:?}"),
    }

    let submitted = ledger.submitted();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].message.account_keys.contains(&burner.public_key));
}

fn raw_ix(program_id: Pubkey, tag: u8) -> RouterInstruction {
    RouterInstruction {
        program_id: program_id.to_string(),
        accounts: vec![RouterAccountMeta {
            pubkey: Pubkey::new_unique().to_string(),
            is_signer: false,
            is_writable: true,
        }],
        data: BASE64.encode([tag]),
    }
}
