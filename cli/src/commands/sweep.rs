//! Sweep spendable funds from all stealth addresses

use anyhow::{Context as _, Result};
use colored::Colorize;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;

use sable_wallet::config::SweepConfig;
use sable_wallet::stealth::{StealthAddressManager, SweepOutcome};

use crate::context::Context;

pub fn run(ctx: &Context, destination: &str) -> Result<()> {
    let destination: Pubkey = destination.parse().context("Invalid destination address")?;

    let store = ctx.open_store()?;
    let manager = StealthAddressManager::open(store)?;
    let addresses = manager.list_addresses()?;

    if addresses.is_empty() {
        println!("{}", "No stealth addresses to sweep.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Sweeping {} addresses to {destination}...", addresses.len()).cyan()
    );

    let ledger = ctx.ledger();
    let config = SweepConfig::default();
    let outcomes = manager.sweep(&addresses, &destination, &ledger, &config);

    let mut swept = 0usize;
    println!();
    for outcome in &outcomes {
        match outcome {
            SweepOutcome::Swept {
                address,
                amount,
                signature,
            } => {
                swept += 1;
                println!(
                    "  {} {}  {:.9} SOL  {}",
                    "swept".green(),
                    address,
                    lamports_to_sol(*amount),
                    signature.to_string().dimmed()
                );
            }
            SweepOutcome::Skipped { address, balance } => {
                println!(
                    "  {} {}  {:.9} SOL below reserve + fee",
                    "skip ".dimmed(),
                    address,
                    lamports_to_sol(*balance)
                );
            }
            SweepOutcome::Failed { address, error } => {
                println!("  {} {}  {}", "fail ".red(), address, error);
            }
        }
    }

    println!();
    println!(
        "{}",
        format!("{swept} of {} addresses swept.", outcomes.len()).bold()
    );

    Ok(())
}
