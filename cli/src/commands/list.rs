//! List stealth addresses, optionally with balances

use anyhow::Result;
use colored::Colorize;
use solana_sdk::native_token::lamports_to_sol;

use sable_wallet::ledger::Ledger;
use sable_wallet::stealth::StealthAddressManager;

use crate::context::Context;

pub fn run(ctx: &Context, with_balances: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let manager = StealthAddressManager::open(store)?;

    let addresses = manager.list_addresses()?;
    if addresses.is_empty() {
        println!("{}", "No stealth addresses yet. Run 'sable generate'.".yellow());
        return Ok(());
    }

    println!();
    println!("{}", "Stealth addresses".yellow().bold());
    println!();

    let ledger = ctx.ledger();
    let mut total = 0u64;

    for address in &addresses {
        let label = address.label.as_deref().unwrap_or("-");
        if with_balances {
            let balance = ledger.get_balance(&address.public_address).unwrap_or(0);
            total += balance;
            println!(
                "  [{}] {}  {:.9} SOL  {}",
                address.index,
                address.public_address,
                lamports_to_sol(balance),
                label.dimmed()
            );
        } else {
            println!(
                "  [{}] {}  {}",
                address.index,
                address.public_address,
                label.dimmed()
            );
        }
    }

    if with_balances {
        println!();
        println!(
            "Total: {} SOL across {} addresses",
            format!("{:.9}", lamports_to_sol(total)).green(),
            addresses.len()
        );
    }

    Ok(())
}
