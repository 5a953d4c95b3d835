//! Burner wallet commands: create, list, send, burn

use anyhow::{Context as _, Result};
use colored::Colorize;
use solana_sdk::native_token::{lamports_to_sol, sol_to_lamports};
use solana_sdk::pubkey::Pubkey;

use sable_wallet::burner::BurnerWalletManager;
use sable_wallet::config::SweepConfig;

use crate::context::Context;

pub fn create(ctx: &Context, label: &str) -> Result<()> {
    let store = ctx.open_store()?;
    let manager = BurnerWalletManager::new(store);

    let wallet = manager.create(label)?;

    println!();
    println!("{}", "Burner wallet created".green().bold());
    println!();
    println!("  Id:      {}", wallet.id);
    println!("  Label:   {}", wallet.label);
    println!("  Address: {}", wallet.public_key.to_string().green());
    println!();
    println!(
        "{}",
        "This key has no relation to your stealth addresses. Burning it \
         deletes the secret permanently."
            .dimmed()
    );

    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let manager = BurnerWalletManager::new(store);
    let ledger = ctx.ledger();

    let wallets = manager.list_with_balances(&ledger)?;
    if wallets.is_empty() {
        println!("{}", "No burner wallets. Run 'sable burner new -l <label>'.".yellow());
        return Ok(());
    }

    println!();
    println!("{}", "Burner wallets".yellow().bold());
    println!();
    for (wallet, balance) in wallets {
        println!(
            "  {}  {}  {:.9} SOL  {}",
            wallet.id,
            wallet.public_key,
            lamports_to_sol(balance),
            wallet.label.dimmed()
        );
    }

    Ok(())
}

pub fn send(ctx: &Context, id: &str, to: &str, amount_sol: f64) -> Result<()> {
    let store = ctx.open_store()?;
    let manager = BurnerWalletManager::new(store);
    let ledger = ctx.ledger();
    let lamports = sol_to_lamports(amount_sol);

    println!("{}", format!("Sending {amount_sol} SOL from burner {id}...").cyan());

    let signature = manager.send(id, to, lamports, &ledger, &SweepConfig::default())?;

    println!();
    println!("{}", "Payment sent".green().bold());
    println!();
    println!("  Transaction: {signature}");
    println!("  Amount:      {amount_sol} SOL");
    println!("  To:          {to}");

    Ok(())
}

pub fn burn(ctx: &Context, id: &str, sweep_to: Option<&str>) -> Result<()> {
    let sweep_to = sweep_to
        .map(|s| s.parse::<Pubkey>().context("Invalid sweep destination"))
        .transpose()?;

    let store = ctx.open_store()?;
    let manager = BurnerWalletManager::new(store);
    let ledger = ctx.ledger();

    println!("{}", format!("Destroying burner {id}...").cyan());

    let swept = manager.destroy(id, sweep_to.as_ref(), &ledger, &SweepConfig::default())?;

    println!();
    println!("{}", "Burner destroyed".green().bold());
    if let Some(signature) = swept {
        println!("  Swept first: {signature}");
    }
    println!();
    println!(
        "{}",
        "The secret is deleted. There is no recovery path.".dimmed()
    );

    Ok(())
}
