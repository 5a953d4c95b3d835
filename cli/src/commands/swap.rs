//! Quote and compose a gasless swap

use anyhow::{Context as _, Result};
use colored::Colorize;
use solana_sdk::pubkey::Pubkey;

use sable_wallet::config::DEFAULT_PLAN_MAX_AGE;
use sable_wallet::swap::GaslessSwapComposer;

use crate::context::Context;

pub async fn run(
    ctx: &Context,
    input_mint: &str,
    output_mint: &str,
    amount: u64,
    slippage_bps: u16,
    payer: &str,
) -> Result<()> {
    let payer: Pubkey = payer.parse().context("Invalid payer address")?;

    let router = ctx.router()?;
    let ledger = ctx.ledger();
    let composer = GaslessSwapComposer::new(&router, &ledger);

    println!("{}", "Fetching quote...".cyan());
    let quote = composer
        .get_quote(input_mint, output_mint, amount, slippage_bps)
        .await?;

    println!();
    println!("  In:  {} of {}", quote.in_amount, quote.input_mint);
    println!("  Out: {} of {}", quote.out_amount, quote.output_mint);
    println!("  Slippage: {} bps", quote.slippage_bps);

    println!();
    println!("{}", "Composing fee-sponsored instruction set...".cyan());
    let plan = composer.compose(&quote, &payer).await?;

    println!();
    println!("{}", "Swap plan ready".green().bold());
    println!();
    println!("  Instructions:  {}", plan.instructions.len());
    println!("  Lookup tables: {}", plan.lookup_tables.len());
    println!(
        "  Valid for:     {}s (then re-quote)",
        DEFAULT_PLAN_MAX_AGE.as_secs()
    );
    println!();
    println!(
        "{}",
        "Compute-budget instructions were stripped; the fee sponsor sets \
         its own. Hand the plan to the signing portal before it goes stale."
            .dimmed()
    );

    Ok(())
}
