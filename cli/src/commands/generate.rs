//! Generate a fresh one-time stealth address

use anyhow::Result;
use colored::Colorize;

use sable_wallet::stealth::StealthAddressManager;

use crate::context::Context;

pub fn run(ctx: &Context, label: Option<&str>) -> Result<()> {
    let store = ctx.open_store()?;
    let manager = StealthAddressManager::open(store)?;

    let address = manager.generate_address(label)?;

    println!();
    println!("{}", "New stealth address generated".green().bold());
    println!();
    println!("  Address: {}", address.public_address.to_string().green());
    println!("  Index:   {}", address.index);
    if let Some(label) = &address.label {
        println!("  Label:   {label}");
    }
    println!();
    println!(
        "{}",
        "Only the index is persisted; the key is re-derived on demand.".dimmed()
    );

    Ok(())
}
