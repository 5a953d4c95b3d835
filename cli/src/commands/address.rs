//! Show the public stealth meta-address

use anyhow::Result;
use colored::Colorize;

use sable_wallet::stealth::StealthAddressManager;

use crate::context::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let manager = StealthAddressManager::open(store)?;
    let meta = manager.meta_address();

    println!();
    println!("{}", "Your stealth meta-address".yellow().bold());
    println!();
    println!("  {}", meta.to_string().green());
    println!();
    println!("  Scan key:  {}", meta.scan);
    println!("  Spend key: {}", meta.spend);
    println!();
    println!(
        "{}",
        "Share this publicly. Senders derive one-time addresses from it; \
         none of them link back to each other on-chain."
            .dimmed()
    );

    Ok(())
}
