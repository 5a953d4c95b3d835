//! Sable CLI - command line surface over the privacy wallet core

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

use commands::*;
use context::Context;

#[derive(Parser)]
#[command(name = "sable")]
#[command(version = "0.1.0")]
#[command(about = "Private payments on Solana - stealth addresses, burner wallets, gasless swaps")]
#[command(long_about = r#"
Sable keeps your receiving addresses unlinkable and your spending wallets
disposable.

Stealth addresses are one-time receiving addresses re-derived on demand
from a single encrypted master secret; burner wallets are fully isolated
keypairs destroyed by deleting their secret; swaps are composed for
fee-sponsored signing so burners never need SOL for gas.

Quick start:
  1. sable address               Show your public meta-address
  2. sable generate              Create a fresh one-time address
  3. sable burner new -l hot     Create a disposable wallet
  4. sable sweep --to <addr>     Collect received funds
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Solana RPC URL
    #[arg(long, global = true, default_value = "https://api.devnet.solana.com")]
    rpc_url: String,

    /// Route-quoting service base URL
    #[arg(long, global = true, default_value = "https://quote-api.jup.ag/v6")]
    router_url: String,

    /// Path to the encrypted wallet store
    #[arg(long, global = true)]
    store: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show your public stealth meta-address
    Address,

    /// Generate a fresh one-time stealth address
    Generate {
        /// Optional label for the new address
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all stealth addresses
    List {
        /// Also fetch on-chain balances
        #[arg(short, long)]
        balances: bool,
    },

    /// Sweep spendable funds from all stealth addresses
    Sweep {
        /// Destination address
        #[arg(short, long)]
        to: String,
    },

    /// Manage burner wallets
    #[command(subcommand)]
    Burner(BurnerCommands),

    /// Quote and compose a gasless swap
    Swap {
        /// Input token mint
        #[arg(long)]
        input: String,

        /// Output token mint
        #[arg(long)]
        output: String,

        /// Amount in base units of the input token
        #[arg(long)]
        amount: u64,

        /// Allowed slippage in basis points
        #[arg(long, default_value = "50")]
        slippage_bps: u16,

        /// Fee payer public key (the sponsor's signer)
        #[arg(long)]
        payer: String,
    },
}

#[derive(Subcommand)]
enum BurnerCommands {
    /// Create a new burner wallet
    New {
        /// Human label for the wallet
        #[arg(short, long)]
        label: String,
    },

    /// List burner wallets with balances
    List,

    /// Send SOL from a burner wallet
    Send {
        /// Burner wallet id
        #[arg(long)]
        id: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount of SOL to send
        #[arg(long)]
        amount: f64,
    },

    /// Destroy a burner wallet, optionally sweeping its balance first
    Burn {
        /// Burner wallet id
        #[arg(long)]
        id: String,

        /// Sweep remaining balance to this address before destruction
        #[arg(long)]
        sweep_to: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = Context::new(&cli.rpc_url, &cli.router_url, cli.store.as_deref())?;

    match cli.command {
        Commands::Address => {
            address::run(&ctx)?;
        }
        Commands::Generate { label } => {
            generate::run(&ctx, label.as_deref())?;
        }
        Commands::List { balances } => {
            list::run(&ctx, balances)?;
        }
        Commands::Sweep { to } => {
            sweep::run(&ctx, &to)?;
        }
        Commands::Burner(cmd) => match cmd {
            BurnerCommands::New { label } => {
                burner::create(&ctx, &label)?;
            }
            BurnerCommands::List => {
                burner::list(&ctx)?;
            }
            BurnerCommands::Send { id, to, amount } => {
                burner::send(&ctx, &id, &to, amount)?;
            }
            BurnerCommands::Burn { id, sweep_to } => {
                burner::burn(&ctx, &id, sweep_to.as_deref())?;
            }
        },
        Commands::Swap {
            input,
            output,
            amount,
            slippage_bps,
            payer,
        } => {
            swap::run(&ctx, &input, &output, amount, slippage_bps, &payer).await?;
        }
    }

    Ok(())
}
