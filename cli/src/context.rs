//! Shared command context: store location, password prompts, collaborators

use anyhow::{bail, Context as _, Result};
use std::path::PathBuf;

use sable_wallet::config::{LedgerConfig, RouterConfig};
use sable_wallet::ledger::SolanaLedger;
use sable_wallet::store::EncryptedFileStore;
use sable_wallet::swap::RouterClient;

const SABLE_DIR: &str = ".sable";
const STORE_FILE: &str = "store.enc";

pub struct Context {
    pub ledger_config: LedgerConfig,
    pub router_config: RouterConfig,
    pub store_path: PathBuf,
}

impl Context {
    pub fn new(rpc_url: &str, router_url: &str, store: Option<&str>) -> Result<Self> {
        let store_path = match store {
            Some(path) => PathBuf::from(path),
            None => default_store_path()?,
        };
        Ok(Self {
            ledger_config: LedgerConfig::new(rpc_url),
            router_config: RouterConfig::new(router_url),
            store_path,
        })
    }

    /// Open (or initialize) the encrypted store, prompting for the
    /// password. First use asks for confirmation and validates strength.
    pub fn open_store(&self) -> Result<EncryptedFileStore> {
        let password = if EncryptedFileStore::exists(&self.store_path) {
            prompt_password("Enter wallet password: ")?
        } else {
            println!("No wallet store found - creating {}", self.store_path.display());
            prompt_new_password("Choose a wallet password: ")?
        };

        EncryptedFileStore::open(self.store_path.clone(), &password)
            .context("Failed to open wallet store. Wrong password?")
    }

    pub fn ledger(&self) -> SolanaLedger {
        SolanaLedger::new(&self.ledger_config)
    }

    pub fn router(&self) -> Result<RouterClient> {
        RouterClient::new(&self.router_config).context("Failed to build router client")
    }
}

fn default_store_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(SABLE_DIR).join(STORE_FILE))
}

/// Prompt for a password securely (hides input)
pub fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

/// Prompt for a new password with confirmation
pub fn prompt_new_password(prompt: &str) -> Result<String> {
    let password = prompt_password(prompt)?;
    let confirm = prompt_password("Confirm password: ")?;

    if password != confirm {
        bail!("Passwords do not match");
    }

    Ok(password)
}
