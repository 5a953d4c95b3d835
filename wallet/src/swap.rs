//! Gasless swap composer
//!
//! Turns a trade request into a fee-sponsored-signable instruction list:
//! quote from the external router, raw instructions fetched and decoded
//! into native form in the fixed [setup.., swap, cleanup?] order, every
//! compute-budget instruction stripped, and every address lookup table
//! resolved into its live on-chain snapshot.
//!
//! The compute-budget filter is correctness-critical: the fee sponsor
//! sets its own compute-budget instructions, and a transaction carrying
//! duplicates is rejected outright.
//!
//! A [`SwapPlan`] is transient. It is never persisted, and once older
//! than the staleness bound it must be discarded and rebuilt - routing
//! conditions on chain may have changed. A stale plan is a signal to
//! re-quote, not an error.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    compute_budget,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::config::RouterConfig;
use crate::error::{Result, WalletError};
use crate::ledger::Ledger;

/// Price quote from the router. The fields composition needs are typed;
/// everything else the router returned is preserved verbatim in `extra`
/// and echoed back when requesting instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    pub slippage_bps: u16,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One raw instruction as the router serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterInstruction {
    pub program_id: String,
    pub accounts: Vec<RouterAccountMeta>,
    /// Instruction data, base64.
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterAccountMeta {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Raw instruction set for one quote, in the router's fixed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructionsResponse {
    #[serde(default)]
    pub setup_instructions: Vec<RouterInstruction>,
    pub swap_instruction: RouterInstruction,
    #[serde(default)]
    pub cleanup_instruction: Option<RouterInstruction>,
    #[serde(default)]
    pub address_lookup_table_addresses: Vec<String>,
}

impl RouterInstruction {
    fn to_instruction(&self) -> Result<Instruction> {
        let program_id = parse_pubkey(&self.program_id)?;
        let accounts = self
            .accounts
            .iter()
            .map(|meta| {
                Ok(AccountMeta {
                    pubkey: parse_pubkey(&meta.pubkey)?,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let data = BASE64
            .decode(&self.data)
            .map_err(|e| WalletError::Compose(format!("invalid instruction data: {e}")))?;

        Ok(Instruction {
            program_id,
            accounts,
            data,
        })
    }
}

fn parse_pubkey(s: &str) -> Result<Pubkey> {
    Pubkey::from_str(s).map_err(|_| WalletError::Compose(format!("invalid pubkey in response: {s}")))
}

/// Decode the router's instructions in [setup.., swap, cleanup?] order
/// and drop every instruction addressed to the compute-budget program,
/// preserving the relative order of the survivors.
pub fn assemble_instructions(response: &SwapInstructionsResponse) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::with_capacity(response.setup_instructions.len() + 2);
    for raw in &response.setup_instructions {
        instructions.push(raw.to_instruction()?);
    }
    instructions.push(response.swap_instruction.to_instruction()?);
    if let Some(cleanup) = &response.cleanup_instruction {
        instructions.push(cleanup.to_instruction()?);
    }

    instructions.retain(|ix| ix.program_id != compute_budget::id());
    Ok(instructions)
}

/// Resolve every lookup-table reference into its live snapshot.
///
/// An unresolvable table fails the whole composition: account indices
/// inside the instructions depend on table contents, so a swap cannot be
/// safely assembled from a partially-resolved set.
pub fn resolve_lookup_tables(
    addresses: &[String],
    ledger: &dyn Ledger,
) -> Result<Vec<AddressLookupTableAccount>> {
    addresses
        .iter()
        .map(|raw| {
            let address = parse_pubkey(raw)?;
            ledger.resolve_lookup_table(&address)?.ok_or_else(|| {
                WalletError::Compose(format!("address lookup table {address} not found"))
            })
        })
        .collect()
}

/// An ordered, filtered, table-resolved instruction set ready for
/// fee-sponsored signing. Owned by the caller and discarded after use.
#[derive(Debug)]
pub struct SwapPlan {
    pub quote: Quote,
    pub instructions: Vec<Instruction>,
    pub lookup_tables: Vec<AddressLookupTableAccount>,
    created_at: Instant,
}

impl SwapPlan {
    /// Time elapsed since the plan was composed.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Whether the plan is still fresh enough to sign. A stale plan is
    /// not an error; the caller re-enters quoting.
    pub fn is_valid(&self, max_age: Duration) -> bool {
        plan_is_fresh(self.age(), max_age)
    }
}

/// Freshness predicate: invalid only once more than `max_age` has
/// elapsed. Pure, so tests need no clock mocking.
pub fn plan_is_fresh(age: Duration, max_age: Duration) -> bool {
    age <= max_age
}

/// HTTP client for the route-quoting service.
pub struct RouterClient {
    http: reqwest::Client,
    base_url: String,
}

impl RouterClient {
    pub fn new(config: &RouterConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WalletError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a price quote. No retry here; retry policy belongs to the
    /// caller.
    pub async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<Quote> {
        parse_pubkey(input_mint)
            .map_err(|_| WalletError::Validation(format!("invalid input mint: {input_mint}")))?;
        parse_pubkey(output_mint)
            .map_err(|_| WalletError::Validation(format!("invalid output mint: {output_mint}")))?;
        if amount == 0 {
            return Err(WalletError::Validation("amount must be positive".into()));
        }

        let url = format!("{}/quote", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount.to_string()),
                ("slippageBps", slippage_bps.to_string()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WalletError::Quote(format!("router returned {status}: {text}")));
        }

        response
            .json::<Quote>()
            .await
            .map_err(|e| WalletError::Quote(format!("malformed quote response: {e}")))
    }

    /// Fetch the raw instruction set for a quote.
    pub async fn swap_instructions(
        &self,
        quote: &Quote,
        payer: &Pubkey,
    ) -> Result<SwapInstructionsResponse> {
        let url = format!("{}/swap-instructions", self.base_url);
        let body = serde_json::json!({
            "quoteResponse": quote,
            "userPublicKey": payer.to_string(),
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WalletError::Compose(format!(
                "router returned {status}: {text}"
            )));
        }

        response
            .json::<SwapInstructionsResponse>()
            .await
            .map_err(|e| WalletError::Compose(format!("malformed instruction response: {e}")))
    }
}

fn map_transport_error(err: reqwest::Error) -> WalletError {
    if err.is_timeout() {
        WalletError::Timeout(err.to_string())
    } else {
        WalletError::Network(err.to_string())
    }
}

/// Composer tying the router and the ledger together for one swap
/// attempt. Holds no state; cancellation between calls is safe because a
/// plan is purely additive and rebuildable.
pub struct GaslessSwapComposer<'a> {
    router: &'a RouterClient,
    ledger: &'a dyn Ledger,
}

impl<'a> GaslessSwapComposer<'a> {
    pub fn new(router: &'a RouterClient, ledger: &'a dyn Ledger) -> Self {
        Self { router, ledger }
    }

    pub async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<Quote> {
        self.router
            .get_quote(input_mint, output_mint, amount, slippage_bps)
            .await
    }

    /// Compose a signable plan for `quote`, sponsored for `payer`.
    ///
    /// Lookup-table resolution runs on the blocking ledger client, so
    /// that leg occupies the async worker and cannot be cancelled
    /// mid-call; it is bounded by the ledger's per-call timeout. Callers
    /// needing a tighter bound should shorten [`crate::config::LedgerConfig::timeout`].
    pub async fn compose(&self, quote: &Quote, payer: &Pubkey) -> Result<SwapPlan> {
        let response = self.router.swap_instructions(quote, payer).await?;
        let instructions = assemble_instructions(&response)?;
        let lookup_tables =
            resolve_lookup_tables(&response.address_lookup_table_addresses, self.ledger)?;

        Ok(SwapPlan {
            quote: quote.clone(),
            instructions,
            lookup_tables,
            created_at: Instant::now(),
        })
    }
}
