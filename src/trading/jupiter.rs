//! Jupiter swap-routing API client
//!
//! Two-step flow: fetch a quote, then exchange it for an unsigned
//! serialized transaction. The quote payload is passed back verbatim in
//! the swap request, so it is kept as raw JSON alongside the fields we
//! read ourselves.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::JupiterConfig;
use crate::error::{Error, Result};

/// Wrapped SOL mint, the input side of every buy
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// A quote plus the verbatim payload the swap endpoint expects back
#[derive(Debug, Clone)]
pub struct SwapQuote {
    /// Expected output amount in base units (lamports for SOL)
    pub out_amount: u64,
    raw: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriorityLevelWithMaxLamports {
    max_lamports: u64,
    priority_level: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
    priority_level_with_max_lamports: PriorityLevelWithMaxLamports,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest {
    user_public_key: String,
    quote_response: serde_json::Value,
    prioritization_fee_lamports: PrioritizationFee,
    dynamic_compute_unit_limit: bool,
    dynamic_slippage: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: Option<String>,
    error: Option<String>,
}

/// Jupiter quote + swap HTTP client
pub struct JupiterClient {
    client: reqwest::Client,
    config: JupiterConfig,
}

impl JupiterClient {
    pub fn new(config: JupiterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch an ExactIn quote for `amount` base units of `input_mint`
    pub async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
    ) -> Result<SwapQuote> {
        debug!("Quote: {} -> {} amount={}", input_mint, output_mint, amount);

        let amount = amount.to_string();
        let slippage_bps = self.config.slippage_bps.to_string();
        let resp = self
            .client
            .get(&self.config.quote_url)
            .query(&[
                ("inputMint", input_mint),
                ("outputMint", output_mint),
                ("amount", amount.as_str()),
                ("slippageBps", slippage_bps.as_str()),
                ("swapMode", "ExactIn"),
                ("restrictIntermediateTokens", "true"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::SwapQuote(format!(
                "quote endpoint returned {status}"
            )));
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::SwapQuote(format!("malformed quote: {e}")))?;

        let out_amount = raw["outAmount"]
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| Error::SwapQuote("quote has no outAmount".into()))?;

        Ok(SwapQuote { out_amount, raw })
    }

    /// Exchange a quote for an unsigned base64 transaction
    pub async fn swap_transaction(&self, user_public_key: &str, quote: &SwapQuote) -> Result<String> {
        let request = SwapRequest {
            user_public_key: user_public_key.to_string(),
            quote_response: quote.raw.clone(),
            prioritization_fee_lamports: PrioritizationFee {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    max_lamports: self.config.max_priority_fee_lamports,
                    priority_level: "veryHigh",
                },
            },
            dynamic_compute_unit_limit: true,
            dynamic_slippage: true,
        };

        let resp = self
            .client
            .post(&self.config.swap_url)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::SwapQuote(format!("swap endpoint returned {status}")));
        }

        let swap: SwapResponse = resp
            .json()
            .await
            .map_err(|e| Error::SwapQuote(format!("malformed swap response: {e}")))?;

        match swap.swap_transaction {
            Some(tx) => {
                info!("Swap transaction built ({} bytes base64)", tx.len());
                Ok(tx)
            }
            None => Err(Error::SwapQuote(
                swap.error.unwrap_or_else(|| "no swapTransaction in response".into()),
            )),
        }
    }
}

impl SwapQuote {
    /// Expected SOL output, for logging sells
    pub fn out_amount_sol(&self) -> f64 {
        self.out_amount as f64 / 1e9
    }

    #[cfg(test)]
    pub(crate) fn fake(out_amount: u64) -> Self {
        Self {
            out_amount,
            raw: serde_json::json!({ "outAmount": out_amount.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_amount_sol_conversion() {
        let quote = SwapQuote::fake(18_500_000);
        assert!((quote.out_amount_sol() - 0.0185).abs() < 1e-12);
    }

    #[test]
    fn test_swap_request_serializes_camel_case() {
        let request = SwapRequest {
            user_public_key: "Wallet111".into(),
            quote_response: serde_json::json!({ "outAmount": "1" }),
            prioritization_fee_lamports: PrioritizationFee {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    max_lamports: 10_000_000,
                    priority_level: "veryHigh",
                },
            },
            dynamic_compute_unit_limit: true,
            dynamic_slippage: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["userPublicKey"], "Wallet111");
        assert_eq!(
            value["prioritizationFeeLamports"]["priorityLevelWithMaxLamports"]["priorityLevel"],
            "veryHigh"
        );
        assert_eq!(value["dynamicSlippage"], true);
    }

    #[test]
    fn test_swap_response_error_branch() {
        let swap: SwapResponse = serde_json::from_value(serde_json::json!({
            "error": "route not found"
        }))
        .unwrap();
        assert!(swap.swap_transaction.is_none());
        assert_eq!(swap.error.as_deref(), Some("route not found"));
    }
}
