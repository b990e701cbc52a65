//! LLM boost-checking agent
//!
//! Asks a chat-completions endpoint how many boosts a pool's DexScreener
//! page currently shows. Purely advisory: any failure degrades to zero
//! boosts and the pipeline carries on.

use serde_json::json;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::{Error, Result};

const SYSTEM_PROMPT: &str = "Given a DexScreener pool link, reply with only the number of \
boosts shown in the \"Boost\" button of the pool data tab. If the value is not available, \
reply with \"0\". Return nothing but the number.";

/// Chat-completions client extracting a boost count per pool
pub struct BoostAgent {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl BoostAgent {
    /// Build an agent when enabled and credentialed, `None` otherwise
    pub fn from_config(config: &AgentConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let api_key = if config.api_key.is_empty() {
            std::env::var("OPENAI_API_KEY").ok()?
        } else {
            config.api_key.clone()
        };

        Some(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Boost count for a pool, zero when the reply is unusable
    pub async fn boosts(&self, pool_address: &str) -> Result<u32> {
        let page = format!("https://dexscreener.com/solana/{pool_address}");
        let request = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": page }
            ],
            "max_tokens": 16
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                endpoint: "chat_completions".into(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("0");

        let boosts = parse_boost_reply(content);
        debug!("Boost agent: {} -> {}", pool_address, boosts);
        Ok(boosts)
    }
}

/// Pull a non-negative integer out of the model's reply, zero otherwise
fn parse_boost_reply(content: &str) -> u32 {
    content.trim().parse::<u32>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_number() {
        assert_eq!(parse_boost_reply("7"), 7);
        assert_eq!(parse_boost_reply("  42\n"), 42);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_boost_reply("no boosts found"), 0);
        assert_eq!(parse_boost_reply(""), 0);
        assert_eq!(parse_boost_reply("-3"), 0);
    }

    #[test]
    fn test_disabled_config_yields_none() {
        let config = AgentConfig::default();
        assert!(BoostAgent::from_config(&config).is_none());
    }
}
