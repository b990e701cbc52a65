//! Wallet loading and balance queries

use base64::Engine;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::str::FromStr;
use tracing::warn;

use crate::error::{Error, Result};

/// Environment variable holding the base64-encoded secret key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY_B64";

/// Load the trading keypair from the environment
pub fn load_keypair() -> Result<Keypair> {
    let encoded = std::env::var(PRIVATE_KEY_ENV)
        .map_err(|_| Error::MissingEnvVar(PRIVATE_KEY_ENV.to_string()))?;

    let secret = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::InvalidKeypair(format!("base64 decode: {e}")))?;

    Keypair::from_bytes(&secret).map_err(|e| Error::InvalidKeypair(e.to_string()))
}

/// SOL balance of an account, in SOL
pub fn sol_balance(rpc: &RpcClient, owner: &Pubkey) -> Result<f64> {
    let lamports = rpc.get_balance(owner)?;
    Ok(lamports as f64 / 1e9)
}

/// UI token balance held by `owner` for `mint`; zero when no account exists
pub fn token_balance(rpc: &RpcClient, owner: &Pubkey, mint: &str) -> Result<f64> {
    let mint = Pubkey::from_str(mint).map_err(|e| Error::Rpc(format!("bad mint: {e}")))?;
    let accounts = rpc.get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(mint))?;

    let Some(account) = accounts.first() else {
        return Ok(0.0);
    };

    let account_pubkey = Pubkey::from_str(&account.pubkey)
        .map_err(|e| Error::Rpc(format!("bad token account pubkey: {e}")))?;

    let balance = rpc.get_token_account_balance(&account_pubkey)?;
    match balance.ui_amount {
        Some(amount) => Ok(amount),
        None => {
            warn!("Token account {} has no ui_amount", account_pubkey);
            Ok(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;

    #[test]
    fn test_keypair_round_trip_through_env_encoding() {
        let keypair = Keypair::new();
        let encoded = base64::engine::general_purpose::STANDARD.encode(keypair.to_bytes());
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .unwrap();
        let restored = Keypair::from_bytes(&decoded).unwrap();
        assert_eq!(restored.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_invalid_key_material_rejected() {
        let garbage = base64::engine::general_purpose::STANDARD.encode([1u8; 7]);
        let secret = base64::engine::general_purpose::STANDARD
            .decode(garbage)
            .unwrap();
        assert!(Keypair::from_bytes(&secret).is_err());
    }
}
