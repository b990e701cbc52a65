//! Swap transaction signing and submission

use base64::Engine;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use tracing::info;

use crate::error::{Error, Result};

/// Signs the serialized swap transaction and submits it over RPC
pub struct SwapExecutor {
    rpc: Arc<RpcClient>,
    keypair: Arc<Keypair>,
}

impl SwapExecutor {
    pub fn new(rpc: Arc<RpcClient>, keypair: Arc<Keypair>) -> Self {
        Self { rpc, keypair }
    }

    pub fn pubkey(&self) -> solana_sdk::pubkey::Pubkey {
        self.keypair.pubkey()
    }

    /// Decode, sign and send a base64 transaction; returns the signature
    pub fn execute(&self, swap_tx_b64: &str) -> Result<String> {
        let tx_bytes = base64::engine::general_purpose::STANDARD
            .decode(swap_tx_b64)
            .map_err(|e| Error::SwapSend(format!("base64 decode: {e}")))?;

        let unsigned: VersionedTransaction = bincode::deserialize(&tx_bytes)
            .map_err(|e| Error::SwapSend(format!("deserialize: {e}")))?;

        let signature = self.keypair.sign_message(&unsigned.message.serialize());
        let signed = VersionedTransaction {
            signatures: vec![signature],
            message: unsigned.message,
        };

        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(CommitmentLevel::Processed),
            ..Default::default()
        };

        let signature = self
            .rpc
            .send_transaction_with_config(&signed, config)
            .map_err(|e| Error::SwapSend(e.to_string()))?;

        info!("Transaction sent: https://solscan.io/tx/{}", signature);
        Ok(signature.to_string())
    }
}
