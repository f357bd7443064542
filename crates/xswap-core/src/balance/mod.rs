//! Wallet balance collaborator.
//!
//! Defines the [`BalanceSource`] trait the offer assembler reads a taker's
//! snapshot from, a directory-backed implementation ([`JsonFileBalances`])
//! and a test mock (`mock::MockBalances`).

mod file;
#[cfg(test)]
pub mod mock;

pub use file::JsonFileBalances;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::WalletBalanceView;

/// Read-only access to wallet snapshots.
///
/// Implementations resolve a wallet name to its current address, assets and
/// UTXO set. A wallet that exists but has no UTXO store is returned with
/// `utxo_store: None`, not as an error.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn get_balances(&self, wallet: &str) -> Result<WalletBalanceView, CoreError>;
}
