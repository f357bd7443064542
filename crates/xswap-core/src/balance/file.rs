use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::WalletBalanceView;

use super::BalanceSource;

/// Wallet snapshots stored as `<dir>/<wallet>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileBalances {
    dir: PathBuf,
}

impl JsonFileBalances {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn wallet_path(&self, wallet: &str) -> Result<PathBuf, CoreError> {
        let valid = !wallet.is_empty()
            && wallet
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !wallet.starts_with('.');
        if !valid {
            return Err(CoreError::Balance(format!("invalid wallet name `{wallet}`")));
        }
        Ok(self.dir.join(format!("{wallet}.json")))
    }
}

#[async_trait]
impl BalanceSource for JsonFileBalances {
    async fn get_balances(&self, wallet: &str) -> Result<WalletBalanceView, CoreError> {
        let path = self.wallet_path(wallet)?;
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            CoreError::Balance(format!("cannot read wallet `{wallet}` at {}: {e}", path.display()))
        })?;
        let view: WalletBalanceView = serde_json::from_str(&content).map_err(|e| {
            CoreError::Balance(format!("wallet `{wallet}` at {} is not a valid snapshot: {e}", path.display()))
        })?;
        tracing::debug!(
            wallet,
            path = %path.display(),
            utxos = view.utxo_store.as_ref().map(Vec::len),
            "loaded wallet snapshot"
        );
        Ok(view)
    }
}
