use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::WalletBalanceView;

use super::BalanceSource;

/// A mock balance backend for testing. Returns canned snapshots from a
/// `HashMap` populated via the builder pattern.
pub struct MockBalances {
    wallets: HashMap<String, WalletBalanceView>,
    failures: HashMap<String, String>,
}

impl MockBalances {
    pub fn builder() -> MockBalancesBuilder {
        MockBalancesBuilder {
            wallets: HashMap::new(),
            failures: HashMap::new(),
        }
    }
}

pub struct MockBalancesBuilder {
    wallets: HashMap<String, WalletBalanceView>,
    failures: HashMap<String, String>,
}

impl MockBalancesBuilder {
    pub fn with_wallet(mut self, name: &str, view: WalletBalanceView) -> Self {
        self.wallets.insert(name.to_owned(), view);
        self
    }

    /// Make lookups of `name` fail with `CoreError::Balance(reason)`.
    pub fn with_failure(mut self, name: &str, reason: &str) -> Self {
        self.failures.insert(name.to_owned(), reason.to_owned());
        self
    }

    pub fn build(self) -> MockBalances {
        MockBalances {
            wallets: self.wallets,
            failures: self.failures,
        }
    }
}

#[async_trait]
impl BalanceSource for MockBalances {
    async fn get_balances(&self, wallet: &str) -> Result<WalletBalanceView, CoreError> {
        if let Some(reason) = self.failures.get(wallet) {
            return Err(CoreError::Balance(reason.clone()));
        }
        self.wallets
            .get(wallet)
            .cloned()
            .ok_or_else(|| CoreError::Balance(format!("unknown wallet `{wallet}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn returns_registered_wallets() {
        let mock = MockBalances::builder().with_wallet("bob", bob_view()).build();
        let view = mock.get_balances("bob").await.expect("bob exists");
        assert_eq!(view.address, bob_address());
        assert!(mock.get_balances("alice").await.is_err());
    }

    #[tokio::test]
    async fn failure_takes_precedence() {
        let mock = MockBalances::builder()
            .with_wallet("bob", bob_view())
            .with_failure("bob", "node offline")
            .build();
        let err = mock.get_balances("bob").await.expect_err("configured failure");
        assert!(err.to_string().contains("node offline"));
    }
}
