use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Insufficient funds. You are trying to send {asset}, but {shortfall}")]
    InsufficientFunds { asset: String, shortfall: Shortfall },

    #[error("Not enough {symbol} in the selected utxo: {reason}")]
    InvalidUtxoSet { symbol: String, reason: String },

    #[error("malformed transaction at byte {offset}: {reason}")]
    MalformedTransaction { offset: usize, reason: String },

    #[error("malformed address references: {0}")]
    MalformedReferences(String),

    #[error("address reference conflict for {key}: `{existing}` vs `{incoming}`")]
    ReferenceConflict {
        key: String,
        existing: String,
        incoming: String,
    },

    #[error("invalid offer: {0}")]
    InvalidOffer(String),

    #[error("invalid encoding: {0}")]
    Encoding(String),

    #[error("balance retrieval failed: {0}")]
    Balance(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// The wallet could not produce a UTXO store at all.
    pub(crate) fn no_utxo_store(symbol: &str) -> Self {
        Self::InvalidUtxoSet {
            symbol: symbol.to_lowercase(),
            reason: "wallet has no UTXO store".into(),
        }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedTransaction {
            offset,
            reason: reason.into(),
        }
    }
}

/// Why a wallet cannot fund a requested amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortfall {
    /// The wallet holds nothing of the requested asset.
    NoMatchingAsset,
    /// The wallet holds the asset, but not enough of it.
    InsufficientTotal { required: u64, available: u64 },
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingAsset => write!(f, "the wallet holds no matching asset"),
            Self::InsufficientTotal {
                required,
                available,
            } => write!(
                f,
                "the wallet holds an insufficient total ({available} available, {required} required)"
            ),
        }
    }
}
