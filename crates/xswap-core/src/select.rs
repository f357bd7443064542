//! Greedy UTXO selection.
//!
//! UTXOs are taken in the order the wallet supplies them until the running
//! total covers the request. There is no re-sorting by size, so the same
//! snapshot always yields the same selection.

use crate::codec::type_id;
use crate::error::{CoreError, Shortfall};
use crate::types::{AssetId, Utxo};

/// An amount of one asset that a wallet has to fund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub asset_id: AssetId,
    /// Display name for error messages (usually the asset symbol).
    pub symbol: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub asset_id: AssetId,
    pub chosen: Vec<Utxo>,
    pub total: u64,
    /// `total - requested`; a change output is owed when non-zero.
    pub remainder: u64,
}

impl Selection {
    pub fn needs_change(&self) -> bool {
        self.remainder > 0
    }
}

/// Pick UTXOs of `requirement.asset_id` covering `requirement.amount`.
///
/// `available` is `None` when the wallet has no UTXO store at all, which is
/// reported as `InvalidUtxoSet` rather than a balance shortfall. Only
/// secp256k1 transfer outputs are considered spendable.
pub fn select_utxos(
    available: Option<&[Utxo]>,
    requirement: &Requirement,
) -> Result<Selection, CoreError> {
    let available = available.ok_or_else(|| CoreError::no_utxo_store(&requirement.symbol))?;

    let mut matching = available
        .iter()
        .filter(|u| {
            u.asset_id == requirement.asset_id
                && u.output_type_id == type_id::SECP_TRANSFER_OUTPUT
        })
        .peekable();
    if matching.peek().is_none() {
        return Err(CoreError::InsufficientFunds {
            asset: requirement.symbol.clone(),
            shortfall: Shortfall::NoMatchingAsset,
        });
    }

    let mut chosen = Vec::new();
    let mut total: u64 = 0;
    for utxo in matching {
        if total >= requirement.amount {
            break;
        }
        total = total.saturating_add(utxo.amount);
        chosen.push(utxo.clone());
    }

    if total < requirement.amount {
        return Err(CoreError::InsufficientFunds {
            asset: requirement.symbol.clone(),
            shortfall: Shortfall::InsufficientTotal {
                required: requirement.amount,
                available: total,
            },
        });
    }

    tracing::debug!(
        asset = %requirement.asset_id,
        requested = requirement.amount,
        chosen = chosen.len(),
        total,
        "selected utxos"
    );

    Ok(Selection {
        asset_id: requirement.asset_id,
        chosen,
        total,
        remainder: total - requirement.amount,
    })
}
