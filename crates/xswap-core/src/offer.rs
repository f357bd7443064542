//! Offer-take assembly.
//!
//! Taking an offer walks a typed state machine:
//!
//! ```text
//! Received --validate--> Validated --extend--> Extended --finalize--> Finalized
//! ```
//!
//! Each transition consumes the previous state, so a half-built transaction
//! can never escape: either `finalize` hands back a complete result or some
//! step returned an error and everything built so far is dropped.
//!
//! The maker's inputs and outputs form a prefix that is never touched. The
//! taker's inputs (in selection order) and outputs (receive, then change) are
//! appended after it.

use serde::{Deserialize, Serialize};

use crate::balance::BalanceSource;
use crate::codec::{
    self, Output, OutputOwners, PartialTransaction, TransferInput, TransferOutput,
    TransferableInput, TransferableOutput,
};
use crate::error::CoreError;
use crate::references::{input_reference_key, reference_key, AddressReferences};
use crate::select::{select_utxos, Requirement, Selection};
use crate::types::{OfferParams, WalletBalanceView};
use crate::validate::{check_funds, funding_requirements, offer_terms, OfferTerms};

/// Combined transaction and reference table, ready for a signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeResult {
    pub tx_hex: String,
    /// JSON object of reference key to address, in key order.
    pub addr_references: String,
}

// ==============================================================================
// States
// ==============================================================================

/// The maker's partial transaction and reference table, decoded.
#[derive(Debug, Clone)]
pub struct Received {
    tx: PartialTransaction,
    references: AddressReferences,
}

/// The offer is well formed and the taker's snapshot covers it.
#[derive(Debug)]
pub struct Validated<'v> {
    tx: PartialTransaction,
    references: AddressReferences,
    terms: OfferTerms,
    view: &'v WalletBalanceView,
    requirements: Vec<Requirement>,
}

/// The taker's inputs and outputs have been appended.
#[derive(Debug)]
pub struct Extended {
    tx: PartialTransaction,
    maker_references: AddressReferences,
    taker_references: AddressReferences,
    maker_inputs: usize,
    maker_outputs: usize,
}

/// The combined transaction, encoded, with the merged reference table.
#[derive(Debug, Clone)]
pub struct Finalized {
    tx: PartialTransaction,
    references: AddressReferences,
    tx_hex: String,
}

// ==============================================================================
// Transitions
// ==============================================================================

impl Received {
    /// Decode the maker's transaction hex and reference JSON.
    pub fn decode(tx_hex: &str, references_json: &str) -> Result<Self, CoreError> {
        let tx = codec::decode(tx_hex)?;
        let references = AddressReferences::parse(references_json)?;
        tracing::debug!(
            outputs = tx.outputs.len(),
            inputs = tx.inputs.len(),
            references = references.len(),
            "received offer"
        );
        Ok(Self { tx, references })
    }

    pub fn transaction(&self) -> &PartialTransaction {
        &self.tx
    }

    pub fn references(&self) -> &AddressReferences {
        &self.references
    }

    /// Check the offer's structure and the taker's funds against `view`.
    pub fn validate<'v>(
        self,
        view: &'v WalletBalanceView,
        params: &OfferParams,
    ) -> Result<Validated<'v>, CoreError> {
        let terms = offer_terms(&self.tx, params)?;

        for input in &self.tx.inputs {
            let key = input_reference_key(input);
            if !self.references.contains_key(&key) {
                tracing::warn!(
                    key = %key,
                    tx_id = %input.tx_id,
                    output_index = input.output_index,
                    "maker input has no address reference"
                );
            }
        }

        let requirements = funding_requirements(&terms, view, params)?;
        check_funds(view, &requirements, params)?;

        tracing::debug!(
            offered_asset = %terms.offered_asset,
            offered_amount = terms.offered_amount,
            requested_asset = %terms.requested_asset,
            requested_amount = terms.requested_amount,
            "validated offer"
        );
        Ok(Validated {
            tx: self.tx,
            references: self.references,
            terms,
            view,
            requirements,
        })
    }
}

impl<'v> Validated<'v> {
    pub fn terms(&self) -> &OfferTerms {
        &self.terms
    }

    /// Select the taker's UTXOs and append the taker's inputs and outputs.
    pub fn extend(self) -> Result<Extended, CoreError> {
        let Self {
            mut tx,
            references,
            terms,
            view,
            requirements,
        } = self;

        let selections = requirements
            .iter()
            .map(|req| select_utxos(view.utxo_store.as_deref(), req))
            .collect::<Result<Vec<Selection>, _>>()?;

        let maker_inputs = tx.inputs.len();
        let maker_outputs = tx.outputs.len();
        let taker = view.address.to_string();
        let taker_owner = || OutputOwners::single(view.address.short_id());

        let mut taker_references = AddressReferences::new();
        for utxo in selections.iter().flat_map(|s| &s.chosen) {
            tx.inputs.push(TransferableInput {
                tx_id: utxo.tx_id,
                output_index: utxo.output_index,
                asset_id: utxo.asset_id,
                input: TransferInput {
                    amount: utxo.amount,
                    sig_indices: vec![0],
                },
            });
            taker_references
                .insert_new(reference_key(&utxo.tx_id, utxo.output_index), taker.clone())?;
        }

        tx.outputs.push(TransferableOutput {
            asset_id: terms.offered_asset,
            output: Output::SecpTransfer(TransferOutput {
                amount: terms.offered_amount,
                owners: taker_owner(),
            }),
        });
        for selection in selections.iter().filter(|s| s.needs_change()) {
            tracing::debug!(
                asset = %selection.asset_id,
                remainder = selection.remainder,
                "adding change output"
            );
            tx.outputs.push(TransferableOutput {
                asset_id: selection.asset_id,
                output: Output::SecpTransfer(TransferOutput {
                    amount: selection.remainder,
                    owners: taker_owner(),
                }),
            });
        }

        tracing::debug!(
            taker_inputs = tx.inputs.len() - maker_inputs,
            taker_outputs = tx.outputs.len() - maker_outputs,
            "extended offer"
        );
        Ok(Extended {
            tx,
            maker_references: references,
            taker_references,
            maker_inputs,
            maker_outputs,
        })
    }
}

impl Extended {
    pub fn transaction(&self) -> &PartialTransaction {
        &self.tx
    }

    /// Number of leading inputs and outputs that belong to the maker.
    pub fn maker_prefix(&self) -> (usize, usize) {
        (self.maker_inputs, self.maker_outputs)
    }

    pub fn taker_references(&self) -> &AddressReferences {
        &self.taker_references
    }

    /// Merge the reference tables and encode the combined transaction.
    ///
    /// A taker UTXO that the maker already spends or references means both
    /// sides funded from the same output, and is a conflict even when the
    /// addresses agree.
    pub fn finalize(self) -> Result<Finalized, CoreError> {
        for maker_input in &self.tx.inputs[..self.maker_inputs] {
            let key = input_reference_key(maker_input);
            if let Some(incoming) = self.taker_references.get(&key) {
                return Err(CoreError::ReferenceConflict {
                    existing: self
                        .maker_references
                        .get(&key)
                        .unwrap_or("maker input")
                        .to_owned(),
                    incoming: incoming.to_owned(),
                    key,
                });
            }
        }
        for (key, incoming) in self.taker_references.iter() {
            if let Some(existing) = self.maker_references.get(key) {
                return Err(CoreError::ReferenceConflict {
                    key: key.to_owned(),
                    existing: existing.to_owned(),
                    incoming: incoming.to_owned(),
                });
            }
        }

        let references = self.maker_references.merge(&self.taker_references)?;
        let tx_hex = codec::encode(&self.tx);

        tracing::info!(
            inputs = self.tx.inputs.len(),
            outputs = self.tx.outputs.len(),
            references = references.len(),
            "offer taken"
        );
        Ok(Finalized {
            tx: self.tx,
            references,
            tx_hex,
        })
    }
}

impl Finalized {
    pub fn transaction(&self) -> &PartialTransaction {
        &self.tx
    }

    pub fn references(&self) -> &AddressReferences {
        &self.references
    }

    pub fn tx_hex(&self) -> &str {
        &self.tx_hex
    }

    pub fn into_result(self) -> TakeResult {
        TakeResult {
            addr_references: self.references.to_json(),
            tx_hex: self.tx_hex,
        }
    }
}

// ==============================================================================
// Entry Points
// ==============================================================================

/// Take an offer against an already-fetched wallet snapshot.
pub fn take_offer(
    tx_hex: &str,
    references_json: &str,
    view: &WalletBalanceView,
    params: &OfferParams,
) -> Result<TakeResult, CoreError> {
    Ok(Received::decode(tx_hex, references_json)?
        .validate(view, params)?
        .extend()?
        .finalize()?
        .into_result())
}

/// Take an offer for `wallet`, fetching its snapshot from `source`.
///
/// Malformed input is rejected before the balance source is consulted.
pub async fn offer_take(
    source: &dyn BalanceSource,
    wallet: &str,
    tx_hex: &str,
    references_json: &str,
    params: &OfferParams,
) -> Result<TakeResult, CoreError> {
    let received = Received::decode(tx_hex, references_json)?;
    let view = source.get_balances(wallet).await?;
    Ok(received
        .validate(&view, params)?
        .extend()?
        .finalize()?
        .into_result())
}
