//! Validation of the maker's partial transaction and the taker's funds.
//!
//! The maker's transaction leaves exactly one asset over-funded (what the
//! maker gives away; the taker claims it) and exactly one under-funded (what
//! the maker wants; the taker pays it). Everything else must balance.

use std::collections::{BTreeMap, BTreeSet};

use crate::codec::PartialTransaction;
use crate::error::{CoreError, Shortfall};
use crate::references::{input_reference_key, reference_key};
use crate::select::Requirement;
use crate::types::{AssetId, OfferParams, WalletBalanceView};

/// The two legs of an offer, as implied by the maker's partial transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferTerms {
    /// Asset the maker's inputs leave unclaimed, and how much of it.
    pub offered_asset: AssetId,
    pub offered_amount: u64,
    /// Asset the maker's outputs pay out without funding, and how much.
    pub requested_asset: AssetId,
    pub requested_amount: u64,
}

// ==============================================================================
// Maker Side
// ==============================================================================

/// Check the maker's transaction is a well-formed, unsigned two-leg offer on
/// the expected network, and derive its terms.
pub fn offer_terms(
    tx: &PartialTransaction,
    params: &OfferParams,
) -> Result<OfferTerms, CoreError> {
    if tx.is_signed() {
        return Err(CoreError::InvalidOffer(
            "maker transaction already carries credentials".into(),
        ));
    }
    if tx.network_id != params.network_id {
        return Err(CoreError::InvalidOffer(format!(
            "network id {} does not match expected {}",
            tx.network_id, params.network_id
        )));
    }
    if tx.inputs.is_empty() {
        return Err(CoreError::InvalidOffer("maker transaction has no inputs".into()));
    }
    let mut spent = BTreeSet::new();
    for input in &tx.inputs {
        if !spent.insert((input.tx_id, input.output_index)) {
            return Err(CoreError::InvalidOffer(format!(
                "maker transaction spends UTXO {} twice",
                input_reference_key(input)
            )));
        }
    }

    let mut net: BTreeMap<AssetId, i128> = BTreeMap::new();
    for input in &tx.inputs {
        *net.entry(input.asset_id).or_default() += i128::from(input.input.amount);
    }
    for output in &tx.outputs {
        if let Some(amount) = output.transfer_amount() {
            *net.entry(output.asset_id).or_default() -= i128::from(amount);
        }
    }

    let offered: Vec<_> = net.iter().filter(|(_, v)| **v > 0).collect();
    let requested: Vec<_> = net.iter().filter(|(_, v)| **v < 0).collect();

    let (offered_asset, offered_amount) = match offered.as_slice() {
        [(asset, amount)] => (**asset, to_amount(**amount)?),
        [] => {
            return Err(CoreError::InvalidOffer(
                "maker transaction offers no asset".into(),
            ))
        }
        many => {
            return Err(CoreError::InvalidOffer(format!(
                "maker transaction offers {} assets, expected one",
                many.len()
            )))
        }
    };
    let (requested_asset, requested_amount) = match requested.as_slice() {
        [(asset, amount)] => (**asset, to_amount(-**amount)?),
        [] => {
            return Err(CoreError::InvalidOffer(
                "maker transaction requests no asset".into(),
            ))
        }
        many => {
            return Err(CoreError::InvalidOffer(format!(
                "maker transaction requests {} assets, expected one",
                many.len()
            )))
        }
    };

    Ok(OfferTerms {
        offered_asset,
        offered_amount,
        requested_asset,
        requested_amount,
    })
}

fn to_amount(v: i128) -> Result<u64, CoreError> {
    u64::try_from(v).map_err(|_| CoreError::InvalidOffer(format!("amount {v} out of range")))
}

// ==============================================================================
// Taker Side
// ==============================================================================

/// What the taker has to fund: the requested leg plus the network fee in the
/// native asset. When the requested asset is native the two are merged.
pub fn funding_requirements(
    terms: &OfferTerms,
    view: &WalletBalanceView,
    params: &OfferParams,
) -> Result<Vec<Requirement>, CoreError> {
    let native = view.native_asset_id;
    let mut requirements = vec![Requirement {
        asset_id: terms.requested_asset,
        symbol: symbol_for(&terms.requested_asset, view, params),
        amount: terms.requested_amount,
    }];

    if terms.requested_asset == native {
        requirements[0].amount = requirements[0]
            .amount
            .checked_add(params.tx_fee)
            .ok_or_else(|| CoreError::InvalidOffer("requested amount overflows".into()))?;
    } else if params.tx_fee > 0 {
        requirements.push(Requirement {
            asset_id: native,
            symbol: symbol_for(&native, view, params),
            amount: params.tx_fee,
        });
    }
    Ok(requirements)
}

/// Display symbol for an asset: the wallet's own symbol if it holds the
/// asset, the configured native symbol for the native asset, else the id.
fn symbol_for(asset_id: &AssetId, view: &WalletBalanceView, params: &OfferParams) -> String {
    match view.asset(asset_id) {
        Some(asset) => asset.symbol.clone(),
        None if *asset_id == view.native_asset_id => params.native_symbol.clone(),
        None => asset_id.to_string(),
    }
}

/// Check the taker's snapshot can cover every requirement.
///
/// The UTXO store is checked first: a missing store, or one listing the same
/// UTXO twice, is `InvalidUtxoSet`. After that each requirement is compared
/// with the wallet's asset totals.
pub fn check_funds(
    view: &WalletBalanceView,
    requirements: &[Requirement],
    params: &OfferParams,
) -> Result<(), CoreError> {
    let utxos = view
        .utxo_store
        .as_deref()
        .ok_or_else(|| CoreError::no_utxo_store(&params.native_symbol))?;

    let mut seen = BTreeSet::new();
    for utxo in utxos {
        if !seen.insert((utxo.tx_id, utxo.output_index)) {
            return Err(CoreError::InvalidUtxoSet {
                symbol: params.native_symbol.to_lowercase(),
                reason: format!(
                    "UTXO {} is listed more than once",
                    reference_key(&utxo.tx_id, utxo.output_index)
                ),
            });
        }
    }

    for req in requirements {
        let held = view.asset(&req.asset_id).ok_or_else(|| CoreError::InsufficientFunds {
            asset: req.symbol.clone(),
            shortfall: Shortfall::NoMatchingAsset,
        })?;
        if held.amount < req.amount {
            return Err(CoreError::InsufficientFunds {
                asset: req.symbol.clone(),
                shortfall: Shortfall::InsufficientTotal {
                    required: req.amount,
                    available: held.amount,
                },
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{self, Envelope, Output, OutputOwners, TransferOutput, TransferableOutput};
    use crate::test_util::*;
    use crate::types::{Asset, ShortId};

    fn params() -> OfferParams {
        OfferParams::default()
    }

    // -- offer terms -----------------------------------------------------------

    #[test]
    fn terms_of_offer_with_balanced_side_asset() {
        let tx = codec::decode(OFFER_WITH_CHANGE_HEX).expect("fixture decodes");
        let terms = offer_terms(&tx, &params()).expect("valid offer");
        assert_eq!(terms.offered_asset, arp_asset_id());
        assert_eq!(terms.offered_amount, 100);
        assert_eq!(terms.requested_asset, avax_asset_id());
        assert_eq!(terms.requested_amount, 20_000_000);
    }

    #[test]
    fn terms_of_exact_offer() {
        let tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        let terms = offer_terms(&tx, &params()).expect("valid offer");
        assert_eq!(terms.offered_amount, 100);
        assert_eq!(terms.requested_amount, 21_000_000);
    }

    #[test]
    fn signed_transaction_is_not_an_offer() {
        let tx = codec::decode(SIGNED_TAKE_HEX).expect("fixture decodes");
        assert!(matches!(
            offer_terms(&tx, &params()),
            Err(CoreError::InvalidOffer(_))
        ));
    }

    #[test]
    fn wrong_network_is_rejected() {
        let tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        let fuji = OfferParams {
            network_id: 5,
            ..OfferParams::default()
        };
        let err = offer_terms(&tx, &fuji).expect_err("mainnet offer on fuji");
        assert!(err.to_string().contains("network id 1"));
    }

    #[test]
    fn balanced_transaction_requests_nothing() {
        let mut tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        tx.outputs.clear();
        assert!(matches!(
            offer_terms(&tx, &params()),
            Err(CoreError::InvalidOffer(msg)) if msg.contains("requests no asset")
        ));
    }

    #[test]
    fn second_requested_asset_is_rejected() {
        let mut tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        tx.outputs.push(TransferableOutput {
            asset_id: btt_asset_id(),
            output: Output::SecpTransfer(TransferOutput {
                amount: 10,
                owners: OutputOwners::single(ShortId([1; 20])),
            }),
        });
        assert!(matches!(
            offer_terms(&tx, &params()),
            Err(CoreError::InvalidOffer(msg)) if msg.contains("requests 2 assets")
        ));
    }

    #[test]
    fn non_fungible_outputs_do_not_count() {
        let mut tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        tx.outputs.push(TransferableOutput {
            asset_id: btt_asset_id(),
            output: Output::NftMint {
                group_id: 0,
                owners: OutputOwners::single(ShortId([1; 20])),
            },
        });
        let terms = offer_terms(&tx, &params()).expect("still valid");
        assert_eq!(terms.requested_asset, avax_asset_id());
    }

    #[test]
    fn repeated_maker_input_is_rejected() {
        let mut tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        let again = tx.inputs[0].clone();
        tx.inputs.push(again);
        let err = offer_terms(&tx, &params()).expect_err("input spent twice");
        assert!(matches!(
            &err,
            CoreError::InvalidOffer(msg)
                if msg.contains("2ns8XVRdy8TRVJJaa9BTNTu2AvpdGweQ3vXfq3WnJVzAn2Qp9E")
        ));
    }

    #[test]
    fn unsigned_envelope_is_accepted() {
        let mut tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        tx.envelope = Envelope::Unsigned { codec_version: 0 };
        assert!(offer_terms(&tx, &params()).is_ok());
    }

    // -- requirements ----------------------------------------------------------

    #[test]
    fn native_request_absorbs_fee() {
        let tx = codec::decode(OFFER_EXACT_HEX).expect("fixture decodes");
        let terms = offer_terms(&tx, &params()).expect("valid offer");
        let reqs = funding_requirements(&terms, &bob_view(), &params()).expect("reqs");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].asset_id, avax_asset_id());
        assert_eq!(reqs[0].amount, 22_000_000);
        assert_eq!(reqs[0].symbol, "AVAX");
    }

    #[test]
    fn token_request_adds_separate_fee_requirement() {
        let terms = OfferTerms {
            offered_asset: avax_asset_id(),
            offered_amount: 5_000_000,
            requested_asset: arp_asset_id(),
            requested_amount: 100,
        };
        let mut view = bob_view();
        view.assets.push(Asset {
            asset_id: arp_asset_id(),
            name: "SOME TOKEN".into(),
            symbol: "ARP".into(),
            denomination: 2,
            amount: 500,
        });
        let reqs = funding_requirements(&terms, &view, &params()).expect("reqs");
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].symbol, "ARP");
        assert_eq!(reqs[0].amount, 100);
        assert_eq!(reqs[1].asset_id, avax_asset_id());
        assert_eq!(reqs[1].amount, 1_000_000);
    }

    #[test]
    fn unknown_asset_symbol_falls_back_to_id() {
        let terms = OfferTerms {
            offered_asset: avax_asset_id(),
            offered_amount: 1,
            requested_asset: btt_asset_id(),
            requested_amount: 1,
        };
        let reqs = funding_requirements(&terms, &bob_view(), &params()).expect("reqs");
        assert_eq!(reqs[0].symbol, btt_asset_id().to_string());
    }

    // -- funds check -----------------------------------------------------------

    fn avax_req(amount: u64) -> Vec<Requirement> {
        vec![Requirement {
            asset_id: avax_asset_id(),
            symbol: "AVAX".into(),
            amount,
        }]
    }

    #[test]
    fn funded_wallet_passes() {
        check_funds(&bob_view(), &avax_req(22_000_000), &params()).expect("funded");
    }

    #[test]
    fn empty_asset_list_is_no_matching_asset() {
        let mut view = bob_view();
        view.assets.clear();
        let err = check_funds(&view, &avax_req(1), &params()).expect_err("no assets");
        let msg = err.to_string();
        assert!(msg.contains("Insufficient funds. You are trying to send AVAX"));
        assert!(msg.contains("no matching asset"));
    }

    #[test]
    fn low_total_is_insufficient_total() {
        let err = check_funds(&bob_view(), &avax_req(90_000_000), &params()).expect_err("short");
        assert!(err.to_string().contains("insufficient total"));
    }

    #[test]
    fn null_store_is_reported_before_balances() {
        let mut view = bob_view();
        view.utxo_store = None;
        view.assets.clear();
        let err = check_funds(&view, &avax_req(1), &params()).expect_err("no store");
        assert!(err
            .to_string()
            .contains("Not enough avax in the selected utxo"));
        assert!(err.to_string().contains("no UTXO store"));
    }

    #[test]
    fn repeated_utxo_in_store_is_invalid() {
        let mut view = bob_view();
        let mut utxos = bob_utxos();
        utxos.push(utxos[1].clone());
        view.utxo_store = Some(utxos);
        let err = check_funds(&view, &avax_req(1), &params()).expect_err("duplicate utxo");
        match &err {
            CoreError::InvalidUtxoSet { symbol, reason } => {
                assert_eq!(symbol, "avax");
                assert!(reason.contains("qRTFJsBdBBk5PZatmbXMwKvDGUQAxqLi8jRGXVwqVe8X3dbx3"));
            }
            other => panic!("expected InvalidUtxoSet, got {other:?}"),
        }
    }
}
