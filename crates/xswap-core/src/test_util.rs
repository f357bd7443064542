//! Shared test fixtures for `xswap-core` unit tests.
//!
//! The hex constants are real X-chain transactions: two bare offer-make
//! bodies (one whose taker needs change, one that a 22,000,000 nAVAX UTXO
//! funds exactly) and a signed take transaction. The wallet builders mirror
//! the maker ("alice") and taker ("bob") snapshots those offers were made for.

use crate::types::{Address, Asset, AssetId, TxId, Utxo, WalletBalanceView};

// ==============================================================================
// Transaction Fixtures
// ==============================================================================

/// Maker sells 100 ARP for 20,000,000 nAVAX and also spends/returns 7000 BTT.
pub const OFFER_WITH_CHANGE_HEX: &str = concat!(
    "00000001ed5f38341e436e5d46e2bb00b45d62ae97d1b050c64bc634ae10626739e35c4b",
    "0000000221e67317cbc4be2aeb00677ad6462778a8f52274b9d605df2591b23027a87dff",
    "000000070000000001312d0000000000000000000000000100000001639779b615d3d905",
    "2915ba105bb26627383225c2f808d594b0360d20f7b4214bdb51a773d0f5eb34c5157eea",
    "285fefa5a86f5e16000000070000000000001b5800000000000000000000000100000001",
    "639779b615d3d9052915ba105bb26627383225c2000000026a9802ce0e6781104c752ab0",
    "e597b33d10d398a170479390fc5364f7ec2024d100000004f808d594b0360d20f7b4214b",
    "db51a773d0f5eb34c5157eea285fefa5a86f5e16000000050000000000001b5800000001",
    "00000000ebd62c45493b7414ff03147d59d5a8c61521fc784a942f772beb64c6c6a9c584",
    "00000001e49b53ab21c6f7b10bf8efb3e3bc0059954989b3d481a9cb862f4b0b7d57c645",
    "000000050000000000000064000000010000000000000022547820637265617465642066",
    "726f6d206f66666572206d616b6520636f6d6d616e64",
);

/// Maker sells 100 ARP for 21,000,000 nAVAX.
pub const OFFER_EXACT_HEX: &str = concat!(
    "00000001ed5f38341e436e5d46e2bb00b45d62ae97d1b050c64bc634ae10626739e35c4b",
    "0000000121e67317cbc4be2aeb00677ad6462778a8f52274b9d605df2591b23027a87dff",
    "000000070000000001406f4000000000000000000000000100000001357cbe3c52ac211f",
    "a6b666d84b3ef6aa1c17f97e00000001ebd62c45493b7414ff03147d59d5a8c61521fc78",
    "4a942f772beb64c6c6a9c58400000001e49b53ab21c6f7b10bf8efb3e3bc0059954989b3",
    "d481a9cb862f4b0b7d57c645000000050000000000000064000000010000000000000022",
    "547820637265617465642066726f6d206f66666572206d616b6520636f6d6d616e64",
);

/// Fully signed take of `OFFER_EXACT_HEX`, in sorted input/output order.
pub const SIGNED_TAKE_HEX: &str = concat!(
    "00000000000000000001ed5f38341e436e5d46e2bb00b45d62ae97d1b050c64bc634ae10",
    "626739e35c4b0000000221e67317cbc4be2aeb00677ad6462778a8f52274b9d605df2591",
    "b23027a87dff000000070000000001406f4000000000000000000000000100000001357c",
    "be3c52ac211fa6b666d84b3ef6aa1c17f97ee49b53ab21c6f7b10bf8efb3e3bc00599549",
    "89b3d481a9cb862f4b0b7d57c64500000007000000000000006400000000000000000000",
    "000100000001b35b607de88582d07687c443de96cdb04aa7737d000000026df278ccbb30",
    "6b0c6f609c975b17d1b4c4f076cae49388fd81ccb2b76bf62e1f0000000021e67317cbc4",
    "be2aeb00677ad6462778a8f52274b9d605df2591b23027a87dff0000000500000000014f",
    "b1800000000100000000ebd62c45493b7414ff03147d59d5a8c61521fc784a942f772beb",
    "64c6c6a9c58400000001e49b53ab21c6f7b10bf8efb3e3bc0059954989b3d481a9cb862f",
    "4b0b7d57c645000000050000000000000064000000010000000000000022547820637265",
    "617465642066726f6d206f666665722074616b6520636f6d6d616e640000000200000009",
    "000000013f105fce7d587bbacfd7dc813e007df9d987bbe4bec8b1bcac241e6efc335ced",
    "70df16a7b23497f50f8835dc2c92baf13efb3aca209e98f5bc80e737437f61ab01000000",
    "0900000000",
);

/// Reference table shipped with both offers: the maker's ARP input.
pub const MAKER_REFERENCES: &str =
    r#"{"2ns8XVRdy8TRVJJaa9BTNTu2AvpdGweQ3vXfq3WnJVzAn2Qp9E":"X-avax1x47tu0zj4ss3lf4kvmvyk0hk4gwp07t7jhh0kn"}"#;

pub const ALICE_ADDRESS: &str = "X-avax1x47tu0zj4ss3lf4kvmvyk0hk4gwp07t7jhh0kn";
pub const BOB_ADDRESS: &str = "X-avax1kddkql0gskpdqa58c3paa9kdkp92wuma4w6zj6";

/// Funding transaction of every UTXO in bob's wallet.
pub const BOB_FUNDING_TXID: &str = "qRTFJsBdBBk5PZatmbXMwKvDGUQAxqLi8jRGXVwqVe8dCqTbW";

// ==============================================================================
// Identifier Helpers
// ==============================================================================

pub fn avax_asset_id() -> AssetId {
    "FvwEAhmxKfeiG8SnEvq42hc6whRyY3EFYAvebMqDNDGCgxN5Z"
        .parse()
        .expect("valid AVAX asset id")
}

pub fn arp_asset_id() -> AssetId {
    "2jgTFB6MM4vwLzUNWFYGPfyeQfpLaEqj4XWku6FoW7vaGrrEd5"
        .parse()
        .expect("valid ARP asset id")
}

pub fn btt_asset_id() -> AssetId {
    "2tEi6r6PZ9VXHogUmkCzvijmW81TRNjtKWnR4FA55zTPc87fxC"
        .parse()
        .expect("valid BTT asset id")
}

pub fn alice_address() -> Address {
    ALICE_ADDRESS.parse().expect("valid alice address")
}

pub fn bob_address() -> Address {
    BOB_ADDRESS.parse().expect("valid bob address")
}

/// Create a deterministic `TxId` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> TxId {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    TxId(bytes)
}

// ==============================================================================
// Wallet Builders
// ==============================================================================

pub fn make_utxo(tx_id: TxId, output_index: u32, amount: u64, asset_id: AssetId) -> Utxo {
    Utxo {
        tx_id,
        output_index,
        amount,
        asset_id,
        output_type_id: crate::codec::type_id::SECP_TRANSFER_OUTPUT,
    }
}

/// Bob's AVAX UTXOs in wallet order: 30M (#2), 22M (#0), 30M (#3), 1M (#1).
pub fn bob_utxos() -> Vec<Utxo> {
    let funding: TxId = BOB_FUNDING_TXID.parse().expect("valid txid");
    vec![
        make_utxo(funding, 2, 30_000_000, avax_asset_id()),
        make_utxo(funding, 0, 22_000_000, avax_asset_id()),
        make_utxo(funding, 3, 30_000_000, avax_asset_id()),
        make_utxo(funding, 1, 1_000_000, avax_asset_id()),
    ]
}

pub fn avax_asset(amount: u64) -> Asset {
    Asset {
        asset_id: avax_asset_id(),
        name: "Avalanche".into(),
        symbol: "AVAX".into(),
        denomination: 9,
        amount,
    }
}

pub fn bob_view() -> WalletBalanceView {
    WalletBalanceView {
        address: bob_address(),
        native_asset_id: avax_asset_id(),
        utxo_store: Some(bob_utxos()),
        assets: vec![avax_asset(83_000_000)],
    }
}

/// A view of bob's wallet in the JSON shape wallet exports use.
pub fn bob_view_json() -> String {
    serde_json::to_string(&bob_view()).expect("view serializes")
}
