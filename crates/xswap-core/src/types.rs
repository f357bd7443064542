//! Domain types shared by the codec, selector and offer assembler.
//!
//! Contains the 32-byte identifiers (`TxId`, `AssetId`, `ChainId`), the
//! 20-byte `ShortId` and its human-readable `Address`, the wallet-side
//! `Utxo` / `Asset` / `WalletBalanceView` snapshot, and `OfferParams`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::type_id;
use crate::encoding::{bech32_decode, bech32_encode, cb58_decode, cb58_encode};
use crate::error::CoreError;

// ==============================================================================
// 32-byte Identifiers
// ==============================================================================

macro_rules! cb58_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&cb58_encode(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = cb58_decode(s.trim())?;
                let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
                    CoreError::Encoding(format!(
                        "expected 32-byte {} but `{s}` decodes to {} bytes",
                        stringify!($name),
                        b.len()
                    ))
                })?;
                Ok(Self(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

cb58_id!(
    /// Id of the transaction that created a UTXO.
    TxId
);
cb58_id!(
    /// Id of an asset on the X-chain.
    AssetId
);
cb58_id!(
    /// Id of the blockchain a transaction is bound to.
    ChainId
);

// ==============================================================================
// Addresses
// ==============================================================================

/// The 20-byte hash of a public key, as stored in output owner lists.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortId(pub [u8; 20]);

impl fmt::Debug for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortId({})", hex::encode(self.0))
    }
}

impl Serialize for ShortId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

/// A chain-qualified bech32 address such as `X-avax1...`.
///
/// Built only through [`Address::new`] or parsing, both of which check the
/// human-readable part, so the bech32 form is always available.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    chain_alias: String,
    hrp: String,
    short_id: ShortId,
    encoded: String,
}

impl Address {
    pub fn new(chain_alias: &str, hrp: &str, short_id: ShortId) -> Result<Self, CoreError> {
        if chain_alias.is_empty() || chain_alias.contains('-') {
            return Err(CoreError::Encoding(format!(
                "invalid chain alias `{chain_alias}`"
            )));
        }
        let encoded = bech32_encode(hrp, &short_id.0)?;
        Ok(Self {
            chain_alias: chain_alias.to_owned(),
            hrp: hrp.to_owned(),
            short_id,
            encoded,
        })
    }

    pub fn chain_alias(&self) -> &str {
        &self.chain_alias
    }

    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    pub fn short_id(&self) -> ShortId {
        self.short_id
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.chain_alias, self.encoded)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chain_alias, encoded) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| CoreError::Encoding(format!("address `{s}` lacks a chain alias")))?;
        if chain_alias.is_empty() {
            return Err(CoreError::Encoding(format!("address `{s}` has an empty chain alias")));
        }
        let (hrp, data) = bech32_decode(encoded)?;
        let short_id: [u8; 20] = data.try_into().map_err(|d: Vec<u8>| {
            CoreError::Encoding(format!(
                "address `{s}` encodes {} bytes, expected 20",
                d.len()
            ))
        })?;
        Self::new(chain_alias, &hrp, ShortId(short_id))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// Wallet Snapshot
// ==============================================================================

/// An unspent output owned by a wallet. Identified by `(tx_id, output_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    #[serde(rename = "txid")]
    pub tx_id: TxId,
    /// Wallet exports write the index as an 8-digit hex string (`"00000001"`).
    #[serde(rename = "outputIdx", with = "hex_index")]
    pub output_index: u32,
    pub amount: u64,
    #[serde(rename = "assetID")]
    pub asset_id: AssetId,
    #[serde(rename = "typeID", default = "default_output_type")]
    pub output_type_id: u32,
}

fn default_output_type() -> u32 {
    type_id::SECP_TRANSFER_OUTPUT
}

mod hex_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(index: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{index:08x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Hex(String),
            Number(u32),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Hex(s) => u32::from_str_radix(s.trim(), 16)
                .map_err(|e| serde::de::Error::custom(format!("invalid output index `{s}`: {e}"))),
        }
    }
}

/// An asset held by a wallet, aggregated from its UTXOs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "assetID")]
    pub asset_id: AssetId,
    pub name: String,
    pub symbol: String,
    pub denomination: u8,
    /// Total held, in the asset's smallest unit.
    pub amount: u64,
}

/// A read-only snapshot of one wallet's spendable state.
///
/// `utxo_store` is `None` when the balance collaborator could not produce a
/// UTXO set at all, which is reported differently from an empty set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceView {
    pub address: Address,
    pub native_asset_id: AssetId,
    pub utxo_store: Option<Vec<Utxo>>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl WalletBalanceView {
    pub fn asset(&self, asset_id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.asset_id == asset_id)
    }
}

// ==============================================================================
// Offer Parameters
// ==============================================================================

/// Network-level settings for taking an offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferParams {
    /// Offers for any other network id are rejected.
    pub network_id: u32,
    /// Flat fee paid by the taker, in the native asset's smallest unit.
    pub tx_fee: u64,
    /// Display symbol of the native asset, used in error messages.
    pub native_symbol: String,
}

impl Default for OfferParams {
    fn default() -> Self {
        Self {
            network_id: 1,
            tx_fee: 1_000_000,
            native_symbol: "AVAX".into(),
        }
    }
}
