//! Address reference tables.
//!
//! A transaction input only names the UTXO it spends, not the address that
//! owns it. The reference table travels next to the transaction hex and maps
//! each spent UTXO (keyed by base58 of `txId || outputIndex`) to the owning
//! address, so a signer can find the right key for every input.
//!
//! Tables are kept in a `BTreeMap`, so serialization order is the key order
//! and merging is commutative.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::codec::TransferableInput;
use crate::encoding::base58_encode;
use crate::error::CoreError;
use crate::types::{Address, TxId};

/// Reference key for the UTXO `tx_id:output_index`.
#[must_use]
pub fn reference_key(tx_id: &TxId, output_index: u32) -> String {
    let mut buf = [0u8; 36];
    buf[..32].copy_from_slice(tx_id.as_bytes());
    buf[32..].copy_from_slice(&output_index.to_be_bytes());
    base58_encode(&buf)
}

/// Reference key for the UTXO spent by `input`.
#[must_use]
pub fn input_reference_key(input: &TransferableInput) -> String {
    reference_key(&input.tx_id, input.output_index)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressReferences {
    entries: BTreeMap<String, String>,
}

impl AddressReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{ key: address }`. Every value must be a
    /// well-formed chain-qualified address. A key repeated with a different
    /// address is a conflict.
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        let RawPairs(pairs) = serde_json::from_str(json)
            .map_err(|e| CoreError::MalformedReferences(format!("invalid JSON: {e}")))?;

        let mut table = Self::new();
        for (key, address) in pairs {
            if key.trim().is_empty() {
                return Err(CoreError::MalformedReferences("empty reference key".into()));
            }
            address.parse::<Address>().map_err(|e| {
                CoreError::MalformedReferences(format!("value for `{key}` is not an address: {e}"))
            })?;
            table.insert(key, address)?;
        }
        Ok(table)
    }

    /// Add one entry. Re-inserting an identical pair is a no-op; a different
    /// address for an existing key is a conflict.
    pub fn insert(&mut self, key: String, address: String) -> Result<(), CoreError> {
        match self.entries.get(&key) {
            Some(existing) if *existing != address => Err(CoreError::ReferenceConflict {
                key,
                existing: existing.clone(),
                incoming: address,
            }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(key, address);
                Ok(())
            }
        }
    }

    /// Add an entry whose key must not be present yet, whatever its address.
    pub fn insert_new(&mut self, key: String, address: String) -> Result<(), CoreError> {
        if let Some(existing) = self.entries.get(&key) {
            return Err(CoreError::ReferenceConflict {
                existing: existing.clone(),
                incoming: address,
                key,
            });
        }
        self.entries.insert(key, address);
        Ok(())
    }

    /// Union of two tables. Fails if any key maps to two different addresses.
    pub fn merge(&self, other: &Self) -> Result<Self, CoreError> {
        let mut merged = self.clone();
        for (key, address) in &other.entries {
            merged.insert(key.clone(), address.clone())?;
        }
        Ok(merged)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as a compact JSON object in key order.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).expect("string map always serializes")
    }
}

/// Every key/value pair of a JSON object in document order, repeats
/// included.
struct RawPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = RawPairs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of key/address pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawPairs, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry::<String, String>()? {
                    pairs.push(pair);
                }
                Ok(RawPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}
