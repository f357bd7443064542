//! Binary codec for X-chain (AVM) transactions.
//!
//! Decodes hex into a [`PartialTransaction`] and encodes it back. The codec
//! understands three envelopes: the bare transaction body produced by
//! offer-make, the unsigned transaction with its codec header, and the signed
//! transaction with trailing credentials. Whatever envelope was decoded is the
//! one that `encode` writes, so `encode(decode(x)) == x` for any accepted `x`.
//! The header is recognised for any codec version, not only version 0.
//!
//! Every output, input, operation and credential type of the secp256k1 and
//! NFT feature extensions is decoded into a typed variant and re-encoded
//! byte-for-byte, including those the offer assembler never interprets.
//! A type id outside that table cannot be delimited (the format carries no
//! per-item length) and is rejected with its offset.

mod reader;
mod writer;

use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::types::{AssetId, ChainId, ShortId, TxId};

use reader::Reader;
use writer::Writer;

/// Codec and type ids as written on the wire.
pub mod type_id {
    pub const BASE_TX: u32 = 0;
    pub const OPERATION_TX: u32 = 2;
    pub const SECP_TRANSFER_INPUT: u32 = 5;
    pub const SECP_MINT_OUTPUT: u32 = 6;
    pub const SECP_TRANSFER_OUTPUT: u32 = 7;
    pub const SECP_MINT_OPERATION: u32 = 8;
    pub const SECP_CREDENTIAL: u32 = 9;
    pub const NFT_MINT_OUTPUT: u32 = 10;
    pub const NFT_TRANSFER_OUTPUT: u32 = 11;
    pub const NFT_MINT_OPERATION: u32 = 12;
    pub const NFT_TRANSFER_OPERATION: u32 = 13;
    pub const NFT_CREDENTIAL: u32 = 14;
}

/// Length in bytes of a recoverable secp256k1 signature.
pub const SIGNATURE_LEN: usize = 65;

// Minimum encoded sizes, used to bound element counts before allocating.
const MIN_OWNERS_LEN: usize = 8 + 4 + 4;
const MIN_OUTPUT_LEN: usize = 32 + 4 + MIN_OWNERS_LEN;
const MIN_INPUT_LEN: usize = 32 + 4 + 32 + 4 + 8 + 4;
const MIN_OPERATION_LEN: usize = 32 + 4 + 4 + 4;
const UTXO_ID_LEN: usize = 32 + 4;
const MIN_CREDENTIAL_LEN: usize = 4 + 4;

// ==============================================================================
// Transaction Model
// ==============================================================================

/// A decoded transaction, possibly only partially built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialTransaction {
    pub envelope: Envelope,
    pub network_id: u32,
    pub blockchain_id: ChainId,
    pub outputs: Vec<TransferableOutput>,
    pub inputs: Vec<TransferableInput>,
    #[serde(serialize_with = "as_hex")]
    pub memo: Vec<u8>,
    /// `Operation` only ever appears with a codec header; a bare body is
    /// always a base transaction.
    pub kind: TxKind,
}

impl PartialTransaction {
    pub fn type_id(&self) -> u32 {
        match self.kind {
            TxKind::Base => type_id::BASE_TX,
            TxKind::Operation(_) => type_id::OPERATION_TX,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self.envelope, Envelope::Signed { .. })
    }
}

/// How the transaction body is wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum Envelope {
    /// Body only, no codec header.
    Bare,
    Unsigned {
        codec_version: u16,
    },
    Signed {
        codec_version: u16,
        credentials: Vec<Credential>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "operations", rename_all = "snake_case")]
pub enum TxKind {
    Base,
    Operation(Vec<TransferableOperation>),
}

/// Locktime, threshold and owning addresses shared by every output kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputOwners {
    pub locktime: u64,
    pub threshold: u32,
    pub addresses: Vec<ShortId>,
}

impl OutputOwners {
    /// Single-owner, immediately spendable.
    pub fn single(address: ShortId) -> Self {
        Self {
            locktime: 0,
            threshold: 1,
            addresses: vec![address],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutput {
    pub amount: u64,
    pub owners: OutputOwners,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    SecpTransfer(TransferOutput),
    SecpMint(OutputOwners),
    NftMint {
        group_id: u32,
        owners: OutputOwners,
    },
    NftTransfer {
        group_id: u32,
        #[serde(serialize_with = "as_hex")]
        payload: Vec<u8>,
        owners: OutputOwners,
    },
}

impl Output {
    pub fn type_id(&self) -> u32 {
        match self {
            Self::SecpTransfer(_) => type_id::SECP_TRANSFER_OUTPUT,
            Self::SecpMint(_) => type_id::SECP_MINT_OUTPUT,
            Self::NftMint { .. } => type_id::NFT_MINT_OUTPUT,
            Self::NftTransfer { .. } => type_id::NFT_TRANSFER_OUTPUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferableOutput {
    pub asset_id: AssetId,
    pub output: Output,
}

impl TransferableOutput {
    /// Fungible amount carried by this output, if it is a transfer output.
    pub fn transfer_amount(&self) -> Option<u64> {
        match &self.output {
            Output::SecpTransfer(out) => Some(out.amount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInput {
    pub amount: u64,
    pub sig_indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferableInput {
    pub tx_id: TxId,
    pub output_index: u32,
    pub asset_id: AssetId,
    pub input: TransferInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoId {
    pub tx_id: TxId,
    pub output_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    SecpMint {
        sig_indices: Vec<u32>,
        mint_owners: OutputOwners,
        transfer: TransferOutput,
    },
    NftMint {
        sig_indices: Vec<u32>,
        group_id: u32,
        #[serde(serialize_with = "as_hex")]
        payload: Vec<u8>,
        outputs: Vec<OutputOwners>,
    },
    NftTransfer {
        sig_indices: Vec<u32>,
        group_id: u32,
        #[serde(serialize_with = "as_hex")]
        payload: Vec<u8>,
        owners: OutputOwners,
    },
}

impl Operation {
    pub fn type_id(&self) -> u32 {
        match self {
            Self::SecpMint { .. } => type_id::SECP_MINT_OPERATION,
            Self::NftMint { .. } => type_id::NFT_MINT_OPERATION,
            Self::NftTransfer { .. } => type_id::NFT_TRANSFER_OPERATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferableOperation {
    pub asset_id: AssetId,
    pub utxo_ids: Vec<UtxoId>,
    pub operation: Operation,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

/// A secp256k1 (`9`) or NFT (`14`) credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub type_id: u32,
    pub signatures: Vec<Signature>,
}

fn as_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

// ==============================================================================
// Decoding
// ==============================================================================

/// Decode a hex-encoded transaction. Surrounding whitespace and a `0x`
/// prefix are tolerated.
pub fn decode(tx_hex: &str) -> Result<PartialTransaction, CoreError> {
    let bytes = decode_hex(tx_hex)?;
    decode_bytes(&bytes)
}

pub fn decode_bytes(bytes: &[u8]) -> Result<PartialTransaction, CoreError> {
    let mut r = Reader::new(bytes);

    let header = if has_codec_header(&r)? {
        let codec_version = r.u16("codec version")?;
        let at = r.offset();
        let tx_type = r.u32("transaction type id")?;
        if tx_type != type_id::BASE_TX && tx_type != type_id::OPERATION_TX {
            return Err(CoreError::malformed(
                at,
                format!("unsupported transaction type id {tx_type}"),
            ));
        }
        Some((codec_version, tx_type))
    } else {
        None
    };

    let network_id = r.u32("network id")?;
    let blockchain_id = ChainId(r.array("blockchain id")?);
    let outputs = read_outputs(&mut r)?;
    let inputs = read_inputs(&mut r)?;
    let memo = r.bytes("memo")?;

    let kind = match header {
        Some((_, type_id::OPERATION_TX)) => TxKind::Operation(read_operations(&mut r)?),
        _ => TxKind::Base,
    };

    let envelope = match header {
        None => Envelope::Bare,
        Some((codec_version, _)) if r.is_empty() => Envelope::Unsigned { codec_version },
        Some((codec_version, _)) => Envelope::Signed {
            codec_version,
            credentials: read_credentials(&mut r)?,
        },
    };

    if !r.is_empty() {
        return Err(CoreError::malformed(
            r.offset(),
            format!("{} trailing bytes after transaction", r.remaining()),
        ));
    }

    Ok(PartialTransaction {
        envelope,
        network_id,
        blockchain_id,
        outputs,
        inputs,
        memo,
        kind,
    })
}

/// A codec header is `codecVersion u16 | typeId u32`. A zero leading word
/// can only be that header, since network id 0 is never assigned. For a
/// non-zero codec version the header shows as a supported type id in bytes
/// 2..6, where a bare body has the low half of its network id followed by
/// the start of the chain id.
fn has_codec_header(r: &Reader<'_>) -> Result<bool, CoreError> {
    if r.peek_u32()? == 0 {
        return Ok(true);
    }
    Ok(match r.peek_array::<6>() {
        Some([_, _, a, b, c, d]) => {
            let tx_type = u32::from_be_bytes([a, b, c, d]);
            tx_type == type_id::BASE_TX || tx_type == type_id::OPERATION_TX
        }
        None => false,
    })
}

fn decode_hex(tx_hex: &str) -> Result<Vec<u8>, CoreError> {
    let trimmed = tx_hex.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| {
        let offset = match e {
            hex::FromHexError::InvalidHexCharacter { index, .. } => index / 2,
            hex::FromHexError::OddLength => digits.len() / 2,
            hex::FromHexError::InvalidStringLength => 0,
        };
        CoreError::malformed(offset, format!("invalid hex: {e}"))
    })
}

fn read_owners(r: &mut Reader<'_>) -> Result<OutputOwners, CoreError> {
    let locktime = r.u64("locktime")?;
    let threshold = r.u32("threshold")?;
    let count = r.count(20, "address")?;
    let addresses = (0..count)
        .map(|_| r.array("address").map(ShortId))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(OutputOwners {
        locktime,
        threshold,
        addresses,
    })
}

fn read_sig_indices(r: &mut Reader<'_>) -> Result<Vec<u32>, CoreError> {
    let count = r.count(4, "signature index")?;
    (0..count).map(|_| r.u32("signature index")).collect()
}

fn read_outputs(r: &mut Reader<'_>) -> Result<Vec<TransferableOutput>, CoreError> {
    let count = r.count(MIN_OUTPUT_LEN, "output")?;
    let mut outputs = Vec::with_capacity(count);
    for _ in 0..count {
        let asset_id = AssetId(r.array("output asset id")?);
        let at = r.offset();
        let output = match r.u32("output type id")? {
            type_id::SECP_TRANSFER_OUTPUT => Output::SecpTransfer(TransferOutput {
                amount: r.u64("output amount")?,
                owners: read_owners(r)?,
            }),
            type_id::SECP_MINT_OUTPUT => Output::SecpMint(read_owners(r)?),
            type_id::NFT_MINT_OUTPUT => Output::NftMint {
                group_id: r.u32("group id")?,
                owners: read_owners(r)?,
            },
            type_id::NFT_TRANSFER_OUTPUT => Output::NftTransfer {
                group_id: r.u32("group id")?,
                payload: r.bytes("nft payload")?,
                owners: read_owners(r)?,
            },
            other => {
                return Err(CoreError::malformed(
                    at,
                    format!("unknown output type id {other}"),
                ))
            }
        };
        outputs.push(TransferableOutput { asset_id, output });
    }
    Ok(outputs)
}

fn read_inputs(r: &mut Reader<'_>) -> Result<Vec<TransferableInput>, CoreError> {
    let count = r.count(MIN_INPUT_LEN, "input")?;
    let mut inputs = Vec::with_capacity(count);
    for _ in 0..count {
        let tx_id = TxId(r.array("input tx id")?);
        let output_index = r.u32("input output index")?;
        let asset_id = AssetId(r.array("input asset id")?);
        let at = r.offset();
        let tag = r.u32("input type id")?;
        if tag != type_id::SECP_TRANSFER_INPUT {
            return Err(CoreError::malformed(at, format!("unknown input type id {tag}")));
        }
        let input = TransferInput {
            amount: r.u64("input amount")?,
            sig_indices: read_sig_indices(r)?,
        };
        inputs.push(TransferableInput {
            tx_id,
            output_index,
            asset_id,
            input,
        });
    }
    Ok(inputs)
}

fn read_operations(r: &mut Reader<'_>) -> Result<Vec<TransferableOperation>, CoreError> {
    let count = r.count(MIN_OPERATION_LEN, "operation")?;
    let mut operations = Vec::with_capacity(count);
    for _ in 0..count {
        let asset_id = AssetId(r.array("operation asset id")?);
        let utxo_count = r.count(UTXO_ID_LEN, "operation utxo id")?;
        let utxo_ids = (0..utxo_count)
            .map(|_| {
                Ok(UtxoId {
                    tx_id: TxId(r.array("operation utxo tx id")?),
                    output_index: r.u32("operation utxo output index")?,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        let at = r.offset();
        let operation = match r.u32("operation type id")? {
            type_id::SECP_MINT_OPERATION => Operation::SecpMint {
                sig_indices: read_sig_indices(r)?,
                mint_owners: read_owners(r)?,
                transfer: TransferOutput {
                    amount: r.u64("mint transfer amount")?,
                    owners: read_owners(r)?,
                },
            },
            type_id::NFT_MINT_OPERATION => {
                let sig_indices = read_sig_indices(r)?;
                let group_id = r.u32("group id")?;
                let payload = r.bytes("nft payload")?;
                let owner_count = r.count(MIN_OWNERS_LEN, "nft mint owners")?;
                let outputs = (0..owner_count)
                    .map(|_| read_owners(r))
                    .collect::<Result<Vec<_>, _>>()?;
                Operation::NftMint {
                    sig_indices,
                    group_id,
                    payload,
                    outputs,
                }
            }
            type_id::NFT_TRANSFER_OPERATION => Operation::NftTransfer {
                sig_indices: read_sig_indices(r)?,
                group_id: r.u32("group id")?,
                payload: r.bytes("nft payload")?,
                owners: read_owners(r)?,
            },
            other => {
                return Err(CoreError::malformed(
                    at,
                    format!("unknown operation type id {other}"),
                ))
            }
        };
        operations.push(TransferableOperation {
            asset_id,
            utxo_ids,
            operation,
        });
    }
    Ok(operations)
}

fn read_credentials(r: &mut Reader<'_>) -> Result<Vec<Credential>, CoreError> {
    let count = r.count(MIN_CREDENTIAL_LEN, "credential")?;
    let mut credentials = Vec::with_capacity(count);
    for _ in 0..count {
        let at = r.offset();
        let tag = r.u32("credential type id")?;
        if tag != type_id::SECP_CREDENTIAL && tag != type_id::NFT_CREDENTIAL {
            return Err(CoreError::malformed(
                at,
                format!("unknown credential type id {tag}"),
            ));
        }
        let sig_count = r.count(SIGNATURE_LEN, "signature")?;
        let signatures = (0..sig_count)
            .map(|_| r.array("signature").map(Signature))
            .collect::<Result<Vec<_>, _>>()?;
        credentials.push(Credential {
            type_id: tag,
            signatures,
        });
    }
    Ok(credentials)
}

// ==============================================================================
// Encoding
// ==============================================================================

/// Encode a transaction to lowercase hex.
#[must_use]
pub fn encode(tx: &PartialTransaction) -> String {
    hex::encode(encode_bytes(tx))
}

#[must_use]
pub fn encode_bytes(tx: &PartialTransaction) -> Vec<u8> {
    let mut w = Writer::new();

    match &tx.envelope {
        Envelope::Bare => {}
        Envelope::Unsigned { codec_version } | Envelope::Signed { codec_version, .. } => {
            w.u16(*codec_version);
            w.u32(tx.type_id());
        }
    }

    w.u32(tx.network_id);
    w.raw(tx.blockchain_id.as_bytes());

    w.count(tx.outputs.len());
    for output in &tx.outputs {
        write_output(&mut w, output);
    }
    w.count(tx.inputs.len());
    for input in &tx.inputs {
        write_input(&mut w, input);
    }
    w.bytes(&tx.memo);

    if let TxKind::Operation(operations) = &tx.kind {
        w.count(operations.len());
        for op in operations {
            write_operation(&mut w, op);
        }
    }

    if let Envelope::Signed { credentials, .. } = &tx.envelope {
        w.count(credentials.len());
        for credential in credentials {
            w.u32(credential.type_id);
            w.count(credential.signatures.len());
            for sig in &credential.signatures {
                w.raw(&sig.0);
            }
        }
    }

    w.into_bytes()
}

/// Encoded bytes of a single output, as it appears inside a transaction.
#[must_use]
pub fn output_bytes(output: &TransferableOutput) -> Vec<u8> {
    let mut w = Writer::new();
    write_output(&mut w, output);
    w.into_bytes()
}

/// Encoded bytes of a single input, as it appears inside a transaction.
#[must_use]
pub fn input_bytes(input: &TransferableInput) -> Vec<u8> {
    let mut w = Writer::new();
    write_input(&mut w, input);
    w.into_bytes()
}

fn write_owners(w: &mut Writer, owners: &OutputOwners) {
    w.u64(owners.locktime);
    w.u32(owners.threshold);
    w.count(owners.addresses.len());
    for addr in &owners.addresses {
        w.raw(&addr.0);
    }
}

fn write_sig_indices(w: &mut Writer, indices: &[u32]) {
    w.count(indices.len());
    for idx in indices {
        w.u32(*idx);
    }
}

fn write_output(w: &mut Writer, output: &TransferableOutput) {
    w.raw(output.asset_id.as_bytes());
    w.u32(output.output.type_id());
    match &output.output {
        Output::SecpTransfer(out) => {
            w.u64(out.amount);
            write_owners(w, &out.owners);
        }
        Output::SecpMint(owners) => write_owners(w, owners),
        Output::NftMint { group_id, owners } => {
            w.u32(*group_id);
            write_owners(w, owners);
        }
        Output::NftTransfer {
            group_id,
            payload,
            owners,
        } => {
            w.u32(*group_id);
            w.bytes(payload);
            write_owners(w, owners);
        }
    }
}

fn write_input(w: &mut Writer, input: &TransferableInput) {
    w.raw(input.tx_id.as_bytes());
    w.u32(input.output_index);
    w.raw(input.asset_id.as_bytes());
    w.u32(type_id::SECP_TRANSFER_INPUT);
    w.u64(input.input.amount);
    write_sig_indices(w, &input.input.sig_indices);
}

fn write_operation(w: &mut Writer, op: &TransferableOperation) {
    w.raw(op.asset_id.as_bytes());
    w.count(op.utxo_ids.len());
    for utxo in &op.utxo_ids {
        w.raw(utxo.tx_id.as_bytes());
        w.u32(utxo.output_index);
    }
    w.u32(op.operation.type_id());
    match &op.operation {
        Operation::SecpMint {
            sig_indices,
            mint_owners,
            transfer,
        } => {
            write_sig_indices(w, sig_indices);
            write_owners(w, mint_owners);
            w.u64(transfer.amount);
            write_owners(w, &transfer.owners);
        }
        Operation::NftMint {
            sig_indices,
            group_id,
            payload,
            outputs,
        } => {
            write_sig_indices(w, sig_indices);
            w.u32(*group_id);
            w.bytes(payload);
            w.count(outputs.len());
            for owners in outputs {
                write_owners(w, owners);
            }
        }
        Operation::NftTransfer {
            sig_indices,
            group_id,
            payload,
            owners,
        } => {
            write_sig_indices(w, sig_indices);
            w.u32(*group_id);
            w.bytes(payload);
            write_owners(w, owners);
        }
    }
}
