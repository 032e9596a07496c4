//! Output-descriptor model and canonical CBOR codec for the
//! `crypto-output` UR type.
//!
//! The descriptor is the byte-level foundation of a plate backup: the
//! planner encodes it once and fans the bytes out into fountain fragments,
//! and the verifier parses recovered bytes back for structural comparison.
//! Encoding is deterministic — integer-keyed maps in fixed field order,
//! minimal-width integers — so equal descriptors always produce identical
//! payloads.
//!
//! The engraved title is carried alongside the descriptor but is *not*
//! part of the encoding; [`parse`] always yields an empty title.

#![forbid(unsafe_code)]

use ciborium::value::{Integer, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// UR type tag for output descriptors.
pub const UR_TYPE: &str = "crypto-output";

/// BIP-32 hardened-derivation marker bit.
pub const HARDENED: u32 = 0x8000_0000;

/// Length of a BIP-32 chain code.
pub const CHAIN_CODE_LEN: usize = 32;

/// Length of a compressed public key.
pub const KEY_DATA_LEN: usize = 33;

// Descriptor map fields.
const FIELD_THRESHOLD: u64 = 1;
const FIELD_SCRIPT: u64 = 2;
const FIELD_KEYS: u64 = 3;

// Key map fields.
const FIELD_FINGERPRINT: u64 = 1;
const FIELD_PATH: u64 = 2;
const FIELD_CHAIN_CODE: u64 = 3;
const FIELD_KEY_DATA: u64 = 4;

/// Script template of an output descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    /// Single-sig segwit (`wpkh`).
    Wpkh,
    /// Native segwit multisig (`wsh(sortedmulti(…))`).
    Wsh,
    /// Wrapped segwit multisig (`sh(wsh(…))`).
    ShWsh,
    /// Taproot (`tr`).
    Tr,
}

impl ScriptType {
    const fn code(self) -> u64 {
        match self {
            Self::Wpkh => 0,
            Self::Wsh => 1,
            Self::ShWsh => 2,
            Self::Tr => 3,
        }
    }

    fn from_code(code: u64) -> Result<Self, DescriptorError> {
        match code {
            0 => Ok(Self::Wpkh),
            1 => Ok(Self::Wsh),
            2 => Ok(Self::ShWsh),
            3 => Ok(Self::Tr),
            other => Err(DescriptorError::UnknownScriptType(other)),
        }
    }
}

/// One co-signer key with its BIP-32 origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorKey {
    /// Fingerprint of the master key this key derives from.
    pub master_fingerprint: u32,
    /// Derivation path from the master key; hardened components carry
    /// [`HARDENED`].
    pub derivation_path: Vec<u32>,
    /// BIP-32 chain code.
    pub chain_code: [u8; CHAIN_CODE_LEN],
    /// Compressed public key.
    pub key_data: [u8; KEY_DATA_LEN],
}

impl DescriptorKey {
    /// Master fingerprint as the eight uppercase hex digits engraved on a
    /// plate.
    #[must_use]
    pub fn master_fingerprint_hex(&self) -> String {
        format!("{:08X}", self.master_fingerprint)
    }
}

/// A multi-signature output descriptor replicated across backup plates.
///
/// `threshold` of `keys.len()` co-signers must sign; the same pair is the
/// (M, N) of the backup: any M plates reconstruct this descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDescriptor {
    /// Engraved display title. Never encoded; ignored by [`parse`].
    pub title: String,
    /// Script template.
    pub script: ScriptType,
    /// Signing threshold M.
    pub threshold: usize,
    /// Co-signer keys; the length is N.
    pub keys: Vec<DescriptorKey>,
}

impl OutputDescriptor {
    /// Structural sanity of the (M, N) pair.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::NoKeys`] or
    /// [`DescriptorError::InvalidThreshold`].
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.keys.is_empty() {
            return Err(DescriptorError::NoKeys);
        }
        if self.threshold < 1 || self.threshold > self.keys.len() {
            return Err(DescriptorError::InvalidThreshold {
                threshold: self.threshold,
                keys: self.keys.len(),
            });
        }
        Ok(())
    }

    /// Canonical CBOR encoding. The title is omitted.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] if the descriptor is structurally
    /// invalid or serialization fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(&self) -> Result<Vec<u8>, DescriptorError> {
        self.validate()?;
        let keys = self
            .keys
            .iter()
            .map(|key| {
                Value::Map(vec![
                    (
                        Value::Integer(Integer::from(FIELD_FINGERPRINT)),
                        Value::Integer(Integer::from(key.master_fingerprint)),
                    ),
                    (
                        Value::Integer(Integer::from(FIELD_PATH)),
                        Value::Array(
                            key.derivation_path
                                .iter()
                                .map(|&child| Value::Integer(Integer::from(child)))
                                .collect(),
                        ),
                    ),
                    (
                        Value::Integer(Integer::from(FIELD_CHAIN_CODE)),
                        Value::Bytes(key.chain_code.to_vec()),
                    ),
                    (
                        Value::Integer(Integer::from(FIELD_KEY_DATA)),
                        Value::Bytes(key.key_data.to_vec()),
                    ),
                ])
            })
            .collect();
        let value = Value::Map(vec![
            (
                Value::Integer(Integer::from(FIELD_THRESHOLD)),
                Value::Integer(Integer::from(self.threshold as u64)),
            ),
            (
                Value::Integer(Integer::from(FIELD_SCRIPT)),
                Value::Integer(Integer::from(self.script.code())),
            ),
            (
                Value::Integer(Integer::from(FIELD_KEYS)),
                Value::Array(keys),
            ),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&value, &mut bytes)
            .map_err(|err| DescriptorError::Cbor(err.to_string()))?;
        Ok(bytes)
    }
}

/// Parse a `crypto-output` payload back into a descriptor.
///
/// The returned descriptor carries an empty title; callers that need the
/// engraved title copy it over before comparing.
///
/// # Errors
///
/// Returns [`DescriptorError`] for a foreign type tag, malformed CBOR, or
/// structurally invalid contents.
pub fn parse(ur_type: &str, bytes: &[u8]) -> Result<OutputDescriptor, DescriptorError> {
    if ur_type != UR_TYPE {
        return Err(DescriptorError::WrongType {
            got: ur_type.to_owned(),
        });
    }
    let value: Value =
        ciborium::de::from_reader(bytes).map_err(|err| DescriptorError::Cbor(err.to_string()))?;
    let Value::Map(fields) = value else {
        return Err(DescriptorError::Cbor("descriptor is not a map".into()));
    };
    let threshold = uint_entry(&fields, FIELD_THRESHOLD, "threshold")?;
    let script = ScriptType::from_code(uint_entry(&fields, FIELD_SCRIPT, "script")?)?;
    let Some(Value::Array(key_values)) = entry(&fields, FIELD_KEYS) else {
        return Err(DescriptorError::MissingField("keys"));
    };
    let keys = key_values
        .iter()
        .map(parse_key)
        .collect::<Result<Vec<_>, _>>()?;
    let descriptor = OutputDescriptor {
        title: String::new(),
        script,
        threshold: usize::try_from(threshold)
            .map_err(|_| DescriptorError::Cbor("threshold overflow".into()))?,
        keys,
    };
    descriptor.validate()?;
    Ok(descriptor)
}

fn parse_key(value: &Value) -> Result<DescriptorKey, DescriptorError> {
    let Value::Map(fields) = value else {
        return Err(DescriptorError::Cbor("key is not a map".into()));
    };
    let fingerprint = uint_entry(fields, FIELD_FINGERPRINT, "master_fingerprint")?;
    let Some(Value::Array(path_values)) = entry(fields, FIELD_PATH) else {
        return Err(DescriptorError::MissingField("derivation_path"));
    };
    let derivation_path = path_values
        .iter()
        .map(|child| {
            let Value::Integer(integer) = child else {
                return Err(DescriptorError::Cbor("path component is not an integer".into()));
            };
            u32::try_from(*integer)
                .map_err(|_| DescriptorError::Cbor("path component exceeds 32 bits".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let chain_code = bytes_entry(fields, FIELD_CHAIN_CODE, "chain_code")?;
    let key_data = bytes_entry(fields, FIELD_KEY_DATA, "key_data")?;
    Ok(DescriptorKey {
        master_fingerprint: u32::try_from(fingerprint)
            .map_err(|_| DescriptorError::Cbor("master_fingerprint exceeds 32 bits".into()))?,
        derivation_path,
        chain_code: fixed_width(chain_code, "chain_code")?,
        key_data: fixed_width(key_data, "key_data")?,
    })
}

fn entry<'a>(fields: &'a [(Value, Value)], key: u64) -> Option<&'a Value> {
    fields.iter().find_map(|(field_key, field_value)| {
        matches!(
            field_key,
            Value::Integer(integer) if u64::try_from(*integer).is_ok_and(|code| code == key)
        )
        .then_some(field_value)
    })
}

fn uint_entry(
    fields: &[(Value, Value)],
    key: u64,
    name: &'static str,
) -> Result<u64, DescriptorError> {
    let Some(Value::Integer(integer)) = entry(fields, key) else {
        return Err(DescriptorError::MissingField(name));
    };
    u64::try_from(*integer).map_err(|_| DescriptorError::Cbor(format!("{name} is negative")))
}

fn bytes_entry<'a>(
    fields: &'a [(Value, Value)],
    key: u64,
    name: &'static str,
) -> Result<&'a [u8], DescriptorError> {
    let Some(Value::Bytes(bytes)) = entry(fields, key) else {
        return Err(DescriptorError::MissingField(name));
    };
    Ok(bytes)
}

fn fixed_width<const N: usize>(
    bytes: &[u8],
    field: &'static str,
) -> Result<[u8; N], DescriptorError> {
    <[u8; N]>::try_from(bytes).map_err(|_| DescriptorError::FieldLength {
        field,
        expected: N,
        got: bytes.len(),
    })
}

/// Descriptor codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The payload was tagged with a UR type this codec does not handle.
    #[error("unsupported ur type {got:?} (expected \"crypto-output\")")]
    WrongType {
        /// The offered type tag.
        got: String,
    },

    /// Thresholds run from 1 to the number of keys.
    #[error("threshold {threshold} incompatible with {keys} keys")]
    InvalidThreshold {
        /// Signing threshold M.
        threshold: usize,
        /// Number of keys N.
        keys: usize,
    },

    /// A descriptor needs at least one key.
    #[error("descriptor has no keys")]
    NoKeys,

    /// Script type code outside the known set.
    #[error("unknown script type code {0}")]
    UnknownScriptType(u64),

    /// A fixed-width field of the wrong length.
    #[error("{field} must be {expected} bytes, got {got}")]
    FieldLength {
        /// Field name.
        field: &'static str,
        /// Required width.
        expected: usize,
        /// Received width.
        got: usize,
    },

    /// A required map field is absent.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// Any other CBOR-level failure.
    #[error("malformed descriptor cbor: {0}")]
    Cbor(String),
}
