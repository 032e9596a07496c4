//! Fountain-part primitives.
//!
//! A payload is notionally split into `seq_len` equal fragments (the last
//! one zero-padded). Sequence numbers `1..=seq_len` designate the fragments
//! themselves; every higher sequence number deterministically designates the
//! XOR of some non-empty fragment subset, derived from a PRNG seeded with
//! the sequence number and the payload checksum. [`seq_num_for`] runs that
//! derivation backwards: given a subset, it probes upwards from
//! `seq_len + 1` until the chooser lands on it.

use std::fmt;

use ciborium::value::{Integer, Value};

use crate::error::{NoEncoding, UrError};
use crate::sampler::Weighted;
use crate::xoshiro::Xoshiro256;

/// Probe budget for [`seq_num_for`].
///
/// Empirically the engineered share assignments resolve within a few
/// hundred probes; the bound exists to turn a malformed part set into a
/// loud failure instead of a spin.
pub const MAX_SEQ_NUM_PROBES: u32 = 1 << 20;

/// Fountain-layer CRC-32 (ISO-HDLC) over a payload.
#[must_use]
pub fn checksum(payload: &[u8]) -> u32 {
    crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(payload)
}

/// Fragment length for a message split into `seq_len` parts.
///
/// # Panics
///
/// Panics if `seq_len` is zero.
#[must_use]
pub fn fragment_len(message_len: usize, seq_len: usize) -> usize {
    assert!(seq_len >= 1, "a message has at least one fragment");
    message_len.div_ceil(seq_len)
}

/// Split a payload into `seq_len` fragments of equal length, zero-padding
/// the tail.
///
/// # Panics
///
/// Panics if `seq_len` is zero.
#[must_use]
pub fn partition(payload: &[u8], seq_len: usize) -> Vec<Vec<u8>> {
    let len = fragment_len(payload.len(), seq_len);
    (0..seq_len)
        .map(|index| {
            let start = (index * len).min(payload.len());
            let end = ((index + 1) * len).min(payload.len());
            let mut fragment = payload[start..end].to_vec();
            fragment.resize(len, 0);
            fragment
        })
        .collect()
}

/// XOR together the fragments selected by `parts`.
///
/// Out-of-range indexes are ignored; callers validate them beforehand.
#[must_use]
pub fn mix_fragments(fragments: &[Vec<u8>], parts: &PartIndexes) -> Vec<u8> {
    let len = fragments.first().map_or(0, Vec::len);
    let mut data = vec![0u8; len];
    for index in parts.iter() {
        if let Some(fragment) = fragments.get(index) {
            for (out, byte) in data.iter_mut().zip(fragment) {
                *out ^= byte;
            }
        }
    }
    data
}

/// A set of fountain part indexes, kept as a small sorted vector.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PartIndexes(Vec<usize>);

impl PartIndexes {
    /// The set `{index}`.
    #[must_use]
    pub fn singleton(index: usize) -> Self {
        Self(vec![index])
    }

    /// The set `{0, 1, …, count-1}`.
    #[must_use]
    pub fn first_n(count: usize) -> Self {
        Self((0..count).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    /// Largest index in the set.
    #[must_use]
    pub fn max(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// One bit per part index. Callers keep indexes below 64.
    #[must_use]
    pub fn bitmask(&self) -> u64 {
        self.0
            .iter()
            .filter(|&&index| index < u64::BITS as usize)
            .fold(0, |mask, &index| mask | 1 << index)
    }
}

impl FromIterator<usize> for PartIndexes {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut indexes: Vec<usize> = iter.into_iter().collect();
        indexes.sort_unstable();
        indexes.dedup();
        Self(indexes)
    }
}

impl fmt::Display for PartIndexes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (position, index) in self.0.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "}}")
    }
}

/// The deterministic part-selection function of the fountain encoding.
///
/// `seq_num <= seq_len` designates the singleton `{seq_num - 1}`. Larger
/// sequence numbers seed xoshiro256** with `seq_num_be ‖ checksum_be`, draw
/// a degree from the harmonic-weighted sampler, and take that many entries
/// of the reference shuffle of `0..seq_len`.
///
/// # Panics
///
/// Panics if `seq_num` or `seq_len` is zero.
#[must_use]
pub fn choose_parts(seq_num: u32, seq_len: usize, checksum: u32) -> PartIndexes {
    assert!(seq_num >= 1, "sequence numbers start at 1");
    assert!(seq_len >= 1, "a message has at least one fragment");
    if seq_num as usize <= seq_len {
        return PartIndexes::singleton(seq_num as usize - 1);
    }
    let mut seed = [0u8; 8];
    seed[..4].copy_from_slice(&seq_num.to_be_bytes());
    seed[4..].copy_from_slice(&checksum.to_be_bytes());
    let mut rng = Xoshiro256::from(&seed[..]);
    let degree = choose_degree(seq_len, &mut rng);
    let shuffled = shuffle((0..seq_len).collect(), &mut rng);
    shuffled.into_iter().take(degree).collect()
}

#[allow(clippy::cast_precision_loss)]
fn choose_degree(seq_len: usize, rng: &mut Xoshiro256) -> usize {
    let weights: Vec<f64> = (1..=seq_len).map(|degree| 1.0 / degree as f64).collect();
    Weighted::new(weights).next(rng) + 1
}

// The reference shuffle: repeatedly move a random remaining entry, rather
// than the usual in-place Fisher-Yates. The draw sequence is part of the
// wire format.
fn shuffle(mut remaining: Vec<usize>, rng: &mut Xoshiro256) -> Vec<usize> {
    let mut shuffled = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        #[allow(clippy::cast_possible_truncation)]
        let index = rng.next_int(0, remaining.len() as u64 - 1) as usize;
        shuffled.push(remaining.remove(index));
    }
    shuffled
}

/// Smallest sequence number at or above `seq_len + 1` whose chosen parts
/// equal `parts`.
///
/// The chooser is surjective onto the non-empty subsets of
/// `{0, …, seq_len-1}`, so for well-formed inputs the probe terminates long
/// before [`MAX_SEQ_NUM_PROBES`].
///
/// # Errors
///
/// Returns [`NoEncoding`] if `parts` is empty, references an index at or
/// past `seq_len`, or the probe budget is exhausted. All three indicate a
/// caller bug rather than a runtime condition.
pub fn seq_num_for(seq_len: usize, checksum: u32, parts: &PartIndexes) -> Result<u32, NoEncoding> {
    let no_encoding = || NoEncoding {
        seq_len,
        parts: parts.clone(),
    };
    if parts.is_empty() || parts.max().is_some_and(|index| index >= seq_len) {
        return Err(no_encoding());
    }
    let first = u32::try_from(seq_len)
        .map_err(|_| no_encoding())?
        .saturating_add(1);
    let mut seq_num = first;
    for _ in 0..MAX_SEQ_NUM_PROBES {
        if choose_parts(seq_num, seq_len, checksum) == *parts {
            return Ok(seq_num);
        }
        seq_num = seq_num.saturating_add(1);
    }
    Err(no_encoding())
}

/// One fountain part: the framing fields shared by a stream plus the XOR of
/// the designated fragments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub seq_num: u32,
    pub seq_len: usize,
    pub message_len: usize,
    pub checksum: u32,
    pub data: Vec<u8>,
}

impl Part {
    /// The fragment subset this part carries.
    ///
    /// # Panics
    ///
    /// Panics if `seq_num` or `seq_len` is zero; decoded parts are
    /// validated before this is called.
    #[must_use]
    pub fn indexes(&self) -> PartIndexes {
        choose_parts(self.seq_num, self.seq_len, self.checksum)
    }

    /// CBOR array framing: `[seq_num, seq_len, message_len, checksum, data]`.
    ///
    /// # Errors
    ///
    /// Returns [`UrError::Cbor`] if serialization fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_cbor(&self) -> Result<Vec<u8>, UrError> {
        let value = Value::Array(vec![
            Value::Integer(Integer::from(self.seq_num)),
            Value::Integer(Integer::from(self.seq_len as u64)),
            Value::Integer(Integer::from(self.message_len as u64)),
            Value::Integer(Integer::from(self.checksum)),
            Value::Bytes(self.data.clone()),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&value, &mut bytes)
            .map_err(|err| UrError::Cbor(err.to_string()))?;
        Ok(bytes)
    }

    /// Parse the CBOR array framing.
    ///
    /// # Errors
    ///
    /// Returns [`UrError::Cbor`] on any shape mismatch, and
    /// [`UrError::ZeroSequenceNumber`] / [`UrError::ZeroSequenceLength`] on
    /// out-of-domain framing fields.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, UrError> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|err| UrError::Cbor(err.to_string()))?;
        let Value::Array(items) = value else {
            return Err(UrError::Cbor("part is not an array".into()));
        };
        let [seq_num, seq_len, message_len, checksum, data] = items.as_slice() else {
            return Err(UrError::Cbor(format!(
                "part array has {} items, expected 5",
                items.len()
            )));
        };
        let seq_num = uint_field(seq_num, "seq_num")?;
        let seq_len = uint_field(seq_len, "seq_len")?;
        let message_len = uint_field(message_len, "message_len")?;
        let checksum = uint_field(checksum, "checksum")?;
        let Value::Bytes(data) = data else {
            return Err(UrError::Cbor("part data is not a byte string".into()));
        };
        let seq_num = u32::try_from(seq_num)
            .map_err(|_| UrError::Cbor("seq_num exceeds 32 bits".into()))?;
        let checksum = u32::try_from(checksum)
            .map_err(|_| UrError::Cbor("checksum exceeds 32 bits".into()))?;
        let seq_len =
            usize::try_from(seq_len).map_err(|_| UrError::Cbor("seq_len overflow".into()))?;
        let message_len = usize::try_from(message_len)
            .map_err(|_| UrError::Cbor("message_len overflow".into()))?;
        if seq_num == 0 {
            return Err(UrError::ZeroSequenceNumber);
        }
        if seq_len == 0 {
            return Err(UrError::ZeroSequenceLength);
        }
        Ok(Self {
            seq_num,
            seq_len,
            message_len,
            checksum,
            data: data.clone(),
        })
    }
}

fn uint_field(value: &Value, field: &'static str) -> Result<u64, UrError> {
    let Value::Integer(integer) = value else {
        return Err(UrError::Cbor(format!("{field} is not an integer")));
    };
    u64::try_from(*integer).map_err(|_| UrError::Cbor(format!("{field} is negative")))
}
