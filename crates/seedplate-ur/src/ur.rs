//! `ur:` text assembly and the streaming multi-part decoder.
//!
//! Multi-part form: `ur:<type>/<seqNum>-<seqLen>/<bytewords>` where the
//! bytewords body is the CBOR part framing. Single-part form:
//! `ur:<type>/<bytewords>` over the raw payload. Both forms are
//! case-insensitive on input; canonical output is lowercase.

use std::collections::BTreeSet;

use crate::bytewords;
use crate::error::UrError;
use crate::fountain::{self, Part};

const SCHEME: &str = "ur:";

/// Largest `seq_len` the decoder supports; part subsets are tracked as
/// 64-bit masks. Plate backups stay far below this.
pub const MAX_SEQUENCE_LENGTH: usize = 64;

/// Distinct parts the decoder will buffer before refusing input.
const MAX_BUFFERED_PARTS: usize = 256;

fn validate_type_tag(ur_type: &str) -> Result<(), UrError> {
    let well_formed = !ur_type.is_empty()
        && ur_type
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-');
    if well_formed {
        Ok(())
    } else {
        Err(UrError::InvalidTypeTag(ur_type.to_owned()))
    }
}

/// Encode the fragment of `payload` designated by `seq_num`.
///
/// The fragment carries the XOR of the part subset
/// `choose_parts(seq_num, seq_len, checksum(payload))`; for
/// `seq_num <= seq_len` that is the `seq_num`-th fragment verbatim.
///
/// # Errors
///
/// Returns [`UrError`] for a malformed type tag, a zero sequence
/// number/length, or a CBOR serialization failure.
pub fn encode(
    ur_type: &str,
    payload: &[u8],
    seq_num: u32,
    seq_len: usize,
) -> Result<String, UrError> {
    validate_type_tag(ur_type)?;
    if seq_num == 0 {
        return Err(UrError::ZeroSequenceNumber);
    }
    if seq_len == 0 {
        return Err(UrError::ZeroSequenceLength);
    }
    let checksum = fountain::checksum(payload);
    let fragments = fountain::partition(payload, seq_len);
    let data = fountain::mix_fragments(&fragments, &fountain::choose_parts(seq_num, seq_len, checksum));
    let part = Part {
        seq_num,
        seq_len,
        message_len: payload.len(),
        checksum,
        data,
    };
    let body = bytewords::encode(&part.to_cbor()?);
    Ok(format!("{SCHEME}{ur_type}/{seq_num}-{seq_len}/{body}"))
}

/// Encode a payload as a single-part UR.
///
/// # Errors
///
/// Returns [`UrError::InvalidTypeTag`] for a malformed type tag.
pub fn encode_single(ur_type: &str, payload: &[u8]) -> Result<String, UrError> {
    validate_type_tag(ur_type)?;
    Ok(format!("{SCHEME}{ur_type}/{}", bytewords::encode(payload)))
}

/// Streaming decoder for a UR fragment stream.
///
/// Fragments may arrive in any order and from any subset of senders; the
/// decoder locks onto the framing of the first part and rejects fragments
/// from other streams. Received part subsets are solved as a GF(2) linear
/// system, so any collection of parts whose index sets span all fragments
/// recovers the message, even when no peeling order exists.
#[derive(Default)]
pub struct Decoder {
    ur_type: Option<String>,
    seq_len: Option<usize>,
    message_len: Option<usize>,
    checksum: Option<u32>,
    seen: BTreeSet<u32>,
    rows: Vec<(u64, Vec<u8>)>,
    message: Option<Vec<u8>>,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment of text.
    ///
    /// Duplicate fragments are accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`UrError`] for malformed text, fragments that contradict
    /// the locked stream framing, or a message whose assembled checksum
    /// does not match its parts.
    pub fn receive(&mut self, fragment: &str) -> Result<(), UrError> {
        let text = fragment.to_ascii_lowercase();
        let rest = text
            .strip_prefix(SCHEME)
            .ok_or(UrError::MissingScheme)?;
        let mut segments = rest.split('/');
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(tag), Some(body), None, None) => self.receive_single(tag, body),
            (Some(tag), Some(marker), Some(body), None) => self.receive_part(tag, marker, body),
            _ => Err(UrError::MalformedPath(fragment.to_owned())),
        }
    }

    fn receive_single(&mut self, tag: &str, body: &str) -> Result<(), UrError> {
        validate_type_tag(tag)?;
        self.absorb_type(tag)?;
        let payload = bytewords::decode(body)?;
        if self.message.is_none() {
            self.message = Some(payload);
        }
        Ok(())
    }

    fn receive_part(&mut self, tag: &str, marker: &str, body: &str) -> Result<(), UrError> {
        validate_type_tag(tag)?;
        let (seq_num, seq_len) = parse_marker(marker)?;
        let part = Part::from_cbor(&bytewords::decode(body)?)?;
        if part.seq_num != seq_num || part.seq_len != seq_len {
            return Err(UrError::SequenceMarkerMismatch);
        }
        if part.seq_len > MAX_SEQUENCE_LENGTH {
            return Err(UrError::SequenceLengthTooLarge {
                got: part.seq_len,
                max: MAX_SEQUENCE_LENGTH,
            });
        }
        self.absorb_type(tag)?;
        self.absorb_framing(&part)?;
        let expected = fountain::fragment_len(part.message_len, part.seq_len);
        if part.data.len() != expected {
            return Err(UrError::FragmentLength {
                got: part.data.len(),
                expected,
            });
        }
        if self.seen.contains(&part.seq_num) {
            return Ok(());
        }
        if self.rows.len() >= MAX_BUFFERED_PARTS {
            return Err(UrError::PartBufferExceeded {
                limit: MAX_BUFFERED_PARTS,
            });
        }
        self.seen.insert(part.seq_num);
        self.rows.push((part.indexes().bitmask(), part.data));
        self.try_solve()
    }

    fn absorb_type(&mut self, tag: &str) -> Result<(), UrError> {
        match &self.ur_type {
            Some(stream) if stream != tag => Err(UrError::ConflictingType {
                stream: stream.clone(),
                fragment: tag.to_owned(),
            }),
            Some(_) => Ok(()),
            None => {
                self.ur_type = Some(tag.to_owned());
                Ok(())
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn absorb_framing(&mut self, part: &Part) -> Result<(), UrError> {
        let conflict = |field, stream: u64, fragment: u64| UrError::ConflictingParameter {
            field,
            stream,
            fragment,
        };
        match self.seq_len {
            Some(locked) if locked != part.seq_len => {
                return Err(conflict("seq_len", locked as u64, part.seq_len as u64));
            }
            Some(_) => {}
            None => self.seq_len = Some(part.seq_len),
        }
        match self.message_len {
            Some(locked) if locked != part.message_len => {
                return Err(conflict(
                    "message_len",
                    locked as u64,
                    part.message_len as u64,
                ));
            }
            Some(_) => {}
            None => self.message_len = Some(part.message_len),
        }
        match self.checksum {
            Some(locked) if locked != part.checksum => {
                return Err(conflict(
                    "checksum",
                    u64::from(locked),
                    u64::from(part.checksum),
                ));
            }
            Some(_) => {}
            None => self.checksum = Some(part.checksum),
        }
        Ok(())
    }

    fn try_solve(&mut self) -> Result<(), UrError> {
        if self.message.is_some() {
            return Ok(());
        }
        let (Some(seq_len), Some(message_len), Some(checksum)) =
            (self.seq_len, self.message_len, self.checksum)
        else {
            return Ok(());
        };
        if self.rows.len() < seq_len {
            return Ok(());
        }
        let Some(fragments) = solve(seq_len, &self.rows) else {
            return Ok(());
        };
        let mut message = fragments.concat();
        message.truncate(message_len);
        let got = fountain::checksum(&message);
        if got != checksum {
            return Err(UrError::MessageChecksum {
                expected: checksum,
                got,
            });
        }
        self.message = Some(message);
        Ok(())
    }

    /// Type tag of the stream, once any fragment has been accepted.
    #[must_use]
    pub fn ur_type(&self) -> Option<&str> {
        self.ur_type.as_deref()
    }

    /// The recovered message, if decoding has completed.
    #[must_use]
    pub fn message(&self) -> Option<&[u8]> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn complete(&self) -> bool {
        self.message.is_some()
    }

    /// Number of distinct parts buffered so far.
    #[must_use]
    pub fn received_parts(&self) -> usize {
        self.rows.len()
    }
}

fn parse_marker(marker: &str) -> Result<(u32, usize), UrError> {
    let malformed = || UrError::InvalidSequence(marker.to_owned());
    let (seq_num, seq_len) = marker.split_once('-').ok_or_else(malformed)?;
    let seq_num: u32 = seq_num.parse().map_err(|_| malformed())?;
    let seq_len: usize = seq_len.parse().map_err(|_| malformed())?;
    if seq_num == 0 {
        return Err(UrError::ZeroSequenceNumber);
    }
    if seq_len == 0 {
        return Err(UrError::ZeroSequenceLength);
    }
    Ok((seq_num, seq_len))
}

/// Gauss-Jordan elimination over GF(2). Returns the fragments in index
/// order once every column has a pivot and reduces to a unit vector.
fn solve(seq_len: usize, rows: &[(u64, Vec<u8>)]) -> Option<Vec<Vec<u8>>> {
    let mut mat: Vec<(u64, Vec<u8>)> = rows.to_vec();
    let mut pivot_of_col: Vec<usize> = Vec::with_capacity(seq_len);
    for col in 0..seq_len {
        let bit = 1u64 << col;
        let pivot =
            (0..mat.len()).find(|&row| mat[row].0 & bit != 0 && !pivot_of_col.contains(&row))?;
        pivot_of_col.push(pivot);
        let (pivot_mask, pivot_data) = mat[pivot].clone();
        for row in 0..mat.len() {
            if row != pivot && mat[row].0 & bit != 0 {
                mat[row].0 ^= pivot_mask;
                for (out, byte) in mat[row].1.iter_mut().zip(&pivot_data) {
                    *out ^= byte;
                }
            }
        }
    }
    let mut fragments = Vec::with_capacity(seq_len);
    for (col, &row) in pivot_of_col.iter().enumerate() {
        if mat[row].0 != 1u64 << col {
            return None;
        }
        fragments.push(mat[row].1.clone());
    }
    Some(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fountain::{seq_num_for, PartIndexes};

    #[test]
    fn encode_reference_vector() {
        // Multi-part vector from the UR reference test suite.
        let payload: Vec<u8> = b"Some binary data".repeat(100);
        let fragment = encode("bytes", &payload, 1, 160).unwrap();
        assert_eq!(
            fragment,
            "ur:bytes/1-160/lpadcsnbcfamfzcybkmuldbwgegujljnihcxidinjthsjpmezolsld"
        );
    }

    #[test]
    fn single_part_roundtrip() {
        let payload = vec![0xAB; 128];
        let fragment = encode_single("bytes", &payload).unwrap();
        let mut decoder = Decoder::new();
        decoder.receive(&fragment).unwrap();
        assert!(decoder.complete());
        assert_eq!(decoder.message(), Some(payload.as_slice()));
        assert_eq!(decoder.ur_type(), Some("bytes"));
    }

    #[test]
    fn one_fragment_recovers_whole_payload() {
        // seq_len 1: the searched sequence number lands on {0}, so a single
        // fragment carries the full message.
        let payload = vec![0xAB; 128];
        let checksum = fountain::checksum(&payload);
        let seq_num = seq_num_for(1, checksum, &PartIndexes::singleton(0)).unwrap();
        assert_eq!(seq_num, 2);
        let fragment = encode("bytes", &payload, seq_num, 1).unwrap();
        let mut decoder = Decoder::new();
        decoder.receive(&fragment).unwrap();
        assert_eq!(decoder.message(), Some(payload.as_slice()));
    }

    #[test]
    fn receive_is_case_insensitive() {
        let payload = vec![0xAB; 128];
        let fragment = encode("bytes", &payload, 2, 1).unwrap().to_ascii_uppercase();
        let mut decoder = Decoder::new();
        decoder.receive(&fragment).unwrap();
        assert!(decoder.complete());
    }

    #[test]
    fn duplicate_fragments_are_ignored() {
        let payload = vec![0x5A; 64];
        let fragment = encode("bytes", &payload, 1, 2).unwrap();
        let mut decoder = Decoder::new();
        decoder.receive(&fragment).unwrap();
        decoder.receive(&fragment).unwrap();
        assert_eq!(decoder.received_parts(), 1);
        assert!(!decoder.complete());
    }

    #[test]
    fn fragments_in_any_order() {
        let payload: Vec<u8> = (0..=255).collect();
        let mut decoder = Decoder::new();
        for seq_num in [4, 2, 3, 1] {
            decoder.receive(&encode("bytes", &payload, seq_num, 4).unwrap()).unwrap();
        }
        assert_eq!(decoder.message(), Some(payload.as_slice()));
    }

    #[test]
    fn rejects_missing_scheme() {
        let mut decoder = Decoder::new();
        assert_eq!(
            decoder.receive("bytes/1-2/aeae"),
            Err(UrError::MissingScheme)
        );
    }

    #[test]
    fn rejects_malformed_path() {
        let mut decoder = Decoder::new();
        assert!(matches!(
            decoder.receive("ur:bytes/1-2/ae/extra"),
            Err(UrError::MalformedPath(_))
        ));
        assert!(matches!(
            decoder.receive("ur:bytes"),
            Err(UrError::MalformedPath(_))
        ));
    }

    #[test]
    fn rejects_bad_sequence_marker() {
        let mut decoder = Decoder::new();
        assert!(matches!(
            decoder.receive("ur:bytes/one-2/aeae"),
            Err(UrError::InvalidSequence(_))
        ));
        assert_eq!(
            decoder.receive("ur:bytes/0-2/aeae"),
            Err(UrError::ZeroSequenceNumber)
        );
    }

    #[test]
    fn rejects_conflicting_type() {
        let payload = vec![1u8; 32];
        let mut decoder = Decoder::new();
        decoder.receive(&encode("bytes", &payload, 1, 2).unwrap()).unwrap();
        let err = decoder
            .receive(&encode("crypto-output", &payload, 2, 2).unwrap())
            .unwrap_err();
        assert!(matches!(err, UrError::ConflictingType { .. }));
    }

    #[test]
    fn rejects_conflicting_framing() {
        let payload = vec![1u8; 32];
        let other = vec![2u8; 32];
        let mut decoder = Decoder::new();
        decoder.receive(&encode("bytes", &payload, 1, 2).unwrap()).unwrap();
        let err = decoder
            .receive(&encode("bytes", &other, 2, 2).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            UrError::ConflictingParameter { field: "checksum", .. }
        ));
    }

    #[test]
    fn rejects_oversized_sequence_length() {
        let payload = vec![1u8; 130];
        let fragment = encode("bytes", &payload, 1, 65).unwrap();
        let mut decoder = Decoder::new();
        assert!(matches!(
            decoder.receive(&fragment),
            Err(UrError::SequenceLengthTooLarge { got: 65, max: 64 })
        ));
    }

    #[test]
    fn solver_handles_subset_free_systems() {
        // {0,2}, {1,3}, {0,1,2}, {1,2,3}: no singleton ever appears by
        // reduction alone, yet the system has full rank.
        let payload: Vec<u8> = (0..64u8).collect();
        let checksum = fountain::checksum(&payload);
        let subsets: [&[usize]; 4] = [&[0, 2], &[1, 3], &[0, 1, 2], &[1, 2, 3]];
        let mut decoder = Decoder::new();
        for indexes in subsets {
            let parts: PartIndexes = indexes.iter().copied().collect();
            let seq_num = seq_num_for(4, checksum, &parts).unwrap();
            decoder.receive(&encode("bytes", &payload, seq_num, 4).unwrap()).unwrap();
        }
        assert_eq!(decoder.message(), Some(payload.as_slice()));
    }

    #[test]
    fn too_few_parts_stay_pending() {
        let payload: Vec<u8> = (0..64u8).collect();
        let mut decoder = Decoder::new();
        // Fragments 1 and 2 of four leave the system underdetermined.
        for seq_num in [1, 2] {
            decoder.receive(&encode("bytes", &payload, seq_num, 4).unwrap()).unwrap();
        }
        assert!(!decoder.complete());
        assert!(decoder.message().is_none());
    }

    #[test]
    fn rank_deficient_systems_stay_pending() {
        // Four parts whose subsets never touch fragment 3: enough rows to
        // attempt a solve, but the system has rank 3 of 4.
        let payload: Vec<u8> = (0..64u8).collect();
        let checksum = fountain::checksum(&payload);
        let subsets: [&[usize]; 4] = [&[0], &[1], &[2], &[0, 1, 2]];
        let mut decoder = Decoder::new();
        for indexes in subsets {
            let parts: PartIndexes = indexes.iter().copied().collect();
            let seq_num = seq_num_for(4, checksum, &parts).unwrap();
            decoder.receive(&encode("bytes", &payload, seq_num, 4).unwrap()).unwrap();
        }
        assert_eq!(decoder.received_parts(), 4);
        assert!(!decoder.complete());
    }
}
