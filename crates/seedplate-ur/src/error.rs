//! UR codec error types.

use thiserror::Error;

use crate::fountain::PartIndexes;

/// Bytewords decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytewordsError {
    /// Minimal-style bytewords come in two-letter digrams.
    #[error("encoded length {0} is not a multiple of two")]
    OddLength(usize),

    /// A digram that maps to no byteword.
    #[error("unknown byteword digram {0:?}")]
    UnknownDigram(String),

    /// The body is too short to carry its four checksum bytes.
    #[error("body shorter than its checksum")]
    MissingChecksum,

    /// The trailing CRC-32 does not match the decoded body.
    #[error("byteword checksum mismatch (expected {expected:#010x}, got {got:#010x})")]
    ChecksumMismatch {
        /// Checksum carried by the encoding.
        expected: u32,
        /// Checksum of the decoded body.
        got: u32,
    },
}

/// The sequence-number search exhausted its probe budget.
///
/// The part chooser is surjective onto the non-empty subsets of part
/// indexes, so hitting the bound means the requested set was malformed
/// (empty, or referencing parts past `seq_len`) or there is a bug in the
/// caller. This is a precondition failure, not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no sequence number within the probe bound selects parts {parts} of {seq_len}")]
pub struct NoEncoding {
    /// Number of fragments the payload was split into.
    pub seq_len: usize,
    /// The part-index set the search was asked to realize.
    pub parts: PartIndexes,
}

/// UR text encoding/decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrError {
    /// The text does not start with the `ur:` scheme.
    #[error("missing ur: scheme prefix")]
    MissingScheme,

    /// The path has neither the single-part nor the multi-part shape.
    #[error("malformed ur path {0:?}")]
    MalformedPath(String),

    /// Type tags are limited to lowercase letters, digits and dashes.
    #[error("invalid ur type tag {0:?}")]
    InvalidTypeTag(String),

    /// The `seqNum-seqLen` marker did not parse.
    #[error("invalid sequence marker {0:?}")]
    InvalidSequence(String),

    /// Sequence numbers start at 1.
    #[error("sequence number must be at least 1")]
    ZeroSequenceNumber,

    /// A message is split into at least one fragment.
    #[error("sequence length must be at least 1")]
    ZeroSequenceLength,

    /// The decoder indexes parts with a 64-bit mask.
    #[error("sequence length {got} exceeds the supported maximum {max}")]
    SequenceLengthTooLarge {
        /// Sequence length carried by the fragment.
        got: usize,
        /// Largest supported sequence length.
        max: usize,
    },

    /// The path marker and the CBOR part header disagree.
    #[error("sequence marker disagrees with the part header")]
    SequenceMarkerMismatch,

    /// A fragment from a different UR stream was fed to the decoder.
    #[error("conflicting ur type (stream {stream:?}, fragment {fragment:?})")]
    ConflictingType {
        /// Type tag the decoder locked onto.
        stream: String,
        /// Type tag of the rejected fragment.
        fragment: String,
    },

    /// A fragment whose framing parameters contradict the stream.
    #[error("conflicting {field} (stream {stream}, fragment {fragment})")]
    ConflictingParameter {
        /// Which framing field conflicted.
        field: &'static str,
        /// Value the decoder locked onto.
        stream: u64,
        /// Value carried by the rejected fragment.
        fragment: u64,
    },

    /// Fragment data of the wrong length for the stream.
    #[error("fragment length {got} does not match expected {expected}")]
    FragmentLength {
        /// Length of the received fragment data.
        got: usize,
        /// `ceil(message_len / seq_len)`.
        expected: usize,
    },

    /// The assembled message failed its fountain-layer checksum.
    #[error("message checksum mismatch (expected {expected:#010x}, got {got:#010x})")]
    MessageChecksum {
        /// Checksum carried by the parts.
        expected: u32,
        /// Checksum of the assembled message.
        got: u32,
    },

    /// Too many distinct parts buffered without completing.
    #[error("part buffer limit exceeded ({limit} parts)")]
    PartBufferExceeded {
        /// Maximum number of buffered parts.
        limit: usize,
    },

    /// The part payload is not the expected CBOR array.
    #[error("invalid part encoding: {0}")]
    Cbor(String),

    /// Bytewords-level failure.
    #[error(transparent)]
    Bytewords(#[from] BytewordsError),
}
