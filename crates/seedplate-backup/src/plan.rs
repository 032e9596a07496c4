//! Share assignment: which fountain parts each plate carries.
//!
//! A UR fragment can carry the XOR of several fountain parts, and the
//! sequence number alone determines which ones. The planner exploits this:
//! it picks a part subset for every fragment of every plate, then searches
//! for the sequence numbers that make the standard UR encoding produce
//! exactly those subsets. Any decoder that speaks UR fountain framing can
//! then recover the descriptor from any M plates, with no custom format.
//!
//! Assignment schemes by threshold shape:
//!
//! - **M ≤ 1** — one part, every plate carries it whole.
//! - **N − M ≤ 1** — the data splits into M parts; plate k < M carries part
//!   k, and the extra plate (when N = M + 1) carries the XOR of all M. A
//!   coalition of the M singleton plates recovers directly; any other
//!   coalition misses exactly one part, which falls out of the combined
//!   fragment by cancelling the M − 1 parts it does hold.
//! - **2-of-4** — four parts, two fragments per plate, fixed table below.
//!   Every pair of plates spans the four parts.
//! - **3-of-5** — six parts, two fragments per plate: the plate's own part
//!   k, plus part 5 XOR the two cyclic neighbours of k among parts 0..4.
//!   Part 5 acts as a hub tying the combined fragments together; every
//!   3-plate coalition yields a full-rank system over GF(2).
//! - **anything else** — one part replicated to every plate. Always
//!   recoverable, optimal only for M = 1.
//!
//! The verifier replays all of this against a real decoder; see
//! [`crate::is_recoverable`].

use seedplate_ur::fountain::{self, PartIndexes};
use seedplate_ur::ur;
use seedplate_urtypes::{OutputDescriptor, UR_TYPE};

use crate::error::PlanError;

/// The share-assignment scheme for a threshold shape (M, N).
///
/// A closed set of cases; adding a scheme means adding a variant, not
/// editing branch logic spread across the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// M ≤ 1: every plate recovers alone.
    Single,
    /// N − M ≤ 1: one singleton per plate plus one combined plate.
    NearThreshold {
        /// The signing threshold M, which is also the part count.
        threshold: usize,
    },
    /// The fixed 2-of-4 table.
    TwoOfFour,
    /// The hub-and-neighbours 3-of-5 assignment.
    ThreeOfFive,
    /// Fallback: the whole descriptor on every plate.
    Replicate,
}

impl Scheme {
    /// Select the scheme for a valid threshold shape.
    ///
    /// Callers validate `1 <= threshold <= keys` first.
    #[must_use]
    pub fn select(threshold: usize, keys: usize) -> Self {
        match (threshold, keys) {
            (m, _) if m <= 1 => Self::Single,
            (m, n) if n <= m + 1 => Self::NearThreshold { threshold: m },
            (2, 4) => Self::TwoOfFour,
            (3, 5) => Self::ThreeOfFive,
            _ => Self::Replicate,
        }
    }

    /// Number of fountain parts the payload splits into.
    #[must_use]
    pub fn seq_len(self) -> usize {
        match self {
            Self::Single | Self::Replicate => 1,
            Self::NearThreshold { threshold } => threshold,
            Self::TwoOfFour => 4,
            Self::ThreeOfFive => 6,
        }
    }

    /// The ordered part subsets engraved on plate `key_idx`.
    #[must_use]
    pub fn shares(self, key_idx: usize) -> Vec<PartIndexes> {
        match self {
            Self::Single | Self::Replicate => vec![PartIndexes::singleton(0)],
            Self::NearThreshold { threshold } => {
                if key_idx < threshold {
                    vec![PartIndexes::singleton(key_idx)]
                } else {
                    vec![PartIndexes::first_n(threshold)]
                }
            }
            Self::TwoOfFour => {
                let table: [[&[usize]; 2]; 4] = [
                    [&[0], &[1]],
                    [&[2], &[3]],
                    [&[0, 2], &[1, 3]],
                    [&[0, 2, 1], &[1, 3, 2]],
                ];
                table[key_idx]
                    .iter()
                    .map(|indexes| indexes.iter().copied().collect())
                    .collect()
            }
            Self::ThreeOfFive => {
                let own = PartIndexes::singleton(key_idx);
                let hub = [5, (key_idx + 4) % 5, (key_idx + 1) % 5]
                    .into_iter()
                    .collect();
                vec![own, hub]
            }
        }
    }
}

/// Plan the UR fragment strings engraved on plate `key_idx`.
///
/// Output is deterministic: equal descriptors and indexes produce
/// byte-identical strings. Fragments are uppercased for the QR encoder's
/// alphanumeric mode.
///
/// # Errors
///
/// Returns [`PlanError`] for an out-of-range key index, an invalid
/// threshold, or a descriptor that fails to encode. A
/// [`PlanError::NoEncoding`] is a planner defect, not bad input.
pub fn plan_fragments(
    descriptor: &OutputDescriptor,
    key_idx: usize,
) -> Result<Vec<String>, PlanError> {
    let keys = descriptor.keys.len();
    let threshold = descriptor.threshold;
    if keys == 0 || threshold < 1 || threshold > keys {
        return Err(PlanError::InvalidThreshold { threshold, keys });
    }
    if key_idx >= keys {
        return Err(PlanError::KeyIndexOutOfRange { key_idx, keys });
    }
    let scheme = Scheme::select(threshold, keys);
    if scheme == Scheme::Replicate {
        tracing::warn!(
            threshold,
            keys,
            "no optimized share assignment; every plate carries the full descriptor"
        );
    }
    let payload = descriptor.encode()?;
    let checksum = fountain::checksum(&payload);
    let seq_len = scheme.seq_len();
    let mut fragments = Vec::new();
    for parts in scheme.shares(key_idx) {
        let seq_num = fountain::seq_num_for(seq_len, checksum, &parts)?;
        let text = ur::encode(UR_TYPE, &payload, seq_num, seq_len)?;
        fragments.push(text.to_ascii_uppercase());
    }
    Ok(fragments)
}
