//! Recoverability verification.
//!
//! The share assignments are justified by linear-algebra arguments, but the
//! argument is not the authority — this verifier is. It replays the planner
//! for every plate, then feeds every M-sized plate coalition into a fresh
//! UR decoder and demands bit-exact recovery of the descriptor. Callers run
//! it before engraving; a `false` means the threshold shape is outside the
//! supported set and must be refused.

use seedplate_ur::Decoder;
use seedplate_urtypes::{parse, OutputDescriptor};

use crate::plan::plan_fragments;

/// Upper bound on N; keeps the `2^N` coalition enumeration trivial.
pub const MAX_PLATES: usize = 16;

/// Does every M-of-N plate coalition recover `descriptor` exactly?
///
/// The engraved title is not part of the encoded payload, so it is copied
/// onto each decoded descriptor before the structural comparison.
///
/// O(C(N, M) · M · fragment cost); for N ≤ [`MAX_PLATES`] this is cheap
/// enough to run unconditionally at input-validation time.
#[must_use]
pub fn is_recoverable(descriptor: &OutputDescriptor) -> bool {
    let keys = descriptor.keys.len();
    let threshold = descriptor.threshold;
    if keys == 0 || keys > MAX_PLATES || threshold < 1 || threshold > keys {
        return false;
    }
    let mut plates = Vec::with_capacity(keys);
    for key_idx in 0..keys {
        match plan_fragments(descriptor, key_idx) {
            Ok(fragments) => plates.push(fragments),
            Err(_) => return false,
        }
    }
    let all_coalitions: u32 = (1u32 << keys) - 1;
    for coalition in 1..=all_coalitions {
        if coalition.count_ones() as usize != threshold {
            continue;
        }
        if !coalition_recovers(descriptor, &plates, coalition) {
            return false;
        }
    }
    true
}

fn coalition_recovers(
    descriptor: &OutputDescriptor,
    plates: &[Vec<String>],
    coalition: u32,
) -> bool {
    let mut decoder = Decoder::new();
    let mut remaining = coalition;
    while remaining != 0 {
        let key_idx = remaining.trailing_zeros() as usize;
        remaining &= remaining - 1;
        for fragment in &plates[key_idx] {
            if decoder.receive(fragment).is_err() {
                return false;
            }
        }
    }
    let (Some(ur_type), Some(message)) = (decoder.ur_type(), decoder.message()) else {
        return false;
    };
    let Ok(mut recovered) = parse(ur_type, message) else {
        return false;
    };
    recovered.title.clone_from(&descriptor.title);
    recovered == *descriptor
}
