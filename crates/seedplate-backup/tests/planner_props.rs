//! Property tests over the planner surface.

mod common;

use proptest::prelude::*;

use seedplate_backup::{bound_title, plan_fragments, GlyphFace, PlanError, MAX_TITLE_LEN};

use common::descriptor;

struct AsciiFace;

impl GlyphFace for AsciiFace {
    fn has_glyph(&self, ch: char) -> bool {
        ch.is_ascii_uppercase() || ch.is_ascii_digit() || " -/.".contains(ch)
    }
}

/// Characters reachable through UR framing after uppercasing: bytewords
/// letters, the type tag, and the `ur:`/`seqNum-seqLen` separators.
fn ur_alphabet(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch.is_ascii_digit() || matches!(ch, ':' | '-' | '/')
}

fn threshold_shapes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=7).prop_flat_map(|keys| (1usize..=keys, Just(keys)))
}

proptest! {
    // Sequence searches dominate the runtime; keep the case count modest.
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn planning_is_deterministic((threshold, keys) in threshold_shapes()) {
        let desc = descriptor(threshold, keys);
        for key_idx in 0..keys {
            let first = plan_fragments(&desc, key_idx).unwrap();
            let second = plan_fragments(&desc, key_idx).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn fragments_are_nonempty_and_alphanumeric_safe((threshold, keys) in threshold_shapes()) {
        let desc = descriptor(threshold, keys);
        for key_idx in 0..keys {
            let fragments = plan_fragments(&desc, key_idx).unwrap();
            prop_assert!(!fragments.is_empty());
            prop_assert!(fragments.len() <= 2);
            for fragment in &fragments {
                prop_assert!(fragment.starts_with("UR:CRYPTO-OUTPUT/"));
                prop_assert!(fragment.chars().all(ur_alphabet), "bad char in {}", fragment);
            }
        }
    }

    #[test]
    fn out_of_range_key_index_is_rejected((threshold, keys) in threshold_shapes()) {
        let desc = descriptor(threshold, keys);
        prop_assert_eq!(
            plan_fragments(&desc, keys),
            Err(PlanError::KeyIndexOutOfRange { key_idx: keys, keys })
        );
    }

    #[test]
    fn bound_title_is_idempotent_and_bounded(title in "\\PC{0,40}") {
        let once = bound_title(&AsciiFace, &title);
        prop_assert_eq!(&bound_title(&AsciiFace, &once), &once);
        prop_assert!(once.chars().count() <= MAX_TITLE_LEN);
        prop_assert!(once.chars().all(|ch| AsciiFace.has_glyph(ch)));
    }
}

#[test]
fn invalid_thresholds_are_rejected() {
    let mut desc = descriptor(2, 3);
    desc.threshold = 0;
    assert!(matches!(
        plan_fragments(&desc, 0),
        Err(PlanError::InvalidThreshold { threshold: 0, keys: 3 })
    ));
    desc.threshold = 4;
    assert!(matches!(
        plan_fragments(&desc, 0),
        Err(PlanError::InvalidThreshold { threshold: 4, keys: 3 })
    ));
}
