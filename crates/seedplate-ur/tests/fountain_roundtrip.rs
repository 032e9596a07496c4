//! End-to-end fragment stream tests: encode designated part subsets,
//! shuffle them through the decoder, recover the payload.

use proptest::prelude::*;

use seedplate_ur::fountain::{self, PartIndexes};
use seedplate_ur::{ur, Decoder};

fn fragment_for(payload: &[u8], seq_len: usize, indexes: &[usize]) -> String {
    let parts: PartIndexes = indexes.iter().copied().collect();
    let seq_num = fountain::seq_num_for(seq_len, fountain::checksum(payload), &parts)
        .expect("subset is realizable");
    ur::encode("bytes", payload, seq_num, seq_len).expect("encoding succeeds")
}

fn decode_all(fragments: &[String]) -> Option<Vec<u8>> {
    let mut decoder = Decoder::new();
    for fragment in fragments {
        decoder.receive(fragment).ok()?;
    }
    decoder.message().map(<[u8]>::to_vec)
}

#[test]
fn near_threshold_stream_recovers_with_combined_part() {
    // 2-of-3 plate shapes: fragments {0} and {0,1}; fragment 1 is absent
    // and must come out of the combined part by cancellation.
    let payload = vec![0xAB; 128];
    let fragments = vec![
        fragment_for(&payload, 2, &[0]),
        fragment_for(&payload, 2, &[0, 1]),
    ];
    assert_eq!(decode_all(&fragments), Some(payload));
}

#[test]
fn two_of_four_no_singleton_coalition() {
    // The plate-2/plate-3 coalition of the 2-of-4 assignment: four mixed
    // parts, no singleton, full rank.
    let payload: Vec<u8> = (0u16..407).map(|i| (i % 251) as u8).collect();
    let fragments = vec![
        fragment_for(&payload, 4, &[0, 2]),
        fragment_for(&payload, 4, &[1, 3]),
        fragment_for(&payload, 4, &[0, 1, 2]),
        fragment_for(&payload, 4, &[1, 2, 3]),
    ];
    assert_eq!(decode_all(&fragments), Some(payload));
}

#[test]
fn three_of_five_hub_coalition() {
    // The {0,2,4} coalition of the 3-of-5 assignment. Fragment 3 never
    // appears alone and no peeling order exists; only elimination over the
    // hub part (index 5) recovers it.
    let payload: Vec<u8> = (0u16..507).map(|i| (i % 241) as u8).collect();
    let fragments = vec![
        fragment_for(&payload, 6, &[0]),
        fragment_for(&payload, 6, &[1, 4, 5]),
        fragment_for(&payload, 6, &[2]),
        fragment_for(&payload, 6, &[1, 3, 5]),
        fragment_for(&payload, 6, &[4]),
        fragment_for(&payload, 6, &[0, 3, 5]),
    ];
    assert_eq!(decode_all(&fragments), Some(payload));
}

#[test]
fn arrival_order_does_not_matter() {
    let payload: Vec<u8> = (0u16..507).map(|i| (i % 241) as u8).collect();
    let mut fragments = vec![
        fragment_for(&payload, 6, &[0]),
        fragment_for(&payload, 6, &[1, 4, 5]),
        fragment_for(&payload, 6, &[2]),
        fragment_for(&payload, 6, &[1, 3, 5]),
        fragment_for(&payload, 6, &[4]),
        fragment_for(&payload, 6, &[0, 3, 5]),
    ];
    fragments.reverse();
    assert_eq!(decode_all(&fragments), Some(payload));
}

#[test]
fn uppercase_stream_decodes() {
    let payload = vec![0xAB; 128];
    let fragments: Vec<String> = vec![
        fragment_for(&payload, 2, &[1]).to_ascii_uppercase(),
        fragment_for(&payload, 2, &[0, 1]).to_ascii_uppercase(),
    ];
    assert_eq!(decode_all(&fragments), Some(payload));
}

proptest! {
    #[test]
    fn encoding_is_deterministic(payload in proptest::collection::vec(any::<u8>(), 1..256), seq_len in 1usize..6) {
        let a = ur::encode("bytes", &payload, 1, seq_len).unwrap();
        let b = ur::encode("bytes", &payload, 1, seq_len).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn all_singletons_reassemble(payload in proptest::collection::vec(any::<u8>(), 1..256), seq_len in 1usize..6) {
        let fragments: Vec<String> = (1..=seq_len as u32)
            .map(|seq_num| ur::encode("bytes", &payload, seq_num, seq_len).unwrap())
            .collect();
        prop_assert_eq!(decode_all(&fragments), Some(payload));
    }

    #[test]
    fn bytewords_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
        let encoded = seedplate_ur::bytewords::encode(&payload);
        prop_assert_eq!(seedplate_ur::bytewords::decode(&encoded).unwrap(), payload);
    }
}
