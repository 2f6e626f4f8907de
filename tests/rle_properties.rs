use nbitmap::rle::{self, RleError, MAX_RUN};
use proptest::prelude::*;

/// Buffers with a small alphabet so runs actually show up.
fn runny_buffer() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::vec(
        (0u16..4, 1usize..12).prop_map(|(value, len)| vec![value; len]),
        1..40,
    )
    .prop_map(|runs| runs.concat())
    .prop_filter("need at least two words", |v| v.len() >= 2)
}

proptest! {
    #[test]
    fn round_trip_any_words(data in prop::collection::vec(any::<u16>(), 2..500)) {
        let encoded = rle::encode(&data).unwrap();
        prop_assert_eq!(rle::decode(&encoded).unwrap(), data);
    }

    #[test]
    fn round_trip_runny_words(data in runny_buffer()) {
        let encoded = rle::encode(&data).unwrap();
        prop_assert_eq!(rle::decode(&encoded).unwrap(), data);
    }

    #[test]
    fn encoded_size_is_bounded(data in prop::collection::vec(0u16..8, 2..500)) {
        let encoded = rle::encode(&data).unwrap();
        prop_assert!(encoded.len() <= 2 * data.len() + 2);
    }

    #[test]
    fn tokens_never_exceed_the_count_limit(data in runny_buffer()) {
        for token in rle::tokens(&rle::encode(&data).unwrap()) {
            let token = token.unwrap();
            prop_assert!(token.expanded_len() >= 1);
            prop_assert!(token.expanded_len() <= MAX_RUN);
        }
    }

    #[test]
    fn truncated_streams_fail(data in prop::collection::vec(0u16..3, 4..200), cut in 1usize..3) {
        let encoded = rle::encode(&data).unwrap();
        prop_assume!(encoded.len() > cut + 1);

        // Chopping words off the end of a valid stream either lands on a token
        // boundary (shorter output) or leaves a token hanging
        let truncated = &encoded[..encoded.len() - cut];
        match rle::decode(truncated) {
            Ok(decoded) => prop_assert!(decoded.len() < data.len()),
            Err(e) => prop_assert!(matches!(e, RleError::MalformedStream { .. }), "unexpected error {e}"),
        }
    }
}

#[test]
fn worked_examples() {
    assert_eq!(rle::encode(&[5, 5, 5, 5, 2, 2, 9, 9, 9]).unwrap(), vec![4, 5, 2, 2, 3, 9]);
    assert_eq!(rle::decode(&[4, 5, 2, 2, 3, 9]).unwrap(), vec![5, 5, 5, 5, 2, 2, 9, 9, 9]);

    assert_eq!(rle::encode(&[1, 2, 3, 4]).unwrap(), vec![0x8004, 1, 2, 3, 4]);
    assert_eq!(rle::decode(&[0x8004, 1, 2, 3, 4]).unwrap(), vec![1, 2, 3, 4]);

    assert_eq!(rle::decode(&[0x8002, 11, 22, 3, 99]).unwrap(), vec![11, 22, 99, 99, 99]);
}

#[test]
fn very_long_runs_round_trip() {
    let mut data = vec![1u16; 100_000];
    data.extend((0..70_000u32).map(|v| (v % 65_000) as u16));
    data.extend(vec![2u16; 40_000]);

    let encoded = rle::encode(&data).unwrap();
    assert_eq!(rle::decode(&encoded).unwrap(), data);
}
