use proptest::prelude::*;
use textcodecs::arithmetic::PRECISION;
use textcodecs::block::BlockParams;
use textcodecs::huffman::HuffmanTree;
use textcodecs::shannon::ShannonTable;
use textcodecs::{
    AnyCodec, ArithmeticCodec, BitStream, BlockCodec, Codec, CodecKind, Error, FixedWidthCodec,
    HuffmanCodec, Lz77Codec, LzwCodec, ShannonFanoCodec, SymbolTable,
};

const SENTINEL: u8 = b'#';

/// A table over `a..` with positive weights, with the sentinel appended
/// last, and a text over the non-sentinel symbols.
fn table_and_text() -> impl Strategy<Value = (SymbolTable, Vec<u8>)> {
    prop::collection::vec(1u32..100, 1..12).prop_flat_map(|weights| {
        let n = weights.len();
        let mut alphabet: Vec<u8> = (0..n as u8).map(|i| b'a' + i).collect();
        alphabet.push(SENTINEL);
        let mut weights: Vec<f64> = weights.into_iter().map(f64::from).collect();
        weights.push(1.0);
        let total: f64 = weights.iter().sum();
        let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();
        let table = SymbolTable::new(alphabet, &probabilities).unwrap();
        let text = prop::collection::vec((0..n as u8).prop_map(|i| b'a' + i), 0..200);
        (Just(table), text)
    })
}

proptest! {
    #[test]
    fn test_fixed_roundtrip(text in prop::collection::vec(any::<u8>(), 0..200)) {
        let table = SymbolTable::new("a", &[1.0]).unwrap();
        let codec = FixedWidthCodec::new(&table);
        let encoded = codec.encode(&text).unwrap();
        prop_assert_eq!(encoded.bits.len(), 8 * text.len());
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_block_roundtrip_and_width((table, text) in table_and_text()) {
        let codec = BlockCodec::new(&table);
        let encoded = codec.encode(&text).unwrap();
        let n = table.len();
        let expected = (1..).find(|&w| 1usize << w >= n).unwrap();
        prop_assert_eq!(encoded.params, BlockParams { width: expected });
        prop_assert_eq!(encoded.bits.len(), expected * text.len());
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_huffman_roundtrip((table, text) in table_and_text()) {
        let codec = HuffmanCodec::new(&table);
        let encoded = codec.encode(&text).unwrap();
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_huffman_tree_shape((table, _text) in table_and_text()) {
        let tree = HuffmanTree::build(&table);
        prop_assert_eq!(tree.leaf_count(), table.len());
        prop_assert_eq!(tree.internal_count(), table.len() - 1);

        let codes: Vec<String> = table
            .symbols()
            .iter()
            .map(|&s| tree.code(s).unwrap().to_string())
            .collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                prop_assert!(i == j || !b.starts_with(a.as_str()));
            }
        }
        // Never worse than one bit above the entropy.
        prop_assert!(tree.average_length() < table.entropy() + 1.0 + 1e-9);
    }

    #[test]
    fn test_shannon_roundtrip((table, text) in table_and_text()) {
        let codec = ShannonFanoCodec::new(&table);
        let encoded = codec.encode(&text).unwrap();
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_shannon_codes_monotone_and_prefix_free((table, _text) in table_and_text()) {
        let codes = ShannonTable::build(&table);
        let entries = codes.entries();
        for pair in entries.windows(2) {
            prop_assert!(pair[0].probability >= pair[1].probability);
            let first = pair[0].code.as_ref().unwrap().len();
            let second = pair[1].code.as_ref().unwrap().len();
            prop_assert!(first <= second);
        }

        let rendered: Vec<String> = entries
            .iter()
            .map(|e| e.code.as_ref().unwrap().to_string())
            .collect();
        for (i, a) in rendered.iter().enumerate() {
            for (j, b) in rendered.iter().enumerate() {
                prop_assert!(i == j || !b.starts_with(a.as_str()), "{} prefixes {}", a, b);
            }
        }
    }

    #[test]
    fn test_shannon_prefix_free_on_fractional_weights(
        weights in prop::collection::vec(1u32..60, 2..10),
    ) {
        // Weights divided by their sum give probabilities just off dyadic values.
        let total: u32 = weights.iter().sum();
        let probabilities: Vec<f64> =
            weights.iter().map(|&w| f64::from(w) / f64::from(total)).collect();
        let alphabet: Vec<u8> = (0..weights.len() as u8).map(|i| b'a' + i).collect();
        let table = SymbolTable::new(&alphabet, &probabilities).unwrap();
        let codec = ShannonFanoCodec::new(&table);
        let encoded = codec.encode(&alphabet).unwrap();
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), alphabet);
    }

    #[test]
    fn test_arithmetic_roundtrip((table, text) in table_and_text()) {
        let codec = ArithmeticCodec::with_sentinel(&table, SENTINEL);
        let encoded = codec.encode(&text).unwrap();
        let mut terminated = text.clone();
        terminated.push(SENTINEL);
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), terminated);
    }

    #[test]
    fn test_arithmetic_is_deterministic((table, text) in table_and_text()) {
        let first = ArithmeticCodec::with_sentinel(&table, SENTINEL).encode(&text).unwrap();
        let second = ArithmeticCodec::with_sentinel(&table, SENTINEL).encode(&text).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_arithmetic_near_information_content((table, text) in table_and_text()) {
        let codec = ArithmeticCodec::with_sentinel(&table, SENTINEL);
        let encoded = codec.encode(&text).unwrap();
        let mut terminated = text.clone();
        terminated.push(SENTINEL);
        let bound = table.information_content(&terminated).unwrap();
        // Renormalization loses at most two bits; the flush adds one register.
        prop_assert!((encoded.bits.len() as f64) <= bound + 2.0 + PRECISION as f64);
    }

    #[test]
    fn test_lz77_roundtrip((table, text) in table_and_text()) {
        let codec = Lz77Codec::new(&table);
        let encoded = codec.encode(&text).unwrap();
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_lzw_roundtrip((table, text) in table_and_text()) {
        let codec = LzwCodec::with_sentinel(&table, SENTINEL);
        let encoded = codec.encode(&text).unwrap();
        prop_assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
        // Dictionary grows by one per code after the first.
        let codes = encoded.bits.len() / encoded.params.block_size;
        let grown = encoded.params.dictionary_size - table.len();
        prop_assert_eq!(grown, codes.saturating_sub(1));
    }

    #[test]
    fn test_any_codec_rejects_garbage_without_panicking(
        (table, _text) in table_and_text(),
        garbage in prop::collection::vec(any::<bool>(), 0..300),
    ) {
        let bits: BitStream = garbage.into_iter().collect();
        for kind in CodecKind::ALL {
            let codec = AnyCodec::with_sentinel(kind, &table, SENTINEL);
            let params = codec.encode(b"a").unwrap().params;
            let _ = codec.decode(&bits, &params);
        }
    }
}

#[test]
fn test_unnormalized_table_is_rejected() {
    assert!(matches!(
        SymbolTable::new("ab", &[0.3, 0.3]),
        Err(Error::Config(_))
    ));
}
