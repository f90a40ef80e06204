#![no_main]
use libfuzzer_sys::fuzz_target;
use textcodecs::{ArithmeticCodec, BitStream, Codec, SymbolTable};

fuzz_target!(|data: (Vec<u8>, [u8; 4])| {
    let (input_bytes, weights) = data;

    // Three symbols plus the sentinel, weights from the fuzzer.
    let weights: Vec<f64> = weights.iter().map(|&w| f64::from(w) + 1.0).collect();
    let total: f64 = weights.iter().sum();
    let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();
    let Ok(table) = SymbolTable::new("abc$", &probabilities) else {
        return;
    };
    let codec = ArithmeticCodec::with_sentinel(&table, b'$');

    let mut text: Vec<u8> = input_bytes.iter().map(|&b| b"abc"[(b % 3) as usize]).collect();
    let encoded = codec.encode(&text).unwrap();
    text.push(b'$');
    assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);

    // Arbitrary bits must be rejected or decoded, never panic.
    let garbage: BitStream = input_bytes
        .iter()
        .flat_map(|&b| (0..8).map(move |i| (b >> i) & 1 == 1))
        .collect();
    let _ = codec.decode(&garbage, &encoded.params);
});
