#![no_main]
use libfuzzer_sys::fuzz_target;
use textcodecs::{Codec, Lz77Codec, LzwCodec, SymbolTable};

fuzz_target!(|input_bytes: Vec<u8>| {
    let Ok(table) = SymbolTable::new("abcd$", &[0.3, 0.3, 0.2, 0.1, 0.1]) else {
        return;
    };
    // Two bits per byte keeps the alphabet small and the text repetitive.
    let text: Vec<u8> = input_bytes.iter().map(|&b| b"abcd"[(b & 3) as usize]).collect();

    let lz77 = Lz77Codec::new(&table);
    let encoded = lz77.encode(&text).unwrap();
    assert_eq!(lz77.decode_encoded(&encoded).unwrap(), text);

    let lzw = LzwCodec::with_sentinel(&table, b'$');
    let encoded = lzw.encode(&text).unwrap();
    assert_eq!(lzw.decode_encoded(&encoded).unwrap(), text);
});
