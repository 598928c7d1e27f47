#![no_main]
use code_link::{decode_with, radix, Compressor, EngineLoader, ZstdLoader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let engine = futures_executor::block_on(ZstdLoader.load()).unwrap();
    if let Ok(token) = std::str::from_utf8(data) {
        let _ = decode_with(&engine, token, 1 << 20);
        // Anything the radix layer accepts must encode back to the same token.
        if let Ok(bytes) = radix::decode(token) {
            assert_eq!(radix::encode(&bytes), token);
        }
    }
    let _ = engine.decompress(data, 1 << 20);
});
