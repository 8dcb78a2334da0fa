#![no_main]

use libfuzzer_sys::fuzz_target;
use rdb_stream::rdb::lzf::decompress;

fuzz_target!(|data: &[u8]| {
    let Some((&len, input)) = data.split_first() else {
        return;
    };
    let expected = len as usize * 16;

    // Либо ровно `expected` байт, либо ошибка, но не паника.
    if let Ok(out) = decompress(input, expected) {
        assert_eq!(out.len(), expected);
    }
});
