#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rdb_stream::{EventRecorder, RdbEvent, Reader, ReaderConfig, ReaderState};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    legacy: bool,
    buffer_capacity: u8,
    /// Ключи с нечётной длиной имени пропускаются фильтром
    filter_odd_keys: bool,
    body: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let mut config = if input.legacy {
        ReaderConfig::legacy()
    } else {
        ReaderConfig::default()
    };
    config.buffer_capacity = input.buffer_capacity as usize + 1;

    // Валидный заголовок, чтобы фаззер сразу доходил до тела.
    let mut bytes = b"REDIS0003".to_vec();
    bytes.extend_from_slice(&input.body);

    let mut rec = EventRecorder::new();
    let mut filter =
        |state: &ReaderState| state.key.as_ref().map_or(true, |k| k.to_bytes().len() % 2 == 0);
    let result = if input.filter_odd_keys {
        Reader::new(config).parse(&bytes[..], &mut rec, Some(&mut filter))
    } else {
        Reader::new(config).parse(&bytes[..], &mut rec, None)
    };

    // Успешный разбор всегда заканчивается событием конца файла.
    if result.is_ok() {
        assert_eq!(rec.events().last(), Some(&RdbEvent::EndFile));
    } else {
        assert!(!rec.events().contains(&RdbEvent::EndFile));
    }
});
