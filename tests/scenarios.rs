//! Сквозные сценарии разбора: порядок событий, истечение, пропуск ключей,
//! неизвестный тег.

use rdb_stream::{
    EventRecorder, FormatError, RdbEvent,
    RdbEvent::*,
    RdbValue, Reader, ReaderState, StackError, StatusCode,
};

mod fixtures;
use fixtures::*;

fn k(s: &str) -> RdbValue {
    RdbValue::from(s)
}

fn decode(bytes: &[u8]) -> (Result<(), StackError>, Vec<RdbEvent>) {
    let mut rec = EventRecorder::new();
    let res = rdb_stream::parse(bytes, &mut rec, None);
    (res, rec.into_events())
}

/// Тест проверяет полную последовательность событий для одного строкового
/// ключа.
#[test]
fn test_single_scalar() {
    let bytes = SnapshotBuilder::new(3).select_db(0).string(b"k", b"v").eof();
    let (res, events) = decode(&bytes);
    res.unwrap();
    assert_eq!(
        events,
        vec![
            StartFile(3),
            StartDatabase(0),
            SetScalar {
                key: k("k"),
                value: k("v")
            },
            EndDatabase(0),
            EndFile,
        ]
    );
}

/// Тест проверяет, что `expire_at` приходит ровно один раз и после значения.
#[test]
fn test_expire_ms_after_value() {
    let bytes = SnapshotBuilder::new(3)
        .select_db(0)
        .expire_ms(1_700_000_000_123)
        .string(b"session", b"abc")
        .string(b"plain", b"x")
        .eof();
    let (res, events) = decode(&bytes);
    res.unwrap();
    assert_eq!(
        &events[2..5],
        &[
            SetScalar {
                key: k("session"),
                value: k("abc")
            },
            ExpireAt {
                key: k("session"),
                epoch_ms: 1_700_000_000_123
            },
            SetScalar {
                key: k("plain"),
                value: k("x")
            },
        ]
    );
    let expires = events
        .iter()
        .filter(|e| matches!(e, ExpireAt { .. }))
        .count();
    assert_eq!(expires, 1);
}

/// Тест проверяет, что отклонённый список даёт по событию пропуска на
/// элемент, а следующий ключ читается с правильной позиции.
#[test]
fn test_rejected_list_keeps_stream_position() {
    let bytes = SnapshotBuilder::new(3)
        .select_db(0)
        .list(b"drop", &[b"a", b"bb", b"ccc"])
        .string(b"keep", b"value")
        .eof();

    let mut rec = EventRecorder::new();
    let mut filter = |state: &ReaderState| state.key != Some(RdbValue::from("drop"));
    let stats = Reader::default()
        .parse(&bytes[..], &mut rec, Some(&mut filter))
        .unwrap();

    assert_eq!(
        rec.events(),
        &[
            StartFile(3),
            StartDatabase(0),
            Skip { key: k("drop") },
            Skip { key: k("drop") },
            Skip { key: k("drop") },
            SetScalar {
                key: k("keep"),
                value: k("value")
            },
            EndDatabase(0),
            EndFile,
        ]
    );
    assert_eq!(stats.keys_skipped, 1);
    assert_eq!(stats.keys_decoded, 1);
}

/// Тест проверяет, что неизвестный тег типа прерывает разбор и после
/// последнего успешного события ничего не приходит.
#[test]
fn test_unknown_type_stops_parse() {
    let bytes = SnapshotBuilder::new(3)
        .select_db(0)
        .string(b"a", b"1")
        .raw(&[7, 1, b'x', 1, b'y'])
        .string(b"b", b"2")
        .eof();
    let offset = (bytes.len() - 6 - 5) as u64;

    let (res, events) = decode(&bytes);
    let err = res.unwrap_err();
    assert_eq!(
        err.format_error(),
        Some(&FormatError::UnknownType { tag: 7, offset })
    );
    assert_eq!(err.status_code(), StatusCode::CorruptedData);
    assert_eq!(
        events.last(),
        Some(&SetScalar {
            key: k("a"),
            value: k("1")
        })
    );
}

/// Тест проверяет смену баз: каждая открытая база закрывается перед
/// следующей и перед концом файла.
#[test]
fn test_database_switch() {
    let bytes = SnapshotBuilder::new(6)
        .select_db(0)
        .string(b"a", b"1")
        .select_db(15)
        .string(b"b", b"2")
        .select_db(300)
        .eof();
    let (res, events) = decode(&bytes);
    res.unwrap();
    let structural: Vec<_> = events
        .into_iter()
        .filter(|e| !matches!(e, SetScalar { .. }))
        .collect();
    assert_eq!(
        structural,
        vec![
            StartFile(6),
            StartDatabase(0),
            EndDatabase(0),
            StartDatabase(15),
            EndDatabase(15),
            StartDatabase(300),
            EndDatabase(300),
            EndFile,
        ]
    );
}

/// Тест проверяет ключи до первого SELECTDB: события базы не генерируются.
#[test]
fn test_keys_without_database() {
    let bytes = SnapshotBuilder::new(2).string(b"a", b"1").eof();
    let (res, events) = decode(&bytes);
    res.unwrap();
    assert_eq!(
        events,
        vec![
            StartFile(2),
            SetScalar {
                key: k("a"),
                value: k("1")
            },
            EndFile,
        ]
    );
}

/// Тест проверяет статистику разбора.
#[test]
fn test_parse_stats() {
    let bytes = SnapshotBuilder::new(4)
        .select_db(0)
        .expire_secs(100)
        .string(b"a", b"1")
        .select_db(1)
        .set(b"s", &[b"x", b"y"])
        .eof();
    let stats = Reader::default()
        .parse(&bytes[..], &mut EventRecorder::new(), None)
        .unwrap();
    assert_eq!(stats.version, Some(4));
    assert_eq!(stats.databases, 2);
    assert_eq!(stats.keys_decoded, 2);
    assert_eq!(stats.keys_skipped, 0);
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.bytes_read, bytes.len() as u64);
}

/// Тест проверяет, что данные после маркера EOF не читаются.
#[test]
fn test_trailing_bytes_ignored() {
    let mut bytes = SnapshotBuilder::new(3).string(b"a", b"1").eof();
    let len = bytes.len() as u64;
    bytes.extend_from_slice(b"garbage");
    let stats = Reader::default()
        .parse(&bytes[..], &mut EventRecorder::new(), None)
        .unwrap();
    assert_eq!(stats.bytes_read, len);
}
