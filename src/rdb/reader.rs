//! Потоковый декодер снапшотов.
//!
//! # Ход разбора
//!
//! ```text
//! Header → EntryLoop ─┬─ SELECTDB  → EntryLoop
//!                     ├─ EXPIRE*   → KeyValue
//!                     ├─ <type>    → KeyValue → EntryLoop
//!                     └─ EOF       → конец
//! ```
//!
//! Декодер читает вход строго последовательно и вызывает callback'и по мере
//! разбора. Любая ошибка формата фатальна: после неё событий больше нет.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use rdb_error::{ensure, FormatError, RdbResult, ResultExt};
use tracing::{debug, trace};

use super::{
    callbacks::RdbCallbacks,
    filter::KeyFilter,
    length::read_length,
    object::{read_object, skip_object},
    source::ByteReader,
    state::ReaderState,
    string::read_string,
    tags::{
        ValueType, OPCODE_EOF, OPCODE_EXPIRETIME, OPCODE_EXPIRETIME_MS, OPCODE_SELECTDB,
        RDB_SIGNATURE, RDB_VERSION_LEN,
    },
};
use crate::config::ReaderConfig;

/// Статистика одного разбора.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Кол-во прочитанных байт
    pub bytes_read: u64,
    /// Кол-во встреченных SELECTDB
    pub databases: u64,
    /// Кол-во декодированных ключей
    pub keys_decoded: u64,
    /// Кол-во ключей, отклонённых фильтром
    pub keys_skipped: u64,
    /// Кол-во событий `expire_at`
    pub expirations: u64,
    /// Версия формата из заголовка
    pub version: Option<u32>,
}

/// Декодер снапшотов с заданной конфигурацией.
///
/// Не хранит состояния между разборами: один `Reader` можно использовать
/// для любого числа входов, в том числе из разных потоков.
#[derive(Debug, Clone, Default)]
pub struct Reader {
    config: ReaderConfig,
}

/// Состояние одного разбора.
struct Session<'c, 'f, R: Read, C: RdbCallbacks + ?Sized> {
    src: ByteReader<R>,
    callbacks: &'c mut C,
    filter: Option<&'f mut dyn KeyFilter>,
    state: ReaderState,
    stats: ParseStats,
}

impl Reader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Разбирает снапшот из потока.
    ///
    /// `filter`, если задан, решает для каждого ключа, декодировать его или
    /// пропустить.
    pub fn parse<R, C>(
        &self,
        input: R,
        callbacks: &mut C,
        filter: Option<&mut dyn KeyFilter>,
    ) -> RdbResult<ParseStats>
    where
        R: Read,
        C: RdbCallbacks + ?Sized,
    {
        let reader = BufReader::with_capacity(self.config.buffer_capacity, input);
        let mut session = Session {
            src: ByteReader::new(reader),
            callbacks,
            filter,
            state: ReaderState::new(),
            stats: ParseStats::default(),
        };
        session.run(&self.config)?;
        Ok(session.stats)
    }

    /// Открывает файл и разбирает его.
    pub fn parse_file<P, C>(
        &self,
        path: P,
        callbacks: &mut C,
        filter: Option<&mut dyn KeyFilter>,
    ) -> RdbResult<ParseStats>
    where
        P: AsRef<Path>,
        C: RdbCallbacks + ?Sized,
    {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening snapshot {}", path.display()))?;
        debug!(path = %path.display(), "reading snapshot file");
        self.parse(file, callbacks, filter)
    }
}

impl<R: Read, C: RdbCallbacks + ?Sized> Session<'_, '_, R, C> {
    fn run(
        &mut self,
        config: &ReaderConfig,
    ) -> RdbResult<()> {
        let version = self.read_header(config)?;
        self.stats.version = Some(version);
        debug!(version, "snapshot header");
        self.callbacks.start_file(version)?;

        loop {
            let mut tag = self.src.read_u8("opcode")?;
            match tag {
                OPCODE_EXPIRETIME_MS => {
                    let ms = self.src.read_u64_le("expiration (ms)")?;
                    self.state.expiration = Some(ms);
                    tag = self.src.read_u8("value type")?;
                }
                OPCODE_EXPIRETIME => {
                    let secs = self.src.read_u32_le("expiration (s)")?;
                    self.state.expiration = Some(secs as u64 * 1000);
                    tag = self.src.read_u8("value type")?;
                }
                OPCODE_SELECTDB => {
                    if let Some(db) = self.state.database {
                        self.callbacks.end_database(db)?;
                    }
                    let db = read_length(&mut self.src)?;
                    self.state.database = Some(db);
                    self.stats.databases += 1;
                    debug!(database = db, "select database");
                    self.callbacks.start_database(db)?;
                    continue;
                }
                OPCODE_EOF => {
                    if let Some(db) = self.state.database {
                        self.callbacks.end_database(db)?;
                    }
                    self.callbacks.end_file()?;
                    break;
                }
                _ => {}
            }
            self.read_entry(tag)?;
        }

        self.stats.bytes_read = self.src.offset();
        debug!(
            bytes = self.stats.bytes_read,
            decoded = self.stats.keys_decoded,
            skipped = self.stats.keys_skipped,
            "snapshot parsed"
        );
        Ok(())
    }

    fn read_header(
        &mut self,
        config: &ReaderConfig,
    ) -> RdbResult<u32> {
        let mut signature = [0u8; 5];
        self.src.read_exact(&mut signature, "signature")?;
        ensure!(
            &signature == RDB_SIGNATURE,
            FormatError::SignatureMismatch { found: signature }
        );

        let mut digits = [0u8; RDB_VERSION_LEN];
        self.src.read_exact(&mut digits, "version")?;
        let version = parse_version(&digits).filter(|v| config.accepts_version(*v));
        version.ok_or_else(|| {
            FormatError::UnsupportedVersion {
                found: String::from_utf8_lossy(&digits).into_owned(),
                min: config.min_version,
                max: config.max_version,
            }
            .into()
        })
    }

    /// Ключ и значение после тега типа.
    fn read_entry(
        &mut self,
        tag: u8,
    ) -> RdbResult<()> {
        let offset = self.src.offset() - 1;
        let value_type =
            ValueType::try_from(tag).map_err(|_| FormatError::UnknownType { tag, offset })?;
        self.state.value_type = Some(value_type);

        let key = read_string(&mut self.src)?;
        self.state.key = Some(key.clone());

        let accepted = match self.filter.as_mut() {
            Some(filter) => filter.accept(&self.state)?,
            None => true,
        };
        trace!(database = ?self.state.database, %key, ?value_type, accepted, "key");

        if accepted {
            read_object(
                &mut self.src,
                value_type,
                &key,
                &mut self.state,
                &mut *self.callbacks,
            )?;
            self.stats.keys_decoded += 1;
            if let Some(epoch_ms) = self.state.expiration {
                self.callbacks.expire_at(&key, epoch_ms, &self.state)?;
                self.stats.expirations += 1;
            }
        } else {
            skip_object(
                &mut self.src,
                value_type,
                &key,
                &self.state,
                &mut *self.callbacks,
            )?;
            self.stats.keys_skipped += 1;
        }

        self.state.reset_key();
        Ok(())
    }
}

/// Четыре ASCII-цифры версии.
fn parse_version(digits: &[u8; RDB_VERSION_LEN]) -> Option<u32> {
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Разбирает снапшот с конфигурацией по умолчанию.
pub fn parse<R, C>(
    input: R,
    callbacks: &mut C,
    filter: Option<&mut dyn KeyFilter>,
) -> RdbResult<()>
where
    R: Read,
    C: RdbCallbacks + ?Sized,
{
    Reader::default().parse(input, callbacks, filter).map(|_| ())
}

/// Разбирает файл снапшота с конфигурацией по умолчанию.
pub fn parse_file<P, C>(
    path: P,
    callbacks: &mut C,
    filter: Option<&mut dyn KeyFilter>,
) -> RdbResult<()>
where
    P: AsRef<Path>,
    C: RdbCallbacks + ?Sized,
{
    Reader::default()
        .parse_file(path, callbacks, filter)
        .map(|_| ())
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rdb_error::{GenericError, StatusCode};

    use super::*;
    use crate::rdb::{
        callbacks::{EventRecorder, RdbEvent},
        value::RdbValue,
    };

    fn run(bytes: &[u8]) -> (RdbResult<ParseStats>, Vec<RdbEvent>) {
        let mut rec = EventRecorder::new();
        let res = Reader::default().parse(bytes, &mut rec, None);
        (res, rec.into_events())
    }

    /// Тест проверяет разбор версии из ASCII-цифр.
    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version(b"0003"), Some(3));
        assert_eq!(parse_version(b"0010"), Some(10));
        assert_eq!(parse_version(b"00a1"), None);
        assert_eq!(parse_version(b"+003"), None);
    }

    /// Тест проверяет минимальный снапшот без баз.
    #[test]
    fn test_empty_snapshot() {
        let (res, events) = run(b"REDIS0006\xFF");
        let stats = res.unwrap();
        assert_eq!(events, vec![RdbEvent::StartFile(6), RdbEvent::EndFile]);
        assert_eq!(stats.bytes_read, 10);
        assert_eq!(stats.version, Some(6));
    }

    /// Тест проверяет неверную сигнатуру.
    #[test]
    fn test_signature_mismatch() {
        let (res, events) = run(b"RADIS0003\xFF");
        assert_eq!(
            res.unwrap_err().format_error(),
            Some(&FormatError::SignatureMismatch { found: *b"RADIS" })
        );
        assert!(events.is_empty());
    }

    /// Тест проверяет границы допустимых версий и ранний диапазон.
    #[test]
    fn test_version_bounds() {
        assert!(run(b"REDIS0007\xFF").0.is_err());
        assert!(run(b"REDIS0000\xFF").0.is_err());
        assert!(run(b"REDISabcd\xFF").0.is_err());

        let legacy = Reader::new(ReaderConfig::legacy());
        let err = legacy
            .parse(&b"REDIS0005\xFF"[..], &mut EventRecorder::new(), None)
            .unwrap_err();
        assert_eq!(
            err.format_error(),
            Some(&FormatError::UnsupportedVersion {
                found: "0005".into(),
                min: 1,
                max: 4
            })
        );
        assert_eq!(err.status_code(), StatusCode::UnsupportedVersion);
    }

    /// Тест проверяет, что время истечения в секундах переводится в мс и
    /// сбрасывается после ключа.
    #[test]
    fn test_expire_seconds_cleared_after_key() {
        let mut bytes = b"REDIS0003\xFE\x00\xFD".to_vec();
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(b"\x00\x01a\x01x\x00\x01b\x01y\xFF");

        let (res, events) = run(&bytes);
        assert_eq!(res.unwrap().expirations, 1);
        let expires: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, RdbEvent::ExpireAt { .. }))
            .collect();
        assert_eq!(
            expires,
            vec![&RdbEvent::ExpireAt {
                key: RdbValue::from("a"),
                epoch_ms: 10_000
            }]
        );
    }

    /// Тест проверяет, что ошибка callback'а прерывает разбор и возвращается
    /// без изменений.
    #[test]
    fn test_callback_error_propagates() {
        struct Failing;
        impl RdbCallbacks for Failing {
            fn start_database(
                &mut self,
                _index: u64,
            ) -> RdbResult<()> {
                Err(GenericError::new(StatusCode::InvalidArgs, "stop here").into())
            }
        }

        let err = Reader::default()
            .parse(&b"REDIS0003\xFE\x00\xFF"[..], &mut Failing, None)
            .unwrap_err();
        assert!(err.format_error().is_none());
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
        assert_eq!(err.to_string(), "stop here");
    }

    /// Тест проверяет обрыв потока до маркера EOF.
    #[test]
    fn test_truncated_stream() {
        let (res, events) = run(b"REDIS0003\xFE\x00\x00\x01k");
        let err = res.unwrap_err();
        assert!(matches!(
            err.format_error(),
            Some(FormatError::UnexpectedEndOfStream { .. })
        ));
        assert_eq!(
            events,
            vec![RdbEvent::StartFile(3), RdbEvent::StartDatabase(0)]
        );
    }
}
