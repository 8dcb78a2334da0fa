//! Декодер zipmap: компактного отображения поле → значение.
//!
//! Формат буфера:
//! ```text
//! <count hint: u8> (<len> <field> <len> <free: u8> <value> <padding>)* <0xFF>
//! ```
//! Байт длины `0..=252` задаёт длину сам, за `253` следует u32 LE, `254`
//! недопустим, `255` завершает отображение.

use rdb_error::{bail, FormatError, RdbResult};

use super::{
    source::ByteReader,
    tags::{ZIPMAP_BIGLEN, ZIPMAP_END, ZIPMAP_INVALID},
    value::RdbValue,
};

/// Разобранный zipmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zipmap {
    /// Кол-во пар из заголовка. Не авторитетно: конец задаёт `0xFF`.
    pub count_hint: u8,
    pub entries: Vec<(RdbValue, RdbValue)>,
}

/// Разбирает zipmap целиком.
///
/// Пары собираются до генерации событий, чтобы событие начала hash несло
/// точное кол-во элементов.
pub fn read_zipmap(buf: &[u8]) -> RdbResult<Zipmap> {
    let mut src = ByteReader::new(buf);
    let count_hint = src.read_u8("zipmap count")?;
    let mut entries = Vec::new();

    loop {
        let Some(field_len) = next_length(&mut src)? else {
            break;
        };
        let field = src.read_bytes(field_len, "zipmap field")?;

        let Some(value_len) = next_length(&mut src)? else {
            break;
        };
        let free = src.read_u8("zipmap free")?;
        let value = src.read_bytes(value_len, "zipmap value")?;
        src.skip(free as u64, "zipmap padding")?;

        entries.push((RdbValue::Bytes(field), RdbValue::Bytes(value)));
    }

    Ok(Zipmap {
        count_hint,
        entries,
    })
}

/// Читает поле длины; `None` означает конец отображения.
fn next_length(src: &mut ByteReader<&[u8]>) -> RdbResult<Option<u64>> {
    match src.read_u8("zipmap length")? {
        ZIPMAP_END => Ok(None),
        ZIPMAP_INVALID => bail!(FormatError::InvalidZipmapLength {
            marker: ZIPMAP_INVALID
        }),
        ZIPMAP_BIGLEN => Ok(Some(src.read_u32_le("zipmap length")? as u64)),
        len => Ok(Some(len as u64)),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
