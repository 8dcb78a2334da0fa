//! Декодер длин переменной ширины.
//!
//! Старшие 2 бита первого байта выбирают формат:
//! - `00`: длина в младших 6 битах (0..=63);
//! - `01`: 14 бит из младших 6 бит и следующего байта (64..=16383);
//! - `10`: следующие 4 байта, big-endian u32;
//! - `11`: специальное кодирование, младшие 6 бит задают селектор.

use std::io::Read;

use rdb_error::RdbResult;

use super::{
    source::ByteReader,
    tags::{LENGTH_14BIT, LENGTH_32BIT, LENGTH_6BIT},
};

/// Результат чтения поля длины.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Обычная длина
    Plain(u64),
    /// Маркер специального кодирования с селектором
    Special(u8),
}

impl Length {
    /// Числовое значение: длина либо селектор.
    pub fn value(self) -> u64 {
        match self {
            Self::Plain(len) => len,
            Self::Special(selector) => selector as u64,
        }
    }

    pub fn is_special(self) -> bool {
        matches!(self, Self::Special(_))
    }
}

/// Читает поле длины вместе с признаком специального кодирования.
///
/// Все четыре 2-битных шаблона допустимы, ошибка возможна только при обрыве
/// потока.
pub fn read_length_with_encoding<R: Read>(src: &mut ByteReader<R>) -> RdbResult<Length> {
    let first = src.read_u8("length")?;
    let low = (first & 0x3F) as u64;

    let length = match first >> 6 {
        LENGTH_6BIT => Length::Plain(low),
        LENGTH_14BIT => {
            let next = src.read_u8("14-bit length")? as u64;
            Length::Plain((low << 8) | next)
        }
        LENGTH_32BIT => Length::Plain(src.read_u32_be("32-bit length")? as u64),
        // LENGTH_ENCODED
        _ => Length::Special(first & 0x3F),
    };
    Ok(length)
}

/// Читает длину там, где специальное кодирование не ожидается
/// (кол-во элементов, индекс базы).
pub fn read_length<R: Read>(src: &mut ByteReader<R>) -> RdbResult<u64> {
    read_length_with_encoding(src).map(Length::value)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
