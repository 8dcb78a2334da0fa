//! Декодер intset: отсортированного набора целых чисел фиксированной ширины.
//!
//! Заголовок: ширина элемента (u32 LE, 2/4/8) и кол-во элементов (u32 LE),
//! за ними элементы как знаковые little-endian числа.

use rdb_error::{ensure, FormatError, RdbResult};

use super::source::ByteReader;

/// Последовательное чтение элементов intset.
#[derive(Debug)]
pub struct IntsetReader<'a> {
    src: ByteReader<&'a [u8]>,
    width: u32,
    len: u32,
}

impl<'a> IntsetReader<'a> {
    /// Читает и проверяет заголовок.
    pub fn new(buf: &'a [u8]) -> RdbResult<Self> {
        let mut src = ByteReader::new(buf);
        let width = src.read_u32_le("intset encoding")?;
        ensure!(
            matches!(width, 2 | 4 | 8),
            FormatError::InvalidIntsetWidth { width }
        );
        let len = src.read_u32_le("intset length")?;
        Ok(Self { src, width, len })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Читает следующий элемент.
    pub fn next_int(&mut self) -> RdbResult<i64> {
        let value = match self.width {
            2 => self.src.read_i16_le("intset entry")? as i64,
            4 => self.src.read_i32_le("intset entry")? as i64,
            _ => self.src.read_i64_le("intset entry")?,
        };
        Ok(value)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
