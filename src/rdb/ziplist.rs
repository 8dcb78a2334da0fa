//! Декодер ziplist: компактного списка записей переменной длины.
//!
//! Формат буфера:
//! ```text
//! <zlbytes: u32 LE> <zltail: u32 LE> <zllen: u16 LE> <entry>... <0xFF>
//! ```
//! Запись: длина предыдущей записи (1 байт или `0xFE` + u32 LE), заголовок и
//! полезная нагрузка. Заголовки `00`/`01`/`10` в старших битах задают сырые
//! байты с 6/14/32-битной длиной, `0xC?`/`0xD?`/`0xE?`: целые i16/i32/i64
//! little-endian.

use rdb_error::{bail, ensure, FormatError, RdbResult};

use super::{
    source::ByteReader,
    tags::{ZIPLIST_BIG_PREVLEN, ZIPLIST_END},
    value::RdbValue,
};

/// Последовательное чтение записей ziplist.
///
/// `zllen` служит только границей цикла: произвольный доступ по `zltail`
/// не нужен.
#[derive(Debug)]
pub struct ZiplistReader<'a> {
    src: ByteReader<&'a [u8]>,
    total_bytes: u32,
    tail_offset: u32,
    len: u16,
}

impl<'a> ZiplistReader<'a> {
    /// Читает заголовок ziplist из буфера.
    pub fn new(buf: &'a [u8]) -> RdbResult<Self> {
        let mut src = ByteReader::new(buf);
        let total_bytes = src.read_u32_le("ziplist zlbytes")?;
        let tail_offset = src.read_u32_le("ziplist zltail")?;
        let len = src.read_u16_le("ziplist zllen")?;
        Ok(Self {
            src,
            total_bytes,
            tail_offset,
            len,
        })
    }

    /// Кол-во записей по заголовку.
    pub fn len(&self) -> u16 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_bytes(&self) -> u32 {
        self.total_bytes
    }

    pub fn tail_offset(&self) -> u32 {
        self.tail_offset
    }

    /// Кол-во пар для ziplist, где элемент занимает две записи.
    pub fn pair_count(&self) -> RdbResult<u32> {
        let count = self.len as u32;
        ensure!(count % 2 == 0, FormatError::OddEntryCount { count });
        Ok(count / 2)
    }

    /// Читает следующую запись.
    pub fn next_entry(&mut self) -> RdbResult<RdbValue> {
        let prev = self.src.read_u8("ziplist previous length")?;
        if prev == ZIPLIST_BIG_PREVLEN {
            self.src.read_u32_le("ziplist previous length")?;
        }

        let header = self.src.read_u8("ziplist entry header")?;
        let raw_len = match header >> 6 {
            0 => (header & 0x3F) as u64,
            1 => {
                let next = self.src.read_u8("ziplist entry length")? as u64;
                (((header & 0x3F) as u64) << 8) | next
            }
            2 => self.src.read_u32_be("ziplist entry length")? as u64,
            _ => return self.read_int_entry(header),
        };
        Ok(RdbValue::Bytes(
            self.src.read_bytes(raw_len, "ziplist entry")?,
        ))
    }

    fn read_int_entry(
        &mut self,
        header: u8,
    ) -> RdbResult<RdbValue> {
        let value = match header >> 4 {
            0xC => self.src.read_i16_le("ziplist int16 entry")? as i64,
            0xD => self.src.read_i32_le("ziplist int32 entry")? as i64,
            0xE => self.src.read_i64_le("ziplist int64 entry")?,
            _ => bail!(FormatError::InvalidEntryHeader { header }),
        };
        Ok(RdbValue::Int(value))
    }

    /// Проверяет завершающий байт после последней записи.
    pub fn finish(mut self) -> RdbResult<()> {
        let found = self.src.read_u8("ziplist terminator")?;
        ensure!(found == ZIPLIST_END, FormatError::InvalidTerminator { found });
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
