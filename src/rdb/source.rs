//! Источник байт с подсчётом смещения.
//!
//! Все чтения декодера идут через [`ByteReader`]: он переводит
//! преждевременный конец потока в [`FormatError::UnexpectedEndOfStream`] с
//! указанием того, что именно читалось.

use std::io::{self, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use rdb_error::{FormatError, RdbResult, StackError};

/// Обёртка над `Read`, считающая прочитанные байты.
#[derive(Debug)]
pub struct ByteReader<R: Read> {
    inner: R,
    offset: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Кол-во байт, прочитанных (или пропущенных) с начала источника.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Читает ровно `buf.len()` байт.
    pub fn read_exact(
        &mut self,
        buf: &mut [u8],
        context: &'static str,
    ) -> RdbResult<()> {
        self.inner
            .read_exact(buf)
            .map_err(|e| self.io_error(e, context))?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    /// Читает `len` байт в новый буфер.
    ///
    /// Буфер растёт по мере чтения, поэтому повреждённая длина не приводит
    /// к гигантской аллокации до обнаружения конца потока.
    pub fn read_bytes(
        &mut self,
        len: u64,
        context: &'static str,
    ) -> RdbResult<Vec<u8>> {
        let mut buf = Vec::new();
        let result = self.inner.by_ref().take(len).read_to_end(&mut buf);
        let got = result.map_err(|e| self.io_error(e, context))?;
        self.offset += got as u64;
        if (got as u64) < len {
            return Err(self.eof(context));
        }
        Ok(buf)
    }

    /// Пропускает `len` байт без сохранения.
    pub fn skip(
        &mut self,
        len: u64,
        context: &'static str,
    ) -> RdbResult<()> {
        let result = io::copy(&mut self.inner.by_ref().take(len), &mut io::sink());
        let skipped = result.map_err(|e| self.io_error(e, context))?;
        self.offset += skipped;
        if skipped < len {
            return Err(self.eof(context));
        }
        Ok(())
    }

    pub fn read_u8(
        &mut self,
        context: &'static str,
    ) -> RdbResult<u8> {
        let v = self.inner.read_u8().map_err(|e| self.io_error(e, context))?;
        self.offset += 1;
        Ok(v)
    }

    pub fn read_i8(
        &mut self,
        context: &'static str,
    ) -> RdbResult<i8> {
        let v = self.inner.read_i8().map_err(|e| self.io_error(e, context))?;
        self.offset += 1;
        Ok(v)
    }

    pub fn read_u16_le(
        &mut self,
        context: &'static str,
    ) -> RdbResult<u16> {
        let v = self
            .inner
            .read_u16::<LittleEndian>()
            .map_err(|e| self.io_error(e, context))?;
        self.offset += 2;
        Ok(v)
    }

    pub fn read_i16_le(
        &mut self,
        context: &'static str,
    ) -> RdbResult<i16> {
        let v = self
            .inner
            .read_i16::<LittleEndian>()
            .map_err(|e| self.io_error(e, context))?;
        self.offset += 2;
        Ok(v)
    }

    pub fn read_u32_le(
        &mut self,
        context: &'static str,
    ) -> RdbResult<u32> {
        let v = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| self.io_error(e, context))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_u32_be(
        &mut self,
        context: &'static str,
    ) -> RdbResult<u32> {
        let v = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(|e| self.io_error(e, context))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_i32_le(
        &mut self,
        context: &'static str,
    ) -> RdbResult<i32> {
        let v = self
            .inner
            .read_i32::<LittleEndian>()
            .map_err(|e| self.io_error(e, context))?;
        self.offset += 4;
        Ok(v)
    }

    pub fn read_u64_le(
        &mut self,
        context: &'static str,
    ) -> RdbResult<u64> {
        let v = self
            .inner
            .read_u64::<LittleEndian>()
            .map_err(|e| self.io_error(e, context))?;
        self.offset += 8;
        Ok(v)
    }

    pub fn read_i64_le(
        &mut self,
        context: &'static str,
    ) -> RdbResult<i64> {
        let v = self
            .inner
            .read_i64::<LittleEndian>()
            .map_err(|e| self.io_error(e, context))?;
        self.offset += 8;
        Ok(v)
    }

    fn eof(
        &self,
        context: &'static str,
    ) -> StackError {
        FormatError::UnexpectedEndOfStream {
            context,
            offset: self.offset,
        }
        .into()
    }

    fn io_error(
        &self,
        err: io::Error,
        context: &'static str,
    ) -> StackError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            self.eof(context)
        } else {
            StackError::from(err)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
