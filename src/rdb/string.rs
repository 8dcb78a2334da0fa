//! Декодер строк.
//!
//! Строка: это поле длины и сырые байты, либо специальное кодирование:
//! целое число фиксированной ширины или LZF-сжатый блок.

use std::io::Read;

use rdb_error::{bail, FormatError, RdbResult};

use super::{
    length::{read_length, read_length_with_encoding, Length},
    lzf,
    source::ByteReader,
    tags::{ENCODING_INT16, ENCODING_INT32, ENCODING_INT8, ENCODING_LZF},
    value::RdbValue,
};

/// Маркер длины score для `nan`.
const SCORE_NAN: u8 = 253;
/// Маркер длины score для `+inf`.
const SCORE_POS_INF: u8 = 254;
/// Маркер длины score для `-inf`.
const SCORE_NEG_INF: u8 = 255;

/// Читает строку (ключ, скаляр или элемент коллекции).
pub fn read_string<R: Read>(src: &mut ByteReader<R>) -> RdbResult<RdbValue> {
    match read_length_with_encoding(src)? {
        Length::Plain(len) => Ok(RdbValue::Bytes(src.read_bytes(len, "string payload")?)),
        Length::Special(ENCODING_INT8) => Ok(RdbValue::Int(src.read_i8("int8 string")? as i64)),
        Length::Special(ENCODING_INT16) => {
            Ok(RdbValue::Int(src.read_i16_le("int16 string")? as i64))
        }
        Length::Special(ENCODING_INT32) => {
            Ok(RdbValue::Int(src.read_i32_le("int32 string")? as i64))
        }
        Length::Special(ENCODING_LZF) => read_lzf_string(src).map(RdbValue::Bytes),
        Length::Special(selector) => bail!(FormatError::InvalidStringEncoding { selector }),
    }
}

/// Читает строку как байты (для буферов компактных кодировок).
pub fn read_string_bytes<R: Read>(src: &mut ByteReader<R>) -> RdbResult<Vec<u8>> {
    read_string(src).map(RdbValue::into_bytes)
}

/// Пропускает строку, не распаковывая её.
pub fn skip_string<R: Read>(src: &mut ByteReader<R>) -> RdbResult<()> {
    let bytes = match read_length_with_encoding(src)? {
        Length::Plain(len) => len,
        Length::Special(ENCODING_INT8) => 1,
        Length::Special(ENCODING_INT16) => 2,
        Length::Special(ENCODING_INT32) => 4,
        Length::Special(ENCODING_LZF) => {
            let compressed = read_length(src)?;
            let _uncompressed = read_length(src)?;
            compressed
        }
        Length::Special(selector) => bail!(FormatError::InvalidStringEncoding { selector }),
    };
    src.skip(bytes, "skipped string")
}

fn read_lzf_string<R: Read>(src: &mut ByteReader<R>) -> RdbResult<Vec<u8>> {
    let compressed_len = read_length(src)?;
    let uncompressed_len = read_length(src)?;
    let compressed = src.read_bytes(compressed_len, "LZF payload")?;
    lzf::decompress(&compressed, uncompressed_len as usize)
}

/// Читает score канонического sorted set: 1 байт длины и ASCII-текст.
pub fn read_score<R: Read>(src: &mut ByteReader<R>) -> RdbResult<RdbValue> {
    let text: &[u8] = match src.read_u8("score length")? {
        SCORE_NAN => b"nan",
        SCORE_POS_INF => b"inf",
        SCORE_NEG_INF => b"-inf",
        len => return Ok(RdbValue::Bytes(src.read_bytes(len as u64, "score")?)),
    };
    Ok(RdbValue::Bytes(text.to_vec()))
}

pub fn skip_score<R: Read>(src: &mut ByteReader<R>) -> RdbResult<()> {
    match src.read_u8("score length")? {
        SCORE_NAN | SCORE_POS_INF | SCORE_NEG_INF => Ok(()),
        len => src.skip(len as u64, "skipped score"),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
