//! Определение опкодов, тегов типов и маркеров кодирования формата RDB.
//!
//! Каждая запись снапшота начинается с однобайтового тега: либо опкода,
//! меняющего ход разбора, либо тега типа значения.

use std::{fmt, str::FromStr};

use num_enum::TryFromPrimitive;
use serde::Deserialize;

/// Сигнатура в начале каждого снапшота.
pub const RDB_SIGNATURE: &[u8; 5] = b"REDIS";
/// Длина ASCII-версии после сигнатуры.
pub const RDB_VERSION_LEN: usize = 4;

/// Время истечения в миллисекундах (u64 LE)
pub const OPCODE_EXPIRETIME_MS: u8 = 0xFC;
/// Время истечения в секундах (u32 LE)
pub const OPCODE_EXPIRETIME: u8 = 0xFD;
/// Выбор базы данных
pub const OPCODE_SELECTDB: u8 = 0xFE;
/// Конец файла
pub const OPCODE_EOF: u8 = 0xFF;

/// Старшие 2 бита байта длины: 6-битная длина
pub const LENGTH_6BIT: u8 = 0;
/// 14-битная длина
pub const LENGTH_14BIT: u8 = 1;
/// 32-битная длина (big-endian)
pub const LENGTH_32BIT: u8 = 2;
/// Специальное кодирование
pub const LENGTH_ENCODED: u8 = 3;

/// Строка хранится как i8
pub const ENCODING_INT8: u8 = 0;
/// Строка хранится как i16 LE
pub const ENCODING_INT16: u8 = 1;
/// Строка хранится как i32 LE
pub const ENCODING_INT32: u8 = 2;
/// Строка сжата LZF
pub const ENCODING_LZF: u8 = 3;

/// Завершитель ziplist
pub const ZIPLIST_END: u8 = 0xFF;
/// Маркер 5-байтовой длины предыдущей записи ziplist
pub const ZIPLIST_BIG_PREVLEN: u8 = 0xFE;

/// Маркер 4-байтовой длины в zipmap
pub const ZIPMAP_BIGLEN: u8 = 253;
/// Недопустимый маркер длины в zipmap
pub const ZIPMAP_INVALID: u8 = 254;
/// Завершитель zipmap
pub const ZIPMAP_END: u8 = 255;

/// Тег типа значения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum ValueType {
    String = 0,
    List = 1,
    Set = 2,
    SortedSet = 3,
    Hash = 4,
    HashZipmap = 9,
    ListZiplist = 10,
    SetIntset = 11,
    SortedSetZiplist = 12,
    HashZiplist = 13,
}

/// Логический тип значения: общий для канонического и компактного
/// кодирования.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    String,
    List,
    Set,
    #[serde(alias = "zset")]
    SortedSet,
    Hash,
}

impl ValueType {
    /// Логический тип, к которому относится тег.
    pub fn logical(self) -> LogicalType {
        match self {
            Self::String => LogicalType::String,
            Self::List | Self::ListZiplist => LogicalType::List,
            Self::Set | Self::SetIntset => LogicalType::Set,
            Self::SortedSet | Self::SortedSetZiplist => LogicalType::SortedSet,
            Self::Hash | Self::HashZipmap | Self::HashZiplist => LogicalType::Hash,
        }
    }

    /// Закодировано ли значение одной компактной строкой.
    pub fn is_compact(self) -> bool {
        matches!(
            self,
            Self::HashZipmap
                | Self::ListZiplist
                | Self::SetIntset
                | Self::SortedSetZiplist
                | Self::HashZiplist
        )
    }
}

impl fmt::Display for LogicalType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::List => "list",
            Self::Set => "set",
            Self::SortedSet => "sortedset",
            Self::Hash => "hash",
        };
        f.write_str(name)
    }
}

impl FromStr for LogicalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "list" => Ok(Self::List),
            "set" => Ok(Self::Set),
            "sortedset" | "zset" => Ok(Self::SortedSet),
            "hash" => Ok(Self::Hash),
            other => Err(format!(
                "unknown value type {other:?} (expected string, list, set, sortedset or hash)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что все известные теги распознаются, а опкоды и
    /// пропуски в нумерации: нет.
    #[test]
    fn test_value_type_from_tag() {
        assert_eq!(ValueType::try_from(0u8).unwrap(), ValueType::String);
        assert_eq!(ValueType::try_from(13u8).unwrap(), ValueType::HashZiplist);
        for tag in [5u8, 6, 7, 8, 14, OPCODE_EOF, OPCODE_SELECTDB] {
            assert!(ValueType::try_from(tag).is_err(), "tag {tag}");
        }
    }

    /// Тест проверяет, что компактные варианты отображаются на тот же
    /// логический тип, что и канонические.
    #[test]
    fn test_logical_types() {
        assert_eq!(ValueType::SetIntset.logical(), LogicalType::Set);
        assert_eq!(ValueType::HashZipmap.logical(), LogicalType::Hash);
        assert_eq!(ValueType::SortedSetZiplist.logical(), LogicalType::SortedSet);
        assert!(ValueType::ListZiplist.is_compact());
        assert!(!ValueType::List.is_compact());
    }

    /// Тест проверяет разбор имени типа и совпадение с `Display`.
    #[test]
    fn test_logical_type_from_str() {
        assert_eq!("ZSET".parse::<LogicalType>().unwrap(), LogicalType::SortedSet);
        for t in [
            LogicalType::String,
            LogicalType::List,
            LogicalType::Set,
            LogicalType::SortedSet,
            LogicalType::Hash,
        ] {
            assert_eq!(t.to_string().parse::<LogicalType>().unwrap(), t);
        }
        assert!("stream".parse::<LogicalType>().is_err());
    }
}
