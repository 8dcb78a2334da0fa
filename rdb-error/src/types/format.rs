use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка формата снапшота.
///
/// Любая из этих ошибок фатальна для текущего разбора: после неё декодер не
/// генерирует больше ни одного события.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Первые 5 байт файла не совпадают с сигнатурой
    #[error("wrong signature: expected \"REDIS\", got {:?}", String::from_utf8_lossy(.found))]
    SignatureMismatch { found: [u8; 5] },

    /// Версия вне допустимого диапазона (или не является числом)
    #[error("unsupported snapshot version {found:?} (accepted: {min}..={max})")]
    UnsupportedVersion { found: String, min: u32, max: u32 },

    /// Неизвестный тег типа значения
    #[error("unknown value type tag {tag} at offset {offset}")]
    UnknownType { tag: u8, offset: u64 },

    /// Недопустимый селектор специального кодирования строки
    #[error("invalid special string encoding selector {selector}")]
    InvalidStringEncoding { selector: u8 },

    /// Недопустимый заголовок записи ziplist
    #[error("invalid ziplist entry header 0x{header:02X}")]
    InvalidEntryHeader { header: u8 },

    /// Нечётное число записей в ziplist с парами
    #[error("expected an even number of ziplist entries, found {count}")]
    OddEntryCount { count: u32 },

    /// Неверный байт-завершитель компактной структуры
    #[error("invalid ziplist terminator 0x{found:02X} (expected 0xFF)")]
    InvalidTerminator { found: u8 },

    /// Недопустимый маркер длины в zipmap
    #[error("invalid zipmap length marker {marker}")]
    InvalidZipmapLength { marker: u8 },

    /// Недопустимая ширина элемента intset
    #[error("invalid intset encoding width {width} (expected 2, 4 or 8)")]
    InvalidIntsetWidth { width: u32 },

    /// Длина распакованных данных не совпала с заявленной
    #[error("LZF decompression produced {actual} bytes, expected {expected}")]
    DecompressionLengthMismatch { expected: usize, actual: usize },

    /// Back-reference указывает до начала распакованных данных
    #[error("LZF back-reference distance {distance} exceeds output position {position}")]
    InvalidBackReference { position: usize, distance: usize },

    /// Поток закончился раньше маркера конца файла
    #[error("unexpected end of stream while reading {context} at offset {offset}")]
    UnexpectedEndOfStream { context: &'static str, offset: u64 },
}

impl FormatError {
    /// Смещение в потоке, если ошибка его знает.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::UnknownType { offset, .. } | Self::UnexpectedEndOfStream { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }
}

impl ErrorExt for FormatError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnexpectedEndOfStream { .. } => StatusCode::UnexpectedEof,
            Self::UnsupportedVersion { .. } => StatusCode::UnsupportedVersion,
            Self::DecompressionLengthMismatch { .. } | Self::InvalidBackReference { .. } => {
                StatusCode::CompressionFailed
            }
            _ => StatusCode::CorruptedData,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
