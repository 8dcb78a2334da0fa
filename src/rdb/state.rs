//! Состояние декодера, доступное фильтру и callback'ам.

use super::{
    tags::{LogicalType, ValueType},
    value::RdbValue,
};

/// Кодирование текущего значения.
///
/// Заполняется декодером объекта до первого события ключа и сбрасывается
/// после ключа.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectEncoding {
    String,
    LinkedList,
    HashTable,
    SkipList,
    /// `encoded_size`: длина буфера компактного кодирования в байтах
    Zipmap { encoded_size: usize },
    Ziplist { encoded_size: usize },
    Intset { encoded_size: usize },
}

/// Изменяемый контекст одного разбора.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderState {
    /// Индекс открытой базы
    pub database: Option<u64>,
    /// Текущий ключ
    pub key: Option<RdbValue>,
    /// Тег типа текущего значения
    pub value_type: Option<ValueType>,
    /// Ожидающее время истечения (epoch-ms)
    pub expiration: Option<u64>,
    /// Кодирование текущего значения
    pub info: Option<ObjectEncoding>,
}

impl ReaderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Есть ли у текущего ключа время истечения.
    pub fn key_expires(&self) -> bool {
        self.expiration.is_some()
    }

    /// Логический тип текущего значения.
    pub fn logical_type(&self) -> Option<LogicalType> {
        self.value_type.map(ValueType::logical)
    }

    /// Сбрасывает всё, что относится к текущему ключу. База остаётся.
    pub fn reset_key(&mut self) {
        self.key = None;
        self.value_type = None;
        self.expiration = None;
        self.info = None;
    }
}
