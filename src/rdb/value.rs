use std::{borrow::Cow, fmt};

/// Скалярное значение снапшота: ключ, строка или элемент коллекции.
///
/// Строки, закодированные в снапшоте как целые числа, остаются числами;
/// текстовая форма доступна через [`RdbValue::to_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RdbValue {
    Bytes(Vec<u8>),
    Int(i64),
}

impl RdbValue {
    /// Байтовое представление: сами байты либо десятичная запись числа.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Bytes(b) => Cow::Borrowed(b.as_slice()),
            Self::Int(n) => Cow::Owned(n.to_string().into_bytes()),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(b) => b,
            Self::Int(n) => n.to_string().into_bytes(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bytes(_) => None,
        }
    }

    /// Строка в UTF-8 (с заменой некорректных последовательностей).
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            Self::Bytes(b) => String::from_utf8_lossy(b),
            Self::Int(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl fmt::Display for RdbValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for RdbValue {
    fn from(s: &str) -> Self {
        Self::Bytes(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for RdbValue {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for RdbValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<i64> for RdbValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}
