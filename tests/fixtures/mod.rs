//! Построитель снапшотов для интеграционных тестов.
//!
//! Снапшот собирается байт за байтом, без участия декодера, чтобы тесты
//! проверяли разбор независимо от него.

#![allow(dead_code)]

/// Элемент ziplist.
#[derive(Debug, Clone, Copy)]
pub enum ZipEntry<'a> {
    Str(&'a [u8]),
    Int(i64),
}

/// Последовательно собирает байты снапшота.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    buf: Vec<u8>,
}

impl SnapshotBuilder {
    /// Сигнатура и 4 ASCII-цифры версии.
    pub fn new(version: u32) -> Self {
        let mut buf = b"REDIS".to_vec();
        buf.extend_from_slice(format!("{version:04}").as_bytes());
        Self { buf }
    }

    pub fn select_db(
        mut self,
        db: u64,
    ) -> Self {
        self.buf.push(0xFE);
        self.buf.extend(encode_length(db));
        self
    }

    pub fn expire_ms(
        mut self,
        ms: u64,
    ) -> Self {
        self.buf.push(0xFC);
        self.buf.extend_from_slice(&ms.to_le_bytes());
        self
    }

    pub fn expire_secs(
        mut self,
        secs: u32,
    ) -> Self {
        self.buf.push(0xFD);
        self.buf.extend_from_slice(&secs.to_le_bytes());
        self
    }

    /// Строковый ключ со строковым значением.
    pub fn string(
        self,
        key: &[u8],
        value: &[u8],
    ) -> Self {
        self.entry(0, key, encode_string(value))
    }

    /// Строковый ключ с заранее закодированным значением (int/LZF).
    pub fn string_encoded(
        self,
        key: &[u8],
        encoded: Vec<u8>,
    ) -> Self {
        self.entry(0, key, encoded)
    }

    pub fn list(
        self,
        key: &[u8],
        items: &[&[u8]],
    ) -> Self {
        let mut body = encode_length(items.len() as u64);
        for item in items {
            body.extend(encode_string(item));
        }
        self.entry(1, key, body)
    }

    pub fn set(
        self,
        key: &[u8],
        members: &[&[u8]],
    ) -> Self {
        let mut body = encode_length(members.len() as u64);
        for member in members {
            body.extend(encode_string(member));
        }
        self.entry(2, key, body)
    }

    /// Каноническое sorted set: член, затем score.
    pub fn sorted_set(
        self,
        key: &[u8],
        items: &[(&[u8], f64)],
    ) -> Self {
        let mut body = encode_length(items.len() as u64);
        for (member, score) in items {
            body.extend(encode_string(member));
            body.extend(encode_score(*score));
        }
        self.entry(3, key, body)
    }

    pub fn hash(
        self,
        key: &[u8],
        pairs: &[(&[u8], &[u8])],
    ) -> Self {
        let mut body = encode_length(pairs.len() as u64);
        for (field, value) in pairs {
            body.extend(encode_string(field));
            body.extend(encode_string(value));
        }
        self.entry(4, key, body)
    }

    pub fn hash_zipmap(
        self,
        key: &[u8],
        pairs: &[(&[u8], &[u8])],
    ) -> Self {
        self.entry(9, key, encode_string(&zipmap(pairs)))
    }

    pub fn list_ziplist(
        self,
        key: &[u8],
        entries: &[ZipEntry<'_>],
    ) -> Self {
        self.entry(10, key, encode_string(&ziplist(entries)))
    }

    pub fn set_intset(
        self,
        key: &[u8],
        width: u32,
        values: &[i64],
    ) -> Self {
        self.entry(11, key, encode_string(&intset(width, values)))
    }

    pub fn sorted_set_ziplist(
        self,
        key: &[u8],
        entries: &[ZipEntry<'_>],
    ) -> Self {
        self.entry(12, key, encode_string(&ziplist(entries)))
    }

    pub fn hash_ziplist(
        self,
        key: &[u8],
        entries: &[ZipEntry<'_>],
    ) -> Self {
        self.entry(13, key, encode_string(&ziplist(entries)))
    }

    /// Произвольные байты как есть.
    pub fn raw(
        mut self,
        bytes: &[u8],
    ) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Завершает снапшот маркером EOF.
    pub fn eof(mut self) -> Vec<u8> {
        self.buf.push(0xFF);
        self.buf
    }

    /// Байты без маркера EOF.
    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    fn entry(
        mut self,
        tag: u8,
        key: &[u8],
        body: Vec<u8>,
    ) -> Self {
        self.buf.push(tag);
        self.buf.extend(encode_string(key));
        self.buf.extend(body);
        self
    }
}

////////////////////////////////////////////////////////////////////////////////
// Кодеры
////////////////////////////////////////////////////////////////////////////////

/// Кодирует длину самой короткой формой.
pub fn encode_length(n: u64) -> Vec<u8> {
    if n < 64 {
        vec![n as u8]
    } else if n < 16384 {
        vec![0x40 | (n >> 8) as u8, (n & 0xFF) as u8]
    } else {
        let mut out = vec![0x80];
        out.extend_from_slice(&(n as u32).to_be_bytes());
        out
    }
}

/// Строка с префиксом длины.
pub fn encode_string(s: &[u8]) -> Vec<u8> {
    let mut out = encode_length(s.len() as u64);
    out.extend_from_slice(s);
    out
}

/// Целое в специальном кодировании минимальной ширины.
pub fn encode_int(v: i64) -> Vec<u8> {
    if let Ok(v) = i8::try_from(v) {
        vec![0xC0, v as u8]
    } else if let Ok(v) = i16::try_from(v) {
        let mut out = vec![0xC1];
        out.extend_from_slice(&v.to_le_bytes());
        out
    } else {
        let mut out = vec![0xC2];
        out.extend_from_slice(&(v as i32).to_le_bytes());
        out
    }
}

/// LZF-строка из одних литералов.
pub fn encode_lzf(raw: &[u8]) -> Vec<u8> {
    let mut compressed = Vec::new();
    for chunk in raw.chunks(32) {
        compressed.push((chunk.len() - 1) as u8);
        compressed.extend_from_slice(chunk);
    }
    let mut out = vec![0xC3];
    out.extend(encode_length(compressed.len() as u64));
    out.extend(encode_length(raw.len() as u64));
    out.extend(compressed);
    out
}

/// Score канонического sorted set.
pub fn encode_score(score: f64) -> Vec<u8> {
    if score.is_nan() {
        vec![253]
    } else if score == f64::INFINITY {
        vec![254]
    } else if score == f64::NEG_INFINITY {
        vec![255]
    } else {
        let text = score.to_string();
        let mut out = vec![text.len() as u8];
        out.extend_from_slice(text.as_bytes());
        out
    }
}

pub fn ziplist(entries: &[ZipEntry<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut prev_len = 0usize;
    let mut tail = 10usize;
    for entry in entries {
        tail = 10 + body.len();
        let mut encoded = Vec::new();
        if prev_len < 254 {
            encoded.push(prev_len as u8);
        } else {
            encoded.push(254);
            encoded.extend_from_slice(&(prev_len as u32).to_le_bytes());
        }
        match entry {
            ZipEntry::Str(s) => {
                let len = s.len();
                if len < 64 {
                    encoded.push(len as u8);
                } else if len < 16384 {
                    encoded.push(0x40 | (len >> 8) as u8);
                    encoded.push((len & 0xFF) as u8);
                } else {
                    encoded.push(0x80);
                    encoded.extend_from_slice(&(len as u32).to_be_bytes());
                }
                encoded.extend_from_slice(s);
            }
            ZipEntry::Int(v) => {
                if let Ok(v) = i16::try_from(*v) {
                    encoded.push(0xC0);
                    encoded.extend_from_slice(&v.to_le_bytes());
                } else if let Ok(v) = i32::try_from(*v) {
                    encoded.push(0xD0);
                    encoded.extend_from_slice(&v.to_le_bytes());
                } else {
                    encoded.push(0xE0);
                    encoded.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
        prev_len = encoded.len();
        body.extend(encoded);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&((10 + body.len() + 1) as u32).to_le_bytes());
    out.extend_from_slice(&(tail as u32).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend(body);
    out.push(0xFF);
    out
}

pub fn zipmap(pairs: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut out = vec![pairs.len().min(254) as u8];
    for (field, value) in pairs {
        out.extend(zipmap_length(field.len()));
        out.extend_from_slice(field);
        out.extend(zipmap_length(value.len()));
        out.push(0);
        out.extend_from_slice(value);
    }
    out.push(0xFF);
    out
}

fn zipmap_length(len: usize) -> Vec<u8> {
    if len < 253 {
        vec![len as u8]
    } else {
        let mut out = vec![253];
        out.extend_from_slice(&(len as u32).to_le_bytes());
        out
    }
}

pub fn intset(
    width: u32,
    values: &[i64],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for v in values {
        match width {
            2 => out.extend_from_slice(&(*v as i16).to_le_bytes()),
            4 => out.extend_from_slice(&(*v as i32).to_le_bytes()),
            _ => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
    out
}
