//! Распаковка строк, сжатых LZF.
//!
//! Поток состоит из управляющих байт. Значение `< 32` открывает литеральный
//! прогон из `ctrl + 1` байт. Иначе старшие 3 бита задают длину
//! back-reference (7 означает, что к ней добавляется следующий байт), а
//! младшие 5 бит вместе со следующим байтом задают расстояние назад от
//! текущей позиции вывода.

use rdb_error::{ensure, FormatError, RdbResult};

/// Верхняя граница предварительной аллокации под результат.
const MAX_PREALLOC: usize = 1 << 20;

/// Распаковывает `input`, ожидая ровно `expected_len` байт на выходе.
pub fn decompress(
    input: &[u8],
    expected_len: usize,
) -> RdbResult<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len.min(MAX_PREALLOC));
    let mut pos = 0usize;

    while let Some(&ctrl) = input.get(pos) {
        pos += 1;
        let ctrl = ctrl as usize;

        if ctrl < 32 {
            let end = pos + ctrl + 1;
            let literal = input.get(pos..end).ok_or(FormatError::UnexpectedEndOfStream {
                context: "LZF literal run",
                offset: pos as u64,
            })?;
            out.extend_from_slice(literal);
            pos = end;
            continue;
        }

        let mut len = ctrl >> 5;
        if len == 7 {
            len += next_byte(input, &mut pos, "LZF extended length")? as usize;
        }
        let low = next_byte(input, &mut pos, "LZF back-reference")? as usize;
        let distance = (((ctrl & 0x1F) << 8) | low) + 1;

        let mut reference =
            out.len()
                .checked_sub(distance)
                .ok_or(FormatError::InvalidBackReference {
                    position: out.len(),
                    distance,
                })?;

        // Диапазоны могут перекрываться, копируем побайтно.
        for _ in 0..len + 2 {
            let byte = out[reference];
            out.push(byte);
            reference += 1;
        }
    }

    ensure!(
        out.len() == expected_len,
        FormatError::DecompressionLengthMismatch {
            expected: expected_len,
            actual: out.len(),
        }
    );
    Ok(out)
}

fn next_byte(
    input: &[u8],
    pos: &mut usize,
    context: &'static str,
) -> RdbResult<u8> {
    let byte = *input.get(*pos).ok_or(FormatError::UnexpectedEndOfStream {
        context,
        offset: *pos as u64,
    })?;
    *pos += 1;
    Ok(byte)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
