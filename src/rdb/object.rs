//! Декодер значения ключа.
//!
//! По тегу типа выбирается каноническое (длина + элементы) или компактное
//! кодирование. Оба пути генерируют одинаковую последовательность событий
//! `start / add* / end`, так что получатель не видит разницы.

use std::io::Read;

use rdb_error::RdbResult;
use tracing::trace;

use super::{
    callbacks::{ContainerKind, Element, RdbCallbacks},
    intset::IntsetReader,
    length::read_length,
    source::ByteReader,
    state::{ObjectEncoding, ReaderState},
    string::{read_score, read_string, read_string_bytes, skip_score, skip_string},
    tags::ValueType,
    value::RdbValue,
    ziplist::ZiplistReader,
    zipmap::read_zipmap,
};

/// Декодирует значение и генерирует его события.
pub fn read_object<R, C>(
    src: &mut ByteReader<R>,
    value_type: ValueType,
    key: &RdbValue,
    state: &mut ReaderState,
    callbacks: &mut C,
) -> RdbResult<()>
where
    R: Read,
    C: RdbCallbacks + ?Sized,
{
    match value_type {
        ValueType::String => {
            state.info = Some(ObjectEncoding::String);
            let value = read_string(src)?;
            callbacks.set_scalar(key, &value, state)
        }
        ValueType::List => {
            state.info = Some(ObjectEncoding::LinkedList);
            read_container(src, ContainerKind::List, key, state, callbacks)
        }
        ValueType::Set => {
            state.info = Some(ObjectEncoding::HashTable);
            read_container(src, ContainerKind::Set, key, state, callbacks)
        }
        ValueType::SortedSet => {
            state.info = Some(ObjectEncoding::SkipList);
            read_container(src, ContainerKind::SortedSet, key, state, callbacks)
        }
        ValueType::Hash => {
            state.info = Some(ObjectEncoding::HashTable);
            read_container(src, ContainerKind::Hash, key, state, callbacks)
        }
        ValueType::ListZiplist => {
            read_ziplist(src, ContainerKind::List, key, state, callbacks)
        }
        ValueType::SortedSetZiplist => {
            read_ziplist(src, ContainerKind::SortedSet, key, state, callbacks)
        }
        ValueType::HashZiplist => {
            read_ziplist(src, ContainerKind::Hash, key, state, callbacks)
        }
        ValueType::SetIntset => read_intset(src, key, state, callbacks),
        ValueType::HashZipmap => read_zipmap_hash(src, key, state, callbacks),
    }
}

/// Потребляет значение без материализации, генерируя `skip_object`.
///
/// Канонический контейнер даёт одно событие на элемент, скаляр и любое
/// компактное кодирование: одно событие.
pub fn skip_object<R, C>(
    src: &mut ByteReader<R>,
    value_type: ValueType,
    key: &RdbValue,
    state: &ReaderState,
    callbacks: &mut C,
) -> RdbResult<()>
where
    R: Read,
    C: RdbCallbacks + ?Sized,
{
    let kind = match value_type {
        ValueType::List => ContainerKind::List,
        ValueType::Set => ContainerKind::Set,
        ValueType::SortedSet => ContainerKind::SortedSet,
        ValueType::Hash => ContainerKind::Hash,
        _ => {
            skip_string(src)?;
            return callbacks.skip_object(key, state);
        }
    };

    let len = read_length(src)?;
    for _ in 0..len {
        match kind {
            ContainerKind::List | ContainerKind::Set => skip_string(src)?,
            ContainerKind::SortedSet => {
                skip_string(src)?;
                skip_score(src)?;
            }
            ContainerKind::Hash => {
                skip_string(src)?;
                skip_string(src)?;
            }
        }
        callbacks.skip_object(key, state)?;
    }
    Ok(())
}

fn read_container<R, C>(
    src: &mut ByteReader<R>,
    kind: ContainerKind,
    key: &RdbValue,
    state: &ReaderState,
    callbacks: &mut C,
) -> RdbResult<()>
where
    R: Read,
    C: RdbCallbacks + ?Sized,
{
    let len = read_length(src)?;
    kind.start(callbacks, key, len, state)?;
    for _ in 0..len {
        let element = match kind {
            ContainerKind::List | ContainerKind::Set => Element::Single(read_string(src)?),
            ContainerKind::SortedSet => {
                let member = read_string(src)?;
                Element::Pair(member, read_score(src)?)
            }
            ContainerKind::Hash => {
                let field = read_string(src)?;
                Element::Pair(field, read_string(src)?)
            }
        };
        kind.add(callbacks, key, &element, state)?;
    }
    kind.end(callbacks, key, state)
}

fn read_ziplist<R, C>(
    src: &mut ByteReader<R>,
    kind: ContainerKind,
    key: &RdbValue,
    state: &mut ReaderState,
    callbacks: &mut C,
) -> RdbResult<()>
where
    R: Read,
    C: RdbCallbacks + ?Sized,
{
    let buf = read_string_bytes(src)?;
    state.info = Some(ObjectEncoding::Ziplist {
        encoded_size: buf.len(),
    });

    let mut ziplist = ZiplistReader::new(&buf)?;
    let len = if kind.is_paired() {
        ziplist.pair_count()?
    } else {
        ziplist.len() as u32
    };
    trace!(%key, entries = ziplist.len(), zlbytes = ziplist.total_bytes(), "ziplist");

    kind.start(callbacks, key, len as u64, state)?;
    for _ in 0..len {
        let first = ziplist.next_entry()?;
        let element = if kind.is_paired() {
            Element::Pair(first, ziplist.next_entry()?)
        } else {
            Element::Single(first)
        };
        kind.add(callbacks, key, &element, state)?;
    }
    ziplist.finish()?;
    kind.end(callbacks, key, state)
}

fn read_intset<R, C>(
    src: &mut ByteReader<R>,
    key: &RdbValue,
    state: &mut ReaderState,
    callbacks: &mut C,
) -> RdbResult<()>
where
    R: Read,
    C: RdbCallbacks + ?Sized,
{
    let buf = read_string_bytes(src)?;
    state.info = Some(ObjectEncoding::Intset {
        encoded_size: buf.len(),
    });

    let mut intset = IntsetReader::new(&buf)?;
    let kind = ContainerKind::Set;
    kind.start(callbacks, key, intset.len() as u64, state)?;
    for _ in 0..intset.len() {
        let element = Element::Single(RdbValue::Int(intset.next_int()?));
        kind.add(callbacks, key, &element, state)?;
    }
    kind.end(callbacks, key, state)
}

fn read_zipmap_hash<R, C>(
    src: &mut ByteReader<R>,
    key: &RdbValue,
    state: &mut ReaderState,
    callbacks: &mut C,
) -> RdbResult<()>
where
    R: Read,
    C: RdbCallbacks + ?Sized,
{
    let buf = read_string_bytes(src)?;
    state.info = Some(ObjectEncoding::Zipmap {
        encoded_size: buf.len(),
    });

    let zipmap = read_zipmap(&buf)?;
    trace!(%key, hint = zipmap.count_hint, entries = zipmap.entries.len(), "zipmap");

    let kind = ContainerKind::Hash;
    kind.start(callbacks, key, zipmap.entries.len() as u64, state)?;
    for (field, value) in zipmap.entries {
        kind.add(callbacks, key, &Element::Pair(field, value), state)?;
    }
    kind.end(callbacks, key, state)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
