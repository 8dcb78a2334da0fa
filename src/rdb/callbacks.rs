//! Контракт callback'ов декодера и стандартные реализации.
//!
//! Декодер ничего не знает о реализации: каждое структурное событие
//! снапшота превращается в вызов метода [`RdbCallbacks`]. Все методы по
//! умолчанию ничего не делают, поэтому реализация переопределяет только
//! интересные ей события.

use rdb_error::{bail, RdbResult, StatusCode};
use tracing::Level;

use super::{state::ReaderState, value::RdbValue};

/// Получатель событий декодера.
///
/// Ошибка, возвращённая любым методом, прерывает разбор и отдаётся
/// вызывающему без изменений.
pub trait RdbCallbacks {
    fn start_file(
        &mut self,
        _version: u32,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn end_file(&mut self) -> RdbResult<()> {
        Ok(())
    }

    fn start_database(
        &mut self,
        _index: u64,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn end_database(
        &mut self,
        _index: u64,
    ) -> RdbResult<()> {
        Ok(())
    }

    /// Время истечения ключа. Приходит после всех событий значения.
    fn expire_at(
        &mut self,
        _key: &RdbValue,
        _epoch_ms: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn set_scalar(
        &mut self,
        _key: &RdbValue,
        _value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn start_list(
        &mut self,
        _key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn add_list_item(
        &mut self,
        _key: &RdbValue,
        _value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn end_list(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn start_set(
        &mut self,
        _key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn add_set_item(
        &mut self,
        _key: &RdbValue,
        _member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn end_set(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn start_sorted_set(
        &mut self,
        _key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    /// Элемент sorted set. `score`: десятичный текст (или целое из
    /// ziplist), порядок элементов совпадает с файлом.
    fn add_sorted_set_item(
        &mut self,
        _key: &RdbValue,
        _score: &RdbValue,
        _member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn end_sorted_set(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn start_hash(
        &mut self,
        _key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn add_hash_item(
        &mut self,
        _key: &RdbValue,
        _field: &RdbValue,
        _value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    fn end_hash(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }

    /// Пропущенный элемент ключа, отклонённого фильтром.
    fn skip_object(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        Ok(())
    }
}

impl<C: RdbCallbacks + ?Sized> RdbCallbacks for &mut C {
    fn start_file(
        &mut self,
        version: u32,
    ) -> RdbResult<()> {
        (**self).start_file(version)
    }

    fn end_file(&mut self) -> RdbResult<()> {
        (**self).end_file()
    }

    fn start_database(
        &mut self,
        index: u64,
    ) -> RdbResult<()> {
        (**self).start_database(index)
    }

    fn end_database(
        &mut self,
        index: u64,
    ) -> RdbResult<()> {
        (**self).end_database(index)
    }

    fn expire_at(
        &mut self,
        key: &RdbValue,
        epoch_ms: u64,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).expire_at(key, epoch_ms, state)
    }

    fn set_scalar(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).set_scalar(key, value, state)
    }

    fn start_list(
        &mut self,
        key: &RdbValue,
        len: u64,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).start_list(key, len, state)
    }

    fn add_list_item(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).add_list_item(key, value, state)
    }

    fn end_list(
        &mut self,
        key: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).end_list(key, state)
    }

    fn start_set(
        &mut self,
        key: &RdbValue,
        len: u64,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).start_set(key, len, state)
    }

    fn add_set_item(
        &mut self,
        key: &RdbValue,
        member: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).add_set_item(key, member, state)
    }

    fn end_set(
        &mut self,
        key: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).end_set(key, state)
    }

    fn start_sorted_set(
        &mut self,
        key: &RdbValue,
        len: u64,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).start_sorted_set(key, len, state)
    }

    fn add_sorted_set_item(
        &mut self,
        key: &RdbValue,
        score: &RdbValue,
        member: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).add_sorted_set_item(key, score, member, state)
    }

    fn end_sorted_set(
        &mut self,
        key: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).end_sorted_set(key, state)
    }

    fn start_hash(
        &mut self,
        key: &RdbValue,
        len: u64,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).start_hash(key, len, state)
    }

    fn add_hash_item(
        &mut self,
        key: &RdbValue,
        field: &RdbValue,
        value: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).add_hash_item(key, field, value, state)
    }

    fn end_hash(
        &mut self,
        key: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).end_hash(key, state)
    }

    fn skip_object(
        &mut self,
        key: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        (**self).skip_object(key, state)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Диспетчеризация по виду контейнера
////////////////////////////////////////////////////////////////////////////////

/// Вид контейнера. Каждому виду на этапе компиляции сопоставлена тройка
/// callback'ов (начало, элемент, конец).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Set,
    SortedSet,
    Hash,
}

/// Элемент контейнера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Элемент списка или множества
    Single(RdbValue),
    /// `(member, score)` для sorted set, `(field, value)` для hash
    Pair(RdbValue, RdbValue),
}

impl ContainerKind {
    pub fn start<C: RdbCallbacks + ?Sized>(
        self,
        callbacks: &mut C,
        key: &RdbValue,
        len: u64,
        state: &ReaderState,
    ) -> RdbResult<()> {
        match self {
            Self::List => callbacks.start_list(key, len, state),
            Self::Set => callbacks.start_set(key, len, state),
            Self::SortedSet => callbacks.start_sorted_set(key, len, state),
            Self::Hash => callbacks.start_hash(key, len, state),
        }
    }

    pub fn add<C: RdbCallbacks + ?Sized>(
        self,
        callbacks: &mut C,
        key: &RdbValue,
        element: &Element,
        state: &ReaderState,
    ) -> RdbResult<()> {
        match (self, element) {
            (Self::List, Element::Single(value)) => callbacks.add_list_item(key, value, state),
            (Self::Set, Element::Single(member)) => callbacks.add_set_item(key, member, state),
            (Self::SortedSet, Element::Pair(member, score)) => {
                callbacks.add_sorted_set_item(key, score, member, state)
            }
            (Self::Hash, Element::Pair(field, value)) => {
                callbacks.add_hash_item(key, field, value, state)
            }
            (kind, element) => bail!(
                StatusCode::Internal,
                "element {:?} does not fit container {:?}",
                element,
                kind
            ),
        }
    }

    pub fn end<C: RdbCallbacks + ?Sized>(
        self,
        callbacks: &mut C,
        key: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        match self {
            Self::List => callbacks.end_list(key, state),
            Self::Set => callbacks.end_set(key, state),
            Self::SortedSet => callbacks.end_sorted_set(key, state),
            Self::Hash => callbacks.end_hash(key, state),
        }
    }

    /// Состоит ли элемент из двух строк.
    pub fn is_paired(self) -> bool {
        matches!(self, Self::SortedSet | Self::Hash)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Реализации
////////////////////////////////////////////////////////////////////////////////

/// Callback'и, игнорирующие все события.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl RdbCallbacks for NoopCallbacks {}

/// Логирует каждое событие через `tracing` на заданном уровне.
#[derive(Debug, Clone, Copy)]
pub struct TracingCallbacks {
    level: Level,
}

impl TracingCallbacks {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for TracingCallbacks {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

/// `tracing` требует уровень-константу, поэтому выбираем макрос по уровню.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+)
        } else if level == Level::WARN {
            tracing::warn!($($arg)+)
        } else if level == Level::INFO {
            tracing::info!($($arg)+)
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+)
        } else {
            tracing::trace!($($arg)+)
        }
    }};
}

impl RdbCallbacks for TracingCallbacks {
    fn start_file(
        &mut self,
        version: u32,
    ) -> RdbResult<()> {
        event_at!(self.level, version, "start of snapshot");
        Ok(())
    }

    fn end_file(&mut self) -> RdbResult<()> {
        event_at!(self.level, "end of snapshot");
        Ok(())
    }

    fn start_database(
        &mut self,
        index: u64,
    ) -> RdbResult<()> {
        event_at!(self.level, database = index, "open database");
        Ok(())
    }

    fn end_database(
        &mut self,
        index: u64,
    ) -> RdbResult<()> {
        event_at!(self.level, database = index, "close database");
        Ok(())
    }

    fn expire_at(
        &mut self,
        key: &RdbValue,
        epoch_ms: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, epoch_ms, "PEXPIREAT");
        Ok(())
    }

    fn set_scalar(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, %value, "SET");
        Ok(())
    }

    fn start_list(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, len, "start list");
        Ok(())
    }

    fn add_list_item(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, %value, "RPUSH");
        Ok(())
    }

    fn end_list(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, "end list");
        Ok(())
    }

    fn start_set(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, len, "start set");
        Ok(())
    }

    fn add_set_item(
        &mut self,
        key: &RdbValue,
        member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, %member, "SADD");
        Ok(())
    }

    fn end_set(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, "end set");
        Ok(())
    }

    fn start_sorted_set(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, len, "start sorted set");
        Ok(())
    }

    fn add_sorted_set_item(
        &mut self,
        key: &RdbValue,
        score: &RdbValue,
        member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, %score, %member, "ZADD");
        Ok(())
    }

    fn end_sorted_set(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, "end sorted set");
        Ok(())
    }

    fn start_hash(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, len, "start hash");
        Ok(())
    }

    fn add_hash_item(
        &mut self,
        key: &RdbValue,
        field: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, %field, %value, "HSET");
        Ok(())
    }

    fn end_hash(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, "end hash");
        Ok(())
    }

    fn skip_object(
        &mut self,
        key: &RdbValue,
        state: &ReaderState,
    ) -> RdbResult<()> {
        event_at!(self.level, %key, value_type = ?state.value_type, "skipped");
        Ok(())
    }
}

/// Событие декодера в собственной (owned) форме.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RdbEvent {
    StartFile(u32),
    EndFile,
    StartDatabase(u64),
    EndDatabase(u64),
    ExpireAt { key: RdbValue, epoch_ms: u64 },
    SetScalar { key: RdbValue, value: RdbValue },
    StartList { key: RdbValue, len: u64 },
    ListItem { key: RdbValue, value: RdbValue },
    EndList { key: RdbValue },
    StartSet { key: RdbValue, len: u64 },
    SetItem { key: RdbValue, member: RdbValue },
    EndSet { key: RdbValue },
    StartSortedSet { key: RdbValue, len: u64 },
    SortedSetItem { key: RdbValue, score: RdbValue, member: RdbValue },
    EndSortedSet { key: RdbValue },
    StartHash { key: RdbValue, len: u64 },
    HashItem { key: RdbValue, field: RdbValue, value: RdbValue },
    EndHash { key: RdbValue },
    Skip { key: RdbValue },
}

impl RdbEvent {
    /// Является ли событие элементом контейнера.
    pub fn is_element(&self) -> bool {
        matches!(
            self,
            Self::ListItem { .. }
                | Self::SetItem { .. }
                | Self::SortedSetItem { .. }
                | Self::HashItem { .. }
        )
    }
}

/// Сохраняет все события в порядке поступления.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Vec<RdbEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RdbEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RdbEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn push(
        &mut self,
        event: RdbEvent,
    ) -> RdbResult<()> {
        self.events.push(event);
        Ok(())
    }
}

impl RdbCallbacks for EventRecorder {
    fn start_file(
        &mut self,
        version: u32,
    ) -> RdbResult<()> {
        self.push(RdbEvent::StartFile(version))
    }

    fn end_file(&mut self) -> RdbResult<()> {
        self.push(RdbEvent::EndFile)
    }

    fn start_database(
        &mut self,
        index: u64,
    ) -> RdbResult<()> {
        self.push(RdbEvent::StartDatabase(index))
    }

    fn end_database(
        &mut self,
        index: u64,
    ) -> RdbResult<()> {
        self.push(RdbEvent::EndDatabase(index))
    }

    fn expire_at(
        &mut self,
        key: &RdbValue,
        epoch_ms: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::ExpireAt {
            key: key.clone(),
            epoch_ms,
        })
    }

    fn set_scalar(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::SetScalar {
            key: key.clone(),
            value: value.clone(),
        })
    }

    fn start_list(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::StartList {
            key: key.clone(),
            len,
        })
    }

    fn add_list_item(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::ListItem {
            key: key.clone(),
            value: value.clone(),
        })
    }

    fn end_list(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::EndList { key: key.clone() })
    }

    fn start_set(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::StartSet {
            key: key.clone(),
            len,
        })
    }

    fn add_set_item(
        &mut self,
        key: &RdbValue,
        member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::SetItem {
            key: key.clone(),
            member: member.clone(),
        })
    }

    fn end_set(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::EndSet { key: key.clone() })
    }

    fn start_sorted_set(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::StartSortedSet {
            key: key.clone(),
            len,
        })
    }

    fn add_sorted_set_item(
        &mut self,
        key: &RdbValue,
        score: &RdbValue,
        member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::SortedSetItem {
            key: key.clone(),
            score: score.clone(),
            member: member.clone(),
        })
    }

    fn end_sorted_set(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::EndSortedSet { key: key.clone() })
    }

    fn start_hash(
        &mut self,
        key: &RdbValue,
        len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::StartHash {
            key: key.clone(),
            len,
        })
    }

    fn add_hash_item(
        &mut self,
        key: &RdbValue,
        field: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::HashItem {
            key: key.clone(),
            field: field.clone(),
            value: value.clone(),
        })
    }

    fn end_hash(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::EndHash { key: key.clone() })
    }

    fn skip_object(
        &mut self,
        key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.push(RdbEvent::Skip { key: key.clone() })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
