//! Фильтрация ключей.
//!
//! Фильтр вызывается один раз на ключ верхнего уровня, после чтения ключа и
//! до любого события значения. Отклонённое значение всё равно потребляется
//! целиком, но вместо событий значения генерируются `skip_object`.

use std::{any::Any, collections::HashSet};

use globset::{Glob, GlobSet, GlobSetBuilder};
use rdb_error::{ErrorExt, RdbResult, StatusCode};
use thiserror::Error;

use super::{state::ReaderState, tags::LogicalType};
use crate::config::FilterConfig;

/// Предикат над состоянием декодера.
pub trait KeyFilter {
    /// `true`: ключ декодируется, `false`: пропускается.
    fn accept(
        &mut self,
        state: &ReaderState,
    ) -> RdbResult<bool>;
}

impl<F> KeyFilter for F
where
    F: FnMut(&ReaderState) -> bool,
{
    fn accept(
        &mut self,
        state: &ReaderState,
    ) -> RdbResult<bool> {
        Ok(self(state))
    }
}

/// Ошибки построения фильтра.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid key pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl ErrorExt for FilterError {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidArgs
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Декларативный фильтр: ключ принимается, если совпали все заданные
/// правила.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    databases: Option<HashSet<u64>>,
    keys: Option<GlobSet>,
    types: Option<HashSet<LogicalType>>,
}

impl FilterRules {
    /// Фильтр без правил, принимающий всё.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FilterConfig) -> RdbResult<Self> {
        let mut rules = Self::new();
        if !config.databases.is_empty() {
            rules = rules.with_databases(config.databases.iter().copied());
        }
        if !config.keys.is_empty() {
            rules = rules.with_key_patterns(config.keys.iter().map(String::as_str))?;
        }
        if !config.types.is_empty() {
            rules = rules.with_types(config.types.iter().copied());
        }
        Ok(rules)
    }

    pub fn with_databases(
        mut self,
        databases: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.databases = Some(databases.into_iter().collect());
        self
    }

    /// Добавляет glob-шаблоны ключей. Целые ключи сравниваются по десятичной
    /// записи.
    pub fn with_key_patterns<'a>(
        mut self,
        patterns: impl IntoIterator<Item = &'a str>,
    ) -> RdbResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| FilterError::InvalidPattern {
            pattern: "<set>".to_string(),
            source,
        })?;
        self.keys = Some(set);
        Ok(self)
    }

    pub fn with_types(
        mut self,
        types: impl IntoIterator<Item = LogicalType>,
    ) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Нет ни одного правила.
    pub fn is_empty(&self) -> bool {
        self.databases.is_none() && self.keys.is_none() && self.types.is_none()
    }

    pub fn matches(
        &self,
        state: &ReaderState,
    ) -> bool {
        if let Some(databases) = &self.databases {
            match state.database {
                Some(db) if databases.contains(&db) => {}
                _ => return false,
            }
        }
        if let Some(types) = &self.types {
            match state.logical_type() {
                Some(t) if types.contains(&t) => {}
                _ => return false,
            }
        }
        if let Some(keys) = &self.keys {
            let Some(key) = &state.key else {
                return false;
            };
            let text = key.to_string_lossy();
            if !keys.is_match(&*text) {
                return false;
            }
        }
        true
    }
}

impl KeyFilter for FilterRules {
    fn accept(
        &mut self,
        state: &ReaderState,
    ) -> RdbResult<bool> {
        Ok(self.matches(state))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
