use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::{logging::LoggingConfig, rdb::LogicalType};

/// Младшая версия формата, которую принимает декодер по умолчанию.
pub const DEFAULT_MIN_VERSION: u32 = 1;
/// Старшая версия формата по умолчанию.
pub const DEFAULT_MAX_VERSION: u32 = 6;
/// Старшая версия ранней ревизии формата.
pub const LEGACY_MAX_VERSION: u32 = 4;
/// Ёмкость буфера чтения по умолчанию (64 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Параметры декодера.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Минимальная допустимая версия снапшота
    pub min_version: u32,
    /// Максимальная допустимая версия снапшота
    pub max_version: u32,
    /// Ёмкость `BufReader` вокруг входного потока
    pub buffer_capacity: usize,
}

/// Декларативный фильтр ключей.
///
/// Пустой список означает отсутствие ограничения.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub databases: Vec<u64>,
    /// Glob-шаблоны ключей
    pub keys: Vec<String>,
    pub types: Vec<LogicalType>,
}

/// Конфигурация приложения.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reader: ReaderConfig,
    pub logging: LoggingConfig,
    pub filter: FilterConfig,
}

impl ReaderConfig {
    /// Диапазон версий ранней ревизии формата (1..=4).
    pub fn legacy() -> Self {
        Self {
            max_version: LEGACY_MAX_VERSION,
            ..Self::default()
        }
    }

    pub fn with_versions(
        mut self,
        min_version: u32,
        max_version: u32,
    ) -> Self {
        self.min_version = min_version;
        self.max_version = max_version;
        self
    }

    pub fn accepts_version(
        &self,
        version: u32,
    ) -> bool {
        (self.min_version..=self.max_version).contains(&version)
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            min_version: DEFAULT_MIN_VERSION,
            max_version: DEFAULT_MAX_VERSION,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty() && self.keys.is_empty() && self.types.is_empty()
    }
}

impl Settings {
    /// Загружает конфигурацию: значения по умолчанию, затем TOML-файл (если
    /// указан), затем переменные окружения `RDB__SECTION__KEY`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix("RDB").separator("__"))
    }

    fn load_with_env(
        path: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Значения по умолчанию
            .set_default("reader.min_version", DEFAULT_MIN_VERSION as i64)?
            .set_default("reader.max_version", DEFAULT_MAX_VERSION as i64)?
            .set_default("reader.buffer_capacity", DEFAULT_BUFFER_CAPACITY as i64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        // Десериализуем конфигурацию в нашу структуру
        builder.add_source(env).build()?.try_deserialize()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use tempfile::NamedTempFile;

    use super::*;
    use crate::logging::LogFormat;

    fn no_env() -> Environment {
        Environment::with_prefix("RDB")
            .separator("__")
            .source(Some(HashMap::new()))
    }

    /// Тест проверяет значения по умолчанию и диапазон ранней ревизии.
    #[test]
    fn test_reader_defaults() {
        let cfg = ReaderConfig::default();
        assert!(cfg.accepts_version(1));
        assert!(cfg.accepts_version(6));
        assert!(!cfg.accepts_version(7));
        assert!(!cfg.accepts_version(0));

        let legacy = ReaderConfig::legacy();
        assert!(legacy.accepts_version(4));
        assert!(!legacy.accepts_version(5));
        assert_eq!(legacy.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    /// Тест проверяет загрузку без файла и окружения.
    #[test]
    fn test_load_defaults() {
        let settings = Settings::load_with_env(None, no_env()).unwrap();
        assert_eq!(settings.reader, ReaderConfig::default());
        assert!(settings.filter.is_empty());
    }

    /// Тест проверяет, что TOML-файл переопределяет значения по умолчанию.
    #[test]
    fn test_load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[reader]
max_version = 4

[logging]
level = "debug"
format = "json"

[filter]
databases = [0, 2]
keys = ["user:*"]
types = ["hash", "zset"]
"#
        )
        .unwrap();

        let settings = Settings::load_with_env(Some(file.path()), no_env()).unwrap();
        assert_eq!(settings.reader.max_version, 4);
        assert_eq!(settings.reader.min_version, 1);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.filter.databases, vec![0, 2]);
        assert_eq!(settings.filter.keys, vec!["user:*".to_string()]);
        assert_eq!(
            settings.filter.types,
            vec![LogicalType::Hash, LogicalType::SortedSet]
        );
    }

    /// Тест проверяет переопределение через переменные окружения.
    #[test]
    fn test_env_override() {
        let vars = HashMap::from([("RDB__READER__MAX_VERSION".to_string(), "5".to_string())]);
        let env = Environment::with_prefix("RDB")
            .separator("__")
            .try_parsing(true)
            .source(Some(vars));

        let settings = Settings::load_with_env(None, env).unwrap();
        assert_eq!(settings.reader.max_version, 5);
    }
}
