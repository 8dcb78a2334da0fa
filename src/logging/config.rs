use std::fmt;

use serde::Deserialize;

/// Формат вывода логов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень: trace, debug, info, warn, error, off
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_line_numbers: bool,
}

/// Ошибка валидации конфигурации логирования.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLevel(pub String);

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

impl LoggingConfig {
    /// Проверяет, что уровень из известного набора.
    pub fn validate(&self) -> Result<(), InvalidLevel> {
        let level = self.level.to_ascii_lowercase();
        if LEVELS.contains(&level.as_str()) {
            Ok(())
        } else {
            Err(InvalidLevel(self.level.clone()))
        }
    }

    /// Директива `EnvFilter`: уровень для крейтов декодера, `warn` для
    /// остальных.
    pub fn build_filter_directive(&self) -> String {
        let level = self.level.to_ascii_lowercase();
        format!("warn,rdb_stream={level},rdb_dump={level}")
    }

    /// Уровень из флагов `-v`/`-q` командной строки.
    pub fn with_verbosity(
        mut self,
        verbose: u8,
        quiet: bool,
    ) -> Self {
        if quiet {
            self.level = "error".into();
        } else if verbose > 0 {
            self.level = if verbose == 1 { "debug" } else { "trace" }.into();
        }
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: false,
            with_line_numbers: false,
        }
    }
}

impl fmt::Display for InvalidLevel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "invalid log level {:?} (expected one of: {})",
            self.0,
            LEVELS.join(", ")
        )
    }
}

impl std::error::Error for InvalidLevel {}
