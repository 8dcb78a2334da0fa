//! Перекодирование событий снапшота в append-only протокол команд.
//!
//! Каждая команда пишется как массив bulk-строк:
//! ```text
//! *<N>\r\n$<len>\r\n<arg>\r\n...
//! ```

use std::{borrow::Cow, io::Write};

use rdb_error::RdbResult;

use crate::rdb::{RdbCallbacks, RdbValue, ReaderState};

/// Максимум аргументов элементов в одной variadic-команде.
pub const AOF_REWRITE_ITEMS_PER_CMD: usize = 64;

/// Точность команды истечения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpirePrecision {
    /// `PEXPIREAT key <ms>`
    #[default]
    Millis,
    /// `EXPIREAT key <s>`
    Seconds,
}

/// Буфер variadic-команды текущего ключа.
#[derive(Debug, Default)]
struct Batch {
    key: Vec<u8>,
    args: Vec<Vec<u8>>,
}

/// Callback'и, записывающие снапшот как последовательность команд.
#[derive(Debug)]
pub struct AofDumper<W: Write> {
    out: W,
    variadic: bool,
    precision: ExpirePrecision,
    batch: Batch,
    commands: u64,
}

impl<W: Write> AofDumper<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            variadic: false,
            precision: ExpirePrecision::default(),
            batch: Batch::default(),
            commands: 0,
        }
    }

    /// Группировать элементы контейнеров в variadic-команды.
    pub fn variadic(
        mut self,
        variadic: bool,
    ) -> Self {
        self.variadic = variadic;
        self
    }

    pub fn with_precision(
        mut self,
        precision: ExpirePrecision,
    ) -> Self {
        self.precision = precision;
        self
    }

    /// Кол-во записанных команд.
    pub fn commands_written(&self) -> u64 {
        self.commands
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_command(
        &mut self,
        name: &str,
        args: &[&[u8]],
    ) -> RdbResult<()> {
        write!(self.out, "*{}\r\n${}\r\n{}\r\n", args.len() + 1, name.len(), name)?;
        for arg in args {
            write!(self.out, "${}\r\n", arg.len())?;
            self.out.write_all(arg)?;
            self.out.write_all(b"\r\n")?;
        }
        self.commands += 1;
        Ok(())
    }

    fn reset_batch(
        &mut self,
        key: &RdbValue,
    ) {
        self.batch.key = key.to_bytes().into_owned();
        self.batch.args.clear();
    }

    /// Элемент контейнера: отдельная команда или аргументы в буфер.
    fn handle(
        &mut self,
        name: &str,
        key: &RdbValue,
        args: &[Cow<'_, [u8]>],
    ) -> RdbResult<()> {
        if !self.variadic {
            let key = key.to_bytes();
            let mut all: Vec<&[u8]> = Vec::with_capacity(args.len() + 1);
            all.push(&key);
            all.extend(args.iter().map(|a| a.as_ref()));
            return self.write_command(name, &all);
        }

        self.batch
            .args
            .extend(args.iter().map(|a| a.clone().into_owned()));
        if self.batch.args.len() >= AOF_REWRITE_ITEMS_PER_CMD {
            self.flush_batch(name)?;
        }
        Ok(())
    }

    fn flush_batch(
        &mut self,
        name: &str,
    ) -> RdbResult<()> {
        if self.batch.args.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.batch.args);
        let key = std::mem::take(&mut self.batch.key);

        let mut all: Vec<&[u8]> = Vec::with_capacity(batch.len() + 1);
        all.push(&key);
        all.extend(batch.iter().map(Vec::as_slice));
        let res = self.write_command(name, &all);

        self.batch.key = key;
        res
    }

    fn hash_command(&self) -> &'static str {
        if self.variadic {
            "HMSET"
        } else {
            "HSET"
        }
    }
}

impl<W: Write> RdbCallbacks for AofDumper<W> {
    fn end_file(&mut self) -> RdbResult<()> {
        self.out.flush()?;
        Ok(())
    }

    fn start_database(
        &mut self,
        index: u64,
    ) -> RdbResult<()> {
        let db = index.to_string();
        self.write_command("SELECT", &[db.as_bytes()])
    }

    fn expire_at(
        &mut self,
        key: &RdbValue,
        epoch_ms: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        let (name, when) = match self.precision {
            ExpirePrecision::Millis => ("PEXPIREAT", epoch_ms),
            ExpirePrecision::Seconds => ("EXPIREAT", epoch_ms / 1000),
        };
        let when = when.to_string();
        self.write_command(name, &[&key.to_bytes(), when.as_bytes()])
    }

    fn set_scalar(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.write_command("SET", &[&key.to_bytes(), &value.to_bytes()])
    }

    fn start_list(
        &mut self,
        key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.reset_batch(key);
        Ok(())
    }

    fn add_list_item(
        &mut self,
        key: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.handle("RPUSH", key, &[value.to_bytes()])
    }

    fn end_list(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.flush_batch("RPUSH")
    }

    fn start_set(
        &mut self,
        key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.reset_batch(key);
        Ok(())
    }

    fn add_set_item(
        &mut self,
        key: &RdbValue,
        member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.handle("SADD", key, &[member.to_bytes()])
    }

    fn end_set(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.flush_batch("SADD")
    }

    fn start_sorted_set(
        &mut self,
        key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.reset_batch(key);
        Ok(())
    }

    fn add_sorted_set_item(
        &mut self,
        key: &RdbValue,
        score: &RdbValue,
        member: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.handle("ZADD", key, &[score.to_bytes(), member.to_bytes()])
    }

    fn end_sorted_set(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.flush_batch("ZADD")
    }

    fn start_hash(
        &mut self,
        key: &RdbValue,
        _len: u64,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        self.reset_batch(key);
        Ok(())
    }

    fn add_hash_item(
        &mut self,
        key: &RdbValue,
        field: &RdbValue,
        value: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        let name = self.hash_command();
        self.handle(name, key, &[field.to_bytes(), value.to_bytes()])
    }

    fn end_hash(
        &mut self,
        _key: &RdbValue,
        _state: &ReaderState,
    ) -> RdbResult<()> {
        let name = self.hash_command();
        self.flush_batch(name)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
