//! CLI для разбора снапшотов.
//!
//! Печатает события снапшота в лог или перекодирует снапшот в
//! append-only протокол команд.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use rdb_stream::{
    config::settings::LEGACY_MAX_VERSION, init_logging, AofDumper, ExpirePrecision, FilterRules,
    KeyFilter, LogicalType, ParseStats, Reader, Settings, StackError, TracingCallbacks,
};
use tracing::{debug, info, Level};

/// Аргументы командной строки.
#[derive(Parser, Debug)]
#[command(name = "rdb-dump")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decode a snapshot (RDB) file into events or AOF commands", long_about = None)]
struct Cli {
    /// Файл снапшота
    #[arg(help = "Path to the snapshot file")]
    file: PathBuf,
    /// Формат вывода
    #[arg(long, value_enum, default_value = "events", help = "Output format")]
    format: DumpFormat,
    /// Файл для AOF-вывода
    #[arg(short, long, help = "Write AOF output to this file instead of stdout")]
    output: Option<PathBuf>,
    /// Группировать элементы в variadic-команды
    #[arg(long, help = "Batch container elements into variadic commands")]
    variadic: bool,
    /// EXPIREAT вместо PEXPIREAT
    #[arg(long, help = "Emit EXPIREAT with second precision")]
    seconds: bool,
    /// Только указанные базы
    #[arg(long = "db", value_name = "N", help = "Only decode this database (repeatable)")]
    databases: Vec<u64>,
    /// Glob-шаблоны ключей
    #[arg(long = "key", value_name = "GLOB", help = "Only decode matching keys (repeatable)")]
    keys: Vec<String>,
    /// Только указанные типы
    #[arg(long = "type", value_name = "T", help = "Only decode this value type (repeatable)")]
    types: Vec<LogicalType>,
    /// Ранний диапазон версий (1..=4)
    #[arg(long, help = "Accept only the early format revision (versions 1..=4)")]
    legacy: bool,
    /// Файл конфигурации
    #[arg(short, long, env = "RDB_CONFIG", help = "TOML configuration file")]
    config: Option<PathBuf>,
    /// Подробность логов
    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
    /// Только ошибки
    #[arg(short, long, conflicts_with = "verbose", help = "Log errors only")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DumpFormat {
    /// Логировать каждое событие
    Events,
    /// Команды append-only протокола
    Aof,
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => {}
        Err(e) => {
            if let Some(stack) = e.downcast_ref::<StackError>() {
                debug!(
                    status = %stack.status_code(),
                    critical = stack.is_critical(),
                    contexts = stack.contexts().len(),
                    "parse failed"
                );
            }
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;
    settings.logging = settings.logging.with_verbosity(cli.verbose, cli.quiet);
    init_logging(settings.logging.clone()).map_err(|e| anyhow!(e))?;

    if cli.legacy {
        settings.reader.max_version = LEGACY_MAX_VERSION;
    }
    settings.filter.databases.extend(&cli.databases);
    settings.filter.keys.extend(cli.keys.iter().cloned());
    settings.filter.types.extend(&cli.types);
    debug!(?settings, "effective configuration");

    let mut rules = FilterRules::from_config(&settings.filter)?;
    let filter: Option<&mut dyn KeyFilter> = if rules.is_empty() {
        None
    } else {
        Some(&mut rules)
    };

    let reader = Reader::new(settings.reader);
    let stats = match cli.format {
        DumpFormat::Events => {
            let mut callbacks = TracingCallbacks::new(Level::INFO);
            reader.parse_file(&cli.file, &mut callbacks, filter)?
        }
        DumpFormat::Aof => dump_aof(cli, &reader, filter)?,
    };

    report(&stats);
    Ok(())
}

fn dump_aof(
    cli: &Cli,
    reader: &Reader,
    filter: Option<&mut dyn KeyFilter>,
) -> Result<ParseStats> {
    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let precision = if cli.seconds {
        ExpirePrecision::Seconds
    } else {
        ExpirePrecision::Millis
    };
    let mut dumper = AofDumper::new(BufWriter::new(out))
        .variadic(cli.variadic)
        .with_precision(precision);

    let stats = reader.parse_file(&cli.file, &mut dumper, filter)?;
    debug!(commands = dumper.commands_written(), "AOF written");
    dumper.into_inner().flush()?;
    Ok(stats)
}

fn report(stats: &ParseStats) {
    info!(
        version = ?stats.version,
        bytes = stats.bytes_read,
        databases = stats.databases,
        keys = stats.keys_decoded,
        skipped = stats.keys_skipped,
        expirations = stats.expirations,
        "done"
    );
}
