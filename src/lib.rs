/// Application settings: reader limits, logging, key filters.
pub mod config;
/// Callback consumers that re-serialize decoded snapshots.
pub mod dumpers;
/// Logging setup (formatting, filters).
pub mod logging;
/// Snapshot decoder: length/string codecs, compact encodings, reader.
pub mod rdb;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Configuration.
pub use config::{FilterConfig, ReaderConfig, Settings};
/// Append-only command dumper.
pub use dumpers::{AofDumper, ExpirePrecision};
/// Logging initialization.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Decoder entry points, callback contract and decoded values.
pub use rdb::{
    parse, parse_file, ContainerKind, EventRecorder, FilterRules, KeyFilter, LogicalType,
    NoopCallbacks, ObjectEncoding, ParseStats, RdbCallbacks, RdbEvent, RdbValue, Reader,
    ReaderState, TracingCallbacks, ValueType,
};
/// Error types shared with the error crate.
pub use rdb_error::{FormatError, RdbResult, StackError, StatusCode};
