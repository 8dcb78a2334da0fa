//! Декодер снапшотов RDB.
//!
//! Модули снизу вверх: [`length`] и [`lzf`] → [`string`] → компактные
//! кодирования ([`ziplist`], [`zipmap`], [`intset`]) → [`object`] →
//! [`reader`].

pub mod callbacks;
pub mod filter;
pub mod intset;
pub mod length;
pub mod lzf;
pub mod object;
pub mod reader;
pub mod source;
pub mod state;
pub mod string;
pub mod tags;
pub mod value;
pub mod ziplist;
pub mod zipmap;

pub use callbacks::{
    ContainerKind, Element, EventRecorder, NoopCallbacks, RdbCallbacks, RdbEvent,
    TracingCallbacks,
};
pub use filter::{FilterError, FilterRules, KeyFilter};
pub use reader::{parse, parse_file, ParseStats, Reader};
pub use state::{ObjectEncoding, ReaderState};
pub use tags::{LogicalType, ValueType};
pub use value::RdbValue;
