pub mod settings;

pub use settings::{FilterConfig, ReaderConfig, Settings};
