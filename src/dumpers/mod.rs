pub mod aof;

pub use aof::{AofDumper, ExpirePrecision, AOF_REWRITE_ITEMS_PER_CMD};
