//! Top-level error aggregation (Design Notes §9).
//!
//! Per-boundary `thiserror` enums (`GrammarError`, `PersistError`) convert
//! into this one via `#[from]` at the CLI boundary. Per-statement parse
//! errors and per-include I/O errors inside the preprocessor/assembler are
//! *not* represented here — they are non-fatal and only logged (§7).

use thiserror::Error;

use crate::persist::PersistError;

#[derive(Debug, Error)]
pub enum JclError {
    #[error("configuration error: {0}")]
    Config(#[from] std::io::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
