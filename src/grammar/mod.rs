//! Grammar and Transformer (§4.7).
//!
//! A PEG grammar (via `pest`) over a single preprocessed EXEC/DD statement,
//! folded into a [`ParsedCard`] by a single-pass transformer.

mod params;
mod parser;
mod transform;

pub use params::{DcbBlock, Parm};
pub use parser::Rule;
pub use transform::{GrammarError, ParsedCard, StmtKind, parse_statement};
