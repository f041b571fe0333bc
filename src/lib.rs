//! # jclnorm
//!
//! Ingests mainframe JCL decks and produces a normalized relational model
//! of the jobs they describe: ordered execution steps, each with its
//! program/procedure invocation and its DD allocations.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project    → top-level pipeline orchestration
//!   ↓
//! persist    → relational persistence adapter
//!   ↓
//! assemble   → Step Assembler (event stream → Vec<Step>)
//!   ↓
//! preprocess → Preprocessor Driver (cards → event stream)
//!   ↓
//! procexpand → Procedure Expander (PROC capture, parameter binding)
//!   ↓
//! grammar    → pest grammar + transformer for EXEC/DD statements
//!   ↓
//! resolve    → Library Resolver
//!   ↓
//! symbol     → Symbol Table
//!   ↓
//! reassemble → Statement Reassembler
//!   ↓
//! card       → Card Normalizer
//!   ↓
//! base       → domain constants
//! ```

/// Domain constants for mainframe-JCL-shaped data.
pub mod base;

/// Card Normalizer.
pub mod card;

/// Statement Reassembler.
pub mod reassemble;

/// Symbol Table.
pub mod symbol;

/// Library Resolver.
pub mod resolve;

/// Grammar and Transformer over EXEC/DD statements.
pub mod grammar;

/// Procedure Expander.
pub mod procexpand;

/// Preprocessor Driver.
pub mod preprocess;

/// Step Assembler.
pub mod assemble;

/// Persistence Adapter.
pub mod persist;

/// Configuration loader.
pub mod config;

/// Top-level pipeline orchestration.
pub mod project;

/// Top-level error aggregation.
pub mod error;
