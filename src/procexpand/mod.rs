//! Procedure Expander (§4.5).
//!
//! Captures in-stream PROC definitions and supplies the parameter-binding
//! machinery used to expand `EXEC PROC=` invocations. The actual recursive
//! expansion (which re-enters the preprocessor driver on the procedure
//! body) lives in [`crate::preprocess`]; this module owns the procedure map
//! and the pure parts: capture and parameter-binding parsing.

use std::collections::HashMap;

use crate::symbol::parse_name_value_pairs;

/// A captured `PROC` definition: its header card (containing defaults) and
/// the raw body cards up to but excluding the matching `PEND`.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub header: String,
    pub body: Vec<String>,
}

/// Process-wide procedure map, scoped to the lifetime of one preprocessor
/// instance (one deck), per Design Notes §9.
#[derive(Debug, Default)]
pub struct ProcedureMap {
    procedures: HashMap<String, Procedure>,
}

impl ProcedureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a captured procedure. Later definitions overwrite earlier
    /// ones, per §3.
    pub fn insert(&mut self, name: &str, proc: Procedure) {
        self.procedures.insert(name.to_ascii_uppercase(), proc);
    }

    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(&name.to_ascii_uppercase())
    }
}

/// Parse the default parameter bindings from a `PROC` header card's operand
/// text, e.g. `P=FOO,Q=BAR` in `//MYPROC PROC P=FOO,Q=BAR`.
///
/// The header's own leading label and `PROC` keyword have already been
/// stripped by the caller; this takes only the operand tail.
pub fn parse_proc_defaults(operand_tail: &str) -> Vec<(String, String)> {
    parse_name_value_pairs(operand_tail)
}

/// Parse the keyword overrides on an `EXEC` card invoking a procedure: the
/// portion after the procedure name, e.g. `P=BAR` in `EXEC MYPROC,P=BAR`.
pub fn parse_exec_overrides(operand_tail: &str) -> Vec<(String, String)> {
    parse_name_value_pairs(operand_tail)
}
