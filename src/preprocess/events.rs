//! The preprocessor's output event stream (Design Notes §9).
//!
//! Replaces the sentinel-string convention (`*PROC_START*` etc.) with a
//! typed enum the Step Assembler matches on directly.

/// One emission from the preprocessor driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocEvent {
    /// A fully substituted, preprocessed EXEC or DD statement, not yet
    /// grammar-parsed.
    Card(String),
    /// Entering an expanded procedure's body.
    ProcStart {
        caller_label: Option<String>,
        proc_name: String,
    },
    /// Leaving the most recently entered procedure's body.
    ProcEnd,
    /// One line of in-stream data captured under a `DD *`/`DD DATA`
    /// allocation, belonging to the most recently emitted DD.
    Payload(String),
}
