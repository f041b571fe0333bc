//! Domain constants for mainframe-JCL-shaped data.

/// Significant card columns; content beyond this is ignored (§4.2).
pub const CARD_COLUMN_LIMIT: usize = 72;

/// Maximum length of a symbolic/procedure/member name (§3).
pub const NAME_MAX_LEN: usize = 8;

/// Field width cap for step and DD names in the persisted schema (§6).
pub const NAME_FIELD_WIDTH: usize = 8;

/// Field width cap for a dataset name in the persisted schema (§6).
pub const DSN_FIELD_WIDTH: usize = 44;

/// Field width cap for a volume serial in the persisted schema (§6).
pub const VOLSER_FIELD_WIDTH: usize = 6;

/// Surrogate DSN value for a `DUMMY` allocation.
pub const DSN_DUMMY: &str = "(dummy)";

/// Surrogate DSN value for an in-stream (`DD *` / `DD DATA`) allocation.
pub const DSN_INSTREAM: &str = "(input stream)";

/// Surrogate DSN value for a `SYSOUT=` allocation.
pub const DSN_SYSOUT: &str = "(output stream)";

/// Surrogate DSN value for an anonymous/temporary/referback allocation with
/// no DSN present. See Open Questions in §9 — this conflates several cases
/// deliberately, per the DESIGN.md decision.
pub const DSN_WORK: &str = "(work_ds)";
