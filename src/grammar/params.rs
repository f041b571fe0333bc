//! Parameter value shapes produced by the transformer (§3, §4.7, §9).
//!
//! The source system folds every parameter into an untagged map of
//! string/list/dict values; here each parameter is a tagged variant so
//! downstream code never has to re-sniff a value's shape.

use std::collections::BTreeMap;

/// A single parsed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Parm {
    /// A scalar value, quote-stripped if it was quoted.
    Value(String),
    /// An ordered, parenthesized list of plain values (e.g. `VOL=SER=(A,B)`,
    /// or a generic unrecognized parenthesized parameter).
    List(Vec<String>),
    /// `DISP=(status, normal, abnormal)`, omitted positions preserved as
    /// `None`. A bare scalar `DISP=SHR` is `vec![Some("SHR")]`.
    Disp(Vec<Option<String>>),
    /// `DCB=(LRECL=..., RECFM=..., ...)`. A non-sublist `DCB=value` is
    /// represented as [`Parm::Value`] instead (it is opaque).
    Dcb(DcbBlock),
}

/// DCB sub-parameters: the four recognized keys plus a verbatim bag for
/// anything else (including symbolic overrides), matching §3's "plus
/// unrecognized keys preserved verbatim" and §6's `dcb_attributes` JSON
/// column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DcbBlock {
    pub lrecl: Option<String>,
    pub recfm: Option<String>,
    pub blksize: Option<String>,
    pub dsorg: Option<String>,
    pub others: BTreeMap<String, String>,
}

impl DcbBlock {
    /// Render the unrecognized sub-keys as a JSON object, per §6's
    /// `dcb_attributes` column.
    pub fn others_as_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.others
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl Parm {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Parm::Value(v) => Some(v.as_str()),
            _ => None,
        }
    }
}
