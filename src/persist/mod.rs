//! Persistence Adapter (§6, Design Notes §9).
//!
//! Writes an assembled step list to the relational schema. `PersistenceAdapter`
//! is a trait so the default [`PostgresAdapter`] can be swapped for the
//! in-memory [`RecordingAdapter`] test double without touching the assembler.

mod postgres_adapter;
mod recording;

pub use postgres_adapter::PostgresAdapter;
pub use recording::RecordingAdapter;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::assemble::{Dd, Step};
use crate::base::constants::{DSN_DUMMY, DSN_INSTREAM, DSN_SYSOUT, DSN_WORK};
use crate::grammar::Parm;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(String),
    #[error("connection error: {0}")]
    Connection(String),
}

/// Outcome of one `insert_project` call, used to print the CLI's success
/// line (§6: `"extracted project {name}: {n} steps"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertSummary {
    pub project_id: i64,
    pub step_count: usize,
}

/// A fully resolved DATA_ALLOCATIONS row, the shape of §6's relation before
/// a concrete adapter maps it onto its storage format.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub dd_name: String,
    pub allocation_offset: i32,
    pub dsn: String,
    pub disp_status: Option<String>,
    pub disp_normal_term: Option<String>,
    pub disp_abnormal_term: Option<String>,
    pub unit: Option<String>,
    pub vol_ser: Option<String>,
    pub is_dummy: bool,
    pub instream_ref: Option<String>,
    pub lrecl: Option<String>,
    pub blksize: Option<String>,
    pub recfm: Option<String>,
    pub dcb_attributes: Option<Value>,
}

pub trait PersistenceAdapter {
    /// Next unused `step_id` for `project`, continuing from the prior max
    /// across all inserts (§6). Projects not yet seen start at 1.
    fn next_step_id(&mut self, project: &str) -> Result<i64, PersistError>;

    /// Write one project's step list in a single transaction. `relative_step`
    /// restarts at `X0000001` for this call regardless of prior inserts;
    /// `step_id` continues from [`Self::next_step_id`].
    fn insert_project(&mut self, project: &str, steps: &[Step]) -> Result<InsertSummary, PersistError>;
}

/// Format the 1-based sequential counter as `X` followed by a 7-digit
/// left-padded number (§6).
pub fn relative_step(sequence: u32) -> String {
    format!("X{sequence:07}")
}

/// Flatten a step's DDs into ordered [`AllocationRow`]s, resolving
/// `dd_name`/`allocation_offset` from the concatenation rule (§3 I2): an
/// unlabeled DD continues the nearest preceding labeled one, restarting the
/// offset counter at 1 on each new label.
pub fn flatten_allocations(dds: &[Dd]) -> Vec<AllocationRow> {
    let mut rows = Vec::with_capacity(dds.len());
    let mut current_label = String::new();
    let mut offset = 0i32;

    for dd in dds {
        if let Some(label) = &dd.label {
            current_label = label.clone();
            offset = 1;
        } else {
            offset += 1;
        }
        rows.push(build_allocation_row(current_label.clone(), offset, dd));
    }
    rows
}

fn build_allocation_row(dd_name: String, allocation_offset: i32, dd: &Dd) -> AllocationRow {
    let is_dummy = dd
        .positional
        .as_deref()
        .map(|p| p.eq_ignore_ascii_case("DUMMY"))
        .unwrap_or(false);
    let is_instream = dd
        .positional
        .as_deref()
        .map(|p| p == "*" || p.eq_ignore_ascii_case("DATA"))
        .unwrap_or(false);

    let dsn = dd
        .params
        .get("DSN")
        .and_then(Parm::as_value)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if is_dummy {
                DSN_DUMMY.to_string()
            } else if is_instream {
                DSN_INSTREAM.to_string()
            } else if dd.params.contains_key("SYSOUT") {
                DSN_SYSOUT.to_string()
            } else {
                DSN_WORK.to_string()
            }
        });

    let (disp_status, disp_normal_term, disp_abnormal_term) = match dd.params.get("DISP") {
        Some(Parm::Disp(values)) => (
            values.first().cloned().flatten(),
            values.get(1).cloned().flatten(),
            values.get(2).cloned().flatten(),
        ),
        _ => (None, None, None),
    };

    let unit = dd.params.get("UNIT").and_then(Parm::as_value).map(str::to_string);
    let vol_ser = dd.params.get("VOL").and_then(vol_ser_as_string);

    let (lrecl, blksize, recfm, dcb_attributes) = match dd.params.get("DCB") {
        Some(Parm::Dcb(dcb)) => (
            dcb.lrecl.clone(),
            dcb.blksize.clone(),
            dcb.recfm.clone(),
            Some(dcb.others_as_json()),
        ),
        _ => (None, None, None, None),
    };

    let instream_ref = if is_instream && !dd.payload.is_empty() {
        Some(dd.payload.join("\n"))
    } else {
        None
    };

    AllocationRow {
        dd_name,
        allocation_offset,
        dsn,
        disp_status,
        disp_normal_term,
        disp_abnormal_term,
        unit,
        vol_ser,
        is_dummy,
        instream_ref,
        lrecl,
        blksize,
        recfm,
        dcb_attributes,
    }
}

fn vol_ser_as_string(p: &Parm) -> Option<String> {
    match p {
        Parm::Value(v) => Some(v.clone()),
        Parm::List(items) => Some(items.join(",")),
        _ => None,
    }
}

/// Serialize a step's non-`PGM`/`PROC`/`COND` parameters to the `parameters`
/// JSON column; `COND` is pulled out separately into `cond_logic` (§6).
pub fn split_step_params(params: &IndexMap<String, Parm>) -> (Value, Option<String>) {
    let cond_logic = params.get("COND").and_then(Parm::as_value).map(str::to_string);
    let mut map = serde_json::Map::new();
    for (k, v) in params {
        if matches!(k.as_str(), "PGM" | "PROC" | "COND") {
            continue;
        }
        map.insert(k.clone(), parm_to_json(v));
    }
    (Value::Object(map), cond_logic)
}

fn parm_to_json(p: &Parm) -> Value {
    match p {
        Parm::Value(v) => Value::String(v.clone()),
        Parm::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        Parm::Disp(items) => Value::Array(
            items
                .iter()
                .map(|o| o.clone().map(Value::String).unwrap_or(Value::Null))
                .collect(),
        ),
        Parm::Dcb(dcb) => {
            let mut map = serde_json::Map::new();
            if let Some(v) = &dcb.lrecl {
                map.insert("LRECL".to_string(), Value::String(v.clone()));
            }
            if let Some(v) = &dcb.recfm {
                map.insert("RECFM".to_string(), Value::String(v.clone()));
            }
            if let Some(v) = &dcb.blksize {
                map.insert("BLKSIZE".to_string(), Value::String(v.clone()));
            }
            if let Some(v) = &dcb.dsorg {
                map.insert("DSORG".to_string(), Value::String(v.clone()));
            }
            for (k, v) in &dcb.others {
                map.insert(k.clone(), Value::String(v.clone()));
            }
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::DcbBlock;

    fn dd(label: Option<&str>, params: IndexMap<String, Parm>) -> Dd {
        Dd {
            label: label.map(str::to_string),
            positional: None,
            params,
            payload: Vec::new(),
        }
    }

    #[test]
    fn relative_step_formats_seven_digit_counter() {
        assert_eq!(relative_step(1), "X0000001");
        assert_eq!(relative_step(42), "X0000042");
    }

    #[test]
    fn concatenation_offsets_restart_per_label() {
        // §8 property 5 / S5.
        let mut a = IndexMap::new();
        a.insert("DSN".to_string(), Parm::Value("A".to_string()));
        let mut b = IndexMap::new();
        b.insert("DSN".to_string(), Parm::Value("B".to_string()));
        let mut c = IndexMap::new();
        c.insert("DSN".to_string(), Parm::Value("C".to_string()));
        let dds = vec![dd(Some("IN"), a), dd(None, b), dd(None, c)];
        let rows = flatten_allocations(&dds);
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.dd_name, "IN");
        }
        assert_eq!(rows[0].allocation_offset, 1);
        assert_eq!(rows[1].allocation_offset, 2);
        assert_eq!(rows[2].allocation_offset, 3);
        assert_eq!(rows[0].dsn, "A");
        assert_eq!(rows[1].dsn, "B");
        assert_eq!(rows[2].dsn, "C");
    }

    #[test]
    fn dummy_and_instream_get_surrogate_dsns() {
        let dummy = dd(Some("NEXT"), IndexMap::new());
        let mut dummy = dummy;
        dummy.positional = Some("DUMMY".to_string());
        let row = &flatten_allocations(&[dummy])[0];
        assert_eq!(row.dsn, DSN_DUMMY);
        assert!(row.is_dummy);

        let mut instream = dd(Some("SYSIN"), IndexMap::new());
        instream.positional = Some("*".to_string());
        instream.payload = vec!["HELLO".to_string(), "WORLD".to_string()];
        let row = &flatten_allocations(&[instream])[0];
        assert_eq!(row.dsn, DSN_INSTREAM);
        assert_eq!(row.instream_ref.as_deref(), Some("HELLO\nWORLD"));
    }

    #[test]
    fn disp_tuple_splits_into_three_columns() {
        let mut params = IndexMap::new();
        params.insert("DSN".to_string(), Parm::Value("A.B".to_string()));
        params.insert(
            "DISP".to_string(),
            Parm::Disp(vec![
                Some("NEW".to_string()),
                Some("CATLG".to_string()),
                Some("DELETE".to_string()),
            ]),
        );
        let row = &flatten_allocations(&[dd(Some("OUT"), params)])[0];
        assert_eq!(row.disp_status.as_deref(), Some("NEW"));
        assert_eq!(row.disp_normal_term.as_deref(), Some("CATLG"));
        assert_eq!(row.disp_abnormal_term.as_deref(), Some("DELETE"));
    }

    #[test]
    fn dcb_unrecognized_keys_preserved_as_json() {
        let mut params = IndexMap::new();
        let mut dcb = DcbBlock::default();
        dcb.lrecl = Some("80".to_string());
        dcb.others.insert("OPTCD".to_string(), "Q".to_string());
        params.insert("DCB".to_string(), Parm::Dcb(dcb));
        let row = &flatten_allocations(&[dd(Some("D1"), params)])[0];
        assert_eq!(row.lrecl.as_deref(), Some("80"));
        assert!(row.dcb_attributes.is_some());
    }

    #[test]
    fn step_params_split_pulls_out_cond() {
        let mut params = IndexMap::new();
        params.insert("PGM".to_string(), Parm::Value("X".to_string()));
        params.insert("COND".to_string(), Parm::Value("(4,LT)".to_string()));
        params.insert("REGION".to_string(), Parm::Value("4M".to_string()));
        let (json, cond) = split_step_params(&params);
        assert_eq!(cond.as_deref(), Some("(4,LT)"));
        assert!(json.get("PGM").is_none());
        assert!(json.get("COND").is_none());
        assert_eq!(json.get("REGION").unwrap(), "4M");
    }
}
