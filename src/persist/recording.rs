//! In-memory [`PersistenceAdapter`] test double (§8: S6, invariant 6).

use std::collections::HashMap;

use crate::assemble::Step;

use super::{AllocationRow, InsertSummary, PersistError, PersistenceAdapter, flatten_allocations, relative_step, split_step_params};

/// One recorded STEPS row, flattened for assertions in integration tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStep {
    pub project_id: i64,
    pub step_id: i64,
    pub relative_step: String,
    pub step_name: String,
    pub proc_step_name: Option<String>,
    pub program_name: Option<String>,
    pub proc_name: Option<String>,
    pub cond_logic: Option<String>,
    pub allocations: Vec<AllocationRow>,
}

/// Records every inserted project without touching a database, so
/// integration tests can assert on the exact rows `PostgresAdapter` would
/// have written.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    project_ids: HashMap<String, i64>,
    next_project_id: i64,
    max_step_id: HashMap<i64, i64>,
    pub steps: Vec<RecordedStep>,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn project_id(&mut self, project: &str) -> i64 {
        if let Some(id) = self.project_ids.get(project) {
            return *id;
        }
        self.next_project_id += 1;
        let id = self.next_project_id;
        self.project_ids.insert(project.to_string(), id);
        id
    }
}

impl PersistenceAdapter for RecordingAdapter {
    fn next_step_id(&mut self, project: &str) -> Result<i64, PersistError> {
        let project_id = self.project_id(project);
        Ok(self.max_step_id.get(&project_id).copied().unwrap_or(0) + 1)
    }

    fn insert_project(&mut self, project: &str, steps: &[Step]) -> Result<InsertSummary, PersistError> {
        let project_id = self.project_id(project);
        let mut step_id = self.max_step_id.get(&project_id).copied().unwrap_or(0);

        for (sequence, step) in steps.iter().enumerate() {
            step_id += 1;
            let (_, cond_logic) = split_step_params(&step.params);
            self.steps.push(RecordedStep {
                project_id,
                step_id,
                relative_step: relative_step(sequence as u32 + 1),
                step_name: step.step_name.clone(),
                proc_step_name: step.proc_step_name.clone(),
                program_name: step.program_name.clone(),
                proc_name: step.proc_name.clone(),
                cond_logic,
                allocations: flatten_allocations(&step.dds),
            });
        }
        self.max_step_id.insert(project_id, step_id);

        Ok(InsertSummary {
            project_id,
            step_count: steps.len(),
        })
    }
}
