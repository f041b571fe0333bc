//! `postgres`-backed [`PersistenceAdapter`] (§6).

use postgres::{Client, NoTls};
use tracing::info;

use crate::assemble::Step;

use super::{InsertSummary, PersistError, PersistenceAdapter, flatten_allocations, relative_step, split_step_params};

const SCHEMA_DDL: &str = "
CREATE TABLE IF NOT EXISTS projects (
    project_id BIGSERIAL PRIMARY KEY,
    project_name TEXT UNIQUE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS steps (
    project_id BIGINT NOT NULL REFERENCES projects(project_id),
    step_id BIGINT NOT NULL,
    relative_step TEXT NOT NULL,
    step_name VARCHAR(8) NOT NULL,
    proc_step_name VARCHAR(8),
    program_name VARCHAR(8),
    proc_name VARCHAR(8),
    parameters JSONB NOT NULL,
    cond_logic TEXT,
    PRIMARY KEY (project_id, step_id)
);
CREATE TABLE IF NOT EXISTS data_allocations (
    project_id BIGINT NOT NULL,
    step_id BIGINT NOT NULL,
    ds_id BIGINT NOT NULL,
    dd_name VARCHAR(8) NOT NULL,
    allocation_offset INT NOT NULL,
    dsn VARCHAR(44) NOT NULL,
    disp_status TEXT,
    disp_normal_term TEXT,
    disp_abnormal_term TEXT,
    unit TEXT,
    vol_ser VARCHAR(6),
    is_dummy BOOLEAN NOT NULL,
    instream_ref TEXT,
    lrecl TEXT,
    blksize TEXT,
    recfm TEXT,
    dcb_attributes JSONB,
    PRIMARY KEY (project_id, step_id, ds_id),
    FOREIGN KEY (project_id, step_id) REFERENCES steps(project_id, step_id)
);
";

const DROP_DDL: &str = "
DROP TABLE IF EXISTS data_allocations;
DROP TABLE IF EXISTS steps;
DROP TABLE IF EXISTS projects;
";

/// Owns the one connection and the one transaction-per-project described in
/// §5's resource model.
pub struct PostgresAdapter {
    client: Client,
}

impl PostgresAdapter {
    /// Connect and ensure the schema exists, dropping and recreating it
    /// first when `drop_tables` is set (§6: `DROP_TABLES`).
    pub fn connect(conninfo: &str, drop_tables: bool) -> Result<Self, PersistError> {
        let mut client = Client::connect(conninfo, NoTls).map_err(|e| PersistError::Connection(e.to_string()))?;
        if drop_tables {
            client.batch_execute(DROP_DDL).map_err(|e| PersistError::Database(e.to_string()))?;
        }
        client.batch_execute(SCHEMA_DDL).map_err(|e| PersistError::Database(e.to_string()))?;
        Ok(Self { client })
    }

    fn ensure_project(&mut self, project: &str) -> Result<i64, PersistError> {
        let row = self
            .client
            .query_opt("SELECT project_id FROM projects WHERE project_name = $1", &[&project])
            .map_err(|e| PersistError::Database(e.to_string()))?;
        if let Some(row) = row {
            return Ok(row.get(0));
        }
        let row = self
            .client
            .query_one(
                "INSERT INTO projects (project_name) VALUES ($1) RETURNING project_id",
                &[&project],
            )
            .map_err(|e| PersistError::Database(e.to_string()))?;
        Ok(row.get(0))
    }
}

impl PersistenceAdapter for PostgresAdapter {
    fn next_step_id(&mut self, project: &str) -> Result<i64, PersistError> {
        let project_id = self.ensure_project(project)?;
        let row = self
            .client
            .query_one(
                "SELECT COALESCE(MAX(step_id), 0) FROM steps WHERE project_id = $1",
                &[&project_id],
            )
            .map_err(|e| PersistError::Database(e.to_string()))?;
        let max: i64 = row.get(0);
        Ok(max + 1)
    }

    fn insert_project(&mut self, project: &str, steps: &[Step]) -> Result<InsertSummary, PersistError> {
        let project_id = self.ensure_project(project)?;
        let mut txn = self.client.transaction().map_err(|e| PersistError::Database(e.to_string()))?;

        let row = txn
            .query_one(
                "SELECT COALESCE(MAX(step_id), 0) FROM steps WHERE project_id = $1",
                &[&project_id],
            )
            .map_err(|e| PersistError::Database(e.to_string()))?;
        let mut step_id: i64 = row.get(0);

        for (sequence, step) in steps.iter().enumerate() {
            step_id += 1;
            let (parameters, cond_logic) = split_step_params(&step.params);
            txn.execute(
                "INSERT INTO steps (project_id, step_id, relative_step, step_name, proc_step_name, \
                 program_name, proc_name, parameters, cond_logic) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
                &[
                    &project_id,
                    &step_id,
                    &relative_step(sequence as u32 + 1),
                    &step.step_name,
                    &step.proc_step_name,
                    &step.program_name,
                    &step.proc_name,
                    &parameters,
                    &cond_logic,
                ],
            )
            .map_err(|e| PersistError::Database(e.to_string()))?;

            for (ds_id, row) in flatten_allocations(&step.dds).into_iter().enumerate() {
                txn.execute(
                    "INSERT INTO data_allocations (project_id, step_id, ds_id, dd_name, allocation_offset, \
                     dsn, disp_status, disp_normal_term, disp_abnormal_term, unit, vol_ser, is_dummy, \
                     instream_ref, lrecl, blksize, recfm, dcb_attributes) \
                     VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)",
                    &[
                        &project_id,
                        &step_id,
                        &(ds_id as i64 + 1),
                        &row.dd_name,
                        &row.allocation_offset,
                        &row.dsn,
                        &row.disp_status,
                        &row.disp_normal_term,
                        &row.disp_abnormal_term,
                        &row.unit,
                        &row.vol_ser,
                        &row.is_dummy,
                        &row.instream_ref,
                        &row.lrecl,
                        &row.blksize,
                        &row.recfm,
                        &row.dcb_attributes,
                    ],
                )
                .map_err(|e| PersistError::Database(e.to_string()))?;
            }
        }

        txn.commit().map_err(|e| PersistError::Database(e.to_string()))?;
        info!(project, steps = steps.len(), "project inserted");

        Ok(InsertSummary {
            project_id,
            step_count: steps.len(),
        })
    }
}
