//! Job repository: job instances and per-step checkpoints.

use super::BatchStore;
use crate::error::{BatchError, BatchResult};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

macro_rules! status_text {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $ty::Started   => "started",
                    $ty::Completed => "completed",
                    $ty::Failed    => "failed",
                }
            }

            fn parse(s: &str) -> BatchResult<Self> {
                match s {
                    "started"   => Ok($ty::Started),
                    "completed" => Ok($ty::Completed),
                    "failed"    => Ok($ty::Failed),
                    other => Err(BatchError::Other(anyhow::anyhow!(
                        concat!("unknown ", stringify!($ty), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

status_text!(JobStatus);
status_text!(StepStatus);

/// Persisted progress of one step within one job instance. Counters are
/// cumulative across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepExecution {
    pub step_name:    String,
    pub status:       StepStatus,
    pub read_count:   u64,
    pub write_count:  u64,
    pub filter_count: u64,
    pub skip_count:   u64,
    pub commit_count: u64,
}

impl StepExecution {
    pub fn new(step_name: &str) -> Self {
        Self {
            step_name:    step_name.to_string(),
            status:       StepStatus::Started,
            read_count:   0,
            write_count:  0,
            filter_count: 0,
            skip_count:   0,
            commit_count: 0,
        }
    }
}

impl BatchStore {
    // ── Job instance ──────────────────────────────────────────────

    /// Id and status of the instance for (`job_name`, `job_key`), if any.
    pub fn job_instance(&self, job_name: &str, job_key: &str) -> BatchResult<Option<(i64, JobStatus)>> {
        let row = self
            .conn
            .query_row(
                "SELECT job_instance_id, status FROM job_instance
                 WHERE job_name = ?1 AND job_key = ?2",
                params![job_name, job_key],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, status)| Ok((id, JobStatus::parse(&status)?)))
            .transpose()
    }

    /// Instances keyed `base` or `base;run=N`, newest first.
    pub fn job_runs(&self, job_name: &str, base: &str) -> BatchResult<Vec<(String, JobStatus)>> {
        let rows = self.query_rows(
            "SELECT job_key, status FROM job_instance
             WHERE job_name = ?1
               AND (job_key = ?2 OR substr(job_key, 1, length(?2) + 5) = ?2 || ';run=')
             ORDER BY job_instance_id DESC",
            params![job_name, base],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )?;
        rows.into_iter()
            .map(|(key, status)| JobStatus::parse(&status).map(|status| (key, status)))
            .collect()
    }

    pub fn create_job_instance(&self, job_name: &str, job_key: &str) -> BatchResult<i64> {
        self.conn.execute(
            "INSERT INTO job_instance (job_name, job_key, status) VALUES (?1, ?2, ?3)",
            params![job_name, job_key, JobStatus::Started.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_job_status(&self, job_instance_id: i64, status: JobStatus) -> BatchResult<()> {
        self.conn.execute(
            "UPDATE job_instance SET status = ?1 WHERE job_instance_id = ?2",
            params![status.as_str(), job_instance_id],
        )?;
        Ok(())
    }

    // ── Step execution ────────────────────────────────────────────

    pub fn step_execution(
        &self,
        job_instance_id: i64,
        step_name: &str,
    ) -> BatchResult<Option<StepExecution>> {
        let row = self
            .conn
            .query_row(
                "SELECT step_name, status, read_count, write_count, filter_count,
                        skip_count, commit_count
                 FROM step_execution WHERE job_instance_id = ?1 AND step_name = ?2",
                params![job_instance_id, step_name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        [
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, i64>(5)?,
                            row.get::<_, i64>(6)?,
                        ],
                    ))
                },
            )
            .optional()?;

        row.map(|(step_name, status, [read, write, filter, skip, commit])| {
            Ok(StepExecution {
                step_name,
                status:       StepStatus::parse(&status)?,
                read_count:   read as u64,
                write_count:  write as u64,
                filter_count: filter as u64,
                skip_count:   skip as u64,
                commit_count: commit as u64,
            })
        })
        .transpose()
    }

    /// Insert or overwrite the checkpoint for one step.
    pub fn save_step_execution(&self, job_instance_id: i64, exec: &StepExecution) -> BatchResult<()> {
        self.conn.execute(
            "INSERT INTO step_execution (
                job_instance_id, step_name, status, read_count, write_count,
                filter_count, skip_count, commit_count
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (job_instance_id, step_name) DO UPDATE SET
                status       = excluded.status,
                read_count   = excluded.read_count,
                write_count  = excluded.write_count,
                filter_count = excluded.filter_count,
                skip_count   = excluded.skip_count,
                commit_count = excluded.commit_count",
            params![
                job_instance_id,
                exec.step_name,
                exec.status.as_str(),
                exec.read_count as i64,
                exec.write_count as i64,
                exec.filter_count as i64,
                exec.skip_count as i64,
                exec.commit_count as i64,
            ],
        )?;
        Ok(())
    }
}
