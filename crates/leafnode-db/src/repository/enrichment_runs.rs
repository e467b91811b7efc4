//! Enrichment run history

use sqlx::Row;

use crate::error::DbError;
use crate::models::{EnrichmentRun, NewEnrichmentRun};
use crate::repository::Database;
use crate::utils::format_timestamp;

impl Database {
    /// Record a finished job run
    pub async fn insert_enrichment_run(&self, run: NewEnrichmentRun) -> Result<EnrichmentRun, DbError> {
        let errors = serde_json::to_string(&run.errors)?;
        let result = sqlx::query(
            r#"
            INSERT INTO enrichment_runs (job, started_at, finished_at, processed, successful, failed, skipped, aborted, errors, scoped)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&run.job)
        .bind(format_timestamp(run.started_at))
        .bind(format_timestamp(run.finished_at))
        .bind(run.processed)
        .bind(run.successful)
        .bind(run.failed)
        .bind(run.skipped)
        .bind(run.aborted)
        .bind(&errors)
        .bind(run.scoped)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(EnrichmentRun {
            id,
            job: run.job,
            started_at: run.started_at,
            finished_at: run.finished_at,
            processed: run.processed,
            successful: run.successful,
            failed: run.failed,
            skipped: run.skipped,
            aborted: run.aborted,
            errors: run.errors,
            scoped: run.scoped,
        })
    }

    /// Most recent runs first, optionally for one job
    pub async fn list_enrichment_runs(
        &self,
        job: Option<&str>,
        limit: i64,
    ) -> Result<Vec<EnrichmentRun>, DbError> {
        let where_clause = if job.is_some() { "WHERE job = ?" } else { "" };
        let sql = format!(
            r#"
            SELECT id, job, started_at, finished_at, processed, successful, failed, skipped, aborted, errors, scoped
            FROM enrichment_runs
            {}
            ORDER BY started_at DESC, id DESC
            LIMIT ?
            "#,
            where_clause
        );

        let mut query = sqlx::query(&sql);
        if let Some(job) = job {
            query = query.bind(job);
        }
        let rows = query.bind(limit).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| EnrichmentRun::try_from(row).map_err(DbError::from))
            .collect()
    }
}
