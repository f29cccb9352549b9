use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct JobRun {
    pub job_name: String,
    pub last_run_at: DateTime<Utc>,
    pub last_outcome: String,
    pub affected: i64,
}

pub async fn last_run<'e, E>(executor: E, job_name: &str) -> Result<Option<JobRun>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, JobRun>(
        r#"
        SELECT job_name, last_run_at, last_outcome, affected
        FROM job_runs
        WHERE job_name = $1
        "#,
    )
    .bind(job_name)
    .fetch_optional(executor)
    .await
}

pub async fn record_run<'e, E>(
    executor: E,
    job_name: &str,
    at: DateTime<Utc>,
    outcome: &str,
    affected: i64,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO job_runs (job_name, last_run_at, last_outcome, affected)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (job_name) DO UPDATE
        SET last_run_at = EXCLUDED.last_run_at,
            last_outcome = EXCLUDED.last_outcome,
            affected = EXCLUDED.affected
        "#,
    )
    .bind(job_name)
    .bind(at)
    .bind(outcome)
    .bind(affected)
    .execute(executor)
    .await?;
    Ok(())
}
