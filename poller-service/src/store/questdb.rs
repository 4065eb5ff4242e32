use std::time::Duration;

use async_trait::async_trait;
use gdb_client::domain::{SeriesId, SeriesPoint};
use sqlx::{postgres::PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::store::{SeriesSum, StatisticsStore, StoreError};
use crate::MergePlan;

/// Statistics store backed by QuestDB over the Postgres wire protocol.
///
/// Writes go through a single transaction covering all three series
/// and are retried with linear backoff; a failed transaction leaves
/// nothing behind, so retrying cannot double-append.
pub struct QuestDbStore {
    pool: PgPool,
    max_retries: u32,
    retry_backoff: Duration,
}

impl QuestDbStore {
    pub fn new(pool: PgPool, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            pool,
            max_retries,
            retry_backoff,
        }
    }

    async fn insert_plan(&self, plan: &MergePlan) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for id in SeriesId::ALL {
            let points = plan.series(id);
            if points.is_empty() {
                continue;
            }

            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO utility_statistics (series_id, ts, value, cumulative_sum) ",
            );
            builder.push_values(points, |mut b, p| {
                b.push_bind(id.as_str())
                    .push_bind(p.start)
                    .push_bind(p.value)
                    .push_bind(p.sum);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await
    }
}

#[async_trait]
impl StatisticsStore for QuestDbStore {
    async fn last_point(&self, series: SeriesId) -> Result<Option<SeriesPoint>, StoreError> {
        sqlx::query_as::<_, SeriesPoint>(
            r#"
            SELECT
                ts AS start,
                value,
                cumulative_sum AS sum
            FROM utility_statistics
            WHERE series_id = $1
            ORDER BY ts DESC
            LIMIT 1
            "#,
        )
        .bind(series.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn sum_during_period(
        &self,
        series: SeriesId,
        from: OffsetDateTime,
        to: Option<OffsetDateTime>,
    ) -> Result<Option<SeriesSum>, StoreError> {
        sqlx::query_as::<_, SeriesSum>(
            r#"
            SELECT
                value,
                cumulative_sum AS sum
            FROM utility_statistics
            WHERE series_id = $1
              AND ts >= $2
              AND ($3::timestamptz IS NULL OR ts <= $3)
            ORDER BY ts
            LIMIT 1
            "#,
        )
        .bind(series.as_str())
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn append_plan(&self, plan: &MergePlan) -> Result<(), StoreError> {
        if plan.is_empty() {
            return Ok(());
        }

        let mut attempt: u32 = 0;
        loop {
            match self.insert_plan(plan).await {
                Ok(()) => {
                    metrics::counter!("statistics_points_appended_total")
                        .increment((plan.len() * SeriesId::ALL.len()) as u64);
                    return Ok(());
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let sleep_for = self.retry_backoff * attempt;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        "statistics append failed, retrying with backoff"
                    );
                    tokio::time::sleep(sleep_for).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "statistics append failed, giving up");
                    metrics::counter!("statistics_store_errors_total").increment(1);
                    return Err(StoreError::Unavailable(e.to_string()));
                }
            }
        }
    }
}
