//! Telemetry persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{HearthError, Result};
use hearth_db::{DbError, DbPool, PgError, Row};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::instrument;

use crate::types::{MetricStats, NewTelemetry, TelemetryFilter, TelemetryRecord};

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    async fn insert(&self, record: NewTelemetry) -> Result<TelemetryRecord>;

    /// Newest first, at most `filter.limit` records
    async fn list(&self, filter: &TelemetryFilter) -> Result<Vec<TelemetryRecord>>;

    /// Ordered by device id, then metric type
    async fn stats(&self, device_id: Option<&str>) -> Result<Vec<MetricStats>>;

    async fn is_healthy(&self) -> bool;
}

fn db_err(e: PgError) -> HearthError {
    DbError::from(e).into()
}

const RECORD_COLUMNS: &str = "id::bigint AS id, device_id, metric_type, value::float8 AS value, \
                              unit, created_at::timestamptz AS created_at";

fn record_from_row(row: &Row) -> Result<TelemetryRecord> {
    Ok(TelemetryRecord {
        id: row.try_get("id").map_err(db_err)?,
        device_id: row.try_get("device_id").map_err(db_err)?,
        metric_type: row.try_get("metric_type").map_err(db_err)?,
        value: row.try_get("value").map_err(db_err)?,
        unit: row.try_get("unit").map_err(db_err)?,
        created_at: row.try_get::<_, DateTime<Utc>>("created_at").map_err(db_err)?,
    })
}

fn stats_from_row(row: &Row) -> Result<MetricStats> {
    Ok(MetricStats {
        device_id: row.try_get("device_id").map_err(db_err)?,
        metric_type: row.try_get("metric_type").map_err(db_err)?,
        count: row.try_get("count").map_err(db_err)?,
        avg_value: row.try_get("avg_value").map_err(db_err)?,
        min_value: row.try_get("min_value").map_err(db_err)?,
        max_value: row.try_get("max_value").map_err(db_err)?,
        last_recorded: row.try_get::<_, DateTime<Utc>>("last_recorded").map_err(db_err)?,
    })
}

/// `telemetry` table in PostgreSQL
pub struct PgTelemetryRepository {
    pool: DbPool,
}

impl PgTelemetryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetryRepository for PgTelemetryRepository {
    #[instrument(skip(self), fields(device_id = %record.device_id, metric_type = %record.metric_type))]
    async fn insert(&self, record: NewTelemetry) -> Result<TelemetryRecord> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO telemetry (device_id, metric_type, value, unit, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            RECORD_COLUMNS
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[&record.device_id, &record.metric_type, &record.value, &record.unit, &Utc::now()],
            )
            .await
            .map_err(db_err)?;

        record_from_row(&row)
    }

    async fn list(&self, filter: &TelemetryFilter) -> Result<Vec<TelemetryRecord>> {
        let conn = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM telemetry \
             WHERE ($1::text IS NULL OR device_id = $1) \
               AND ($2::text IS NULL OR metric_type = $2) \
             ORDER BY created_at DESC LIMIT $3",
            RECORD_COLUMNS
        );
        let rows = conn
            .query(sql.as_str(), &[&filter.device_id, &filter.metric_type, &filter.limit])
            .await
            .map_err(db_err)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn stats(&self, device_id: Option<&str>) -> Result<Vec<MetricStats>> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT device_id, metric_type, \
                        COUNT(*)::bigint AS count, \
                        AVG(value)::float8 AS avg_value, \
                        MIN(value)::float8 AS min_value, \
                        MAX(value)::float8 AS max_value, \
                        MAX(created_at)::timestamptz AS last_recorded \
                 FROM telemetry \
                 WHERE ($1::text IS NULL OR device_id = $1) \
                 GROUP BY device_id, metric_type \
                 ORDER BY device_id, metric_type",
                &[&device_id],
            )
            .await
            .map_err(db_err)?;

        rows.iter().map(stats_from_row).collect()
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }
}

/// Process-local store, used in tests and when `TELEMETRY_STORAGE=memory`
#[derive(Default)]
pub struct InMemoryTelemetryRepository {
    records: Mutex<Vec<TelemetryRecord>>,
}

impl InMemoryTelemetryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl InMemoryTelemetryRepository {
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl TelemetryRepository for InMemoryTelemetryRepository {
    async fn insert(&self, record: NewTelemetry) -> Result<TelemetryRecord> {
        let mut records = self.records.lock();
        let stored = TelemetryRecord {
            id: records.len() as i64 + 1,
            device_id: record.device_id,
            metric_type: record.metric_type,
            value: record.value,
            unit: record.unit,
            created_at: Utc::now(),
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, filter: &TelemetryFilter) -> Result<Vec<TelemetryRecord>> {
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        // Insertion order is creation order
        Ok(self
            .records
            .lock()
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stats(&self, device_id: Option<&str>) -> Result<Vec<MetricStats>> {
        let records = self.records.lock();
        let mut groups: BTreeMap<(&str, &str), Vec<&TelemetryRecord>> = BTreeMap::new();
        for record in records.iter().filter(|r| device_id.map_or(true, |d| d == r.device_id)) {
            groups
                .entry((record.device_id.as_str(), record.metric_type.as_str()))
                .or_default()
                .push(record);
        }

        Ok(groups
            .into_iter()
            .filter_map(|((device_id, metric_type), group)| {
                let last_recorded = group.iter().map(|r| r.created_at).max()?;
                let count = group.len();
                let sum: f64 = group.iter().map(|r| r.value).sum();
                Some(MetricStats {
                    device_id: device_id.to_string(),
                    metric_type: metric_type.to_string(),
                    count: count as i64,
                    avg_value: sum / count as f64,
                    min_value: group.iter().map(|r| r.value).fold(f64::INFINITY, f64::min),
                    max_value: group.iter().map(|r| r.value).fold(f64::NEG_INFINITY, f64::max),
                    last_recorded,
                })
            })
            .collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
