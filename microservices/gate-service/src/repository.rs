//! Gate log persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{HearthError, Result};
use hearth_db::{DbError, DbPool, PgError, Row};
use parking_lot::Mutex;
use tracing::instrument;

use crate::types::{GateAction, GateLogEntry};

#[async_trait]
pub trait GateLogRepository: Send + Sync {
    async fn record(&self, action: GateAction, user_id: Option<&str>) -> Result<()>;

    /// Newest first
    async fn recent(&self, limit: i64) -> Result<Vec<GateLogEntry>>;

    async fn is_healthy(&self) -> bool;
}

/// `gate_log` table in PostgreSQL
pub struct PgGateLogRepository {
    pool: DbPool,
}

impl PgGateLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: PgError) -> HearthError {
    DbError::from(e).into()
}

fn entry_from_row(row: &Row) -> Result<GateLogEntry> {
    let action: String = row.try_get("action").map_err(db_err)?;
    let action = action
        .parse()
        .map_err(|_| HearthError::Database(format!("Unknown gate action in log: {}", action)))?;

    Ok(GateLogEntry {
        id: row.try_get("id").map_err(db_err)?,
        action,
        user_id: row.try_get("user_id").map_err(db_err)?,
        timestamp: row.try_get::<_, DateTime<Utc>>("timestamp").map_err(db_err)?,
    })
}

#[async_trait]
impl GateLogRepository for PgGateLogRepository {
    #[instrument(skip(self))]
    async fn record(&self, action: GateAction, user_id: Option<&str>) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute(
            "INSERT INTO gate_log (action, user_id) VALUES ($1, $2)",
            &[&action.as_str(), &user_id],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<GateLogEntry>> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT id::bigint AS id, action, user_id::text AS user_id, \
                 \"timestamp\"::timestamptz AS \"timestamp\" \
                 FROM gate_log ORDER BY \"timestamp\" DESC LIMIT $1",
                &[&limit],
            )
            .await
            .map_err(db_err)?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }
}

/// Process-local log, used in tests and when `GATE_STORAGE=memory`
#[derive(Default)]
pub struct InMemoryGateLogRepository {
    entries: Mutex<Vec<GateLogEntry>>,
}

impl InMemoryGateLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl InMemoryGateLogRepository {
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[async_trait]
impl GateLogRepository for InMemoryGateLogRepository {
    async fn record(&self, action: GateAction, user_id: Option<&str>) -> Result<()> {
        let mut entries = self.entries.lock();
        let id = entries.len() as i64 + 1;
        entries.push(GateLogEntry {
            id,
            action,
            user_id: user_id.map(str::to_string),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<GateLogEntry>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.entries.lock().iter().rev().take(limit).cloned().collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
