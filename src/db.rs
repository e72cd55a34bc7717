use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{Result, TriageError};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::models::{Importance, Sentiment, Ticket, TicketUpdate, Urgency};
use crate::schema::tickets;
use crate::store::TicketStore;
use crate::validation::InputValidator;

/// Pool of SQLite connections
pub type DbPool = Pool<SqliteConnectionManager>;
/// A connection checked out of [`DbPool`]
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Local SQLite ticket store
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    metrics: MetricsCollector,
}

impl Database {
    /// Create a new database connection pool
    pub fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let path = InputValidator::sqlite_path(database_url)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| TriageError::Configuration(format!("cannot create {}: {e}", parent.display())))?;
            }
        }

        // Set up connection manager and pool
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(max_connections).build(manager)?;

        info!(path, "Opened SQLite ticket store");
        Self::with_pool(pool)
    }

    /// Create a private in-memory database, mainly for tests
    pub fn in_memory() -> Result<Self> {
        // one connection, otherwise every connection gets its own empty database
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::with_pool(pool)
    }

    /// Open the store described by the `store` configuration section
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(&config.sqlite_url, config.max_connections)
    }

    fn with_pool(pool: DbPool) -> Result<Self> {
        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self {
            pool,
            metrics: MetricsCollector::default(),
        })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/2026-10-01-000000_create_tickets/up.sql"))?;
        debug!("Migrations applied");
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Run a blocking query on the pool without stalling the runtime
    async fn run<T, F>(&self, operation: &'static str, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let timer = MetricsTimer::new(self.metrics, operation);

        let result = match tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            query(&conn)
        })
        .await
        {
            Ok(result) => result,
            Err(join_error) => Err(join_error.into()),
        };

        timer.finish(result.is_ok());
        result
    }

    fn select_ticket(conn: &Connection, id: Uuid) -> Result<Option<Ticket>> {
        let ticket = conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE {} = ?", select_columns(), tickets::TABLE, tickets::ID),
                params![id.to_string()],
                map_ticket,
            )
            .optional()?;
        Ok(ticket)
    }
}

#[async_trait]
impl TicketStore for Database {
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        self.run("insert", move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                    tickets::TABLE,
                    select_columns()
                ),
                params![
                    ticket.id.to_string(),
                    ticket.org_id.to_string(),
                    ticket.last_message,
                    ticket.urgency,
                    ticket.importance,
                    ticket.sentiment,
                    format_timestamp(&ticket.updated_at),
                ],
            )?;

            Self::select_ticket(conn, ticket.id)?
                .ok_or_else(|| TriageError::DataStore("inserted ticket could not be read back".to_string()))
        })
        .await
    }

    async fn recent_tickets(&self, limit: usize) -> Result<Vec<Ticket>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.run("select", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM {} ORDER BY {} DESC LIMIT ?",
                select_columns(),
                tickets::TABLE,
                tickets::UPDATED_AT
            ))?;

            let ticket_iter = stmt.query_map(params![limit], map_ticket)?;

            let mut results = Vec::new();
            for ticket in ticket_iter {
                results.push(ticket?);
            }

            Ok(results)
        })
        .await
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        self.run("select", move |conn| Self::select_ticket(conn, id)).await
    }

    async fn update_ticket(&self, id: Uuid, update: TicketUpdate) -> Result<Option<Ticket>> {
        self.run("update", move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE {} SET {} = ?, {} = ?, {} = ?, {} = ?, {} = ? WHERE {} = ?",
                    tickets::TABLE,
                    tickets::LAST_MESSAGE,
                    tickets::URGENCY,
                    tickets::IMPORTANCE,
                    tickets::SENTIMENT,
                    tickets::UPDATED_AT,
                    tickets::ID
                ),
                params![
                    update.last_message,
                    update.urgency,
                    update.importance,
                    update.sentiment,
                    format_timestamp(&update.updated_at),
                    id.to_string(),
                ],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            Self::select_ticket(conn, id)
        })
        .await
    }
}

fn select_columns() -> String {
    [
        tickets::ID,
        tickets::ORG_ID,
        tickets::LAST_MESSAGE,
        tickets::URGENCY,
        tickets::IMPORTANCE,
        tickets::SENTIMENT,
        tickets::UPDATED_AT,
    ]
    .join(", ")
}

/// Fixed-width UTC timestamps, so text order matches time order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Map a database row (in `select_columns` order) to a Ticket
fn map_ticket(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: uuid_at(row, 0)?,
        org_id: uuid_at(row, 1)?,
        last_message: row.get(2)?,
        urgency: row.get(3)?,
        importance: row.get(4)?,
        sentiment: row.get(5)?,
        updated_at: timestamp_at(row, 6)?,
    })
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl ToSql for Urgency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(*self)))
    }
}

impl FromSql for Urgency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Self::try_from(i64::column_result(value)?).map_err(|e| FromSqlError::Other(e.into()))
    }
}

impl ToSql for Importance {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(*self)))
    }
}

impl FromSql for Importance {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Self::try_from(i64::column_result(value)?).map_err(|e| FromSqlError::Other(e.into()))
    }
}

impl ToSql for Sentiment {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Sentiment {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_timestamp_text_is_fixed_width() {
        let a = Utc::now();
        let b = a + Duration::milliseconds(1);
        let (fa, fb) = (format_timestamp(&a), format_timestamp(&b));
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
    }

    #[test]
    fn test_rejects_non_sqlite_url() {
        assert!(matches!(
            Database::new("postgres://localhost/tickets", 1),
            Err(TriageError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_round_trip_in_memory() {
        let db = Database::in_memory().unwrap();
        let ticket = Ticket::open(Uuid::new_v4(), Uuid::new_v4(), Utc::now());

        let stored = db.insert_ticket(ticket.clone()).await.unwrap();
        assert_eq!(stored.id, ticket.id);
        assert_eq!(stored.scores(), ticket.scores());

        let found = db.find_ticket(ticket.id).await.unwrap();
        assert_eq!(found, Some(stored));
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let db = Database::in_memory().unwrap();
        let update = TicketUpdate::from_reply("hi".to_string(), Default::default(), Utc::now());
        assert_eq!(db.update_ticket(Uuid::new_v4(), update).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_label_is_a_store_error() {
        let db = Database::in_memory().unwrap();
        let ticket = db
            .insert_ticket(Ticket::open(Uuid::new_v4(), Uuid::new_v4(), Utc::now()))
            .await
            .unwrap();

        // bypass the CHECK constraint to simulate a row written by another client
        let conn = db.get_connection().unwrap();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON").unwrap();
        conn.execute("UPDATE tickets SET urgency = 7 WHERE id = ?", params![ticket.id.to_string()])
            .unwrap();
        drop(conn);

        assert!(matches!(db.find_ticket(ticket.id).await, Err(TriageError::DataStore(_))));
    }
}
