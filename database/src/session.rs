use async_trait::async_trait;
use aocrecs_types::Table;
use sqlx::postgres::{PgConnection, Postgres};
use sqlx::sqlite::{Sqlite, SqliteConnection};
use sqlx::{Column, Connection, Executor, Statement};

use crate::queries::SqlQuery;
use crate::rows::{column_names, decode_pg_value, decode_sqlite_value, rows_to_table};
use crate::{DatabaseConfig, DatabaseError};

/// One live database connection.
#[async_trait]
pub trait Session: Send {
    async fn fetch(&mut self, query: &SqlQuery) -> Result<Table, DatabaseError>;

    /// Run statements without fetching rows; returns the rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64, DatabaseError>;

    /// Replace the current connection with a freshly opened one.
    async fn reconnect(&mut self) -> Result<(), DatabaseError>;

    /// Driver name, e.g. "PostgreSQL" or "SQLite".
    fn backend_name(&self) -> &str;
}

enum Backend {
    Postgres(PgConnection),
    Sqlite(SqliteConnection),
}

impl Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::Postgres(_) => "PostgreSQL",
            Backend::Sqlite(_) => "SQLite",
        }
    }
}

/// A [`Session`] over a Postgres or SQLite connection, picked by URL scheme.
pub struct SqlSession {
    config: DatabaseConfig,
    conn: Backend,
}

impl SqlSession {
    pub async fn connect(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        let conn = open(&config).await?;
        Ok(Self { config, conn })
    }
}

async fn open(config: &DatabaseConfig) -> Result<Backend, DatabaseError> {
    let url = config.connection_url();
    let scheme = url.split(':').next().unwrap_or_default();
    let conn = match scheme {
        "postgres" | "postgresql" => Backend::Postgres(PgConnection::connect(&url).await?),
        "sqlite" => Backend::Sqlite(SqliteConnection::connect(&url).await?),
        _ => return Err(DatabaseError::UnsupportedScheme(scheme.to_string())),
    };
    tracing::info!("Connected to {} database", conn.name());
    Ok(conn)
}

// An empty result carries no row to read the column names from, so they are
// taken from the prepared statement instead.
#[async_trait]
impl Session for SqlSession {
    async fn fetch(&mut self, query: &SqlQuery) -> Result<Table, DatabaseError> {
        tracing::debug!(
            "Fetching: {} ({} bound parameters)",
            query.sql,
            query.params.len()
        );
        match &mut self.conn {
            Backend::Postgres(conn) => {
                let rows = query.bind::<Postgres>().fetch_all(&mut *conn).await?;
                let columns = match rows.first() {
                    Some(first) => column_names(first),
                    None => {
                        let statement = Executor::prepare(&mut *conn, query.sql.as_str()).await?;
                        statement.columns().iter().map(|c| c.name().to_string()).collect()
                    }
                };
                rows_to_table(columns, &rows, decode_pg_value)
            }
            Backend::Sqlite(conn) => {
                let rows = query.bind::<Sqlite>().fetch_all(&mut *conn).await?;
                let columns = match rows.first() {
                    Some(first) => column_names(first),
                    None => {
                        let statement = Executor::prepare(&mut *conn, query.sql.as_str()).await?;
                        statement.columns().iter().map(|c| c.name().to_string()).collect()
                    }
                };
                rows_to_table(columns, &rows, decode_sqlite_value)
            }
        }
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, DatabaseError> {
        tracing::debug!("Executing: {}", sql);
        let rows_affected = match &mut self.conn {
            Backend::Postgres(conn) => {
                Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await?.rows_affected()
            }
            Backend::Sqlite(conn) => {
                Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await?.rows_affected()
            }
        };
        Ok(rows_affected)
    }

    async fn reconnect(&mut self) -> Result<(), DatabaseError> {
        self.conn = open(&self.config).await?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        self.conn.name()
    }
}
