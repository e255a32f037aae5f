use aocrecs_types::TableError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No database configured: pass a URL, set DATABASE_URL or give a config file")]
    MissingConfig,

    #[error("Unsupported config file format: {0}")]
    ConfigFormat(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Cannot splice a LIMIT into query: {0}")]
    InvalidLimitQuery(String),

    #[error("Unsupported database URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("LIMIT out of range: {0}")]
    LimitOutOfRange(u64),

    #[error("Column {column} has a type this driver cannot decode: {type_name}")]
    UnsupportedColumnType { column: String, type_name: String },
}

impl DatabaseError {
    /// True for failures caused by a lost or unusable connection, the only
    /// kind a reconnect can fix.
    ///
    /// Interface failures are I/O, TLS and protocol errors; operational
    /// failures are the pool and worker errors.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sql(
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_recoverable() {
        let broken_pipe = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        assert!(DatabaseError::from(sqlx::Error::Io(broken_pipe)).is_connection_error());
        assert!(DatabaseError::from(sqlx::Error::PoolTimedOut).is_connection_error());
        assert!(DatabaseError::from(sqlx::Error::Protocol("eof".into())).is_connection_error());
    }

    #[test]
    fn test_other_errors_are_not_recoverable() {
        assert!(!DatabaseError::from(sqlx::Error::RowNotFound).is_connection_error());
        assert!(!DatabaseError::MissingConfig.is_connection_error());
        assert!(
            !DatabaseError::from(TableError::UnknownColumn("id".into())).is_connection_error()
        );
    }
}
