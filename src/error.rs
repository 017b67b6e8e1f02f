use std::path::PathBuf;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fehler des Migrationslaufs. Alle Varianten sind fatal, es gibt kein Rollback.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Table store oder object store hat den Aufruf abgelehnt
    #[error("{operation} failed")]
    RemoteCall {
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("{operation} returned no {field}")]
    MissingField {
        operation: String,
        field: &'static str,
    },

    #[error("batch write to {table} left {count} unprocessed items")]
    UnprocessedItems { table: String, count: usize },

    #[error("delete in bucket {bucket} rejected {count} keys, first: {key}: {message}")]
    DeleteRejected {
        bucket: String,
        key: String,
        message: String,
        count: usize,
    },

    #[error("malformed export artifact: {0}")]
    MalformedArtifact(String),

    #[error("export artifact {path}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to load configuration")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MigrationError {
    pub fn remote<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RemoteCall {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn artifact(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Artifact {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
