use thiserror::Error;

/// Errors surfaced by the domain model and the persistence layer.
///
/// Point lookups report a missing row as `Ok(None)`; the variants here are
/// reserved for conditions the caller has to react to.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to prepare statement: {0}")]
    Prepare(#[source] rusqlite::Error),

    #[error("failed to execute statement: {0}")]
    Execute(#[source] rusqlite::Error),

    #[error("failed to apply migration {version} ({name}): {source}")]
    Migration {
        version: &'static str,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database connection is closed")]
    Closed,

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("malformed {entity} document: {source}")]
    MalformedInput {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unresolved {role} reference: {username}")]
    UnresolvedReference { role: &'static str, username: String },

    #[error("invalid {kind} ordinal: {value}")]
    InvalidOrdinal { kind: &'static str, value: i64 },

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
