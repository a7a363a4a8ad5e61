mod diagrams;
mod projects;
mod requirements;
mod schema;
mod sql;
mod traceability;
mod users;

pub use diagrams::DiagramRepository;
pub use projects::ProjectRepository;
pub use requirements::RequirementRepository;
pub use traceability::TraceabilityRepository;
pub use users::UserRepository;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Statement};

use crate::config::{self, Config};
use crate::error::{Error, Result};

/// Path that selects an ephemeral, in-memory store.
pub const MEMORY_PATH: &str = ":memory:";

/// Owner of the single connection to the store.
///
/// Repositories borrow the manager, so they cannot outlive it. The
/// connection is `Send` but not `Sync`: sharing a manager between threads
/// takes an external mutex.
pub struct DatabaseManager {
    conn: Option<Connection>,
    path: PathBuf,
}

impl DatabaseManager {
    /// Opens (or creates) the store at `path` and brings its schema up to date.
    pub fn initialize(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::open(path)?;
        db.migrate()?;
        Ok(db)
    }

    /// Opens the store described by `config` and migrates it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Self::open_with(&config.database_path, config.wal_mode)?;
        db.migrate()?;
        Ok(db)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), true)
    }

    pub fn open_default() -> Result<Self> {
        Self::open(config::default_database_path())
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| {
            tracing::error!(error = %source, "can't open in-memory database");
            Error::Open {
                path: MEMORY_PATH.to_string(),
                source,
            }
        })?;
        Self::configure(conn, PathBuf::from(MEMORY_PATH))
    }

    fn open_with(path: &Path, wal_mode: bool) -> Result<Self> {
        if path == Path::new(MEMORY_PATH) {
            return Self::open_memory();
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "can't open database");
            Error::Open {
                path: path.display().to_string(),
                source,
            }
        })?;

        if wal_mode {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(execution_failed)?;
            tracing::debug!(journal_mode = %mode, "journal mode set");
        }

        Self::configure(conn, path.to_path_buf())
    }

    fn configure(conn: Connection, path: PathBuf) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(execution_failed)?;
        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    /// Creates any missing schema objects. Repeated calls are no-ops.
    pub fn migrate(&self) -> Result<()> {
        schema::run_migrations(self.connection()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Releases the connection. Closing an already closed manager does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        conn.close().map_err(|(conn, source)| {
            tracing::error!(error = %source, "failed to close database");
            self.conn = Some(conn);
            Error::Execute(source)
        })
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    pub fn projects(&self) -> ProjectRepository<'_> {
        ProjectRepository::new(self)
    }

    pub fn requirements(&self) -> RequirementRepository<'_> {
        RequirementRepository::new(self)
    }

    pub fn diagrams(&self) -> DiagramRepository<'_> {
        DiagramRepository::new(self)
    }

    pub fn traceability(&self) -> TraceabilityRepository<'_> {
        TraceabilityRepository::new(self)
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }
}

fn prepare<'c>(conn: &'c Connection, sql: &str) -> Result<Statement<'c>> {
    conn.prepare(sql).map_err(|source| {
        tracing::error!(error = %source, "failed to prepare statement");
        Error::Prepare(source)
    })
}

fn execution_failed(source: rusqlite::Error) -> Error {
    tracing::error!(error = %source, "failed to execute statement");
    Error::Execute(source)
}

/// Fails with [`Error::NotFound`] unless `table` holds a row with `id`.
fn ensure_exists(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> Result<()> {
    let exists: bool = conn
        .query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
            [id],
            |row| row.get(0),
        )
        .map_err(execution_failed)?;

    if exists {
        Ok(())
    } else {
        Err(Error::NotFound {
            entity,
            key: id.to_string(),
        })
    }
}
