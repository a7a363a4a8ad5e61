use rusqlite::{named_params, Connection, OptionalExtension, Row};

use super::{ensure_exists, execution_failed, prepare, DatabaseManager};
use crate::error::{Error, Result};
use crate::models::Traceability;

/// Maps [`Traceability`] links to the `relationships` table.
///
/// Endpoints are requirement row ids carried as text; both must name a stored
/// requirement when the link is created.
pub struct TraceabilityRepository<'db> {
    db: &'db DatabaseManager,
}

impl<'db> TraceabilityRepository<'db> {
    pub(super) fn new(db: &'db DatabaseManager) -> Self {
        Self { db }
    }

    /// Fails with [`Error::NotFound`] unless both endpoints are stored requirements.
    pub fn create_link(&self, link: &Traceability) -> Result<i64> {
        let conn = self.db.connection()?;
        ensure_requirement(conn, link.source_id())?;
        ensure_requirement(conn, link.target_id())?;

        let mut stmt = prepare(
            conn,
            "INSERT INTO relationships (source_id, target_id, type, created_at, updated_at)
             VALUES (:source_id, :target_id, :type,
                     COALESCE(:created_at, CURRENT_TIMESTAMP),
                     COALESCE(:updated_at, CURRENT_TIMESTAMP))",
        )?;

        stmt.execute(named_params! {
            ":source_id": link.source_id(),
            ":target_id": link.target_id(),
            ":type": link.relation(),
            ":created_at": link.created_at(),
            ":updated_at": link.updated_at(),
        })
        .map_err(execution_failed)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(
            id,
            source = link.source_id(),
            target = link.target_id(),
            relation = link.relation().as_str(),
            "created traceability link"
        );
        Ok(id)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Traceability>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT source_id, target_id, type, created_at, updated_at
             FROM relationships WHERE id = ?1",
        )?;

        stmt.query_row([id], link_from_row)
            .optional()
            .map_err(execution_failed)
    }

    /// Links in which `requirement_id` is either endpoint, oldest first.
    pub fn find_for_requirement(&self, requirement_id: &str) -> Result<Vec<(i64, Traceability)>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT id, source_id, target_id, type, created_at, updated_at
             FROM relationships
             WHERE source_id = ?1 OR target_id = ?1
             ORDER BY id",
        )?;

        let links = stmt
            .query_map([requirement_id], |row| Ok((row.get("id")?, link_from_row(row)?)))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(execution_failed)?;

        Ok(links)
    }
}

fn ensure_requirement(conn: &Connection, endpoint: &str) -> Result<()> {
    let Ok(id) = endpoint.parse::<i64>() else {
        tracing::warn!(endpoint, "link endpoint is not a requirement id");
        return Err(Error::NotFound {
            entity: "requirement",
            key: endpoint.to_string(),
        });
    };
    ensure_exists(conn, "requirements", "requirement", id)
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<Traceability> {
    let mut link = Traceability::new(
        row.get::<_, String>("source_id")?,
        row.get::<_, String>("target_id")?,
        row.get("type")?,
    );
    link.set_timestamps(row.get("created_at")?, row.get("updated_at")?);
    Ok(link)
}
