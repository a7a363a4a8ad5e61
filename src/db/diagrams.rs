use rusqlite::{named_params, OptionalExtension, Row};

use super::{execution_failed, prepare, DatabaseManager};
use crate::error::Result;
use crate::models::UmlDiagram;

pub struct DiagramRepository<'db> {
    db: &'db DatabaseManager,
}

impl<'db> DiagramRepository<'db> {
    pub(super) fn new(db: &'db DatabaseManager) -> Self {
        Self { db }
    }

    pub fn create_diagram(&self, diagram: &UmlDiagram) -> Result<i64> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "INSERT INTO uml_diagrams (name, type, content, created_at, updated_at)
             VALUES (:name, :type, :content,
                     COALESCE(:created_at, CURRENT_TIMESTAMP),
                     COALESCE(:updated_at, CURRENT_TIMESTAMP))",
        )?;

        stmt.execute(named_params! {
            ":name": diagram.name,
            ":type": diagram.kind,
            ":content": diagram.content,
            ":created_at": diagram.created_at,
            ":updated_at": diagram.updated_at,
        })
        .map_err(execution_failed)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, name = %diagram.name, kind = diagram.kind.as_str(), "created diagram");
        Ok(id)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<UmlDiagram>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT name, type, content, created_at, updated_at FROM uml_diagrams WHERE id = ?1",
        )?;

        stmt.query_row([id], diagram_from_row)
            .optional()
            .map_err(execution_failed)
    }
}

fn diagram_from_row(row: &Row<'_>) -> rusqlite::Result<UmlDiagram> {
    Ok(UmlDiagram {
        name: row.get("name")?,
        kind: row.get("type")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
