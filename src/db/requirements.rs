use rusqlite::{named_params, OptionalExtension, Row};

use super::{ensure_exists, execution_failed, prepare, DatabaseManager};
use crate::error::Result;
use crate::models::Requirement;

/// Maps [`Requirement`] to the `requirements` table.
///
/// Projects group requirements through `project_requirements`.
pub struct RequirementRepository<'db> {
    db: &'db DatabaseManager,
}

impl<'db> RequirementRepository<'db> {
    pub(super) fn new(db: &'db DatabaseManager) -> Self {
        Self { db }
    }

    /// Inserts every field of `requirement` and returns the assigned id.
    ///
    /// Unset timestamps take the store's current time.
    pub fn create_requirement(&self, requirement: &Requirement) -> Result<i64> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "INSERT INTO requirements
                 (title, description, status, priority, assignee, created_at, updated_at)
             VALUES (:title, :description, :status, :priority, :assignee,
                     COALESCE(:created_at, CURRENT_TIMESTAMP),
                     COALESCE(:updated_at, CURRENT_TIMESTAMP))",
        )?;

        stmt.execute(named_params! {
            ":title": requirement.title,
            ":description": requirement.description,
            ":status": requirement.status,
            ":priority": requirement.priority,
            ":assignee": requirement.assignee,
            ":created_at": requirement.created_at,
            ":updated_at": requirement.updated_at,
        })
        .map_err(execution_failed)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, title = %requirement.title, "created requirement");
        Ok(id)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Requirement>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT title, description, status, priority, assignee, created_at, updated_at
             FROM requirements WHERE id = ?1",
        )?;

        stmt.query_row([id], requirement_from_row)
            .optional()
            .map_err(execution_failed)
    }

    pub fn list_requirements(&self) -> Result<Vec<(i64, Requirement)>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT id, title, description, status, priority, assignee, created_at, updated_at
             FROM requirements ORDER BY id",
        )?;

        let requirements = stmt
            .query_map([], |row| Ok((row.get("id")?, requirement_from_row(row)?)))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(execution_failed)?;

        Ok(requirements)
    }

    /// Attaches a requirement to a project. Linking twice is a no-op.
    pub fn link_to_project(&self, project_id: i64, requirement_id: i64) -> Result<()> {
        let conn = self.db.connection()?;
        ensure_exists(conn, "projects", "project", project_id)?;
        ensure_exists(conn, "requirements", "requirement", requirement_id)?;

        let mut stmt = prepare(
            conn,
            "INSERT OR IGNORE INTO project_requirements (project_id, requirement_id)
             VALUES (:project_id, :requirement_id)",
        )?;
        stmt.execute(named_params! {
            ":project_id": project_id,
            ":requirement_id": requirement_id,
        })
        .map_err(execution_failed)?;

        Ok(())
    }

    pub fn find_by_project(&self, project_id: i64) -> Result<Vec<(i64, Requirement)>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT r.id AS id, r.title AS title, r.description AS description,
                    r.status AS status, r.priority AS priority, r.assignee AS assignee,
                    r.created_at AS created_at, r.updated_at AS updated_at
             FROM requirements r
             JOIN project_requirements pr ON r.id = pr.requirement_id
             WHERE pr.project_id = ?1
             ORDER BY r.id",
        )?;

        let requirements = stmt
            .query_map([project_id], |row| Ok((row.get("id")?, requirement_from_row(row)?)))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(execution_failed)?;

        Ok(requirements)
    }
}

fn requirement_from_row(row: &Row<'_>) -> rusqlite::Result<Requirement> {
    Ok(Requirement {
        title: row.get("title")?,
        description: row.get("description")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        assignee: row.get("assignee")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
