use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::{named_params, Connection, OptionalExtension};

use super::{execution_failed, prepare, DatabaseManager};
use crate::error::{Error, Result};
use crate::models::Project;

/// Maps [`Project`] to `projects` plus its ordered `project_collaborators`.
///
/// Users are stored once in `users`; projects refer to them by username and
/// are re-linked on load.
pub struct ProjectRepository<'db> {
    db: &'db DatabaseManager,
}

/// Position of `created_at` in the project `SELECT` lists.
const CREATED_AT_COLUMN: usize = 4;

struct ProjectRow {
    id: i64,
    title: String,
    description: String,
    owner: String,
    created_at: i64,
}

impl<'db> ProjectRepository<'db> {
    pub(super) fn new(db: &'db DatabaseManager) -> Self {
        Self { db }
    }

    /// Inserts the project and its collaborator list atomically, returning the project id.
    ///
    /// The owner and every collaborator must already exist as users.
    pub fn create_project(&self, project: &Project) -> Result<i64> {
        let conn = self.db.connection()?;
        let tx = conn.unchecked_transaction().map_err(execution_failed)?;

        let id = {
            let mut stmt = prepare(
                &tx,
                "INSERT INTO projects (title, description, owner_username, created_at)
                 VALUES (:title, :description, :owner, :created_at)",
            )?;
            stmt.execute(named_params! {
                ":title": project.title(),
                ":description": project.description(),
                ":owner": project.owner().username,
                ":created_at": project.created_at().timestamp(),
            })
            .map_err(execution_failed)?;
            tx.last_insert_rowid()
        };

        {
            let mut stmt = prepare(
                &tx,
                "INSERT INTO project_collaborators (project_id, username, position)
                 VALUES (:project_id, :username, :position)",
            )?;
            for (position, user) in project.collaborators().iter().enumerate() {
                stmt.execute(named_params! {
                    ":project_id": id,
                    ":username": user.username,
                    ":position": position as i64,
                })
                .map_err(execution_failed)?;
            }
        }

        tx.commit().map_err(execution_failed)?;
        tracing::debug!(id, title = %project.title(), "created project");
        Ok(id)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT id, title, description, owner_username, created_at
             FROM projects WHERE id = ?1",
        )?;

        let row = stmt
            .query_row([id], |row| {
                Ok(ProjectRow {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    description: row.get("description")?,
                    owner: row.get("owner_username")?,
                    created_at: row.get("created_at")?,
                })
            })
            .optional()
            .map_err(execution_failed)?;

        match row {
            Some(row) => self.assemble(conn, row).map(Some),
            None => Ok(None),
        }
    }

    /// All projects owned by `username`, with their ids, oldest first.
    pub fn find_by_owner(&self, username: &str) -> Result<Vec<(i64, Project)>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT id, title, description, owner_username, created_at
             FROM projects WHERE owner_username = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map([username], |row| {
                Ok(ProjectRow {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    description: row.get("description")?,
                    owner: row.get("owner_username")?,
                    created_at: row.get("created_at")?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(execution_failed)?;

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                self.assemble(conn, row).map(|project| (id, project))
            })
            .collect()
    }

    fn collaborator_usernames(&self, conn: &Connection, project_id: i64) -> Result<Vec<String>> {
        let mut stmt = prepare(
            conn,
            "SELECT username FROM project_collaborators
             WHERE project_id = ?1 ORDER BY position",
        )?;

        let usernames = stmt
            .query_map([project_id], |row| row.get("username"))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<String>>>())
            .map_err(execution_failed)?;

        Ok(usernames)
    }

    fn assemble(&self, conn: &Connection, row: ProjectRow) -> Result<Project> {
        let users = self.db.users();

        let Some(owner) = users.find_by_username(&row.owner)? else {
            tracing::error!(project = row.id, owner = %row.owner, "failed to find project owner");
            return Err(Error::UnresolvedReference {
                role: "owner",
                username: row.owner,
            });
        };

        let Some(created_at) = Utc.timestamp_opt(row.created_at, 0).single() else {
            tracing::error!(
                project = row.id,
                created_at = row.created_at,
                "stored project timestamp is out of range"
            );
            return Err(Error::Execute(rusqlite::Error::IntegralValueOutOfRange(
                CREATED_AT_COLUMN,
                row.created_at,
            )));
        };

        let mut project =
            Project::new(row.title, row.description, Arc::new(owner)).with_created_at(created_at);

        for username in self.collaborator_usernames(conn, row.id)? {
            match users.find_by_username(&username)? {
                Some(user) => {
                    project.add_collaborator(Arc::new(user));
                }
                None => tracing::warn!(
                    project = row.id,
                    username = %username,
                    "failed to find collaborator, skipping"
                ),
            }
        }

        Ok(project)
    }
}
