use rusqlite::{named_params, OptionalExtension, Row};

use super::{execution_failed, prepare, DatabaseManager};
use crate::error::Result;
use crate::models::User;

/// Maps [`User`] to the `users` table, keyed by username.
pub struct UserRepository<'db> {
    db: &'db DatabaseManager,
}

impl<'db> UserRepository<'db> {
    pub(super) fn new(db: &'db DatabaseManager) -> Self {
        Self { db }
    }

    /// Inserts `user` and returns its row id. A duplicate username fails.
    pub fn create_user(&self, user: &User) -> Result<i64> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "INSERT INTO users (username, email, password_hash, role)
             VALUES (:username, :email, :password_hash, :role)",
        )?;

        stmt.execute(named_params! {
            ":username": user.username,
            ":email": user.email,
            ":password_hash": user.password_hash(),
            ":role": user.role,
        })
        .map_err(execution_failed)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, username = %user.username, "created user");
        Ok(id)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT username, email, password_hash, role FROM users WHERE username = ?1",
        )?;

        stmt.query_row([username], user_from_row)
            .optional()
            .map_err(execution_failed)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.db.connection()?;
        let mut stmt = prepare(
            conn,
            "SELECT username, email, password_hash, role FROM users ORDER BY username",
        )?;

        let users = stmt
            .query_map([], user_from_row)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(execution_failed)?;

        Ok(users)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let mut user = User::new(
        row.get::<_, String>("username")?,
        row.get::<_, String>("email")?,
        row.get("role")?,
    );
    if let Some(hash) = row.get::<_, Option<String>>("password_hash")? {
        user.set_password_hash(hash);
    }
    Ok(user)
}
