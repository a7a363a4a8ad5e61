use std::sync::Arc;

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::User;
use crate::error::{Error, Result};

/// A project owned by one user and shared with an ordered list of collaborators.
///
/// Users are shared between projects, so both the owner and the collaborators
/// are held by reference. The JSON form only carries usernames; decoding needs
/// a lookup to turn them back into users.
///
/// # Invariants
/// - The owner is never listed as a collaborator.
/// - Collaborator usernames are unique within a project.
#[derive(Debug, Clone)]
pub struct Project {
    title: String,
    description: String,
    owner: Arc<User>,
    collaborators: Vec<Arc<User>>,
    created_at: DateTime<Utc>,
}

/// Wire shape of a project document.
#[derive(Debug, Deserialize)]
struct ProjectDocument {
    title: String,
    description: String,
    owner: String,
    created_at: i64,
    collaborators: Vec<String>,
}

impl Project {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        owner: Arc<User>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            owner,
            collaborators: Vec::new(),
            // The document stores whole seconds.
            created_at: Utc::now().trunc_subsecs(0),
        }
    }

    pub(crate) fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn owner(&self) -> &Arc<User> {
        &self.owner
    }

    pub fn collaborators(&self) -> &[Arc<User>] {
        &self.collaborators
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Adds `user` to the end of the collaborator list.
    ///
    /// Returns false if `user` owns the project or already collaborates on it.
    pub fn add_collaborator(&mut self, user: Arc<User>) -> bool {
        if user.username == self.owner.username {
            tracing::warn!(
                project = %self.title,
                "attempted to add project owner as collaborator"
            );
            return false;
        }

        if self
            .collaborators
            .iter()
            .any(|c| c.username == user.username)
        {
            tracing::info!(
                project = %self.title,
                username = %user.username,
                "user is already a collaborator"
            );
            return false;
        }

        self.collaborators.push(user);
        true
    }

    /// Returns false if `username` is not a collaborator.
    pub fn remove_collaborator(&mut self, username: &str) -> bool {
        let Some(pos) = self
            .collaborators
            .iter()
            .position(|c| c.username == username)
        else {
            tracing::info!(project = %self.title, username, "user is not a collaborator");
            return false;
        };

        self.collaborators.remove(pos);
        true
    }

    /// The owner always counts as a collaborator.
    pub fn is_collaborator(&self, username: &str) -> bool {
        self.owner.username == username
            || self.collaborators.iter().any(|c| c.username == username)
    }

    pub fn to_json(&self) -> Value {
        let collaborators: Vec<&str> = self
            .collaborators
            .iter()
            .map(|c| c.username.as_str())
            .collect();

        json!({
            "title": self.title,
            "description": self.description,
            "owner": self.owner.username,
            "created_at": self.created_at.timestamp(),
            "collaborators": collaborators,
        })
    }

    /// Decodes a project, resolving usernames through `lookup`.
    ///
    /// An unresolvable owner fails the whole decode. Unresolvable collaborators
    /// are skipped.
    pub fn from_json<F>(value: &Value, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<Arc<User>>,
    {
        let doc: ProjectDocument = super::decode(value, "project")?;

        let Some(owner) = lookup(&doc.owner) else {
            tracing::error!(owner = %doc.owner, "failed to find project owner");
            return Err(Error::UnresolvedReference {
                role: "owner",
                username: doc.owner,
            });
        };

        let created_at = Utc
            .timestamp_opt(doc.created_at, 0)
            .single()
            .ok_or_else(|| Error::MalformedInput {
                entity: "project",
                source: serde::de::Error::custom(format!(
                    "created_at out of range: {}",
                    doc.created_at
                )),
            })?;

        let mut project =
            Project::new(doc.title, doc.description, owner).with_created_at(created_at);

        for username in &doc.collaborators {
            match lookup(username) {
                Some(user) => {
                    project.add_collaborator(user);
                }
                None => {
                    tracing::warn!(username = %username, "failed to find collaborator, skipping")
                }
            }
        }

        Ok(project)
    }
}
