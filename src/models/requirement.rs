use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;

/// A single requirement.
///
/// Only the title and description are set on construction; the remaining
/// attributes stay unset until assigned. Timestamps are opaque strings as
/// produced by the store and are never parsed.
///
/// Identity is assigned by the store (see
/// [`RequirementRepository`](crate::db::RequirementRepository)), not carried here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Requirement {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Requirement {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "title": self.title,
            "description": self.description,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
            "status": self.status,
            "priority": self.priority,
            "assignee": self.assignee,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        super::decode(value, "requirement")
    }
}
