use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// A directed link from one requirement to another.
///
/// Endpoints and kind are fixed at construction; only the timestamps change.
/// A link whose source equals its target is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Traceability {
    source_id: String,
    target_id: String,
    #[serde(rename = "type")]
    relation: RelationType,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// Semantic kind of a [`Traceability`] link, serialized as its ordinal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "i64", try_from = "i64")]
pub enum RelationType {
    DependsOn,
    DerivedFrom,
    Implements,
    Verifies,
    Refines,
    ConflictsWith,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DependsOn => "depends_on",
            Self::DerivedFrom => "derived_from",
            Self::Implements => "implements",
            Self::Verifies => "verifies",
            Self::Refines => "refines",
            Self::ConflictsWith => "conflicts_with",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "depends_on" => Some(Self::DependsOn),
            "derived_from" => Some(Self::DerivedFrom),
            "implements" => Some(Self::Implements),
            "verifies" => Some(Self::Verifies),
            "refines" => Some(Self::Refines),
            "conflicts_with" => Some(Self::ConflictsWith),
            _ => None,
        }
    }
}

impl From<RelationType> for i64 {
    fn from(relation: RelationType) -> Self {
        match relation {
            RelationType::DependsOn => 0,
            RelationType::DerivedFrom => 1,
            RelationType::Implements => 2,
            RelationType::Verifies => 3,
            RelationType::Refines => 4,
            RelationType::ConflictsWith => 5,
        }
    }
}

impl TryFrom<i64> for RelationType {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::DependsOn),
            1 => Ok(Self::DerivedFrom),
            2 => Ok(Self::Implements),
            3 => Ok(Self::Verifies),
            4 => Ok(Self::Refines),
            5 => Ok(Self::ConflictsWith),
            _ => Err(Error::InvalidOrdinal {
                kind: "relation type",
                value,
            }),
        }
    }
}

impl Traceability {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation: RelationType,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn relation(&self) -> RelationType {
        self.relation
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn set_timestamps(&mut self, created_at: Option<String>, updated_at: Option<String>) {
        self.created_at = created_at;
        self.updated_at = updated_at;
    }

    pub fn is_self_reference(&self) -> bool {
        self.source_id == self.target_id
    }

    pub fn to_json(&self) -> Value {
        json!({
            "source_id": self.source_id,
            "target_id": self.target_id,
            "type": self.relation,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        super::decode(value, "traceability")
    }
}
