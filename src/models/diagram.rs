use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// A named UML diagram with a free-text body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UmlDiagram {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DiagramType,
    /// Serialized diagram description, set after construction.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "i64", try_from = "i64")]
pub enum DiagramType {
    Class,
    Sequence,
    Activity,
    State,
    Component,
    Deployment,
}

impl DiagramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Sequence => "sequence",
            Self::Activity => "activity",
            Self::State => "state",
            Self::Component => "component",
            Self::Deployment => "deployment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "class" => Some(Self::Class),
            "sequence" => Some(Self::Sequence),
            "activity" => Some(Self::Activity),
            "state" => Some(Self::State),
            "component" => Some(Self::Component),
            "deployment" => Some(Self::Deployment),
            _ => None,
        }
    }
}

impl From<DiagramType> for i64 {
    fn from(kind: DiagramType) -> Self {
        match kind {
            DiagramType::Class => 0,
            DiagramType::Sequence => 1,
            DiagramType::Activity => 2,
            DiagramType::State => 3,
            DiagramType::Component => 4,
            DiagramType::Deployment => 5,
        }
    }
}

impl TryFrom<i64> for DiagramType {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::Class),
            1 => Ok(Self::Sequence),
            2 => Ok(Self::Activity),
            3 => Ok(Self::State),
            4 => Ok(Self::Component),
            5 => Ok(Self::Deployment),
            _ => Err(Error::InvalidOrdinal {
                kind: "diagram type",
                value,
            }),
        }
    }
}

impl UmlDiagram {
    pub fn new(name: impl Into<String>, kind: DiagramType) -> Self {
        Self {
            name: name.into(),
            kind,
            content: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.kind,
            "content": self.content,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        super::decode(value, "UML diagram")
    }
}
