//! Domain models for requirement tracking.
//!
//! # Entities
//!
//! - [`User`]: identified by a unique username, carries an Argon2 password hash and a [`Role`].
//! - [`Project`]: owned by one user, shared with an ordered list of collaborators.
//! - [`Requirement`]: a titled requirement with optional status, priority and assignee.
//! - [`Traceability`]: a typed, directed link between two requirements.
//! - [`UmlDiagram`]: a named diagram of a given [`DiagramType`].
//!
//! # JSON documents
//!
//! Every entity has a `to_json`/`from_json` pair. Enumerations are encoded as
//! their ordinal. Decoding is strict: a missing or mistyped required field is
//! an [`Error::MalformedInput`]; optional attributes may be absent or null.
//! Projects reference users by username only.

mod diagram;
mod project;
mod requirement;
mod traceability;
mod user;

pub use diagram::*;
pub use project::*;
pub use requirement::*;
pub use traceability::*;
pub use user::*;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

fn decode<T: DeserializeOwned>(value: &Value, entity: &'static str) -> Result<T> {
    T::deserialize(value).map_err(|source| {
        tracing::error!(entity, error = %source, "failed to parse JSON document");
        Error::MalformedInput { entity, source }
    })
}
