//! Requirement, traceability and UML diagram tracking on SQLite.
//!
//! [`models`] holds the value objects and their JSON documents, [`db`] the
//! [`DatabaseManager`](db::DatabaseManager) and one repository per table group.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
