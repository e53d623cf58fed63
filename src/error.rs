//! Fatal generation errors.
//!
//! Anything in here aborts the whole run: the templates downstream assume a
//! validated catalog, so there is no partial output worth keeping.
use thiserror::Error;

use crate::diagnostics::Diagnostic;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("node type {node} inherits from {parent}, which is not in the catalog")]
    UnknownParent { node: String, parent: String },

    /// A node-type description does not have the shape the templates expect.
    #[error("node type {node}: {reason}")]
    Shape { node: String, reason: String },

    #[error("node type {node} has more than one attribute with a \"special\" entry")]
    MultipleSpecial { node: String },

    #[error("node type {node} has an attribute ({attr}) with a \"special\" entry but without \"init\"")]
    SpecialWithoutInit { node: String, attr: String },

    /// Raised only when unsupported attribute types are configured as fatal.
    #[error("{} attribute(s) have unsupported types", .diagnostics.len())]
    UnsupportedTypes { diagnostics: Vec<Diagnostic> },

    #[error("node type {0} is defined more than once")]
    DuplicateNode(String),

    #[error("failed to load catalog {origin}: {message}")]
    Catalog { origin: String, message: String },

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GenError {
    pub(crate) fn shape(node: &str, reason: impl Into<String>) -> Self {
        GenError::Shape { node: node.to_string(), reason: reason.into() }
    }
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;
