//! Error types for model construction and loading.

use thiserror::Error;

use crate::shape_id::ShapeId;

/// Errors raised while building or loading a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A shape identifier is not of the form `namespace#Name`.
    #[error("Invalid shape id '{0}': expected 'namespace#Name'")]
    InvalidShapeId(String),

    /// Two shapes, operations, or services share one identifier.
    #[error("Duplicate definition for '{0}'")]
    DuplicateDefinition(ShapeId),

    /// The model document is not valid JSON for the model schema.
    #[error("Failed to parse model document: {0}")]
    Json(#[from] serde_json::Error),
}
