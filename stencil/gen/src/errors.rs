//! Error types for the stencil generator.
//!
//! Every variant is fatal for the generation run that raised it: there is no
//! partial-success mode, and a failed run writes no files.

use stencil_define::{ModelError, ShapeId};
use thiserror::Error;

/// Errors that can occur during code generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The model references a shape id that is not defined.
    #[error("Unresolved shape '{id}' (referenced from {referenced_from})")]
    UnresolvedShape {
        /// The missing shape id.
        id: ShapeId,
        /// Where the reference was found (a shape, member, or operation).
        referenced_from: String,
    },

    /// Two middleware descriptors in one stack share a name.
    #[error("Duplicate middleware '{name}' in stack '{stack}'")]
    DuplicateMiddlewareName {
        /// The middleware name registered twice.
        name: String,
        /// The stack the registration targeted.
        stack: String,
    },

    /// Relative-position directives inside one step contradict each other.
    #[error(
        "Contradictory ordering for middleware '{name}' in step '{step}': constraints form a cycle through {cycle:?}"
    )]
    ContradictoryMiddlewareOrder {
        /// The middleware whose registration closed the cycle.
        name: String,
        /// The pipeline step the cycle lives in.
        step: String,
        /// Names of the middleware taking part in the cycle.
        cycle: Vec<String>,
    },

    /// A `Before`/`After` directive names a middleware absent from the step.
    #[error("Middleware '{name}' is positioned relative to '{peer}', which is not registered in step '{step}'")]
    UnknownMiddlewarePeer {
        /// The middleware carrying the directive.
        name: String,
        /// The peer it refers to.
        peer: String,
        /// The step searched for the peer.
        step: String,
    },

    /// A scope was closed without a matching open, or left open at finalization.
    #[error("Unbalanced scope in '{namespace}': {detail}")]
    UnbalancedScope {
        /// Namespace of the writer that was misused.
        namespace: String,
        /// What went wrong.
        detail: String,
    },

    /// The shape graph cannot be turned into finite generated code.
    ///
    /// Raised for cycles through required structure members and for
    /// collections that contain themselves.
    #[error("Invalid shape graph: {reason} (path: {})", .path.join(" -> "))]
    InvalidShapeGraph {
        /// Why the graph was rejected.
        reason: String,
        /// The shapes along the offending path.
        path: Vec<String>,
    },

    /// Generated code failed to parse as Rust.
    #[error("Code generation failed: {0}")]
    CodeGenError(String),

    /// Failed to write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid generator settings.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The model document could not be loaded.
    #[error("Failed to load model: {0}")]
    Model(#[from] ModelError),
}
