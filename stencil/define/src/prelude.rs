//! Convenient re-exports for building models by hand.
//!
//! ```
//! use stencil_define::prelude::*;
//!
//! let id = ShapeId::new("ex", "Thing");
//! let shape = Shape::structure(id, vec![Member::optional("name", ShapeId::prelude("String"))]);
//! assert_eq!(shape.members().len(), 1);
//! ```

pub use crate::error::ModelError;
pub use crate::model::Model;
pub use crate::operation::{HttpMethod, HttpTrait, Operation, Protocol, Service};
pub use crate::shape::{EnumValue, Member, PrimitiveType, Shape, ShapeKind};
pub use crate::shape_id::ShapeId;
pub use crate::traits::{HasTraits, Trait};
