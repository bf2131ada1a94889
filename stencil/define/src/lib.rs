//! Stencil Model Library
//!
//! This crate provides the already-resolved service model consumed by the
//! `stencil-gen` code generator: shapes, members, traits, operations, and
//! services. Parsing an interface-description language into this form is
//! somebody else's job; the generator only ever sees a [`Model`].
//!
//! ## Core Types
//!
//! - [`Model`] - Every shape, operation, and service of one generation run
//! - [`Shape`] / [`ShapeKind`] - A node in the model graph
//! - [`Member`] - A named edge from a containing shape to a target shape
//! - [`Trait`] / [`HasTraits`] - Annotations that steer code generation
//! - [`Operation`] / [`HttpTrait`] - Callable units and their HTTP binding
//! - [`Service`] / [`Protocol`] - The root of a run and its wire protocol
//! - [`ShapeId`] - Absolute `namespace#Name` identifiers
//!
//! ## Examples
//!
//! ```
//! use stencil_define::prelude::*;
//!
//! let ns = "example.weather";
//! let model = Model::with_prelude()
//!     .with_shape(Shape::structure(
//!         ShapeId::new(ns, "GetCityInput"),
//!         vec![Member::required("cityId", ShapeId::prelude("String")).with_trait(Trait::HttpLabel)],
//!     ))
//!     .unwrap()
//!     .with_operation(
//!         Operation::new(ShapeId::new(ns, "GetCity"))
//!             .with_input(ShapeId::new(ns, "GetCityInput"))
//!             .with_http(HttpTrait::new(HttpMethod::Get, "/cities/{cityId}")),
//!     )
//!     .unwrap()
//!     .with_service(
//!         Service::new(ShapeId::new(ns, "Weather"), "2006-03-01")
//!             .with_operation(ShapeId::new(ns, "GetCity"))
//!             .with_protocol(Protocol::RestJson1),
//!     )
//!     .unwrap();
//!
//! assert_eq!(model.services().count(), 1);
//! ```

pub mod error;
pub mod model;
pub mod operation;
pub mod prelude;
pub mod shape;
pub mod shape_id;
pub mod traits;

// Re-export main types at crate root
pub use error::ModelError;
pub use model::Model;
pub use operation::{HttpMethod, HttpTrait, Operation, Protocol, Service};
pub use shape::{EnumValue, Member, PrimitiveType, Shape, ShapeKind};
pub use shape_id::{PRELUDE_NAMESPACE, ShapeId};
pub use traits::{HasTraits, Trait};
