//! The resolved model: every shape, operation, and service of one run.
//!
//! Lookups are keyed by [`ShapeId`] in ordered maps, so iterating a model is
//! deterministic and generated output is stable between runs.
//!
//! ## Document format
//!
//! On disk a model is a JSON document with three arrays:
//!
//! ```json
//! {
//!   "shapes": [{ "id": "ex#Name", "kind": { "primitive": "string" } }],
//!   "operations": [{ "id": "ex#GetThing", "input": "ex#GetThingInput" }],
//!   "services": [{ "id": "ex#Things", "version": "1", "operations": ["ex#GetThing"] }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::error::ModelError;
use crate::operation::{Operation, Service};
use crate::shape::{PrimitiveType, Shape};
use crate::shape_id::ShapeId;

/// Serialized form of a [`Model`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ModelDocument {
    #[serde(default)]
    shapes: Vec<Shape>,
    #[serde(default)]
    operations: Vec<Operation>,
    #[serde(default)]
    services: Vec<Service>,
}

/// A validated, fully resolved model graph.
///
/// ## Examples
///
/// ```
/// use stencil_define::{Member, Model, Shape, ShapeId};
///
/// let city = ShapeId::new("ex", "City");
/// let model = Model::with_prelude()
///     .with_shape(Shape::structure(
///         city.clone(),
///         vec![Member::required("name", ShapeId::prelude("String"))],
///     ))
///     .unwrap();
///
/// assert!(model.shape(&city).is_some());
/// assert!(model.shape(&ShapeId::prelude("Blob")).is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelDocument", into = "ModelDocument")]
pub struct Model {
    shapes: BTreeMap<ShapeId, Shape>,
    operations: BTreeMap<ShapeId, Operation>,
    services: BTreeMap<ShapeId, Service>,
}

impl Model {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// A model pre-populated with one shape per [`PrimitiveType`] in the
    /// `stencil.api` namespace.
    pub fn with_prelude() -> Self {
        let mut model = Self::new();
        for primitive in PrimitiveType::iter() {
            let id = ShapeId::prelude(primitive.prelude_name());
            model
                .shapes
                .insert(id.clone(), Shape::primitive(id, primitive));
        }
        model
    }

    /// Loads a model from its JSON document form.
    ///
    /// ## Errors
    ///
    /// Returns [`ModelError::Json`] for malformed documents and
    /// [`ModelError::DuplicateDefinition`] when an id is defined twice.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: ModelDocument = serde_json::from_str(json)?;
        Self::try_from(document)
    }

    /// Renders the model as a pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds a shape, builder-style.
    pub fn with_shape(mut self, shape: Shape) -> Result<Self, ModelError> {
        self.insert_shape(shape)?;
        Ok(self)
    }

    /// Adds an operation, builder-style.
    pub fn with_operation(mut self, operation: Operation) -> Result<Self, ModelError> {
        self.insert_operation(operation)?;
        Ok(self)
    }

    /// Adds a service, builder-style.
    pub fn with_service(mut self, service: Service) -> Result<Self, ModelError> {
        self.insert_service(service)?;
        Ok(self)
    }

    pub fn insert_shape(&mut self, shape: Shape) -> Result<(), ModelError> {
        if self.shapes.contains_key(&shape.id) {
            return Err(ModelError::DuplicateDefinition(shape.id));
        }
        self.shapes.insert(shape.id.clone(), shape);
        Ok(())
    }

    pub fn insert_operation(&mut self, operation: Operation) -> Result<(), ModelError> {
        if self.operations.contains_key(&operation.id) {
            return Err(ModelError::DuplicateDefinition(operation.id));
        }
        self.operations.insert(operation.id.clone(), operation);
        Ok(())
    }

    pub fn insert_service(&mut self, service: Service) -> Result<(), ModelError> {
        if self.services.contains_key(&service.id) {
            return Err(ModelError::DuplicateDefinition(service.id));
        }
        self.services.insert(service.id.clone(), service);
        Ok(())
    }

    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn operation(&self, id: &ShapeId) -> Option<&Operation> {
        self.operations.get(id)
    }

    pub fn service(&self, id: &ShapeId) -> Option<&Service> {
        self.services.get(id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }
}

impl TryFrom<ModelDocument> for Model {
    type Error = ModelError;

    fn try_from(document: ModelDocument) -> Result<Self, Self::Error> {
        let mut model = Model::new();
        for shape in document.shapes {
            model.insert_shape(shape)?;
        }
        for operation in document.operations {
            model.insert_operation(operation)?;
        }
        for service in document.services {
            model.insert_service(service)?;
        }
        Ok(model)
    }
}

impl From<Model> for ModelDocument {
    fn from(model: Model) -> Self {
        ModelDocument {
            shapes: model.shapes.into_values().collect(),
            operations: model.operations.into_values().collect(),
            services: model.services.into_values().collect(),
        }
    }
}
