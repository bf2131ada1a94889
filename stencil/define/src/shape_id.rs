//! Shape identifiers.
//!
//! Every shape, operation, and service in a model is addressed by an
//! absolute identifier of the form `namespace#Name`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Namespace holding the built-in primitive shapes (see [`crate::Model::with_prelude`]).
pub const PRELUDE_NAMESPACE: &str = "stencil.api";

/// An absolute shape identifier (`namespace#Name`).
///
/// ## Examples
///
/// ```
/// use stencil_define::ShapeId;
///
/// let id: ShapeId = "example.weather#City".parse().unwrap();
/// assert_eq!(id.namespace(), "example.weather");
/// assert_eq!(id.name(), "City");
/// assert_eq!(id.to_string(), "example.weather#City");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeId {
    namespace: String,
    name: String,
}

impl ShapeId {
    /// Creates an identifier from its namespace and name parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identifier of a shape in the prelude namespace.
    ///
    /// ```
    /// use stencil_define::ShapeId;
    ///
    /// assert_eq!(ShapeId::prelude("String").to_string(), "stencil.api#String");
    /// ```
    pub fn prelude(name: impl Into<String>) -> Self {
        Self::new(PRELUDE_NAMESPACE, name)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)
    }
}

impl FromStr for ShapeId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('#') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('#') =>
            {
                Ok(Self::new(namespace, name))
            }
            _ => Err(ModelError::InvalidShapeId(s.to_string())),
        }
    }
}

impl TryFrom<String> for ShapeId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShapeId> for String {
    fn from(id: ShapeId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespace_and_name() {
        let id: ShapeId = "a.b.c#Thing".parse().unwrap();
        assert_eq!(id.namespace(), "a.b.c");
        assert_eq!(id.name(), "Thing");
    }

    #[test]
    fn rejects_missing_separator() {
        let err = "Thing".parse::<ShapeId>().unwrap_err();
        assert!(matches!(err, ModelError::InvalidShapeId(ref s) if s == "Thing"));
    }

    #[test]
    fn rejects_empty_parts_and_double_separator() {
        assert!("#Thing".parse::<ShapeId>().is_err());
        assert!("ns#".parse::<ShapeId>().is_err());
        assert!("ns#A#B".parse::<ShapeId>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ShapeId::new("ns", "Thing");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""ns#Thing""#);

        let back: ShapeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn orders_by_namespace_then_name() {
        let mut ids = vec![
            ShapeId::new("b", "A"),
            ShapeId::new("a", "Z"),
            ShapeId::new("a", "B"),
        ];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["a#B", "a#Z", "b#A"]);
    }
}
