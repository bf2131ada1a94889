//! Shapes and members: the nodes and edges of the model graph.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::shape_id::ShapeId;
use crate::traits::{HasTraits, Trait};

/// Scalar shape types.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use stencil_define::PrimitiveType;
///
/// assert_eq!(PrimitiveType::from_str("blob").unwrap(), PrimitiveType::Blob);
/// assert_eq!(PrimitiveType::Timestamp.to_string(), "timestamp");
/// assert!(PrimitiveType::Integer.is_number());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    String,
    Blob,
    Timestamp,
    /// Untyped JSON document.
    Document,
}

impl PrimitiveType {
    /// Integer and floating point types.
    pub fn is_number(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Integer | Self::Long | Self::Float | Self::Double
        )
    }

    /// Name of the prelude shape for this type (e.g. `"String"`).
    pub fn prelude_name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::Blob => "Blob",
            Self::Timestamp => "Timestamp",
            Self::Document => "Document",
        }
    }
}

/// One named value of an enum shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Symbolic name, used for the generated variant.
    pub name: String,
    /// Wire value.
    pub value: String,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// What kind of data a shape describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Structure { members: Vec<Member> },
    Union { members: Vec<Member> },
    List { member: Member },
    Set { member: Member },
    Map { key: Member, value: Member },
    Primitive(PrimitiveType),
    Enum { values: Vec<EnumValue> },
}

/// A reference from a containing shape to a target shape.
///
/// Structures and unions own named members; lists and sets own exactly one
/// member (conventionally named `member`), maps own a `key` and a `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub target: ShapeId,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<Trait>,
}

impl Member {
    /// A required member.
    pub fn required(name: impl Into<String>, target: ShapeId) -> Self {
        Self {
            name: name.into(),
            target,
            required: true,
            traits: Vec::new(),
        }
    }

    /// An optional member.
    pub fn optional(name: impl Into<String>, target: ShapeId) -> Self {
        Self {
            name: name.into(),
            target,
            required: false,
            traits: Vec::new(),
        }
    }

    /// Adds a trait, builder-style.
    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }

    pub fn is_optional(&self) -> bool {
        !self.required
    }

    /// Key used for this member in a keyed wire container.
    pub fn wire_name(&self) -> &str {
        self.json_name().unwrap_or(&self.name)
    }
}

impl HasTraits for Member {
    fn traits(&self) -> &[Trait] {
        &self.traits
    }
}

/// A node in the model graph.
///
/// ## Examples
///
/// ```
/// use stencil_define::{Member, Shape, ShapeId, ShapeKind, Trait, HasTraits};
///
/// let names = Shape::list(
///     ShapeId::new("ex", "NameList"),
///     Member::optional("member", ShapeId::prelude("String")),
/// )
/// .with_trait(Trait::Wrapped);
///
/// assert!(names.is_wrapped());
/// assert!(matches!(names.kind, ShapeKind::List { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<Trait>,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind) -> Self {
        Self {
            id,
            kind,
            traits: Vec::new(),
        }
    }

    pub fn structure(id: ShapeId, members: Vec<Member>) -> Self {
        Self::new(id, ShapeKind::Structure { members })
    }

    pub fn union(id: ShapeId, members: Vec<Member>) -> Self {
        Self::new(id, ShapeKind::Union { members })
    }

    pub fn list(id: ShapeId, member: Member) -> Self {
        Self::new(id, ShapeKind::List { member })
    }

    pub fn set(id: ShapeId, member: Member) -> Self {
        Self::new(id, ShapeKind::Set { member })
    }

    pub fn map(id: ShapeId, key: Member, value: Member) -> Self {
        Self::new(id, ShapeKind::Map { key, value })
    }

    pub fn primitive(id: ShapeId, primitive: PrimitiveType) -> Self {
        Self::new(id, ShapeKind::Primitive(primitive))
    }

    pub fn enumeration(id: ShapeId, values: Vec<EnumValue>) -> Self {
        Self::new(id, ShapeKind::Enum { values })
    }

    /// Adds a trait, builder-style.
    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }

    /// Named members of a structure or union; empty for every other kind.
    pub fn members(&self) -> &[Member] {
        match &self.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => members,
            _ => &[],
        }
    }

    /// Every outgoing edge of this shape, in declaration order.
    pub fn edges(&self) -> Vec<&Member> {
        match &self.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => {
                members.iter().collect()
            }
            ShapeKind::List { member } | ShapeKind::Set { member } => vec![member],
            ShapeKind::Map { key, value } => vec![key, value],
            ShapeKind::Primitive(_) | ShapeKind::Enum { .. } => Vec::new(),
        }
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.kind, ShapeKind::Structure { .. })
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, ShapeKind::Union { .. })
    }

    /// Lists, sets, and maps.
    pub fn is_collection(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::List { .. } | ShapeKind::Set { .. } | ShapeKind::Map { .. }
        )
    }
}

impl HasTraits for Shape {
    fn traits(&self) -> &[Trait] {
        &self.traits
    }
}
