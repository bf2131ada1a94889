//! Mapping from model shapes to Rust symbols.
//!
//! A [`Symbol`] describes how a shape appears in generated code: the type
//! expression used in declarations, the module that defines it, whether an
//! absent value is representable (`Option<T>`), the default expression used
//! when it is not, and the crates the generated code must depend on.
//!
//! ## Nullability rules
//!
//! | Shape                          | Nullable | Absent value        |
//! |--------------------------------|----------|---------------------|
//! | any shape + `default`          | no       | the default literal |
//! | any shape + `default`, `boxed` | yes      | `None`              |
//! | every other shape              | yes      | `None`              |
//!
//! Member symbols refine this: a member is nullable only when it is
//! optional *and* its target is nullable (or the member is `boxed`), a
//! member-level `default` makes it non-nullable, and members on a
//! structure/union reference cycle are boxed.
//!
//! ## Formatting
//!
//! `{}` renders the declared type, `{:#}` renders the absent value:
//!
//! ```
//! use stencil_gen::symbol::Symbol;
//!
//! let name = Symbol::new("String", "").nullable(true);
//! assert_eq!(format!("{}", name), "Option<String>");
//! assert_eq!(format!("{:#}", name), "None");
//!
//! let count = Symbol::new("i32", "").with_default("0");
//! assert_eq!(format!("{}", count), "i32");
//! assert_eq!(format!("{:#}", count), "0");
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use stencil_define::{HasTraits, Member, Model, PrimitiveType, ShapeId, ShapeKind};
use tracing::trace;

use crate::errors::GeneratorError;
use crate::naming::type_name;
use crate::validation::{RecursionIndex, resolve_shape};

/// Module that holds every generated model type.
pub const MODEL_NAMESPACE: &str = "crate::model";

/// A crate the generated code depends on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            features: Vec::new(),
            git: None,
        }
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_git(mut self, url: impl Into<String>) -> Self {
        self.git = Some(url.into());
        self
    }

    /// JSON value model used by every generated codec.
    pub fn serde_json() -> Self {
        Self::new("serde_json", "1.0")
    }

    /// Base64 text encoding for blob members.
    pub fn base64() -> Self {
        Self::new("base64", "0.22")
    }

    /// Error derive for the generated error types.
    pub fn thiserror() -> Self {
        Self::new("thiserror", "2.0")
    }
}

/// A target-language type for one shape or member.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Type expression as written in declarations, without the `Option`.
    pub name: String,
    /// Module path defining the head type; empty when always in scope.
    pub namespace: String,
    /// Identifier imported from `namespace` (e.g. `HashMap` for a map).
    pub definition: String,
    /// Whether the absent value is `None`.
    pub nullable: bool,
    /// Expression for the absent value of a non-nullable symbol.
    pub default: Option<String>,
    pub dependencies: Vec<Dependency>,
    /// Symbols appearing inside this one (element, key, value types).
    pub references: Vec<Arc<Symbol>>,
}

impl Symbol {
    /// A symbol whose type expression is also its import name.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            definition: name.clone(),
            name,
            namespace: namespace.into(),
            nullable: false,
            default: None,
            dependencies: Vec::new(),
            references: Vec::new(),
        }
    }

    /// A generic container type such as `Vec<T>` or `HashMap<K, V>`.
    pub fn container(
        name: impl Into<String>,
        namespace: impl Into<String>,
        definition: impl Into<String>,
        references: Vec<Arc<Symbol>>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            definition: definition.into(),
            nullable: false,
            default: None,
            dependencies: Vec::new(),
            references,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self.nullable = false;
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Wraps the type in `Box<..>`, keeping nullability.
    pub fn boxed(&self) -> Self {
        let mut boxed = self.clone();
        boxed.name = format!("Box<{}>", self.name);
        boxed.default = self.default.as_ref().map(|d| format!("Box::new({})", d));
        boxed
    }

    /// Whether the type is `Box<..>`.
    pub fn is_boxed(&self) -> bool {
        self.name.starts_with("Box<")
    }

    /// The declared type: `Option<name>` when nullable.
    pub fn declared_type(&self) -> String {
        format!("{}", self)
    }

    /// The absent value: `None` when nullable, otherwise the default.
    pub fn absent_value(&self) -> String {
        format!("{:#}", self)
    }

    /// Dependencies of this symbol and everything it references.
    pub fn transitive_dependencies(&self) -> BTreeSet<Dependency> {
        let mut out: BTreeSet<Dependency> = self.dependencies.iter().cloned().collect();
        for reference in &self.references {
            out.extend(reference.transitive_dependencies());
        }
        out
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            match (&self.default, self.nullable) {
                (_, true) => write!(f, "None"),
                (Some(default), false) => write!(f, "{}", default),
                (None, false) => write!(f, "Default::default()"),
            }
        } else if self.nullable {
            write!(f, "Option<{}>", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Resolves shapes and members to symbols.
pub trait SymbolProvider {
    /// The symbol for a shape.
    ///
    /// ## Errors
    ///
    /// Returns `UnresolvedShape` for unknown ids and `InvalidShapeGraph`
    /// for collections that contain themselves.
    fn symbol_for(&mut self, id: &ShapeId) -> Result<Arc<Symbol>, GeneratorError>;

    /// The symbol for a member of `owner`, after optionality and boxing.
    fn member_symbol(
        &mut self,
        owner: &ShapeId,
        member: &Member,
    ) -> Result<Arc<Symbol>, GeneratorError>;
}

/// [`SymbolProvider`] producing Rust types, memoized per run.
pub struct RustSymbolProvider<'m> {
    model: &'m Model,
    namespace: String,
    recursion: RecursionIndex,
    cache: HashMap<ShapeId, Arc<Symbol>>,
    resolving: Vec<ShapeId>,
}

impl<'m> RustSymbolProvider<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self::with_namespace(model, MODEL_NAMESPACE)
    }

    /// A provider placing model types in `namespace`.
    pub fn with_namespace(model: &'m Model, namespace: impl Into<String>) -> Self {
        Self {
            model,
            namespace: namespace.into(),
            recursion: RecursionIndex::new(model),
            cache: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    pub fn recursion(&self) -> &RecursionIndex {
        &self.recursion
    }

    fn build(&mut self, id: &ShapeId) -> Result<Symbol, GeneratorError> {
        let shape = resolve_shape(self.model, id, "symbol resolution")?;

        let symbol = match &shape.kind {
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } => {
                Symbol::new(type_name(id.name()), self.namespace.as_str()).nullable(true)
            }
            ShapeKind::Enum { .. } => {
                let name = type_name(id.name());
                let symbol = Symbol::new(name.as_str(), self.namespace.as_str()).nullable(true);
                match shape.default_value().and_then(|v| v.as_str()) {
                    Some(value) => symbol.with_default(format!("{}::from({:?})", name, value)),
                    None => symbol,
                }
            }
            ShapeKind::List { member } | ShapeKind::Set { member } => {
                let element = self.symbol_for(&member.target)?;
                let element = Arc::new((*element).clone().nullable(shape.is_sparse()));
                let name = format!("Vec<{}>", element.declared_type());
                let symbol = Symbol::container(name, "", "Vec", vec![element]).nullable(true);
                if shape.default_value().is_some() {
                    symbol.with_default("Vec::new()")
                } else {
                    symbol
                }
            }
            ShapeKind::Map { key, value } => {
                let key = self.symbol_for(&key.target)?;
                let key = Arc::new((*key).clone().nullable(false));
                let value = self.symbol_for(&value.target)?;
                let value = Arc::new((*value).clone().nullable(shape.is_sparse()));
                let name = format!("HashMap<{}, {}>", key.name, value.declared_type());
                let symbol =
                    Symbol::container(name, "std::collections", "HashMap", vec![key, value])
                        .nullable(true);
                if shape.default_value().is_some() {
                    symbol.with_default("HashMap::new()")
                } else {
                    symbol
                }
            }
            ShapeKind::Primitive(primitive) => {
                let symbol = primitive_symbol(*primitive);
                match shape.default_value() {
                    Some(value) => symbol.with_default(default_literal(*primitive, value, id)?),
                    None => symbol,
                }
            }
        };

        // `boxed` keeps a shape nullable even when the model supplies a default.
        if shape.is_boxed() {
            return Ok(Symbol {
                nullable: true,
                default: None,
                ..symbol
            });
        }
        Ok(symbol)
    }
}

impl SymbolProvider for RustSymbolProvider<'_> {
    fn symbol_for(&mut self, id: &ShapeId) -> Result<Arc<Symbol>, GeneratorError> {
        if let Some(symbol) = self.cache.get(id) {
            return Ok(Arc::clone(symbol));
        }

        if self.resolving.contains(id) {
            let mut path: Vec<String> = self.resolving.iter().map(ToString::to_string).collect();
            path.push(id.to_string());
            return Err(GeneratorError::InvalidShapeGraph {
                reason: "collection contains itself".to_string(),
                path,
            });
        }

        self.resolving.push(id.clone());
        let built = self.build(id);
        self.resolving.pop();

        let symbol = Arc::new(built?);
        trace!(shape = %id, symbol = %symbol, "resolved symbol");
        self.cache.insert(id.clone(), Arc::clone(&symbol));
        Ok(symbol)
    }

    fn member_symbol(
        &mut self,
        owner: &ShapeId,
        member: &Member,
    ) -> Result<Arc<Symbol>, GeneratorError> {
        let target = self.symbol_for(&member.target)?;
        let mut symbol = (*target).clone();

        let owner_shape = resolve_shape(self.model, owner, "member symbol")?;
        if owner_shape.is_union() {
            // Variants always carry a value.
            symbol.nullable = false;
        } else if let Some(value) = member.default_value().filter(|_| !member.is_boxed()) {
            let target_shape = resolve_shape(self.model, &member.target, owner.name())?;
            let expr = match &target_shape.kind {
                ShapeKind::Primitive(p) => default_literal(*p, value, &member.target)?,
                ShapeKind::Enum { .. } => match value.as_str() {
                    Some(text) => format!("{}::from({:?})", symbol.name, text),
                    None => return Err(unsupported_default(&member.target, value)),
                },
                ShapeKind::List { .. } | ShapeKind::Set { .. } => "Vec::new()".to_string(),
                ShapeKind::Map { .. } => "HashMap::new()".to_string(),
                _ => return Err(unsupported_default(&member.target, value)),
            };
            symbol = symbol.with_default(expr);
        } else {
            symbol.nullable = member.is_optional() && (symbol.nullable || member.is_boxed());
            if symbol.nullable {
                symbol.default = None;
            }
        }

        if self.recursion.needs_box(owner, &member.name) {
            symbol = symbol.boxed();
        }

        Ok(Arc::new(symbol))
    }
}

/// Base symbol for a primitive before traits are applied. Every primitive
/// is nullable until a `default` trait supplies its absent value.
fn primitive_symbol(primitive: PrimitiveType) -> Symbol {
    let symbol = match primitive {
        PrimitiveType::Boolean => Symbol::new("bool", ""),
        PrimitiveType::Byte => Symbol::new("i8", ""),
        PrimitiveType::Short => Symbol::new("i16", ""),
        PrimitiveType::Integer => Symbol::new("i32", ""),
        PrimitiveType::Long => Symbol::new("i64", ""),
        PrimitiveType::Float => Symbol::new("f32", ""),
        PrimitiveType::Double => Symbol::new("f64", ""),
        PrimitiveType::String => Symbol::new("String", ""),
        PrimitiveType::Blob => Symbol::container("Vec<u8>", "", "Vec", Vec::new())
            .with_dependency(Dependency::base64()),
        PrimitiveType::Timestamp => Symbol::new("SystemTime", "std::time"),
        PrimitiveType::Document => {
            Symbol::new("Value", "serde_json").with_dependency(Dependency::serde_json())
        }
    };
    symbol.nullable(true)
}

/// Renders a `default` trait value as a Rust expression of the primitive's type.
fn default_literal(
    primitive: PrimitiveType,
    value: &serde_json::Value,
    id: &ShapeId,
) -> Result<String, GeneratorError> {
    let expr = match (primitive, value) {
        (PrimitiveType::Boolean, serde_json::Value::Bool(b)) => b.to_string(),
        (PrimitiveType::Float | PrimitiveType::Double, serde_json::Value::Number(n)) => {
            let float = n.as_f64().unwrap_or_default();
            if float.fract() == 0.0 {
                format!("{:.1}", float)
            } else {
                float.to_string()
            }
        }
        (p, serde_json::Value::Number(n)) if p.is_number() && n.is_i64() => n.to_string(),
        (PrimitiveType::String, serde_json::Value::String(s)) => format!("String::from({:?})", s),
        (PrimitiveType::Blob, serde_json::Value::String(s)) if s.is_empty() => {
            "Vec::new()".to_string()
        }
        _ => return Err(unsupported_default(id, value)),
    };
    Ok(expr)
}

fn unsupported_default(id: &ShapeId, value: &serde_json::Value) -> GeneratorError {
    GeneratorError::ConfigError(format!(
        "Unsupported default value {} for shape {}",
        value, id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_define::{EnumValue, Shape, Trait};

    fn id(name: &str) -> ShapeId {
        ShapeId::new("test", name)
    }

    fn model(shapes: Vec<Shape>) -> Model {
        let mut model = Model::with_prelude();
        for shape in shapes {
            model.insert_shape(shape).unwrap();
        }
        model
    }

    #[test]
    fn numbers_and_booleans_without_defaults_are_nullable() {
        let model = model(vec![]);
        let mut provider = RustSymbolProvider::new(&model);

        let int = provider.symbol_for(&ShapeId::prelude("Integer")).unwrap();
        assert_eq!(int.declared_type(), "Option<i32>");
        assert_eq!(int.absent_value(), "None");

        let flag = provider.symbol_for(&ShapeId::prelude("Boolean")).unwrap();
        assert_eq!(flag.declared_type(), "Option<bool>");

        let double = provider.symbol_for(&ShapeId::prelude("Double")).unwrap();
        assert_eq!(double.absent_value(), "None");
    }

    #[test]
    fn boxed_wins_over_a_shape_default() {
        let model = model(vec![
            Shape::primitive(id("Retries"), PrimitiveType::Integer)
                .with_trait(Trait::Default(serde_json::json!(3)))
                .with_trait(Trait::Boxed),
        ]);
        let mut provider = RustSymbolProvider::new(&model);
        let symbol = provider.symbol_for(&id("Retries")).unwrap();
        assert_eq!(symbol.declared_type(), "Option<i32>");
        assert_eq!(symbol.default, None);
    }

    #[test]
    fn boxed_number_is_nullable() {
        let model = model(vec![
            Shape::primitive(id("MaybeCount"), PrimitiveType::Integer).with_trait(Trait::Boxed),
        ]);
        let mut provider = RustSymbolProvider::new(&model);
        let symbol = provider.symbol_for(&id("MaybeCount")).unwrap();
        assert!(symbol.nullable);
        assert_eq!(symbol.declared_type(), "Option<i32>");
        assert_eq!(symbol.absent_value(), "None");
    }

    #[test]
    fn explicit_default_overrides_nullability() {
        let model = model(vec![
            Shape::primitive(id("Region"), PrimitiveType::String)
                .with_trait(Trait::Default(serde_json::json!("eu-west-1"))),
            Shape::primitive(id("Ratio"), PrimitiveType::Double)
                .with_trait(Trait::Default(serde_json::json!(2))),
        ]);
        let mut provider = RustSymbolProvider::new(&model);

        let region = provider.symbol_for(&id("Region")).unwrap();
        assert!(!region.nullable);
        assert_eq!(region.absent_value(), "String::from(\"eu-west-1\")");

        let ratio = provider.symbol_for(&id("Ratio")).unwrap();
        assert_eq!(ratio.absent_value(), "2.0");
    }

    #[test]
    fn mismatched_default_is_rejected() {
        let model = model(vec![
            Shape::primitive(id("Bad"), PrimitiveType::Integer)
                .with_trait(Trait::Default(serde_json::json!("nope"))),
        ]);
        let mut provider = RustSymbolProvider::new(&model);
        assert!(matches!(
            provider.symbol_for(&id("Bad")),
            Err(GeneratorError::ConfigError(_))
        ));
    }

    #[test]
    fn strings_and_structures_are_nullable() {
        let model = model(vec![Shape::structure(id("City"), vec![])]);
        let mut provider = RustSymbolProvider::new(&model);

        let string = provider.symbol_for(&ShapeId::prelude("String")).unwrap();
        assert_eq!(string.declared_type(), "Option<String>");

        let city = provider.symbol_for(&id("City")).unwrap();
        assert_eq!(city.name, "City");
        assert_eq!(city.namespace, MODEL_NAMESPACE);
        assert!(city.nullable);
    }

    #[test]
    fn sparse_lists_have_nullable_elements() {
        let model = model(vec![
            Shape::list(id("Dense"), Member::optional("member", ShapeId::prelude("String"))),
            Shape::list(id("Sparse"), Member::optional("member", ShapeId::prelude("String")))
                .with_trait(Trait::Sparse),
        ]);
        let mut provider = RustSymbolProvider::new(&model);

        assert_eq!(provider.symbol_for(&id("Dense")).unwrap().name, "Vec<String>");
        assert_eq!(
            provider.symbol_for(&id("Sparse")).unwrap().name,
            "Vec<Option<String>>"
        );
    }

    #[test]
    fn nested_blob_lists_carry_base64_dependency() {
        let model = model(vec![
            Shape::list(id("Inner"), Member::optional("member", ShapeId::prelude("Blob"))),
            Shape::list(id("Outer"), Member::optional("member", id("Inner"))),
        ]);
        let mut provider = RustSymbolProvider::new(&model);
        let outer = provider.symbol_for(&id("Outer")).unwrap();
        assert_eq!(outer.name, "Vec<Vec<Vec<u8>>>");
        assert!(outer.transitive_dependencies().contains(&Dependency::base64()));
    }

    #[test]
    fn maps_import_hash_map() {
        let model = model(vec![
            Shape::enumeration(id("Color"), vec![EnumValue::new("Red", "red")]),
            Shape::map(
                id("Palette"),
                Member::required("key", id("Color")),
                Member::required("value", ShapeId::prelude("Integer")),
            ),
        ]);
        let mut provider = RustSymbolProvider::new(&model);
        let palette = provider.symbol_for(&id("Palette")).unwrap();
        assert_eq!(palette.name, "HashMap<Color, i32>");
        assert_eq!(palette.namespace, "std::collections");
        assert_eq!(palette.definition, "HashMap");
        assert_eq!(palette.references.len(), 2);
    }

    #[test]
    fn symbols_are_memoized() {
        let model = model(vec![Shape::structure(id("City"), vec![])]);
        let mut provider = RustSymbolProvider::new(&model);
        let first = provider.symbol_for(&id("City")).unwrap();
        let second = provider.symbol_for(&id("City")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn member_nullability_requires_optional_and_nullable_target() {
        let model = model(vec![Shape::structure(
            id("Input"),
            vec![
                Member::required("name", ShapeId::prelude("String")),
                Member::optional("nickname", ShapeId::prelude("String")),
                Member::optional("count", ShapeId::prelude("Integer")),
                Member::optional("limit", ShapeId::prelude("Integer")).with_trait(Trait::Boxed),
                Member::optional("page", ShapeId::prelude("Integer"))
                    .with_trait(Trait::Default(serde_json::json!(1))),
                Member::required("total", ShapeId::prelude("Integer")),
            ],
        )]);
        let shape = model.shape(&id("Input")).unwrap().clone();
        let mut provider = RustSymbolProvider::new(&model);
        let symbol = |p: &mut RustSymbolProvider<'_>, i: usize| {
            p.member_symbol(&id("Input"), &shape.members()[i]).unwrap()
        };

        assert_eq!(symbol(&mut provider, 0).declared_type(), "String");
        assert_eq!(symbol(&mut provider, 1).declared_type(), "Option<String>");
        assert_eq!(symbol(&mut provider, 2).declared_type(), "Option<i32>");
        assert_eq!(symbol(&mut provider, 2).absent_value(), "None");
        assert_eq!(symbol(&mut provider, 3).declared_type(), "Option<i32>");
        let page = symbol(&mut provider, 4);
        assert_eq!(page.declared_type(), "i32");
        assert_eq!(page.absent_value(), "1");
        assert_eq!(symbol(&mut provider, 5).declared_type(), "i32");
    }

    #[test]
    fn recursive_members_are_boxed() {
        let model = model(vec![Shape::structure(
            id("Folder"),
            vec![Member::optional("parent", id("Folder"))],
        )]);
        let shape = model.shape(&id("Folder")).unwrap().clone();
        let mut provider = RustSymbolProvider::new(&model);
        let parent = provider
            .member_symbol(&id("Folder"), &shape.members()[0])
            .unwrap();
        assert_eq!(parent.declared_type(), "Option<Box<Folder>>");
        assert!(parent.is_boxed());
    }

    #[test]
    fn self_containing_list_is_an_invalid_graph() {
        let model = model(vec![Shape::list(id("Loop"), Member::optional("member", id("Loop")))]);
        let mut provider = RustSymbolProvider::new(&model);
        assert!(matches!(
            provider.symbol_for(&id("Loop")),
            Err(GeneratorError::InvalidShapeGraph { .. })
        ));
    }

    #[test]
    fn unknown_shape_is_unresolved() {
        let model = model(vec![]);
        let mut provider = RustSymbolProvider::new(&model);
        assert!(matches!(
            provider.symbol_for(&id("Ghost")),
            Err(GeneratorError::UnresolvedShape { .. })
        ));
    }
}
