//! Traits: annotations on shapes and members that steer code generation.
//!
//! Traits never change what a shape *is*; they change how it is represented
//! in generated code or on the wire:
//!
//! - [`Trait::Boxed`] / [`Trait::Default`] - nullability and default values
//! - [`Trait::Sparse`] - collection elements are individually optional
//! - [`Trait::Wrapped`] - collection elements are nested under a named key
//! - [`Trait::JsonName`] - overrides the wire key of a member
//! - `Http*` - binds operation input members to parts of the HTTP request

use serde::{Deserialize, Serialize};

/// A single annotation attached to a shape or member.
///
/// ## Examples
///
/// Traits serialize in the model document as camelCase tags:
///
/// ```
/// use stencil_define::Trait;
///
/// let traits: Vec<Trait> = serde_json::from_str(
///     r#"["sparse", {"jsonName": "Items"}, {"default": 0}]"#,
/// ).unwrap();
///
/// assert_eq!(traits[0], Trait::Sparse);
/// assert_eq!(traits[1], Trait::JsonName("Items".to_string()));
/// assert_eq!(traits[2], Trait::Default(serde_json::json!(0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trait {
    /// The shape or member stays nullable even when a default is supplied.
    Boxed,
    /// Model-supplied default value, as a JSON literal.
    Default(serde_json::Value),
    /// Collection elements may be null.
    Sparse,
    /// Collection elements are nested under the collection's member-name key.
    Wrapped,
    /// Wire key to use instead of the member name.
    JsonName(String),
    /// Member is substituted into the request URI.
    HttpLabel,
    /// Member is sent as the named query string parameter.
    HttpQuery(String),
    /// Member is sent as the named request header.
    HttpHeader(String),
    /// Member is the whole request body.
    HttpPayload,
    /// Human-readable documentation.
    Documentation(String),
}

/// Trait lookups shared by everything that carries traits.
///
/// Implemented by [`crate::Shape`] and [`crate::Member`].
pub trait HasTraits {
    fn traits(&self) -> &[Trait];

    fn is_boxed(&self) -> bool {
        self.traits().contains(&Trait::Boxed)
    }

    fn is_sparse(&self) -> bool {
        self.traits().contains(&Trait::Sparse)
    }

    fn is_wrapped(&self) -> bool {
        self.traits().contains(&Trait::Wrapped)
    }

    fn is_http_label(&self) -> bool {
        self.traits().contains(&Trait::HttpLabel)
    }

    fn is_http_payload(&self) -> bool {
        self.traits().contains(&Trait::HttpPayload)
    }

    fn default_value(&self) -> Option<&serde_json::Value> {
        self.traits().iter().find_map(|t| match t {
            Trait::Default(value) => Some(value),
            _ => None,
        })
    }

    fn json_name(&self) -> Option<&str> {
        self.traits().iter().find_map(|t| match t {
            Trait::JsonName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn http_query(&self) -> Option<&str> {
        self.traits().iter().find_map(|t| match t {
            Trait::HttpQuery(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn http_header(&self) -> Option<&str> {
        self.traits().iter().find_map(|t| match t {
            Trait::HttpHeader(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn documentation(&self) -> Option<&str> {
        self.traits().iter().find_map(|t| match t {
            Trait::Documentation(text) => Some(text.as_str()),
            _ => None,
        })
    }
}
