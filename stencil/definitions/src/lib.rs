//! Stencil Built-in Definitions
//!
//! This crate contains sample service models built from the primitives in
//! `stencil-define`. Each model lives in its own module and exercises a
//! different corner of the generator.
//!
//! ## Available Models
//!
//! - [`weather`] - REST service with labels, query strings, and headers
//! - [`storage`] - REST service with wrapped and sparse collections, blob
//!   payloads, and a recursive folder tree
//! - [`catalog`] - RPC service with enums, unions, and enum/integer map keys
//!
//! ## Examples
//!
//! ```
//! use stencil_definitions::builtin;
//!
//! let weather = builtin("weather").unwrap().unwrap();
//! assert_eq!(weather.service.name(), "Weather");
//! assert!(builtin("nope").is_none());
//! ```

pub mod catalog;
pub mod prelude;
pub mod storage;
pub mod weather;

use serde::Serialize;
use stencil_define::{Model, ModelError, ShapeId};

pub use catalog::define_catalog_model;
pub use storage::define_storage_model;
pub use weather::define_weather_model;

/// Names accepted by [`builtin`], in listing order.
pub const BUILTIN_NAMES: &[&str] = &["weather", "storage", "catalog"];

/// A built-in model together with the service it is meant to generate.
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    pub name: &'static str,
    pub description: &'static str,
    pub service: ShapeId,
    pub model: Model,
}

/// Looks up a built-in definition by name.
///
/// Returns `None` for unknown names; the inner `Result` carries model
/// construction errors.
pub fn builtin(name: &str) -> Option<Result<Definition, ModelError>> {
    let (name, description, service, model) = match name {
        "weather" => (
            "weather",
            "City weather lookups over REST",
            weather::service_id(),
            define_weather_model(),
        ),
        "storage" => (
            "storage",
            "Object storage with folders and chunked blobs",
            storage::service_id(),
            define_storage_model(),
        ),
        "catalog" => (
            "catalog",
            "Product catalog over JSON RPC",
            catalog::service_id(),
            define_catalog_model(),
        ),
        _ => return None,
    };

    Some(model.map(|model| Definition {
        name,
        description,
        service,
        model,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_name_resolves() {
        for name in BUILTIN_NAMES {
            let definition = builtin(name).unwrap().unwrap();
            assert_eq!(definition.name, *name);
            assert!(
                definition.model.service(&definition.service).is_some(),
                "{} has no service {}",
                name,
                definition.service
            );
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(builtin("openai").is_none());
    }
}
