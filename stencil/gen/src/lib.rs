//! Stencil code generator library.
//!
//! This crate turns a resolved service model from `stencil-define` into the
//! source of a standalone Rust client crate. The generated crate includes:
//!
//! - One type per structure, union, and enum, each with `decode`/`encode`
//!   functions over `serde_json::Value`
//! - A `<Service>Api` trait with one method per operation
//! - A `<Service>Client` that runs every call through an ordered middleware
//!   stack and a pluggable `Transport`
//! - `Config`, `ClientError`, and the small runtime those pieces share
//!
//! ## Modules
//!
//! - [`symbol`] - Maps shapes and members to Rust type symbols
//! - [`writer`] - Indentation-aware writer that tracks imports and dependencies
//! - [`middleware`] - Ordered middleware registry (steps plus relative positions)
//! - [`codegen`] - Emission of each generated module, including the recursive shape codec
//! - [`protocol`] - Protocol generators: request binding, config, middleware
//! - [`output`] - Crate assembly, validation, formatting, and atomic writes
//! - [`plugin`] - Settings, file manifests, and the [`plugin::execute`] entry point
//! - [`validation`] - Model checks run before any code is emitted
//! - [`naming`] - Identifier casing and keyword escaping
//! - [`errors`] - Error types for the generator
//!
//! ## Example Usage
//!
//! ```no_run
//! use stencil_gen::plugin::{DirectoryManifest, PluginContext, Settings, execute};
//!
//! let definition = stencil_definitions::builtin("weather").unwrap().unwrap();
//! let settings = Settings::new(definition.service.clone()).with_crate_name("weather-client");
//! let mut manifest = DirectoryManifest::new("generated/weather-client");
//!
//! execute(&mut PluginContext {
//!     model: &definition.model,
//!     settings: &settings,
//!     manifest: &mut manifest,
//! })
//! .unwrap();
//! ```
//!
//! ## Generated Code Structure
//!
//! For a service named `Weather` with an operation `GetCity`:
//!
//! ```text
//! // model.rs
//! pub struct GetCityInput { pub city_id: String }
//! impl GetCityInput {
//!     pub fn decode(value: &Value) -> Result<Self, DecodeError>;
//!     pub fn encode(&self) -> Value;
//! }
//!
//! // client.rs
//! pub trait WeatherApi {
//!     fn get_city(&self, input: &GetCityInput) -> Result<GetCityOutput, ClientError>;
//! }
//! pub struct WeatherClient { config: Config, transport: Box<dyn Transport> }
//! ```

pub mod codegen;
pub mod errors;
pub mod middleware;
pub mod naming;
pub mod output;
pub mod plugin;
pub mod protocol;
pub mod symbol;
pub mod validation;
pub mod writer;

#[cfg(test)]
pub mod test_utils;
