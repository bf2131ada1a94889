//! Code generation modules for stencil.
//!
//! Each submodule produces one file (or one recurring fragment) of the
//! generated client crate.
//!
//! ## Submodules
//!
//! - [`coding_keys`] - `<Name>CodingKeys` enums for keyed wire containers
//! - [`shape_codec`] - Recursive `decode`/`encode` emission for model shapes
//! - [`model`] - The `model` module: one type per structure, union, and enum
//! - [`client`] - The `<Service>Api` trait and `<Service>Client`
//! - [`config`] - The `Config` struct built from protocol config fields
//! - [`error`] - The `ClientError` enum
//! - [`wire`] - `DecodeError` and scalar codec helpers
//! - [`runtime`] - HTTP types, the transport seam, and the middleware stack
//! - [`manifest`] - The generated crate's `Cargo.toml`
//!
//! ## Code Generation Flow
//!
//! 1. Model types and their codecs via [`generate_model_module`]
//! 2. The client via [`generate_client_module`], using the protocol's
//!    middleware registry and request binding
//! 3. Fixed support modules via [`generate_runtime_module`],
//!    [`generate_wire_module`], [`generate_error_module`], and
//!    [`generate_config_module`]
//! 4. The manifest via [`generate_manifest`] from every unit's dependencies
//!
//! ## Output Format
//!
//! Recursive code is written line by line through [`crate::writer::CodeWriter`];
//! fixed fragments are built with `quote!`. Every unit is re-parsed with
//! `syn` and formatted with `prettyplease` by [`crate::output`].

pub mod client;
pub mod coding_keys;
pub mod config;
pub mod error;
pub mod manifest;
pub mod model;
pub mod runtime;
pub mod shape_codec;
pub mod wire;

pub use client::{api_trait_name, client_name, generate_client_module};
pub use coding_keys::{coding_keys_name, render_coding_keys};
pub use config::{generate_config, generate_config_module};
pub use error::{generate_error_module, generate_error_type};
pub use manifest::generate_manifest;
pub use model::generate_model_module;
pub use runtime::generate_runtime_module;
pub use shape_codec::{CodecPath, JsonShapeCodec, ShapeCodec};
pub use wire::generate_wire_module;
