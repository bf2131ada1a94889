//! Generation of the client `Config` struct.
//!
//! Fields come from the protocol's [`ConfigField`] list. Each field gets a
//! doc comment, a default, and a `with_<field>` builder setter.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::errors::GeneratorError;
use crate::protocol::ConfigField;
use crate::writer::{CodeWriter, FinalizedUnit};

/// Generates the `Config` struct, its `Default` impl, and setters.
///
/// ## Errors
///
/// Returns `ConfigError` if a field's type or default is not valid Rust.
///
/// ## Examples
///
/// ```
/// use stencil_gen::codegen::config::generate_config;
/// use stencil_gen::protocol::ConfigField;
///
/// let fields = vec![ConfigField::new("max_attempts", "u32", "3", "Attempts per call.")];
/// let tokens = generate_config(&fields).unwrap();
/// assert!(tokens.to_string().contains("with_max_attempts"));
/// ```
pub fn generate_config(fields: &[ConfigField]) -> Result<TokenStream, GeneratorError> {
    let mut names = Vec::with_capacity(fields.len());
    let mut setters = Vec::with_capacity(fields.len());
    let mut types = Vec::with_capacity(fields.len());
    let mut defaults = Vec::with_capacity(fields.len());
    let mut docs = Vec::with_capacity(fields.len());

    for field in fields {
        names.push(format_ident!("{}", field.name));
        setters.push(format_ident!("with_{}", field.name));
        types.push(syn::parse_str::<syn::Type>(&field.ty).map_err(|e| {
            GeneratorError::ConfigError(format!("type of config field '{}': {}", field.name, e))
        })?);
        defaults.push(syn::parse_str::<syn::Expr>(&field.default).map_err(|e| {
            GeneratorError::ConfigError(format!("default of config field '{}': {}", field.name, e))
        })?);
        docs.push(format!(" {}", field.documentation));
    }

    Ok(quote! {
        /// Client configuration.
        #[derive(Debug, Clone, PartialEq)]
        pub struct Config {
            #(
                #[doc = #docs]
                pub #names: #types,
            )*
        }

        impl Default for Config {
            fn default() -> Self {
                Self {
                    #( #names: #defaults, )*
                }
            }
        }

        impl Config {
            /// A configuration with every default.
            pub fn new() -> Self {
                Self::default()
            }

            #(
                pub fn #setters(mut self, value: #types) -> Self {
                    self.#names = value;
                    self
                }
            )*
        }
    })
}

/// Generates the `config` module.
pub fn generate_config_module(fields: &[ConfigField]) -> Result<FinalizedUnit, GeneratorError> {
    let mut writer = CodeWriter::new("crate::config");
    writer.write_module_doc("Client configuration.");
    writer.write_tokens(generate_config(fields)?);
    writer.finalize()
}
