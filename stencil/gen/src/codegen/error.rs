//! Error type generation for generated clients.
//!
//! Generates the `ClientError` enum returned by every client operation.
//! Decode failures from [`crate::codegen::wire`] convert into it with `?`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::errors::GeneratorError;
use crate::symbol::Dependency;
use crate::writer::{CodeWriter, FinalizedUnit};

/// Generates the `ClientError` enum.
///
/// Variants:
///
/// - `Transport`: the transport could not complete the exchange
/// - `Service`: the service answered with a non-success status
/// - `Decode`: the response body did not match the output shape
/// - `Json`: a body was not valid JSON
/// - `InvalidRequest`: the input could not be bound to a request
///
/// ## Examples
///
/// ```ignore
/// let error_tokens = generate_error_type();
/// // Produces:
/// // #[derive(Debug, thiserror::Error)]
/// // pub enum ClientError {
/// //     #[error("transport failed: {0}")]
/// //     Transport(String),
/// //     ...
/// // }
/// ```
pub fn generate_error_type() -> TokenStream {
    quote! {
        /// Errors returned by client operations.
        #[derive(Debug, thiserror::Error)]
        pub enum ClientError {
            /// The transport could not complete the exchange.
            #[error("transport failed: {0}")]
            Transport(String),

            /// The service answered with a non-success status.
            #[error("service returned HTTP {status}: {body}")]
            Service { status: u16, body: String },

            /// The response did not match the expected shape.
            #[error("failed to decode response: {0}")]
            Decode(#[from] DecodeError),

            /// A body was not valid JSON.
            #[error("invalid JSON: {0}")]
            Json(#[from] serde_json::Error),

            /// The input could not be bound to a request.
            #[error("invalid request: {0}")]
            InvalidRequest(String),
        }

        impl ClientError {
            /// Whether retrying the same request may succeed.
            pub fn is_retryable(&self) -> bool {
                match self {
                    Self::Transport(_) => true,
                    Self::Service { status, .. } => *status >= 500 || *status == 429,
                    _ => false,
                }
            }
        }
    }
}

/// Generates the `error` module.
pub fn generate_error_module() -> Result<FinalizedUnit, GeneratorError> {
    let mut writer = CodeWriter::new("crate::error");
    writer.write_module_doc("Errors returned by client operations.");
    writer.import("crate::wire", "DecodeError");
    writer.add_dependency(Dependency::thiserror());
    writer.add_dependency(Dependency::serde_json());
    writer.write_tokens(generate_error_type());
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::format_generated_code;

    #[test]
    fn error_type_derives_thiserror() {
        let code = format_generated_code(&generate_error_type()).expect("Failed to format code");
        assert!(code.contains("thiserror::Error"), "got:\n{}", code);
        assert!(code.contains("pub enum ClientError"), "got:\n{}", code);
        assert!(code.contains("Decode(#[from] DecodeError)"), "got:\n{}", code);
        assert!(code.contains(r#"#[error("service returned HTTP {status}: {body}")]"#));
    }

    #[test]
    fn error_module_parses_and_declares_dependencies() {
        let unit = generate_error_module().unwrap();
        syn::parse_file(&unit.source).unwrap();
        assert!(unit.source.contains("use crate::wire::DecodeError;"));
        assert!(unit.dependencies.contains(&Dependency::thiserror()));
    }
}
