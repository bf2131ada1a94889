//! Generation of the `wire` module: `DecodeError` and the scalar helpers
//! called by every generated codec.
//!
//! Generated decoders never inspect a `serde_json::Value` directly for
//! scalars; each terminal value is a single `wire::decode_*` call, which
//! keeps the per-shape code short and the error messages uniform.

use proc_macro2::TokenStream;
use quote::quote;

use crate::errors::GeneratorError;
use crate::symbol::Dependency;
use crate::writer::{CodeWriter, FinalizedUnit};

/// Generates the `DecodeError` enum. The `InvalidBlob` variant exists only
/// when `with_blobs` is set.
pub fn generate_decode_error(with_blobs: bool) -> TokenStream {
    let blob_variant = if with_blobs {
        quote! {
            /// A blob was not valid base64.
            #[error("invalid base64 blob: {0}")]
            InvalidBlob(String),
        }
    } else {
        TokenStream::new()
    };

    quote! {
        /// A wire value did not match the shape it was decoded as.
        #[derive(Debug, Clone, PartialEq, thiserror::Error)]
        pub enum DecodeError {
            /// A required member was absent or null.
            #[error("missing required member '{member}' of {shape}")]
            MissingRequiredMember {
                shape: &'static str,
                member: &'static str,
            },

            /// The JSON type was wrong.
            #[error("expected {expected}, found {found}")]
            UnexpectedType {
                expected: &'static str,
                found: &'static str,
            },

            /// A number did not fit the target integer type.
            #[error("number {value} does not fit in {target}")]
            OutOfRange { value: String, target: &'static str },

            /// A map key could not be parsed as the key type.
            #[error("invalid map key '{key}': {reason}")]
            InvalidKey { key: String, reason: String },

            /// A union container did not hold exactly one variant.
            #[error("union {shape} must have exactly one member set")]
            InvalidUnion { shape: &'static str },

            /// A wrapped map entry lacked its key.
            #[error("map entry is missing '{0}'")]
            MissingEntryField(&'static str),

            /// A timestamp was not a representable number of seconds.
            #[error("invalid timestamp: {0}")]
            InvalidTimestamp(String),

            #blob_variant
        }
    }
}

/// Generates the shape-independent decode/encode helpers.
pub fn generate_scalar_helpers() -> TokenStream {
    quote! {
        /// Stand-in for entries that are absent.
        pub static NULL: Value = Value::Null;

        fn describe(value: &Value) -> &'static str {
            match value {
                Value::Null => "null",
                Value::Bool(_) => "boolean",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) => "array",
                Value::Object(_) => "object",
            }
        }

        fn unexpected(expected: &'static str, value: &Value) -> DecodeError {
            DecodeError::UnexpectedType {
                expected,
                found: describe(value),
            }
        }

        pub fn expect_object(value: &Value) -> Result<&Map<String, Value>, DecodeError> {
            value.as_object().ok_or_else(|| unexpected("object", value))
        }

        pub fn expect_array(value: &Value) -> Result<&Vec<Value>, DecodeError> {
            value.as_array().ok_or_else(|| unexpected("array", value))
        }

        /// A required, non-null field of a wrapped map entry.
        pub fn entry_field<'a>(
            entry: &'a Map<String, Value>,
            name: &'static str,
        ) -> Result<&'a Value, DecodeError> {
            entry
                .get(name)
                .filter(|value| !value.is_null())
                .ok_or(DecodeError::MissingEntryField(name))
        }

        pub fn decode_str(value: &Value) -> Result<&str, DecodeError> {
            value.as_str().ok_or_else(|| unexpected("string", value))
        }

        pub fn decode_string(value: &Value) -> Result<String, DecodeError> {
            decode_str(value).map(str::to_string)
        }

        pub fn decode_bool(value: &Value) -> Result<bool, DecodeError> {
            value.as_bool().ok_or_else(|| unexpected("boolean", value))
        }

        pub fn decode_integer<T: TryFrom<i64>>(value: &Value) -> Result<T, DecodeError> {
            let raw = value.as_i64().ok_or_else(|| unexpected("integer", value))?;
            T::try_from(raw).map_err(|_| DecodeError::OutOfRange {
                value: raw.to_string(),
                target: std::any::type_name::<T>(),
            })
        }

        pub fn decode_f64(value: &Value) -> Result<f64, DecodeError> {
            value.as_f64().ok_or_else(|| unexpected("number", value))
        }

        pub fn decode_f32(value: &Value) -> Result<f32, DecodeError> {
            decode_f64(value).map(|v| v as f32)
        }

        /// Parses a map key into the key type.
        pub fn parse_key<T>(key: &str) -> Result<T, DecodeError>
        where
            T: std::str::FromStr,
            T::Err: std::fmt::Display,
        {
            key.parse::<T>().map_err(|e| DecodeError::InvalidKey {
                key: key.to_string(),
                reason: e.to_string(),
            })
        }

        /// Decodes epoch seconds, fractional or negative.
        pub fn decode_timestamp(value: &Value) -> Result<SystemTime, DecodeError> {
            let seconds = decode_f64(value)?;
            let offset = Duration::try_from_secs_f64(seconds.abs())
                .map_err(|e| DecodeError::InvalidTimestamp(e.to_string()))?;
            let time = if seconds >= 0.0 {
                UNIX_EPOCH.checked_add(offset)
            } else {
                UNIX_EPOCH.checked_sub(offset)
            };
            time.ok_or_else(|| DecodeError::InvalidTimestamp(seconds.to_string()))
        }

        /// Encodes epoch seconds; whole seconds become integers.
        pub fn encode_timestamp(value: &SystemTime) -> Value {
            let seconds = match value.duration_since(UNIX_EPOCH) {
                Ok(elapsed) => elapsed.as_secs_f64(),
                Err(before) => -before.duration().as_secs_f64(),
            };
            if seconds.fract() == 0.0 && seconds.abs() < 9.0e15 {
                Value::from(seconds as i64)
            } else {
                Value::from(seconds)
            }
        }
    }
}

/// Generates the base64 blob helpers.
pub fn generate_blob_helpers() -> TokenStream {
    quote! {
        pub fn decode_blob(value: &Value) -> Result<Vec<u8>, DecodeError> {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(decode_str(value)?)
                .map_err(|e| DecodeError::InvalidBlob(e.to_string()))
        }

        pub fn encode_blob(value: &[u8]) -> Value {
            use base64::Engine;
            Value::String(base64::engine::general_purpose::STANDARD.encode(value))
        }
    }
}

/// Generates the `wire` module.
///
/// Blob helpers and the `base64` dependency are only emitted when the model
/// uses blobs.
pub fn generate_wire_module(with_blobs: bool) -> Result<FinalizedUnit, GeneratorError> {
    let mut writer = CodeWriter::new("crate::wire");
    writer.write_module_doc("Wire-level decode errors and scalar codec helpers.");
    writer.import("serde_json", "Map");
    writer.import("serde_json", "Value");
    writer.import("std::time", "Duration");
    writer.import("std::time", "SystemTime");
    writer.import("std::time", "UNIX_EPOCH");
    writer.add_dependency(Dependency::serde_json());
    writer.add_dependency(Dependency::thiserror());

    writer.write_tokens(generate_decode_error(with_blobs));
    writer.write_tokens(generate_scalar_helpers());
    if with_blobs {
        writer.add_dependency(Dependency::base64());
        writer.write_tokens(generate_blob_helpers());
    }
    writer.finalize()
}
