//! Convenient re-exports of the built-in model functions.

pub use crate::catalog::define_catalog_model;
pub use crate::storage::define_storage_model;
pub use crate::weather::define_weather_model;
pub use crate::{BUILTIN_NAMES, Definition, builtin};
