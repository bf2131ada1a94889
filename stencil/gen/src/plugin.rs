//! Generator entry point: settings, file manifests, and `execute`.
//!
//! A run takes a [`Model`], the [`Settings`] naming the service to generate,
//! and a [`FileManifest`] that receives the output files. The whole crate is
//! generated in memory before the first file is handed to the manifest, so
//! a failed run leaves the destination untouched.
//!
//! ## Examples
//!
//! ```
//! use stencil_define::ShapeId;
//! use stencil_gen::plugin::{InMemoryManifest, PluginContext, Settings, execute};
//!
//! let definition = stencil_definitions::builtin("weather").unwrap().unwrap();
//! let settings = Settings::new(definition.service.clone());
//! let mut manifest = InMemoryManifest::new();
//!
//! let mut ctx = PluginContext {
//!     model: &definition.model,
//!     settings: &settings,
//!     manifest: &mut manifest,
//! };
//! execute(&mut ctx).unwrap();
//!
//! assert!(manifest.get("src/client.rs").is_some());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use stencil_define::{Model, Protocol, ShapeId};
use tracing::{info, instrument};

use crate::errors::GeneratorError;
use crate::naming::to_snake_case;
use crate::output::{generate_crate, write_atomic};

/// What to generate and how to name it.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// The service to generate a client for.
    pub service: ShapeId,
    /// Package name of the generated crate.
    pub crate_name: String,
    pub crate_version: String,
    /// Overrides the protocol declared on the service.
    pub protocol: Option<Protocol>,
}

impl Settings {
    /// Settings with a crate name derived from the service
    /// (`test#Weather` becomes `weather-client`).
    pub fn new(service: ShapeId) -> Self {
        let crate_name = format!("{}-client", to_snake_case(service.name()).replace('_', "-"));
        Self {
            service,
            crate_name,
            crate_version: "0.1.0".to_string(),
            protocol: None,
        }
    }

    pub fn with_crate_name(mut self, name: impl Into<String>) -> Self {
        self.crate_name = name.into();
        self
    }

    pub fn with_crate_version(mut self, version: impl Into<String>) -> Self {
        self.crate_version = version.into();
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Checks the crate name and version are usable in a manifest.
    ///
    /// ## Errors
    ///
    /// Returns `ConfigError` describing the first problem found.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        let valid_name = self
            .crate_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .crate_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_name {
            return Err(GeneratorError::ConfigError(format!(
                "invalid crate name '{}': use ASCII letters, digits, '-' and '_', starting with a letter",
                self.crate_name
            )));
        }

        let parts: Vec<&str> = self.crate_version.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
            return Err(GeneratorError::ConfigError(format!(
                "invalid crate version '{}': expected MAJOR.MINOR.PATCH",
                self.crate_version
            )));
        }
        Ok(())
    }
}

/// Destination for generated files.
pub trait FileManifest {
    /// Stores `content` at `path`, relative to the output root.
    ///
    /// ## Errors
    ///
    /// Returns `WriteError` if the file cannot be stored.
    fn write_file(&mut self, path: &Path, content: &str) -> Result<(), GeneratorError>;
}

/// Writes files under a root directory, each one atomically.
#[derive(Debug, Clone)]
pub struct DirectoryManifest {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectoryManifest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FileManifest for DirectoryManifest {
    fn write_file(&mut self, path: &Path, content: &str) -> Result<(), GeneratorError> {
        let target = self.root.join(path);
        write_atomic(&target, content)?;
        self.written.push(target);
        Ok(())
    }
}

/// Keeps files in memory; used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryManifest {
    files: BTreeMap<PathBuf, String>,
}

impl InMemoryManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileManifest for InMemoryManifest {
    fn write_file(&mut self, path: &Path, content: &str) -> Result<(), GeneratorError> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

/// Everything one generation run needs.
pub struct PluginContext<'a> {
    pub model: &'a Model,
    pub settings: &'a Settings,
    pub manifest: &'a mut dyn FileManifest,
}

/// Generates the client crate and hands every file to the manifest.
///
/// ## Errors
///
/// Any generation error, before anything is written; or the first write
/// error from the manifest.
#[instrument(skip_all, fields(service = %ctx.settings.service, crate_name = %ctx.settings.crate_name))]
pub fn execute(ctx: &mut PluginContext<'_>) -> Result<(), GeneratorError> {
    let generated = generate_crate(ctx.model, ctx.settings)?;
    for (path, content) in &generated.files {
        ctx.manifest.write_file(Path::new(path), content)?;
    }
    info!(files = generated.files.len(), "wrote {}", generated.crate_name);
    Ok(())
}
