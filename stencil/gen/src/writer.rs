//! Line-oriented source writer for one generated module.
//!
//! A [`CodeWriter`] accumulates the body of one output file together with
//! the imports and crate dependencies its code needs. Scopes are explicit:
//! [`CodeWriter::open_scope`] writes a header and indents, and
//! [`CodeWriter::close_scope`] dedents and writes a footer. Closing more
//! scopes than were opened, or finalizing with scopes still open, is an
//! `UnbalancedScope` error rather than silently malformed output.
//!
//! Fixed fragments built with `quote!` are appended as token streams via
//! [`CodeWriter::write_tokens`]; the final file is re-parsed and formatted
//! by [`crate::output::format_unit`].
//!
//! ## Examples
//!
//! ```
//! use stencil_gen::writer::CodeWriter;
//!
//! let mut writer = CodeWriter::new("crate::model");
//! writer.open_scope("pub struct City {");
//! writer.write("pub name: String,");
//! writer.close_scope("}").unwrap();
//!
//! let unit = writer.finalize().unwrap();
//! assert!(unit.source.contains("    pub name: String,"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use proc_macro2::TokenStream;

use crate::errors::GeneratorError;
use crate::symbol::{Dependency, Symbol};

/// First line of every generated file.
pub const GENERATED_MARKER: &str = "// Code generated by stencil-gen. DO NOT EDIT.";

const INDENT: &str = "    ";

/// A finalized module: its rendered source and the crates it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedUnit {
    pub namespace: String,
    pub source: String,
    pub dependencies: BTreeSet<Dependency>,
}

/// Accumulates one module's source text, imports, and dependencies.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    namespace: String,
    module_docs: Vec<String>,
    lines: Vec<String>,
    scopes: Vec<String>,
    /// namespace -> imported names, each with an optional alias
    imports: BTreeMap<String, BTreeSet<(String, Option<String>)>>,
    dependencies: BTreeSet<Dependency>,
}

impl CodeWriter {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            module_docs: Vec::new(),
            lines: Vec::new(),
            scopes: Vec::new(),
            imports: BTreeMap::new(),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Current scope depth.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Writes text at the current indentation, one line per input line.
    pub fn write(&mut self, text: impl AsRef<str>) -> &mut Self {
        let indent = INDENT.repeat(self.scopes.len());
        for line in text.as_ref().lines() {
            if line.trim().is_empty() {
                self.lines.push(String::new());
            } else {
                self.lines.push(format!("{}{}", indent, line));
            }
        }
        self
    }

    pub fn write_empty(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// Writes `///` doc lines.
    pub fn write_doc(&mut self, text: impl AsRef<str>) -> &mut Self {
        for line in text.as_ref().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                self.write("///");
            } else {
                self.write(format!("/// {}", line));
            }
        }
        self
    }

    /// Adds a `//!` line to the module header.
    pub fn write_module_doc(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.module_docs
            .extend(text.as_ref().lines().map(|l| l.trim_end().to_string()));
        self
    }

    /// Appends a `quote!`-built fragment verbatim.
    pub fn write_tokens(&mut self, tokens: TokenStream) -> &mut Self {
        self.write(tokens.to_string())
    }

    /// Writes `header` and enters a new scope.
    pub fn open_scope(&mut self, header: impl AsRef<str>) -> &mut Self {
        let header = header.as_ref();
        self.write(header);
        self.scopes.push(header.to_string());
        self
    }

    /// Leaves the innermost scope and writes `footer`.
    ///
    /// ## Errors
    ///
    /// Returns `UnbalancedScope` if no scope is open.
    pub fn close_scope(&mut self, footer: impl AsRef<str>) -> Result<&mut Self, GeneratorError> {
        if self.scopes.pop().is_none() {
            return Err(GeneratorError::UnbalancedScope {
                namespace: self.namespace.clone(),
                detail: format!("'{}' closes a scope that was never opened", footer.as_ref()),
            });
        }
        self.write(footer);
        Ok(self)
    }

    /// Records the imports and dependencies `symbol` needs.
    ///
    /// Types from the writer's own namespace and always-in-scope types are
    /// never imported. Referenced symbols are registered recursively.
    pub fn register_import(&mut self, symbol: &Symbol) -> &mut Self {
        self.add_symbol_import(symbol, None)
    }

    /// Like [`register_import`](Self::register_import), importing the head
    /// type under `alias`.
    pub fn register_import_as(&mut self, symbol: &Symbol, alias: impl Into<String>) -> &mut Self {
        self.add_symbol_import(symbol, Some(alias.into()))
    }

    /// Imports `name` from `namespace` directly.
    pub fn import(&mut self, namespace: impl Into<String>, name: impl Into<String>) -> &mut Self {
        let namespace = namespace.into();
        if !namespace.is_empty() && namespace != self.namespace {
            self.imports
                .entry(namespace)
                .or_default()
                .insert((name.into(), None));
        }
        self
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> &mut Self {
        self.dependencies.insert(dependency);
        self
    }

    pub fn dependencies(&self) -> &BTreeSet<Dependency> {
        &self.dependencies
    }

    /// Whether `name` is imported from `namespace`.
    pub fn imports(&self, namespace: &str, name: &str) -> bool {
        self.imports
            .get(namespace)
            .is_some_and(|names| names.iter().any(|(n, _)| n == name))
    }

    fn add_symbol_import(&mut self, symbol: &Symbol, alias: Option<String>) -> &mut Self {
        self.dependencies.extend(symbol.dependencies.iter().cloned());
        if !symbol.namespace.is_empty() && symbol.namespace != self.namespace {
            self.imports
                .entry(symbol.namespace.clone())
                .or_default()
                .insert((symbol.definition.clone(), alias));
        }
        for reference in &symbol.references {
            self.add_symbol_import(reference, None);
        }
        self
    }

    /// Renders the module: marker, module docs, sorted imports, body.
    ///
    /// ## Errors
    ///
    /// Returns `UnbalancedScope` if any scope is still open.
    pub fn finalize(self) -> Result<FinalizedUnit, GeneratorError> {
        if let Some(open) = self.scopes.last() {
            return Err(GeneratorError::UnbalancedScope {
                namespace: self.namespace,
                detail: format!(
                    "{} scope(s) still open, innermost '{}'",
                    self.scopes.len(),
                    open
                ),
            });
        }

        let mut out = String::new();
        out.push_str(GENERATED_MARKER);
        out.push_str("\n\n");

        out.push_str(&format!("//! Generated module `{}`.\n", self.namespace));
        if !self.module_docs.is_empty() {
            out.push_str("//!\n");
            for doc in &self.module_docs {
                if doc.is_empty() {
                    out.push_str("//!\n");
                } else {
                    out.push_str(&format!("//! {}\n", doc));
                }
            }
        }
        out.push('\n');

        if !self.imports.is_empty() {
            for (namespace, names) in &self.imports {
                let rendered: Vec<String> = names
                    .iter()
                    .map(|(name, alias)| match alias {
                        Some(alias) => format!("{} as {}", name, alias),
                        None => name.clone(),
                    })
                    .collect();
                if rendered.len() == 1 {
                    out.push_str(&format!("use {}::{};\n", namespace, rendered[0]));
                } else {
                    out.push_str(&format!("use {}::{{{}}};\n", namespace, rendered.join(", ")));
                }
            }
            out.push('\n');
        }

        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }

        Ok(FinalizedUnit {
            namespace: self.namespace,
            source: out,
            dependencies: self.dependencies,
        })
    }
}
