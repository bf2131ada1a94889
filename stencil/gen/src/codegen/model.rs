//! Generation of the `model` module: one Rust type per structure, union,
//! and enum shape, each with its codec.
//!
//! Collections and primitives have no types of their own; they appear
//! inline as `Vec<..>`, `HashMap<..>`, and scalar types through their
//! symbols.

use std::collections::BTreeSet;

use stencil_define::{EnumValue, HasTraits, Model, Shape, ShapeId, ShapeKind};
use tracing::debug;

use super::coding_keys::render_coding_keys;
use super::shape_codec::{JsonShapeCodec, ShapeCodec};
use crate::errors::GeneratorError;
use crate::naming::{field_name, type_name};
use crate::symbol::{Dependency, MODEL_NAMESPACE, SymbolProvider};
use crate::validation::resolve_shape;
use crate::writer::{CodeWriter, FinalizedUnit};

/// Generates the model module for the given shapes.
///
/// Shapes are emitted in id order, so output is stable between runs.
///
/// ## Errors
///
/// Propagates symbol resolution and codec errors.
pub fn generate_model_module(
    model: &Model,
    symbols: &mut dyn SymbolProvider,
    shapes: &BTreeSet<ShapeId>,
) -> Result<FinalizedUnit, GeneratorError> {
    let codec = JsonShapeCodec::new(model);
    let mut writer = CodeWriter::new(MODEL_NAMESPACE);
    writer.write_module_doc("Data types exchanged with the service, with their wire codecs.");
    writer.import("crate", "wire");
    writer.import("crate::wire", "DecodeError");
    writer.add_dependency(Dependency::serde_json());

    let mut emitted = 0;
    for id in shapes {
        let shape = resolve_shape(model, id, "model generation")?;
        match &shape.kind {
            ShapeKind::Structure { .. } => {
                render_structure_type(&mut writer, symbols, shape)?;
                render_coding_keys(&mut writer, shape)?;
                codec.render_structure(&mut writer, symbols, shape)?;
            }
            ShapeKind::Union { .. } => {
                render_union_type(&mut writer, symbols, shape)?;
                render_coding_keys(&mut writer, shape)?;
                codec.render_union(&mut writer, symbols, shape)?;
            }
            ShapeKind::Enum { values } => {
                render_enum_type(&mut writer, shape, values)?;
            }
            ShapeKind::List { .. }
            | ShapeKind::Set { .. }
            | ShapeKind::Map { .. }
            | ShapeKind::Primitive(_) => {
                // Register inline types so their imports and crates follow.
                let symbol = symbols.symbol_for(id)?;
                writer.register_import(&symbol);
                continue;
            }
        }
        emitted += 1;
    }

    debug!(types = emitted, "generated model module");
    writer.finalize()
}

fn render_docs(writer: &mut CodeWriter, shape: &Shape) {
    if let Some(docs) = shape.documentation() {
        writer.write_doc(docs);
    }
}

fn render_structure_type(
    writer: &mut CodeWriter,
    symbols: &mut dyn SymbolProvider,
    shape: &Shape,
) -> Result<(), GeneratorError> {
    render_docs(writer, shape);
    writer.write("#[derive(Debug, Clone, PartialEq)]");
    writer.open_scope(format!("pub struct {} {{", type_name(shape.id.name())));
    for member in shape.members() {
        let symbol = symbols.member_symbol(&shape.id, member)?;
        writer.register_import(&symbol);
        if let Some(docs) = member.documentation() {
            writer.write_doc(docs);
        }
        writer.write(format!("pub {}: {},", field_name(&member.name), symbol));
    }
    writer.close_scope("}")?;
    writer.write_empty();
    Ok(())
}

fn render_union_type(
    writer: &mut CodeWriter,
    symbols: &mut dyn SymbolProvider,
    shape: &Shape,
) -> Result<(), GeneratorError> {
    render_docs(writer, shape);
    writer.write("#[derive(Debug, Clone, PartialEq)]");
    writer.open_scope(format!("pub enum {} {{", type_name(shape.id.name())));
    for member in shape.members() {
        let symbol = symbols.member_symbol(&shape.id, member)?;
        writer.register_import(&symbol);
        if let Some(docs) = member.documentation() {
            writer.write_doc(docs);
        }
        writer.write(format!("{}({}),", type_name(&member.name), symbol));
    }
    writer.write_doc("A variant this client does not know, with its wire key.");
    writer.write("Unknown(String),");
    writer.close_scope("}")?;
    writer.write_empty();
    Ok(())
}

/// Fallback variant name that cannot clash with a declared value.
fn unknown_variant(values: &[EnumValue]) -> String {
    let mut name = "Unknown".to_string();
    while values.iter().any(|v| type_name(&v.name) == name) {
        name.push_str("Value");
    }
    name
}

fn render_enum_type(
    writer: &mut CodeWriter,
    shape: &Shape,
    values: &[EnumValue],
) -> Result<(), GeneratorError> {
    let name = type_name(shape.id.name());
    let unknown = unknown_variant(values);

    render_docs(writer, shape);
    writer.write("#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]");
    writer.open_scope(format!("pub enum {} {{", name));
    for value in values {
        writer.write(format!("{},", type_name(&value.name)));
    }
    writer.write_doc("A value this client does not know.");
    writer.write(format!("{}(String),", unknown));
    writer.close_scope("}")?;
    writer.write_empty();

    writer.open_scope(format!("impl {} {{", name));
    let wire_values: Vec<String> = values.iter().map(|v| format!("{:?}", v.value)).collect();
    writer.write_doc("Every known wire value, in declaration order.");
    writer.write(format!(
        "pub const VALUES: &'static [&'static str] = &[{}];",
        wire_values.join(", ")
    ));
    writer.write_empty();
    writer.open_scope("pub fn as_str(&self) -> &str {");
    writer.open_scope("match self {");
    for value in values {
        writer.write(format!("Self::{} => {:?},", type_name(&value.name), value.value));
    }
    writer.write(format!("Self::{}(value) => value.as_str(),", unknown));
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.write_empty();

    writer.open_scope(format!("impl From<&str> for {} {{", name));
    writer.open_scope("fn from(value: &str) -> Self {");
    writer.open_scope("match value {");
    for value in values {
        writer.write(format!("{:?} => Self::{},", value.value, type_name(&value.name)));
    }
    writer.write(format!("other => Self::{}(other.to_string()),", unknown));
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.write_empty();

    writer.open_scope(format!("impl std::fmt::Display for {} {{", name));
    writer.open_scope("fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {");
    writer.write("f.write_str(self.as_str())");
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.write_empty();
    Ok(())
}
