//! Coding-key enums for keyed wire containers.
//!
//! Every structure and union gets a `<Name>CodingKeys` enum with exactly one
//! variant per member, in declaration order. The variant maps to the
//! member's wire name (its `jsonName` trait, or the member name), so decode
//! and encode never spell a wire key twice.

use stencil_define::{Member, Shape};

use crate::errors::GeneratorError;
use crate::naming::type_name;
use crate::writer::CodeWriter;

/// One member's coding key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingKey {
    /// Enum variant (`CityId`).
    pub variant: String,
    /// Key in the wire container (`cityId`).
    pub wire_name: String,
    /// Model member name.
    pub member: String,
}

impl CodingKey {
    pub fn for_member(member: &Member) -> Self {
        Self {
            variant: type_name(&member.name),
            wire_name: member.wire_name().to_string(),
            member: member.name.clone(),
        }
    }
}

/// Name of the coding-key enum for a shape (`CityCodingKeys`).
pub fn coding_keys_name(shape: &Shape) -> String {
    format!("{}CodingKeys", type_name(shape.id.name()))
}

/// Coding keys for every member of a structure or union, in order.
pub fn coding_keys(shape: &Shape) -> Vec<CodingKey> {
    shape.members().iter().map(CodingKey::for_member).collect()
}

/// Expression for the wire key string of `member` (`CityCodingKeys::Name.as_str()`).
pub fn key_expr(shape: &Shape, member: &Member) -> String {
    format!(
        "{}::{}.as_str()",
        coding_keys_name(shape),
        type_name(&member.name)
    )
}

/// Emits the coding-key enum and its lookup functions.
pub fn render_coding_keys(writer: &mut CodeWriter, shape: &Shape) -> Result<(), GeneratorError> {
    let name = coding_keys_name(shape);
    let keys = coding_keys(shape);

    writer.write_doc(format!(
        "Wire keys of [`{}`], one per member in declaration order.",
        type_name(shape.id.name())
    ));
    writer.write("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
    writer.open_scope(format!("pub enum {} {{", name));
    for key in &keys {
        writer.write(format!("{},", key.variant));
    }
    writer.close_scope("}")?;
    writer.write_empty();

    writer.open_scope(format!("impl {} {{", name));

    let all: Vec<String> = keys.iter().map(|k| format!("Self::{}", k.variant)).collect();
    writer.write(format!("pub const ALL: &'static [Self] = &[{}];", all.join(", ")));
    writer.write_empty();

    writer.write_doc("Key used in the wire container.");
    writer.open_scope("pub fn as_str(self) -> &'static str {");
    writer.open_scope("match self {");
    for key in &keys {
        writer.write(format!("Self::{} => {:?},", key.variant, key.wire_name));
    }
    writer.close_scope("}")?;
    writer.close_scope("}")?;
    writer.write_empty();

    writer.write_doc("Looks up the key for a wire container entry.");
    writer.open_scope("pub fn from_wire(key: &str) -> Option<Self> {");
    if keys.is_empty() {
        writer.write("let _ = key;");
        writer.write("None");
    } else {
        writer.open_scope("match key {");
        for key in &keys {
            writer.write(format!("{:?} => Some(Self::{}),", key.wire_name, key.variant));
        }
        writer.write("_ => None,");
        writer.close_scope("}")?;
    }
    writer.close_scope("}")?;

    writer.close_scope("}")?;
    writer.write_empty();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_define::{ShapeId, Trait};

    fn forecast() -> Shape {
        Shape::structure(
            ShapeId::new("test", "Forecast"),
            vec![
                Member::required("cityId", ShapeId::prelude("String")),
                Member::optional("high", ShapeId::prelude("Double"))
                    .with_trait(Trait::JsonName("High".to_string())),
            ],
        )
    }

    #[test]
    fn keys_follow_declaration_order_and_wire_names() {
        let keys = coding_keys(&forecast());
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].variant, "CityId");
        assert_eq!(keys[0].wire_name, "cityId");
        assert_eq!(keys[1].variant, "High");
        assert_eq!(keys[1].wire_name, "High");
        assert_eq!(keys[1].member, "high");
    }

    #[test]
    fn renders_enum_with_exact_key_set() {
        let mut writer = CodeWriter::new("crate::model");
        render_coding_keys(&mut writer, &forecast()).unwrap();
        let code = writer.finalize().unwrap().source;

        assert!(code.contains("pub enum ForecastCodingKeys {"), "got:\n{}", code);
        assert!(
            code.contains("pub const ALL: &'static [Self] = &[Self::CityId, Self::High];"),
            "got:\n{}",
            code
        );
        assert!(code.contains("Self::CityId => \"cityId\","), "got:\n{}", code);
        assert!(code.contains("\"High\" => Some(Self::High),"), "got:\n{}", code);
    }

    #[test]
    fn empty_structure_gets_empty_key_set() {
        let shape = Shape::structure(ShapeId::new("test", "Empty"), vec![]);
        let mut writer = CodeWriter::new("crate::model");
        render_coding_keys(&mut writer, &shape).unwrap();
        let code = writer.finalize().unwrap().source;
        assert!(code.contains("pub const ALL: &'static [Self] = &[];"), "got:\n{}", code);
        syn::parse_file(&code).unwrap();
    }

    #[test]
    fn key_expr_uses_coding_keys() {
        let shape = forecast();
        assert_eq!(
            key_expr(&shape, &shape.members()[0]),
            "ForecastCodingKeys::CityId.as_str()"
        );
    }
}
