//! Recursive JSON (de)serialization emitters for model shapes.
//!
//! This is the core of the generator. For every structure and union it
//! emits `decode(&serde_json::Value) -> Result<Self, DecodeError>` and
//! `encode(&self) -> serde_json::Value`; nested collections are decoded
//! and encoded inline, level by level, with one pair of loops per level.
//!
//! ## Wire mapping
//!
//! | Shape                | Wire form                                           |
//! |----------------------|-----------------------------------------------------|
//! | structure            | object keyed by member wire name                    |
//! | union                | object with exactly one non-null key                |
//! | list / set           | array                                               |
//! | list + `wrapped`     | `{"<member name>": [...]}`                          |
//! | map (string keys)    | object                                              |
//! | map + `wrapped`      | `{"entry": [{"key": .., "value": ..}, ..]}`         |
//! | blob                 | base64 string                                       |
//! | timestamp            | epoch seconds                                       |
//! | enum                 | its string value                                    |
//!
//! Dense collections skip `null` elements when decoding; `sparse` ones keep
//! them as `None` and encode `None` back as `null`.
//!
//! ## Generated names
//!
//! Temporaries are named after the member being coded, a role, and the
//! nesting depth: decoding a `contents` member that is a list of lists
//! produces `contents_buffer0` for the outer buffer and `contents_buffer1`
//! for the inner one. The [`CodecPath`] threaded through the recursion
//! carries the member, the depth, and the collection shapes currently
//! being expanded; re-entering one of those is an `InvalidShapeGraph`
//! error instead of unbounded recursion.

use stencil_define::{HasTraits, Member, Model, PrimitiveType, Shape, ShapeId, ShapeKind};

use super::coding_keys::{coding_keys_name, key_expr};
use crate::errors::GeneratorError;
use crate::naming::{field_name, temp_base, type_name};
use crate::symbol::SymbolProvider;
use crate::validation::resolve_shape;
use crate::writer::CodeWriter;

/// Key holding the entry list of a wrapped map.
pub const MAP_ENTRY_KEY: &str = "entry";

/// Naming and cycle-tracking state for one member's codec.
#[derive(Debug, Clone)]
pub struct CodecPath {
    member: String,
    depth: usize,
    visiting: Vec<ShapeId>,
}

impl CodecPath {
    /// A path rooted at `member`, depth zero.
    pub fn new(member: &str) -> Self {
        Self {
            member: temp_base(member),
            depth: 0,
            visiting: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Temporary name for `role` at the current depth (`contents_buffer0`).
    pub fn temp(&self, role: &str) -> String {
        format!("{}_{}{}", self.member, role, self.depth)
    }

    /// Name bound to a member-level value (`contents_decoded`).
    pub fn local(&self, role: &str) -> String {
        format!("{}_{}", self.member, role)
    }

    /// Marks a collection shape as being expanded.
    fn enter(&mut self, id: &ShapeId) -> Result<(), GeneratorError> {
        if self.visiting.contains(id) {
            let mut path: Vec<String> = self.visiting.iter().map(ToString::to_string).collect();
            path.push(id.to_string());
            return Err(GeneratorError::InvalidShapeGraph {
                reason: "collection contains itself".to_string(),
                path,
            });
        }
        self.visiting.push(id.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.visiting.pop();
    }

    /// Runs `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Emits codecs for shapes.
///
/// `source` expressions passed to decode have type `&serde_json::Value`;
/// those passed to encode have type `&T` for the shape's Rust type. Both
/// bind the result to a new local named `binding`.
pub trait ShapeCodec {
    /// Emits statements binding `binding` to the decoded value of `source`.
    fn render_decode(
        &self,
        writer: &mut CodeWriter,
        target: &ShapeId,
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError>;

    /// Emits statements binding `binding` to the wire value of `source`.
    fn render_encode(
        &self,
        writer: &mut CodeWriter,
        target: &ShapeId,
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError>;

    /// Emits `decode`/`encode` for a structure.
    fn render_structure(
        &self,
        writer: &mut CodeWriter,
        symbols: &mut dyn SymbolProvider,
        shape: &Shape,
    ) -> Result<(), GeneratorError>;

    /// Emits `decode`/`encode` for a union.
    fn render_union(
        &self,
        writer: &mut CodeWriter,
        symbols: &mut dyn SymbolProvider,
        shape: &Shape,
    ) -> Result<(), GeneratorError>;
}

/// JSON codec over `serde_json::Value`.
pub struct JsonShapeCodec<'m> {
    model: &'m Model,
}

impl<'m> JsonShapeCodec<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    fn shape(&self, id: &ShapeId, path: &CodecPath) -> Result<&'m Shape, GeneratorError> {
        resolve_shape(self.model, id, &format!("codec for '{}'", path.member))
    }

    fn render_list_decode(
        &self,
        writer: &mut CodeWriter,
        shape: &Shape,
        member: &Member,
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        path.enter(&shape.id)?;

        if shape.is_wrapped() {
            let members = path.temp("members");
            writer.open_scope(format!(
                "let {} = match wire::expect_object({})?.get({:?}) {{",
                binding,
                source,
                member.wire_name()
            ));
            writer.write("None | Some(serde_json::Value::Null) => Vec::new(),");
            writer.open_scope(format!("Some({}) => {{", members));
            self.render_list_body(writer, shape, member, &members, path)?;
            writer.close_scope("}")?;
            writer.close_scope("};")?;
        } else {
            writer.open_scope(format!("let {} = {{", binding));
            self.render_list_body(writer, shape, member, source, path)?;
            writer.close_scope("};")?;
        }

        path.leave();
        Ok(())
    }

    /// Loop over a wire array, leaving the buffer as the block's value.
    fn render_list_body(
        &self,
        writer: &mut CodeWriter,
        shape: &Shape,
        member: &Member,
        array: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        let items = path.temp("items");
        let buffer = path.temp("buffer");
        let value = path.temp("value");
        let element = path.temp("element");
        let sparse = shape.is_sparse();

        writer.write(format!("let {} = wire::expect_array({})?;", items, array));
        writer.write(format!(
            "let mut {} = Vec::with_capacity({}.len());",
            buffer, items
        ));
        writer.open_scope(format!("for {} in {} {{", value, items));
        writer.open_scope(format!("if {}.is_null() {{", value));
        if sparse {
            writer.write(format!("{}.push(None);", buffer));
        }
        writer.write("continue;");
        writer.close_scope("}")?;

        path.nested(|path| self.render_decode(writer, &member.target, &value, &element, path))?;

        if sparse {
            writer.write(format!("{}.push(Some({}));", buffer, element));
        } else {
            writer.write(format!("{}.push({});", buffer, element));
        }
        writer.close_scope("}")?;
        writer.write(buffer);
        Ok(())
    }

    fn render_map_decode(
        &self,
        writer: &mut CodeWriter,
        shape: &Shape,
        (key, value): (&Member, &Member),
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        path.enter(&shape.id)?;
        writer.import("std::collections", "HashMap");

        let buffer = path.temp("buffer");
        let raw_key = path.temp("key");
        let map_key = path.temp("mapkey");
        let entry_value = path.temp("value");

        if shape.is_wrapped() {
            let members = path.temp("members");
            let items = path.temp("items");
            let entry = path.temp("entry");
            let fields = path.temp("fields");

            writer.open_scope(format!(
                "let {} = match wire::expect_object({})?.get({:?}) {{",
                binding, source, MAP_ENTRY_KEY
            ));
            writer.write("None | Some(serde_json::Value::Null) => HashMap::new(),");
            writer.open_scope(format!("Some({}) => {{", members));
            writer.write(format!("let {} = wire::expect_array({})?;", items, members));
            writer.write(format!(
                "let mut {} = HashMap::with_capacity({}.len());",
                buffer, items
            ));
            writer.open_scope(format!("for {} in {} {{", entry, items));
            writer.write(format!("let {} = wire::expect_object({})?;", fields, entry));
            writer.write(format!(
                "let {} = wire::decode_str(wire::entry_field({}, {:?})?)?;",
                raw_key,
                fields,
                key.wire_name()
            ));
            let conversion = self.key_from_str(&key.target, &raw_key, path)?;
            writer.write(format!("let {} = {};", map_key, conversion));
            writer.write(format!(
                "let {} = {}.get({:?}).unwrap_or(&wire::NULL);",
                entry_value,
                fields,
                value.wire_name()
            ));
            self.render_map_entry(writer, shape, value, &buffer, &map_key, &entry_value, path)?;
            writer.close_scope("}")?;
            writer.write(&buffer);
            writer.close_scope("}")?;
            writer.close_scope("};")?;
        } else {
            let entries = path.temp("entries");

            writer.open_scope(format!("let {} = {{", binding));
            writer.write(format!("let {} = wire::expect_object({})?;", entries, source));
            writer.write(format!(
                "let mut {} = HashMap::with_capacity({}.len());",
                buffer, entries
            ));
            writer.open_scope(format!("for ({}, {}) in {} {{", raw_key, entry_value, entries));
            let conversion =
                self.key_from_str(&key.target, &format!("{}.as_str()", raw_key), path)?;
            writer.write(format!("let {} = {};", map_key, conversion));
            self.render_map_entry(writer, shape, value, &buffer, &map_key, &entry_value, path)?;
            writer.close_scope("}")?;
            writer.write(&buffer);
            writer.close_scope("};")?;
        }

        path.leave();
        Ok(())
    }

    /// Null check, value decode, and insert for one map entry.
    #[allow(clippy::too_many_arguments)]
    fn render_map_entry(
        &self,
        writer: &mut CodeWriter,
        shape: &Shape,
        value: &Member,
        buffer: &str,
        map_key: &str,
        entry_value: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        let element = path.temp("element");
        let sparse = shape.is_sparse();

        writer.open_scope(format!("if {}.is_null() {{", entry_value));
        if sparse {
            writer.write(format!("{}.insert({}, None);", buffer, map_key));
        }
        writer.write("continue;");
        writer.close_scope("}")?;

        path.nested(|path| self.render_decode(writer, &value.target, entry_value, &element, path))?;

        if sparse {
            writer.write(format!("{}.insert({}, Some({}));", buffer, map_key, element));
        } else {
            writer.write(format!("{}.insert({}, {});", buffer, map_key, element));
        }
        Ok(())
    }

    /// Expression converting a `&str` wire key to the map's key type.
    fn key_from_str(
        &self,
        key: &ShapeId,
        text: &str,
        path: &CodecPath,
    ) -> Result<String, GeneratorError> {
        let shape = self.shape(key, path)?;
        match &shape.kind {
            ShapeKind::Primitive(PrimitiveType::String) => Ok(format!("{}.to_string()", text)),
            ShapeKind::Primitive(p) if integer_type(*p).is_some() => Ok(format!(
                "wire::parse_key::<{}>({})?",
                integer_type(*p).unwrap_or("i64"),
                text
            )),
            ShapeKind::Enum { .. } => Ok(format!("{}::from({})", type_name(key.name()), text)),
            _ => Err(GeneratorError::InvalidShapeGraph {
                reason: format!("unsupported map key shape {}", key),
                path: vec![key.to_string()],
            }),
        }
    }

    /// Expression converting a `&K` map key to its wire string.
    fn key_to_string(
        &self,
        key: &ShapeId,
        item: &str,
        path: &CodecPath,
    ) -> Result<String, GeneratorError> {
        let shape = self.shape(key, path)?;
        match &shape.kind {
            ShapeKind::Primitive(PrimitiveType::String) => Ok(format!("{}.clone()", item)),
            ShapeKind::Enum { .. } => Ok(format!("{}.as_str().to_string()", item)),
            _ => Ok(format!("{}.to_string()", item)),
        }
    }

    fn render_list_encode(
        &self,
        writer: &mut CodeWriter,
        shape: &Shape,
        member: &Member,
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        path.enter(&shape.id)?;

        let array = path.temp("array");
        let item = path.temp("item");
        let present = path.temp("present");
        let element = path.temp("element");

        writer.open_scope(format!("let {} = {{", binding));
        writer.write(format!(
            "let mut {} = Vec::with_capacity({}.len());",
            array,
            receiver(source)
        ));
        writer.open_scope(format!("for {} in {}.iter() {{", item, receiver(source)));
        if shape.is_sparse() {
            writer.open_scope(format!("match {} {{", item));
            writer.write(format!("None => {}.push(serde_json::Value::Null),", array));
            writer.open_scope(format!("Some({}) => {{", present));
            path.nested(|path| self.render_encode(writer, &member.target, &present, &element, path))?;
            writer.write(format!("{}.push({});", array, element));
            writer.close_scope("}")?;
            writer.close_scope("}")?;
        } else {
            path.nested(|path| self.render_encode(writer, &member.target, &item, &element, path))?;
            writer.write(format!("{}.push({});", array, element));
        }
        writer.close_scope("}")?;

        if shape.is_wrapped() {
            let wrapper = path.temp("wrapper");
            writer.write(format!("let mut {} = serde_json::Map::new();", wrapper));
            writer.write(format!(
                "{}.insert({:?}.to_string(), serde_json::Value::Array({}));",
                wrapper,
                member.wire_name(),
                array
            ));
            writer.write(format!("serde_json::Value::Object({})", wrapper));
        } else {
            writer.write(format!("serde_json::Value::Array({})", array));
        }
        writer.close_scope("};")?;

        path.leave();
        Ok(())
    }

    fn render_map_encode(
        &self,
        writer: &mut CodeWriter,
        shape: &Shape,
        (key, value): (&Member, &Member),
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        path.enter(&shape.id)?;

        let map_key = path.temp("key");
        let item = path.temp("item");
        let present = path.temp("present");
        let element = path.temp("element");
        let key_string = self.key_to_string(&key.target, &map_key, path)?;

        // Inserts `element` (or null) into `object` under `key_name`.
        let insert = |writer: &mut CodeWriter,
                      path: &mut CodecPath,
                      object: &str,
                      key_name: &str|
         -> Result<(), GeneratorError> {
            if shape.is_sparse() {
                writer.open_scope(format!("match {} {{", item));
                writer.open_scope("None => {");
                writer.write(format!(
                    "{}.insert({}, serde_json::Value::Null);",
                    object, key_name
                ));
                writer.close_scope("}")?;
                writer.open_scope(format!("Some({}) => {{", present));
                path.nested(|path| self.render_encode(writer, &value.target, &present, &element, path))?;
                writer.write(format!("{}.insert({}, {});", object, key_name, element));
                writer.close_scope("}")?;
                writer.close_scope("}")?;
            } else {
                path.nested(|path| self.render_encode(writer, &value.target, &item, &element, path))?;
                writer.write(format!("{}.insert({}, {});", object, key_name, element));
            }
            Ok(())
        };

        writer.open_scope(format!("let {} = {{", binding));
        if shape.is_wrapped() {
            let entries = path.temp("entries");
            let entry = path.temp("entry");
            let wrapper = path.temp("wrapper");

            writer.write(format!(
                "let mut {} = Vec::with_capacity({}.len());",
                entries,
                receiver(source)
            ));
            writer.open_scope(format!(
                "for ({}, {}) in {}.iter() {{",
                map_key,
                item,
                receiver(source)
            ));
            writer.write(format!("let mut {} = serde_json::Map::new();", entry));
            writer.write(format!(
                "{}.insert({:?}.to_string(), serde_json::Value::from({}));",
                entry,
                key.wire_name(),
                key_string
            ));
            insert(
                writer,
                path,
                &entry,
                &format!("{:?}.to_string()", value.wire_name()),
            )?;
            writer.write(format!(
                "{}.push(serde_json::Value::Object({}));",
                entries, entry
            ));
            writer.close_scope("}")?;
            writer.write(format!("let mut {} = serde_json::Map::new();", wrapper));
            writer.write(format!(
                "{}.insert({:?}.to_string(), serde_json::Value::Array({}));",
                wrapper, MAP_ENTRY_KEY, entries
            ));
            writer.write(format!("serde_json::Value::Object({})", wrapper));
        } else {
            let object = path.temp("object");

            writer.write(format!("let mut {} = serde_json::Map::new();", object));
            writer.open_scope(format!(
                "for ({}, {}) in {}.iter() {{",
                map_key,
                item,
                receiver(source)
            ));
            insert(writer, path, &object, &key_string)?;
            writer.close_scope("}")?;
            writer.write(format!("serde_json::Value::Object({})", object));
        }
        writer.close_scope("};")?;

        path.leave();
        Ok(())
    }

    /// Statements producing `binding` for a struct member's decoded field value.
    fn render_member_decode(
        &self,
        writer: &mut CodeWriter,
        symbols: &mut dyn SymbolProvider,
        shape: &Shape,
        member: &Member,
    ) -> Result<String, GeneratorError> {
        let symbol = symbols.member_symbol(&shape.id, member)?;
        let mut path = CodecPath::new(&member.name);
        let decoded = path.local("decoded");
        let wire = path.local("wire");
        let value = path.local("member");

        writer.open_scope(format!(
            "let {} = match container.get({}) {{",
            decoded,
            key_expr(shape, member)
        ));
        if member.required && member.default_value().is_none() {
            writer.open_scope("None | Some(serde_json::Value::Null) => {");
            writer.open_scope("return Err(DecodeError::MissingRequiredMember {");
            writer.write(format!("shape: {:?},", shape.id.name()));
            writer.write(format!("member: {:?},", member.wire_name()));
            writer.close_scope("});")?;
            writer.close_scope("}")?;
        } else {
            writer.write(format!(
                "None | Some(serde_json::Value::Null) => {:#},",
                symbol
            ));
        }

        writer.open_scope(format!("Some({}) => {{", wire));
        self.render_decode(writer, &member.target, &wire, &value, &mut path)?;
        let mut wrapped = value;
        if symbol.is_boxed() {
            wrapped = format!("Box::new({})", wrapped);
        }
        if symbol.nullable {
            wrapped = format!("Some({})", wrapped);
        }
        writer.write(wrapped);
        writer.close_scope("}")?;
        writer.close_scope("};")?;

        Ok(decoded)
    }
}

impl ShapeCodec for JsonShapeCodec<'_> {
    fn render_decode(
        &self,
        writer: &mut CodeWriter,
        target: &ShapeId,
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        let shape = self.shape(target, path)?;
        match &shape.kind {
            ShapeKind::Primitive(primitive) => {
                writer.write(format!(
                    "let {} = {};",
                    binding,
                    decode_primitive(*primitive, source)
                ));
            }
            ShapeKind::Enum { .. } => {
                writer.write(format!(
                    "let {} = {}::from(wire::decode_str({})?);",
                    binding,
                    type_name(target.name()),
                    source
                ));
            }
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } => {
                writer.write(format!(
                    "let {} = {}::decode({})?;",
                    binding,
                    type_name(target.name()),
                    source
                ));
            }
            ShapeKind::List { member } | ShapeKind::Set { member } => {
                self.render_list_decode(writer, shape, member, source, binding, path)?;
            }
            ShapeKind::Map { key, value } => {
                self.render_map_decode(writer, shape, (key, value), source, binding, path)?;
            }
        }
        Ok(())
    }

    fn render_encode(
        &self,
        writer: &mut CodeWriter,
        target: &ShapeId,
        source: &str,
        binding: &str,
        path: &mut CodecPath,
    ) -> Result<(), GeneratorError> {
        let shape = self.shape(target, path)?;
        match &shape.kind {
            ShapeKind::Primitive(primitive) => {
                writer.write(format!(
                    "let {} = {};",
                    binding,
                    encode_primitive(*primitive, source)
                ));
            }
            ShapeKind::Enum { .. } => {
                writer.write(format!(
                    "let {} = serde_json::Value::from({}.as_str());",
                    binding,
                    receiver(source)
                ));
            }
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } => {
                writer.write(format!("let {} = {}.encode();", binding, receiver(source)));
            }
            ShapeKind::List { member } | ShapeKind::Set { member } => {
                self.render_list_encode(writer, shape, member, source, binding, path)?;
            }
            ShapeKind::Map { key, value } => {
                self.render_map_encode(writer, shape, (key, value), source, binding, path)?;
            }
        }
        Ok(())
    }

    fn render_structure(
        &self,
        writer: &mut CodeWriter,
        symbols: &mut dyn SymbolProvider,
        shape: &Shape,
    ) -> Result<(), GeneratorError> {
        let name = type_name(shape.id.name());
        let members = shape.members();

        writer.open_scope(format!("impl {} {{", name));

        writer.write_doc(format!(
            "Decodes a `{}` from its keyed wire container.\n\n## Errors\n\nFails when the value has the wrong type or a required member is missing.",
            name
        ));
        writer.open_scope("pub fn decode(value: &serde_json::Value) -> Result<Self, DecodeError> {");
        if members.is_empty() {
            writer.write("wire::expect_object(value)?;");
            writer.write("Ok(Self {})");
        } else {
            writer.write("let container = wire::expect_object(value)?;");
            let mut fields = Vec::with_capacity(members.len());
            for member in members {
                let decoded = self.render_member_decode(writer, symbols, shape, member)?;
                fields.push(format!("{}: {},", field_name(&member.name), decoded));
            }
            writer.open_scope("Ok(Self {");
            for field in fields {
                writer.write(field);
            }
            writer.close_scope("})")?;
        }
        writer.close_scope("}")?;
        writer.write_empty();

        writer.write_doc(format!("Encodes this `{}` as a keyed wire container.", name));
        writer.open_scope("pub fn encode(&self) -> serde_json::Value {");
        if members.is_empty() {
            writer.write("serde_json::Value::Object(serde_json::Map::new())");
        } else {
            writer.write("let mut container = serde_json::Map::new();");
            for member in members {
                let symbol = symbols.member_symbol(&shape.id, member)?;
                let mut path = CodecPath::new(&member.name);
                let wire = path.local("wire");
                let insert = format!(
                    "container.insert({}.to_string(), {});",
                    key_expr(shape, member),
                    wire
                );

                if symbol.nullable {
                    let present = path.local("present");
                    writer.open_scope(format!(
                        "if let Some({}) = &self.{} {{",
                        present,
                        field_name(&member.name)
                    ));
                    self.render_encode(writer, &member.target, &present, &wire, &mut path)?;
                    writer.write(insert);
                    writer.close_scope("}")?;
                } else {
                    let source = format!("&self.{}", field_name(&member.name));
                    self.render_encode(writer, &member.target, &source, &wire, &mut path)?;
                    writer.write(insert);
                }
            }
            writer.write("serde_json::Value::Object(container)");
        }
        writer.close_scope("}")?;

        writer.close_scope("}")?;
        writer.write_empty();
        Ok(())
    }

    fn render_union(
        &self,
        writer: &mut CodeWriter,
        symbols: &mut dyn SymbolProvider,
        shape: &Shape,
    ) -> Result<(), GeneratorError> {
        let name = type_name(shape.id.name());
        let keys = coding_keys_name(shape);
        let members = shape.members();

        writer.open_scope(format!("impl {} {{", name));

        writer.write_doc(format!(
            "Decodes a `{}` from a container holding exactly one variant.\n\nKeys this client does not know decode to `Unknown`.",
            name
        ));
        writer.open_scope("pub fn decode(value: &serde_json::Value) -> Result<Self, DecodeError> {");
        writer.write("let container = wire::expect_object(value)?;");
        writer.write("let mut present = container.iter().filter(|(_, v)| !v.is_null());");
        writer.open_scope("let (key, variant) = match (present.next(), present.next()) {");
        writer.write("(Some(entry), None) => entry,");
        writer.write(format!(
            "_ => return Err(DecodeError::InvalidUnion {{ shape: {:?} }}),",
            shape.id.name()
        ));
        writer.close_scope("};")?;
        writer.open_scope(format!("match {}::from_wire(key) {{", keys));
        for member in members {
            let symbol = symbols.member_symbol(&shape.id, member)?;
            let mut path = CodecPath::new(&member.name);
            let value = path.local("member");
            let variant = type_name(&member.name);

            writer.open_scope(format!("Some({}::{}) => {{", keys, variant));
            self.render_decode(writer, &member.target, "variant", &value, &mut path)?;
            if symbol.is_boxed() {
                writer.write(format!("Ok(Self::{}(Box::new({})))", variant, value));
            } else {
                writer.write(format!("Ok(Self::{}({}))", variant, value));
            }
            writer.close_scope("}")?;
        }
        writer.write("_ => Ok(Self::Unknown(key.clone())),");
        writer.close_scope("}")?;
        writer.close_scope("}")?;
        writer.write_empty();

        writer.write_doc(format!(
            "Encodes this `{}` as a single-key container. `Unknown` encodes as an empty object.",
            name
        ));
        writer.open_scope("pub fn encode(&self) -> serde_json::Value {");
        writer.write("let mut container = serde_json::Map::new();");
        writer.open_scope("match self {");
        for member in members {
            let mut path = CodecPath::new(&member.name);
            let bound = path.local("variant");
            let wire = path.local("wire");

            writer.open_scope(format!("Self::{}({}) => {{", type_name(&member.name), bound));
            self.render_encode(writer, &member.target, &bound, &wire, &mut path)?;
            writer.write(format!(
                "container.insert({}.to_string(), {});",
                key_expr(shape, member),
                wire
            ));
            writer.close_scope("}")?;
        }
        writer.write("Self::Unknown(_) => {}");
        writer.close_scope("}")?;
        writer.write("serde_json::Value::Object(container)");
        writer.close_scope("}")?;

        writer.close_scope("}")?;
        writer.write_empty();
        Ok(())
    }
}

/// Rust integer type for integer primitives.
fn integer_type(primitive: PrimitiveType) -> Option<&'static str> {
    match primitive {
        PrimitiveType::Byte => Some("i8"),
        PrimitiveType::Short => Some("i16"),
        PrimitiveType::Integer => Some("i32"),
        PrimitiveType::Long => Some("i64"),
        _ => None,
    }
}

fn decode_primitive(primitive: PrimitiveType, source: &str) -> String {
    match primitive {
        PrimitiveType::Boolean => format!("wire::decode_bool({})?", source),
        PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Integer | PrimitiveType::Long => {
            format!(
                "wire::decode_integer::<{}>({})?",
                integer_type(primitive).unwrap_or("i64"),
                source
            )
        }
        PrimitiveType::Float => format!("wire::decode_f32({})?", source),
        PrimitiveType::Double => format!("wire::decode_f64({})?", source),
        PrimitiveType::String => format!("wire::decode_string({})?", source),
        PrimitiveType::Blob => format!("wire::decode_blob({})?", source),
        PrimitiveType::Timestamp => format!("wire::decode_timestamp({})?", source),
        PrimitiveType::Document => format!("{}.clone()", source),
    }
}

fn encode_primitive(primitive: PrimitiveType, source: &str) -> String {
    match primitive {
        PrimitiveType::Boolean
        | PrimitiveType::Byte
        | PrimitiveType::Short
        | PrimitiveType::Integer
        | PrimitiveType::Long
        | PrimitiveType::Float
        | PrimitiveType::Double => format!("serde_json::Value::from(*{})", source),
        PrimitiveType::String => format!("serde_json::Value::from({}.as_str())", receiver(source)),
        PrimitiveType::Blob => format!("wire::encode_blob({})", source),
        PrimitiveType::Timestamp => format!("wire::encode_timestamp({})", source),
        PrimitiveType::Document => format!("{}.clone()", receiver(source)),
    }
}

/// Parenthesizes `&expr` so a method call applies to the reference.
fn receiver(source: &str) -> String {
    if source.starts_with('&') {
        format!("({})", source)
    } else {
        source.to_string()
    }
}
