//! Catalog service definition.
//!
//! A JSON RPC service: every call is `POST /` with the operation named in a
//! target header. The shapes exercise enums, unions, sets, documents, and
//! maps keyed by enums and integers.
//!
//! ## Operations
//!
//! - `ListItems`
//! - `GetItem`
//! - `PutItem`

use stencil_define::prelude::*;

/// Namespace of every catalog shape.
pub const NAMESPACE: &str = "example.catalog";

fn id(name: &str) -> ShapeId {
    ShapeId::new(NAMESPACE, name)
}

fn string() -> ShapeId {
    ShapeId::prelude("String")
}

/// Id of the `Catalog` service.
pub fn service_id() -> ShapeId {
    id("Catalog")
}

/// Creates the catalog model.
///
/// ## Examples
///
/// ```rust
/// use stencil_define::Protocol;
/// use stencil_definitions::catalog::{define_catalog_model, service_id};
///
/// let model = define_catalog_model().unwrap();
/// let service = model.service(&service_id()).unwrap();
/// assert_eq!(service.protocol, Some(Protocol::AwsJson1_1));
/// ```
pub fn define_catalog_model() -> Result<Model, ModelError> {
    Model::with_prelude()
        .with_shape(
            Shape::enumeration(
                id("Category"),
                vec![
                    EnumValue::new("BOOKS", "books"),
                    EnumValue::new("MUSIC", "music"),
                    EnumValue::new("GAMES", "games"),
                ],
            )
            .with_trait(Trait::Default(serde_json::Value::String("books".to_string()))),
        )?
        .with_shape(Shape::structure(
            id("PriceRange"),
            vec![
                Member::required("min", ShapeId::prelude("Double")),
                Member::required("max", ShapeId::prelude("Double")),
            ],
        ))?
        .with_shape(
            Shape::union(
                id("PriceTag"),
                vec![
                    Member::optional("fixed", ShapeId::prelude("Double")),
                    Member::optional("range", id("PriceRange")),
                    Member::optional("label", string()),
                ],
            )
            .with_trait(Trait::Documentation("How an item is priced.".to_string())),
        )?
        .with_shape(Shape::map(
            id("StockByWarehouse"),
            Member::required("key", ShapeId::prelude("Integer")),
            Member::required("value", ShapeId::prelude("Long")),
        ))?
        .with_shape(Shape::map(
            id("CountsByCategory"),
            Member::required("key", id("Category")),
            Member::required("value", ShapeId::prelude("Integer")),
        ))?
        .with_shape(Shape::set(id("TagSet"), Member::required("member", string())))?
        .with_shape(Shape::structure(
            id("Item"),
            vec![
                Member::required("id", string()).with_trait(Trait::JsonName("ItemId".to_string())),
                Member::optional("name", string()),
                Member::optional("category", id("Category")),
                Member::optional("price", id("PriceTag")),
                Member::optional("stock", id("StockByWarehouse")),
                Member::optional("tags", id("TagSet")),
                Member::optional("attributes", ShapeId::prelude("Document")),
            ],
        ))?
        .with_shape(Shape::list(id("ItemList"), Member::required("member", id("Item"))))?
        // ListItems
        .with_shape(Shape::structure(
            id("ListItemsInput"),
            vec![
                Member::optional("category", id("Category")),
                Member::optional("maxResults", ShapeId::prelude("Integer")).with_trait(Trait::Boxed),
                Member::optional("nextToken", string()),
            ],
        ))?
        .with_shape(Shape::structure(
            id("ListItemsOutput"),
            vec![
                Member::optional("items", id("ItemList")),
                Member::optional("counts", id("CountsByCategory")),
                Member::optional("nextToken", string()),
            ],
        ))?
        // GetItem
        .with_shape(Shape::structure(
            id("GetItemInput"),
            vec![Member::required("id", string())],
        ))?
        .with_shape(Shape::structure(
            id("GetItemOutput"),
            vec![Member::optional("item", id("Item"))],
        ))?
        // PutItem
        .with_shape(Shape::structure(
            id("PutItemInput"),
            vec![Member::required("item", id("Item"))],
        ))?
        .with_shape(Shape::structure(
            id("PutItemOutput"),
            vec![Member::required("version", ShapeId::prelude("Long"))],
        ))?
        .with_operation(
            Operation::new(id("ListItems"))
                .with_input(id("ListItemsInput"))
                .with_output(id("ListItemsOutput"))
                .with_documentation("Lists items, optionally in one category."),
        )?
        .with_operation(
            Operation::new(id("GetItem"))
                .with_input(id("GetItemInput"))
                .with_output(id("GetItemOutput")),
        )?
        .with_operation(
            Operation::new(id("PutItem"))
                .with_input(id("PutItemInput"))
                .with_output(id("PutItemOutput")),
        )?
        .with_service(
            Service::new(service_id(), "2024-06-01")
                .with_operation(id("ListItems"))
                .with_operation(id("GetItem"))
                .with_operation(id("PutItem"))
                .with_protocol(Protocol::AwsJson1_1),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_use_enum_and_integer_keys() {
        let model = define_catalog_model().unwrap();
        for (map, key) in [("StockByWarehouse", ShapeId::prelude("Integer")), ("CountsByCategory", id("Category"))] {
            let ShapeKind::Map { key: member, .. } = &model.shape(&id(map)).unwrap().kind else {
                panic!("{} is not a map", map);
            };
            assert_eq!(member.target, key);
        }
    }

    #[test]
    fn item_id_has_wire_name() {
        let model = define_catalog_model().unwrap();
        let item = model.shape(&id("Item")).unwrap();
        assert_eq!(item.members()[0].wire_name(), "ItemId");
    }

    #[test]
    fn model_round_trips_through_json() {
        let model = define_catalog_model().unwrap();
        let parsed = Model::from_json(&model.to_json().unwrap()).unwrap();
        assert_eq!(parsed, model);
    }
}
