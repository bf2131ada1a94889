//! Storage service definition.
//!
//! An object store with a folder tree. The model leans on the collection
//! features of the codec:
//!
//! - `ChunkBatches` is a wrapped list of sparse blob lists, so a decoded
//!   `chunks` member is `Option<Vec<Vec<Option<Vec<u8>>>>>`
//! - `FolderList`, `ObjectList`, and `Metadata` are wrapped
//! - `Folder` refers to itself through `parent` and `children`
//! - `PutObject` sends its blob member raw as the request payload
//!
//! ## Operations
//!
//! - `PutObject` - PUT /objects/{key+}
//! - `GetObject` - GET /objects/{key+}
//! - `ListFolder` - GET /folders
//! - `DeleteObjects` - POST /objects/delete

use stencil_define::prelude::*;

/// Namespace of every storage shape.
pub const NAMESPACE: &str = "example.storage";

fn id(name: &str) -> ShapeId {
    ShapeId::new(NAMESPACE, name)
}

fn string() -> ShapeId {
    ShapeId::prelude("String")
}

/// Id of the `Storage` service.
pub fn service_id() -> ShapeId {
    id("Storage")
}

/// Creates the storage model.
///
/// ## Examples
///
/// ```rust
/// use stencil_define::{HasTraits, ShapeId};
/// use stencil_definitions::storage::{NAMESPACE, define_storage_model};
///
/// let model = define_storage_model().unwrap();
/// let batches = model.shape(&ShapeId::new(NAMESPACE, "ChunkBatches")).unwrap();
/// assert!(batches.is_wrapped());
/// ```
pub fn define_storage_model() -> Result<Model, ModelError> {
    Model::with_prelude()
        // Collections
        .with_shape(
            Shape::list(id("ChunkList"), Member::required("chunk", ShapeId::prelude("Blob")))
                .with_trait(Trait::Sparse),
        )?
        .with_shape(
            Shape::list(id("ChunkBatches"), Member::required("batch", id("ChunkList")))
                .with_trait(Trait::Wrapped),
        )?
        .with_shape(
            Shape::map(
                id("Metadata"),
                Member::required("key", string()),
                Member::required("value", string()),
            )
            .with_trait(Trait::Wrapped),
        )?
        .with_shape(
            Shape::list(id("FolderList"), Member::required("folder", id("Folder")))
                .with_trait(Trait::Wrapped),
        )?
        .with_shape(
            Shape::list(id("ObjectList"), Member::required("object", id("ObjectSummary")))
                .with_trait(Trait::Wrapped),
        )?
        .with_shape(Shape::list(id("TagList"), Member::required("member", string())))?
        .with_shape(
            Shape::list(id("KeyList"), Member::required("member", string()))
                .with_trait(Trait::Sparse),
        )?
        .with_shape(Shape::map(
            id("ErrorMap"),
            Member::required("key", string()),
            Member::required("value", string()),
        ))?
        // Structures
        .with_shape(
            Shape::structure(
                id("Folder"),
                vec![
                    Member::required("name", string()),
                    Member::optional("parent", id("Folder")),
                    Member::optional("children", id("FolderList")),
                    Member::optional("metadata", id("Metadata")),
                ],
            )
            .with_trait(Trait::Documentation("A folder and its subfolders.".to_string())),
        )?
        .with_shape(Shape::structure(
            id("ObjectSummary"),
            vec![
                Member::required("key", string()),
                Member::optional("size", ShapeId::prelude("Long")),
                Member::optional("lastModified", ShapeId::prelude("Timestamp")),
            ],
        ))?
        // PutObject
        .with_shape(Shape::structure(
            id("PutObjectInput"),
            vec![
                Member::required("key", string()).with_trait(Trait::HttpLabel),
                Member::optional("owner", string())
                    .with_trait(Trait::HttpHeader("X-Object-Owner".to_string())),
                Member::optional("data", ShapeId::prelude("Blob")).with_trait(Trait::HttpPayload),
            ],
        ))?
        .with_shape(Shape::structure(
            id("PutObjectOutput"),
            vec![Member::optional("etag", string())],
        ))?
        // GetObject
        .with_shape(Shape::structure(
            id("GetObjectInput"),
            vec![Member::required("key", string()).with_trait(Trait::HttpLabel)],
        ))?
        .with_shape(Shape::structure(
            id("GetObjectOutput"),
            vec![
                Member::required("key", string()),
                Member::optional("data", ShapeId::prelude("Blob")),
                Member::optional("chunks", id("ChunkBatches")),
                Member::optional("metadata", id("Metadata")),
            ],
        ))?
        // ListFolder
        .with_shape(Shape::structure(
            id("ListFolderInput"),
            vec![
                Member::optional("path", string()).with_trait(Trait::HttpQuery("path".to_string())),
                Member::optional("tags", id("TagList"))
                    .with_trait(Trait::HttpQuery("tag".to_string())),
            ],
        ))?
        .with_shape(Shape::structure(
            id("ListFolderOutput"),
            vec![
                Member::optional("folder", id("Folder")),
                Member::optional("objects", id("ObjectList")),
            ],
        ))?
        // DeleteObjects
        .with_shape(Shape::structure(
            id("DeleteObjectsInput"),
            vec![
                Member::required("keys", id("KeyList")),
                Member::optional("quiet", ShapeId::prelude("Boolean")),
                Member::optional("requestId", string())
                    .with_trait(Trait::HttpHeader("X-Request-Id".to_string())),
            ],
        ))?
        .with_shape(Shape::structure(
            id("DeleteObjectsOutput"),
            vec![
                Member::optional("deleted", id("KeyList")),
                Member::optional("errors", id("ErrorMap")),
            ],
        ))?
        .with_operation(
            Operation::new(id("PutObject"))
                .with_input(id("PutObjectInput"))
                .with_output(id("PutObjectOutput"))
                .with_http(HttpTrait::new(HttpMethod::Put, "/objects/{key+}")),
        )?
        .with_operation(
            Operation::new(id("GetObject"))
                .with_input(id("GetObjectInput"))
                .with_output(id("GetObjectOutput"))
                .with_http(HttpTrait::new(HttpMethod::Get, "/objects/{key+}")),
        )?
        .with_operation(
            Operation::new(id("ListFolder"))
                .with_input(id("ListFolderInput"))
                .with_output(id("ListFolderOutput"))
                .with_http(HttpTrait::new(HttpMethod::Get, "/folders"))
                .with_documentation("Lists one folder with its objects."),
        )?
        .with_operation(
            Operation::new(id("DeleteObjects"))
                .with_input(id("DeleteObjectsInput"))
                .with_output(id("DeleteObjectsOutput"))
                .with_http(HttpTrait::new(HttpMethod::Post, "/objects/delete")),
        )?
        .with_service(
            Service::new(service_id(), "2019-11-30")
                .with_operation(id("PutObject"))
                .with_operation(id("GetObject"))
                .with_operation(id("ListFolder"))
                .with_operation(id("DeleteObjects"))
                .with_protocol(Protocol::RestJson1),
        )
}
