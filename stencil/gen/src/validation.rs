//! Pre-generation validation of the model graph.
//!
//! Validation runs before any code is emitted so that integrity problems
//! surface as one clear error instead of half-written output:
//!
//! - **Unresolved references**: every member target, operation, and
//!   input/output shape reachable from the service must exist
//! - **Member names**: unique within their shape, and unique after conversion
//!   to Rust identifiers
//! - **Map keys**: must be strings, enums, or integers
//! - **Required cycles**: a cycle through required structure members can
//!   never be instantiated and is rejected
//! - **Self-containing collections**: a list/map that contains itself
//!   without an intervening structure is rejected
//!
//! Cycle detection uses a visited set along the *current path* only: the
//! same shape legitimately appears in sibling branches. Shapes whose walk
//! has finished are remembered and not expanded again, so each shape is
//! explored once.
//!
//! [`RecursionIndex`] answers the follow-up question for valid models: which
//! structure/union members sit on a reference cycle and must be boxed.

use std::collections::{BTreeSet, HashSet};

use stencil_define::{Model, PrimitiveType, Service, Shape, ShapeId, ShapeKind};
use tracing::debug;

use crate::errors::GeneratorError;
use crate::naming::{field_name, type_name};

/// Looks up a shape, failing with `UnresolvedShape` when absent.
pub fn resolve_shape<'m>(
    model: &'m Model,
    id: &ShapeId,
    referenced_from: &str,
) -> Result<&'m Shape, GeneratorError> {
    model
        .shape(id)
        .ok_or_else(|| GeneratorError::UnresolvedShape {
            id: id.clone(),
            referenced_from: referenced_from.to_string(),
        })
}

/// Looks up a service, failing with `UnresolvedShape` when absent.
pub fn resolve_service<'m>(model: &'m Model, id: &ShapeId) -> Result<&'m Service, GeneratorError> {
    model
        .service(id)
        .ok_or_else(|| GeneratorError::UnresolvedShape {
            id: id.clone(),
            referenced_from: "generator settings".to_string(),
        })
}

/// Validates everything reachable from `service_id`.
///
/// ## Errors
///
/// - `UnresolvedShape` for dangling references
/// - `InvalidShapeGraph` for duplicate members, bad map keys, required
///   structure cycles, and self-containing collections
pub fn validate_model(model: &Model, service_id: &ShapeId) -> Result<(), GeneratorError> {
    let service = resolve_service(model, service_id)?;

    for op_id in &service.operations {
        let operation = model
            .operation(op_id)
            .ok_or_else(|| GeneratorError::UnresolvedShape {
                id: op_id.clone(),
                referenced_from: format!("service {}", service.id),
            })?;

        for (role, io) in [("input", &operation.input), ("output", &operation.output)] {
            if let Some(io) = io {
                let shape = resolve_shape(model, io, &format!("{} of {}", role, op_id))?;
                if !shape.is_structure() {
                    return Err(GeneratorError::InvalidShapeGraph {
                        reason: format!("operation {} {} must be a structure", role, op_id),
                        path: vec![io.to_string()],
                    });
                }
            }
        }
    }

    let reachable = reachable_shapes(model, service_id)?;
    for id in &reachable {
        let shape = resolve_shape(model, id, "closure walk")?;
        check_members(shape)?;
        check_map_key(model, shape)?;
    }

    let mut required_done = HashSet::new();
    let mut collection_done = HashSet::new();
    for id in &reachable {
        check_required_cycle(model, id, &mut Vec::new(), &mut required_done)?;
        check_collection_cycle(model, id, &mut Vec::new(), &mut collection_done)?;
    }

    debug!(service = %service_id, shapes = reachable.len(), "model validated");
    Ok(())
}

/// Returns every shape reachable from the service's operations, sorted.
///
/// ## Errors
///
/// Returns `UnresolvedShape` if any reachable reference is dangling.
pub fn reachable_shapes(
    model: &Model,
    service_id: &ShapeId,
) -> Result<BTreeSet<ShapeId>, GeneratorError> {
    let service = resolve_service(model, service_id)?;
    let mut seen = BTreeSet::new();
    let mut pending: Vec<(ShapeId, String)> = Vec::new();

    for op_id in &service.operations {
        if let Some(operation) = model.operation(op_id) {
            for io in [&operation.input, &operation.output].into_iter().flatten() {
                pending.push((io.clone(), format!("operation {}", op_id)));
            }
        }
    }

    while let Some((id, from)) = pending.pop() {
        if !seen.insert(id.clone()) {
            continue;
        }
        let shape = resolve_shape(model, &id, &from)?;
        for member in shape.edges() {
            pending.push((member.target.clone(), format!("{}${}", id, member.name)));
        }
    }

    Ok(seen)
}

fn check_members(shape: &Shape) -> Result<(), GeneratorError> {
    let mut names = HashSet::new();
    let mut fields = HashSet::new();
    let mut variants = HashSet::new();

    for member in shape.members() {
        let invalid = if !names.insert(member.name.as_str()) {
            Some(format!("duplicate member name '{}'", member.name))
        } else if !fields.insert(field_name(&member.name)) || !variants.insert(type_name(&member.name)) {
            Some(format!(
                "member '{}' maps to the same Rust identifier as another member",
                member.name
            ))
        } else {
            None
        };

        if let Some(reason) = invalid {
            return Err(GeneratorError::InvalidShapeGraph {
                reason,
                path: vec![shape.id.to_string()],
            });
        }
    }

    Ok(())
}

fn check_map_key(model: &Model, shape: &Shape) -> Result<(), GeneratorError> {
    let ShapeKind::Map { key, .. } = &shape.kind else {
        return Ok(());
    };

    let key_shape = resolve_shape(model, &key.target, &format!("{}$key", shape.id))?;
    let supported = match &key_shape.kind {
        ShapeKind::Enum { .. } => true,
        ShapeKind::Primitive(p) => matches!(
            p,
            PrimitiveType::String
                | PrimitiveType::Byte
                | PrimitiveType::Short
                | PrimitiveType::Integer
                | PrimitiveType::Long
        ),
        _ => false,
    };

    if supported {
        Ok(())
    } else {
        Err(GeneratorError::InvalidShapeGraph {
            reason: format!(
                "map key {} must be a string, enum, or integer shape",
                key.target
            ),
            path: vec![shape.id.to_string(), key.target.to_string()],
        })
    }
}

/// Depth-first walk over required structure members, tracking the current
/// path. `done` holds shapes already proven to start no cycle.
fn check_required_cycle(
    model: &Model,
    id: &ShapeId,
    path: &mut Vec<ShapeId>,
    done: &mut HashSet<ShapeId>,
) -> Result<(), GeneratorError> {
    if done.contains(id) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|p| p == id) {
        let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
        cycle.push(id.to_string());
        return Err(GeneratorError::InvalidShapeGraph {
            reason: "cycle through required structure members".to_string(),
            path: cycle,
        });
    }

    let shape = resolve_shape(model, id, "required cycle check")?;
    if shape.is_structure() {
        path.push(id.clone());
        for member in shape.members().iter().filter(|m| m.required) {
            let target = resolve_shape(model, &member.target, &format!("{}${}", id, member.name))?;
            if target.is_structure() {
                check_required_cycle(model, &member.target, path, done)?;
            }
        }
        path.pop();
    }

    done.insert(id.clone());
    Ok(())
}

/// Depth-first walk over collection-to-collection edges, tracking the current path.
fn check_collection_cycle(
    model: &Model,
    id: &ShapeId,
    path: &mut Vec<ShapeId>,
    done: &mut HashSet<ShapeId>,
) -> Result<(), GeneratorError> {
    if done.contains(id) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|p| p == id) {
        let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
        cycle.push(id.to_string());
        return Err(GeneratorError::InvalidShapeGraph {
            reason: "collection contains itself".to_string(),
            path: cycle,
        });
    }

    let shape = resolve_shape(model, id, "collection cycle check")?;
    if shape.is_collection() {
        path.push(id.clone());
        for member in shape.edges() {
            check_collection_cycle(model, &member.target, path, done)?;
        }
        path.pop();
    }

    done.insert(id.clone());
    Ok(())
}

/// Records which structure/union members lie on a reference cycle.
///
/// A member needs boxing when its owner is reachable again from its target
/// by following structure and union members directly. Collections already
/// allocate, so paths through them do not count.
#[derive(Debug, Default, Clone)]
pub struct RecursionIndex {
    boxed: HashSet<(ShapeId, String)>,
}

impl RecursionIndex {
    pub fn new(model: &Model) -> Self {
        let mut boxed = HashSet::new();

        for shape in model.shapes() {
            for member in shape.members() {
                let Some(target) = model.shape(&member.target) else {
                    continue;
                };
                if !(target.is_structure() || target.is_union()) {
                    continue;
                }
                let mut visited = HashSet::new();
                if reaches(model, &member.target, &shape.id, &mut visited) {
                    boxed.insert((shape.id.clone(), member.name.clone()));
                }
            }
        }

        Self { boxed }
    }

    /// Whether `owner$member` must be stored behind a `Box`.
    pub fn needs_box(&self, owner: &ShapeId, member: &str) -> bool {
        self.boxed.contains(&(owner.clone(), member.to_string()))
    }
}

fn reaches(model: &Model, from: &ShapeId, goal: &ShapeId, visited: &mut HashSet<ShapeId>) -> bool {
    if from == goal {
        return true;
    }
    if !visited.insert(from.clone()) {
        return false;
    }
    let Some(shape) = model.shape(from) else {
        return false;
    };
    shape.members().iter().any(|member| {
        model
            .shape(&member.target)
            .is_some_and(|t| t.is_structure() || t.is_union())
            && reaches(model, &member.target, goal, visited)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_define::{Member, Operation, Service};

    const NS: &str = "test";

    fn id(name: &str) -> ShapeId {
        ShapeId::new(NS, name)
    }

    fn string() -> ShapeId {
        ShapeId::prelude("String")
    }

    /// Builds a model with one operation whose input is `input`.
    fn model_with(shapes: Vec<Shape>, input: &str) -> Model {
        let mut model = Model::with_prelude();
        for shape in shapes {
            model.insert_shape(shape).unwrap();
        }
        model
            .insert_operation(Operation::new(id("Op")).with_input(id(input)))
            .unwrap();
        model
            .insert_service(Service::new(id("Svc"), "1").with_operation(id("Op")))
            .unwrap();
        model
    }

    #[test]
    fn valid_model_passes() {
        let model = model_with(
            vec![Shape::structure(id("Input"), vec![Member::optional("name", string())])],
            "Input",
        );
        assert!(validate_model(&model, &id("Svc")).is_ok());
    }

    #[test]
    fn missing_service_is_unresolved() {
        let model = Model::with_prelude();
        let err = validate_model(&model, &id("Nope")).unwrap_err();
        assert!(matches!(err, GeneratorError::UnresolvedShape { ref id, .. } if id.name() == "Nope"));
    }

    #[test]
    fn dangling_member_target_is_unresolved() {
        let model = model_with(
            vec![Shape::structure(id("Input"), vec![Member::optional("ghost", id("Ghost"))])],
            "Input",
        );
        let err = validate_model(&model, &id("Svc")).unwrap_err();
        match err {
            GeneratorError::UnresolvedShape { id, referenced_from } => {
                assert_eq!(id.name(), "Ghost");
                assert!(referenced_from.contains("Input$ghost"), "{}", referenced_from);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn non_structure_input_is_rejected() {
        let model = model_with(vec![], "Ghost");
        assert!(validate_model(&model, &id("Svc")).is_err());

        let mut model = Model::with_prelude();
        model
            .insert_operation(Operation::new(id("Op")).with_input(string()))
            .unwrap();
        model
            .insert_service(Service::new(id("Svc"), "1").with_operation(id("Op")))
            .unwrap();
        assert!(matches!(
            validate_model(&model, &id("Svc")),
            Err(GeneratorError::InvalidShapeGraph { .. })
        ));
    }

    #[test]
    fn duplicate_member_names_are_rejected() {
        let model = model_with(
            vec![Shape::structure(
                id("Input"),
                vec![Member::optional("a", string()), Member::optional("a", string())],
            )],
            "Input",
        );
        let err = validate_model(&model, &id("Svc")).unwrap_err();
        assert!(err.to_string().contains("duplicate member name 'a'"), "{}", err);
    }

    #[test]
    fn members_colliding_after_case_conversion_are_rejected() {
        let model = model_with(
            vec![Shape::structure(
                id("Input"),
                vec![
                    Member::optional("fooBar", string()),
                    Member::optional("foo_bar", string()),
                ],
            )],
            "Input",
        );
        assert!(matches!(
            validate_model(&model, &id("Svc")),
            Err(GeneratorError::InvalidShapeGraph { .. })
        ));
    }

    #[test]
    fn required_structure_cycle_is_rejected() {
        let model = model_with(
            vec![
                Shape::structure(id("Input"), vec![Member::optional("a", id("A"))]),
                Shape::structure(id("A"), vec![Member::required("b", id("B"))]),
                Shape::structure(id("B"), vec![Member::required("a", id("A"))]),
            ],
            "Input",
        );
        let err = validate_model(&model, &id("Svc")).unwrap_err();
        match err {
            GeneratorError::InvalidShapeGraph { reason, path } => {
                assert!(reason.contains("required"));
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"test#A".to_string()));
                assert!(path.contains(&"test#B".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn optional_break_allows_cycle() {
        let model = model_with(
            vec![
                Shape::structure(id("Input"), vec![Member::optional("a", id("A"))]),
                Shape::structure(id("A"), vec![Member::required("b", id("B"))]),
                Shape::structure(id("B"), vec![Member::optional("a", id("A"))]),
            ],
            "Input",
        );
        assert!(validate_model(&model, &id("Svc")).is_ok());
    }

    #[test]
    fn shared_shape_in_sibling_branches_is_not_a_cycle() {
        let model = model_with(
            vec![
                Shape::structure(
                    id("Input"),
                    vec![Member::required("left", id("Leaf")), Member::required("right", id("Leaf"))],
                ),
                Shape::structure(id("Leaf"), vec![Member::required("name", string())]),
            ],
            "Input",
        );
        assert!(validate_model(&model, &id("Svc")).is_ok());
    }

    /// `Level0` .. `Level{depth-1}`, each with two required members pointing
    /// at the next level; `last` is the members of the final level.
    fn diamond_chain(depth: usize, last: Vec<Member>) -> Model {
        let mut shapes: Vec<Shape> = (0..depth - 1)
            .map(|i| {
                let next = id(&format!("Level{}", i + 1));
                Shape::structure(
                    id(&format!("Level{}", i)),
                    vec![
                        Member::required("left", next.clone()),
                        Member::required("right", next),
                    ],
                )
            })
            .collect();
        shapes.push(Shape::structure(id(&format!("Level{}", depth - 1)), last));
        model_with(shapes, "Level0")
    }

    #[test]
    fn deep_required_diamonds_are_walked_once() {
        let model = diamond_chain(64, vec![Member::required("name", string())]);
        assert!(validate_model(&model, &id("Svc")).is_ok());
    }

    #[test]
    fn required_cycle_below_diamonds_is_rejected() {
        let model = diamond_chain(64, vec![Member::required("back", id("Level0"))]);
        let err = validate_model(&model, &id("Svc")).unwrap_err();
        match err {
            GeneratorError::InvalidShapeGraph { reason, path } => {
                assert!(reason.contains("required"), "{}", reason);
                assert_eq!(path.first().map(String::as_str), Some("test#Level0"));
                assert_eq!(path.last().map(String::as_str), Some("test#Level0"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn self_containing_list_is_rejected() {
        let model = model_with(
            vec![
                Shape::structure(id("Input"), vec![Member::optional("items", id("Loop"))]),
                Shape::list(id("Loop"), Member::optional("member", id("Loop"))),
            ],
            "Input",
        );
        let err = validate_model(&model, &id("Svc")).unwrap_err();
        assert!(err.to_string().contains("collection contains itself"), "{}", err);
    }

    #[test]
    fn unsupported_map_key_is_rejected() {
        let model = model_with(
            vec![
                Shape::structure(id("Input"), vec![Member::optional("m", id("BadMap"))]),
                Shape::map(
                    id("BadMap"),
                    Member::required("key", ShapeId::prelude("Blob")),
                    Member::required("value", string()),
                ),
            ],
            "Input",
        );
        assert!(matches!(
            validate_model(&model, &id("Svc")),
            Err(GeneratorError::InvalidShapeGraph { .. })
        ));
    }

    #[test]
    fn reachable_shapes_include_nested_targets_only() {
        let model = model_with(
            vec![
                Shape::structure(id("Input"), vec![Member::optional("tags", id("Tags"))]),
                Shape::list(id("Tags"), Member::optional("member", string())),
                Shape::structure(id("Unused"), vec![]),
            ],
            "Input",
        );
        let reachable = reachable_shapes(&model, &id("Svc")).unwrap();
        assert!(reachable.contains(&id("Input")));
        assert!(reachable.contains(&id("Tags")));
        assert!(reachable.contains(&string()));
        assert!(!reachable.contains(&id("Unused")));
    }

    #[test]
    fn recursion_index_boxes_cycle_members_only() {
        let model = model_with(
            vec![
                Shape::structure(
                    id("Input"),
                    vec![Member::optional("folder", id("Folder"))],
                ),
                Shape::structure(
                    id("Folder"),
                    vec![
                        Member::optional("parent", id("Folder")),
                        Member::optional("children", id("FolderList")),
                        Member::required("name", string()),
                    ],
                ),
                Shape::list(id("FolderList"), Member::optional("member", id("Folder"))),
            ],
            "Input",
        );
        let index = RecursionIndex::new(&model);
        assert!(index.needs_box(&id("Folder"), "parent"));
        assert!(!index.needs_box(&id("Folder"), "children"));
        assert!(!index.needs_box(&id("Folder"), "name"));
        assert!(!index.needs_box(&id("Input"), "folder"));
    }
}
