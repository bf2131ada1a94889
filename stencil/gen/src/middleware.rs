//! Ordered middleware registration for generated operation stacks.
//!
//! Every generated client method assembles an operation stack at runtime.
//! Which middleware goes into that stack, and in which order, is decided
//! here at generation time.
//!
//! ## Ordering model
//!
//! Middleware is grouped into five [`MiddlewareStep`]s that always run in
//! the same order. Within a step, each descriptor carries a [`Position`]:
//!
//! - `Head` entries come first, then everything else, each group in
//!   registration order
//! - `Before(peer)` / `After(peer)` add hard constraints on top of that
//!   base order
//!
//! The final order is a stable topological sort. Among the entries whose
//! constraints are satisfied, the one earliest in base order is emitted
//! next, where an entry that must run before a peer counts as early as that
//! peer. Earlier entries are outer layers (onion model): they see the
//! request first and the response last.
//!
//! ## Errors
//!
//! - A second descriptor with an existing name is rejected at registration
//! - A registration whose constraints make its step cyclic is rejected at
//!   registration and leaves the registry unchanged
//! - A `Before`/`After` peer that is not registered in the same step is
//!   reported when the stack is resolved or rendered
//!
//! ## Examples
//!
//! ```
//! use stencil_gen::middleware::{MiddlewareDescriptor, MiddlewareRegistry, MiddlewareStep, Position};
//!
//! let noop = |_: &mut stencil_gen::writer::CodeWriter, _: &stencil_define::Operation, _: &str| Ok(());
//!
//! let mut registry = MiddlewareRegistry::new("example");
//! registry
//!     .register(MiddlewareDescriptor::new("A", MiddlewareStep::Build, noop).with_position(Position::Before("B".into())))
//!     .unwrap();
//! registry.register(MiddlewareDescriptor::new("B", MiddlewareStep::Build, noop)).unwrap();
//! registry
//!     .register(MiddlewareDescriptor::new("C", MiddlewareStep::Build, noop).with_position(Position::After("A".into())))
//!     .unwrap();
//!
//! assert_eq!(registry.resolved_names().unwrap(), ["A", "B", "C"]);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use stencil_define::Operation;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::errors::GeneratorError;
use crate::writer::CodeWriter;

/// Phases of an operation stack, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
)]
pub enum MiddlewareStep {
    /// Prepares the input before any serialization.
    Initialize,
    /// Turns the input into a request.
    Serialize,
    /// Adds request-wide metadata (endpoint, lengths).
    Build,
    /// Last changes before sending: retries, signing.
    Finalize,
    /// Turns the raw response into output or an error.
    Deserialize,
}

impl MiddlewareStep {
    /// Path of the matching runtime variant in generated code.
    pub fn runtime_variant(self) -> String {
        format!("Step::{}", self)
    }
}

/// Where a descriptor goes within its step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    /// Before every non-head entry.
    Head,
    /// After every head entry.
    #[default]
    Tail,
    /// Directly constrained to run before the named peer.
    Before(String),
    /// Directly constrained to run after the named peer.
    After(String),
}

/// Emits the statement that adds one middleware to a generated stack.
pub trait MiddlewareRenderer {
    /// Writes code pushing the middleware onto the stack bound to `stack`.
    fn render(
        &self,
        writer: &mut CodeWriter,
        operation: &Operation,
        stack: &str,
    ) -> Result<(), GeneratorError>;
}

impl<F> MiddlewareRenderer for F
where
    F: Fn(&mut CodeWriter, &Operation, &str) -> Result<(), GeneratorError>,
{
    fn render(
        &self,
        writer: &mut CodeWriter,
        operation: &Operation,
        stack: &str,
    ) -> Result<(), GeneratorError> {
        self(writer, operation, stack)
    }
}

/// Renderer that pushes a fixed constructor expression.
///
/// `{operation}` in the expression is replaced with the operation name.
#[derive(Debug, Clone)]
pub struct PushMiddleware {
    step: MiddlewareStep,
    constructor: String,
}

impl PushMiddleware {
    pub fn new(step: MiddlewareStep, constructor: impl Into<String>) -> Self {
        Self {
            step,
            constructor: constructor.into(),
        }
    }
}

impl MiddlewareRenderer for PushMiddleware {
    fn render(
        &self,
        writer: &mut CodeWriter,
        operation: &Operation,
        stack: &str,
    ) -> Result<(), GeneratorError> {
        let constructor = self
            .constructor
            .replace("{operation}", operation.id.name());
        writer.write(format!(
            "{}.push({}, {});",
            stack,
            self.step.runtime_variant(),
            constructor
        ));
        Ok(())
    }
}

/// A named, positioned middleware registration.
pub struct MiddlewareDescriptor {
    pub name: String,
    pub step: MiddlewareStep,
    pub position: Position,
    renderer: Box<dyn MiddlewareRenderer>,
}

impl MiddlewareDescriptor {
    pub fn new(
        name: impl Into<String>,
        step: MiddlewareStep,
        renderer: impl MiddlewareRenderer + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            step,
            position: Position::Tail,
            renderer: Box::new(renderer),
        }
    }

    /// Shorthand for a descriptor rendered by [`PushMiddleware`].
    pub fn push(name: impl Into<String>, step: MiddlewareStep, constructor: impl Into<String>) -> Self {
        Self::new(name, step, PushMiddleware::new(step, constructor))
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

impl fmt::Debug for MiddlewareDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareDescriptor")
            .field("name", &self.name)
            .field("step", &self.step)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Why a step could not be ordered.
enum OrderError {
    UnknownPeer { name: String, peer: String },
    Cycle(Vec<String>),
}

/// The set of middleware for one stack.
#[derive(Debug)]
pub struct MiddlewareRegistry {
    stack: String,
    descriptors: Vec<MiddlewareDescriptor>,
}

impl MiddlewareRegistry {
    /// An empty registry; `stack` labels it in error messages.
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            descriptors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Adds a descriptor.
    ///
    /// ## Errors
    ///
    /// - `DuplicateMiddlewareName` if the name is taken
    /// - `ContradictoryMiddlewareOrder` if the new constraints make the
    ///   step cyclic; the registry is left unchanged
    pub fn register(&mut self, descriptor: MiddlewareDescriptor) -> Result<(), GeneratorError> {
        if self.descriptors.iter().any(|d| d.name == descriptor.name) {
            return Err(GeneratorError::DuplicateMiddlewareName {
                name: descriptor.name,
                stack: self.stack.clone(),
            });
        }

        let step = descriptor.step;
        self.descriptors.push(descriptor);

        if let Err(OrderError::Cycle(cycle)) = self.order_step(step, false) {
            let rejected = self.descriptors.pop();
            return Err(GeneratorError::ContradictoryMiddlewareOrder {
                name: rejected.map(|d| d.name).unwrap_or_default(),
                step: step.to_string(),
                cycle,
            });
        }

        debug!(stack = %self.stack, step = %step, count = self.descriptors.len(), "registered middleware");
        Ok(())
    }

    /// Every descriptor in final stack order.
    ///
    /// ## Errors
    ///
    /// Returns `UnknownMiddlewarePeer` for a dangling `Before`/`After`.
    pub fn resolve(&self) -> Result<Vec<&MiddlewareDescriptor>, GeneratorError> {
        let mut ordered = Vec::with_capacity(self.descriptors.len());
        for step in MiddlewareStep::iter() {
            match self.order_step(step, true) {
                Ok(indices) => ordered.extend(indices.into_iter().map(|i| &self.descriptors[i])),
                Err(OrderError::UnknownPeer { name, peer }) => {
                    return Err(GeneratorError::UnknownMiddlewarePeer {
                        name,
                        peer,
                        step: step.to_string(),
                    });
                }
                Err(OrderError::Cycle(cycle)) => {
                    return Err(GeneratorError::ContradictoryMiddlewareOrder {
                        name: cycle.first().cloned().unwrap_or_default(),
                        step: step.to_string(),
                        cycle,
                    });
                }
            }
        }
        Ok(ordered)
    }

    /// Names in final stack order.
    pub fn resolved_names(&self) -> Result<Vec<&str>, GeneratorError> {
        Ok(self.resolve()?.into_iter().map(|d| d.name.as_str()).collect())
    }

    /// Renders every descriptor, in order, into `writer`.
    pub fn render(
        &self,
        writer: &mut CodeWriter,
        operation: &Operation,
        stack: &str,
    ) -> Result<(), GeneratorError> {
        for descriptor in self.resolve()? {
            descriptor.renderer.render(writer, operation, stack)?;
        }
        Ok(())
    }

    /// Orders the descriptors of one step, returning indices into `descriptors`.
    ///
    /// Unknown peers are skipped when `strict` is false so that a
    /// registration may refer to a peer registered later.
    fn order_step(&self, step: MiddlewareStep, strict: bool) -> Result<Vec<usize>, OrderError> {
        let in_step: Vec<usize> = self
            .descriptors
            .iter()
            .enumerate()
            .filter(|(_, d)| d.step == step)
            .map(|(i, _)| i)
            .collect();

        // Base order: heads first, then the rest, each in registration order.
        let mut base: Vec<usize> = in_step
            .iter()
            .copied()
            .filter(|&i| self.descriptors[i].position == Position::Head)
            .collect();
        base.extend(
            in_step
                .iter()
                .copied()
                .filter(|&i| self.descriptors[i].position != Position::Head),
        );

        let rank: HashMap<&str, usize> = base
            .iter()
            .enumerate()
            .map(|(rank, &i)| (self.descriptors[i].name.as_str(), rank))
            .collect();

        let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); base.len()];
        for (rank_of_self, &i) in base.iter().enumerate() {
            let descriptor = &self.descriptors[i];
            let (peer, before) = match &descriptor.position {
                Position::Before(peer) => (peer, true),
                Position::After(peer) => (peer, false),
                Position::Head | Position::Tail => continue,
            };
            match rank.get(peer.as_str()) {
                Some(&peer_rank) if before => {
                    successors[rank_of_self].insert(peer_rank);
                }
                Some(&peer_rank) => {
                    successors[peer_rank].insert(rank_of_self);
                }
                None if strict => {
                    return Err(OrderError::UnknownPeer {
                        name: descriptor.name.clone(),
                        peer: peer.clone(),
                    });
                }
                None => {}
            }
        }

        // First pass detects cycles and yields a topological order.
        let topological = kahn(&successors, |r| r).map_err(|stuck| {
            OrderError::Cycle(
                stuck
                    .into_iter()
                    .map(|r| self.descriptors[base[r]].name.clone())
                    .collect(),
            )
        })?;

        // An entry constrained before a peer is pulled up next to it: its key
        // is the smallest rank among itself and everything it must precede.
        let mut key: Vec<usize> = (0..base.len()).collect();
        for &r in topological.iter().rev() {
            for &to in &successors[r] {
                key[r] = key[r].min(key[to]);
            }
        }

        let ordered =
            kahn(&successors, |r| (key[r], r)).map_err(|_| OrderError::Cycle(Vec::new()))?;
        Ok(ordered.into_iter().map(|r| base[r]).collect())
    }
}

/// Kahn's algorithm, always emitting the ready node with the smallest priority.
///
/// Returns the nodes left with unsatisfied constraints when the graph is cyclic.
fn kahn<P: Ord>(
    successors: &[BTreeSet<usize>],
    priority: impl Fn(usize) -> P,
) -> Result<Vec<usize>, Vec<usize>> {
    let mut indegree = vec![0usize; successors.len()];
    for edges in successors {
        for &to in edges {
            indegree[to] += 1;
        }
    }

    let mut ready: BTreeSet<(P, usize)> = (0..successors.len())
        .filter(|&r| indegree[r] == 0)
        .map(|r| (priority(r), r))
        .collect();
    let mut ordered = Vec::with_capacity(successors.len());
    while let Some((_, next)) = ready.pop_first() {
        ordered.push(next);
        for &to in &successors[next] {
            indegree[to] -= 1;
            if indegree[to] == 0 {
                ready.insert((priority(to), to));
            }
        }
    }

    if ordered.len() < successors.len() {
        return Err((0..successors.len()).filter(|&r| indegree[r] > 0).collect());
    }
    Ok(ordered)
}
