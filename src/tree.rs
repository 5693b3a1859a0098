//! The command trie: literal and parameter nodes built from declarations,
//! insertion with conflict detection, and the leaf type.
//!
//! The teacher builds its tree with compile-time type-state combinators
//! (`literal()`/`argument()`/`executes()` chains in
//! `command/commands/mod.rs`) that encode the whole branch structure in
//! the Rust type itself. That works when every command is written by hand
//! at a fixed arity, but spec §4.C requires runtime insertion, conflict
//! detection and sibling-merging across declarations registered one at a
//! time — closer to the crate's own `DynCommandHandler`/`BoxedExecutor`
//! escape hatch ("building command trees in loops where the concrete type
//! changes each iteration"), generalized into a real trie instead of a
//! flat `Vec<BoxedExecutor>`.
use std::any::TypeId;
use std::sync::Arc;
use std::time::Duration;

use crate::actor::Actor;
use crate::annotations::AnnotationList;
use crate::context::ExecutionContext;
use crate::declaration::{DefaultValue, PathSegment};
use crate::error::CommandError;
use crate::handler::Handler;
use crate::parameters::{ContextParameter, DynParameterType, SuggestionProvider};
use crate::pipeline::{Condition, DynResponseHandler, DynValidator, Permission};

/// One step of the expanded insertion plan for a declaration: either a
/// literal path segment, or a parameter (placeholder-bound, or a trailing
/// declared-but-unplaced parameter).
pub(crate) enum PlanStep<A: Actor> {
    Literal(String),
    Parameter(ParamSpec<A>),
}

/// Everything the tree needs to know about one parameter node.
pub(crate) struct ParamSpec<A: Actor> {
    pub name: String,
    pub type_id: TypeId,
    pub parser: Arc<dyn DynParameterType<A>>,
    pub suggestion: Option<Arc<dyn SuggestionProvider<A>>>,
    pub optional: bool,
    pub default: Option<Arc<dyn Fn() -> Box<dyn std::any::Any + Send + Sync> + Send + Sync>>,
}

/// A leaf in the command tree: a complete path bound to one handler.
pub struct ExecutableCommand<A: Actor> {
    /// Stable identity, used for cooldown keying and hook payloads.
    pub id: u64,
    /// The full path this leaf terminates.
    pub full_path: String,
    /// Declared parameter names, in handler-invocation order (placeholders
    /// in path order, then trailing declared parameters).
    pub parameter_names: Vec<String>,
    /// The handler body.
    pub handler: Arc<dyn Handler<A>>,
    /// The resolved permission check, if any.
    pub permission: Option<Arc<dyn Permission<A>>>,
    /// The resolved condition chain.
    pub conditions: Vec<Arc<dyn Condition<A>>>,
    /// Effective method-level annotations.
    pub annotations: AnnotationList,
    /// The resolved response handler, if the return type needs one.
    pub response_handler: Option<Arc<dyn DynResponseHandler<A>>>,
    /// Per-parameter validators, resolved at registration time.
    pub validators: Vec<(String, Vec<Arc<dyn DynValidator<A>>>)>,
    /// Context-parameter resolvers, one per declared context parameter.
    pub context_parameters: Vec<(String, Arc<dyn ContextParameter<A>>)>,
    /// The cooldown duration if this method carries a cooldown
    /// annotation (spec §4.F: the framework only auto-applies a cooldown
    /// when the declaration itself carries one).
    pub cooldown: Option<Duration>,
    /// Insertion order, used as the final tie-break in both candidate and
    /// failure ranking.
    pub registration_index: usize,
}

pub(crate) struct LiteralEntry<A: Actor> {
    pub canonical: String,
    pub lower_spellings: Vec<String>,
    pub child: TreeNode<A>,
}

pub(crate) struct ParameterEntry<A: Actor> {
    pub spec: ParamSpec<A>,
    pub child: TreeNode<A>,
}

/// One node of the trie.
#[derive(Default)]
pub(crate) struct TreeNode<A: Actor> {
    pub literals: Vec<LiteralEntry<A>>,
    pub parameters: Vec<ParameterEntry<A>>,
    pub executables: Vec<Arc<ExecutableCommand<A>>>,
}

impl<A: Actor> TreeNode<A> {
    fn find_literal_mut(&mut self, spelling_lower: &str) -> Option<&mut LiteralEntry<A>> {
        self.literals
            .iter_mut()
            .find(|l| l.lower_spellings.iter().any(|s| s == spelling_lower))
    }

    fn find_parameter_index(&self, type_id: TypeId, name: &str, parser: &Arc<dyn DynParameterType<A>>) -> Option<usize> {
        self.parameters
            .iter()
            .position(|p| p.spec.type_id == type_id && p.spec.name == name && Arc::ptr_eq(&p.spec.parser, parser))
    }

    fn is_dead(&self) -> bool {
        self.executables.is_empty() && self.literals.is_empty() && self.parameters.is_empty()
    }

    fn remove_id(&mut self, id: u64) -> bool {
        let before = self.executables.len();
        self.executables.retain(|c| c.id != id);
        let mut removed = self.executables.len() != before;

        let mut i = 0;
        while i < self.literals.len() {
            if self.literals[i].child.remove_id(id) {
                removed = true;
            }
            if self.literals[i].child.is_dead() {
                self.literals.remove(i);
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.parameters.len() {
            if self.parameters[i].child.remove_id(id) {
                removed = true;
            }
            if self.parameters[i].child.is_dead() {
                self.parameters.remove(i);
            } else {
                i += 1;
            }
        }

        removed
    }
}

/// The union of all literal/parameter nodes forming the trie, plus a
/// global conflict check and an insertion-order counter for ranking
/// tie-breaks.
#[derive(Default)]
pub struct CommandTree<A: Actor> {
    pub(crate) root: TreeNode<A>,
    pub(crate) next_registration_index: usize,
}

impl<A: Actor> CommandTree<A> {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registration index the next [`CommandTree::insert`] will assign,
    /// without consuming it. Lets a caller build an `ExecutableCommand` (and
    /// run anything gated on its identity, such as a registration hook)
    /// before deciding whether to commit it.
    pub(crate) fn peek_next_index(&self) -> usize {
        self.next_registration_index
    }

    pub(crate) fn insert(
        &mut self,
        plan: Vec<PlanStep<A>>,
        build: impl FnOnce(usize) -> Arc<ExecutableCommand<A>>,
    ) -> Result<(), CommandError> {
        let index = self.next_registration_index;
        let command = build(index);
        Self::insert_step(&mut self.root, &mut plan.into_iter(), command)?;
        self.next_registration_index += 1;
        Ok(())
    }

    fn insert_step(
        node: &mut TreeNode<A>,
        remaining: &mut std::vec::IntoIter<PlanStep<A>>,
        command: Arc<ExecutableCommand<A>>,
    ) -> Result<(), CommandError> {
        match remaining.next() {
            None => {
                if !node.executables.is_empty() {
                    log::warn!("Command \"{}\" is already registered", command.full_path);
                    return Err(CommandError::DuplicateCommand {
                        path: command.full_path.clone(),
                    });
                }
                node.executables.push(command);
                Ok(())
            }
            Some(PlanStep::Literal(spelling)) => {
                let lower = spelling.to_ascii_lowercase();
                if node.find_literal_mut(&lower).is_none() {
                    node.literals.push(LiteralEntry {
                        canonical: spelling.clone(),
                        lower_spellings: vec![lower.clone()],
                        child: TreeNode::default(),
                    });
                }
                let entry = node.find_literal_mut(&lower).expect("just inserted");
                Self::insert_step(&mut entry.child, remaining, command)
            }
            Some(PlanStep::Parameter(spec)) => {
                let index = match node.find_parameter_index(spec.type_id, &spec.name, &spec.parser) {
                    Some(index) => index,
                    None => {
                        node.parameters.push(ParameterEntry {
                            spec,
                            child: TreeNode::default(),
                        });
                        node.parameters.len() - 1
                    }
                };
                Self::insert_step(&mut node.parameters[index].child, remaining, command)
            }
        }
    }

    /// Removes the leaf with the given identity, pruning any ancestor node
    /// left with no executables, literal children or parameter children.
    /// Returns whether anything was removed.
    pub(crate) fn remove_by_id(&mut self, id: u64) -> bool {
        self.root.remove_id(id)
    }

    /// Registers an extra alias spelling for an already-inserted literal at
    /// the root (used when a declaration carries multiple alternative
    /// names for the same branch, e.g. `/tp` alongside `/teleport`).
    pub(crate) fn alias_root_literal(&mut self, canonical_lower: &str, alias: &str) {
        if let Some(entry) = self.root.find_literal_mut(canonical_lower) {
            let alias_lower = alias.to_ascii_lowercase();
            if !entry.lower_spellings.contains(&alias_lower) {
                entry.lower_spellings.push(alias_lower);
            }
        }
    }
}

/// Materializes a [`DefaultValue`] into the boxed-default closure the tree
/// stores, or `None` if the parameter is required.
pub(crate) fn default_closure(
    default: &DefaultValue,
) -> Option<Arc<dyn Fn() -> Box<dyn std::any::Any + Send + Sync> + Send + Sync>> {
    match default {
        DefaultValue::Required => None,
        DefaultValue::Value(factory) => Some(Arc::clone(factory)),
    }
}

pub(crate) fn segment_is_literal(segment: &PathSegment) -> Option<&str> {
    match segment {
        PathSegment::Literal(s) => Some(s),
        PathSegment::Placeholder(_) => None,
    }
}
