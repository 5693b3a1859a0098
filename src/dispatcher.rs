//! The recursive tree walk and overload-ranking algorithm (spec §4.D/§4.F).
//!
//! The teacher's dispatcher (`CommandDispatcher::handle_command` in
//! `command/mod.rs`) is a flat lookup: split on the first token, find one
//! root node, call its executor. There's no overload resolution because
//! the teacher never registers two commands under the same root word. This
//! module is the part of the framework the teacher doesn't need at all —
//! grounded instead directly in the Design Notes' description of a
//! recursive-descent walk that forks the stream at every parameter
//! attempt and ranks the resulting candidates lexicographically.
use std::sync::Arc;

use crate::actor::Actor;
use crate::context::ExecutionContext;
use crate::error::CommandError;
use crate::stream::StringStream;
use crate::tree::{CommandTree, ExecutableCommand, TreeNode};

/// Bounds how many failed branches a single dispatch will accumulate
/// before it stops recording new ones (spec §4.F, "max-failed-attempts
/// bound"). Candidates keep being collected regardless; this only caps
/// the failure list used to report a reason when nothing matches.
const MAX_TRACKED_FAILURES: usize = 64;

/// One complete walk to a leaf: the leaf itself and the context
/// accumulated along the way (parsed arguments, ranking bookkeeping).
pub(crate) struct Candidate<A: Actor> {
    pub command: Arc<ExecutableCommand<A>>,
    pub ctx: ExecutionContext<A>,
}

/// One branch that failed to reach a leaf.
pub(crate) struct RankedFailure {
    pub error: CommandError,
    pub depth: usize,
    pub order: usize,
}

/// Everything produced by one walk of the tree.
pub(crate) struct WalkOutcome<A: Actor> {
    pub candidates: Vec<Candidate<A>>,
    pub failures: Vec<RankedFailure>,
}

/// Walks `tree` against `input`, collecting every complete candidate and
/// every failed branch.
pub(crate) fn walk_tree<A: Actor>(tree: &CommandTree<A>, input: &str, actor: &Arc<A>) -> WalkOutcome<A> {
    let root_ctx = ExecutionContext::new(Arc::clone(actor));
    let root_stream = StringStream::new(input);

    let mut outcome = WalkOutcome {
        candidates: Vec::new(),
        failures: Vec::new(),
    };
    let mut order = 0usize;
    walk(&tree.root, &root_stream, &root_ctx, &mut order, &mut outcome);
    outcome
}

fn push_failure<A: Actor>(outcome: &mut WalkOutcome<A>, error: CommandError, depth: usize, order: &mut usize) {
    *order += 1;
    if outcome.failures.len() < MAX_TRACKED_FAILURES {
        outcome.failures.push(RankedFailure {
            error,
            depth,
            order: *order,
        });
    }
}

fn walk<A: Actor>(
    node: &TreeNode<A>,
    stream: &StringStream,
    ctx: &ExecutionContext<A>,
    order: &mut usize,
    outcome: &mut WalkOutcome<A>,
) {
    let mut probe = stream.fork();
    probe.skip_whitespace();
    let depth = probe.position();
    let has_more = probe.has_remaining();

    if has_more {
        if !node.executables.is_empty() {
            push_failure(
                outcome,
                CommandError::ExtraArguments {
                    surplus: probe.fork().read_remaining(),
                },
                depth,
                order,
            );
        }

        let token_lower = probe.peek_token().to_ascii_lowercase();
        if let Some(literal) = node
            .literals
            .iter()
            .find(|l| l.lower_spellings.iter().any(|s| *s == token_lower))
        {
            let mut child_stream = stream.fork();
            child_stream.skip_whitespace();
            child_stream.read_unquoted_string();
            let mut child_ctx = ctx.clone();
            child_ctx.record_literal_match();
            walk(&literal.child, &child_stream, &child_ctx, order, outcome);
        }
    } else {
        for command in &node.executables {
            outcome.candidates.push(Candidate {
                command: Arc::clone(command),
                ctx: ctx.clone(),
            });
        }
    }

    for entry in &node.parameters {
        if has_more {
            let mut child_stream = stream.fork();
            child_stream.skip_whitespace();
            let before = child_stream.position();
            match entry.spec.parser.parse_erased(&mut child_stream, ctx) {
                Ok(value) => {
                    let mut child_ctx = ctx.clone();
                    child_ctx.set(&entry.spec.name, Arc::from(value));
                    child_ctx.record_parser_priority(entry.spec.parser.priority().rank());
                    walk(&entry.child, &child_stream, &child_ctx, order, outcome);
                }
                Err(error) => push_failure(outcome, error, before, order),
            }
        } else if entry.spec.optional {
            let mut child_ctx = ctx.clone();
            if let Some(default) = &entry.spec.default {
                child_ctx.set(&entry.spec.name, Arc::from(default()));
            }
            child_ctx.record_default_used();
            walk(&entry.child, stream, &child_ctx, order, outcome);
        } else {
            push_failure(
                outcome,
                CommandError::MissingArgument {
                    parameter: entry.spec.name.clone(),
                    type_name: String::new(),
                },
                depth,
                order,
            );
        }
    }
}

/// Picks the winning candidate per spec §4.D: highest literal-match count,
/// then highest summed parser priority, then fewest defaulted parameters,
/// then earliest registration.
pub(crate) fn best_candidate<A: Actor>(candidates: &[Candidate<A>]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .max_by_key(|(_, c)| {
            let (literal_matches, priority_sum, neg_defaulted) = c.ctx.rank_key();
            (
                literal_matches,
                priority_sum,
                neg_defaulted,
                -i64::try_from(c.command.registration_index).unwrap_or(i64::MAX),
            )
        })
        .map(|(i, _)| i)
}

/// Picks the failure to report when no candidate matched: deepest
/// position reached, then highest failure-kind weight, then earliest
/// encountered.
pub(crate) fn best_failure(failures: &[RankedFailure]) -> Option<&RankedFailure> {
    failures.iter().max_by_key(|f| {
        (
            f.depth,
            f.error.failure_weight(),
            -i64::try_from(f.order).unwrap_or(i64::MAX),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::declaration::{CommandPath, MethodDeclaration, ParameterDeclaration};
    use crate::handler::unit_handler;
    use crate::parameters::builtin::IntegerParameterType;
    use crate::parameters::{DynParameterType, ErasedParameterType};
    use crate::tree::{ParamSpec, PlanStep};
    use std::any::TypeId;

    struct DummyActor(u64);

    impl Actor for DummyActor {
        type Id = u64;
        fn id(&self) -> u64 {
            self.0
        }
        fn reply(&self, _text: &str) {}
    }

    fn int_parser<A: Actor>() -> Arc<dyn DynParameterType<A>> {
        Arc::new(ErasedParameterType::<A, i32, _>::new(IntegerParameterType::new()))
    }

    fn insert_leaf(tree: &mut CommandTree<DummyActor>, literal: &str, param: Option<(&str, bool)>) {
        let mut plan = vec![PlanStep::Literal(literal.to_string())];
        if let Some((name, optional)) = param {
            plan.push(PlanStep::Parameter(ParamSpec {
                name: name.to_string(),
                type_id: TypeId::of::<i32>(),
                parser: int_parser(),
                suggestion: None,
                optional,
                default: optional.then(|| {
                    Arc::new(|| Box::new(0i32) as Box<dyn std::any::Any + Send + Sync>)
                        as Arc<dyn Fn() -> Box<dyn std::any::Any + Send + Sync> + Send + Sync>
                }),
            }));
        }
        let path = format!("{literal}{}", if param.is_some() { " <x>" } else { "" });
        let _ = CommandPath::parse(&path);
        tree.insert(plan, |index| {
            Arc::new(ExecutableCommand {
                id: index as u64,
                full_path: path.clone(),
                parameter_names: param.map(|(n, _)| vec![n.to_string()]).unwrap_or_default(),
                handler: Arc::new(unit_handler(|_ctx| Ok(()))),
                permission: None,
                conditions: Vec::new(),
                annotations: crate::annotations::AnnotationList::new(),
                response_handler: None,
                validators: Vec::new(),
                context_parameters: Vec::new(),
                cooldown: None,
                registration_index: index,
            })
        })
        .unwrap();
    }

    #[test]
    fn picks_the_candidate_with_more_literal_matches() {
        let mut tree = CommandTree::new();
        insert_leaf(&mut tree, "ping", None);
        let actor = Arc::new(DummyActor(1));
        let outcome = walk_tree(&tree, "ping", &actor);
        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn missing_required_argument_is_reported_as_failure() {
        let mut tree = CommandTree::new();
        insert_leaf(&mut tree, "tp", Some(("x", false)));
        let actor = Arc::new(DummyActor(1));
        let outcome = walk_tree(&tree, "tp", &actor);
        assert!(outcome.candidates.is_empty());
        let failure = best_failure(&outcome.failures).unwrap();
        assert!(matches!(failure.error, CommandError::MissingArgument { .. }));
    }

    #[test]
    fn optional_trailing_parameter_defaults_when_absent() {
        let mut tree = CommandTree::new();
        insert_leaf(&mut tree, "tp", Some(("x", true)));
        let actor = Arc::new(DummyActor(1));
        let outcome = walk_tree(&tree, "tp", &actor);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].ctx.get::<i32>("x"), Some(&0));
    }

    #[test]
    fn unmatched_literal_falls_through_to_unknown_command() {
        let mut tree = CommandTree::new();
        insert_leaf(&mut tree, "ping", None);
        let actor = Arc::new(DummyActor(1));
        let outcome = walk_tree(&tree, "pong", &actor);
        assert!(outcome.candidates.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
