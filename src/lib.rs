//! Dispatch core for a declarative command framework.
//!
//! `Lamp` owns a command tree and the typed registries that resolve
//! parameter types, context parameters, suggestion providers, permissions,
//! conditions, validators, response handlers and exception handlers for
//! whatever concrete actor type `A` an embedder supplies. Handlers are
//! built once via [`declaration::MethodDeclaration`] and registered with
//! [`Lamp::register`]; dispatch and tab-completion both walk the same
//! tree ([`dispatcher::walk_tree`] / [`suggest::suggest`]).
//!
//! Reflection-based ingestion (scanning annotated methods on structs) is
//! out of scope here by design — see the Design Notes this crate follows:
//! actor polymorphism collapses to the single `A: Actor` type parameter,
//! handler invocation is erased to a uniform `(context) -> return-value`
//! interface, and annotation replacement is a bounded fix-point over a
//! typed list rather than runtime reflection. An embedder (or a future
//! proc-macro crate) builds `MethodDeclaration`s by hand instead of via
//! attribute scanning.
#![warn(missing_docs)]

pub mod actor;
pub mod annotations;
pub mod context;
pub mod context_param;
pub mod cooldown;
pub mod declaration;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod help;
pub mod hooks;
pub mod orphan;
pub mod parameters;
pub mod pipeline;
pub mod registry;
pub mod stream;
pub mod suggest;
pub mod tree;

use std::any::TypeId;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use actor::Actor;
use annotations::{AnnotationList, ReplacerRegistry};
use context_param::ActorContextParameterFactory;
use cooldown::{CooldownContextParameterFactory, CooldownMarker, CooldownTracker};
use declaration::{MethodDeclaration, ParameterDeclaration, PathSegment};
use error::{CommandError, DefaultFailureHandler, FailureHandler};
use hooks::HookRegistry;
use parameters::{ContextParameterFactory, ContextParameterRegistry, ParameterTypeRegistry, SuggestionProviderRegistry};
use pipeline::{ConditionRegistry, ExceptionHandlerRegistry, PermissionRegistry, ResponseHandlerRegistry, ValidatorRegistry};
use tree::{default_closure, CommandTree, ExecutableCommand, ParamSpec, PlanStep};

/// Method-level annotation declaring the handler's cooldown duration. An
/// embedder attaches this to [`MethodDeclaration::annotated`] to get an
/// automatic cooldown check and a [`cooldown::CooldownHandle`] context
/// parameter.
#[derive(Debug, Clone, Copy)]
pub struct CooldownAnnotation(pub Duration);

struct ResolvedParameter<A: Actor> {
    name: String,
    type_id: TypeId,
    optional: bool,
    is_context: bool,
    parser: Option<Arc<dyn parameters::DynParameterType<A>>>,
    suggestion: Option<Arc<dyn parameters::SuggestionProvider<A>>>,
    default: Option<Arc<dyn Fn() -> Box<dyn std::any::Any + Send + Sync> + Send + Sync>>,
    annotations: AnnotationList,
}

/// The top-level entry point: one tree, its registries, and the ambient
/// services (cooldowns, hooks, failure reporting) every dispatch uses.
///
/// The tree sits behind a readers-writer lock so `dispatch` (shared
/// access) can run concurrently with itself while `register`/`unregister`
/// (exclusive access) mutate it from another thread; the registries
/// themselves are configured once up front and read lock-free afterward.
pub struct Lamp<A: Actor> {
    tree: RwLock<CommandTree<A>>,
    parameter_types: ParameterTypeRegistry<A>,
    context_parameters: ContextParameterRegistry<A>,
    suggestion_providers: SuggestionProviderRegistry<A>,
    permissions: PermissionRegistry<A>,
    conditions: ConditionRegistry<A>,
    validators: ValidatorRegistry<A>,
    response_handlers: ResponseHandlerRegistry<A>,
    exception_handlers: ExceptionHandlerRegistry<A>,
    failure_handler: Arc<dyn FailureHandler<A>>,
    annotation_replacers: ReplacerRegistry,
    hooks: HookRegistry<A>,
    cooldowns: Arc<CooldownTracker<A>>,
    parser_cache: scc::HashMap<(TypeId, Vec<TypeId>), Arc<dyn parameters::DynParameterType<A>>>,
}

/// A declared parameter type's annotation kinds, order-independent, used to
/// key [`Lamp::parser_cache`] so two declarations of the same type with the
/// same annotations resolve to the identical parser `Arc` (spec §4.C's
/// sibling-merge and `DuplicateCommand` checks both key off parser
/// identity, not just declared type).
fn annotation_fingerprint(annotations: &AnnotationList) -> Vec<TypeId> {
    let mut kinds: Vec<TypeId> = annotations.kinds().collect();
    kinds.sort_unstable();
    kinds
}

/// Bounds the annotation-replacer fix-point (spec §4.B) run once per
/// registered method.
const ANNOTATION_REPLACE_DEPTH: usize = 8;

/// Registers the string/integer/long/double/float/bool parsers every
/// `Lamp` carries by default, in the registry's low-priority class so an
/// embedder's own factory for the same type always wins.
fn register_builtin_parameter_types<A: Actor>(registry: &mut ParameterTypeRegistry<A>) {
    use parameters::builtin::{BoolParameterType, DoubleParameterType, FloatParameterType, IntegerParameterType, LongParameterType, StringParameterType};
    use parameters::{DynParameterType, ErasedParameterType};

    let factory = move |type_id: TypeId, _annotations: &AnnotationList| -> Option<Arc<dyn DynParameterType<A>>> {
        if type_id == TypeId::of::<String>() {
            Some(Arc::new(ErasedParameterType::<A, String, _>::new(StringParameterType::word())))
        } else if type_id == TypeId::of::<i32>() {
            Some(Arc::new(ErasedParameterType::<A, i32, _>::new(IntegerParameterType::new())))
        } else if type_id == TypeId::of::<i64>() {
            Some(Arc::new(ErasedParameterType::<A, i64, _>::new(LongParameterType)))
        } else if type_id == TypeId::of::<f64>() {
            Some(Arc::new(ErasedParameterType::<A, f64, _>::new(DoubleParameterType::new())))
        } else if type_id == TypeId::of::<f32>() {
            Some(Arc::new(ErasedParameterType::<A, f32, _>::new(FloatParameterType::new())))
        } else if type_id == TypeId::of::<bool>() {
            Some(Arc::new(ErasedParameterType::<A, bool, _>::new(BoolParameterType)))
        } else {
            None
        }
    };
    registry.add_last(Arc::new(factory) as Arc<dyn parameters::ParameterTypeFactory<A>>);
}

impl<A: Actor> Lamp<A> {
    /// Builds a fresh instance. `reply` backs the default failure handler,
    /// the same reply sink actors use for ordinary output.
    #[must_use]
    pub fn new(reply: impl Fn(&A, &str) + Send + Sync + 'static) -> Self {
        let mut context_parameters = ContextParameterRegistry::new();
        context_parameters.add(Arc::new(ActorContextParameterFactory) as Arc<dyn ContextParameterFactory<A>>);

        let mut parameter_types = ParameterTypeRegistry::new();
        register_builtin_parameter_types(&mut parameter_types);

        Self {
            tree: RwLock::new(CommandTree::new()),
            parameter_types,
            context_parameters,
            suggestion_providers: SuggestionProviderRegistry::new(),
            permissions: PermissionRegistry::new(),
            conditions: ConditionRegistry::new(),
            validators: ValidatorRegistry::new(),
            response_handlers: ResponseHandlerRegistry::new(),
            exception_handlers: ExceptionHandlerRegistry::new(),
            failure_handler: Arc::new(DefaultFailureHandler::new(reply)),
            annotation_replacers: ReplacerRegistry::new(),
            hooks: HookRegistry::new(),
            cooldowns: Arc::new(CooldownTracker::new()),
            parser_cache: scc::HashMap::new(),
        }
    }

    /// The parameter-type factory registry, for embedder registration.
    pub fn parameter_types(&mut self) -> &mut ParameterTypeRegistry<A> {
        &mut self.parameter_types
    }

    /// The context-parameter factory registry.
    pub fn context_parameters(&mut self) -> &mut ContextParameterRegistry<A> {
        &mut self.context_parameters
    }

    /// The suggestion-provider factory registry.
    pub fn suggestion_providers(&mut self) -> &mut SuggestionProviderRegistry<A> {
        &mut self.suggestion_providers
    }

    /// The permission-factory registry.
    pub fn permissions(&mut self) -> &mut PermissionRegistry<A> {
        &mut self.permissions
    }

    /// The condition-factory registry.
    pub fn conditions(&mut self) -> &mut ConditionRegistry<A> {
        &mut self.conditions
    }

    /// The validator-factory registry.
    pub fn validators(&mut self) -> &mut ValidatorRegistry<A> {
        &mut self.validators
    }

    /// The response-handler factory registry.
    pub fn response_handlers(&mut self) -> &mut ResponseHandlerRegistry<A> {
        &mut self.response_handlers
    }

    /// The exception-handler registry.
    pub fn exception_handlers(&mut self) -> &mut ExceptionHandlerRegistry<A> {
        &mut self.exception_handlers
    }

    /// The annotation-replacer registry, consulted once per registered
    /// method (spec §4.B).
    pub fn annotation_replacers(&mut self) -> &mut ReplacerRegistry {
        &mut self.annotation_replacers
    }

    /// The registration/unregistration/executed hook chains.
    pub fn hooks(&mut self) -> &mut HookRegistry<A> {
        &mut self.hooks
    }

    /// Overrides the default failure handler (invoked when no candidate
    /// matches a dispatch).
    pub fn set_failure_handler(&mut self, handler: impl FailureHandler<A> + 'static) {
        self.failure_handler = Arc::new(handler);
    }

    /// Resolves the parser for a declared parameter type, reusing a
    /// previously resolved `Arc` for the same `(type_id, annotation kinds)`
    /// pair instead of invoking the factory chain again. Without this, two
    /// `register()` calls for the same declared type produce two distinct
    /// `Arc`s, and the tree's `Arc::ptr_eq`-keyed sibling merge (tree.rs)
    /// would never recognize them as the same parameter.
    fn resolve_parser(
        &self,
        type_id: TypeId,
        annotations: &AnnotationList,
        name: &str,
        type_name: &str,
    ) -> Result<Arc<dyn parameters::DynParameterType<A>>, CommandError> {
        let key = (type_id, annotation_fingerprint(annotations));
        if let Some(cached) = self.parser_cache.read(&key, |_, parser| Arc::clone(parser)) {
            return Ok(cached);
        }

        let parser = self
            .parameter_types
            .resolve(|f| f.create(type_id, annotations))
            .ok_or_else(|| CommandError::Custom(format!("no parameter-type factory registered for `{name}` ({type_name})")))?;

        // Lost a race with another registration for the same key: keep
        // whichever `Arc` landed first so every caller shares one instance.
        if let Err((key, _)) = self.parser_cache.insert(key, Arc::clone(&parser)) {
            return Ok(self.parser_cache.read(&key, |_, p| Arc::clone(p)).unwrap_or(parser));
        }
        Ok(parser)
    }

    fn resolve_parameters(&self, declared: &[ParameterDeclaration]) -> Result<Vec<ResolvedParameter<A>>, CommandError> {
        declared
            .iter()
            .map(|p| {
                if p.is_context {
                    Ok(ResolvedParameter {
                        name: p.name.clone(),
                        type_id: p.type_id,
                        optional: p.optional,
                        is_context: true,
                        parser: None,
                        suggestion: None,
                        default: None,
                        annotations: p.annotations.clone(),
                    })
                } else {
                    let parser = self.resolve_parser(p.type_id, &p.annotations, &p.name, &p.type_name)?;
                    let suggestion = self.suggestion_providers.resolve(|f| f.create(p.type_id, &p.annotations));
                    Ok(ResolvedParameter {
                        name: p.name.clone(),
                        type_id: p.type_id,
                        optional: p.optional,
                        is_context: false,
                        parser: Some(parser),
                        suggestion,
                        default: default_closure(&p.default),
                        annotations: p.annotations.clone(),
                    })
                }
            })
            .collect()
    }

    /// Registers a declaration, expanding across every path it carries.
    /// Returns the assigned identity of each registered leaf, one per
    /// path, in declaration order.
    pub fn register(&self, declaration: MethodDeclaration<A>) -> Result<Vec<u64>, CommandError> {
        let resolved = self.resolve_parameters(&declaration.parameters)?;
        let annotations = self.annotation_replacers.resolve(&declaration.annotations, ANNOTATION_REPLACE_DEPTH);

        let permission = self.permissions.resolve(|f| f.create(&annotations));
        let conditions = self.conditions.collect(|f| f.create(&annotations));
        let response_handler = declaration
            .response_type
            .and_then(|type_id| self.response_handlers.resolve(|f| f.create(type_id, &annotations)));
        let cooldown_duration = annotations.get::<CooldownAnnotation>().map(|c| c.0);

        let validators_fixed: Vec<(String, Vec<Arc<dyn pipeline::DynValidator<A>>>)> = resolved
            .iter()
            .filter(|p| !p.is_context)
            .map(|p| (p.name.clone(), self.validators.collect(|f| f.create(p.type_id, &p.annotations))))
            .collect();

        let context_params_fixed: Vec<(String, Arc<dyn parameters::ContextParameter<A>>)> = resolved
            .iter()
            .filter(|p| p.is_context && p.type_id != TypeId::of::<CooldownMarker>())
            .map(|p| {
                let resolver = self
                    .context_parameters
                    .resolve(|f| f.create(p.type_id, &p.annotations))
                    .ok_or_else(|| CommandError::Custom(format!("no context-parameter factory registered for `{}`", p.name)));
                (p.name.clone(), resolver)
            })
            .map(|(name, result)| result.map(|r| (name, r)))
            .collect::<Result<Vec<_>, CommandError>>()?;

        let cooldown_param_names: Vec<String> = resolved
            .iter()
            .filter(|p| p.is_context && p.type_id == TypeId::of::<CooldownMarker>())
            .map(|p| p.name.clone())
            .collect();

        let mut ids = Vec::with_capacity(declaration.paths.len());
        let mut tree = self.tree.write();
        for raw_path in &declaration.paths {
            let path = declaration::CommandPath::parse(raw_path)?;
            let mut plan = Vec::new();
            let mut used = std::collections::HashSet::new();

            for segment in &path.segments {
                match segment {
                    PathSegment::Literal(s) => plan.push(PlanStep::Literal(s.clone())),
                    PathSegment::Placeholder(name) => {
                        let param = resolved
                            .iter()
                            .find(|p| &p.name == name && !p.is_context)
                            .ok_or_else(|| CommandError::UnresolvedPlaceholder {
                                path: raw_path.clone(),
                                name: name.clone(),
                            })?;
                        used.insert(param.name.clone());
                        plan.push(PlanStep::Parameter(ParamSpec {
                            name: param.name.clone(),
                            type_id: param.type_id,
                            parser: Arc::clone(param.parser.as_ref().expect("non-context parameter always has a parser")),
                            suggestion: param.suggestion.clone(),
                            optional: param.optional,
                            default: param.default.clone(),
                        }));
                    }
                }
            }
            for param in &resolved {
                if param.is_context || used.contains(&param.name) {
                    continue;
                }
                plan.push(PlanStep::Parameter(ParamSpec {
                    name: param.name.clone(),
                    type_id: param.type_id,
                    parser: Arc::clone(param.parser.as_ref().expect("trailing parameter always has a parser")),
                    suggestion: param.suggestion.clone(),
                    optional: param.optional,
                    default: param.default.clone(),
                }));
            }

            let parameter_names: Vec<String> = resolved.iter().filter(|p| !p.is_context).map(|p| p.name.clone()).collect();
            let full_path = raw_path.clone();
            let handler = Arc::clone(&declaration.handler);
            let permission = permission.clone();
            let conditions = conditions.clone();
            let response_handler = response_handler.clone();
            let validators_fixed = validators_fixed.clone();
            let context_params_fixed = context_params_fixed.clone();
            let cooldown_param_names = cooldown_param_names.clone();
            let cooldown_tracker = Arc::clone(&self.cooldowns);
            let annotations = annotations.clone();

            let index = tree.peek_next_index();
            let mut context_parameters = context_params_fixed.clone();
            for name in &cooldown_param_names {
                let factory = CooldownContextParameterFactory::new(Arc::clone(&cooldown_tracker), index as u64, cooldown_duration);
                let resolved = factory
                    .create(TypeId::of::<CooldownMarker>(), &annotations)
                    .expect("cooldown factory always matches its own marker type");
                context_parameters.push((name.clone(), resolved));
            }

            let command = Arc::new(ExecutableCommand {
                id: index as u64,
                full_path: full_path.clone(),
                parameter_names: parameter_names.clone(),
                handler,
                permission,
                conditions,
                annotations,
                response_handler,
                validators: validators_fixed,
                context_parameters,
                cooldown: cooldown_duration,
                registration_index: index,
            });

            let cancel = self.hooks.fire_registered(&command);
            if cancel.is_cancelled() {
                continue;
            }

            tree.insert(plan, move |_| command)?;
            ids.push(index as u64);
        }
        drop(tree);

        Ok(ids)
    }

    /// Registers an orphan declaration, binding it to a runtime-supplied
    /// path first (spec §4.K). See [`orphan::bind_runtime_path`].
    pub fn register_orphan(&self, declaration: MethodDeclaration<A>, runtime_path: &str) -> Result<u64, CommandError> {
        let bound = orphan::bind_runtime_path(declaration, runtime_path)?;
        let mut ids = self.register(bound)?;
        if ids.is_empty() {
            return Err(CommandError::Cancelled);
        }
        Ok(ids.remove(0))
    }

    /// Removes the leaf with the given identity. Returns whether anything
    /// was removed.
    pub fn unregister(&self, id: u64) -> bool {
        let Some(command) = self.find_by_id(id) else {
            return false;
        };
        let cancel = self.hooks.fire_unregistered(&command);
        if cancel.is_cancelled() {
            return false;
        }
        self.tree.write().remove_by_id(id)
    }

    fn find_by_id(&self, id: u64) -> Option<Arc<ExecutableCommand<A>>> {
        fn search<A: Actor>(node: &tree::TreeNode<A>, id: u64) -> Option<Arc<ExecutableCommand<A>>> {
            if let Some(c) = node.executables.iter().find(|c| c.id == id) {
                return Some(Arc::clone(c));
            }
            for entry in &node.literals {
                if let Some(c) = search(&entry.child, id) {
                    return Some(c);
                }
            }
            for entry in &node.parameters {
                if let Some(c) = search(&entry.child, id) {
                    return Some(c);
                }
            }
            None
        }
        search(&self.tree.read().root, id)
    }

    /// Dispatches `input` on behalf of `actor`: walks the tree, executes
    /// the best-ranked candidate, or reports the best-ranked failure
    /// (spec §4.D/§4.F).
    pub fn dispatch(&self, actor: Arc<A>, input: &str) {
        let mut outcome = {
            let tree = self.tree.read();
            dispatcher::walk_tree(&tree, input, &actor)
        };

        if let Some(idx) = dispatcher::best_candidate(&outcome.candidates) {
            let candidate = outcome.candidates.swap_remove(idx);
            self.execute(&candidate.command, candidate.ctx, &actor);
            return;
        }

        if let Some(failure) = dispatcher::best_failure(&outcome.failures) {
            self.failure_handler.handle(&actor, &failure.error);
            return;
        }

        let prefix = input.split_whitespace().next().unwrap_or_default().to_string();
        log::warn!("Unknown command \"{prefix}\"");
        self.failure_handler.handle(&actor, &CommandError::UnknownCommand { prefix });
    }

    fn execute(&self, command: &Arc<ExecutableCommand<A>>, mut ctx: context::ExecutionContext<A>, actor: &Arc<A>) {
        let pre_handler: Result<(), CommandError> = (|| {
            for condition in &command.conditions {
                condition.evaluate(&ctx)?;
            }
            if let Some(permission) = &command.permission {
                permission.check(&ctx)?;
            }
            if command.cooldown.is_some() {
                if let Some(remaining) = self.cooldowns.remaining_time(command.id, &actor.id()) {
                    return Err(CommandError::OnCooldown { remaining });
                }
            }
            for (name, validators) in &command.validators {
                if let Some(value) = ctx.get_erased(name) {
                    for validator in validators {
                        validator.validate_erased(value, &ctx)?;
                    }
                }
            }
            for (name, context_parameter) in &command.context_parameters {
                let value = context_parameter.resolve(&ctx)?;
                ctx.set(name, Arc::from(value));
            }
            Ok(())
        })();

        if let Err(error) = &pre_handler {
            self.report_exception(actor, error);
            self.hooks.fire_executed(command, actor, &pre_handler);
            return;
        }

        let cancel = self.hooks.fire_executed(command, actor, &Ok(()));

        let outcome: Result<(), CommandError> = if cancel.is_cancelled() {
            Err(CommandError::Cancelled)
        } else {
            (|| {
                let result = command.handler.invoke(&mut ctx)?;

                if let Some(duration) = command.cooldown {
                    self.cooldowns.set_cooldown(command.id, actor.id(), duration);
                }
                if let Some(response_handler) = &command.response_handler {
                    response_handler.handle_erased(result, &ctx);
                }
                Ok(())
            })()
        };

        if let Err(error) = &outcome {
            self.report_exception(actor, error);
        }
    }

    fn report_exception(&self, actor: &A, error: &CommandError) {
        for handler in self.exception_handlers.iter_all() {
            if handler.handle(actor, error) {
                return;
            }
        }
        self.failure_handler.handle(actor, error);
    }

    /// Tab-completion for `input` (spec §4.G).
    #[must_use]
    pub fn suggestions(&self, actor: &Arc<A>, input: &str) -> Vec<String> {
        let tree = self.tree.read();
        suggest::suggest(&tree, input, actor)
    }

    /// Literal commands directly below `path` (spec §4.L).
    #[must_use]
    pub fn children(&self, path: &str) -> Vec<help::HelpEntry> {
        let tree = self.tree.read();
        help::children(&tree, path)
    }

    /// Literal commands alongside `path`, excluding it (spec §4.L).
    #[must_use]
    pub fn siblings(&self, path: &str) -> Vec<help::HelpEntry> {
        let tree = self.tree.read();
        help::siblings(&tree, path)
    }

    /// The union of [`Lamp::children`] and [`Lamp::siblings`] for `path`.
    #[must_use]
    pub fn related(&self, path: &str) -> Vec<help::HelpEntry> {
        let tree = self.tree.read();
        help::related(&tree, path)
    }
}
