//! Parser and suggestion-provider contracts, and the factories the
//! registry resolves them through.
//!
//! Grounded in the teacher's `CommandArgument` trait
//! (`command/arguments/mod.rs`): `parse` returning the remaining slice and
//! a typed output, plus an optional `suggest`. The core generalizes that
//! trait two ways the teacher doesn't need: a cursor-based [`StringStream`]
//! instead of a pre-split `&[&str]` (so quoting and peeking work), and a
//! priority class so overload resolution (spec §4.D) can prefer one
//! parser over another for the same input.
pub mod builtin;

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::actor::Actor;
use crate::annotations::AnnotationList;
use crate::context::ExecutionContext;
use crate::error::CommandError;
use crate::registry::Registry;
use crate::stream::StringStream;

/// The three priority classes a parser's parse attempt can carry.
/// Ordering is `Lowest < Default < Highest`; the dispatcher sums a
/// candidate's parameter priorities when ranking overloads (spec §4.D,
/// rule 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Tried only once nothing higher-priority matched.
    Lowest,
    /// The common case.
    Default,
    /// Preferred over `Default` and `Lowest` parsers for the same input
    /// (e.g. an enum parser over a fallback string parser).
    Highest,
}

impl Priority {
    pub(crate) fn rank(self) -> i64 {
        match self {
            Self::Lowest => 0,
            Self::Default => 1,
            Self::Highest => 2,
        }
    }
}

/// A strategy for parsing one argument from a token stream into a typed
/// value `T`, for an actor type `A`.
pub trait ParameterType<A: Actor, T>: Send + Sync {
    /// Attempts to consume `T` from `stream`, advancing it on success and
    /// leaving it untouched on failure.
    fn parse(&self, stream: &mut StringStream, ctx: &ExecutionContext<A>) -> Result<T, CommandError>;

    /// The suggestion provider used when no more specific one is resolved
    /// via [`SuggestionProviderFactory`] or an explicit `@SuggestWith`-style
    /// override at ingestion.
    fn default_suggestions(&self) -> Option<Arc<dyn SuggestionProvider<A>>> {
        None
    }

    /// This parser's priority class for overload ranking.
    fn parse_priority(&self) -> Priority {
        Priority::Default
    }
}

/// A parser with its value type erased, so the tree can hold
/// heterogeneous parameter nodes in one `Vec`.
pub trait DynParameterType<A: Actor>: Send + Sync {
    /// Parses and boxes the result as `dyn Any`.
    fn parse_erased(
        &self,
        stream: &mut StringStream,
        ctx: &ExecutionContext<A>,
    ) -> Result<Box<dyn Any + Send + Sync>, CommandError>;

    /// This parser's priority class.
    fn priority(&self) -> Priority;

    /// The parser's own default suggestion provider, if any.
    fn default_suggestions(&self) -> Option<Arc<dyn SuggestionProvider<A>>>;
}

/// Adapts a typed [`ParameterType`] into the erased [`DynParameterType`]
/// the tree stores.
pub struct ErasedParameterType<A, T, P> {
    inner: P,
    _marker: std::marker::PhantomData<fn() -> (A, T)>,
}

impl<A, T, P> ErasedParameterType<A, T, P> {
    /// Wraps a typed parser for erased storage.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<A, T, P> DynParameterType<A> for ErasedParameterType<A, T, P>
where
    A: Actor,
    T: Send + Sync + 'static,
    P: ParameterType<A, T>,
{
    fn parse_erased(
        &self,
        stream: &mut StringStream,
        ctx: &ExecutionContext<A>,
    ) -> Result<Box<dyn Any + Send + Sync>, CommandError> {
        self.inner
            .parse(stream, ctx)
            .map(|v| Box::new(v) as Box<dyn Any + Send + Sync>)
    }

    fn priority(&self) -> Priority {
        self.inner.parse_priority()
    }

    fn default_suggestions(&self) -> Option<Arc<dyn SuggestionProvider<A>>> {
        self.inner.default_suggestions()
    }
}

/// Produces a parser for a declared parameter type, or `None` if this
/// factory doesn't handle it. Resolution (component C) walks the registry
/// in priority/insertion order and takes the first `Some`.
pub trait ParameterTypeFactory<A: Actor>: Send + Sync {
    /// Attempts to build a parser for `type_id`, given the parameter's
    /// annotations.
    fn create(
        &self,
        type_id: TypeId,
        annotations: &AnnotationList,
    ) -> Option<Arc<dyn DynParameterType<A>>>;
}

impl<A, F> ParameterTypeFactory<A> for F
where
    A: Actor,
    F: Fn(TypeId, &AnnotationList) -> Option<Arc<dyn DynParameterType<A>>> + Send + Sync,
{
    fn create(&self, type_id: TypeId, annotations: &AnnotationList) -> Option<Arc<dyn DynParameterType<A>>> {
        self(type_id, annotations)
    }
}

/// A value derived without reading input — the actor itself, a logger
/// handle, a cooldown handle. Declared by a factory inspecting the
/// parameter's type and annotations; never occupies an input position.
pub trait ContextParameter<A: Actor>: Send + Sync {
    /// Resolves the value for this dispatch.
    fn resolve(&self, ctx: &ExecutionContext<A>) -> Result<Box<dyn Any + Send + Sync>, CommandError>;
}

/// Produces a [`ContextParameter`] for a declared parameter type, or
/// `None` if this factory doesn't recognize it.
pub trait ContextParameterFactory<A: Actor>: Send + Sync {
    /// Attempts to build a context-parameter resolver for `type_id`.
    fn create(
        &self,
        type_id: TypeId,
        annotations: &AnnotationList,
    ) -> Option<Arc<dyn ContextParameter<A>>>;
}

/// Produces completion strings for a partial argument. Providers may read
/// the stream they're given non-destructively: the suggestion engine
/// always hands them an owned fork, never the live dispatch stream.
pub trait SuggestionProvider<A: Actor>: Send + Sync {
    /// Returns candidate completions for the partial token at the current
    /// position of `stream`. An empty vec means no completions.
    fn suggestions(&self, stream: StringStream, ctx: &ExecutionContext<A>) -> Vec<String>;
}

/// Produces a [`SuggestionProvider`] for a declared parameter type or its
/// annotations.
pub trait SuggestionProviderFactory<A: Actor>: Send + Sync {
    /// Attempts to build a suggestion provider for `type_id`.
    fn create(
        &self,
        type_id: TypeId,
        annotations: &AnnotationList,
    ) -> Option<Arc<dyn SuggestionProvider<A>>>;
}

/// Registry of [`ParameterTypeFactory`] entries.
pub type ParameterTypeRegistry<A> = Registry<Arc<dyn ParameterTypeFactory<A>>>;
/// Registry of [`ContextParameterFactory`] entries.
pub type ContextParameterRegistry<A> = Registry<Arc<dyn ContextParameterFactory<A>>>;
/// Registry of [`SuggestionProviderFactory`] entries.
pub type SuggestionProviderRegistry<A> = Registry<Arc<dyn SuggestionProviderFactory<A>>>;
