//! The execution-pipeline extension points: permissions, conditions,
//! validators and response handlers.
//!
//! The teacher only sketches permission checking
//! (`CommandDispatcher::execute` in `command/mod.rs` has the check
//! commented out with a `TODO`) and has no condition, validator or
//! response-handler concept at all — `CommandExecutor::execute` just
//! returns `Result<(), CommandError>` and the dispatcher ignores it. This
//! generalizes that single commented-out check into the full annotation-
//! resolved registry chain spec §4.D describes, keeping the same
//! `Result<(), CommandError>`-aborts-the-chain shape the teacher already
//! uses.
use std::any::TypeId;
use std::sync::Arc;

use crate::actor::Actor;
use crate::annotations::AnnotationList;
use crate::context::ExecutionContext;
use crate::error::CommandError;
use crate::registry::Registry;

/// A permission predicate resolved for one `ExecutableCommand`.
pub trait Permission<A: Actor>: Send + Sync {
    /// Returns `Ok(())` if the actor may run the command, or
    /// `NoPermission` otherwise.
    fn check(&self, ctx: &ExecutionContext<A>) -> Result<(), CommandError>;

    /// A human-readable description of what was required, used to
    /// populate `NoPermission::required`.
    fn describe(&self) -> String;
}

/// Produces a [`Permission`] from the method-level annotations.
pub trait PermissionFactory<A: Actor>: Send + Sync {
    /// Attempts to build a permission check from `annotations`.
    fn create(&self, annotations: &AnnotationList) -> Option<Arc<dyn Permission<A>>>;
}

/// A precondition evaluated before permission and validators. Raising a
/// [`CommandError`] aborts the dispatch.
pub trait Condition<A: Actor>: Send + Sync {
    /// Evaluates the condition against the current dispatch state.
    fn evaluate(&self, ctx: &ExecutionContext<A>) -> Result<(), CommandError>;
}

/// Produces [`Condition`]s from the method-level annotations.
pub trait ConditionFactory<A: Actor>: Send + Sync {
    /// Attempts to build conditions from `annotations`. A factory may
    /// contribute zero, one, or several conditions for the same method.
    fn create(&self, annotations: &AnnotationList) -> Vec<Arc<dyn Condition<A>>>;
}

/// Validates one already-parsed argument. Raising a [`CommandError`]
/// aborts the dispatch.
pub trait Validator<A: Actor, T>: Send + Sync {
    /// Validates `value`.
    fn validate(&self, value: &T, ctx: &ExecutionContext<A>) -> Result<(), CommandError>;
}

/// Type-erased validator, keyed by the parameter's `TypeId` the way
/// [`DynParameterType`](crate::parameters::DynParameterType) is.
pub trait DynValidator<A: Actor>: Send + Sync {
    /// Validates the erased value stored under a parameter's name.
    fn validate_erased(
        &self,
        value: &(dyn std::any::Any + Send + Sync),
        ctx: &ExecutionContext<A>,
    ) -> Result<(), CommandError>;
}

struct ErasedValidator<A, T, V> {
    inner: V,
    _marker: std::marker::PhantomData<fn() -> (A, T)>,
}

impl<A, T, V> DynValidator<A> for ErasedValidator<A, T, V>
where
    A: Actor,
    T: Send + Sync + 'static,
    V: Validator<A, T>,
{
    fn validate_erased(
        &self,
        value: &(dyn std::any::Any + Send + Sync),
        ctx: &ExecutionContext<A>,
    ) -> Result<(), CommandError> {
        let Some(typed) = value.downcast_ref::<T>() else {
            return Err(CommandError::Custom(
                "validator type mismatch (internal error)".into(),
            ));
        };
        self.inner.validate(typed, ctx)
    }
}

/// Wraps a typed [`Validator`] for erased storage in a
/// [`ValidatorRegistry`].
pub fn erase_validator<A, T, V>(inner: V) -> Arc<dyn DynValidator<A>>
where
    A: Actor,
    T: Send + Sync + 'static,
    V: Validator<A, T> + 'static,
{
    Arc::new(ErasedValidator {
        inner,
        _marker: std::marker::PhantomData,
    })
}

/// Produces [`DynValidator`]s for a declared parameter type and its
/// annotations.
pub trait ValidatorFactory<A: Actor>: Send + Sync {
    /// Attempts to build validators for `type_id`/`annotations`.
    fn create(&self, type_id: TypeId, annotations: &AnnotationList) -> Vec<Arc<dyn DynValidator<A>>>;
}

/// Receives a handler's return value and turns it into whatever the
/// embedder's reply channel expects (a reply message, a packet, nothing).
pub trait ResponseHandler<A: Actor, T>: Send + Sync {
    /// Handles `value`, typically by replying to the actor.
    fn handle(&self, value: T, ctx: &ExecutionContext<A>);
}

/// Type-erased response handler.
pub trait DynResponseHandler<A: Actor>: Send + Sync {
    /// Handles an erased return value.
    fn handle_erased(&self, value: Box<dyn std::any::Any + Send + Sync>, ctx: &ExecutionContext<A>);
}

struct ErasedResponseHandler<A, T, R> {
    inner: R,
    _marker: std::marker::PhantomData<fn() -> (A, T)>,
}

impl<A, T, R> DynResponseHandler<A> for ErasedResponseHandler<A, T, R>
where
    A: Actor,
    T: Send + Sync + 'static,
    R: ResponseHandler<A, T>,
{
    fn handle_erased(&self, value: Box<dyn std::any::Any + Send + Sync>, ctx: &ExecutionContext<A>) {
        match value.downcast::<T>() {
            Ok(typed) => self.inner.handle(*typed, ctx),
            Err(_) => tracing::error!("response handler type mismatch (internal error)"),
        }
    }
}

/// Wraps a typed [`ResponseHandler`] for erased storage.
pub fn erase_response_handler<A, T, R>(inner: R) -> Arc<dyn DynResponseHandler<A>>
where
    A: Actor,
    T: Send + Sync + 'static,
    R: ResponseHandler<A, T> + 'static,
{
    Arc::new(ErasedResponseHandler {
        inner,
        _marker: std::marker::PhantomData,
    })
}

/// Produces a [`DynResponseHandler`] for a return type and method
/// annotations.
pub trait ResponseHandlerFactory<A: Actor>: Send + Sync {
    /// Attempts to build a response handler for `type_id`/`annotations`.
    fn create(
        &self,
        type_id: TypeId,
        annotations: &AnnotationList,
    ) -> Option<Arc<dyn DynResponseHandler<A>>>;
}

/// Registry of [`PermissionFactory`] entries.
pub type PermissionRegistry<A> = Registry<Arc<dyn PermissionFactory<A>>>;
/// Registry of [`ConditionFactory`] entries.
pub type ConditionRegistry<A> = Registry<Arc<dyn ConditionFactory<A>>>;
/// Registry of [`ValidatorFactory`] entries.
pub type ValidatorRegistry<A> = Registry<Arc<dyn ValidatorFactory<A>>>;
/// Registry of [`ResponseHandlerFactory`] entries.
pub type ResponseHandlerRegistry<A> = Registry<Arc<dyn ResponseHandlerFactory<A>>>;
/// Registry of [`crate::error::ExceptionHandler`] entries, keyed implicitly
/// by the order they're tried in (matched by kind, with a fallback).
pub type ExceptionHandlerRegistry<A> = Registry<Arc<dyn crate::error::ExceptionHandler<A>>>;
