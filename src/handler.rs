//! The uniform, erased invocation interface every `ExecutableCommand` leaf
//! stores.
//!
//! Per the Design Notes (spec §9): "the tree stores handlers erased to a
//! uniform invocation interface `(context) -> return-value`, with argument
//! marshalling done before the call." Argument marshalling is
//! [`ExecutionContext::require`]; the handler itself just reads back
//! already-typed values by name.
use std::any::Any;

use crate::actor::Actor;
use crate::context::ExecutionContext;
use crate::error::CommandError;

/// A fully resolved handler body, invoked once dispatch has parsed every
/// argument into the [`ExecutionContext`] and run conditions, permission
/// and validators.
pub trait Handler<A: Actor>: Send + Sync {
    /// Runs the handler, returning its (possibly unit) response value for
    /// the response-handler registry to consume.
    fn invoke(&self, ctx: &mut ExecutionContext<A>) -> Result<Box<dyn Any + Send + Sync>, CommandError>;
}

impl<A, F> Handler<A> for F
where
    A: Actor,
    F: Fn(&mut ExecutionContext<A>) -> Result<Box<dyn Any + Send + Sync>, CommandError> + Send + Sync,
{
    fn invoke(&self, ctx: &mut ExecutionContext<A>) -> Result<Box<dyn Any + Send + Sync>, CommandError> {
        self(ctx)
    }
}

/// Wraps a handler body that returns nothing for the response-handler
/// chain, for the common case of a command whose only effect is replying
/// to the actor directly.
pub fn unit_handler<A, F>(body: F) -> impl Handler<A>
where
    A: Actor,
    F: Fn(&mut ExecutionContext<A>) -> Result<(), CommandError> + Send + Sync,
{
    move |ctx: &mut ExecutionContext<A>| body(ctx).map(|()| Box::new(()) as Box<dyn Any + Send + Sync>)
}
