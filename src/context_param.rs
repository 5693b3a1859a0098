//! Built-in [`ContextParameterFactory`] for the actor itself.
//!
//! Every handler needs the actor without it occupying an input position —
//! the teacher's `CommandExecutor::execute` always takes `&mut
//! CommandContext` as an implicit first parameter for exactly this reason.
//! This makes that implicit convention an explicit, registry-resolved
//! context parameter instead, so other embedder-defined context parameters
//! (a logger, a cooldown handle) plug in the same way.
use std::any::TypeId;
use std::sync::Arc;

use crate::actor::Actor;
use crate::annotations::AnnotationList;
use crate::context::ExecutionContext;
use crate::error::CommandError;
use crate::parameters::{ContextParameter, ContextParameterFactory};

/// Marker type used as the declared parameter type for "give me the
/// actor". Registered against [`TypeId::of::<ActorMarker>()`].
pub struct ActorMarker;

struct ActorContextParameter;

impl<A: Actor> ContextParameter<A> for ActorContextParameter {
    fn resolve(
        &self,
        ctx: &ExecutionContext<A>,
    ) -> Result<Box<dyn std::any::Any + Send + Sync>, CommandError> {
        Ok(Box::new(Arc::clone(ctx.actor())))
    }
}

/// The always-registered factory resolving [`ActorMarker`] to the
/// dispatching actor.
pub struct ActorContextParameterFactory;

impl<A: Actor> ContextParameterFactory<A> for ActorContextParameterFactory {
    fn create(
        &self,
        type_id: TypeId,
        _annotations: &AnnotationList,
    ) -> Option<Arc<dyn ContextParameter<A>>> {
        (type_id == TypeId::of::<ActorMarker>()).then(|| Arc::new(ActorContextParameter) as _)
    }
}
