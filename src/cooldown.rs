//! Per-actor, per-command cooldown tracking (spec §4.J).
//!
//! Grounded in the teacher's `tick_rate_manager` pattern
//! (`steel-core/src/lib.rs`, read through `parking_lot::RwLock` from
//! `commands/tick.rs`): shared mutable state keyed off a coarse identity,
//! read far more often than written. A cooldown table is additionally
//! high-cardinality and written by many actors concurrently, which is
//! exactly the shape `scc::HashMap` (already in the teacher's own
//! dependency stack for its command-name registry) is built for, rather
//! than a single `RwLock<HashMap<..>>` that would serialize every actor's
//! dispatch behind one lock.
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::actor::Actor;
use crate::annotations::AnnotationList;
use crate::context::ExecutionContext;
use crate::error::CommandError;
use crate::parameters::{ContextParameter, ContextParameterFactory};

/// Tracks cooldown expiries keyed by `(command identity, actor identity)`.
pub struct CooldownTracker<A: Actor> {
    expiries: scc::HashMap<(u64, A::Id), Instant>,
}

impl<A: Actor> Default for CooldownTracker<A> {
    fn default() -> Self {
        Self {
            expiries: scc::HashMap::new(),
        }
    }
}

impl<A: Actor> CooldownTracker<A> {
    /// An empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `actor_id` is still cooling down on `command_id`.
    #[must_use]
    pub fn is_on_cooldown(&self, command_id: u64, actor_id: &A::Id) -> bool {
        self.remaining_time(command_id, actor_id).is_some()
    }

    /// Time left before `actor_id` may invoke `command_id` again, or
    /// `None` if not on cooldown.
    #[must_use]
    pub fn remaining_time(&self, command_id: u64, actor_id: &A::Id) -> Option<Duration> {
        let key = (command_id, actor_id.clone());
        let expiry = self.expiries.read(&key, |_, v| *v)?;
        let now = Instant::now();
        (expiry > now).then(|| expiry - now)
    }

    /// Starts (or restarts) a cooldown of `duration` for `actor_id` on
    /// `command_id`.
    pub fn set_cooldown(&self, command_id: u64, actor_id: A::Id, duration: Duration) {
        let key = (command_id, actor_id);
        let expiry = Instant::now() + duration;
        let _ = self.expiries.remove(&key);
        let _ = self.expiries.insert(key, expiry);
    }

    /// Clears any cooldown for `actor_id` on `command_id`.
    pub fn remove_cooldown(&self, command_id: u64, actor_id: &A::Id) {
        let key = (command_id, actor_id.clone());
        let _ = self.expiries.remove(&key);
    }
}

/// The context-parameter value a handler receives when it declares a
/// [`CooldownHandle`] parameter: a bound view onto the tracker for its own
/// `(command, actor)` pair, plus the annotation-supplied default duration
/// (if any) for the no-argument `cooldown()` call.
pub struct CooldownHandle<A: Actor> {
    tracker: Arc<CooldownTracker<A>>,
    command_id: u64,
    actor_id: A::Id,
    annotated_duration: Option<Duration>,
}

impl<A: Actor> CooldownHandle<A> {
    pub(crate) fn new(
        tracker: Arc<CooldownTracker<A>>,
        command_id: u64,
        actor_id: A::Id,
        annotated_duration: Option<Duration>,
    ) -> Self {
        Self {
            tracker,
            command_id,
            actor_id,
            annotated_duration,
        }
    }

    /// Whether the dispatching actor is currently on cooldown.
    #[must_use]
    pub fn is_on_cooldown(&self) -> bool {
        self.tracker.is_on_cooldown(self.command_id, &self.actor_id)
    }

    /// Remaining cooldown time, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.tracker.remaining_time(self.command_id, &self.actor_id)
    }

    /// Starts a cooldown of `duration` explicitly.
    pub fn cooldown(&self, duration: Duration) {
        self.tracker.set_cooldown(self.command_id, self.actor_id.clone(), duration);
    }

    /// Starts a cooldown using the method's annotation-supplied duration.
    /// Fails with `UnboundCooldown` if the method carries no cooldown
    /// annotation and no duration was ever bound.
    pub fn cooldown_default(&self) -> Result<(), CommandError> {
        match self.annotated_duration {
            Some(duration) => {
                self.cooldown(duration);
                Ok(())
            }
            None => Err(CommandError::UnboundCooldown),
        }
    }

    /// Clears the cooldown early.
    pub fn remove(&self) {
        self.tracker.remove_cooldown(self.command_id, &self.actor_id);
    }
}

/// Marker type used as the declared parameter type for "give me this
/// command's cooldown handle".
pub struct CooldownMarker;

struct CooldownContextParameter<A: Actor> {
    tracker: Arc<CooldownTracker<A>>,
    command_id: u64,
    annotated_duration: Option<Duration>,
}

impl<A: Actor> ContextParameter<A> for CooldownContextParameter<A> {
    fn resolve(&self, ctx: &ExecutionContext<A>) -> Result<Box<dyn std::any::Any + Send + Sync>, CommandError> {
        Ok(Box::new(CooldownHandle::new(
            Arc::clone(&self.tracker),
            self.command_id,
            ctx.actor().id(),
            self.annotated_duration,
        )))
    }
}

/// Built per `ExecutableCommand` at registration time (the handle needs
/// to know its own command's identity and annotated duration up front),
/// not a generic registry-wide factory like the other context parameters.
pub struct CooldownContextParameterFactory<A: Actor> {
    tracker: Arc<CooldownTracker<A>>,
    command_id: u64,
    annotated_duration: Option<Duration>,
}

impl<A: Actor> CooldownContextParameterFactory<A> {
    /// Builds the per-command factory.
    #[must_use]
    pub fn new(tracker: Arc<CooldownTracker<A>>, command_id: u64, annotated_duration: Option<Duration>) -> Self {
        Self {
            tracker,
            command_id,
            annotated_duration,
        }
    }
}

impl<A: Actor> ContextParameterFactory<A> for CooldownContextParameterFactory<A> {
    fn create(
        &self,
        type_id: std::any::TypeId,
        _annotations: &AnnotationList,
    ) -> Option<Arc<dyn ContextParameter<A>>> {
        (type_id == std::any::TypeId::of::<CooldownMarker>()).then(|| {
            Arc::new(CooldownContextParameter {
                tracker: Arc::clone(&self.tracker),
                command_id: self.command_id,
                annotated_duration: self.annotated_duration,
            }) as _
        })
    }
}
