//! Registration and execution hook chains, plus the cancel-handle they
//! share (spec §4.H).
//!
//! Grounded loosely in the teacher's plugin-event pattern used elsewhere
//! in the workspace (`steel-core` dispatches lifecycle events to listener
//! lists in registration order; see the tick scheduler in
//! `commands/tick.rs` reacting to a shared mutable rate). Here the three
//! chains (`on_registered`, `on_unregistered`, `on_executed`) all fire in
//! registration order and a cancel never skips a later hook in the same
//! firing — every hook gets to see and react to the same attempt. What a
//! cancel *does* do is veto the action the firing gates: a registration
//! whose hooks cancel never reaches the tree, an unregistration whose hooks
//! cancel leaves the leaf in place, and an execution whose hooks cancel
//! never reaches the handler body.
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::actor::Actor;
use crate::error::CommandError;
use crate::tree::ExecutableCommand;

/// A single-bit, set-once latch a hook can raise to signal "suppress the
/// embedder's default follow-up action" without stopping the remaining
/// hooks in the same chain from running.
#[derive(Default)]
pub struct CancelHandle {
    cancelled: AtomicBool,
}

impl CancelHandle {
    /// A fresh, uncancelled handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the latch. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether any hook in this firing raised the latch.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Fires before a built command is inserted into the tree. Raising `cancel`
/// prevents the insertion.
pub trait RegisteredHook<A: Actor>: Send + Sync {
    /// Observes a leaf about to be registered. `cancel` is shared across
    /// every hook in this firing; any hook may raise it.
    fn on_registered(&self, command: &ExecutableCommand<A>, cancel: &CancelHandle);
}

/// Fires before a command is removed from the tree. Raising `cancel` leaves
/// it in place.
pub trait UnregisteredHook<A: Actor>: Send + Sync {
    /// Observes a leaf about to be removed. `cancel` is shared across every
    /// hook in this firing; any hook may raise it.
    fn on_unregistered(&self, command: &ExecutableCommand<A>, cancel: &CancelHandle);
}

/// Fires once conditions, permission, cooldown and validators have all
/// passed, before the handler body runs. Raising `cancel` skips invocation,
/// the cooldown commit and the response handler, reporting a `Cancelled`
/// outcome instead.
pub trait ExecutedHook<A: Actor>: Send + Sync {
    /// Observes the pending execution. `outcome` reflects the attempt so
    /// far — `Ok(())` unless a hook cancels it. `cancel` is shared across
    /// every hook in this firing; any hook may raise it.
    fn on_executed(
        &self,
        command: &ExecutableCommand<A>,
        actor: &A,
        outcome: &Result<(), CommandError>,
        cancel: &CancelHandle,
    );
}

thread_local! {
    static EXECUTED_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Bounds self-triggering `on_executed` chains: a hook body that itself
/// dispatches a command (directly or transitively) stops re-entering this
/// chain past this depth, rather than recursing until the stack overflows.
const MAX_REENTRANT_DEPTH: u32 = 4;

/// The three hook chains, each invoked in registration order.
#[derive(Default)]
pub struct HookRegistry<A: Actor> {
    registered: Vec<Arc<dyn RegisteredHook<A>>>,
    unregistered: Vec<Arc<dyn UnregisteredHook<A>>>,
    executed: Vec<Arc<dyn ExecutedHook<A>>>,
}

impl<A: Actor> HookRegistry<A> {
    /// An empty set of hook chains.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration hook.
    pub fn on_registered(&mut self, hook: impl RegisteredHook<A> + 'static) {
        self.registered.push(Arc::new(hook));
    }

    /// Appends an unregistration hook.
    pub fn on_unregistered(&mut self, hook: impl UnregisteredHook<A> + 'static) {
        self.unregistered.push(Arc::new(hook));
    }

    /// Appends an executed hook.
    pub fn on_executed(&mut self, hook: impl ExecutedHook<A> + 'static) {
        self.executed.push(Arc::new(hook));
    }

    pub(crate) fn fire_registered(&self, command: &ExecutableCommand<A>) -> CancelHandle {
        let cancel = CancelHandle::new();
        for hook in &self.registered {
            hook.on_registered(command, &cancel);
        }
        cancel
    }

    pub(crate) fn fire_unregistered(&self, command: &ExecutableCommand<A>) -> CancelHandle {
        let cancel = CancelHandle::new();
        for hook in &self.unregistered {
            hook.on_unregistered(command, &cancel);
        }
        cancel
    }

    pub(crate) fn fire_executed(&self, command: &ExecutableCommand<A>, actor: &A, outcome: &Result<(), CommandError>) -> CancelHandle {
        let cancel = CancelHandle::new();
        let depth = EXECUTED_DEPTH.with(Cell::get);
        if depth >= MAX_REENTRANT_DEPTH {
            return cancel;
        }
        EXECUTED_DEPTH.with(|d| d.set(depth + 1));
        for hook in &self.executed {
            hook.on_executed(command, actor, outcome, &cancel);
        }
        EXECUTED_DEPTH.with(|d| d.set(depth));
        cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationList;
    use crate::handler::unit_handler;
    use std::sync::Mutex;

    struct DummyActor;
    impl Actor for DummyActor {
        type Id = u64;
        fn id(&self) -> u64 {
            0
        }
        fn reply(&self, _text: &str) {}
    }

    fn dummy_command() -> ExecutableCommand<DummyActor> {
        ExecutableCommand {
            id: 1,
            full_path: "ping".to_string(),
            parameter_names: Vec::new(),
            handler: Arc::new(unit_handler(|_ctx| Ok(()))),
            permission: None,
            conditions: Vec::new(),
            annotations: AnnotationList::new(),
            response_handler: None,
            validators: Vec::new(),
            context_parameters: Vec::new(),
            cooldown: None,
            registration_index: 0,
        }
    }

    struct RecordingHook(Arc<Mutex<Vec<&'static str>>>, &'static str);
    impl ExecutedHook<DummyActor> for RecordingHook {
        fn on_executed(
            &self,
            _command: &ExecutableCommand<DummyActor>,
            _actor: &DummyActor,
            _outcome: &Result<(), CommandError>,
            cancel: &CancelHandle,
        ) {
            self.0.lock().unwrap().push(self.1);
            if self.1 == "first" {
                cancel.cancel();
            }
        }
    }

    #[test]
    fn cancel_does_not_skip_remaining_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.on_executed(RecordingHook(Arc::clone(&log), "first"));
        registry.on_executed(RecordingHook(Arc::clone(&log), "second"));

        let command = dummy_command();
        let cancel = registry.fire_executed(&command, &DummyActor, &Ok(()));

        assert!(cancel.is_cancelled());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }
}
