//! A hook that raises its `CancelHandle` vetoes the action it gates: a
//! cancelled registration never reaches the tree, and a cancelled execution
//! never reaches the handler body.
mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use lamp_core::declaration::MethodDeclaration;
use lamp_core::handler::unit_handler;
use lamp_core::hooks::{CancelHandle, RegisteredHook};
use lamp_core::tree::ExecutableCommand;

use common::{lamp, TestActor};

struct RejectByPath(&'static str);
impl RegisteredHook<TestActor> for RejectByPath {
    fn on_registered(&self, command: &ExecutableCommand<TestActor>, cancel: &CancelHandle) {
        if command.full_path == self.0 {
            cancel.cancel();
        }
    }
}

#[test]
fn cancelled_registration_never_reaches_the_tree() {
    let mut lamp = lamp();
    lamp.hooks().on_registered(RejectByPath("forbidden"));

    let ids = lamp
        .register(MethodDeclaration::new("forbidden", unit_handler(|_ctx| Ok(()))))
        .unwrap();
    assert!(ids.is_empty());

    let actor = TestActor::new(1, "tester");
    lamp.dispatch(Arc::clone(&actor), "forbidden");
    assert!(actor.last_reply().unwrap().contains("unknown command"));
}

struct CancelExecution {
    invoked: AtomicUsize,
    cancel_next: AtomicBool,
}

impl lamp_core::hooks::ExecutedHook<TestActor> for Arc<CancelExecution> {
    fn on_executed(
        &self,
        _command: &ExecutableCommand<TestActor>,
        _actor: &TestActor,
        _outcome: &Result<(), lamp_core::error::CommandError>,
        cancel: &CancelHandle,
    ) {
        self.invoked.fetch_add(1, Ordering::SeqCst);
        if self.cancel_next.load(Ordering::SeqCst) {
            cancel.cancel();
        }
    }
}

#[test]
fn cancelled_execution_skips_the_handler_body() {
    let mut lamp = lamp();
    let hook = Arc::new(CancelExecution {
        invoked: AtomicUsize::new(0),
        cancel_next: AtomicBool::new(true),
    });
    lamp.hooks().on_executed(Arc::clone(&hook));

    let handler_ran = Arc::new(AtomicBool::new(false));
    let handler_ran_clone = Arc::clone(&handler_ran);
    lamp.register(MethodDeclaration::new(
        "ring",
        unit_handler(move |_ctx| {
            handler_ran_clone.store(true, Ordering::SeqCst);
            Ok(())
        }),
    ))
    .unwrap();

    let actor = TestActor::new(1, "tester");
    lamp.dispatch(Arc::clone(&actor), "ring");

    assert_eq!(hook.invoked.load(Ordering::SeqCst), 1);
    assert!(!handler_ran.load(Ordering::SeqCst));
    assert!(actor.last_reply().is_some());
}
