//! A cooldown-annotated command succeeds, blocks a repeat invocation while
//! the window is open, then succeeds again once it has elapsed.
mod common;

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use common::{lamp, TestActor};
use lamp_core::annotations::AnnotationList;
use lamp_core::context::ExecutionContext;
use lamp_core::declaration::MethodDeclaration;
use lamp_core::handler::unit_handler;
use lamp_core::CooldownAnnotation;

#[test]
fn repeated_invocation_is_blocked_until_the_cooldown_expires() {
    let mut lamp = lamp();
    let duration = Duration::from_millis(150);

    lamp.register(
        MethodDeclaration::new(
            "heal",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                ctx.actor().reply("healed");
                Ok(())
            }),
        )
        .annotated(AnnotationList::new().with(CooldownAnnotation(duration))),
    )
    .unwrap();

    let alice = TestActor::new(1, "alice");

    lamp.dispatch(Arc::clone(&alice), "heal");
    assert_eq!(alice.last_reply(), Some("healed".to_string()));

    lamp.dispatch(Arc::clone(&alice), "heal");
    assert!(alice.last_reply().unwrap().contains("cooldown"));

    sleep(duration + Duration::from_millis(100));

    lamp.dispatch(Arc::clone(&alice), "heal");
    assert_eq!(alice.last_reply(), Some("healed".to_string()));
}

#[test]
fn cooldowns_are_tracked_independently_per_actor() {
    let mut lamp = lamp();
    let duration = Duration::from_millis(150);

    lamp.register(
        MethodDeclaration::new(
            "heal",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                ctx.actor().reply("healed");
                Ok(())
            }),
        )
        .annotated(AnnotationList::new().with(CooldownAnnotation(duration))),
    )
    .unwrap();

    let alice = TestActor::new(1, "alice");
    let bob = TestActor::new(2, "bob");

    lamp.dispatch(Arc::clone(&alice), "heal");
    assert_eq!(alice.last_reply(), Some("healed".to_string()));

    lamp.dispatch(Arc::clone(&bob), "heal");
    assert_eq!(bob.last_reply(), Some("healed".to_string()));
}
