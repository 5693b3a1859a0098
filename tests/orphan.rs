//! Orphan declarations bound to runtime-supplied paths, including two
//! calls sharing a literal prefix (an entry plus one of its subcommands).
mod common;

use std::sync::Arc;

use common::{lamp, TestActor};
use lamp_core::annotations::AnnotationList;
use lamp_core::context::ExecutionContext;
use lamp_core::declaration::MethodDeclaration;
use lamp_core::handler::unit_handler;
use lamp_core::orphan::OrphanPlaceholder;

#[test]
fn orphan_entry_and_subcommand_bind_to_runtime_paths() {
    let mut lamp = lamp();

    lamp.register_orphan(
        MethodDeclaration::new(
            "placeholder",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                ctx.actor().reply("buzz: entry");
                Ok(())
            }),
        )
        .annotated(AnnotationList::new().with(OrphanPlaceholder)),
        "buzz",
    )
    .unwrap();

    lamp.register_orphan(
        MethodDeclaration::new(
            "placeholder",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                ctx.actor().reply("buzz: bar");
                Ok(())
            }),
        )
        .annotated(AnnotationList::new().with(OrphanPlaceholder)),
        "buzz bar",
    )
    .unwrap();

    let alice = TestActor::new(1, "alice");

    lamp.dispatch(Arc::clone(&alice), "buzz");
    assert_eq!(alice.last_reply(), Some("buzz: entry".to_string()));

    lamp.dispatch(Arc::clone(&alice), "buzz bar");
    assert_eq!(alice.last_reply(), Some("buzz: bar".to_string()));
}

#[test]
fn registering_without_the_orphan_placeholder_is_rejected() {
    let mut lamp = lamp();
    let declaration = MethodDeclaration::new("placeholder", unit_handler(|_ctx: &mut ExecutionContext<TestActor>| Ok(())));
    assert!(lamp.register_orphan(declaration, "anything").is_err());
}
