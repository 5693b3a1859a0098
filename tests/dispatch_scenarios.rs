//! Exercises overload resolution, enum-vs-fallback priority, and a custom
//! actor-lookup parameter type end to end through `Lamp::dispatch`.
mod common;

use std::any::TypeId;
use std::sync::{Arc, Mutex};

use common::{lamp, TestActor};
use lamp_core::annotations::AnnotationList;
use lamp_core::context::ExecutionContext;
use lamp_core::context_param::ActorMarker;
use lamp_core::declaration::{MethodDeclaration, ParameterDeclaration};
use lamp_core::error::CommandError;
use lamp_core::handler::unit_handler;
use lamp_core::parameters::builtin::EnumParameterType;
use lamp_core::parameters::{DynParameterType, ErasedParameterType, ParameterType, ParameterTypeFactory};
use lamp_core::stream::StringStream;

/// A live directory of actors currently known to the dispatcher, the shape
/// a server's player list would take.
#[derive(Clone, Default)]
struct Directory(Arc<Mutex<Vec<Arc<TestActor>>>>);

impl Directory {
    fn add(&self, actor: &Arc<TestActor>) {
        self.0.lock().unwrap().push(Arc::clone(actor));
    }

    fn find(&self, name: &str) -> Option<Arc<TestActor>> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .cloned()
    }
}

/// Looks up an online actor by name, the same shape as the teacher's
/// `gamemode.rs` spelling lookup but resolving against live state instead
/// of a fixed set of variants.
struct TargetParameterType {
    directory: Directory,
}

impl ParameterType<TestActor, Arc<TestActor>> for TargetParameterType {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<TestActor>) -> Result<Arc<TestActor>, CommandError> {
        let before = stream.position();
        let token = stream.read_unquoted_string();
        self.directory.find(&token).ok_or_else(|| {
            stream.set_position(before);
            CommandError::InvalidValue {
                parameter: "target".to_string(),
                token,
                reason: "no such actor online".to_string(),
            }
        })
    }
}

fn register_target_parser(lamp: &mut lamp_core::Lamp<TestActor>, directory: Directory) {
    let factory = move |type_id: TypeId, _annotations: &AnnotationList| -> Option<Arc<dyn DynParameterType<TestActor>>> {
        (type_id == TypeId::of::<Arc<TestActor>>()).then(|| {
            Arc::new(ErasedParameterType::<TestActor, Arc<TestActor>, _>::new(TargetParameterType {
                directory: directory.clone(),
            })) as Arc<dyn DynParameterType<TestActor>>
        })
    };
    lamp.parameter_types().add(Arc::new(factory) as Arc<dyn ParameterTypeFactory<TestActor>>);
}

#[test]
fn greet_with_no_target_replies_to_the_caller() {
    let directory = Directory::default();
    let mut lamp = lamp();
    register_target_parser(&mut lamp, directory.clone());

    let alice = TestActor::new(1, "alice");
    directory.add(&alice);

    lamp.register(
        MethodDeclaration::new(
            "greet",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                let actor = ctx.require::<Arc<TestActor>>("actor", "actor")?;
                actor.reply(&format!("Hello, {}!", actor.name));
                Ok(())
            }),
        )
        .with_parameter(ParameterDeclaration::context::<ActorMarker>("actor", "actor")),
    )
    .unwrap();

    lamp.dispatch(Arc::clone(&alice), "greet");
    assert_eq!(alice.last_reply(), Some("Hello, alice!".to_string()));
}

#[test]
fn greet_with_a_target_resolves_through_the_custom_parser() {
    let directory = Directory::default();
    let mut lamp = lamp();
    register_target_parser(&mut lamp, directory.clone());

    let alice = TestActor::new(1, "alice");
    let bob = TestActor::new(2, "bob");
    directory.add(&alice);
    directory.add(&bob);

    lamp.register(MethodDeclaration::new(
        "greet <target>",
        unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
            let target = ctx.require::<Arc<TestActor>>("target", "actor")?;
            target.reply(&format!("Welcome, {}!", target.name));
            Ok(())
        }),
    )
    .with_parameter(ParameterDeclaration::required::<Arc<TestActor>>("target", "actor")))
    .unwrap();

    lamp.dispatch(Arc::clone(&alice), "greet bob");
    assert_eq!(bob.last_reply(), Some("Welcome, bob!".to_string()));

    lamp.dispatch(Arc::clone(&alice), "greet mallory");
    assert!(alice.last_reply().unwrap().contains("no such actor online"));
}

/// Four independently declared overloads of the same literal prefix,
/// exercising both literal sharing and the dispatcher's per-input
/// candidate selection (spec scenario: `teleport`, `teleport <target>`,
/// `teleport <x> <y> <z>`, `teleport <target> <x> <y> <z>`).
fn register_teleport_overloads(lamp: &mut lamp_core::Lamp<TestActor>) {
    lamp.register(
        MethodDeclaration::new(
            "teleport",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                let actor = ctx.require::<Arc<TestActor>>("actor", "actor")?;
                actor.reply("teleport: self, origin");
                Ok(())
            }),
        )
        .with_parameter(ParameterDeclaration::context::<ActorMarker>("actor", "actor")),
    )
    .unwrap();

    lamp.register(MethodDeclaration::new(
        "teleport <target>",
        unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
            let target = ctx.require::<Arc<TestActor>>("target", "actor")?;
            target.reply(&format!("teleport: self, to {}", target.name));
            Ok(())
        }),
    )
    .with_parameter(ParameterDeclaration::required::<Arc<TestActor>>("target", "actor")))
    .unwrap();

    lamp.register(
        MethodDeclaration::new(
            "teleport <x> <y> <z>",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                let actor = ctx.require::<Arc<TestActor>>("actor", "actor")?;
                let x = ctx.require::<f64>("x", "double")?;
                let y = ctx.require::<f64>("y", "double")?;
                let z = ctx.require::<f64>("z", "double")?;
                actor.reply(&format!("teleport: self, to {x} {y} {z}"));
                Ok(())
            }),
        )
        .with_parameter(ParameterDeclaration::context::<ActorMarker>("actor", "actor"))
        .with_parameter(ParameterDeclaration::required::<f64>("x", "double"))
        .with_parameter(ParameterDeclaration::required::<f64>("y", "double"))
        .with_parameter(ParameterDeclaration::required::<f64>("z", "double")),
    )
    .unwrap();

    lamp.register(
        MethodDeclaration::new(
            "teleport <target> <x> <y> <z>",
            unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
                let target = ctx.require::<Arc<TestActor>>("target", "actor")?;
                let x = ctx.require::<f64>("x", "double")?;
                let y = ctx.require::<f64>("y", "double")?;
                let z = ctx.require::<f64>("z", "double")?;
                target.reply(&format!("teleport: {} to {x} {y} {z}", target.name));
                Ok(())
            }),
        )
        .with_parameter(ParameterDeclaration::required::<Arc<TestActor>>("target", "actor"))
        .with_parameter(ParameterDeclaration::required::<f64>("x", "double"))
        .with_parameter(ParameterDeclaration::required::<f64>("y", "double"))
        .with_parameter(ParameterDeclaration::required::<f64>("z", "double")),
    )
    .unwrap();
}

#[test]
fn teleport_picks_the_overload_matching_the_argument_count_and_shape() {
    let directory = Directory::default();
    let mut lamp = lamp();
    register_target_parser(&mut lamp, directory.clone());
    register_teleport_overloads(&mut lamp);

    let alice = TestActor::new(1, "alice");
    let bob = TestActor::new(2, "bob");
    directory.add(&alice);
    directory.add(&bob);

    lamp.dispatch(Arc::clone(&alice), "teleport");
    assert_eq!(alice.last_reply(), Some("teleport: self, origin".to_string()));

    lamp.dispatch(Arc::clone(&alice), "teleport bob");
    assert_eq!(bob.last_reply(), Some("teleport: self, to bob".to_string()));

    lamp.dispatch(Arc::clone(&alice), "teleport 1 2 3");
    assert_eq!(alice.last_reply(), Some("teleport: self, to 1 2 3".to_string()));

    lamp.dispatch(Arc::clone(&alice), "teleport bob 4 5 6");
    assert_eq!(bob.last_reply(), Some("teleport: bob to 4 5 6".to_string()));
}

#[derive(Clone, Debug, PartialEq)]
enum Mode {
    Survival,
    Creative,
}

#[test]
fn mode_enum_wins_over_the_string_fallback_for_a_matching_spelling() {
    let mut lamp = lamp();

    let factory = move |type_id: TypeId, _annotations: &AnnotationList| -> Option<Arc<dyn DynParameterType<TestActor>>> {
        (type_id == TypeId::of::<Mode>()).then(|| {
            let parser = EnumParameterType::new(vec![("survival", Mode::Survival), ("creative", Mode::Creative)]);
            Arc::new(ErasedParameterType::<TestActor, Mode, _>::new(parser)) as Arc<dyn DynParameterType<TestActor>>
        })
    };
    lamp.parameter_types().add(Arc::new(factory) as Arc<dyn ParameterTypeFactory<TestActor>>);

    lamp.register(MethodDeclaration::new(
        "mode <value>",
        unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
            let mode = ctx.require::<Mode>("value", "mode")?;
            let actor = ctx.require::<Arc<TestActor>>("actor", "actor")?;
            actor.reply(&format!("mode: {mode:?}"));
            Ok(())
        }),
    )
    .with_parameter(ParameterDeclaration::context::<ActorMarker>("actor", "actor"))
    .with_parameter(ParameterDeclaration::required::<Mode>("value", "mode")))
    .unwrap();

    lamp.register(MethodDeclaration::new(
        "mode <value>",
        unit_handler(|ctx: &mut ExecutionContext<TestActor>| {
            let raw = ctx.require::<String>("value", "string")?;
            let actor = ctx.require::<Arc<TestActor>>("actor", "actor")?;
            actor.reply(&format!("mode: unrecognized {raw}"));
            Ok(())
        }),
    )
    .with_parameter(ParameterDeclaration::context::<ActorMarker>("actor", "actor"))
    .with_parameter(ParameterDeclaration::required::<String>("value", "string")))
    .unwrap();

    let alice = TestActor::new(1, "alice");

    lamp.dispatch(Arc::clone(&alice), "mode survival");
    assert_eq!(alice.last_reply(), Some("mode: Survival".to_string()));

    lamp.dispatch(Arc::clone(&alice), "mode hardcore");
    assert_eq!(alice.last_reply(), Some("mode: unrecognized hardcore".to_string()));
}
