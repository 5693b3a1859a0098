use std::sync::{Arc, Mutex, Once};

use lamp_core::actor::Actor;

static TRACING_INIT: Once = Once::new();

/// Installs a process-wide `tracing` subscriber the first time any
/// integration test builds a `Lamp`, so failures logged via `tracing::debug!`
/// (see `error::DefaultFailureHandler`) surface on `cargo test -- --nocapture`
/// instead of being silently dropped.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A minimal actor shared across the integration suites: an identity, a
/// display name (used by the `target`-lookup parser in
/// `dispatch_scenarios.rs`), and a reply sink that just records what it
/// was sent instead of printing it anywhere.
pub struct TestActor {
    pub id: u64,
    pub name: String,
    replies: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl TestActor {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: name.into(),
            replies: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        })
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last_reply(&self) -> Option<String> {
        self.replies.lock().unwrap().last().cloned()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Actor for TestActor {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }

    fn reply(&self, text: &str) {
        self.replies.lock().unwrap().push(text.to_string());
    }

    fn error(&self, text: &str) {
        self.errors.lock().unwrap().push(text.to_string());
    }
}

/// Builds a `Lamp` whose default failure handler routes straight back to
/// the failing actor's own reply sink, the shape every scenario test uses
/// unless it installs something more specific.
#[must_use]
pub fn lamp() -> lamp_core::Lamp<TestActor> {
    init_tracing();
    lamp_core::Lamp::new(|actor: &TestActor, text: &str| actor.reply(text))
}
