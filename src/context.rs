//! Per-dispatch execution state.
//!
//! Generalizes the teacher's [`CommandContext`](../../examples/tn-lorenz-SteelMC/steel-core/src/command/context.rs),
//! which holds the sender plus Minecraft-specific derived state (player,
//! world, position, rotation, anchor). The core can't know about players or
//! worlds, so those fields collapse into a single erased "parsed arguments
//! by name" map plus the literal-match counter the ranking step (spec §4.D)
//! needs.
use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::actor::Actor;
use crate::error::CommandError;

/// Created per dispatch, dropped once the dispatch completes. Holds the
/// actor, the arguments parsed so far (keyed by declared parameter name)
/// and bookkeeping the ranking step needs. Argument names are short-lived
/// and never attacker-controlled as hash keys, so lookups use the
/// teacher's non-cryptographic `FxHashMap` rather than std's `HashMap`.
pub struct ExecutionContext<A: Actor> {
    actor: Arc<A>,
    values: FxHashMap<String, Arc<dyn Any + Send + Sync>>,
    literal_matches: u32,
    priority_sum: i64,
    defaulted_count: u32,
}

impl<A: Actor> ExecutionContext<A> {
    /// Creates a fresh context for one dispatch.
    #[must_use]
    pub fn new(actor: Arc<A>) -> Self {
        Self {
            actor,
            values: FxHashMap::default(),
            literal_matches: 0,
            priority_sum: 0,
            defaulted_count: 0,
        }
    }

    /// The dispatching actor.
    #[must_use]
    pub fn actor(&self) -> &Arc<A> {
        &self.actor
    }

    /// Stores a parsed (or defaulted) argument value under its parameter name.
    pub fn set(&mut self, name: &str, value: Arc<dyn Any + Send + Sync>) {
        self.values.insert(name.to_string(), value);
    }

    /// Retrieves a previously parsed argument by name and type.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.values.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    /// Retrieves a previously parsed argument without downcasting, for
    /// callers (validators) that only know the parameter's `TypeId` at
    /// runtime.
    #[must_use]
    pub fn get_erased(&self, name: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(name).map(AsRef::as_ref)
    }

    /// Retrieves a previously parsed argument by name and type, producing
    /// `MissingArgument` if absent or of the wrong type. Handlers use this
    /// to assemble their typed argument vector.
    pub fn require<T: 'static>(&self, name: &str, type_name: &str) -> Result<&T, CommandError> {
        self.get::<T>(name).ok_or_else(|| CommandError::MissingArgument {
            parameter: name.to_string(),
            type_name: type_name.to_string(),
        })
    }

    pub(crate) fn record_literal_match(&mut self) {
        self.literal_matches += 1;
    }

    pub(crate) fn record_parser_priority(&mut self, rank: i64) {
        self.priority_sum += rank;
    }

    pub(crate) fn record_default_used(&mut self) {
        self.defaulted_count += 1;
    }

    /// Ranking tuple for this walk so far: `(literal_matches, priority_sum,
    /// -defaulted_count)`. Used by the dispatcher to pick the best
    /// candidate among several complete attempts (spec §4.D).
    #[must_use]
    pub(crate) fn rank_key(&self) -> (u32, i64, i64) {
        (self.literal_matches, self.priority_sum, -i64::from(self.defaulted_count))
    }
}

impl<A: Actor> Clone for ExecutionContext<A> {
    fn clone(&self) -> Self {
        Self {
            actor: Arc::clone(&self.actor),
            values: self.values.clone(),
            literal_matches: self.literal_matches,
            priority_sum: self.priority_sum,
            defaulted_count: self.defaulted_count,
        }
    }
}
