//! Structured error taxonomy and the failure/exception reporting chain.
//!
//! The teacher's own [`CommandError`](../../examples/tn-lorenz-SteelMC/steel-core/src/command/error.rs)
//! is a hand-rolled enum with four variants matched in
//! `CommandDispatcher::handle_command` to build a reply `TextComponent`.
//! This is the same shape, generalized to the full taxonomy of spec §7 and
//! derived with `thiserror` rather than a manual `Display`, matching how
//! the rest of the workspace (e.g. `steel-core::player::message_chain`)
//! declares its errors.
use std::time::Duration;

use thiserror::Error;

/// A structured command-pipeline failure. Every variant carries enough
/// fields to render a message without parsing a string back out of it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    /// No literal matched at the root for this input prefix.
    #[error("unknown command: {prefix}")]
    UnknownCommand {
        /// The leading token that failed to resolve to any command.
        prefix: String,
    },

    /// The stream was empty where a non-optional parameter expected input.
    #[error("missing argument `{parameter}` ({type_name})")]
    MissingArgument {
        /// The parameter's declared name.
        parameter: String,
        /// A human-readable name for the parameter's type.
        type_name: String,
    },

    /// A parser rejected the token it was given.
    #[error("invalid value for `{parameter}`: `{token}` ({reason})")]
    InvalidValue {
        /// The parameter's declared name.
        parameter: String,
        /// The raw token that was rejected.
        token: String,
        /// Why the parser rejected it.
        reason: String,
    },

    /// Specialization of [`InvalidValue`](Self::InvalidValue): malformed numeric literal.
    #[error("invalid number: `{token}`")]
    InvalidNumber {
        /// The raw token that failed to parse as a number.
        token: String,
    },

    /// Specialization of [`InvalidValue`](Self::InvalidValue): numeric literal out of bounds.
    #[error("number out of range: `{token}`")]
    NumberOutOfRange {
        /// The raw token that overflowed its target type.
        token: String,
    },

    /// Specialization of [`InvalidValue`](Self::InvalidValue): enum-factory rejection.
    #[error("invalid value `{token}`, expected one of {allowed:?}")]
    InvalidEnum {
        /// The raw token that didn't match any variant.
        token: String,
        /// The accepted spellings.
        allowed: Vec<String>,
    },

    /// The effective permission check failed.
    #[error("missing permission: {required}")]
    NoPermission {
        /// The permission string that was required.
        required: String,
    },

    /// The actor is still cooling down on this command.
    #[error("on cooldown for another {remaining:?}")]
    OnCooldown {
        /// Time left before the actor may invoke this command again.
        remaining: Duration,
    },

    /// Unconsumed non-whitespace tokens remained past the matched leaf.
    #[error("extra arguments: {surplus}")]
    ExtraArguments {
        /// The tokens left over after the deepest matching leaf.
        surplus: String,
    },

    /// Build-time: two leaves share a path and an identical parameter-type sequence.
    #[error("duplicate command registered at `{path}`")]
    DuplicateCommand {
        /// The conflicting full path.
        path: String,
    },

    /// Build-time: a declared path could not be split or referenced an
    /// unknown parameter name.
    #[error("malformed command path `{path}`")]
    MalformedPath {
        /// The offending path string.
        path: String,
    },

    /// Build-time: a `<name>` placeholder did not match any declared parameter.
    #[error("path `{path}` references unresolved placeholder `<{name}>`")]
    UnresolvedPlaceholder {
        /// The path containing the placeholder.
        path: String,
        /// The placeholder name that had no matching parameter.
        name: String,
    },

    /// A generic error raised by a handler, condition or validator.
    #[error("{0}")]
    Custom(String),

    /// Misuse of the no-argument `cooldown()` call on an unbound handle.
    #[error("cooldown() called without an annotation-supplied or withCooldown-bound duration")]
    UnboundCooldown,

    /// A stream read failed because the input was exhausted.
    #[error("expected more input")]
    ExpectedInput,

    /// A hook raised its `CancelHandle` and vetoed the gated action
    /// (registration, unregistration or pre-handler execution).
    #[error("cancelled by a hook")]
    Cancelled,
}

impl CommandError {
    /// Ranking weight used to order competing failures from sibling
    /// branches that reached the same depth (spec §4.D, step "no
    /// candidates"). Higher wins.
    #[must_use]
    pub const fn failure_weight(&self) -> u8 {
        match self {
            Self::NoPermission { .. } => 3,
            Self::InvalidValue { .. }
            | Self::InvalidNumber { .. }
            | Self::NumberOutOfRange { .. }
            | Self::InvalidEnum { .. } => 2,
            Self::MissingArgument { .. } => 1,
            _ => 0,
        }
    }
}

/// Resolves a final, actor-facing message for a failure that reached the
/// `FailureHandler` (no candidate matched) rather than the per-kind
/// exception handler (a selected candidate failed during execution).
pub trait FailureHandler<A>: Send + Sync {
    /// Renders the highest-ranked failure for reply to the actor.
    fn handle(&self, actor: &A, error: &CommandError);
}

/// Default failure handler: replies with the error's `Display` rendering,
/// matching the teacher's `sender.send_message(&text.color(Color::Red))`
/// fallback in `CommandDispatcher::handle_command`.
pub struct DefaultFailureHandler<A> {
    reply: Box<dyn Fn(&A, &str) + Send + Sync>,
}

impl<A> DefaultFailureHandler<A> {
    /// Builds a failure handler that forwards through the given reply sink.
    pub fn new(reply: impl Fn(&A, &str) + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
        }
    }
}

impl<A> FailureHandler<A> for DefaultFailureHandler<A> {
    fn handle(&self, actor: &A, error: &CommandError) {
        tracing::debug!(%error, "dispatch produced no candidate");
        (self.reply)(actor, &error.to_string());
    }
}

/// Matches a raised [`CommandError`] against its kind and produces a
/// rendered message, with a fallback for kinds it doesn't specifically
/// handle. Resolved the same way as the other typed registries (component
/// C): insertion order, first match wins.
pub trait ExceptionHandler<A>: Send + Sync {
    /// Attempts to handle `error`; returns `false` to fall through to the
    /// next handler in the chain.
    fn handle(&self, actor: &A, error: &CommandError) -> bool;
}
