//! Converts handler declarations into parameter descriptors and command
//! paths (spec §4.C, steps 1–2), and the path-expansion law (spec §8,
//! "Path determinism").
//!
//! The teacher has no declaration-ingestion layer of its own — Rust has no
//! reflection, so `tp.rs`/`tick.rs`/etc. build their trees directly with
//! the `literal`/`argument`/`executes` combinators in `command/commands/mod.rs`.
//! This module is the explicit builder API the Design Notes ask for in
//! place of reflection: an embedder (or a future macro crate) constructs a
//! [`MethodDeclaration`] by hand and hands it to [`crate::Lamp::register`].
use std::any::TypeId;
use std::sync::Arc;

use crate::actor::Actor;
use crate::annotations::AnnotationList;
use crate::error::CommandError;
use crate::handler::Handler;

/// One segment of a command path: a fixed token, or a `<name>` placeholder
/// bound to a declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A fixed token, matched case-insensitively.
    Literal(String),
    /// A placeholder bound to the parameter of the same name.
    Placeholder(String),
}

/// An ordered sequence of path segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandPath {
    /// The segments, in order.
    pub segments: Vec<PathSegment>,
}

impl CommandPath {
    /// Splits a raw path string on whitespace and classifies each segment.
    /// `<name>` segments become [`PathSegment::Placeholder`]; anything else
    /// is a [`PathSegment::Literal`].
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CommandError::MalformedPath { path: raw.to_string() });
        }

        let segments = trimmed
            .split_whitespace()
            .map(|token| {
                if let Some(name) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                    PathSegment::Placeholder(name.to_string())
                } else {
                    PathSegment::Literal(token.to_string())
                }
            })
            .collect();

        Ok(Self { segments })
    }

    /// Number of path segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Computes the Cartesian product of path alternatives across nesting
/// levels (enclosing command paths × subcommand paths × method paths),
/// preserving declaration order at every level — spec §8's "Path
/// determinism" law.
#[must_use]
pub fn expand_paths(levels: &[Vec<String>]) -> Vec<String> {
    levels.iter().fold(vec![String::new()], |acc, level| {
        let mut next = Vec::with_capacity(acc.len() * level.len().max(1));
        for prefix in &acc {
            for suffix in level {
                if prefix.is_empty() {
                    next.push(suffix.clone());
                } else {
                    next.push(format!("{prefix} {suffix}"));
                }
            }
        }
        next
    })
}

/// A default-value descriptor: either the parameter is required, or it
/// carries a default produced lazily at dispatch time.
pub enum DefaultValue {
    /// No default; a `MissingArgument` is raised if the parameter is
    /// unset.
    Required,
    /// A default value, materialized on demand.
    Value(Arc<dyn Fn() -> Box<dyn std::any::Any + Send + Sync> + Send + Sync>),
}

/// One parameter of a handler declaration: name, type, annotations,
/// default, and whether it's a placeholder-bound input or a context
/// parameter.
pub struct ParameterDeclaration {
    /// The parameter's name, matched against `<name>` placeholders.
    pub name: String,
    /// The parameter's declared type, used for registry resolution.
    pub type_id: TypeId,
    /// Human-readable type name, used in error messages.
    pub type_name: String,
    /// Annotations attached to this parameter.
    pub annotations: AnnotationList,
    /// The default-value descriptor.
    pub default: DefaultValue,
    /// Whether the parameter may be omitted from the input entirely (a
    /// trailing optional).
    pub optional: bool,
    /// Whether this parameter is resolved via the context-parameter
    /// registry (no input position) rather than parsed from the stream.
    pub is_context: bool,
}

impl ParameterDeclaration {
    /// A required, input-parsed parameter.
    #[must_use]
    pub fn required<T: 'static>(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: type_name.into(),
            annotations: AnnotationList::new(),
            default: DefaultValue::Required,
            optional: false,
            is_context: false,
        }
    }

    /// A context parameter: not read from input, resolved at invocation
    /// time via the context-parameter registry.
    #[must_use]
    pub fn context<T: 'static>(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: type_name.into(),
            annotations: AnnotationList::new(),
            default: DefaultValue::Required,
            optional: false,
            is_context: true,
        }
    }

    /// Marks this parameter optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attaches a default value, implying optional.
    #[must_use]
    pub fn with_default<T: Send + Sync + 'static>(mut self, make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.optional = true;
        self.default = DefaultValue::Value(Arc::new(move || Box::new(make()) as Box<dyn std::any::Any + Send + Sync>));
        self
    }

    /// Attaches annotations.
    #[must_use]
    pub fn annotated(mut self, annotations: AnnotationList) -> Self {
        self.annotations = annotations;
        self
    }
}

/// One handler declaration: its path alternatives, its parameters, its
/// own annotations (permission, conditions, cooldown, description,
/// response-handler overrides) and the handler body itself.
pub struct MethodDeclaration<A: Actor> {
    /// Fully expanded path alternatives (already past [`expand_paths`]).
    pub paths: Vec<String>,
    /// Declared parameters, in declaration order.
    pub parameters: Vec<ParameterDeclaration>,
    /// Method-level annotations.
    pub annotations: AnnotationList,
    /// The handler's return type, if it produces a value the
    /// response-handler registry should consume. `None` for handlers
    /// whose only effect is replying to the actor directly.
    pub response_type: Option<TypeId>,
    /// The handler body.
    pub handler: Arc<dyn Handler<A>>,
}

impl<A: Actor> MethodDeclaration<A> {
    /// Builds a declaration for a single path string with no Cartesian
    /// expansion needed.
    #[must_use]
    pub fn new(path: impl Into<String>, handler: impl Handler<A> + 'static) -> Self {
        Self {
            paths: vec![path.into()],
            parameters: Vec::new(),
            annotations: AnnotationList::new(),
            response_type: None,
            handler: Arc::new(handler),
        }
    }

    /// Builds a declaration across the Cartesian product of `levels`
    /// (e.g. `[class_paths, subcommand_paths, method_paths]`).
    #[must_use]
    pub fn expanded(levels: &[Vec<String>], handler: impl Handler<A> + 'static) -> Self {
        Self {
            paths: expand_paths(levels),
            parameters: Vec::new(),
            annotations: AnnotationList::new(),
            response_type: None,
            handler: Arc::new(handler),
        }
    }

    /// Appends a parameter declaration.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Attaches method-level annotations.
    #[must_use]
    pub fn annotated(mut self, annotations: AnnotationList) -> Self {
        self.annotations = annotations;
        self
    }

    /// Declares that this handler's return value should be routed through
    /// the response-handler registry as type `T`.
    #[must_use]
    pub fn responds_with<T: 'static>(mut self) -> Self {
        self.response_type = Some(TypeId::of::<T>());
        self
    }
}
