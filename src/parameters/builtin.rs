//! Built-in parameter types the registry resolves before the embedder's
//! own factories: strings, numbers, booleans, and a generic enum parser.
//!
//! Directly grounded in `command/arguments/integer.rs` (bounded numeric
//! parser), `command/arguments/bool.rs` (`true`/`false` with
//! case-insensitive match and a two-entry suggestion list) and
//! `command/arguments/gamemode.rs` (string-to-enum lookup plus a
//! prefix-filtered suggestion list) from the teacher.
use std::marker::PhantomData;
use std::sync::Arc;

use crate::actor::Actor;
use crate::context::ExecutionContext;
use crate::error::CommandError;
use crate::parameters::{ParameterType, Priority, SuggestionProvider};
use crate::stream::StringStream;

/// How a [`StringParameterType`] should consume its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMode {
    /// A single unquoted word.
    Word,
    /// A quoted string, or a single word if unquoted.
    Quotable,
    /// The remainder of the line, verbatim.
    Greedy,
}

/// Parses a `String` in one of three modes.
pub struct StringParameterType {
    mode: StringMode,
}

impl StringParameterType {
    /// A single-word string parser.
    #[must_use]
    pub const fn word() -> Self {
        Self { mode: StringMode::Word }
    }

    /// A quoted-or-single-word string parser.
    #[must_use]
    pub const fn quotable() -> Self {
        Self { mode: StringMode::Quotable }
    }

    /// A parser that consumes the rest of the line.
    #[must_use]
    pub const fn greedy() -> Self {
        Self { mode: StringMode::Greedy }
    }
}

impl<A: Actor> ParameterType<A, String> for StringParameterType {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<A>) -> Result<String, CommandError> {
        match self.mode {
            StringMode::Word => {
                let token = stream.read_unquoted_string();
                if token.is_empty() {
                    Err(CommandError::MissingArgument {
                        parameter: String::new(),
                        type_name: "string".into(),
                    })
                } else {
                    Ok(token)
                }
            }
            StringMode::Quotable => stream.read_string(),
            StringMode::Greedy => {
                let rest = stream.read_remaining();
                if rest.is_empty() {
                    Err(CommandError::MissingArgument {
                        parameter: String::new(),
                        type_name: "string".into(),
                    })
                } else {
                    Ok(rest)
                }
            }
        }
    }
}

/// Parses a bounded or unbounded 32-bit integer.
pub struct IntegerParameterType {
    min: Option<i32>,
    max: Option<i32>,
}

impl IntegerParameterType {
    /// An unbounded integer parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { min: None, max: None }
    }

    /// A bounded integer parser; out-of-range values fail with
    /// `NumberOutOfRange`.
    #[must_use]
    pub const fn bounded(min: Option<i32>, max: Option<i32>) -> Self {
        Self { min, max }
    }
}

impl Default for IntegerParameterType {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Actor> ParameterType<A, i32> for IntegerParameterType {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<A>) -> Result<i32, CommandError> {
        let before = stream.position();
        let value = stream.read_int()?;
        if self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max) {
            stream.set_position(before);
            return Err(CommandError::NumberOutOfRange {
                token: value.to_string(),
            });
        }
        Ok(value)
    }
}

/// Parses a 64-bit integer.
pub struct LongParameterType;

impl<A: Actor> ParameterType<A, i64> for LongParameterType {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<A>) -> Result<i64, CommandError> {
        stream.read_long()
    }
}

/// Parses a double-precision float.
pub struct DoubleParameterType {
    min: Option<f64>,
    max: Option<f64>,
}

impl DoubleParameterType {
    /// An unbounded double parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { min: None, max: None }
    }

    /// A bounded double parser.
    #[must_use]
    pub const fn bounded(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

impl Default for DoubleParameterType {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Actor> ParameterType<A, f64> for DoubleParameterType {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<A>) -> Result<f64, CommandError> {
        let before = stream.position();
        let value = stream.read_double()?;
        if self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max) {
            stream.set_position(before);
            return Err(CommandError::NumberOutOfRange {
                token: value.to_string(),
            });
        }
        Ok(value)
    }
}

/// Parses a single-precision float.
pub struct FloatParameterType {
    min: Option<f32>,
    max: Option<f32>,
}

impl FloatParameterType {
    /// An unbounded float parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { min: None, max: None }
    }

    /// A bounded float parser.
    #[must_use]
    pub const fn bounded(min: Option<f32>, max: Option<f32>) -> Self {
        Self { min, max }
    }
}

impl Default for FloatParameterType {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Actor> ParameterType<A, f32> for FloatParameterType {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<A>) -> Result<f32, CommandError> {
        let before = stream.position();
        let value = stream.read_float()?;
        if self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max) {
            stream.set_position(before);
            return Err(CommandError::NumberOutOfRange {
                token: value.to_string(),
            });
        }
        Ok(value)
    }
}

/// Parses `true`/`false`, case-insensitively, with a two-entry suggestion
/// list.
pub struct BoolParameterType;

struct BoolSuggestions;
impl<A: Actor> SuggestionProvider<A> for BoolSuggestions {
    fn suggestions(&self, stream: StringStream, _ctx: &ExecutionContext<A>) -> Vec<String> {
        let prefix = stream.peek_token().to_ascii_lowercase();
        ["true", "false"]
            .into_iter()
            .filter(|s| s.starts_with(&prefix))
            .map(str::to_string)
            .collect()
    }
}

impl<A: Actor> ParameterType<A, bool> for BoolParameterType {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<A>) -> Result<bool, CommandError> {
        stream.read_boolean()
    }

    fn default_suggestions(&self) -> Option<Arc<dyn SuggestionProvider<A>>> {
        Some(Arc::new(BoolSuggestions))
    }
}

/// Parses a fixed set of string spellings into a typed enum value `T`, at
/// [`Priority::Highest`] so it wins overload resolution over a fallback
/// string/numeric parameter for the same token (spec §8, scenario 3).
pub struct EnumParameterType<T> {
    variants: Vec<(&'static str, T)>,
}

impl<T: Clone> EnumParameterType<T> {
    /// Builds an enum parser from `(spelling, value)` pairs. Spellings are
    /// matched case-insensitively.
    #[must_use]
    pub fn new(variants: Vec<(&'static str, T)>) -> Self {
        Self { variants }
    }
}

impl<A: Actor, T: Clone + Send + Sync> ParameterType<A, T> for EnumParameterType<T> {
    fn parse(&self, stream: &mut StringStream, _ctx: &ExecutionContext<A>) -> Result<T, CommandError> {
        let before = stream.position();
        let token = stream.read_unquoted_string();
        let lower = token.to_ascii_lowercase();
        match self.variants.iter().find(|(spelling, _)| *spelling == lower) {
            Some((_, value)) => Ok(value.clone()),
            None => {
                stream.set_position(before);
                Err(CommandError::InvalidEnum {
                    token,
                    allowed: self.variants.iter().map(|(s, _)| (*s).to_string()).collect(),
                })
            }
        }
    }

    fn parse_priority(&self) -> Priority {
        Priority::Highest
    }

    fn default_suggestions(&self) -> Option<Arc<dyn SuggestionProvider<A>>> {
        Some(Arc::new(EnumSuggestions {
            spellings: self.variants.iter().map(|(s, _)| *s).collect(),
            _marker: PhantomData,
        }))
    }
}

struct EnumSuggestions<A> {
    spellings: Vec<&'static str>,
    _marker: PhantomData<fn() -> A>,
}

impl<A: Actor> SuggestionProvider<A> for EnumSuggestions<A> {
    fn suggestions(&self, stream: StringStream, _ctx: &ExecutionContext<A>) -> Vec<String> {
        let prefix = stream.peek_token().to_ascii_lowercase();
        self.spellings
            .iter()
            .filter(|s| s.starts_with(&prefix))
            .map(|s| (*s).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;

    struct DummyActor;
    impl Actor for DummyActor {
        type Id = u64;
        fn id(&self) -> u64 {
            0
        }
        fn reply(&self, _text: &str) {}
    }

    fn ctx() -> ExecutionContext<DummyActor> {
        ExecutionContext::new(Arc::new(DummyActor))
    }

    #[test]
    fn bounded_integer_rejects_out_of_range_and_rewinds() {
        let parser = IntegerParameterType::bounded(Some(0), Some(10));
        let mut stream = StringStream::new("42");
        let ctx = ctx();
        let err: CommandError = parser.parse(&mut stream, &ctx).unwrap_err();
        assert!(matches!(err, CommandError::NumberOutOfRange { .. }));
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn enum_parser_is_case_insensitive_and_highest_priority() {
        #[derive(Clone, Debug, PartialEq)]
        enum Mode {
            Fast,
            Slow,
        }
        let parser = EnumParameterType::new(vec![("fast", Mode::Fast), ("slow", Mode::Slow)]);
        let mut stream = StringStream::new("FAST");
        let ctx = ctx();
        let value = ParameterType::<DummyActor, Mode>::parse(&parser, &mut stream, &ctx).unwrap();
        assert_eq!(value, Mode::Fast);
        assert_eq!(parser.parse_priority(), Priority::Highest);
    }

    #[test]
    fn enum_parser_rejects_unknown_token() {
        let parser: EnumParameterType<i32> = EnumParameterType::new(vec![("one", 1)]);
        let mut stream = StringStream::new("42");
        let ctx = ctx();
        let err = ParameterType::<DummyActor, i32>::parse(&parser, &mut stream, &ctx).unwrap_err();
        assert!(matches!(err, CommandError::InvalidEnum { .. }));
    }
}
