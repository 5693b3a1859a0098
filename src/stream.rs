//! Cursor-tracked reader over a raw command line.
//!
//! Mirrors the token-splitting the teacher command dispatcher does ad hoc in
//! `CommandDispatcher::split_command`, but as a proper cursor so the
//! dispatcher can fork, peek and rewind instead of pre-splitting on
//! whitespace up front.

use crate::error::CommandError;

/// Mutable cursor over an input string. All reads advance the cursor on
/// success and leave it untouched on failure.
#[derive(Clone, Debug)]
pub struct StringStream {
    input: Vec<char>,
    cursor: usize,
}

impl StringStream {
    /// Wraps a raw input line.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            cursor: 0,
        }
    }

    /// Current cursor position, in code points.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor to an arbitrary position.
    pub fn set_position(&mut self, position: usize) {
        self.cursor = position.min(self.input.len());
    }

    /// Whether any input remains past the cursor.
    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.cursor < self.input.len()
    }

    /// Next code point without advancing.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.input.get(self.cursor).copied()
    }

    /// Advances past any leading whitespace.
    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.cursor += 1;
        }
    }

    /// A non-destructive snapshot; the dispatcher and suggestion engine fork
    /// streams this way before attempting a parameter parse.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Consumes characters until the next whitespace (or EOF). Returns an
    /// empty string, without error, if already sitting on whitespace.
    pub fn read_unquoted_string(&mut self) -> String {
        let start = self.cursor;
        while matches!(self.peek(), Some(c) if !c.is_whitespace()) {
            self.cursor += 1;
        }
        self.input[start..self.cursor].iter().collect()
    }

    /// Reads a string: quoted (honoring `\"` and `\\`) if the next
    /// character is `"`, otherwise behaves like [`read_unquoted_string`].
    ///
    /// [`read_unquoted_string`]: Self::read_unquoted_string
    pub fn read_string(&mut self) -> Result<String, CommandError> {
        if self.peek() == Some('"') {
            self.read_quoted_string()
        } else {
            Ok(self.read_unquoted_string())
        }
    }

    fn read_quoted_string(&mut self) -> Result<String, CommandError> {
        let start = self.cursor;
        self.cursor += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None => {
                    self.cursor = start;
                    return Err(CommandError::ExpectedInput);
                }
                Some('"') => {
                    self.cursor += 1;
                    return Ok(out);
                }
                Some('\\') => {
                    self.cursor += 1;
                    match self.peek() {
                        Some(c @ ('"' | '\\')) => {
                            out.push(c);
                            self.cursor += 1;
                        }
                        _ => {
                            self.cursor = start;
                            return Err(CommandError::ExpectedInput);
                        }
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.cursor += 1;
                }
            }
        }
    }

    /// Consumes the rest of the input verbatim. Never fails; may return an
    /// empty string.
    pub fn read_remaining(&mut self) -> String {
        let rest: String = self.input[self.cursor..].iter().collect();
        self.cursor = self.input.len();
        rest
    }

    /// Reads a run of characters that could plausibly be a number
    /// (`-`, digits, a single `.`) without validating the grammar; the
    /// typed readers below parse and classify the result.
    fn read_number_token(&mut self) -> Result<String, CommandError> {
        let start = self.cursor;
        if self.peek() == Some('-') {
            self.cursor += 1;
        }
        let mut seen_dot = false;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => self.cursor += 1,
                Some('.') if !seen_dot => {
                    seen_dot = true;
                    self.cursor += 1;
                }
                _ => break,
            }
        }
        if self.cursor == start {
            return Err(CommandError::ExpectedInput);
        }
        Ok(self.input[start..self.cursor].iter().collect())
    }

    /// Reads a 32-bit integer. Fails with `InvalidNumber` on a malformed
    /// token, `NumberOutOfRange` on overflow.
    pub fn read_int(&mut self) -> Result<i32, CommandError> {
        let before = self.cursor;
        let token = self.read_number_token()?;
        token.parse::<i32>().map_err(|_| {
            self.cursor = before;
            if token.parse::<i64>().is_ok() {
                CommandError::NumberOutOfRange { token }
            } else {
                CommandError::InvalidNumber { token }
            }
        })
    }

    /// Reads a 64-bit integer.
    pub fn read_long(&mut self) -> Result<i64, CommandError> {
        let before = self.cursor;
        let token = self.read_number_token()?;
        token.parse::<i64>().map_err(|_| {
            self.cursor = before;
            CommandError::InvalidNumber { token }
        })
    }

    /// Reads a double-precision float.
    pub fn read_double(&mut self) -> Result<f64, CommandError> {
        let before = self.cursor;
        let token = self.read_number_token()?;
        token.parse::<f64>().map_err(|_| {
            self.cursor = before;
            CommandError::InvalidNumber { token }
        })
    }

    /// Reads a single-precision float.
    pub fn read_float(&mut self) -> Result<f32, CommandError> {
        let before = self.cursor;
        let token = self.read_number_token()?;
        token.parse::<f32>().map_err(|_| {
            self.cursor = before;
            CommandError::InvalidNumber { token }
        })
    }

    /// Reads `true`/`false`, case-insensitively.
    pub fn read_boolean(&mut self) -> Result<bool, CommandError> {
        let before = self.cursor;
        let token = self.read_unquoted_string();
        match token.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => {
                self.cursor = before;
                Err(CommandError::InvalidValue {
                    parameter: String::new(),
                    token,
                    reason: "expected true or false".into(),
                })
            }
        }
    }

    /// Convenience used by the tree walker: the next whitespace-delimited
    /// token without advancing the real cursor.
    #[must_use]
    pub fn peek_token(&self) -> String {
        let mut fork = self.fork();
        fork.read_unquoted_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_string_round_trips_escapes() {
        let mut s = StringStream::new(r#""hello \"world\"" rest"#);
        let value = s.read_string().unwrap();
        assert_eq!(value, r#"hello "world""#);
        s.skip_whitespace();
        assert_eq!(s.read_unquoted_string(), "rest");
    }

    #[test]
    fn unterminated_quote_errors_and_rewinds() {
        let mut s = StringStream::new(r#""oops"#);
        let start = s.position();
        assert!(matches!(s.read_string(), Err(CommandError::ExpectedInput)));
        assert_eq!(s.position(), start);
    }

    #[test]
    fn integer_overflow_is_out_of_range_not_invalid() {
        let mut s = StringStream::new("99999999999999999999");
        assert!(matches!(
            s.read_int(),
            Err(CommandError::NumberOutOfRange { .. })
        ));
    }

    #[test]
    fn fork_does_not_affect_parent_cursor() {
        let mut s = StringStream::new("one two");
        let mut forked = s.fork();
        forked.read_unquoted_string();
        assert_eq!(s.position(), 0);
        assert_eq!(s.read_unquoted_string(), "one");
    }
}
