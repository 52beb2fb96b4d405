use crate::error::{Error, Result};
use jiter::{Jiter, JsonType, LinePosition, NumberInt, Peek};

/// Coarse kind of the next JSON value, as seen by [`TokenReader::peek_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl From<Peek> for TokenKind {
    fn from(peek: Peek) -> Self {
        match peek {
            Peek::Null => TokenKind::Null,
            Peek::True | Peek::False => TokenKind::Bool,
            Peek::String => TokenKind::String,
            Peek::Array => TokenKind::Array,
            Peek::Object => TokenKind::Object,
            _ => TokenKind::Number,
        }
    }
}

/// Pull reader over a complete JSON document.
pub struct TokenReader<'j> {
    jiter: Jiter<'j>,
}

impl<'j> std::fmt::Debug for TokenReader<'j> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenReader {{ jiter: {:?} }}", self.jiter)
    }
}

impl<'j> TokenReader<'j> {
    #[must_use]
    pub fn new(data: &'j [u8]) -> Self {
        TokenReader {
            jiter: Jiter::new(data),
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.jiter.current_index()
    }

    #[must_use]
    pub fn error_position(&self, index: usize) -> LinePosition {
        self.jiter.error_position(index)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn peek(&mut self) -> Result<Peek> {
        self.jiter.peek().map_err(Error::from_jiter_error)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn peek_kind(&mut self) -> Result<TokenKind> {
        self.peek().map(TokenKind::from)
    }

    /// Enter an object and return its first key, or `None` for `{}`.
    ///
    /// # Errors
    ///
    /// The next value is not an object, or the input is malformed.
    pub fn next_object(&mut self) -> Result<Option<&str>> {
        self.jiter.next_object().map_err(Error::from_jiter_error)
    }

    /// Move to the next key of the current object, or `None` at its end.
    ///
    /// # Errors
    ///
    /// The input is malformed.
    pub fn next_key(&mut self) -> Result<Option<&str>> {
        self.jiter.next_key().map_err(Error::from_jiter_error)
    }

    /// Enter an array and peek at its first element, or `None` for `[]`.
    ///
    /// # Errors
    ///
    /// The next value is not an array, or the input is malformed.
    pub fn next_array(&mut self) -> Result<Option<Peek>> {
        self.jiter.next_array().map_err(Error::from_jiter_error)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn array_step(&mut self) -> Result<Option<Peek>> {
        self.jiter.array_step().map_err(Error::from_jiter_error)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn next_null(&mut self) -> Result<()> {
        self.jiter.next_null().map_err(Error::from_jiter_error)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn next_bool(&mut self) -> Result<bool> {
        self.jiter.next_bool().map_err(Error::from_jiter_error)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn next_i64(&mut self) -> Result<i64> {
        let index = self.current_index();
        match self.jiter.next_int().map_err(Error::from_jiter_error)? {
            NumberInt::Int(value) => Ok(value),
            #[allow(unreachable_patterns)]
            _ => Err(Error::out_of_range(index, "i64")),
        }
    }

    /// Unsigned integers above `i64::MAX` are parsed from the raw number
    /// bytes, because jiter hands them out as big integers.
    ///
    /// # Errors
    ///
    /// The next value is not an integer, or it is negative or too large.
    /// A float is reported as a wrong type, the same as for [`Self::next_i64`].
    pub fn next_u64(&mut self) -> Result<u64> {
        self.peek()?;
        let index = self.current_index();
        let bytes = self
            .jiter
            .next_number_bytes()
            .map_err(Error::from_jiter_error)?;
        if bytes.iter().any(|b| matches!(b, b'.' | b'e' | b'E')) {
            return Err(Error::wrong_type(index, JsonType::Int, JsonType::Float));
        }
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.parse::<u64>().ok())
            .ok_or_else(|| Error::out_of_range(index, "u64"))
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn next_f64(&mut self) -> Result<f64> {
        self.jiter.next_float().map_err(Error::from_jiter_error)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn next_str(&mut self) -> Result<&str> {
        self.jiter.next_str().map_err(Error::from_jiter_error)
    }

    /// Consume the next value together with everything nested inside it.
    ///
    /// # Errors
    ///
    /// The input is malformed.
    pub fn next_skip(&mut self) -> Result<()> {
        self.jiter.next_skip().map_err(Error::from_jiter_error)
    }

    /// Check that only whitespace is left in the input.
    ///
    /// # Errors
    ///
    /// There is trailing data after the last value.
    pub fn finish(&mut self) -> Result<()> {
        self.jiter.finish().map_err(Error::from_jiter_error)
    }
}
