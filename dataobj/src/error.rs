use thiserror::Error;

/// Mistakes in how a shape is declared or configured.
///
/// These are detected when a shape is finalized, on first use, and are
/// reported to every caller of that shape from then on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{type_name}` has no property named `{property}`")]
    UnknownProperty {
        type_name: &'static str,
        property: String,
    },
    #[error("`{type_name}` declares property `{property}` more than once")]
    DuplicateProperty {
        type_name: &'static str,
        property: String,
    },
    #[error("`{type_name}.{property}`: a converter is already registered")]
    DuplicateConverter {
        type_name: &'static str,
        property: String,
    },
    #[error("`{type_name}.{property}`: the list of read names is empty")]
    EmptyReadNames {
        type_name: &'static str,
        property: String,
    },
    #[error("`{type_name}`: constructor parameter `{parameter}` matches no property of the same type")]
    UnpairedParameter {
        type_name: &'static str,
        parameter: String,
    },
    #[error("`{type_name}`: constructor parameter `{parameter}` matches several properties")]
    AmbiguousParameter {
        type_name: &'static str,
        parameter: String,
    },
    #[error("`{type_name}` has no matching constructor and no default instantiation")]
    MissingInitializer { type_name: &'static str },
    #[error("`{type_name}.{property}` is writable but has no setter")]
    MissingSetter {
        type_name: &'static str,
        property: String,
    },
    #[error("`{type_name}.{property}`: the converter factory cannot handle `{property_type}` or any type it wraps")]
    UnresolvableFactory {
        type_name: &'static str,
        property: String,
        property_type: &'static str,
    },
    #[error("`{type_name}.{property}`: converter for `{converter_type}` does not apply to `{property_type}`")]
    ConverterMismatch {
        type_name: &'static str,
        property: String,
        converter_type: &'static str,
        property_type: &'static str,
    },
    #[error("`{interface}`: accessor `{property}` yields `{accessor_type}`, the implementation property is `{property_type}`")]
    AccessorType {
        interface: &'static str,
        property: String,
        accessor_type: &'static str,
        property_type: &'static str,
    },
    #[error("`{type_name}.{property}` cannot be assigned a decoded `{declared}`")]
    Unassignable {
        type_name: &'static str,
        property: String,
        declared: &'static str,
    },
    #[error("`{type_name}`: constructor argument {position} was taken as `{requested}`, but it is `{declared}`")]
    ArgumentType {
        type_name: &'static str,
        position: usize,
        requested: &'static str,
        declared: &'static str,
    },
}

/// Malformed or unexpected input.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Token(#[from] jsontok::Error),
    #[error("I/O error while reading input: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected property `{name}` for `{type_name}` at index {index}")]
    UnexpectedProperty {
        type_name: &'static str,
        name: String,
        index: usize,
    },
    #[error("missing required property `{name}` for `{type_name}` at index {index}")]
    MissingProperty {
        type_name: &'static str,
        name: String,
        index: usize,
    },
    #[error("`{type_name}.{property}` does not accept null (index {index})")]
    UnexpectedNull {
        type_name: &'static str,
        property: String,
        index: usize,
    },
    #[error("invalid `{target}` at index {index}: {message}")]
    InvalidValue {
        target: &'static str,
        message: String,
        index: usize,
    },
    #[error("converter did not produce a `{expected}` (index {index})")]
    ConverterType { expected: &'static str, index: usize },
}

impl DecodeError {
    /// Byte index in the input, when the error is tied to one.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            DecodeError::Token(e) => Some(e.index),
            DecodeError::Io(_) => None,
            DecodeError::UnexpectedProperty { index, .. }
            | DecodeError::MissingProperty { index, .. }
            | DecodeError::UnexpectedNull { index, .. }
            | DecodeError::InvalidValue { index, .. }
            | DecodeError::ConverterType { index, .. } => Some(*index),
        }
    }
}

/// Failures while writing a value. Writing a valid instance only fails on
/// I/O or on values JSON cannot represent.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    Token(#[from] jsontok::Error),
    #[error("converter for `{expected}` received a value of another type")]
    ConverterType { expected: &'static str },
    #[error("`{type_name}` value is not listed among its variants")]
    UnlistedVariant { type_name: &'static str },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Lift `jsontok` results into this crate's errors, choosing the direction.
pub trait TokenResultExt<T> {
    /// # Errors
    ///
    /// The token error, as a [`DecodeError`].
    fn decoding(self) -> Result<T>;

    /// # Errors
    ///
    /// The token error, as an [`EncodeError`].
    fn encoding(self) -> Result<T>;
}

impl<T> TokenResultExt<T> for jsontok::Result<T> {
    fn decoding(self) -> Result<T> {
        self.map_err(|e| Error::Decode(DecodeError::Token(e)))
    }

    fn encoding(self) -> Result<T> {
        self.map_err(|e| Error::Encode(EncodeError::Token(e)))
    }
}
