use crate::reader::TokenReader;
use jiter::{JiterError, JiterErrorType, JsonErrorType, JsonType, LinePosition};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ErrorType {
    #[error("{0:?}")]
    JsonError(JsonErrorType),
    #[error("expected {expected:?}, found {actual:?}")]
    WrongType { expected: JsonType, actual: JsonType },
    #[error("number does not fit into {target}")]
    NumberOutOfRange { target: &'static str },
    #[error("non-finite number {0} cannot be written as JSON")]
    NonFiniteNumber(f64),
    #[error("I/O error: {0}")]
    IoError(std::io::Error),
}

/// An error with the byte index where it happened.
///
/// For reader errors the index points into the input buffer, for writer
/// errors it is the number of bytes written so far.
#[derive(Debug, thiserror::Error)]
#[error("{error_type} at index {index}")]
pub struct Error {
    pub error_type: ErrorType,
    pub index: usize,
}

impl Error {
    pub(crate) fn from_jiter_error(jiter_error: JiterError) -> Error {
        Error {
            error_type: match jiter_error.error_type {
                JiterErrorType::JsonError(json_error_type) => ErrorType::JsonError(json_error_type),
                JiterErrorType::WrongType { expected, actual } => {
                    ErrorType::WrongType { expected, actual }
                }
            },
            index: jiter_error.index,
        }
    }

    pub(crate) fn wrong_type(index: usize, expected: JsonType, actual: JsonType) -> Error {
        Error {
            error_type: ErrorType::WrongType { expected, actual },
            index,
        }
    }

    pub(crate) fn out_of_range(index: usize, target: &'static str) -> Error {
        Error {
            error_type: ErrorType::NumberOutOfRange { target },
            index,
        }
    }

    pub(crate) fn from_io_error(index: usize, io_error: std::io::Error) -> Error {
        Error {
            error_type: ErrorType::IoError(io_error),
            index,
        }
    }

    #[must_use]
    pub fn get_position(&self, reader: &TokenReader) -> LinePosition {
        reader.error_position(self.index)
    }

    #[must_use]
    pub fn description(&self, reader: &TokenReader) -> String {
        let position = self.get_position(reader);
        format!("{} at {}", self.error_type, position)
    }
}
