//! `jsontok`: the JSON primitive underneath the data-object mapping layer.
//!
//! [`TokenReader`] is a pull parser over a complete input buffer, built on
//! [`jiter::Jiter`]. The caller drives it token by token: peek at the kind
//! of the next value, then consume it with the matching `next_*` call, or
//! drop a whole subtree with [`TokenReader::next_skip`].
//!
//! [`JsonWriter`] is the push counterpart. It tracks the comma state of the
//! containers it has opened, so the caller only says what to write.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{Error, ErrorType, Result};
pub use reader::{TokenKind, TokenReader};
pub use writer::JsonWriter;

pub use jiter;
pub use jiter::Peek;
