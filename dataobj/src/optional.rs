//! The tri-state `Optional<T>` container.

use jsontok::{JsonWriter, TokenReader};

use crate::converter::Scope;
use crate::error::{Result, TokenResultExt};
use crate::types::{read_value, write_value, JsonType, TypeTag};

/// A value that may be missing from the payload altogether.
///
/// `Absent` means the property was not in the JSON object (and will not be
/// written back). Over a nullable inner type, `Present(None)` is a property
/// that was there with an explicit `null`.
///
/// ```
/// use dataobj::Optional;
///
/// let absent: Optional<Option<i32>> = Optional::default();
/// let null = Optional::Present(None);
/// let value = Optional::Present(Some(5));
///
/// assert!(!absent.has_value());
/// assert!(null.has_value() && null.value() == Some(&None));
/// assert_ne!(absent, null);
/// assert_ne!(null, value);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Optional<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Optional<T> {
    #[must_use]
    pub fn has_value(&self) -> bool {
        matches!(self, Optional::Present(_))
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Optional::Absent)
    }

    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Optional::Present(value) => Some(value),
            Optional::Absent => None,
        }
    }

    #[must_use]
    pub fn as_ref(&self) -> Optional<&T> {
        match self {
            Optional::Present(value) => Optional::Present(value),
            Optional::Absent => Optional::Absent,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Optional<U> {
        match self {
            Optional::Present(value) => Optional::Present(f(value)),
            Optional::Absent => Optional::Absent,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Optional::Present(value) => Some(value),
            Optional::Absent => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.into_option().unwrap_or(default)
    }
}

impl<T> Optional<Option<T>> {
    /// Present with an explicit `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Optional::Present(None))
    }
}

impl<T> From<T> for Optional<T> {
    fn from(value: T) -> Self {
        Optional::Present(value)
    }
}

impl<T: JsonType> JsonType for Optional<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn read_json(reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<Self> {
        read_value::<T>(reader, scope).map(Optional::Present)
    }

    /// `Absent` only reaches this point outside of an object property,
    /// for example as an array item, where there is no key to drop.
    fn write_json(&self, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()> {
        match self {
            Optional::Present(value) => write_value(value, writer, scope),
            Optional::Absent => writer.null().encoding(),
        }
    }

    fn empty() -> Option<Self> {
        Some(Optional::Absent)
    }

    fn is_absent(&self) -> bool {
        Optional::is_absent(self)
    }

    fn layers(layers: &mut Vec<TypeTag>) {
        layers.push(TypeTag::of::<Self>());
        T::layers(layers);
    }
}
