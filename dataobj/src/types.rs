//! Type-based default encoding, used whenever no converter applies.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use jsontok::{JsonWriter, Peek, TokenReader};

use crate::converter::Scope;
use crate::error::{DecodeError, EncodeError, Error, Result, TokenResultExt};

pub(crate) type AnyValue = Box<dyn Any + Send>;

/// Identity of a property or converter value type.
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeTag {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// A type with a default JSON representation.
///
/// Data objects, enumerations and interface boxes get their implementation
/// from [`impl_json_type!`](crate::impl_json_type).
pub trait JsonType: Sized + Send + 'static {
    /// Whether `null` is a valid JSON value for this type.
    const NULLABLE: bool = false;

    /// # Errors
    ///
    /// The input does not hold a value of this type.
    fn read_json(reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<Self>;

    /// # Errors
    ///
    /// The writer failed, or the value has no JSON representation.
    fn write_json(&self, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()>;

    /// Value to use when the property is missing from the input.
    fn empty() -> Option<Self> {
        None
    }

    /// Whether the property should be left out of the output.
    fn is_absent(&self) -> bool {
        false
    }

    /// This type followed by the types it wraps, outermost first.
    ///
    /// Only the `Optional` and `Option` layers are unwrapped.
    fn layers(layers: &mut Vec<TypeTag>) {
        layers.push(TypeTag::of::<Self>());
    }
}

/// Read a `V`, giving a converter registered for `V` in `scope` precedence
/// over the default encoding.
///
/// # Errors
///
/// Malformed input, or a converter that returned a value of another type.
pub fn read_value<V: JsonType>(reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<V> {
    let Some(converter) = scope.converter_for(TypeTag::of::<V>()) else {
        return V::read_json(reader, scope);
    };
    let index = reader.current_index();
    converter
        .read_any(reader, scope)?
        .downcast::<V>()
        .map(|value| *value)
        .map_err(|_| {
            Error::Decode(DecodeError::ConverterType {
                expected: type_name::<V>(),
                index,
            })
        })
}

/// Write a `V`, giving a converter registered for `V` in `scope` precedence
/// over the default encoding.
///
/// # Errors
///
/// The writer failed, or the value has no JSON representation.
pub fn write_value<V: JsonType>(
    value: &V,
    writer: &mut JsonWriter<'_>,
    scope: Scope<'_>,
) -> Result<()> {
    match scope.converter_for(TypeTag::of::<V>()) {
        Some(converter) => converter.write_any(value, writer, scope),
        None => value.write_json(writer, scope),
    }
}

pub(crate) fn invalid_value(target: &'static str, message: String, index: usize) -> Error {
    Error::Decode(DecodeError::InvalidValue {
        target,
        message,
        index,
    })
}

macro_rules! signed_json_type {
    ($($ty:ty),*) => {$(
        impl JsonType for $ty {
            fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
                let index = reader.current_index();
                let value = reader.next_i64().decoding()?;
                <$ty>::try_from(value).map_err(|_| {
                    invalid_value(stringify!($ty), format!("{value} is out of range"), index)
                })
            }

            fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
                writer.int(i64::from(*self)).encoding()
            }
        }
    )*};
}

macro_rules! unsigned_json_type {
    ($($ty:ty),*) => {$(
        impl JsonType for $ty {
            fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
                let index = reader.current_index();
                let value = reader.next_u64().decoding()?;
                <$ty>::try_from(value).map_err(|_| {
                    invalid_value(stringify!($ty), format!("{value} is out of range"), index)
                })
            }

            fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
                writer.uint(u64::from(*self)).encoding()
            }
        }
    )*};
}

signed_json_type!(i8, i16, i32, i64);
unsigned_json_type!(u8, u16, u32, u64);

impl JsonType for usize {
    fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
        let index = reader.current_index();
        let value = reader.next_u64().decoding()?;
        usize::try_from(value)
            .map_err(|_| invalid_value("usize", format!("{value} is out of range"), index))
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
        writer.uint(*self as u64).encoding()
    }
}

impl JsonType for bool {
    fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
        reader.next_bool().decoding()
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
        writer.bool(*self).encoding()
    }
}

impl JsonType for f64 {
    fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
        reader.next_f64().decoding()
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
        writer.float(*self).encoding()
    }
}

impl JsonType for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
        let index = reader.current_index();
        let value = reader.next_f64().decoding()?;
        let narrowed = value as f32;
        if value.is_finite() && !narrowed.is_finite() {
            return Err(invalid_value("f32", format!("{value} is out of range"), index));
        }
        Ok(narrowed)
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
        writer.float32(*self).encoding()
    }
}

impl JsonType for String {
    fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
        reader.next_str().decoding().map(str::to_owned)
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
        writer.string(self).encoding()
    }
}

impl JsonType for char {
    fn read_json(reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<Self> {
        let index = reader.current_index();
        let text = reader.next_str().decoding()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(invalid_value(
                "char",
                format!("expected a single character, got {text:?}"),
                index,
            )),
        }
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
        let mut buf = [0u8; 4];
        writer.string(self.encode_utf8(&mut buf)).encoding()
    }
}

impl<T: JsonType> JsonType for Option<T> {
    const NULLABLE: bool = true;

    fn read_json(reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<Self> {
        if reader.peek().decoding()? == Peek::Null {
            reader.next_null().decoding()?;
            return Ok(None);
        }
        read_value::<T>(reader, scope).map(Some)
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()> {
        match self {
            Some(value) => write_value(value, writer, scope),
            None => writer.null().encoding(),
        }
    }

    fn layers(layers: &mut Vec<TypeTag>) {
        layers.push(TypeTag::of::<Self>());
        T::layers(layers);
    }
}

impl<T: JsonType> JsonType for Vec<T> {
    fn read_json(reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<Self> {
        let mut items = Vec::new();
        let mut next = reader.next_array().decoding()?;
        while next.is_some() {
            items.push(read_value::<T>(reader, scope)?);
            next = reader.array_step().decoding()?;
        }
        Ok(items)
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()> {
        writer.begin_array().encoding()?;
        for item in self {
            write_value(item, writer, scope)?;
        }
        writer.end_array().encoding()
    }
}

fn read_entries<T: JsonType>(
    reader: &mut TokenReader<'_>,
    scope: Scope<'_>,
    mut insert: impl FnMut(String, T),
) -> Result<()> {
    let mut key = reader.next_object().decoding()?.map(str::to_owned);
    while let Some(name) = key {
        let value = read_value::<T>(reader, scope)?;
        insert(name, value);
        key = reader.next_key().decoding()?.map(str::to_owned);
    }
    Ok(())
}

fn write_entries<'v, T: JsonType>(
    entries: impl Iterator<Item = (&'v String, &'v T)>,
    writer: &mut JsonWriter<'_>,
    scope: Scope<'_>,
) -> Result<()> {
    writer.begin_object().encoding()?;
    for (name, value) in entries {
        writer.name(name).encoding()?;
        write_value(value, writer, scope)?;
    }
    writer.end_object().encoding()
}

impl<T: JsonType> JsonType for BTreeMap<String, T> {
    fn read_json(reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<Self> {
        let mut map = BTreeMap::new();
        read_entries(reader, scope, |name, value: T| {
            map.insert(name, value);
        })?;
        Ok(map)
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()> {
        write_entries(self.iter(), writer, scope)
    }
}

impl<T: JsonType> JsonType for HashMap<String, T> {
    fn read_json(reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<Self> {
        let mut map = HashMap::new();
        read_entries(reader, scope, |name, value: T| {
            map.insert(name, value);
        })?;
        Ok(map)
    }

    fn write_json(&self, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()> {
        write_entries(self.iter(), writer, scope)
    }
}

pub(crate) fn unlisted_variant(type_name: &'static str) -> Error {
    Error::Encode(EncodeError::UnlistedVariant { type_name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optional::Optional;

    fn layer_names<T: JsonType>() -> Vec<TypeTag> {
        let mut layers = Vec::new();
        T::layers(&mut layers);
        layers
    }

    #[test]
    fn layers_unwrap_optional_and_option() {
        let layers = layer_names::<Optional<Option<u8>>>();
        assert_eq!(
            layers,
            vec![
                TypeTag::of::<Optional<Option<u8>>>(),
                TypeTag::of::<Option<u8>>(),
                TypeTag::of::<u8>(),
            ]
        );
    }

    #[test]
    fn layers_stop_at_collections() {
        assert_eq!(layer_names::<Vec<Option<u8>>>(), vec![TypeTag::of::<Vec<Option<u8>>>()]);
    }

    #[test]
    fn nullable_follows_inner_type() {
        assert!(!<Optional<i32> as JsonType>::NULLABLE);
        assert!(<Optional<Option<i32>> as JsonType>::NULLABLE);
        assert!(<Option<String> as JsonType>::NULLABLE);
    }

    #[test]
    fn type_tag_equality_ignores_name() {
        assert_eq!(TypeTag::of::<String>(), TypeTag::of::<String>());
        assert_ne!(TypeTag::of::<String>(), TypeTag::of::<&'static str>());
    }
}
