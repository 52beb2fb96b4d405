//! Converters: per-type and per-property replacements for the default
//! encoding, and the factories that produce them.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use jsontok::{JsonWriter, TokenReader};

use crate::config::ConversionConfig;
use crate::error::{EncodeError, Error, Result, TokenResultExt};
use crate::types::{invalid_value, unlisted_variant, AnyValue, TypeTag};

/// The converters visible while reading or writing one value: the
/// property-level override, if any, ahead of the global ones.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    config: &'a ConversionConfig,
    local: Option<&'a dyn ErasedConverter>,
}

impl<'a> std::fmt::Debug for Scope<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scope {{ local: {:?} }}",
            self.local.map(|converter| converter.target().name())
        )
    }
}

impl<'a> Scope<'a> {
    #[must_use]
    pub fn new(config: &'a ConversionConfig) -> Self {
        Scope {
            config,
            local: None,
        }
    }

    pub(crate) fn with_local(
        config: &'a ConversionConfig,
        local: Option<&'a dyn ErasedConverter>,
    ) -> Self {
        Scope { config, local }
    }

    #[must_use]
    pub fn config(&self) -> &'a ConversionConfig {
        self.config
    }

    #[must_use]
    pub fn converter_for(&self, target: TypeTag) -> Option<&'a dyn ErasedConverter> {
        if let Some(local) = self.local {
            if local.target() == target {
                return Some(local);
            }
        }
        self.config.converter_for(target)
    }
}

/// Custom reading and writing of one value type.
///
/// A converter that wants the default encoding for its own type must call
/// [`JsonType::read_json`](crate::JsonType::read_json) directly: going
/// through [`read_value`](crate::read_value) would find the converter again.
pub trait JsonConverter: Send + Sync + 'static {
    type Value: Send + 'static;

    /// # Errors
    ///
    /// The input does not hold a valid value.
    fn read(&self, reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<Self::Value>;

    /// # Errors
    ///
    /// The writer failed.
    fn write(&self, value: &Self::Value, writer: &mut JsonWriter<'_>, scope: Scope<'_>)
        -> Result<()>;

    /// Whether `read` accepts a JSON `null` for a non-nullable property.
    fn handles_null(&self) -> bool {
        false
    }
}

/// Object-safe view of a [`JsonConverter`].
pub trait ErasedConverter: Send + Sync {
    fn target(&self) -> TypeTag;

    fn handles_null(&self) -> bool;

    /// # Errors
    ///
    /// See [`JsonConverter::read`].
    fn read_any(&self, reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<AnyValue>;

    /// # Errors
    ///
    /// See [`JsonConverter::write`]; also fails if `value` is not of the
    /// converter's type.
    fn write_any(&self, value: &dyn Any, writer: &mut JsonWriter<'_>, scope: Scope<'_>)
        -> Result<()>;
}

impl<C: JsonConverter> ErasedConverter for C {
    fn target(&self) -> TypeTag {
        TypeTag::of::<C::Value>()
    }

    fn handles_null(&self) -> bool {
        JsonConverter::handles_null(self)
    }

    fn read_any(&self, reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<AnyValue> {
        let value = self.read(reader, scope)?;
        Ok(Box::new(value))
    }

    fn write_any(
        &self,
        value: &dyn Any,
        writer: &mut JsonWriter<'_>,
        scope: Scope<'_>,
    ) -> Result<()> {
        match value.downcast_ref::<C::Value>() {
            Some(value) => self.write(value, writer, scope),
            None => Err(Error::Encode(EncodeError::ConverterType {
                expected: type_name::<C::Value>(),
            })),
        }
    }
}

/// Produces converters for the types it knows.
pub trait ConverterFactory: Send + Sync + 'static {
    fn create(&self, target: TypeTag) -> Option<Arc<dyn ErasedConverter>>;

    /// Pick a converter for a property whose type unwraps into `layers`,
    /// outermost first. The default tries the innermost type only.
    fn resolve(&self, layers: &[TypeTag]) -> Option<Arc<dyn ErasedConverter>> {
        layers.last().and_then(|innermost| self.create(*innermost))
    }
}

/// An enumeration with a fixed list of variants and their wire names.
///
/// By default the variant is written as its position in `VARIANTS`;
/// [`StringEnumConverter`] writes the name instead.
pub trait JsonEnum: Copy + PartialEq + Send + Sync + 'static {
    const VARIANTS: &'static [(Self, &'static str)];

    fn ordinal(self) -> Option<usize> {
        Self::VARIANTS.iter().position(|(variant, _)| *variant == self)
    }

    fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::VARIANTS.get(ordinal).map(|(variant, _)| *variant)
    }

    fn wire_name(self) -> Option<&'static str> {
        Self::VARIANTS
            .iter()
            .find(|(variant, _)| *variant == self)
            .map(|(_, name)| *name)
    }

    fn from_wire_name(name: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(_, wire)| *wire == name)
            .map(|(variant, _)| *variant)
    }
}

/// Default encoding of a [`JsonEnum`]: the variant's ordinal.
///
/// # Errors
///
/// The input is not an integer, or there is no variant at that position.
pub fn read_ordinal<E: JsonEnum>(reader: &mut TokenReader<'_>) -> Result<E> {
    let index = reader.current_index();
    let raw = reader.next_i64().decoding()?;
    usize::try_from(raw)
        .ok()
        .and_then(E::from_ordinal)
        .ok_or_else(|| invalid_value(type_name::<E>(), format!("no variant at {raw}"), index))
}

/// # Errors
///
/// The writer failed, or the variant is missing from `VARIANTS`.
pub fn write_ordinal<E: JsonEnum>(value: E, writer: &mut JsonWriter<'_>) -> Result<()> {
    let ordinal = value
        .ordinal()
        .ok_or_else(|| unlisted_variant(type_name::<E>()))?;
    writer.uint(ordinal as u64).encoding()
}

/// Writes a [`JsonEnum`] as its wire name.
pub struct StringEnumConverter<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> StringEnumConverter<E> {
    #[must_use]
    pub fn new() -> Self {
        StringEnumConverter {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for StringEnumConverter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: JsonEnum> JsonConverter for StringEnumConverter<E> {
    type Value = E;

    fn read(&self, reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> Result<E> {
        let index = reader.current_index();
        let name = reader.next_str().decoding()?;
        E::from_wire_name(name).ok_or_else(|| {
            invalid_value(type_name::<E>(), format!("unknown variant {name:?}"), index)
        })
    }

    fn write(&self, value: &E, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> Result<()> {
        let name = value
            .wire_name()
            .ok_or_else(|| unlisted_variant(type_name::<E>()))?;
        writer.string(name).encoding()
    }
}

/// Factory of [`StringEnumConverter`]s for the enumerations registered
/// with [`StringEnumConverterFactory::with`].
///
/// A property of type `Optional<Option<Color>>` resolves to the `Color`
/// converter: the wrapping layers are peeled until a registered type shows up.
#[derive(Default, Clone)]
pub struct StringEnumConverterFactory {
    converters: HashMap<TypeId, Arc<dyn ErasedConverter>>,
}

impl StringEnumConverterFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<E: JsonEnum>(mut self) -> Self {
        self.converters
            .insert(TypeId::of::<E>(), Arc::new(StringEnumConverter::<E>::new()));
        self
    }
}

impl ConverterFactory for StringEnumConverterFactory {
    fn create(&self, target: TypeTag) -> Option<Arc<dyn ErasedConverter>> {
        self.converters.get(&target.id()).cloned()
    }

    fn resolve(&self, layers: &[TypeTag]) -> Option<Arc<dyn ErasedConverter>> {
        layers.iter().find_map(|layer| self.create(*layer))
    }
}
