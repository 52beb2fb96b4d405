//! Encoding a data object as a JSON object.

use jsontok::JsonWriter;

use crate::config::ConversionConfig;
use crate::converter::Scope;
use crate::declare::{DataObject, Implements};
use crate::error::{Result, TokenResultExt};

/// Write `value` as a JSON object.
///
/// Keys come out in shape order: constructor parameters first, then the
/// remaining properties as declared. An absent [`Optional`](crate::Optional)
/// leaves its key out.
///
/// # Errors
///
/// The shape of `T` cannot be finalized, or a property failed to encode.
pub fn write_object<T: DataObject>(
    value: &T,
    writer: &mut JsonWriter<'_>,
    config: &ConversionConfig,
) -> Result<()> {
    let shape = config.object_shape::<T>()?;
    writer.begin_object().encoding()?;
    for property in shape.written() {
        if property.accessor.is_absent(value) {
            continue;
        }
        writer.name(&property.write_name).encoding()?;
        let scope = Scope::with_local(config, property.converter.as_deref());
        property.accessor.encode(value, writer, scope)?;
    }
    writer.end_object().encoding()
}

/// Write `value` through the accessors of its interface `I`, with the
/// names and converters configured for the implementation `T`.
///
/// # Errors
///
/// See [`write_object`].
pub fn write_interface<I, T>(
    value: &I,
    writer: &mut JsonWriter<'_>,
    config: &ConversionConfig,
) -> Result<()>
where
    I: ?Sized + 'static,
    T: Implements<I>,
{
    let shape = config.interface_shape::<I, T>()?;
    writer.begin_object().encoding()?;
    for property in &shape.properties {
        if property.accessor.is_absent(value) {
            continue;
        }
        writer.name(&property.write_name).encoding()?;
        let scope = Scope::with_local(config, property.converter.as_deref());
        property.accessor.encode(value, writer, scope)?;
    }
    writer.end_object().encoding()
}
