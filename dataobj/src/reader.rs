//! Decoding a JSON object into a data object.

use jsontok::{Peek, TokenReader};
use tracing::trace;

use crate::config::ConversionConfig;
use crate::converter::Scope;
use crate::declare::{CtorArgs, DataObject, Implements};
use crate::error::{DecodeError, Error, Result, TokenResultExt};
use crate::shape::InitStrategy;
use crate::types::AnyValue;

/// Read one JSON object as a `T`.
///
/// Keys are matched against each property's read names; when a key shows up
/// twice, the later value wins. Properties missing from the input take
/// their default, if they have one.
///
/// # Errors
///
/// - [`Error::Config`] if the shape of `T` cannot be finalized
/// - [`DecodeError::UnexpectedProperty`] for an unknown key when the shape
///   does not tolerate them
/// - [`DecodeError::UnexpectedNull`] for a `null` on a property that does
///   not accept it
/// - [`DecodeError::MissingProperty`] for a writable property with neither
///   a value nor a default
/// - any error from the tokenizer or the property decoders
pub fn read_object<T: DataObject>(
    reader: &mut TokenReader<'_>,
    config: &ConversionConfig,
) -> Result<T> {
    let shape = config.object_shape::<T>()?;
    let mut slots: Vec<Option<AnyValue>> = shape.properties.iter().map(|_| None).collect();

    let mut key = reader.next_object().decoding()?.map(|name| shape.lookup(name));
    while let Some(found) = key {
        let index = reader.current_index();
        match found {
            Err(name) => {
                if !shape.tolerate_unknown {
                    return Err(Error::Decode(DecodeError::UnexpectedProperty {
                        type_name: shape.type_name,
                        name,
                        index,
                    }));
                }
                trace!(type_name = shape.type_name, property = %name, "skipping unknown property");
                reader.next_skip().decoding()?;
            }
            Ok(position) => {
                let property = &shape.properties[position];
                if property.writable {
                    if reader.peek().decoding()? == Peek::Null && !property.accepts_null() {
                        return Err(Error::Decode(DecodeError::UnexpectedNull {
                            type_name: shape.type_name,
                            property: property.name.clone(),
                            index,
                        }));
                    }
                    let scope = Scope::with_local(config, property.converter.as_deref());
                    slots[position] = Some(property.codec.decode(reader, scope)?);
                } else {
                    trace!(
                        type_name = shape.type_name,
                        property = %property.name,
                        "ignoring read-only property"
                    );
                    reader.next_skip().decoding()?;
                }
            }
        }
        key = reader.next_key().decoding()?.map(|name| shape.lookup(name));
    }
    let end = reader.current_index();

    let mut values = Vec::with_capacity(shape.properties.len());
    for (property, slot) in shape.properties.iter().zip(slots) {
        if !property.writable {
            continue;
        }
        let Some(value) = slot.or_else(|| property.default_value()) else {
            return Err(Error::Decode(DecodeError::MissingProperty {
                type_name: shape.type_name,
                name: property.primary_name().to_owned(),
                index: end,
            }));
        };
        values.push((property, value));
    }

    match &shape.strategy {
        InitStrategy::Constructor { build, arity } => {
            let args = values
                .into_iter()
                .take(*arity)
                .map(|(property, value)| (property.value_type, value))
                .collect();
            build(&mut CtorArgs::new(shape.type_name, args))
        }
        InitStrategy::FieldAssignment(instantiate) => {
            let mut instance = instantiate();
            for (property, value) in values {
                property
                    .accessor
                    .assign(&mut instance, &property.name, value)?;
            }
            Ok(instance)
        }
    }
}

/// Read one JSON object as the implementation `T` and return it as `I`.
///
/// # Errors
///
/// See [`read_object`].
pub fn read_interface<I, T>(reader: &mut TokenReader<'_>, config: &ConversionConfig) -> Result<Box<I>>
where
    I: ?Sized + 'static,
    T: Implements<I>,
{
    read_object::<T>(reader, config).map(T::upcast)
}
