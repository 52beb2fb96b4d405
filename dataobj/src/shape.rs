//! Finalized shapes: the immutable per-type property tables the reader and
//! writer run on.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ConverterOverride, Inclusion, NamingPolicy, PropertyOverride, ShapeOverrides};
use crate::converter::ErasedConverter;
use crate::declare::{
    Accessor, Build, DeclaredProperty, DefaultValue, Implements, InterfaceDeclaration, Param,
    ShapeDeclaration, ValueCodec,
};
use crate::error::ConfigError;
use crate::types::{AnyValue, TypeTag};

pub(crate) struct PropertyDescriptor<T: ?Sized> {
    /// Declared name, as used by the configuration.
    pub(crate) name: String,
    pub(crate) value_type: TypeTag,
    /// Primary name first, then the fallbacks.
    pub(crate) read_names: Vec<String>,
    pub(crate) write_name: String,
    pub(crate) writable: bool,
    pub(crate) inclusion: Inclusion,
    pub(crate) nullable: bool,
    pub(crate) converter: Option<Arc<dyn ErasedConverter>>,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) accessor: Arc<dyn Accessor<T>>,
    pub(crate) codec: Arc<dyn ValueCodec>,
}

impl<T: ?Sized> PropertyDescriptor<T> {
    pub(crate) fn is_written(&self) -> bool {
        match self.inclusion {
            Inclusion::Default => self.writable,
            Inclusion::Include => true,
            Inclusion::Exclude => false,
        }
    }

    /// Whether a JSON `null` may be handed to the decoder.
    pub(crate) fn accepts_null(&self) -> bool {
        self.nullable
            || self
                .converter
                .as_ref()
                .is_some_and(|converter| converter.handles_null())
    }

    pub(crate) fn default_value(&self) -> Option<AnyValue> {
        self.default.as_ref().and_then(|default| default())
    }

    pub(crate) fn primary_name(&self) -> &str {
        self.read_names.first().unwrap_or(&self.name)
    }
}

pub(crate) enum InitStrategy<T> {
    /// The first `arity` descriptors are the constructor parameters, in order.
    Constructor { build: Build<T>, arity: usize },
    FieldAssignment(Box<dyn Fn() -> T + Send + Sync>),
}

impl<T> InitStrategy<T> {
    fn describe(&self) -> &'static str {
        match self {
            InitStrategy::Constructor { .. } => "constructor",
            InitStrategy::FieldAssignment(_) => "field assignment",
        }
    }
}

pub(crate) struct ObjectShape<T> {
    pub(crate) type_name: &'static str,
    pub(crate) properties: Vec<PropertyDescriptor<T>>,
    pub(crate) strategy: InitStrategy<T>,
    pub(crate) tolerate_unknown: bool,
    read_index: HashMap<String, usize>,
}

type Paired<T> = (DeclaredProperty<T>, Option<DefaultValue>);

impl<T: 'static> ObjectShape<T> {
    pub(crate) fn discover(
        declaration: ShapeDeclaration<T>,
        overrides: Option<&ShapeOverrides>,
        naming: NamingPolicy,
    ) -> Result<Self, ConfigError> {
        let type_name = type_name::<T>();
        let ShapeDeclaration {
            properties,
            constructors,
            instantiate,
            error,
        } = declaration;
        if let Some(error) = error {
            return Err(error);
        }

        let mut writable_types: Vec<TypeId> = properties
            .iter()
            .filter(|p| p.writable)
            .map(|p| p.codec.value_type().id())
            .collect();
        writable_types.sort_unstable();

        let mut qualifying = constructors.into_iter().filter(|ctor| {
            let mut param_types: Vec<TypeId> =
                ctor.params.iter().map(|p| p.value_type.id()).collect();
            param_types.sort_unstable();
            param_types == writable_types
        });
        let selected = match (qualifying.next(), qualifying.next()) {
            (Some(ctor), None) => Some(ctor),
            _ => None,
        };

        let (ordered, strategy) = match selected {
            Some(ctor) => {
                let ordered = pair_parameters(type_name, properties, &ctor.params)?;
                let strategy = InitStrategy::Constructor {
                    build: ctor.build,
                    arity: ctor.params.len(),
                };
                (ordered, strategy)
            }
            None => {
                let Some(instantiate) = instantiate else {
                    return Err(ConfigError::MissingInitializer { type_name });
                };
                if let Some(p) = properties
                    .iter()
                    .find(|p| p.writable && !p.accessor.has_setter())
                {
                    return Err(ConfigError::MissingSetter {
                        type_name,
                        property: p.name.clone(),
                    });
                }
                let ordered = properties.into_iter().map(|p| (p, None)).collect();
                (ordered, InitStrategy::FieldAssignment(instantiate))
            }
        };

        let no_override = PropertyOverride::default();
        let mut descriptors = Vec::with_capacity(ordered.len());
        for (property, param_default) in ordered {
            let config = overrides
                .and_then(|o| o.properties.get(&property.name))
                .unwrap_or(&no_override);
            let json_name = naming.apply(&property.name);
            let converter = resolve_converter(type_name, &property, config.converter.as_ref())?;
            descriptors.push(PropertyDescriptor {
                value_type: property.codec.value_type(),
                read_names: config
                    .read_names
                    .clone()
                    .unwrap_or_else(|| vec![json_name.clone()]),
                write_name: config.write_name.clone().unwrap_or(json_name),
                writable: property.writable,
                inclusion: config.inclusion,
                nullable: property.codec.nullable(),
                converter,
                default: param_default
                    .or_else(|| property.default.clone())
                    .or_else(|| property.codec.empty()),
                accessor: property.accessor,
                codec: property.codec,
                name: property.name,
            });
        }

        let mut read_index = HashMap::new();
        for (position, descriptor) in descriptors.iter().enumerate() {
            for name in &descriptor.read_names {
                read_index.entry(name.clone()).or_insert(position);
            }
        }

        let shape = ObjectShape {
            type_name,
            properties: descriptors,
            strategy,
            tolerate_unknown: overrides.and_then(|o| o.tolerate_unknown).unwrap_or(true),
            read_index,
        };
        debug!(
            type_name,
            strategy = shape.strategy.describe(),
            properties = shape.properties.len(),
            tolerate_unknown = shape.tolerate_unknown,
            "shape finalized"
        );
        Ok(shape)
    }

    /// Position of the descriptor reading `name`, or the name back if none does.
    pub(crate) fn lookup(&self, name: &str) -> Result<usize, String> {
        self.read_index
            .get(name)
            .copied()
            .ok_or_else(|| name.to_owned())
    }

    pub(crate) fn written(&self) -> impl Iterator<Item = &PropertyDescriptor<T>> {
        self.properties.iter().filter(|p| p.is_written())
    }
}

/// Order the properties as the constructor parameters, leftovers last.
fn pair_parameters<T>(
    type_name: &'static str,
    properties: Vec<DeclaredProperty<T>>,
    params: &[Param],
) -> Result<Vec<Paired<T>>, ConfigError> {
    let mut slots: Vec<Option<DeclaredProperty<T>>> = properties.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());
    for param in params {
        let candidates: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| {
                slot.as_ref()
                    .filter(|p| {
                        p.writable
                            && p.codec.value_type() == param.value_type
                            && p.name.eq_ignore_ascii_case(&param.name)
                    })
                    .map(|_| position)
            })
            .collect();
        let property = match candidates.as_slice() {
            [only] => slots[*only].take(),
            [] => None,
            _ => {
                return Err(ConfigError::AmbiguousParameter {
                    type_name,
                    parameter: param.name.clone(),
                })
            }
        };
        let Some(property) = property else {
            return Err(ConfigError::UnpairedParameter {
                type_name,
                parameter: param.name.clone(),
            });
        };
        ordered.push((property, param.default.clone()));
    }
    ordered.extend(slots.into_iter().flatten().map(|p| (p, None)));
    Ok(ordered)
}

fn resolve_converter<T: ?Sized>(
    type_name: &'static str,
    property: &DeclaredProperty<T>,
    converter: Option<&ConverterOverride>,
) -> Result<Option<Arc<dyn ErasedConverter>>, ConfigError> {
    let layers = property.codec.layers();
    let property_type = property.codec.value_type().name();
    let resolved = match converter {
        None => return Ok(None),
        Some(ConverterOverride::Converter(converter)) => Arc::clone(converter),
        Some(ConverterOverride::Factory(factory)) => {
            factory
                .resolve(&layers)
                .ok_or_else(|| ConfigError::UnresolvableFactory {
                    type_name,
                    property: property.name.clone(),
                    property_type,
                })?
        }
    };
    if !layers.contains(&resolved.target()) {
        return Err(ConfigError::ConverterMismatch {
            type_name,
            property: property.name.clone(),
            converter_type: resolved.target().name(),
            property_type,
        });
    }
    Ok(Some(resolved))
}

pub(crate) struct InterfaceProperty<I: ?Sized> {
    pub(crate) write_name: String,
    pub(crate) converter: Option<Arc<dyn ErasedConverter>>,
    pub(crate) accessor: Arc<dyn Accessor<I>>,
}

/// The written properties of `T`, read through the accessors of `I`.
pub(crate) struct InterfaceShape<I: ?Sized, T> {
    pub(crate) properties: Vec<InterfaceProperty<I>>,
    _implementation: PhantomData<fn() -> T>,
}

impl<I: ?Sized + 'static, T: Implements<I>> InterfaceShape<I, T> {
    pub(crate) fn discover(implementation: &ObjectShape<T>) -> Result<Self, ConfigError> {
        let interface = type_name::<I>();
        let mut accessors: HashMap<String, Arc<dyn Accessor<I>>> = HashMap::new();
        for (name, accessor) in InterfaceDeclaration::<I>::of::<T>().accessors {
            let Some(descriptor) = implementation.properties.iter().find(|p| p.name == name) else {
                return Err(ConfigError::UnknownProperty {
                    type_name: interface,
                    property: name,
                });
            };
            if accessor.value_type() != descriptor.value_type {
                return Err(ConfigError::AccessorType {
                    interface,
                    property: name,
                    accessor_type: accessor.value_type().name(),
                    property_type: descriptor.value_type.name(),
                });
            }
            if accessors.insert(name.clone(), accessor).is_some() {
                return Err(ConfigError::DuplicateProperty {
                    type_name: interface,
                    property: name,
                });
            }
        }

        let mut properties = Vec::with_capacity(accessors.len());
        for descriptor in implementation.written() {
            match accessors.remove(&descriptor.name) {
                Some(accessor) => properties.push(InterfaceProperty {
                    write_name: descriptor.write_name.clone(),
                    converter: descriptor.converter.clone(),
                    accessor,
                }),
                None => debug!(
                    interface,
                    implementation = implementation.type_name,
                    property = %descriptor.name,
                    "property not exposed by the interface, left out"
                ),
            }
        }
        Ok(InterfaceShape {
            properties,
            _implementation: PhantomData,
        })
    }
}
