//! Conversion configuration: global converters, naming policy, per-shape
//! overrides, and the cache of finalized shapes.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::converter::{ConverterFactory, ErasedConverter, JsonConverter};
use crate::declare::{DataObject, Implements, ShapeDeclaration};
use crate::error::ConfigError;
use crate::shape::{InterfaceShape, ObjectShape};
use crate::types::TypeTag;

/// How declared property names become JSON names, before any rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingPolicy {
    #[default]
    AsDeclared,
    /// `user_id` becomes `userId`.
    CamelCase,
}

impl NamingPolicy {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            NamingPolicy::AsDeclared => name.to_owned(),
            NamingPolicy::CamelCase => {
                let mut out = String::with_capacity(name.len());
                let mut upper_next = false;
                for c in name.chars() {
                    if c == '_' {
                        upper_next = !out.is_empty();
                    } else if upper_next {
                        out.extend(c.to_uppercase());
                        upper_next = false;
                    } else {
                        out.push(c);
                    }
                }
                out
            }
        }
    }
}

/// Whether a property is part of the written output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Inclusion {
    /// Written if writable.
    #[default]
    Default,
    Include,
    Exclude,
}

#[derive(Clone)]
pub(crate) enum ConverterOverride {
    Converter(Arc<dyn ErasedConverter>),
    Factory(Arc<dyn ConverterFactory>),
}

#[derive(Default, Clone)]
pub(crate) struct PropertyOverride {
    pub(crate) read_names: Option<Vec<String>>,
    pub(crate) write_name: Option<String>,
    pub(crate) inclusion: Inclusion,
    pub(crate) converter: Option<ConverterOverride>,
}

#[derive(Default, Clone)]
pub(crate) struct ShapeOverrides {
    pub(crate) properties: HashMap<String, PropertyOverride>,
    pub(crate) tolerate_unknown: Option<bool>,
}

/// Fluent per-property overrides for the shape of `T`.
///
/// Every call names a property by its declared name; an unknown name is a
/// [`ConfigError::UnknownProperty`] reported by [`ConfigBuilder::build`].
pub struct ShapeConfigurator<T> {
    known: Vec<String>,
    overrides: ShapeOverrides,
    error: Option<ConfigError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DataObject> ShapeConfigurator<T> {
    fn new(overrides: ShapeOverrides) -> Self {
        let declaration = ShapeDeclaration::<T>::of();
        ShapeConfigurator {
            known: declaration.property_names(),
            error: declaration.error,
            overrides,
            _marker: PhantomData,
        }
    }

    fn fail(&mut self, error: ConfigError) {
        self.error.get_or_insert(error);
    }

    fn property(&mut self, property: &str) -> Option<&mut PropertyOverride> {
        if self.error.is_some() {
            return None;
        }
        if !self.known.iter().any(|name| name == property) {
            self.fail(ConfigError::UnknownProperty {
                type_name: type_name::<T>(),
                property: property.to_owned(),
            });
            return None;
        }
        Some(
            self.overrides
                .properties
                .entry(property.to_owned())
                .or_default(),
        )
    }

    /// Names accepted when reading, tried in order.
    #[must_use]
    pub fn read_names<I, S>(mut self, property: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            self.fail(ConfigError::EmptyReadNames {
                type_name: type_name::<T>(),
                property: property.to_owned(),
            });
            return self;
        }
        if let Some(entry) = self.property(property) {
            entry.read_names = Some(names);
        }
        self
    }

    #[must_use]
    pub fn write_name(mut self, property: &str, name: &str) -> Self {
        if let Some(entry) = self.property(property) {
            entry.write_name = Some(name.to_owned());
        }
        self
    }

    /// Read and write the property under `name`.
    #[must_use]
    pub fn rename(mut self, property: &str, name: &str) -> Self {
        if let Some(entry) = self.property(property) {
            entry.read_names = Some(vec![name.to_owned()]);
            entry.write_name = Some(name.to_owned());
        }
        self
    }

    /// Write a read-only property.
    #[must_use]
    pub fn include(mut self, property: &str) -> Self {
        if let Some(entry) = self.property(property) {
            entry.inclusion = Inclusion::Include;
        }
        self
    }

    /// Never write a writable property.
    #[must_use]
    pub fn exclude(mut self, property: &str) -> Self {
        if let Some(entry) = self.property(property) {
            entry.inclusion = Inclusion::Exclude;
        }
        self
    }

    #[must_use]
    pub fn converter<C: JsonConverter>(self, property: &str, converter: C) -> Self {
        self.set_converter(property, ConverterOverride::Converter(Arc::new(converter)))
    }

    #[must_use]
    pub fn converter_factory<F: ConverterFactory>(self, property: &str, factory: F) -> Self {
        self.set_converter(property, ConverterOverride::Factory(Arc::new(factory)))
    }

    fn set_converter(mut self, property: &str, converter: ConverterOverride) -> Self {
        let duplicate = match self.property(property) {
            Some(entry) if entry.converter.is_some() => true,
            Some(entry) => {
                entry.converter = Some(converter);
                false
            }
            None => false,
        };
        if duplicate {
            self.fail(ConfigError::DuplicateConverter {
                type_name: type_name::<T>(),
                property: property.to_owned(),
            });
        }
        self
    }

    /// Skip unknown JSON properties (`true`, the default) or reject them.
    #[must_use]
    pub fn tolerate_unknown(mut self, tolerate: bool) -> Self {
        self.overrides.tolerate_unknown = Some(tolerate);
        self
    }
}

/// Collects the configuration; all overrides must be in place before the
/// first conversion of the type they concern.
#[derive(Default)]
pub struct ConfigBuilder {
    converters: Vec<Arc<dyn ErasedConverter>>,
    naming: NamingPolicy,
    shapes: HashMap<TypeId, ShapeOverrides>,
    error: Option<ConfigError>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a global converter. Converters registered earlier win.
    #[must_use]
    pub fn converter<C: JsonConverter>(mut self, converter: C) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    #[must_use]
    pub fn naming_policy(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Configure the shape of `T`. May be called more than once per type.
    #[must_use]
    pub fn shape<T>(
        mut self,
        configure: impl FnOnce(ShapeConfigurator<T>) -> ShapeConfigurator<T>,
    ) -> Self
    where
        T: DataObject,
    {
        let key = TypeId::of::<T>();
        let existing = self.shapes.remove(&key).unwrap_or_default();
        let configurator = configure(ShapeConfigurator::new(existing));
        if let Some(error) = configurator.error {
            self.error.get_or_insert(error);
        }
        self.shapes.insert(key, configurator.overrides);
        self
    }

    /// # Errors
    ///
    /// The first configuration error met while registering overrides.
    pub fn build(self) -> Result<ConversionConfig, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(ConversionConfig {
            converters: self.converters.into(),
            naming: self.naming,
            shapes: Arc::new(self.shapes),
            cache: Arc::default(),
        })
    }
}

type Slot<S> = OnceLock<Result<Arc<S>, ConfigError>>;

/// Finalized shapes, computed once per type and shared afterwards.
#[derive(Default)]
pub(crate) struct ShapeCache {
    slots: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ShapeCache {
    fn slot<S: Send + Sync + 'static>(&self) -> Arc<Slot<S>> {
        let key = TypeId::of::<S>();
        if let Some(slot) = self.slots.read().get(&key) {
            if let Ok(slot) = Arc::clone(slot).downcast::<Slot<S>>() {
                return slot;
            }
        }
        let mut slots = self.slots.write();
        let entry = slots.entry(key).or_insert_with(|| -> Arc<dyn Any + Send + Sync> {
            Arc::new(Slot::<S>::new())
        });
        if let Ok(slot) = Arc::clone(entry).downcast::<Slot<S>>() {
            return slot;
        }
        let slot = Arc::new(Slot::<S>::new());
        let erased: Arc<dyn Any + Send + Sync> = slot.clone();
        *entry = erased;
        slot
    }

    /// Racing callers block until the first one has built the shape.
    pub(crate) fn get_or_build<S, F>(&self, build: F) -> Result<Arc<S>, ConfigError>
    where
        S: Send + Sync + 'static,
        F: FnOnce() -> Result<S, ConfigError>,
    {
        self.slot::<S>()
            .get_or_init(|| build().map(Arc::new))
            .clone()
    }
}

/// Immutable conversion configuration, passed explicitly to every call.
///
/// Clones share the shape cache.
#[derive(Clone)]
pub struct ConversionConfig {
    converters: Arc<[Arc<dyn ErasedConverter>]>,
    naming: NamingPolicy,
    shapes: Arc<HashMap<TypeId, ShapeOverrides>>,
    cache: Arc<ShapeCache>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            converters: Arc::from(Vec::new()),
            naming: NamingPolicy::default(),
            shapes: Arc::default(),
            cache: Arc::default(),
        }
    }
}

impl std::fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let converters: Vec<&str> = self.converters.iter().map(|c| c.target().name()).collect();
        f.debug_struct("ConversionConfig")
            .field("converters", &converters)
            .field("naming", &self.naming)
            .field("configured_shapes", &self.shapes.len())
            .finish()
    }
}

impl ConversionConfig {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// A new configuration with `converter` ahead of all existing ones.
    #[must_use]
    pub fn with_converter<C: JsonConverter>(&self, converter: C) -> Self {
        let mut converters: Vec<Arc<dyn ErasedConverter>> =
            Vec::with_capacity(self.converters.len() + 1);
        converters.push(Arc::new(converter));
        converters.extend(self.converters.iter().cloned());
        ConversionConfig {
            converters: converters.into(),
            naming: self.naming,
            shapes: Arc::clone(&self.shapes),
            cache: Arc::clone(&self.cache),
        }
    }

    #[must_use]
    pub fn naming_policy(&self) -> NamingPolicy {
        self.naming
    }

    pub(crate) fn converter_for(&self, target: TypeTag) -> Option<&dyn ErasedConverter> {
        self.converters
            .iter()
            .find(|converter| converter.target() == target)
            .map(AsRef::as_ref)
    }

    pub(crate) fn object_shape<T: DataObject>(&self) -> Result<Arc<ObjectShape<T>>, ConfigError> {
        self.cache.get_or_build(|| {
            ObjectShape::discover(
                ShapeDeclaration::<T>::of(),
                self.shapes.get(&TypeId::of::<T>()),
                self.naming,
            )
        })
    }

    pub(crate) fn interface_shape<I, T>(&self) -> Result<Arc<InterfaceShape<I, T>>, ConfigError>
    where
        I: ?Sized + 'static,
        T: Implements<I>,
    {
        let implementation = self.object_shape::<T>()?;
        self.cache
            .get_or_build(|| InterfaceShape::discover(&implementation))
    }

    /// Finalize the shape of `T` now instead of on first use.
    ///
    /// # Errors
    ///
    /// The shape of `T` is misconfigured.
    pub fn finalize<T: DataObject>(&self) -> Result<(), ConfigError> {
        self.object_shape::<T>().map(|_| ())
    }
}
