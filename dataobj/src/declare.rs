//! Declaring the shape of a data object: its properties, constructors and
//! default instantiation.
//!
//! A declaration is the raw material. The finalized, immutable view used for
//! conversion is built from it by [`crate::shape`].

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use jsontok::{JsonWriter, TokenReader};

use crate::converter::Scope;
use crate::error::{ConfigError, Result};
use crate::types::{read_value, write_value, AnyValue, JsonType, TypeTag};

/// A type that converts to and from a JSON object.
///
/// ```
/// use dataobj::{impl_json_type, DataObject, Optional, Param, ShapeDeclaration};
///
/// #[derive(Debug, PartialEq)]
/// struct Account {
///     id: i64,
///     name: Optional<String>,
/// }
///
/// impl DataObject for Account {
///     fn declare(shape: &mut ShapeDeclaration<Self>) {
///         shape
///             .init_only("id", |a: &Account| &a.id)
///             .init_only("name", |a: &Account| &a.name)
///             .constructor(
///                 vec![Param::new::<i64>("id"), Param::new::<Optional<String>>("name")],
///                 |args| Ok(Account { id: args.next()?, name: args.next()? }),
///             );
///     }
/// }
///
/// impl_json_type!(object Account);
/// ```
pub trait DataObject: Sized + Send + 'static {
    fn declare(shape: &mut ShapeDeclaration<Self>);
}

/// A data object seen through a `dyn` interface `I`.
///
/// Encoding a `Box<I>` reads every property through the accessors declared
/// here; decoding builds `Self` and upcasts it.
pub trait Implements<I: ?Sized + 'static>: DataObject {
    fn upcast(self) -> Box<I>;

    fn declare_interface(interface: &mut InterfaceDeclaration<I>);
}

pub(crate) type DefaultValue = Arc<dyn Fn() -> Option<AnyValue> + Send + Sync>;
pub(crate) type Build<T> = Arc<dyn Fn(&mut CtorArgs) -> Result<T> + Send + Sync>;

pub(crate) enum Getter<T: ?Sized, V> {
    Ref(Box<dyn Fn(&T) -> &V + Send + Sync>),
    Owned(Box<dyn Fn(&T) -> V + Send + Sync>),
}

/// Reads and writes one property on its owner.
pub(crate) trait Accessor<T: ?Sized>: Send + Sync {
    fn value_type(&self) -> TypeTag;

    fn is_absent(&self, owner: &T) -> bool;

    fn encode(&self, owner: &T, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()>;

    fn has_setter(&self) -> bool;

    /// Store a value decoded by the matching [`ValueCodec`].
    fn assign(&self, owner: &mut T, property: &str, value: AnyValue) -> Result<()>;
}

/// Decodes values of one property type, independent of the owner.
pub(crate) trait ValueCodec: Send + Sync {
    fn value_type(&self) -> TypeTag;

    fn nullable(&self) -> bool;

    fn layers(&self) -> Vec<TypeTag>;

    fn empty(&self) -> Option<DefaultValue>;

    fn decode(&self, reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<AnyValue>;
}

struct Property<T: ?Sized, V> {
    getter: Getter<T, V>,
    setter: Option<Box<dyn Fn(&mut T, V) + Send + Sync>>,
}

impl<T: ?Sized + 'static, V: JsonType> Accessor<T> for Property<T, V> {
    fn value_type(&self) -> TypeTag {
        TypeTag::of::<V>()
    }

    fn is_absent(&self, owner: &T) -> bool {
        match &self.getter {
            Getter::Ref(get) => get(owner).is_absent(),
            Getter::Owned(get) => get(owner).is_absent(),
        }
    }

    fn encode(&self, owner: &T, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> Result<()> {
        match &self.getter {
            Getter::Ref(get) => write_value(get(owner), writer, scope),
            Getter::Owned(get) => write_value(&get(owner), writer, scope),
        }
    }

    fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    fn assign(&self, owner: &mut T, property: &str, value: AnyValue) -> Result<()> {
        let (Some(set), Ok(value)) = (&self.setter, value.downcast::<V>()) else {
            return Err(ConfigError::Unassignable {
                type_name: type_name::<T>(),
                property: property.to_owned(),
                declared: type_name::<V>(),
            }
            .into());
        };
        set(owner, *value);
        Ok(())
    }
}

struct Codec<V>(PhantomData<fn() -> V>);

impl<V: JsonType> ValueCodec for Codec<V> {
    fn value_type(&self) -> TypeTag {
        TypeTag::of::<V>()
    }

    fn nullable(&self) -> bool {
        V::NULLABLE
    }

    fn layers(&self) -> Vec<TypeTag> {
        let mut layers = Vec::new();
        V::layers(&mut layers);
        layers
    }

    fn empty(&self) -> Option<DefaultValue> {
        V::empty()?;
        Some(Arc::new(|| V::empty().map(|value| -> AnyValue { Box::new(value) })))
    }

    fn decode(&self, reader: &mut TokenReader<'_>, scope: Scope<'_>) -> Result<AnyValue> {
        let value = read_value::<V>(reader, scope)?;
        Ok(Box::new(value))
    }
}

pub(crate) struct DeclaredProperty<T: ?Sized> {
    pub(crate) name: String,
    pub(crate) writable: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) accessor: Arc<dyn Accessor<T>>,
    pub(crate) codec: Arc<dyn ValueCodec>,
}

/// A constructor parameter: its name, type and optional default.
pub struct Param {
    pub(crate) name: String,
    pub(crate) value_type: TypeTag,
    pub(crate) default: Option<DefaultValue>,
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("value_type", &self.value_type.name())
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl Param {
    #[must_use]
    pub fn new<V: JsonType>(name: &str) -> Self {
        Param {
            name: name.to_owned(),
            value_type: TypeTag::of::<V>(),
            default: None,
        }
    }

    /// A parameter that falls back to `value` when the property is missing.
    #[must_use]
    pub fn with_default<V: JsonType + Clone + Sync>(name: &str, value: V) -> Self {
        Param {
            name: name.to_owned(),
            value_type: TypeTag::of::<V>(),
            default: Some(Arc::new(move || -> Option<AnyValue> {
                Some(Box::new(value.clone()))
            })),
        }
    }
}

/// Arguments handed to a constructor, in parameter order.
pub struct CtorArgs {
    type_name: &'static str,
    values: std::vec::IntoIter<(TypeTag, AnyValue)>,
    position: usize,
}

impl CtorArgs {
    pub(crate) fn new(type_name: &'static str, values: Vec<(TypeTag, AnyValue)>) -> Self {
        CtorArgs {
            type_name,
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Take the next argument.
    ///
    /// # Errors
    ///
    /// The constructor asked for another type than its parameter declares,
    /// or for more arguments than it has.
    pub fn next<V: 'static>(&mut self) -> Result<V> {
        let position = self.position;
        self.position += 1;
        let mismatch = |declared: &'static str| ConfigError::ArgumentType {
            type_name: self.type_name,
            position,
            requested: type_name::<V>(),
            declared,
        };
        let Some((declared, value)) = self.values.next() else {
            return Err(mismatch("nothing").into());
        };
        value
            .downcast::<V>()
            .map(|value| *value)
            .map_err(|_| mismatch(declared.name()).into())
    }
}

pub(crate) struct ConstructorDeclaration<T> {
    pub(crate) params: Vec<Param>,
    pub(crate) build: Build<T>,
}

/// The properties, constructors and default instantiation of `T`.
pub struct ShapeDeclaration<T> {
    pub(crate) properties: Vec<DeclaredProperty<T>>,
    pub(crate) constructors: Vec<ConstructorDeclaration<T>>,
    pub(crate) instantiate: Option<Box<dyn Fn() -> T + Send + Sync>>,
    pub(crate) error: Option<ConfigError>,
}

impl<T: DataObject> ShapeDeclaration<T> {
    pub(crate) fn of() -> Self {
        let mut declaration = ShapeDeclaration {
            properties: Vec::new(),
            constructors: Vec::new(),
            instantiate: None,
            error: None,
        };
        T::declare(&mut declaration);
        declaration
    }

    pub(crate) fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }

    fn push<V: JsonType>(
        &mut self,
        name: &str,
        writable: bool,
        default: Option<DefaultValue>,
        property: Property<T, V>,
    ) {
        if self.properties.iter().any(|p| p.name == name) {
            self.error.get_or_insert(ConfigError::DuplicateProperty {
                type_name: type_name::<T>(),
                property: name.to_owned(),
            });
            return;
        }
        self.properties.push(DeclaredProperty {
            name: name.to_owned(),
            writable,
            default,
            accessor: Arc::new(property),
            codec: Arc::new(Codec::<V>(PhantomData)),
        });
    }

    /// A writable property with a setter, usable by either initialization
    /// strategy. Unless it is an [`crate::Optional`], decoding fails when
    /// the input leaves it out.
    pub fn field<V, G, S>(&mut self, name: &str, get: G, set: S) -> &mut Self
    where
        V: JsonType,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let property: Property<T, V> = Property {
            getter: Getter::Ref(Box::new(get)),
            setter: Some(Box::new(set)),
        };
        self.push(name, true, None, property);
        self
    }

    /// Like [`ShapeDeclaration::field`], with `value` used when the input
    /// leaves the property out.
    pub fn field_with_default<V, G, S>(
        &mut self,
        name: &str,
        get: G,
        set: S,
        value: V,
    ) -> &mut Self
    where
        V: JsonType + Clone + Sync,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let property: Property<T, V> = Property {
            getter: Getter::Ref(Box::new(get)),
            setter: Some(Box::new(set)),
        };
        let default: DefaultValue =
            Arc::new(move || -> Option<AnyValue> { Some(Box::new(value.clone())) });
        self.push(name, true, Some(default), property);
        self
    }

    /// A writable property that only a constructor can set.
    pub fn init_only<V, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        V: JsonType,
        G: Fn(&T) -> &V + Send + Sync + 'static,
    {
        let property: Property<T, V> = Property {
            getter: Getter::Ref(Box::new(get)),
            setter: None,
        };
        self.push(name, true, None, property);
        self
    }

    /// A property that is written but never read back.
    pub fn read_only<V, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        V: JsonType,
        G: Fn(&T) -> &V + Send + Sync + 'static,
    {
        let property: Property<T, V> = Property {
            getter: Getter::Ref(Box::new(get)),
            setter: None,
        };
        self.push(name, false, None, property);
        self
    }

    /// A read-only property computed on every write.
    pub fn computed<V, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        V: JsonType,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let property: Property<T, V> = Property {
            getter: Getter::Owned(Box::new(get)),
            setter: None,
        };
        self.push(name, false, None, property);
        self
    }

    pub fn constructor<B>(&mut self, params: Vec<Param>, build: B) -> &mut Self
    where
        B: Fn(&mut CtorArgs) -> Result<T> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorDeclaration {
            params,
            build: Arc::new(build),
        });
        self
    }

    /// Default instantiation, followed by assignment of the decoded fields.
    pub fn instantiate<F>(&mut self, instantiate: F) -> &mut Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.instantiate = Some(Box::new(instantiate));
        self
    }
}

/// Accessors that read the properties of an implementation through its
/// interface `I`.
pub struct InterfaceDeclaration<I: ?Sized> {
    pub(crate) accessors: Vec<(String, Arc<dyn Accessor<I>>)>,
}

impl<I: ?Sized + 'static> InterfaceDeclaration<I> {
    pub(crate) fn of<T: Implements<I>>() -> Self {
        let mut declaration = InterfaceDeclaration {
            accessors: Vec::new(),
        };
        T::declare_interface(&mut declaration);
        declaration
    }

    pub fn accessor<V, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        V: JsonType,
        G: Fn(&I) -> &V + Send + Sync + 'static,
    {
        let accessor: Arc<dyn Accessor<I>> = Arc::new(Property {
            getter: Getter::Ref(Box::new(get)),
            setter: None,
        });
        self.accessors.push((name.to_owned(), accessor));
        self
    }

    pub fn computed<V, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        V: JsonType,
        G: Fn(&I) -> V + Send + Sync + 'static,
    {
        let accessor: Arc<dyn Accessor<I>> = Arc::new(Property {
            getter: Getter::Owned(Box::new(get)),
            setter: None,
        });
        self.accessors.push((name.to_owned(), accessor));
        self
    }
}
