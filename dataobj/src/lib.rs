//! `dataobj`: converts declared data objects to and from JSON objects.
//!
//! A type describes itself once through [`DataObject::declare`]: its
//! properties, its constructors and how to instantiate it. On first use the
//! declaration is combined with the overrides of a [`ConversionConfig`] into
//! a finalized shape, which is cached and shared by every later call.
//!
//! ```
//! use dataobj::{decode_slice, encode_string, impl_json_type};
//! use dataobj::{ConversionConfig, DataObject, Optional, Param, ShapeDeclaration};
//!
//! #[derive(Debug, PartialEq)]
//! struct User {
//!     id: i32,
//!     name: Optional<Option<String>>,
//! }
//!
//! impl DataObject for User {
//!     fn declare(shape: &mut ShapeDeclaration<Self>) {
//!         shape
//!             .init_only("id", |u: &User| &u.id)
//!             .init_only("name", |u: &User| &u.name)
//!             .constructor(
//!                 vec![Param::new::<i32>("id"), Param::new::<Optional<Option<String>>>("name")],
//!                 |args| Ok(User { id: args.next()?, name: args.next()? }),
//!             );
//!     }
//! }
//!
//! impl_json_type!(object User);
//!
//! let config = ConversionConfig::default();
//! let user: User = decode_slice(br#"{"id": 42}"#, &config).unwrap();
//! assert_eq!(user.name, Optional::Absent);
//! assert_eq!(encode_string(&user, &config).unwrap(), r#"{"id":42}"#);
//!
//! let user: User = decode_slice(br#"{"id": 42, "name": null}"#, &config).unwrap();
//! assert_eq!(user.name, Optional::Present(None));
//! assert_eq!(encode_string(&user, &config).unwrap(), r#"{"id":42,"name":null}"#);
//! ```

pub mod config;
pub mod converter;
pub mod declare;
pub mod error;
pub mod optional;
pub mod reader;
mod shape;
pub mod transport;
pub mod types;
pub mod writer;

pub use config::{ConfigBuilder, ConversionConfig, NamingPolicy, ShapeConfigurator};
pub use converter::{
    read_ordinal, write_ordinal, ConverterFactory, ErasedConverter, JsonConverter, JsonEnum, Scope,
    StringEnumConverter, StringEnumConverterFactory,
};
pub use declare::{CtorArgs, DataObject, Implements, InterfaceDeclaration, Param, ShapeDeclaration};
pub use error::{ConfigError, DecodeError, EncodeError, Error, Result, TokenResultExt};
pub use optional::Optional;
pub use reader::{read_interface, read_object};
pub use transport::{decode_reader, decode_slice, encode_string, encode_vec, encode_writer};
pub use types::{read_value, write_value, JsonType, TypeTag};
pub use writer::{write_interface, write_object};

pub use jsontok;

/// Implement [`JsonType`] through the shape machinery.
///
/// - `impl_json_type!(object T)` for a [`DataObject`]
/// - `impl_json_type!(enum E)` for a [`JsonEnum`], written as its ordinal
/// - `impl_json_type!(interface dyn I => T)` for `Box<dyn I>`, where `T`
///   implements [`Implements<dyn I>`]; the trait needs `Send` as a supertrait
#[macro_export]
macro_rules! impl_json_type {
    (object $ty:ty) => {
        impl $crate::JsonType for $ty {
            fn read_json(
                reader: &mut $crate::jsontok::TokenReader<'_>,
                scope: $crate::Scope<'_>,
            ) -> $crate::Result<Self> {
                $crate::read_object::<$ty>(reader, scope.config())
            }

            fn write_json(
                &self,
                writer: &mut $crate::jsontok::JsonWriter<'_>,
                scope: $crate::Scope<'_>,
            ) -> $crate::Result<()> {
                $crate::write_object(self, writer, scope.config())
            }
        }
    };
    (enum $ty:ty) => {
        impl $crate::JsonType for $ty {
            fn read_json(
                reader: &mut $crate::jsontok::TokenReader<'_>,
                _scope: $crate::Scope<'_>,
            ) -> $crate::Result<Self> {
                $crate::read_ordinal::<$ty>(reader)
            }

            fn write_json(
                &self,
                writer: &mut $crate::jsontok::JsonWriter<'_>,
                _scope: $crate::Scope<'_>,
            ) -> $crate::Result<()> {
                $crate::write_ordinal(*self, writer)
            }
        }
    };
    (interface $iface:ty => $imp:ty) => {
        impl $crate::JsonType for Box<$iface> {
            fn read_json(
                reader: &mut $crate::jsontok::TokenReader<'_>,
                scope: $crate::Scope<'_>,
            ) -> $crate::Result<Self> {
                $crate::read_interface::<$iface, $imp>(reader, scope.config())
            }

            fn write_json(
                &self,
                writer: &mut $crate::jsontok::JsonWriter<'_>,
                scope: $crate::Scope<'_>,
            ) -> $crate::Result<()> {
                $crate::write_interface::<$iface, $imp>(&**self, writer, scope.config())
            }
        }
    };
}
