use dataobj::jsontok::JsonWriter;
use dataobj::{
    decode_slice, encode_string, impl_json_type, write_interface, ConfigError, ConversionConfig,
    DataObject, Error, Implements, InterfaceDeclaration, Param, ShapeDeclaration,
};

trait Shape: Send {
    fn name(&self) -> &String;
    fn area(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
struct Square {
    name: String,
    side: f64,
    secret: String,
}

impl Shape for Square {
    fn name(&self) -> &String {
        &self.name
    }

    fn area(&self) -> f64 {
        self.side * self.side
    }
}

impl DataObject for Square {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .init_only("name", |s: &Square| &s.name)
            .init_only("side", |s: &Square| &s.side)
            .init_only("secret", |s: &Square| &s.secret)
            .computed("area", |s: &Square| s.side * s.side)
            .constructor(
                vec![
                    Param::new::<String>("name"),
                    Param::new::<f64>("side"),
                    Param::new::<String>("secret"),
                ],
                |args| {
                    Ok(Square {
                        name: args.next()?,
                        side: args.next()?,
                        secret: args.next()?,
                    })
                },
            );
    }
}

impl Implements<dyn Shape> for Square {
    fn upcast(self) -> Box<dyn Shape> {
        Box::new(self)
    }

    fn declare_interface(interface: &mut InterfaceDeclaration<dyn Shape>) {
        interface
            .accessor("name", |s| s.name())
            .computed("area", |s| s.area());
    }
}

impl_json_type!(object Square);
impl_json_type!(interface dyn Shape => Square);

trait Labelled: Send {
    fn label(&self) -> &String;
}

/// Interface accessors that do not line up with the implementation.
struct Tag {
    label: String,
}

impl Labelled for Tag {
    fn label(&self) -> &String {
        &self.label
    }
}

impl DataObject for Tag {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .init_only("label", |t: &Tag| &t.label)
            .constructor(vec![Param::new::<String>("label")], |args| {
                Ok(Tag { label: args.next()? })
            });
    }
}

impl Implements<dyn Labelled> for Tag {
    fn upcast(self) -> Box<dyn Labelled> {
        Box::new(self)
    }

    fn declare_interface(interface: &mut InterfaceDeclaration<dyn Labelled>) {
        interface.accessor("title", |t| t.label());
    }
}

/// Same property, accessor of the wrong type.
struct Badge {
    label: String,
}

impl Labelled for Badge {
    fn label(&self) -> &String {
        &self.label
    }
}

impl DataObject for Badge {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .init_only("label", |b: &Badge| &b.label)
            .constructor(vec![Param::new::<String>("label")], |args| {
                Ok(Badge { label: args.next()? })
            });
    }
}

impl Implements<dyn Labelled> for Badge {
    fn upcast(self) -> Box<dyn Labelled> {
        Box::new(self)
    }

    fn declare_interface(interface: &mut InterfaceDeclaration<dyn Labelled>) {
        interface.computed("label", |b| b.label().len());
    }
}

fn square() -> Square {
    Square {
        name: "sq".to_owned(),
        side: 2.0,
        secret: "s".to_owned(),
    }
}

#[test]
fn interface_writes_only_exposed_properties() {
    let config = ConversionConfig::default();
    let boxed: Box<dyn Shape> = Box::new(square());
    assert_eq!(encode_string(&boxed, &config).unwrap(), r#"{"name":"sq"}"#);

    let config = ConversionConfig::builder()
        .shape::<Square>(|s| s.include("area").rename("name", "title"))
        .build()
        .unwrap();
    assert_eq!(
        encode_string(&boxed, &config).unwrap(),
        r#"{"title":"sq","area":4}"#
    );
    assert_eq!(
        encode_string(&square(), &config).unwrap(),
        r#"{"title":"sq","side":2,"secret":"s","area":4}"#
    );
}

#[test]
fn interface_decodes_through_implementation() {
    let config = ConversionConfig::default();
    let shape: Box<dyn Shape> =
        decode_slice(br#"{"name": "sq", "side": 3.0, "secret": "x"}"#, &config).unwrap();
    assert_eq!(shape.name(), "sq");
    assert!((shape.area() - 9.0).abs() < f64::EPSILON);
}

#[test]
fn interface_boxes_in_collections() {
    let config = ConversionConfig::default();
    let shapes: Vec<Box<dyn Shape>> = decode_slice(
        br#"[{"name": "a", "side": 1, "secret": ""}, {"name": "b", "side": 2, "secret": ""}]"#,
        &config,
    )
    .unwrap();
    assert_eq!(
        encode_string(&shapes, &config).unwrap(),
        r#"[{"name":"a"},{"name":"b"}]"#
    );
}

#[test]
fn unknown_accessor_name() {
    let config = ConversionConfig::default();
    let tag = Tag {
        label: "t".to_owned(),
    };
    let mut out = Vec::new();
    let mut writer = JsonWriter::new(&mut out);
    let err = write_interface::<dyn Labelled, Tag>(&tag, &mut writer, &config).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::UnknownProperty { ref property, .. }) if property == "title"
    ));
}

#[test]
fn accessor_type_mismatch() {
    let config = ConversionConfig::default();
    let badge = Badge {
        label: "b".to_owned(),
    };
    let mut out = Vec::new();
    let mut writer = JsonWriter::new(&mut out);
    let err = write_interface::<dyn Labelled, Badge>(&badge, &mut writer, &config).unwrap_err();
    match err {
        Error::Config(ConfigError::AccessorType {
            accessor_type,
            property_type,
            ..
        }) => {
            assert_eq!(accessor_type, "usize");
            assert_eq!(property_type, std::any::type_name::<String>());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
