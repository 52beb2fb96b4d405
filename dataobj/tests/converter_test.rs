mod common;

use common::{Color, Settings};
use dataobj::jsontok::{JsonWriter, Peek, TokenReader};
use dataobj::{
    decode_slice, encode_string, impl_json_type, ConfigError, ConversionConfig, DataObject,
    DecodeError, Error, JsonConverter, JsonType, Optional, Param, Scope, ShapeDeclaration,
    StringEnumConverter, StringEnumConverterFactory, TokenResultExt,
};

/// `u32` as a hexadecimal string.
struct Hex;

impl JsonConverter for Hex {
    type Value = u32;

    fn read(&self, reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> dataobj::Result<u32> {
        let index = reader.current_index();
        let text = reader.next_str().decoding()?;
        u32::from_str_radix(text.trim_start_matches("0x"), 16).map_err(|e| {
            DecodeError::InvalidValue {
                target: "u32",
                message: e.to_string(),
                index,
            }
            .into()
        })
    }

    fn write(&self, value: &u32, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> dataobj::Result<()> {
        writer.string(&format!("0x{value:x}")).encoding()
    }
}

/// `u32` as a decimal string.
struct Decimal;

impl JsonConverter for Decimal {
    type Value = u32;

    fn read(&self, reader: &mut TokenReader<'_>, _scope: Scope<'_>) -> dataobj::Result<u32> {
        let index = reader.current_index();
        let text = reader.next_str().decoding()?;
        text.parse().map_err(|_| {
            DecodeError::InvalidValue {
                target: "u32",
                message: format!("not a number: {text:?}"),
                index,
            }
            .into()
        })
    }

    fn write(&self, value: &u32, writer: &mut JsonWriter<'_>, _scope: Scope<'_>) -> dataobj::Result<()> {
        writer.string(&value.to_string()).encoding()
    }
}

/// Reads `null` as zero.
struct ZeroIfNull;

impl JsonConverter for ZeroIfNull {
    type Value = i32;

    fn read(&self, reader: &mut TokenReader<'_>, scope: Scope<'_>) -> dataobj::Result<i32> {
        if reader.peek().decoding()? == Peek::Null {
            reader.next_null().decoding()?;
            return Ok(0);
        }
        i32::read_json(reader, scope)
    }

    fn write(&self, value: &i32, writer: &mut JsonWriter<'_>, scope: Scope<'_>) -> dataobj::Result<()> {
        value.write_json(writer, scope)
    }

    fn handles_null(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Pixel {
    mask: u32,
    raw: u32,
}

impl DataObject for Pixel {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .init_only("mask", |p: &Pixel| &p.mask)
            .init_only("raw", |p: &Pixel| &p.raw)
            .constructor(
                vec![Param::new::<u32>("mask"), Param::new::<u32>("raw")],
                |args| {
                    Ok(Pixel {
                        mask: args.next()?,
                        raw: args.next()?,
                    })
                },
            );
    }
}

impl_json_type!(object Pixel);

#[derive(Debug, Clone, PartialEq)]
struct Paint {
    color: Color,
    accent: Optional<Option<Color>>,
    palette: Vec<Color>,
}

impl DataObject for Paint {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .init_only("color", |p: &Paint| &p.color)
            .init_only("accent", |p: &Paint| &p.accent)
            .init_only("palette", |p: &Paint| &p.palette)
            .constructor(
                vec![
                    Param::new::<Color>("color"),
                    Param::new::<Optional<Option<Color>>>("accent"),
                    Param::new::<Vec<Color>>("palette"),
                ],
                |args| {
                    Ok(Paint {
                        color: args.next()?,
                        accent: args.next()?,
                        palette: args.next()?,
                    })
                },
            );
    }
}

impl_json_type!(object Paint);

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    count: i32,
}

impl DataObject for Counter {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .field("count", |c: &Counter| &c.count, |c: &mut Counter, v| c.count = v)
            .instantiate(|| Counter { count: -1 });
    }
}

impl_json_type!(object Counter);

fn pixel() -> Pixel {
    Pixel {
        mask: 255,
        raw: 255,
    }
}

#[test]
fn property_converter_applies_to_that_property_only() {
    let config = ConversionConfig::builder()
        .shape::<Pixel>(|s| s.converter("mask", Hex))
        .build()
        .unwrap();
    let json = encode_string(&pixel(), &config).unwrap();
    assert_eq!(json, r#"{"mask":"0xff","raw":255}"#);
    let decoded: Pixel = decode_slice(json.as_bytes(), &config).unwrap();
    assert_eq!(decoded, pixel());
}

#[test]
fn global_converter_applies_everywhere() {
    let config = ConversionConfig::builder().converter(Hex).build().unwrap();
    assert_eq!(
        encode_string(&pixel(), &config).unwrap(),
        r#"{"mask":"0xff","raw":"0xff"}"#
    );
    assert_eq!(encode_string(&vec![16u32], &config).unwrap(), r#"["0x10"]"#);
}

#[test]
fn first_registered_global_converter_wins() {
    let config = ConversionConfig::builder()
        .converter(Decimal)
        .converter(Hex)
        .build()
        .unwrap();
    assert_eq!(encode_string(&16u32, &config).unwrap(), r#""16""#);
}

#[test]
fn prepended_converter_takes_precedence() {
    let base = ConversionConfig::builder().converter(Hex).build().unwrap();
    let layered = base.with_converter(Decimal);
    assert_eq!(encode_string(&16u32, &base).unwrap(), r#""0x10""#);
    assert_eq!(encode_string(&16u32, &layered).unwrap(), r#""16""#);
    let value: u32 = decode_slice(br#""42""#, &layered).unwrap();
    assert_eq!(value, 42);
}

#[test]
fn property_converter_beats_global() {
    let config = ConversionConfig::builder()
        .converter(Hex)
        .shape::<Pixel>(|s| s.converter("raw", Decimal))
        .build()
        .unwrap();
    assert_eq!(
        encode_string(&pixel(), &config).unwrap(),
        r#"{"mask":"0xff","raw":"255"}"#
    );
}

#[test]
fn enum_defaults_to_ordinal() {
    let config = ConversionConfig::default();
    let paint = Paint {
        color: Color::Blue,
        accent: Optional::Present(Some(Color::Green)),
        palette: vec![Color::Red],
    };
    let json = encode_string(&paint, &config).unwrap();
    assert_eq!(json, r#"{"color":2,"accent":1,"palette":[0]}"#);
    let decoded: Paint = decode_slice(json.as_bytes(), &config).unwrap();
    assert_eq!(decoded, paint);

    let err = decode_slice::<Color>(b"7", &config).unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::InvalidValue { .. })));
}

#[test]
fn string_enum_factory_unwraps_optional_layers() {
    let config = ConversionConfig::builder()
        .shape::<Paint>(|s| {
            s.converter_factory("accent", StringEnumConverterFactory::new().with::<Color>())
        })
        .build()
        .unwrap();
    let paint = Paint {
        color: Color::Red,
        accent: Optional::Present(Some(Color::Blue)),
        palette: vec![],
    };
    let json = encode_string(&paint, &config).unwrap();
    assert_eq!(json, r#"{"color":0,"accent":"blue","palette":[]}"#);
    let decoded: Paint = decode_slice(json.as_bytes(), &config).unwrap();
    assert_eq!(decoded, paint);

    let decoded: Paint =
        decode_slice(br#"{"color": 0, "accent": null, "palette": []}"#, &config).unwrap();
    assert_eq!(decoded.accent, Optional::Present(None));
    let decoded: Paint = decode_slice(br#"{"color": 0, "palette": []}"#, &config).unwrap();
    assert_eq!(decoded.accent, Optional::Absent);

    let err =
        decode_slice::<Paint>(br#"{"color": 0, "accent": "pink", "palette": []}"#, &config)
            .unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::InvalidValue { .. })));
}

#[test]
fn string_enum_converter_for_collection_items() {
    let config = ConversionConfig::builder()
        .converter(StringEnumConverter::<Color>::new())
        .build()
        .unwrap();
    let paint = Paint {
        color: Color::Green,
        accent: Optional::Absent,
        palette: vec![Color::Red, Color::Blue],
    };
    let json = encode_string(&paint, &config).unwrap();
    assert_eq!(json, r#"{"color":"green","palette":["red","blue"]}"#);
    let decoded: Paint = decode_slice(json.as_bytes(), &config).unwrap();
    assert_eq!(decoded, paint);
}

#[test]
fn unresolvable_factory_is_config_error() {
    let config = ConversionConfig::builder()
        .shape::<Pixel>(|s| s.converter_factory("mask", StringEnumConverterFactory::new().with::<Color>()))
        .build()
        .unwrap();
    let err = config.finalize::<Pixel>().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnresolvableFactory { ref property, .. } if property == "mask"
    ));
    let err = encode_string(&pixel(), &config).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::UnresolvableFactory { .. })));
}

#[test]
fn converter_for_another_type_is_config_error() {
    let config = ConversionConfig::builder()
        .shape::<Settings>(|s| s.converter("theme", Hex))
        .build()
        .unwrap();
    let err = config.finalize::<Settings>().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ConverterMismatch { ref property, .. } if property == "theme"
    ));
}

#[test]
fn null_handling_converter() {
    let config = ConversionConfig::default();
    let err = decode_slice::<Counter>(br#"{"count": null}"#, &config).unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::UnexpectedNull { .. })));

    let config = ConversionConfig::builder()
        .shape::<Counter>(|s| s.converter("count", ZeroIfNull))
        .build()
        .unwrap();
    let counter: Counter = decode_slice(br#"{"count": null}"#, &config).unwrap();
    assert_eq!(counter, Counter { count: 0 });
    let counter: Counter = decode_slice(br#"{"count": 4}"#, &config).unwrap();
    assert_eq!(counter, Counter { count: 4 });
    let err = decode_slice::<Counter>(br#"{}"#, &config).unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::MissingProperty { .. })));
}
