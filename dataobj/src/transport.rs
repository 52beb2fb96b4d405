//! Whole-document entry points for the transport layer.

use std::io::{Read, Write};

use jsontok::{JsonWriter, TokenReader};

use crate::config::ConversionConfig;
use crate::converter::Scope;
use crate::error::{DecodeError, Result, TokenResultExt};
use crate::types::{read_value, write_value, JsonType};

/// Decode `input`, which must hold exactly one JSON value.
///
/// # Errors
///
/// Malformed input, trailing data after the value, or a misconfigured shape.
pub fn decode_slice<T: JsonType>(input: &[u8], config: &ConversionConfig) -> Result<T> {
    let mut reader = TokenReader::new(input);
    let value = read_value::<T>(&mut reader, Scope::new(config))?;
    reader.finish().decoding()?;
    Ok(value)
}

/// Read `input` to the end and decode it.
///
/// # Errors
///
/// See [`decode_slice`]; also fails when reading `input` fails.
pub fn decode_reader<T: JsonType, R: Read>(mut input: R, config: &ConversionConfig) -> Result<T> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf).map_err(DecodeError::Io)?;
    decode_slice(&buf, config)
}

/// # Errors
///
/// Writing to `out` failed, or the value has no JSON representation.
pub fn encode_writer<T: JsonType>(
    value: &T,
    out: &mut dyn Write,
    config: &ConversionConfig,
) -> Result<()> {
    let mut writer = JsonWriter::new(out);
    write_value(value, &mut writer, Scope::new(config))?;
    writer.flush().encoding()
}

/// # Errors
///
/// The value has no JSON representation, or the shape is misconfigured.
pub fn encode_vec<T: JsonType>(value: &T, config: &ConversionConfig) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_writer(value, &mut buf, config)?;
    Ok(buf)
}

/// # Errors
///
/// See [`encode_vec`].
pub fn encode_string<T: JsonType>(value: &T, config: &ConversionConfig) -> Result<String> {
    let buf = encode_vec(value, config)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
