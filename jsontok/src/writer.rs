use std::io::Write;

use crate::error::{Error, ErrorType, Result};

/// Push writer producing compact JSON.
///
/// The writer does not validate the document structure beyond comma
/// placement: a name is expected before every value inside an object.
pub struct JsonWriter<'w> {
    out: &'w mut dyn Write,
    n_written: usize,
    pending_comma: bool,
    after_name: bool,
}

impl<'w> std::fmt::Debug for JsonWriter<'w> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "JsonWriter {{ n_written: {:?}, pending_comma: {:?}, after_name: {:?} }}",
            self.n_written, self.pending_comma, self.after_name
        )
    }
}

impl<'w> JsonWriter<'w> {
    pub fn new(out: &'w mut dyn Write) -> Self {
        JsonWriter {
            out,
            n_written: 0,
            pending_comma: false,
            after_name: false,
        }
    }

    /// Number of bytes emitted so far.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.n_written
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out
            .write_all(bytes)
            .map_err(|e| Error::from_io_error(self.n_written, e))?;
        self.n_written += bytes.len();
        Ok(())
    }

    fn before_value(&mut self) -> Result<()> {
        if self.after_name {
            self.after_name = false;
        } else if self.pending_comma {
            self.write(b",")?;
        }
        Ok(())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn begin_object(&mut self) -> Result<()> {
        self.before_value()?;
        self.write(b"{")?;
        self.pending_comma = false;
        Ok(())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn end_object(&mut self) -> Result<()> {
        self.write(b"}")?;
        self.pending_comma = true;
        Ok(())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn begin_array(&mut self) -> Result<()> {
        self.before_value()?;
        self.write(b"[")?;
        self.pending_comma = false;
        Ok(())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn end_array(&mut self) -> Result<()> {
        self.write(b"]")?;
        self.pending_comma = true;
        Ok(())
    }

    /// Write an object key. The next call must write its value.
    ///
    /// # Errors
    ///
    /// The underlying writer failed.
    pub fn name(&mut self, name: &str) -> Result<()> {
        if self.pending_comma {
            self.write(b",")?;
        }
        self.write_escaped(name)?;
        self.write(b":")?;
        self.after_name = true;
        Ok(())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn null(&mut self) -> Result<()> {
        self.atom(b"null")
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn bool(&mut self, value: bool) -> Result<()> {
        let bytes: &[u8] = if value { b"true" } else { b"false" };
        self.atom(bytes)
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn int(&mut self, value: i64) -> Result<()> {
        self.atom(value.to_string().as_bytes())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn uint(&mut self, value: u64) -> Result<()> {
        self.atom(value.to_string().as_bytes())
    }

    /// # Errors
    ///
    /// `NaN` and infinities have no JSON representation.
    pub fn float(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error {
                error_type: ErrorType::NonFiniteNumber(value),
                index: self.n_written,
            });
        }
        self.atom(value.to_string().as_bytes())
    }

    /// Same as [`JsonWriter::float`], but keeps the shortest `f32` digits.
    ///
    /// # Errors
    ///
    /// `NaN` and infinities have no JSON representation.
    pub fn float32(&mut self, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(Error {
                error_type: ErrorType::NonFiniteNumber(f64::from(value)),
                index: self.n_written,
            });
        }
        self.atom(value.to_string().as_bytes())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn string(&mut self, value: &str) -> Result<()> {
        self.before_value()?;
        self.write_escaped(value)?;
        self.pending_comma = true;
        Ok(())
    }

    fn atom(&mut self, bytes: &[u8]) -> Result<()> {
        self.before_value()?;
        self.write(bytes)?;
        self.pending_comma = true;
        Ok(())
    }

    fn write_escaped(&mut self, value: &str) -> Result<()> {
        self.write(b"\"")?;
        let bytes = value.as_bytes();
        let mut start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            let escape: Option<&[u8]> = match byte {
                b'"' => Some(b"\\\""),
                b'\\' => Some(b"\\\\"),
                b'\n' => Some(b"\\n"),
                b'\r' => Some(b"\\r"),
                b'\t' => Some(b"\\t"),
                0x08 => Some(b"\\b"),
                0x0c => Some(b"\\f"),
                _ => None,
            };
            if escape.is_none() && byte >= 0x20 {
                continue;
            }
            if start < i {
                self.write(&bytes[start..i])?;
            }
            match escape {
                Some(seq) => self.write(seq)?,
                None => self.write(format!("\\u{byte:04x}").as_bytes())?,
            }
            start = i + 1;
        }
        if start < bytes.len() {
            self.write(&bytes[start..])?;
        }
        self.write(b"\"")
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| Error::from_io_error(self.n_written, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(input: &str) -> String {
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out);
        writer.string(input).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn escape_plain_text_unchanged() {
        assert_eq!(escaped("hello"), r#""hello""#);
    }

    #[test]
    fn escape_quotes_and_controls() {
        assert_eq!(escaped("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
        assert_eq!(escaped("\u{1}"), r#""\u0001""#);
    }

    #[test]
    fn escape_keeps_multibyte_text() {
        assert_eq!(escaped("héllo ✓"), "\"héllo ✓\"");
    }
}
