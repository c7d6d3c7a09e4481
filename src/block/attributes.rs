use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter};
use serde_json::{Map, Value};
use std::io;

/// The ordered attribute map of a block.
pub type Attributes = Map<String, Value>;

/// JSON formatter for attributes embedded in an HTML comment.
///
/// Output is compact with unescaped slashes and unicode. Inside strings, `--`, `<`, `>`, `&` and
/// `"` are written as unicode escapes so the JSON can never terminate the surrounding comment.
struct DelimiterSafeFormatter;

impl Formatter for DelimiterSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            let (replacement, width): (&[u8], usize) = match bytes[i] {
                b'<' => (b"\\u003c", 1),
                b'>' => (b"\\u003e", 1),
                b'&' => (b"\\u0026", 1),
                b'-' if bytes.get(i + 1) == Some(&b'-') => (b"\\u002d\\u002d", 2),
                _ => {
                    i += 1;
                    continue;
                }
            };
            writer.write_all(&bytes[start..i])?;
            writer.write_all(replacement)?;
            i += width;
            start = i;
        }
        writer.write_all(&bytes[start..])
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        match char_escape {
            CharEscape::Quote => writer.write_all(b"\\u0022"),
            other => CompactFormatter.write_char_escape(writer, other),
        }
    }
}

/// Renders attributes the way they appear inside a block delimiter.
pub fn render_attributes(attributes: &Attributes) -> String {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, DelimiterSafeFormatter);
    if let Err(e) = attributes.serialize(&mut serializer) {
        log::error!("Attribute rendering failed: {}", e);
        return "{}".to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| "{}".to_string())
}

/// Parses the JSON found inside a block delimiter. Only objects are accepted.
pub fn parse_attributes(raw: &str) -> Result<Attributes, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", value_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

/// A short name for the JSON type of `value`, used in messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
