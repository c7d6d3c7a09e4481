//! The base64 "capsule" that carries a block's full attribute map through translation.
//!
//! Capsules are written as base64 of the compact JSON object. Decoding also accepts the legacy
//! length-prefixed serialization (`a:1:{s:4:"test";s:5:"value";}`) written by older exporters.

use crate::block::{Attributes, value_kind};
use crate::error::CapsuleError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Number, Value};

const LEGACY_MAX_DEPTH: usize = 128;

pub fn encode_capsule(attributes: &Attributes) -> String {
    let json = serde_json::to_string(attributes).unwrap_or_else(|e| {
        log::error!("Attribute capsule serialization failed: {}", e);
        "{}".to_string()
    });
    STANDARD.encode(json)
}

pub fn decode_capsule(capsule: &str) -> Result<Attributes, CapsuleError> {
    let compact: String = capsule.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(Attributes::new());
    }
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CapsuleError::Base64(e.to_string()))?;
    let payload = std::str::from_utf8(&bytes).map_err(|_| CapsuleError::Utf8)?;
    let trimmed = payload.trim_start();

    let value = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str::<Value>(payload).map_err(|e| CapsuleError::Payload {
            offset: e.column(),
            message: e.to_string(),
        })?
    } else {
        log::debug!("Capsule is not JSON, trying the legacy serialization");
        LegacyReader::new(payload).read_document()?
    };

    match value {
        Value::Object(map) => Ok(map),
        // An empty attribute list was historically encoded as `[]`.
        Value::Array(items) if items.is_empty() => Ok(Attributes::new()),
        other => Err(CapsuleError::NotAMapping {
            found: value_kind(&other).to_string(),
        }),
    }
}

/// Reader for the legacy length-prefixed serialization.
struct LegacyReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> LegacyReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn read_document(mut self) -> Result<Value, CapsuleError> {
        let value = self.read_value(0)?;
        if self.pos != self.input.len() {
            return Err(self.error("trailing data after value"));
        }
        Ok(value)
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, CapsuleError> {
        if depth > LEGACY_MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let tag = self.next_byte()?;
        match tag {
            b'N' => {
                self.expect(b';')?;
                Ok(Value::Null)
            }
            b'b' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                match raw {
                    "0" => Ok(Value::Bool(false)),
                    "1" => Ok(Value::Bool(true)),
                    _ => Err(self.error("invalid boolean")),
                }
            }
            b'i' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                raw.parse::<i64>()
                    .map(|n| Value::Number(Number::from(n)))
                    .map_err(|_| self.error("invalid integer"))
            }
            b'd' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| self.error("invalid float"))
            }
            b's' => self.read_string().map(Value::String),
            b'a' => self.read_array(depth),
            other => Err(self.error(&format!("unknown type tag '{}'", other as char))),
        }
    }

    fn read_string(&mut self) -> Result<String, CapsuleError> {
        self.expect(b':')?;
        let len = self.read_length(b':')?;
        self.expect(b'"')?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| self.error("string runs past the end of input"))?;
        let input: &'a [u8] = self.input;
        let text = std::str::from_utf8(&input[self.pos..end])
            .map_err(|_| CapsuleError::Utf8)?
            .to_string();
        self.pos = end;
        self.expect(b'"')?;
        self.expect(b';')?;
        Ok(text)
    }

    fn read_array(&mut self, depth: usize) -> Result<Value, CapsuleError> {
        self.expect(b':')?;
        let count = self.read_length(b':')?;
        self.expect(b'{')?;

        let mut entries: Vec<(String, Value)> = Vec::new();
        let mut sequential = true;
        for index in 0..count {
            let key = match self.next_byte()? {
                b'i' => {
                    self.expect(b':')?;
                    let raw = self.read_until(b';')?;
                    sequential &= raw.parse::<usize>() == Ok(index);
                    raw.to_string()
                }
                b's' => {
                    sequential = false;
                    self.read_string()?
                }
                _ => return Err(self.error("array key must be an integer or string")),
            };
            let value = self.read_value(depth + 1)?;
            entries.push((key, value));
        }
        self.expect(b'}')?;

        if sequential && !entries.is_empty() {
            Ok(Value::Array(entries.into_iter().map(|(_, v)| v).collect()))
        } else {
            Ok(Value::Object(entries.into_iter().collect::<Map<String, Value>>()))
        }
    }

    fn read_length(&mut self, terminator: u8) -> Result<usize, CapsuleError> {
        let raw = self.read_until(terminator)?;
        raw.parse::<usize>().map_err(|_| self.error("invalid length"))
    }

    fn read_until(&mut self, terminator: u8) -> Result<&'a str, CapsuleError> {
        let input: &'a [u8] = self.input;
        let start = self.pos;
        let offset = input[start..]
            .iter()
            .position(|b| *b == terminator)
            .ok_or_else(|| self.error(&format!("expected '{}'", terminator as char)))?;
        self.pos = start + offset + 1;
        std::str::from_utf8(&input[start..start + offset]).map_err(|_| CapsuleError::Utf8)
    }

    fn next_byte(&mut self) -> Result<u8, CapsuleError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), CapsuleError> {
        let found = self.next_byte()?;
        if found != expected {
            self.pos -= 1;
            return Err(self.error(&format!(
                "expected '{}', found '{}'",
                expected as char, found as char
            )));
        }
        Ok(())
    }

    fn error(&self, message: &str) -> CapsuleError {
        CapsuleError::Payload {
            offset: self.pos,
            message: message.to_string(),
        }
    }
}
