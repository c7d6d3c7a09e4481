use crate::block::{Attributes, parse_attributes};
use crate::diagnostics::{Diagnostics, Recovery};
use once_cell::sync::Lazy;
use regex::Regex;

/// `<!--`, whitespace, an optional closing slash, the `wp:` marker and a block name.
static DELIMITER_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s+(/)?wp:([a-z][a-z0-9_-]*(?:/[a-z][a-z0-9_-]*)?)")
        .expect("delimiter head pattern is valid")
});

static OPENER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s+wp:").expect("opener token pattern is valid"));

/// Returns true if `text` contains an opening block delimiter token.
pub fn has_blocks(text: &str) -> bool {
    OPENER_TOKEN.is_match(text)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DelimiterKind {
    Opener(Attributes),
    SelfClosing(Attributes),
    Closer,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Delimiter<'a> {
    pub kind: DelimiterKind,
    pub name: String,
    pub raw: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Delimiter(Delimiter<'a>),
}

/// Splits `text` into literal runs and well-formed delimiters.
///
/// A delimiter that cannot be interpreted stays inside the surrounding literal run.
pub(crate) fn tokenize<'a>(text: &'a str, diagnostics: &mut Diagnostics) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut search = 0;

    while search < text.len() {
        let Some(caps) = DELIMITER_HEAD.captures(&text[search..]) else {
            break;
        };
        let (Some(head), Some(name)) = (caps.get(0), caps.get(2)) else {
            break;
        };
        let head_start = search + head.start();
        let head_end = search + head.end();
        let is_closer = caps.get(1).is_some();

        match read_tail(text, head_end, is_closer) {
            Ok((end, kind)) => {
                if literal_start < head_start {
                    tokens.push(Token::Text(&text[literal_start..head_start]));
                }
                tokens.push(Token::Delimiter(Delimiter {
                    kind,
                    name: name.as_str().to_string(),
                    raw: &text[head_start..end],
                }));
                literal_start = end;
                search = end;
            }
            Err(reason) => {
                diagnostics.record(
                    Recovery::MalformedDelimiter,
                    format!(
                        "delimiter for '{}' at byte {} kept as text: {}",
                        name.as_str(),
                        head_start,
                        reason
                    ),
                );
                search = head_start + "<!--".len();
            }
        }
    }

    if literal_start < text.len() {
        tokens.push(Token::Text(&text[literal_start..]));
    }
    tokens
}

/// Reads the part of a delimiter after its name, up to and including `-->`.
fn read_tail(text: &str, from: usize, is_closer: bool) -> Result<(usize, DelimiterKind), String> {
    let rest = &text[from..];
    if !rest.starts_with(char::is_whitespace) {
        return Err("block name is not followed by whitespace".to_string());
    }
    let close = rest
        .find("-->")
        .ok_or_else(|| "delimiter is never terminated".to_string())?;
    let end = from + close + "-->".len();

    let inner = rest[..close].trim();
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (inner, false),
    };

    let attributes = if inner.is_empty() {
        None
    } else if inner.starts_with('{') && inner.ends_with('}') {
        Some(parse_attributes(inner).map_err(|e| format!("invalid attributes: {}", e))?)
    } else {
        return Err(format!("unexpected text '{}' in delimiter", inner));
    };

    if is_closer {
        if attributes.is_some() || self_closing {
            return Err("closing delimiter carries attributes".to_string());
        }
        return Ok((end, DelimiterKind::Closer));
    }

    let attributes = attributes.unwrap_or_default();
    if self_closing {
        Ok((end, DelimiterKind::SelfClosing(attributes)))
    } else {
        Ok((end, DelimiterKind::Opener(attributes)))
    }
}
