//! Parser for the quoted `[{id, name}]` list encoding found in catalog exports.
//!
//! Exports mix strict JSON (`[{"id": 28, "name": "Action"}]`) with a
//! Python-literal flavour (`[{'id': 28, 'name': 'Action'}]`, `None` ids).
//! Rather than swapping quote characters wholesale, which corrupts names such
//! as `"Children's Film"`, the input is re-tokenized into strict JSON and then
//! deserialized into typed mentions.

use serde::Deserialize;
use thiserror::Error;

/// One taxonomy mention as it appears in a source row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawMention {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl RawMention {
    pub fn new(id: Option<i64>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TaxonomyParseError {
    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),
    #[error("not a list of {{id, name}} records: {0}")]
    Structure(#[from] serde_json::Error),
}

/// Parse a raw taxonomy cell. Blank cells are an empty list.
pub fn parse_mentions(raw: &str) -> Result<Vec<RawMention>, TaxonomyParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let json = to_strict_json(trimmed)?;
    Ok(serde_json::from_str(&json)?)
}

/// Rewrite single- or double-quoted literals and the `None`/`True`/`False`
/// keywords into strict JSON. Structure is left for serde to validate.
pub fn to_strict_json(input: &str) -> Result<String, TaxonomyParseError> {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                let quote = c;
                let mut closed = false;
                out.push('"');
                while let Some((_, ch)) = chars.next() {
                    match ch {
                        '\\' => {
                            let Some((_, escaped)) = chars.next() else {
                                break;
                            };
                            push_escape(&mut out, escaped);
                        }
                        ch if ch == quote => {
                            closed = true;
                            break;
                        }
                        '"' => out.push_str("\\\""),
                        ch => push_literal(&mut out, ch),
                    }
                }
                if !closed {
                    return Err(TaxonomyParseError::UnterminatedString(start));
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "None" => "null",
                    "True" => "true",
                    "False" => "false",
                    other => other,
                });
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

fn push_escape(out: &mut String, escaped: char) {
    match escaped {
        '\'' => out.push('\''),
        '"' => out.push_str("\\\""),
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}

fn push_literal(out: &mut String, ch: char) {
    match ch {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        ch if ch.is_control() => out.push_str(&format!("\\u{:04x}", ch as u32)),
        ch => out.push(ch),
    }
}
