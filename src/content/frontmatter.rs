//! Front-matter splitting and decoding

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::error::ParseError;

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[derive(Deserialize)]
struct StringList(#[serde(deserialize_with = "string_or_vec")] Vec<String>);

/// Front matter as written, before any field is interpreted
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawFrontMatter {
    draft: Option<Value>,
    title: Option<Value>,
    summary: Option<Value>,
    date: Option<Value>,
    tags: Option<Value>,
    authors: Option<Value>,
    layout: Option<Value>,
    images: Option<Value>,
    #[serde(rename = "canonicalUrl")]
    canonical_url: Option<Value>,

    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

/// Decoded front-matter fields
///
/// Required fields stay optional here; checking them is the parser's job so
/// that the error names the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub draft: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "canonicalUrl", skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,

    /// Additional custom fields, in source order
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl FrontMatter {
    /// Split a leading `---` block from the body.
    ///
    /// Returns `(None, text)` when the text has no front matter. An opening
    /// delimiter without a closing one is a structural error.
    pub fn split(text: &str) -> Result<(Option<&str>, &str), ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let text = text.trim_start_matches(['\n', '\r']);

        let first_end = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
        if text[..first_end].trim_end() != "---" {
            return Ok((None, text));
        }

        let rest = &text[first_end..];
        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                let yaml = &rest[..offset];
                let body = rest[offset + line.len()..].trim_start_matches(['\n', '\r']);
                return Ok((Some(yaml), body));
            }
            offset += line.len();
        }

        Err(ParseError::malformed(
            "line 1",
            "front matter opened with `---` is never closed",
        ))
    }

    /// Decode a YAML front-matter block
    pub fn decode(yaml: &str) -> Result<Self, ParseError> {
        RawFrontMatter::decode(yaml)?.convert()
    }
}

impl RawFrontMatter {
    /// Read the YAML mapping without interpreting any field
    pub(crate) fn decode(yaml: &str) -> Result<Self, ParseError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| ParseError::malformed(yaml_location(&e), e.to_string()))?;
        let value = match value {
            Value::Mapping(_) => value,
            Value::Null => return Ok(Self::default()),
            _ => {
                return Err(ParseError::malformed(
                    "front matter",
                    "front matter must be a mapping of keys to values",
                ))
            }
        };

        serde_yaml::from_value(value)
            .map_err(|e| ParseError::validation("front matter", e.to_string()))
    }

    /// Fail on the first of `title`, `summary`, `date` that is absent or blank
    pub(crate) fn check_required(&self) -> Result<(), ParseError> {
        let required = [
            ("title", &self.title),
            ("summary", &self.summary),
            ("date", &self.date),
        ];
        for (field, value) in required {
            match value {
                None | Some(Value::Null) => {
                    return Err(ParseError::validation(field, "required field is missing"))
                }
                Some(Value::String(s)) if s.trim().is_empty() => {
                    return Err(ParseError::validation(field, "required field is empty"))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Interpret every recognized field
    pub(crate) fn convert(self) -> Result<FrontMatter, ParseError> {
        Ok(FrontMatter {
            title: self.title.map(|v| scalar("title", v)).transpose()?,
            summary: self.summary.map(|v| scalar("summary", v)).transpose()?,
            date: self.date.map(|v| date("date", v)).transpose()?,
            tags: self
                .tags
                .map(|v| list("tags", v))
                .transpose()?
                .unwrap_or_default(),
            draft: self
                .draft
                .map(|v| flag("draft", v))
                .transpose()?
                .unwrap_or(false),
            authors: self
                .authors
                .map(|v| list("authors", v))
                .transpose()?
                .unwrap_or_default(),
            layout: self.layout.map(|v| scalar("layout", v)).transpose()?,
            images: self.images.map(|v| list("images", v)).transpose()?,
            canonical_url: self
                .canonical_url
                .map(|v| scalar("canonicalUrl", v))
                .transpose()?,
            extra: self.extra,
        })
    }
}

fn yaml_location(err: &serde_yaml::Error) -> String {
    // Front matter starts on the line after the opening delimiter
    match err.location() {
        Some(loc) => format!("front matter line {}", loc.line() + 1),
        None => "front matter".to_string(),
    }
}

fn scalar(field: &str, value: Value) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ParseError::validation(
            field,
            format!("expected a string, found {}", kind_of(&other)),
        )),
    }
}

fn flag(field: &str, value: Value) -> Result<bool, ParseError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ParseError::validation(
            field,
            format!("expected true or false, found {}", kind_of(&other)),
        )),
    }
}

fn list(field: &str, value: Value) -> Result<Vec<String>, ParseError> {
    serde_yaml::from_value::<StringList>(value)
        .map(|l| l.0)
        .map_err(|e| ParseError::validation(field, e.to_string()))
}

fn date(field: &str, value: Value) -> Result<NaiveDate, ParseError> {
    let s = match value {
        Value::String(s) => s,
        other => {
            return Err(ParseError::validation(
                field,
                format!("expected an ISO-8601 date, found {}", kind_of(&other)),
            ))
        }
    };
    parse_date_string(&s).ok_or_else(|| {
        ParseError::validation(field, format!("`{}` is not a valid ISO-8601 date", s))
    })
}

/// Parse a date string, keeping only the calendar date of date-times
pub fn parse_date_string(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // RFC 3339 / ISO 8601 with offset
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
