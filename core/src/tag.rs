//! Field tag parsing.
//!
//! A tag is a string of space-separated `key:"value"` pairs attached to a
//! field when it is described, e.g.
//! `name:"first-name" usage:"your first name" aliases:"fn f"`. Values are
//! double-quoted and may contain backslash escapes.
//!
//! Recognized keys:
//!
//! | Key           | Meaning                                          |
//! |---------------|--------------------------------------------------|
//! | `name`        | flag or subcommand name override                 |
//! | `usage`       | help text                                        |
//! | `hidden`      | lenient boolean, hides the flag from help        |
//! | `aliases`     | space-separated alternative names                |
//! | `envVars`     | comma-separated environment variable names       |
//! | `defaultText` | help-display override for the default            |
//! | `required`    | lenient boolean, flag must be provided           |
//! | `decli`       | compact form `<name>,<flag>...,usage:<text>`     |
//!
//! Keys set explicitly take precedence over the compact `decli` form.

use crate::naming::{parse_bool_lenient, split_list};

/// Raw `key:"value"` pairs in tag order.
///
/// # Examples
///
/// ```
/// use decli_core::Tag;
///
/// let tag = Tag::parse(r#"name:"some-int" usage:"an \"int\"""#).unwrap();
/// assert_eq!(tag.get("name"), Some("some-int"));
/// assert_eq!(tag.get("usage"), Some(r#"an "int""#));
/// assert_eq!(tag.get("hidden"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    entries: Vec<(String, String)>,
}

impl Tag {
    /// Parses a raw tag string. An empty or blank string is an empty tag.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut entries = Vec::new();
        let mut rest = raw.trim_start();

        while !rest.is_empty() {
            let key_len = rest
                .find(|c: char| c == ':' || c == '"' || c.is_whitespace() || c.is_control())
                .unwrap_or(rest.len());
            if key_len == 0 {
                return Err(format!("expected a key at {rest:?}"));
            }
            let (key, after_key) = rest.split_at(key_len);
            let Some(quoted) = after_key.strip_prefix(":\"") else {
                return Err(format!("key {key:?} must be followed by :\"value\""));
            };

            let (value, after_value) = unquote(quoted)
                .ok_or_else(|| format!("unterminated value for key {key:?}"))?;
            if after_value
                .chars()
                .next()
                .is_some_and(|c| !c.is_whitespace())
            {
                return Err(format!("missing space after value of key {key:?}"));
            }

            entries.push((key.to_string(), value));
            rest = after_value.trim_start();
        }

        Ok(Self { entries })
    }

    /// Returns the value of the first entry with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` when the tag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads a quoted value up to the closing quote, resolving escapes.
/// Returns the value and the remainder after the closing quote.
fn unquote(src: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = src.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Some((value, &src[index + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            other => value.push(other),
        }
    }
    None
}

/// Field attributes resolved from a tag.
///
/// # Examples
///
/// ```
/// use decli_core::FieldTag;
///
/// let tag = FieldTag::parse(r#"name:"age" aliases:"a" envVars:"AGE, YEARS""#).unwrap();
/// assert_eq!(tag.name.as_deref(), Some("age"));
/// assert_eq!(tag.aliases, vec!["a"]);
/// assert_eq!(tag.env_vars, vec!["AGE", "YEARS"]);
///
/// let compact = FieldTag::parse(r#"decli:"port,required,usage:port to listen on, tcp""#).unwrap();
/// assert_eq!(compact.name.as_deref(), Some("port"));
/// assert!(compact.required);
/// assert_eq!(compact.usage.as_deref(), Some("port to listen on, tcp"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    pub name: Option<String>,
    pub usage: Option<String>,
    pub hidden: bool,
    pub aliases: Vec<String>,
    pub env_vars: Vec<String>,
    pub default_text: Option<String>,
    pub required: bool,
}

impl FieldTag {
    /// Parses a raw tag string and resolves the recognized keys.
    pub fn parse(raw: &str) -> Result<Self, String> {
        Self::from_tag(&Tag::parse(raw)?)
    }

    /// Resolves the recognized keys of a parsed tag.
    pub fn from_tag(tag: &Tag) -> Result<Self, String> {
        let mut field = match tag.get("decli") {
            Some(compact) => Self::from_compact(compact)?,
            None => Self::default(),
        };

        if let Some(name) = non_empty(tag.get("name")) {
            field.name = Some(name);
        }
        if let Some(usage) = non_empty(tag.get("usage")) {
            field.usage = Some(usage);
        }
        if let Some(hidden) = tag.get("hidden") {
            field.hidden = parse_bool_lenient(hidden);
        }
        if let Some(aliases) = tag.get("aliases") {
            field.aliases = split_list(aliases, ' ');
        }
        if let Some(env_vars) = tag.get("envVars") {
            field.env_vars = split_list(env_vars, ',');
        }
        if let Some(default_text) = non_empty(tag.get("defaultText")) {
            field.default_text = Some(default_text);
        }
        if let Some(required) = tag.get("required") {
            field.required = parse_bool_lenient(required);
        }

        Ok(field)
    }

    /// Parses the compact `<name>,<flag>...,usage:<text>` form. Everything
    /// after `usage:` is help text, commas included.
    fn from_compact(src: &str) -> Result<Self, String> {
        let mut field = Self::default();
        let mut rest = src;
        let mut first = true;

        while !rest.is_empty() {
            if let Some(usage) = rest.trim_start().strip_prefix("usage:") {
                field.usage = non_empty(Some(usage));
                break;
            }

            let (segment, tail) = rest.split_once(',').unwrap_or((rest, ""));
            rest = tail;
            let segment = segment.trim();

            if first {
                first = false;
                field.name = non_empty(Some(segment));
                continue;
            }
            match segment {
                "" => {}
                "required" => field.required = true,
                "hidden" => field.hidden = true,
                other => return Err(format!("unknown decli flag {other:?}")),
            }
        }

        Ok(field)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
