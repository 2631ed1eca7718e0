//! Struct tag parsing.
//!
//! Tags use Go's conventional syntax, `key:"value" key2:"value2"`. Two keys
//! are consulted: the serialization key (`json` by default) carrying
//! `name,option,...` and the hint key (`ts` by default) carrying
//! `nullable` / `optional`. Everything is folded into a closed set of
//! [`Directive`]s at build time.

use thiserror::Error;

/// One parsed tag directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Serialization name override.
    Rename(String),
    /// `json:"-"`: the field never serializes.
    Skip,
    /// `omitempty` / `omitzero`: the key may be absent.
    OmitEmpty,
    /// `,string`: numbers and booleans travel as JSON strings.
    AsString,
    /// `ts:"nullable"`
    Nullable,
    /// `ts:"optional"`
    Optional,
}

/// The directives of one field, in tag order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives(Vec<Directive>);

impl Directives {
    pub fn rename(&self) -> Option<&str> {
        self.0.iter().find_map(|d| match d {
            Directive::Rename(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn has(&self, directive: &Directive) -> bool {
        self.0.contains(directive)
    }

    pub fn is_skipped(&self) -> bool {
        self.has(&Directive::Skip)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("bad syntax at byte {offset}: expected `key:\"value\"`")]
    Syntax { offset: usize },

    #[error("unterminated quoted value for key `{key}`")]
    UnterminatedQuote { key: String },

    #[error("invalid escape sequence in value for key `{key}`")]
    BadEscape { key: String },

    #[error("`{name}` is not a valid serialization name")]
    InvalidName { name: String },

    #[error("unknown `{key}` hint `{hint}`: expected `nullable` or `optional`")]
    UnknownHint { key: String, hint: String },
}

/// Split a raw struct tag into `(key, value)` pairs.
pub fn parse_struct_tag(tag: &str) -> Result<Vec<(String, String)>, TagError> {
    let bytes = tag.as_bytes();
    let mut pairs = Vec::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && bytes[pos] == b' ' {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Ok(pairs);
        }

        let key_start = pos;
        while pos < bytes.len()
            && bytes[pos] > b' '
            && bytes[pos] != b':'
            && bytes[pos] != b'"'
            && bytes[pos] != 0x7f
        {
            pos += 1;
        }
        if pos == key_start || pos + 1 >= bytes.len() || bytes[pos] != b':' || bytes[pos + 1] != b'"'
        {
            return Err(TagError::Syntax { offset: pos });
        }
        let key = &tag[key_start..pos];
        pos += 2;

        let value_start = pos;
        while pos < bytes.len() && bytes[pos] != b'"' {
            if bytes[pos] == b'\\' {
                pos += 1;
            }
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(TagError::UnterminatedQuote {
                key: key.to_string(),
            });
        }
        let value = unquote(&tag[value_start..pos]).ok_or_else(|| TagError::BadEscape {
            key: key.to_string(),
        })?;
        pairs.push((key.to_string(), value));
        pos += 1;
    }
}

fn unquote(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

/// Whether Go's JSON encoder accepts `name` as a key override.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            "!#$%&()*+-./:;<=>?@[]^_{|}~ ".contains(c) || c.is_alphanumeric()
        })
}

/// Fold a raw tag into directives.
pub fn parse_field_tag(tag: &str, tag_key: &str, hint_key: &str) -> Result<Directives, TagError> {
    let mut directives = Vec::new();

    for (key, value) in parse_struct_tag(tag)? {
        if key == tag_key {
            if value == "-" {
                directives.push(Directive::Skip);
                continue;
            }
            let mut parts = value.split(',');
            let name = parts.next().unwrap_or_default();
            if !name.is_empty() {
                if !is_valid_name(name) {
                    return Err(TagError::InvalidName {
                        name: name.to_string(),
                    });
                }
                directives.push(Directive::Rename(name.to_string()));
            }
            for option in parts {
                match option {
                    "omitempty" | "omitzero" => directives.push(Directive::OmitEmpty),
                    "string" => directives.push(Directive::AsString),
                    _ => {}
                }
            }
        } else if key == hint_key {
            for hint in value.split(',').map(str::trim).filter(|h| !h.is_empty()) {
                match hint {
                    "nullable" => directives.push(Directive::Nullable),
                    "optional" => directives.push(Directive::Optional),
                    _ => {
                        return Err(TagError::UnknownHint {
                            key,
                            hint: hint.to_string(),
                        });
                    }
                }
            }
        }
    }

    Ok(Directives(directives))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parse(tag: &str) -> Result<Directives, TagError> {
        parse_field_tag(tag, "json", "ts")
    }

    #[test]
    fn test_parse_struct_tag_pairs() {
        let pairs = parse_struct_tag(r#"json:"id,omitempty" db:"user_id"  ts:"nullable""#).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("json".to_string(), "id,omitempty".to_string()),
                ("db".to_string(), "user_id".to_string()),
                ("ts".to_string(), "nullable".to_string()),
            ]
        );
        assert!(parse_struct_tag("").unwrap().is_empty());
    }

    #[test]
    fn test_rename_and_options() {
        let d = parse(r#"json:"userID,omitempty,string""#).unwrap();
        assert_eq!(d.rename(), Some("userID"));
        assert!(d.has(&Directive::OmitEmpty));
        assert!(d.has(&Directive::AsString));
        assert!(!d.is_skipped());
    }

    #[test]
    fn test_empty_name_keeps_options() {
        let d = parse(r#"json:",omitzero""#).unwrap();
        assert_eq!(d.rename(), None);
        assert!(d.has(&Directive::OmitEmpty));
    }

    #[test]
    fn test_skip_and_dash_name() {
        assert!(parse(r#"json:"-""#).unwrap().is_skipped());

        let dash = parse(r#"json:"-,""#).unwrap();
        assert!(!dash.is_skipped());
        assert_eq!(dash.rename(), Some("-"));
    }

    #[test]
    fn test_hint_key() {
        let d = parse(r#"json:"tags" ts:"nullable,optional""#).unwrap();
        assert!(d.has(&Directive::Nullable));
        assert!(d.has(&Directive::Optional));

        let err = parse(r#"ts:"maybe""#).unwrap_err();
        assert!(matches!(err, TagError::UnknownHint { .. }));
    }

    #[test]
    fn test_other_keys_ignored() {
        let d = parse(r#"yaml:"name" xml:"n""#).unwrap();
        assert_eq!(d, Directives::default());
    }

    #[test]
    fn test_custom_keys() {
        let d = parse_field_tag(r#"json:"a" msgpack:"b""#, "msgpack", "ts").unwrap();
        assert_eq!(d.rename(), Some("b"));
    }

    #[test]
    fn test_malformed_tags() {
        assert!(matches!(parse("json"), Err(TagError::Syntax { .. })));
        assert!(matches!(parse("json:id"), Err(TagError::Syntax { .. })));
        assert!(matches!(
            parse(r#"json:"id"#),
            Err(TagError::UnterminatedQuote { .. })
        ));
        assert!(matches!(
            parse(r#"json:"a\qb""#),
            Err(TagError::BadEscape { .. })
        ));
        assert!(matches!(
            parse(r#"json:"bad\"name""#),
            Err(TagError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_escaped_quote_in_other_key() {
        let pairs = parse_struct_tag(r#"doc:"say \"hi\"" json:"x""#).unwrap();
        assert_eq!(pairs[0].1, "say \"hi\"");
        assert_eq!(pairs[1].1, "x");
    }
}
