//! Node string encoding and normalization.
//!
//! Keys are namespaced by `.`. Reserved first segments (`meta`, `prefix`,
//! `suffix`, `weight`, `group`) denote structured nodes whose remaining
//! segments carry the payload. A literal `.` inside a payload segment
//! (notably meta keys/values and prefix/suffix text) is escaped with `\`.
//! All prefix-string branching lives here; the rest of the engine works
//! with [`NodeKind`] variants.

use crate::context::ContextSet;
use crate::error::{CoreError, Result};
use crate::node::{Node, NodeKind};

/// The segment separator.
pub const SEPARATOR: char = '.';

/// The escape character for separators inside payload segments.
pub const ESCAPE: char = '\\';

/// Parse a raw node string into a permanent, context-free node.
///
/// The raw string is the node's key; value defaults to true. Callers
/// wanting contexts, negation, or expiry go through the builders.
pub fn from_string(raw: &str) -> Result<Node> {
    Node::new(raw, true, ContextSet::empty(), None)
}

/// Derive the structured kind of a key.
pub fn classify(key: &str) -> Result<NodeKind> {
    if key.is_empty() {
        return Err(CoreError::EmptyKey);
    }

    // Regex keys are opaque: their bodies are not segment-structured.
    if key.starts_with("r=") || key.starts_with("R=") {
        return Ok(NodeKind::Permission);
    }

    let segments = split_unescaped(key)?;

    match segments[0].as_str() {
        "meta" => match segments.len() {
            3 => Ok(NodeKind::Meta {
                key: segments[1].clone(),
                value: segments[2].clone(),
            }),
            2 => Err(CoreError::MissingValue {
                kind: "meta",
                raw: key.to_string(),
            }),
            _ => Err(CoreError::MalformedNode(format!(
                "meta node must have exactly 3 segments: {}",
                key
            ))),
        },
        "prefix" | "suffix" => {
            if segments.len() != 3 {
                return Err(CoreError::MalformedNode(format!(
                    "{} node must have exactly 3 segments: {}",
                    segments[0], key
                )));
            }
            let priority: i64 =
                segments[1]
                    .parse()
                    .map_err(|_| CoreError::InvalidPriority {
                        kind: if segments[0] == "prefix" {
                            "prefix"
                        } else {
                            "suffix"
                        },
                        value: segments[1].clone(),
                    })?;
            let text = segments[2].clone();
            if segments[0] == "prefix" {
                Ok(NodeKind::Prefix { priority, text })
            } else {
                Ok(NodeKind::Suffix { priority, text })
            }
        }
        "weight" => {
            if segments.len() != 2 {
                return Err(CoreError::MalformedNode(format!(
                    "weight node must have exactly 2 segments: {}",
                    key
                )));
            }
            let weight: i64 = segments[1]
                .parse()
                .map_err(|_| CoreError::InvalidWeight(segments[1].clone()))?;
            Ok(NodeKind::Weight(weight))
        }
        "group" => match segments.len() {
            2 => Ok(NodeKind::GroupRef {
                name: segments[1].clone(),
                priority: None,
            }),
            3 => {
                let priority: i64 =
                    segments[2]
                        .parse()
                        .map_err(|_| CoreError::InvalidPriority {
                            kind: "group",
                            value: segments[2].clone(),
                        })?;
                Ok(NodeKind::GroupRef {
                    name: segments[1].clone(),
                    priority: Some(priority),
                })
            }
            _ => Err(CoreError::MalformedNode(format!(
                "group node must have 2 or 3 segments: {}",
                key
            ))),
        },
        _ => Ok(NodeKind::Permission),
    }
}

/// Split a key on unescaped separators, unescaping each segment.
///
/// Errors on a trailing escape character or an empty segment.
pub fn split_unescaped(key: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = key.chars();

    while let Some(c) = chars.next() {
        if c == ESCAPE {
            match chars.next() {
                Some(next) => current.push(next),
                None => return Err(CoreError::DanglingEscape),
            }
        } else if c == SEPARATOR {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    segments.push(current);

    for (i, s) in segments.iter().enumerate() {
        if s.is_empty() {
            return Err(CoreError::EmptySegment(i));
        }
    }
    Ok(segments)
}

/// Escape separators and escape characters in a payload segment.
pub fn escape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == SEPARATOR || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Encode a meta node key.
pub fn encode_meta(key: &str, value: &str) -> String {
    format!("meta.{}.{}", escape(key), escape(value))
}

/// Encode a prefix node key.
pub fn encode_prefix(priority: i64, text: &str) -> String {
    format!("prefix.{}.{}", priority, escape(text))
}

/// Encode a suffix node key.
pub fn encode_suffix(priority: i64, text: &str) -> String {
    format!("suffix.{}.{}", priority, escape(text))
}

/// Encode a weight node key.
pub fn encode_weight(weight: i64) -> String {
    format!("weight.{}", weight)
}

/// Encode a group inheritance reference key.
pub fn encode_group(name: &str, priority: Option<i64>) -> String {
    match priority {
        Some(p) => format!("group.{}.{}", escape(name), p),
        None => format!("group.{}", escape(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        assert_eq!(
            split_unescaped("a.b.c").unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_split_escaped_separator() {
        assert_eq!(
            split_unescaped("meta.rank\\.color.red").unwrap(),
            vec!["meta".to_string(), "rank.color".to_string(), "red".to_string()]
        );
    }

    #[test]
    fn test_split_escaped_escape() {
        assert_eq!(
            split_unescaped("meta.back\\\\slash.v").unwrap(),
            vec!["meta".to_string(), "back\\slash".to_string(), "v".to_string()]
        );
    }

    #[test]
    fn test_split_errors() {
        assert_eq!(split_unescaped("a.b\\"), Err(CoreError::DanglingEscape));
        assert_eq!(split_unescaped("a..b"), Err(CoreError::EmptySegment(1)));
        assert_eq!(split_unescaped(".a"), Err(CoreError::EmptySegment(0)));
    }

    #[test]
    fn test_escape_roundtrip() {
        let raw = "key.with.dots\\and\\slashes";
        let escaped = escape(raw);
        let parts = split_unescaped(&escaped).unwrap();
        assert_eq!(parts, vec![raw.to_string()]);
    }

    #[test]
    fn test_meta_roundtrip_with_separator_in_value() {
        let key = encode_meta("website", "https://example.org");
        let kind = classify(&key).unwrap();
        assert_eq!(
            kind,
            NodeKind::Meta {
                key: "website".to_string(),
                value: "https://example.org".to_string()
            }
        );
    }

    #[test]
    fn test_classify_permission() {
        assert_eq!(classify("perms.fly").unwrap(), NodeKind::Permission);
        assert_eq!(classify("*").unwrap(), NodeKind::Permission);
    }

    #[test]
    fn test_classify_regex_key_is_opaque() {
        // A regex body may contain sequences that would be invalid as
        // segments; it must not be segment-validated.
        assert_eq!(classify("r=perms\\..+").unwrap(), NodeKind::Permission);
        assert_eq!(classify("R=a..b").unwrap(), NodeKind::Permission);
    }

    #[test]
    fn test_classify_group() {
        assert_eq!(
            classify("group.admin").unwrap(),
            NodeKind::GroupRef {
                name: "admin".to_string(),
                priority: None
            }
        );
        assert_eq!(
            classify("group.admin.10").unwrap(),
            NodeKind::GroupRef {
                name: "admin".to_string(),
                priority: Some(10)
            }
        );
        assert!(classify("group.admin.notanumber").is_err());
    }

    #[test]
    fn test_classify_prefix_suffix_weight() {
        assert_eq!(
            classify("prefix.100.[Admin]").unwrap(),
            NodeKind::Prefix {
                priority: 100,
                text: "[Admin]".to_string()
            }
        );
        assert_eq!(
            classify("suffix.5.!").unwrap(),
            NodeKind::Suffix {
                priority: 5,
                text: "!".to_string()
            }
        );
        assert_eq!(classify("weight.50").unwrap(), NodeKind::Weight(50));
        assert!(classify("prefix.abc.[Admin]").is_err());
        assert!(classify("weight.heavy").is_err());
    }

    #[test]
    fn test_classify_malformed_meta() {
        assert!(matches!(
            classify("meta.onlykey"),
            Err(CoreError::MissingValue { kind: "meta", .. })
        ));
        assert!(classify("meta.a.b.c").is_err());
    }

    #[test]
    fn test_from_string_defaults() {
        let n = from_string("perms.fly").unwrap();
        assert!(n.value());
        assert!(n.contexts().is_empty());
        assert_eq!(n.expiry(), None);
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(classify(""), Err(CoreError::EmptyKey));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn escape_then_split_roundtrips(s in "[a-zA-Z0-9.\\\\]{1,32}") {
                let escaped = escape(&s);
                let parts = split_unescaped(&escaped).unwrap();
                prop_assert_eq!(parts, vec![s]);
            }

            #[test]
            fn meta_encode_classify_roundtrips(
                k in "[a-z.]{1,16}",
                v in "[a-z0-9./]{1,16}",
            ) {
                let key = encode_meta(&k, &v);
                prop_assert_eq!(
                    classify(&key).unwrap(),
                    NodeKind::Meta { key: k, value: v }
                );
            }
        }
    }
}
