//! YAML frontmatter handling for issue files.
//!
//! Reads go through a `serde_yaml::Mapping` so unrecognized keys survive
//! untouched; trailer sections are appended to the raw file text so the
//! rest of the document round-trips byte-for-byte.

use crate::error::{BacklogError, Result};
use serde_yaml::Mapping;

const DELIM: &str = "---";

/// Split a document into its raw frontmatter block (without delimiters)
/// and the body. A document with no frontmatter returns `(None, text)`.
pub fn split(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("---\n") else {
        return (None, text);
    };
    // The closing delimiter must sit on its own line.
    if let Some(idx) = rest.find("\n---\n") {
        return (Some(&rest[..idx + 1]), &rest[idx + 1 + DELIM.len() + 1..]);
    }
    if let Some(yaml) = rest.strip_suffix("\n---") {
        return (Some(yaml), "");
    }
    (None, text)
}

/// Parse a document into a key-order-preserving mapping and its body.
pub fn parse(text: &str, path: &str) -> Result<(Mapping, String)> {
    match split(text) {
        (Some(yaml), body) => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(yaml).map_err(|e| BacklogError::MalformedIssue {
                    path: path.to_string(),
                    reason: format!("unparsable frontmatter: {e}"),
                })?;
            let mapping = match value {
                serde_yaml::Value::Mapping(m) => m,
                serde_yaml::Value::Null => Mapping::new(),
                _ => {
                    return Err(BacklogError::MalformedIssue {
                        path: path.to_string(),
                        reason: "frontmatter is not a mapping".to_string(),
                    })
                }
            };
            Ok((mapping, body.to_string()))
        }
        (None, body) => Ok((Mapping::new(), body.to_string())),
    }
}

/// Render a mapping + body back into a document. An empty mapping renders
/// the body alone, so files that never had frontmatter don't grow one.
pub fn render(mapping: &Mapping, body: &str) -> Result<String> {
    if mapping.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(mapping)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

/// Append a `## <heading>` trailer section to the raw document text.
/// Existing content is untouched; exactly one blank line separates the
/// new section from what came before.
pub fn append_section(text: &str, heading: &str, content: &str) -> String {
    let mut out = String::with_capacity(text.len() + heading.len() + content.len() + 8);
    out.push_str(text);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
    out.push_str("## ");
    out.push_str(heading);
    out.push_str("\n\n");
    out.push_str(content.trim_end());
    out.push('\n');
    out
}

/// Fetch a string field from a mapping.
pub fn get_str<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a str> {
    mapping.get(key).and_then(|v| v.as_str())
}

/// Fetch an unsigned integer field from a mapping.
pub fn get_u64(mapping: &Mapping, key: &str) -> Option<u64> {
    mapping.get(key).and_then(|v| v.as_u64())
}

/// Insert or replace a field, keeping the position of an existing key.
pub fn set(mapping: &mut Mapping, key: &str, value: serde_yaml::Value) {
    mapping.insert(serde_yaml::Value::String(key.to_string()), value);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\ngithub_issue: 17\ndiscovered_by: audit\n---\n# BUG-001: Login fails\n\nBody text.\n";

    #[test]
    fn split_with_frontmatter() {
        let (fm, body) = split(DOC);
        assert_eq!(fm, Some("github_issue: 17\ndiscovered_by: audit\n"));
        assert_eq!(body, "# BUG-001: Login fails\n\nBody text.\n");
    }

    #[test]
    fn split_without_frontmatter() {
        let (fm, body) = split("# BUG-001: x\n");
        assert!(fm.is_none());
        assert_eq!(body, "# BUG-001: x\n");
    }

    #[test]
    fn split_unterminated_frontmatter_is_body() {
        let text = "---\nkey: value\nno closing delimiter\n";
        let (fm, body) = split(text);
        assert!(fm.is_none());
        assert_eq!(body, text);
    }

    #[test]
    fn parse_preserves_unknown_keys() {
        let (mapping, _) = parse(DOC, "test.md").unwrap();
        assert_eq!(get_u64(&mapping, "github_issue"), Some(17));
        assert_eq!(get_str(&mapping, "discovered_by"), Some("audit"));
    }

    #[test]
    fn parse_rejects_bad_yaml() {
        let text = "---\n: [unbalanced\n---\nbody\n";
        assert!(parse(text, "bad.md").is_err());
    }

    #[test]
    fn parse_rejects_non_mapping_frontmatter() {
        let text = "---\n- a\n- b\n---\nbody\n";
        match parse(text, "list.md") {
            Err(BacklogError::MalformedIssue { reason, .. }) => {
                assert!(reason.contains("not a mapping"));
            }
            other => panic!("expected MalformedIssue, got {other:?}"),
        }
    }

    #[test]
    fn render_roundtrip_keeps_key_order() {
        let (mapping, body) = parse(DOC, "test.md").unwrap();
        let rendered = render(&mapping, &body).unwrap();
        assert_eq!(rendered, DOC);
    }

    #[test]
    fn render_empty_mapping_is_body_only() {
        let out = render(&Mapping::new(), "# hi\n").unwrap();
        assert_eq!(out, "# hi\n");
    }

    #[test]
    fn append_section_preserves_prefix_bytes() {
        let out = append_section(DOC, "Resolution", "Fixed in abc123.");
        assert!(out.starts_with(DOC));
        assert!(out.ends_with("## Resolution\n\nFixed in abc123.\n"));
    }

    #[test]
    fn append_section_handles_missing_trailing_newline() {
        let out = append_section("# BUG-001: x\n\nbody", "Verification Notes", "ran tests");
        assert_eq!(out, "# BUG-001: x\n\nbody\n\n## Verification Notes\n\nran tests\n");
    }

    #[test]
    fn set_updates_in_place() {
        let (mut mapping, _) = parse(DOC, "test.md").unwrap();
        set(&mut mapping, "github_issue", serde_yaml::Value::from(99));
        assert_eq!(get_u64(&mapping, "github_issue"), Some(99));
        // Position preserved: github_issue still serializes first.
        let yaml = serde_yaml::to_string(&mapping).unwrap();
        assert!(yaml.starts_with("github_issue: 99"));
    }
}
