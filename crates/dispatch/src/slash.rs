//! Slash-prefixed alternate entry syntax (`/HELP`, `/find keys`), an
//! alternate surface onto the same three-stage dispatcher for callers
//! that need a visually distinct "this is a command" marker (e.g. a
//! chat-style frontend).

use std::collections::HashSet;

/// A slash command split into its first token and the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSlashCommand {
    pub body: String,
    pub first_token: String,
    pub rest: String,
}

impl ParsedSlashCommand {
    /// The body re-assembled as ordinary dispatcher input.
    pub fn normalized_command(&self) -> String {
        format!("{} {}", self.first_token, self.rest).trim().to_string()
    }
}

/// Parse `text` as a slash command. Returns `None` if it doesn't start
/// with `/`.
pub fn parse(text: &str) -> Option<ParsedSlashCommand> {
    let body = text.strip_prefix('/')?.trim();
    if body.is_empty() {
        return Some(ParsedSlashCommand {
            body: String::new(),
            first_token: String::new(),
            rest: String::new(),
        });
    }

    let mut parts = body.splitn(2, char::is_whitespace);
    let first_token = parts.next().unwrap_or("").to_uppercase();
    let rest = parts.next().unwrap_or("").trim().to_string();

    Some(ParsedSlashCommand {
        body: body.to_string(),
        first_token,
        rest,
    })
}

/// Resolve a parsed slash command to ordinary dispatcher input, but only
/// when the leading token is present in `allowlist` — callers use this to
/// restrict the slash surface to a subset of the full catalog (e.g. a
/// guest-trust device may only reach `/help` and `/status`).
pub fn resolve_allowlisted(parsed: &ParsedSlashCommand, allowlist: &[String]) -> Option<String> {
    let normalized: HashSet<String> = allowlist
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if normalized.contains(&parsed.first_token) {
        Some(parsed.normalized_command())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_slash_input_is_not_parsed() {
        assert!(parse("HELP").is_none());
    }

    #[test]
    fn parses_first_token_and_rest() {
        let parsed = parse("/find keys in vault").unwrap();
        assert_eq!(parsed.first_token, "FIND");
        assert_eq!(parsed.rest, "keys in vault");
        assert_eq!(parsed.normalized_command(), "FIND keys in vault");
    }

    #[test]
    fn bare_slash_parses_to_empty() {
        let parsed = parse("/").unwrap();
        assert_eq!(parsed.first_token, "");
    }

    #[test]
    fn resolve_rejects_tokens_outside_allowlist() {
        let parsed = parse("/destroy everything").unwrap();
        let allowlist = vec!["HELP".to_string(), "STATUS".to_string()];
        assert!(resolve_allowlisted(&parsed, &allowlist).is_none());
    }

    #[test]
    fn resolve_accepts_allowlisted_tokens() {
        let parsed = parse("/status").unwrap();
        let allowlist = vec!["help".to_string(), "status".to_string()];
        assert_eq!(resolve_allowlisted(&parsed, &allowlist), Some("STATUS".to_string()));
    }
}
