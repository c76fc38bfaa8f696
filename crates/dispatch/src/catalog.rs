//! The canonical command catalog and alias table for Stage 1 matching.

use std::collections::HashMap;
use std::sync::LazyLock;

/// The closed set of canonical command tokens the Wizard recognizes at
/// Stage 1, uppercase.
pub const CANONICAL_COMMANDS: &[&str] = &[
    "MAP", "ANCHOR", "GRID", "PANEL", "GOTO", "FIND", "TELL", "HELP", "STATUS", "BAG", "GRAB",
    "SPAWN", "SAVE", "LOAD", "HEALTH", "VERIFY", "REPAIR", "REBOOT", "SETUP", "UID", "TOKEN",
    "GHOST", "SONIC", "MUSIC", "DEV", "LOGS", "SCHEDULER", "SCRIPT", "THEME", "MODE", "SKIN",
    "VIEWPORT", "DRAW", "USER", "PLAY", "RULE", "DESTROY", "UNDO", "MIGRATE", "SEED", "BACKUP",
    "RESTORE", "TIDY", "CLEAN", "COMPOST", "NPC", "SEND", "CONFIG", "WIZARD", "EMPIRE", "BINDER",
    "PLACE", "STORY", "RUN", "READ", "FILE", "LIBRARY", "UCODE",
];

fn is_canonical(token: &str) -> bool {
    CANONICAL_COMMANDS.contains(&token)
}

/// Subcommand aliases that rewrite onto a canonical command, with an
/// optional parameter injected as the first argument after rewriting
/// (e.g. `NEW report.md` becomes `FILE NEW report.md`).
static SUBCOMMAND_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("PAT", "DRAW"),
        ("PATTERN", "DRAW"),
        ("DATA", "RUN"),
        ("STAT", "STATUS"),
        ("STATE", "STATUS"),
        ("SEARCH", "FIND"),
        ("EDIT", "FILE"),
        ("NEW", "FILE"),
        ("UCLI", "UCODE"),
        ("RESTART", "REBOOT"),
        ("SCHEDULE", "SCHEDULER"),
        ("TALK", "SEND"),
    ])
});

/// Aliases whose own token becomes an injected first argument after
/// rewriting onto the canonical command (`NEW` and `EDIT` both target
/// `FILE` but need to pass themselves through as the sub-action).
static ALIAS_PREFIX_PARAMS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HashMap::from([("NEW", "NEW"), ("EDIT", "EDIT")]));

/// Tokenize on whitespace, upper-case the leading token, apply alias
/// rewrite with prefix-parameter injection. Returns the rewritten token
/// list; the first element is always either a canonical command or the
/// original (unrecognized) leading token.
pub fn normalize_command_tokens(input: &str) -> Vec<String> {
    let raw_tokens: Vec<&str> = input.split_whitespace().collect();
    if raw_tokens.is_empty() {
        return Vec::new();
    }

    let leading = raw_tokens[0].to_uppercase();
    let rest = &raw_tokens[1..];

    if let Some(&canonical) = SUBCOMMAND_ALIASES.get(leading.as_str()) {
        let mut tokens = vec![canonical.to_string()];
        if let Some(&param) = ALIAS_PREFIX_PARAMS.get(leading.as_str()) {
            tokens.push(param.to_string());
        }
        tokens.extend(rest.iter().map(|s| s.to_string()));
        return tokens;
    }

    let mut tokens = vec![leading];
    tokens.extend(rest.iter().map(|s| s.to_string()));
    tokens
}

/// The rewritten leading token, and whether it's a canonical command
/// after rewrite (an exact match for Stage 1).
pub fn leading_command(input: &str) -> Option<(String, bool)> {
    let tokens = normalize_command_tokens(input);
    let leading = tokens.first()?.clone();
    let exact = is_canonical(&leading);
    Some((leading, exact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_is_canonical() {
        assert!(is_canonical("HELP"));
    }

    #[test]
    fn alias_rewrites_to_canonical() {
        let tokens = normalize_command_tokens("search for keys");
        assert_eq!(tokens[0], "FIND");
        assert_eq!(tokens[1], "for");
    }

    #[test]
    fn new_alias_injects_prefix_param() {
        let tokens = normalize_command_tokens("new report.md");
        assert_eq!(tokens, vec!["FILE", "NEW", "report.md"]);
    }

    #[test]
    fn unrecognized_token_passes_through_uppercased() {
        let (leading, exact) = leading_command("ls -la").unwrap();
        assert_eq!(leading, "LS");
        assert!(!exact);
    }

    #[test]
    fn empty_input_has_no_leading_command() {
        assert!(leading_command("").is_none());
        assert!(leading_command("   ").is_none());
    }
}
