//! Stage 2 — shell validation (§4.1).

use wizard_core::ShellPayload;

/// Characters that immediately disqualify an input from shell dispatch,
/// regardless of allow/block lists — these enable command chaining or
/// substitution.
const REJECTED_CHARS: &[char] = &[';', '&', '|', '`', '$', '<', '>'];

/// Additional reject patterns beyond the single-character check: a
/// recursive force-delete, a redirect into a device node, or command
/// substitution syntax that slipped past the character check above
/// (defense in depth — `$(` is also caught by `$`, kept for clarity).
fn matches_dangerous_pattern(input: &str) -> Option<&'static str> {
    let lower = input.to_lowercase();
    if lower.contains("rm -rf") || lower.contains("rm  -rf") {
        return Some("rm -rf pattern");
    }
    if lower.contains("> /dev/") || lower.contains(">/dev/") {
        return Some("redirect to /dev");
    }
    if input.contains("$(") {
        return Some("command substitution");
    }
    if input.contains('`') {
        return Some("backtick substitution");
    }
    None
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage2Outcome {
    /// Passed validation; produced a shell payload ready to dispatch.
    Valid(ShellPayload),
    /// Failed validation; falls through to Stage 3. Carries a reason for
    /// the debug trace.
    Rejected { reason: String },
    /// Shell dispatch is disabled in config; skipped entirely.
    Disabled,
}

fn extract_first_token(input: &str) -> String {
    let raw = input.split_whitespace().next().unwrap_or("");
    let stripped = raw.strip_prefix("./").unwrap_or(raw);
    stripped.to_lowercase()
}

/// Validate `input` as a shell command.
pub fn validate(
    input: &str,
    shell_enabled: bool,
    blocklist: &[String],
    allowlist: &[String],
    read_only_allowlist: &[String],
) -> Stage2Outcome {
    if !shell_enabled {
        return Stage2Outcome::Disabled;
    }

    if input.chars().any(|c| REJECTED_CHARS.contains(&c)) {
        return Stage2Outcome::Rejected {
            reason: "contains a shell metacharacter".into(),
        };
    }

    if let Some(reason) = matches_dangerous_pattern(input) {
        return Stage2Outcome::Rejected {
            reason: reason.into(),
        };
    }

    let token = extract_first_token(input);
    if token.is_empty() {
        return Stage2Outcome::Rejected {
            reason: "empty command".into(),
        };
    }

    if blocklist.iter().any(|b| b == &token) {
        return Stage2Outcome::Rejected {
            reason: format!("'{token}' is block-listed"),
        };
    }

    if !allowlist.is_empty() && !allowlist.iter().any(|a| a == &token) {
        return Stage2Outcome::Rejected {
            reason: format!("'{token}' is not in the configured allow-list"),
        };
    }

    let args: Vec<String> = input
        .split_whitespace()
        .skip(1)
        .map(|s| s.to_string())
        .collect();
    let requires_confirmation = !read_only_allowlist.iter().any(|r| r == &token);

    Stage2Outcome::Valid(ShellPayload {
        command: token.clone(),
        args,
        raw: input.to_string(),
        validation_reason: "passed shell validation".into(),
        requires_confirmation,
        confirmation_reason: if requires_confirmation {
            Some(format!("'{token}' is not read-only"))
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocklist() -> Vec<String> {
        vec!["rm".into(), "sudo".into(), "dd".into()]
    }
    fn read_only() -> Vec<String> {
        vec!["ls".into(), "cat".into(), "grep".into()]
    }

    #[test]
    fn disabled_shell_skips_validation() {
        assert_eq!(
            validate("ls -la", false, &blocklist(), &[], &read_only()),
            Stage2Outcome::Disabled
        );
    }

    #[test]
    fn semicolon_is_rejected_regardless_of_allowlist() {
        let outcome = validate("ls; rm -rf /", true, &blocklist(), &[], &read_only());
        assert!(matches!(outcome, Stage2Outcome::Rejected { .. }));
    }

    #[test]
    fn backtick_is_rejected() {
        let outcome = validate("echo `whoami`", true, &blocklist(), &[], &read_only());
        assert!(matches!(outcome, Stage2Outcome::Rejected { .. }));
    }

    #[test]
    fn rm_rf_pattern_is_rejected() {
        let outcome = validate("rm -rf /", true, &blocklist(), &[], &read_only());
        assert!(matches!(outcome, Stage2Outcome::Rejected { .. }));
    }

    #[test]
    fn readonly_command_does_not_require_confirmation() {
        let outcome = validate("ls -la", true, &blocklist(), &[], &read_only());
        match outcome {
            Stage2Outcome::Valid(payload) => {
                assert_eq!(payload.command, "ls");
                assert!(!payload.requires_confirmation);
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn non_readonly_command_requires_confirmation() {
        let outcome = validate("mkdir scratch", true, &blocklist(), &[], &read_only());
        match outcome {
            Stage2Outcome::Valid(payload) => {
                assert_eq!(payload.command, "mkdir");
                assert!(payload.requires_confirmation);
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn blocklisted_token_is_rejected() {
        let outcome = validate("sudo reboot", true, &blocklist(), &[], &read_only());
        assert!(matches!(outcome, Stage2Outcome::Rejected { .. }));
    }

    #[test]
    fn strict_allowlist_rejects_tokens_outside_it() {
        let allowlist = vec!["ls".to_string()];
        let outcome = validate("cat secrets.txt", true, &blocklist(), &allowlist, &read_only());
        assert!(matches!(outcome, Stage2Outcome::Rejected { .. }));
    }
}
