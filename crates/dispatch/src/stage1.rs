//! Stage 1 — canonical command match (§4.1).

use crate::catalog::{normalize_command_tokens, CANONICAL_COMMANDS};
use crate::levenshtein;

/// The outcome of Stage 1 matching.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage1Outcome {
    /// Exact match: dispatch straight to `ucode`.
    Exact { command: String },
    /// Fuzzy match with confidence in `[0.80, 0.95)`: caller must confirm.
    FuzzyConfirm { command: String, confidence: f64 },
    /// Fuzzy match with confidence `>= 0.95`: dispatch straight to `ucode`.
    FuzzyConfident { command: String, confidence: f64 },
    /// No canonical or fuzzy match; fall through to Stage 2.
    NoMatch,
}

/// Run Stage 1 against raw input. `max_distance` bounds the fuzzy search
/// (configured via `DispatchConfig::fuzzy_max_distance`, default 2).
pub fn match_command(input: &str, max_distance: usize) -> Stage1Outcome {
    let tokens = normalize_command_tokens(input);
    let Some(leading) = tokens.first() else {
        return Stage1Outcome::NoMatch;
    };

    if CANONICAL_COMMANDS.contains(&leading.as_str()) {
        return Stage1Outcome::Exact {
            command: leading.clone(),
        };
    }

    // Reject inputs that look like shell invocations rather than typos of
    // a uCODE command: too short, or containing non-alphabetic bytes.
    if leading.len() < 4 || !leading.chars().all(|c| c.is_ascii_alphabetic()) {
        return Stage1Outcome::NoMatch;
    }

    let mut candidates: Vec<(&str, usize)> = CANONICAL_COMMANDS
        .iter()
        .map(|&cmd| (cmd, levenshtein::distance(leading, cmd)))
        .filter(|&(_, dist)| dist <= max_distance)
        .collect();

    if candidates.is_empty() {
        return Stage1Outcome::NoMatch;
    }

    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    let (command, distance) = candidates[0];
    let confidence = (1.0 - distance as f64 * 0.1).max(0.80);

    if confidence >= 0.95 {
        Stage1Outcome::FuzzyConfident {
            command: command.to_string(),
            confidence,
        }
    } else {
        Stage1Outcome::FuzzyConfirm {
            command: command.to_string(),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_canonical_match() {
        assert_eq!(
            match_command("HELP", 2),
            Stage1Outcome::Exact {
                command: "HELP".into()
            }
        );
    }

    #[test]
    fn exact_match_is_case_insensitive_on_input() {
        assert_eq!(
            match_command("help", 2),
            Stage1Outcome::Exact {
                command: "HELP".into()
            }
        );
    }

    #[test]
    fn single_substitution_typo_falls_in_confirm_band() {
        // HELF differs from HELP by one substitution: distance 1, confidence 0.9.
        match match_command("HELF", 2) {
            Stage1Outcome::FuzzyConfirm { command, confidence } => {
                assert_eq!(command, "HELP");
                assert!((confidence - 0.9).abs() < 1e-9);
            }
            other => panic!("expected FuzzyConfirm, got {other:?}"),
        }
    }

    #[test]
    fn short_tokens_are_not_fuzzy_matched() {
        assert_eq!(match_command("ls", 2), Stage1Outcome::NoMatch);
    }

    #[test]
    fn non_alphabetic_tokens_are_not_fuzzy_matched() {
        assert_eq!(match_command("go-to-room", 2), Stage1Outcome::NoMatch);
    }

    #[test]
    fn distance_beyond_two_falls_through() {
        assert_eq!(match_command("XYZQWERTY", 2), Stage1Outcome::NoMatch);
    }

    #[test]
    fn alias_rewrites_before_matching() {
        assert_eq!(
            match_command("search for keys", 2),
            Stage1Outcome::Exact {
                command: "FIND".into()
            }
        );
    }
}
