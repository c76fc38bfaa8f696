//! Stage 3 — skill inference (§4.1). Always dispatches; never fails.

use regex_lite::Regex;
use std::sync::LazyLock;

struct SkillPatterns {
    skill: &'static str,
    patterns: &'static [&'static str],
}

static SKILL_PATTERNS: &[SkillPatterns] = &[
    SkillPatterns {
        skill: "device",
        patterns: &[
            r"\b(devices|device|machines|machine|computers|computer|nodes|node|hosts|host)\b",
            r"\b(list|status|add|update|health)\s+(devices|device|machines|machine)",
        ],
    },
    SkillPatterns {
        skill: "script",
        patterns: &[
            r"\b(script|scripts|flow|rule)\b",
            r"\b(run|execute|test)\s+(script|scripts|flow)\b",
            r"\bautomation\s+script\b",
        ],
    },
    SkillPatterns {
        skill: "vault",
        patterns: &[
            r"\b(vault|secret|secrets|token|tokens|apikey|api-key|key|keys)\b",
            r"\b(get|set|store|retrieve)\s+(secret|token|password)",
        ],
    },
    SkillPatterns {
        skill: "workspace",
        patterns: &[
            r"\b(workspace|project|environment)\b",
            r"\b(switch|change|create|list)\s+(workspace|project)",
        ],
    },
    SkillPatterns {
        skill: "wizops",
        patterns: &[
            r"\b(wizard|task|tasks|workflow|workflows)\b",
            r"\bautomation\s+task\b",
            r"\b(start|stop|run|execute|automate)\s+(wizard|task)",
        ],
    },
    SkillPatterns {
        skill: "network",
        patterns: &[
            r"\b(network|connection|host|endpoint)\b",
            r"\b(scan|connect|check)\s+(network|connection|host)",
        ],
    },
    SkillPatterns {
        skill: "user",
        patterns: &[
            r"\b(user|account|profile|identity)\b",
            r"\b(add|remove|manage|create)\s+(user|account)",
        ],
    },
    SkillPatterns {
        skill: "help",
        patterns: &[
            r"\b(help|guide|tutorial|documentation|reference)\b",
            r"\b(what|how|where|when|why)\s+(help|guide)",
        ],
    },
];

static COMPILED: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    SKILL_PATTERNS
        .iter()
        .map(|sp| {
            let compiled = sp
                .patterns
                .iter()
                .map(|p| Regex::new(p).expect("skill pattern is valid regex"))
                .collect();
            (sp.skill, compiled)
        })
        .collect()
});

/// The neutral fallback skill: no pattern matched, or the match was tied
/// across more than one skill.
pub const ASK: &str = "ask";

/// Score `input` against every skill's pattern family and return the
/// unique top scorer, or [`ASK`] if there's no match or a tie.
pub fn infer_skill(input: &str) -> &'static str {
    let lower = input.to_lowercase();
    let mut best_score = 0usize;
    let mut winners: Vec<&'static str> = Vec::new();

    for (skill, patterns) in COMPILED.iter() {
        let score = patterns.iter().filter(|re| re.is_match(&lower)).count();
        if score == 0 {
            continue;
        }
        match score.cmp(&best_score) {
            std::cmp::Ordering::Greater => {
                best_score = score;
                winners.clear();
                winners.push(skill);
            }
            std::cmp::Ordering::Equal => winners.push(skill),
            std::cmp::Ordering::Less => {}
        }
    }

    match winners.as_slice() {
        [only] => only,
        _ => ASK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_listing_query() {
        assert_eq!(infer_skill("list all devices"), "device");
    }

    #[test]
    fn vault_secret_query() {
        assert_eq!(infer_skill("get my api-key"), "vault");
    }

    #[test]
    fn help_query() {
        assert_eq!(infer_skill("how do I use this, help?"), "help");
    }

    #[test]
    fn no_match_falls_back_to_ask() {
        assert_eq!(infer_skill("the weather is nice today"), ASK);
    }

    #[test]
    fn tie_falls_back_to_ask() {
        // "user" pattern and "network" pattern both match once each.
        assert_eq!(infer_skill("check this user and host endpoint"), ASK);
    }
}
