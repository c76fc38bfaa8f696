//! The Task Classifier (§4.5) — turns a free-form prompt plus caller
//! context into a [`TaskClassification`]. Intent scoring follows the same
//! shape as `wizard_dispatch::stage3`'s skill inference: a static table of
//! per-category regex families, scored by match count, highest scorer wins.

use regex_lite::Regex;
use std::sync::LazyLock;
use wizard_core::classification::{Intent, Privacy, SizeBucket, TaskClassification};

const SMALL_BREAKPOINT: u32 = 2_000;
const LARGE_BREAKPOINT: u32 = 8_000;

struct IntentPatterns {
    intent: Intent,
    patterns: &'static [&'static str],
}

static INTENT_PATTERNS: &[IntentPatterns] = &[
    IntentPatterns {
        intent: Intent::Test,
        patterns: &[
            r"\b(test|tests|testing|unit test|integration test)\b",
            r"\b(assert|assertion|coverage|mock|fixture)\b",
            r"\bwrite\s+(a\s+)?test",
        ],
    },
    IntentPatterns {
        intent: Intent::Docs,
        patterns: &[
            r"\b(document|documentation|docstring|readme|changelog)\b",
            r"\bexplain\s+(how|what|why)",
            r"\b(comment|annotate)\s+(this|the)\s+code\b",
        ],
    },
    IntentPatterns {
        intent: Intent::Design,
        patterns: &[
            r"\b(architecture|design|diagram|schema|rfc|proposal)\b",
            r"\b(should we|what's the best way to|tradeoffs?)\b",
            r"\bhigh.level\s+(design|plan)\b",
        ],
    },
    IntentPatterns {
        intent: Intent::Ops,
        patterns: &[
            r"\b(deploy|deployment|infra|infrastructure|provision)\b",
            r"\b(pipeline|ci/cd|kubernetes|k8s|docker|terraform)\b",
            r"\brestart\s+(the\s+)?(server|service)\b",
        ],
    },
    IntentPatterns {
        intent: Intent::Code,
        patterns: &[
            r"\b(implement|refactor|bug|fix|function|class|variable)\b",
            r"\b(compile|debug|stack trace|exception)\b",
            r"\bwrite\s+(a\s+)?(function|method|class)\b",
        ],
    },
];

static COMPILED_INTENTS: LazyLock<Vec<(Intent, Vec<Regex>)>> = LazyLock::new(|| {
    INTENT_PATTERNS
        .iter()
        .map(|ip| {
            let compiled = ip
                .patterns
                .iter()
                .map(|p| Regex::new(p).expect("intent pattern is valid regex"))
                .collect();
            (ip.intent, compiled)
        })
        .collect()
});

static PRIVATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(ssn|social security number|passport number|credit card number)\b",
        r"\b(private key|-----BEGIN)\b",
        r"\bconfidential\b",
        r"\b(medical record|patient data|health record)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("private-data pattern is valid regex"))
    .collect()
});

static INTERNAL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(internal|proprietary|our codebase|company|org chart|workspace)\b")
        .expect("internal-keyword pattern is valid regex")
});

static URGENT_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(urgent|asap|emergency|critical|immediately|right now)\b")
        .expect("urgency pattern is valid regex")
});

static TOOLING_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(read file|write file|run command|execute|shell|curl|download|upload|filesystem)\b")
        .expect("tooling pattern is valid regex")
});

static OFFLINE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(offline|no network|no internet|airplane mode|disconnected)\b")
        .expect("offline pattern is valid regex")
});

static BURST_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(burst|spike|surge|flood of requests|high volume|lots of requests)\b")
        .expect("burst pattern is valid regex")
});

/// Everything the classifier needs, already lifted out of the completion
/// request so this module has no dependency on the gateway's HTTP layer.
pub struct ClassifyInput<'a> {
    pub task_id: String,
    pub workspace: String,
    pub prompt: &'a str,
    pub explicit_privacy: Option<Privacy>,
    pub urgency_hint: bool,
}

pub fn classify(input: &ClassifyInput<'_>) -> TaskClassification {
    let lower = input.prompt.to_lowercase();
    let mut reasons = Vec::new();

    let (intent, intent_confidence) = classify_intent(&lower, &mut reasons);
    let estimated_tokens = (input.prompt.len() as u32) / 4;
    let size = size_bucket(estimated_tokens);
    let (privacy, privacy_confidence) = classify_privacy(&lower, input.explicit_privacy, &mut reasons);

    let urgency = input.urgency_hint || URGENT_KEYWORDS.is_match(&lower);
    let mut tags = Vec::new();
    if size == SizeBucket::Large {
        tags.push("long_context".to_string());
    }
    if urgency {
        tags.push("urgent".to_string());
    }
    if TOOLING_KEYWORDS.is_match(&lower) {
        tags.push("tooling_heavy".to_string());
    }
    if OFFLINE_KEYWORDS.is_match(&lower) {
        tags.push("offline_required".to_string());
    }
    if BURST_KEYWORDS.is_match(&lower) {
        tags.push("burst".to_string());
    }

    TaskClassification {
        task_id: input.task_id.clone(),
        workspace: input.workspace.clone(),
        intent,
        privacy,
        size,
        urgency,
        estimated_tokens,
        confidence: (intent_confidence + privacy_confidence) / 2.0,
        tags,
        reasons,
    }
}

fn classify_intent(lower: &str, reasons: &mut Vec<String>) -> (Intent, f64) {
    let mut best_score = 0usize;
    let mut best_intent = Intent::Code;

    for (intent, patterns) in COMPILED_INTENTS.iter() {
        let score = patterns.iter().filter(|re| re.is_match(lower)).count();
        if score > best_score {
            best_score = score;
            best_intent = *intent;
        }
    }

    if best_score == 0 {
        reasons.push("no intent pattern matched, defaulting to code".to_string());
        (Intent::Code, 0.3)
    } else {
        reasons.push(format!("intent {best_intent} matched {best_score} pattern(s)", best_intent = display_intent(best_intent)));
        (best_intent, (0.5 + 0.1 * best_score as f64).min(0.95))
    }
}

fn classify_privacy(lower: &str, explicit: Option<Privacy>, reasons: &mut Vec<String>) -> (Privacy, f64) {
    if let Some(privacy) = explicit {
        reasons.push("caller supplied an explicit privacy level".to_string());
        return (privacy, 1.0);
    }

    if PRIVATE_PATTERNS.iter().any(|re| re.is_match(lower)) {
        reasons.push("private-data pattern detected in prompt".to_string());
        return (Privacy::Private, 0.9);
    }

    if INTERNAL_KEYWORDS.is_match(lower) {
        reasons.push("workspace-internal keyword detected".to_string());
        return (Privacy::Internal, 0.7);
    }

    reasons.push("no privacy signal found, defaulting to internal".to_string());
    (Privacy::Internal, 0.5)
}

fn size_bucket(estimated_tokens: u32) -> SizeBucket {
    if estimated_tokens < SMALL_BREAKPOINT {
        SizeBucket::Small
    } else if estimated_tokens < LARGE_BREAKPOINT {
        SizeBucket::Medium
    } else {
        SizeBucket::Large
    }
}

fn display_intent(intent: Intent) -> &'static str {
    match intent {
        Intent::Code => "code",
        Intent::Test => "test",
        Intent::Docs => "docs",
        Intent::Design => "design",
        Intent::Ops => "ops",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(prompt: &str) -> ClassifyInput<'_> {
        ClassifyInput {
            task_id: "t1".to_string(),
            workspace: "core".to_string(),
            prompt,
            explicit_privacy: None,
            urgency_hint: false,
        }
    }

    #[test]
    fn no_match_defaults_to_code_with_low_confidence() {
        let classification = classify(&input("what a nice day"));
        assert_eq!(classification.intent, Intent::Code);
        assert!(classification.reasons.iter().any(|r| r.contains("defaulting to code")));
    }

    #[test]
    fn test_keywords_win_over_code_keywords() {
        let classification = classify(&input("write a unit test for this function with good coverage"));
        assert_eq!(classification.intent, Intent::Test);
    }

    #[test]
    fn design_keywords_detected() {
        let classification = classify(&input("what's the best way to design this architecture?"));
        assert_eq!(classification.intent, Intent::Design);
    }

    #[test]
    fn explicit_privacy_is_honored_verbatim() {
        let mut req = input("hello");
        req.explicit_privacy = Some(Privacy::Public);
        let classification = classify(&req);
        assert_eq!(classification.privacy, Privacy::Public);
        assert_eq!(classification.confidence.is_nan(), false);
    }

    #[test]
    fn private_pattern_detected_without_explicit_privacy() {
        let classification = classify(&input("here is my social security number: 123-45-6789"));
        assert_eq!(classification.privacy, Privacy::Private);
    }

    #[test]
    fn internal_keyword_without_private_pattern() {
        let classification = classify(&input("summarize our internal roadmap"));
        assert_eq!(classification.privacy, Privacy::Internal);
    }

    #[test]
    fn size_bucket_breakpoints() {
        assert_eq!(size_bucket(100), SizeBucket::Small);
        assert_eq!(size_bucket(5_000), SizeBucket::Medium);
        assert_eq!(size_bucket(10_000), SizeBucket::Large);
    }

    #[test]
    fn tags_cover_urgency_tooling_and_offline() {
        let classification = classify(&input("this is urgent, please run command to download the file, we are offline"));
        assert!(classification.tags.contains(&"urgent".to_string()));
        assert!(classification.tags.contains(&"tooling_heavy".to_string()));
        assert!(classification.tags.contains(&"offline_required".to_string()));
    }

    #[test]
    fn burst_keyword_tags_the_task() {
        let classification = classify(&input("we're seeing a burst of similar requests, please handle this one too"));
        assert!(classification.tags.contains(&"burst".to_string()));
    }
}
