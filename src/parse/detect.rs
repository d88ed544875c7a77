use crate::config::DetectionRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionConfidence {
    High,
    Medium,
    Fallback,
}

impl DetectionConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedProfile {
    pub label: String,
    pub confidence: DetectionConfidence,
    pub matched_patterns: usize,
}

/// Scores each rule's keyword set against the whole document and returns the
/// highest-scoring non-zero candidate; ties keep table order. Two or more
/// matching patterns rate `high`, one rates `medium`, zero everywhere falls
/// back to the configured default.
pub fn detect_profile(text: &str, rules: &[DetectionRule], fallback: &str) -> DetectedProfile {
    let haystack = text.to_ascii_lowercase();

    let mut best: Option<(&DetectionRule, usize)> = None;
    for rule in rules {
        let matched = rule
            .patterns
            .iter()
            .filter(|pattern| haystack.contains(&pattern.to_ascii_lowercase()))
            .count();
        if matched == 0 {
            continue;
        }

        let better = match best {
            Some((_, best_matched)) => matched > best_matched,
            None => true,
        };
        if better {
            best = Some((rule, matched));
        }
    }

    match best {
        Some((rule, matched)) => DetectedProfile {
            label: rule.label.clone(),
            confidence: if matched >= 2 {
                DetectionConfidence::High
            } else {
                DetectionConfidence::Medium
            },
            matched_patterns: matched,
        },
        None => DetectedProfile {
            label: fallback.to_string(),
            confidence: DetectionConfidence::Fallback,
            matched_patterns: 0,
        },
    }
}
