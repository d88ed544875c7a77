use regex::Regex;

/// Descriptor for the meaningful-content predicate. One rule instance is
/// shared by every section and persona check instead of per-call-site
/// heuristics; thresholds vary per section, the pattern sets rarely do.
#[derive(Debug, Clone)]
pub struct ContentRule {
    pub min_length: usize,
    pub placeholder_patterns: Vec<String>,
    pub banned_phrases: Vec<String>,
}

impl ContentRule {
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length,
            placeholder_patterns: default_placeholder_patterns(),
            banned_phrases: default_banned_phrases(),
        }
    }
}

fn default_placeholder_patterns() -> Vec<String> {
    [
        "<context>",
        "<action>",
        "<expected>",
        "<actor>",
        "<role>",
        "<verifiable rule>",
        "<benefit>",
    ]
    .iter()
    .map(|value| value.to_string())
    .collect()
}

fn default_banned_phrases() -> Vec<String> {
    ["lorem ipsum", "to be defined", "fill me in"]
        .iter()
        .map(|value| value.to_string())
        .collect()
}

/// True when a bullet carries real content: leading bullet/ordinal/ID tokens
/// are stripped, then the remainder must clear the length threshold, must not
/// be a lone bracketed placeholder, must not contain placeholder fragments or
/// banned phrases, and must keep enough text once bracket spans are removed.
pub fn is_meaningful(line: &str, rule: &ContentRule) -> bool {
    let core = strip_item_prefix(line);
    let trimmed = core.trim();

    if trimmed.chars().count() < rule.min_length {
        return false;
    }

    if is_single_bracket_token(trimmed) {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if rule
        .placeholder_patterns
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
    {
        return false;
    }
    if rule
        .banned_phrases
        .iter()
        .any(|phrase| lower.contains(&phrase.to_lowercase()))
    {
        return false;
    }

    let had_brackets = trimmed.contains('[') || trimmed.contains('<');
    if had_brackets {
        let residual = remove_bracket_spans(trimmed);
        let residual_len = residual
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .count();
        if residual_len < rule.min_length {
            return false;
        }
    }

    true
}

/// Drops leading bullet markers, ordinals (`1.` / `1)`) and requirement-ID
/// tokens (`FR-1:`, `UI-REF-2:`) from a line.
pub fn strip_item_prefix(line: &str) -> String {
    let id_token = Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:-[A-Za-z0-9]+)*-\d+$")
        .expect("id token pattern is static");

    let mut rest = line.trim();
    loop {
        let before = rest;

        if let Some(stripped) = rest.strip_prefix("- ").or_else(|| rest.strip_prefix("* ")) {
            rest = stripped.trim_start();
        }

        let digits = rest.chars().take_while(|ch| ch.is_ascii_digit()).count();
        if digits > 0 {
            let after = &rest[digits..];
            if let Some(stripped) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
                rest = stripped.trim_start();
            }
        }

        if let Some((token, after)) = rest.split_once(':') {
            let token = token.trim_end();
            if token.len() <= 16 && id_token.is_match(token) {
                rest = after.trim_start();
            }
        }

        if rest == before {
            break;
        }
    }

    rest.to_string()
}

fn is_single_bracket_token(value: &str) -> bool {
    let square = value.starts_with('[')
        && value.ends_with(']')
        && !value[1..value.len() - 1].contains([']', '[']);
    let angle = value.starts_with('<')
        && value.ends_with('>')
        && !value[1..value.len() - 1].contains(['>', '<']);
    square || angle
}

fn remove_bracket_spans(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut depth = 0usize;
    for ch in value.chars() {
        match ch {
            '[' | '<' => depth += 1,
            ']' | '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{ContentRule, is_meaningful, strip_item_prefix};

    #[test]
    fn prefixes_are_stripped_before_measuring() {
        assert_eq!(
            strip_item_prefix("- FR-1: Parse tagged bullets"),
            "Parse tagged bullets"
        );
        assert_eq!(strip_item_prefix("- 2. Second item"), "Second item");
        assert_eq!(
            strip_item_prefix("- UI-REF-3: src/views/login.html"),
            "src/views/login.html"
        );
    }

    #[test]
    fn real_content_passes() {
        let rule = ContentRule::with_min_length(8);
        assert!(is_meaningful(
            "- FR-1: Parse tagged requirement bullets from every section",
            &rule
        ));
    }

    #[test]
    fn short_remainders_fail() {
        let rule = ContentRule::with_min_length(8);
        assert!(!is_meaningful("- FR-1: ok", &rule));
    }

    #[test]
    fn lone_bracket_tokens_fail() {
        let rule = ContentRule::with_min_length(6);
        assert!(!is_meaningful("- [component]", &rule));
        assert!(!is_meaningful("- <verifiable rule>", &rule));
    }

    #[test]
    fn placeholder_fragments_fail() {
        let rule = ContentRule::with_min_length(6);
        assert!(!is_meaningful(
            "- FR-1: The system shall <action> for every <actor>",
            &rule
        ));
    }

    #[test]
    fn bracket_heavy_lines_with_thin_remainder_fail() {
        let rule = ContentRule::with_min_length(8);
        assert!(!is_meaningful("- [first] and [second]", &rule));
        assert!(is_meaningful(
            "- [submit button] posts the login form to the session endpoint",
            &rule
        ));
    }

    #[test]
    fn banned_phrases_fail() {
        let rule = ContentRule::with_min_length(6);
        assert!(!is_meaningful("- Lorem ipsum dolor sit amet", &rule));
    }
}
