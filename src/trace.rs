use std::collections::BTreeSet;

use crate::parse::{AcceptanceCriterion, Requirement, TaggedItem, extract_family_ids};

/// Minimum token length considered by the affinity heuristic.
const AFFINITY_MIN_TOKEN_LEN: usize = 4;
/// At most this many criteria are linked to one rule on an affinity tie.
const AFFINITY_MAX_SELECTED: usize = 2;

/// IDs referenced by one `- Trace:` line, grouped by family and
/// de-duplicated; declaration order within the line is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceRefs {
    pub fr_ids: Vec<String>,
    pub ac_ids: Vec<String>,
    pub us_ids: Vec<String>,
}

/// Parses one trace bullet (`- Trace: FR-1, AC-1`). Returns `None` when the
/// line is not a trace line; unknown tokens inside a trace line are ignored.
pub fn parse_trace_line(line: &str) -> Option<TraceRefs> {
    let trimmed = line.trim();
    let rest = trimmed
        .strip_prefix("- Trace:")
        .or_else(|| trimmed.strip_prefix("Trace:"))?;

    Some(TraceRefs {
        fr_ids: extract_family_ids(rest, "FR"),
        ac_ids: extract_family_ids(rest, "AC"),
        us_ids: extract_family_ids(rest, "US"),
    })
}

/// Lower-cased words of length >= 4, stopwords excluded. The stopword set is
/// injected configuration, not module state.
pub fn tokenize(text: &str, stopwords: &[String]) -> BTreeSet<String> {
    text.split(|ch: char| !ch.is_ascii_alphanumeric())
        .map(|word| word.to_ascii_lowercase())
        .filter(|word| word.len() >= AFFINITY_MIN_TOKEN_LEN)
        .filter(|word| !stopwords.iter().any(|stop| stop == word))
        .collect()
}

/// Token-overlap affinity between a rule and a criterion text.
pub fn affinity_score(left: &str, right: &str, stopwords: &[String]) -> usize {
    let left_tokens = tokenize(left, stopwords);
    let right_tokens = tokenize(right, stopwords);
    left_tokens.intersection(&right_tokens).count()
}

/// Criteria selected for a rule when no explicit trace exists: all criteria
/// tied at the maximum positive score (capped at two), else the criterion
/// sharing the rule's ordinal position, else the last criterion.
pub fn select_criteria_for_rule<'a>(
    rule: &Requirement,
    criteria: &'a [AcceptanceCriterion],
    stopwords: &[String],
) -> Vec<&'a AcceptanceCriterion> {
    if criteria.is_empty() {
        return Vec::new();
    }

    let scores = criteria
        .iter()
        .map(|criterion| affinity_score(&rule.text, &criterion.text, stopwords))
        .collect::<Vec<usize>>();
    let max_score = scores.iter().copied().max().unwrap_or(0);

    if max_score > 0 {
        return criteria
            .iter()
            .zip(scores.iter())
            .filter(|(_, score)| **score == max_score)
            .map(|(criterion, _)| criterion)
            .take(AFFINITY_MAX_SELECTED)
            .collect();
    }

    let positional = criteria
        .iter()
        .find(|criterion| criterion.ordinal == rule.ordinal);
    match positional {
        Some(criterion) => vec![criterion],
        None => criteria.last().map(|criterion| vec![criterion]).unwrap_or_default(),
    }
}

/// IDs declared more than once, each reported once, in first-seen order.
pub fn find_duplicate_ids(items: &[TaggedItem]) -> Vec<String> {
    let mut seen = BTreeSet::<&str>::new();
    let mut duplicates = Vec::<String>::new();

    for item in items {
        if !seen.insert(item.id.as_str()) && !duplicates.contains(&item.id) {
            duplicates.push(item.id.clone());
        }
    }

    duplicates
}
