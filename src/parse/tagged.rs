use regex::Regex;

/// A requirement-style bullet `- <PREFIX>-<digits>: <text>`. `ordinal` is the
/// 1-based position among the matches, not the numeric part of the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedItem {
    pub id: String,
    pub text: String,
    pub ordinal: usize,
}

/// Extracts tagged bullets for one ID family from a section body, in document
/// order. Lines that do not match are skipped; duplicates are kept so the
/// validator can report them.
pub fn extract_tagged_items(body: &str, prefix: &str) -> Vec<TaggedItem> {
    let pattern = Regex::new(&format!(
        r"^\s*-\s*(?P<id>{prefix}-\d+)\s*:\s*(?P<text>.+)$"
    ))
    .expect("tagged item pattern is static");

    let mut items = Vec::<TaggedItem>::new();
    for line in body.lines() {
        let Some(captures) = pattern.captures(line) else {
            continue;
        };

        items.push(TaggedItem {
            id: captures["id"].to_string(),
            text: captures["text"].trim().to_string(),
            ordinal: items.len() + 1,
        });
    }

    items
}

/// All IDs of one family occurring anywhere in the text (trace lines, prose),
/// de-duplicated in first-seen order.
pub fn extract_family_ids(text: &str, prefix: &str) -> Vec<String> {
    let pattern =
        Regex::new(&format!(r"\b{prefix}-\d+\b")).expect("family id pattern is static");

    let mut seen = Vec::<String>::new();
    for found in pattern.find_iter(text) {
        let id = found.as_str().to_string();
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// Plain `- ` bullets of a section body with the marker stripped, for
/// free-text collections (actors, edge cases, security notes).
pub fn extract_bullets(body: &str) -> Vec<String> {
    let mut bullets = Vec::<String>::new();
    for line in body.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("- ") {
            let value = rest.trim();
            if !value.is_empty() {
                bullets.push(value.to_string());
            }
        }
    }
    bullets
}
