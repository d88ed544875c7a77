use regex::Regex;

/// A Given/When/Then triple. `explicit` is true only when the author wrote
/// the three keywords verbatim; synthesized triples come from the
/// `" when "` / `" then "` split fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GherkinTriple {
    pub given: String,
    pub when: String,
    pub then: String,
    pub explicit: bool,
}

/// Extracts a Gherkin triple from one criterion or acceptance bullet.
///
/// Explicit `Given ... When ... Then ...` phrasing wins. Otherwise the text
/// is split on the substrings `" when "` and `" then "` when both appear and
/// "when" precedes "then"; any other shape produces no triple.
pub fn extract_gherkin(text: &str) -> Option<GherkinTriple> {
    let explicit_pattern =
        Regex::new(r"(?is)\bgiven\b(?P<given>.*?)\bwhen\b(?P<when>.*?)\bthen\b(?P<then>.*)")
            .expect("gherkin pattern is static");

    if let Some(captures) = explicit_pattern.captures(text) {
        let given = clean_clause(&captures["given"]);
        let when = clean_clause(&captures["when"]);
        let then = clean_clause(&captures["then"]);
        if !when.is_empty() && !then.is_empty() {
            return Some(GherkinTriple {
                given,
                when,
                then,
                explicit: true,
            });
        }
    }

    let lower = text.to_ascii_lowercase();
    let when_at = lower.find(" when ")?;
    let then_at = lower.find(" then ")?;
    if when_at >= then_at {
        return None;
    }

    let given = clean_clause(&text[..when_at]);
    let when = clean_clause(&text[when_at + " when ".len()..then_at]);
    let then = clean_clause(&text[then_at + " then ".len()..]);
    if when.is_empty() || then.is_empty() {
        return None;
    }

    Some(GherkinTriple {
        given,
        when,
        then,
        explicit: false,
    })
}

fn clean_clause(value: &str) -> String {
    value
        .trim()
        .trim_start_matches([',', ':', '-'])
        .trim_end_matches([',', '.', ';'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::extract_gherkin;

    #[test]
    fn explicit_phrasing_is_marked_explicit() {
        let triple = extract_gherkin(
            "Given a signed-in analyst, when the report is requested, then a JSON file is written",
        )
        .expect("explicit triple should parse");
        assert!(triple.explicit);
        assert_eq!(triple.given, "a signed-in analyst");
        assert_eq!(triple.when, "the report is requested");
        assert_eq!(triple.then, "a JSON file is written");
    }

    #[test]
    fn keyword_split_fallback_synthesizes_a_triple() {
        let triple = extract_gherkin("The parser runs when input arrives then entities are emitted")
            .expect("fallback triple should parse");
        assert!(!triple.explicit);
        assert_eq!(triple.given, "The parser runs");
        assert_eq!(triple.when, "input arrives");
        assert_eq!(triple.then, "entities are emitted");
    }

    #[test]
    fn then_before_when_produces_no_triple() {
        assert!(extract_gherkin("entities emit then stop when input ends").is_none());
    }

    #[test]
    fn text_without_keywords_produces_no_triple() {
        assert!(extract_gherkin("The system validates all artifacts").is_none());
    }
}
