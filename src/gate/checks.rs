use regex::Regex;

use super::meaningful::{ContentRule, is_meaningful};
use super::{DocStatus, GateContext, Issue, IssueCategory};
use crate::coverage::{DownstreamEntry, build_coverage_rows};
use crate::parse::sections::normalize_heading;
use crate::parse::{
    Section, TaggedItem, TestCase, UserStory, extract_bullets, find_section, split_all_headings,
};
use crate::trace::find_duplicate_ids;

/// Marker that blocks approval: requirements must be attributable to an
/// explicit human source.
pub const AI_INFERRED_MARKER: &str = "AI-INFERRED";

const GENERIC_ACTORS: &[&str] = &["user", "users", "someone", "anyone", "somebody", "actor", "role"];

/// A required spec section: alias list, display label, and the minimum
/// meaningful length for its bullets.
pub struct SectionRequirement {
    pub aliases: &'static [&'static str],
    pub label: &'static str,
    pub min_length: usize,
}

pub fn spec_section_requirements() -> Vec<SectionRequirement> {
    use crate::parse::document::{
        ACCEPTANCE_CRITERIA_ALIASES, ACTORS_ALIASES, EDGE_CASES_ALIASES,
        FUNCTIONAL_RULES_ALIASES, SECURITY_ALIASES,
    };

    vec![
        SectionRequirement {
            aliases: FUNCTIONAL_RULES_ALIASES,
            label: "Functional Rules",
            min_length: 8,
        },
        SectionRequirement {
            aliases: ACCEPTANCE_CRITERIA_ALIASES,
            label: "Acceptance Criteria",
            min_length: 8,
        },
        SectionRequirement {
            aliases: ACTORS_ALIASES,
            label: "Actors",
            min_length: 6,
        },
        SectionRequirement {
            aliases: EDGE_CASES_ALIASES,
            label: "Edge Cases",
            min_length: 6,
        },
        SectionRequirement {
            aliases: SECURITY_ALIASES,
            label: "Security Considerations",
            min_length: 6,
        },
    ]
}

pub fn check_status_marker(text: &str, expected: DocStatus, issues: &mut Vec<Issue>) {
    let marker = expected.marker_line();
    let found = text.lines().any(|line| line.trim() == marker);
    if !found {
        issues.push(Issue::new(
            IssueCategory::Structure,
            format!("Missing status marker line: {marker}"),
        ));
    }
}

pub fn check_spec_sections(sections: &[Section], issues: &mut Vec<Issue>) {
    for requirement in spec_section_requirements() {
        let Some(section) = find_section(sections, requirement.aliases) else {
            issues.push(Issue::new(
                IssueCategory::Structure,
                format!("Missing section: {}", requirement.label),
            ));
            continue;
        };

        let rule = ContentRule::with_min_length(requirement.min_length);
        let bullets = extract_bullets(&section.body);
        let meaningful = bullets.iter().any(|bullet| is_meaningful(bullet, &rule));
        if !meaningful {
            issues.push(Issue::new(
                IssueCategory::Structure,
                format!(
                    "Section '{}' has no meaningful content",
                    requirement.label
                ),
            ));
        }
    }
}

/// Count-based completeness proxy: enough criteria to plausibly cover the
/// rules. Deliberately not a per-rule semantic check.
pub fn check_fr_ac_ratio(fr_count: usize, ac_count: usize, issues: &mut Vec<Issue>) {
    if ac_count < fr_count {
        issues.push(Issue::new(
            IssueCategory::Structure,
            format!(
                "Coverage gap: {fr_count} Functional Rule(s) but only {ac_count} Acceptance Criterion(a)"
            ),
        ));
    }
}

pub fn check_duplicate_declarations(
    family: &str,
    items: &[TaggedItem],
    issues: &mut Vec<Issue>,
) {
    for id in find_duplicate_ids(items) {
        let declarations = items.iter().filter(|item| item.id == id).count();
        issues.push(Issue::new(
            IssueCategory::Structure,
            format!("Duplicate {family} id declared {declarations} times: {id}"),
        ));
    }
}

pub fn check_placeholder_tokens(text: &str, issues: &mut Vec<Issue>) {
    let pattern = Regex::new(r"(?i)\b(todo|tbd)\b").expect("placeholder token pattern is static");

    let mut occurrences = 0usize;
    let mut tokens = Vec::<String>::new();
    for found in pattern.find_iter(text) {
        occurrences += 1;
        let token = found.as_str().to_ascii_uppercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    if occurrences > 0 {
        tokens.sort();
        issues.push(Issue::new(
            IssueCategory::Placeholder,
            format!(
                "Placeholder token(s) present: {} ({occurrences} occurrence(s))",
                tokens.join(", ")
            ),
        ));
    }
}

pub fn check_provenance(text: &str, issues: &mut Vec<Issue>) {
    if text.contains(AI_INFERRED_MARKER) {
        issues.push(Issue::new(
            IssueCategory::Structure,
            "AI-inferred requirement marker present; every requirement needs a human source",
        ));
    }
}

/// Coarse visual/interactive-domain sniff: when the vocabulary matches, an
/// asset strategy must be declared somewhere in the document.
pub fn check_asset_strategy(
    text: &str,
    sections: &[Section],
    ctx: &GateContext<'_>,
    issues: &mut Vec<Issue>,
) {
    let scope = find_section(sections, crate::parse::document::CONTEXT_ALIASES)
        .map(|section| section.body.to_ascii_lowercase())
        .unwrap_or_else(|| text.to_ascii_lowercase());

    let matched = ctx
        .asset_keywords
        .iter()
        .any(|keyword| keyword_present(&scope, keyword));
    if !matched {
        return;
    }

    let lower = text.to_ascii_lowercase();
    if !lower.contains("asset") {
        issues.push(Issue::new(
            IssueCategory::Structure,
            "Visual/interactive vocabulary detected but no asset strategy is declared",
        ));
    }
}

/// Whole-word keyword match over lower-cased text; multi-word keywords fall
/// back to substring containment. `haystack` must already be lower-cased.
fn keyword_present(haystack: &str, keyword: &str) -> bool {
    let keyword = keyword.to_ascii_lowercase();
    if keyword.contains(' ') {
        return haystack.contains(&keyword);
    }

    haystack
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .any(|word| word == keyword)
}

/// Persona subsections of a discovery/plan document: each named subsection
/// must exist (at `##` or `###` level) and carry meaningful content.
pub fn check_persona_sections(
    doc_text: &str,
    required: &[&str],
    spec_text: Option<&str>,
    ctx: &GateContext<'_>,
    issues: &mut Vec<Issue>,
) {
    let sections = split_all_headings(doc_text);
    let rule = ContentRule::with_min_length(8);

    for name in required {
        check_one_persona_section(&sections, name, &rule, issues);
    }

    let ui_required = spec_text
        .map(|text| {
            let lower = text.to_ascii_lowercase();
            ctx.ui_keywords
                .iter()
                .any(|keyword| keyword_present(&lower, keyword))
        })
        .unwrap_or(false);
    if ui_required {
        let present = ["UX/UI", "UX", "UI"].iter().any(|alias| {
            sections
                .iter()
                .any(|section| normalize_heading(&section.heading) == normalize_heading(alias))
        });
        if !present {
            issues.push(Issue::new(
                IssueCategory::Persona,
                "UX/UI persona section required by UI-related spec vocabulary but missing",
            ));
        }
    }
}

fn check_one_persona_section(
    sections: &[Section],
    name: &str,
    rule: &ContentRule,
    issues: &mut Vec<Issue>,
) {
    let wanted = normalize_heading(name);
    let Some(section) = sections
        .iter()
        .find(|section| normalize_heading(&section.heading) == wanted)
    else {
        issues.push(Issue::new(
            IssueCategory::Persona,
            format!("Persona section missing: {name}"),
        ));
        return;
    };

    let meaningful = section
        .body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .any(|line| is_meaningful(line, rule));
    if !meaningful {
        issues.push(Issue::new(
            IssueCategory::Persona,
            format!("Persona section '{name}' has no meaningful content"),
        ));
    }
}

/// A generated story must name a concrete actor and carry Given/when/then
/// phrasing in its acceptance bullets.
pub fn check_story_contracts(stories: &[UserStory], issues: &mut Vec<Issue>) {
    let actor_pattern = Regex::new(r"(?i)\bas\s+an?\s+(?P<actor>[A-Za-z0-9 _-]+?)(?:,|\s+i\s+|$)")
        .expect("actor pattern is static");

    for story in stories {
        let actor = actor_pattern
            .captures(&story.narrative)
            .map(|captures| captures["actor"].trim().to_ascii_lowercase());
        let generic = match actor.as_deref() {
            Some(actor) => actor.is_empty() || GENERIC_ACTORS.contains(&actor),
            None => true,
        };
        if generic {
            issues.push(Issue::new(
                IssueCategory::StoryContract,
                format!("{} declares a generic or missing actor", story.id),
            ));
        }

        let gherkin_ok = !story.acceptance.is_empty()
            || story.acceptance_bullets.iter().any(|bullet| {
                let lower = bullet.to_ascii_lowercase();
                lower.contains("given") && lower.contains("when") && lower.contains("then")
            });
        if !gherkin_ok {
            issues.push(Issue::new(
                IssueCategory::StoryContract,
                format!("{} has no Given/when/then acceptance phrasing", story.id),
            ));
        }
    }
}

pub fn check_fr_story_coverage(
    fr_ids: &[String],
    stories: &[UserStory],
    issues: &mut Vec<Issue>,
) {
    let downstream = stories
        .iter()
        .map(|story| DownstreamEntry {
            id: story.id.clone(),
            trace_ids: story.fr_ids.clone(),
        })
        .collect::<Vec<DownstreamEntry>>();

    for row in build_coverage_rows(fr_ids, &downstream, &|_| true) {
        if !row.covered {
            issues.push(Issue::new(
                IssueCategory::CoverageFrUs,
                format!(
                    "Coverage gap: {} is not referenced by any user story",
                    row.requirement_id
                ),
            ));
        }
    }
}

pub fn check_fr_test_coverage(fr_ids: &[String], cases: &[TestCase], issues: &mut Vec<Issue>) {
    let downstream = cases
        .iter()
        .map(|case| DownstreamEntry {
            id: case.id.clone(),
            trace_ids: case.fr_ids.clone(),
        })
        .collect::<Vec<DownstreamEntry>>();

    for row in build_coverage_rows(fr_ids, &downstream, &|_| true) {
        if !row.covered {
            issues.push(Issue::new(
                IssueCategory::CoverageFrTc,
                format!(
                    "Coverage gap: {} is not referenced by any test case",
                    row.requirement_id
                ),
            ));
        }
    }
}

pub fn check_story_test_coverage(
    stories: &[UserStory],
    cases: &[TestCase],
    issues: &mut Vec<Issue>,
) {
    let us_ids = stories
        .iter()
        .map(|story| story.id.clone())
        .collect::<Vec<String>>();
    let downstream = cases
        .iter()
        .map(|case| DownstreamEntry {
            id: case.id.clone(),
            trace_ids: case.us_ids.clone(),
        })
        .collect::<Vec<DownstreamEntry>>();

    for row in build_coverage_rows(&us_ids, &downstream, &|_| true) {
        if !row.covered {
            issues.push(Issue::new(
                IssueCategory::CoverageUsTc,
                format!(
                    "Coverage gap: {} is not referenced by any test case",
                    row.requirement_id
                ),
            ));
        }
    }
}
