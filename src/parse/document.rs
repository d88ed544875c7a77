use std::collections::BTreeSet;

use super::gherkin::{GherkinTriple, extract_gherkin};
use super::sections::{find_section, split_sections};
use super::tagged::{TaggedItem, extract_bullets, extract_tagged_items};
use super::ui::{UiStructure, extract_ui_structure};
use crate::trace::parse_trace_line;

pub const FUNCTIONAL_RULES_ALIASES: &[&str] =
    &["Functional Rules", "Functional Requirements", "Rules"];
pub const ACCEPTANCE_CRITERIA_ALIASES: &[&str] = &["Acceptance Criteria", "Criteria"];
pub const ACTORS_ALIASES: &[&str] = &["Actors", "Personas", "Users"];
pub const EDGE_CASES_ALIASES: &[&str] = &["Edge Cases", "Edge Cases & Errors", "Error Handling"];
pub const SECURITY_ALIASES: &[&str] = &["Security Considerations", "Security"];
pub const CONTEXT_ALIASES: &[&str] = &["Context", "Overview", "Background"];
pub const OUT_OF_SCOPE_ALIASES: &[&str] = &["Out of Scope", "Non-goals"];
pub const UI_STRUCTURE_ALIASES: &[&str] = &["UI Structure", "Screens", "User Interface"];
pub const USER_STORIES_ALIASES: &[&str] = &["User Stories", "Stories", "Backlog"];
pub const TEST_CASES_ALIASES: &[&str] = &["Test Cases", "Tests"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub id: String,
    pub text: String,
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceCriterion {
    pub id: String,
    pub text: String,
    pub ordinal: usize,
    pub gherkin: Option<GherkinTriple>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecEntities {
    pub requirements: Vec<Requirement>,
    pub criteria: Vec<AcceptanceCriterion>,
    pub actors: Vec<String>,
    pub edge_cases: Vec<String>,
    pub security_notes: Vec<String>,
    pub out_of_scope: Vec<String>,
    pub ui: UiStructure,
    /// Raw tagged items per family, duplicates included, for the validator.
    pub raw_requirement_items: Vec<TaggedItem>,
    pub raw_criterion_items: Vec<TaggedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStory {
    pub id: String,
    pub narrative: String,
    pub fr_ids: BTreeSet<String>,
    pub ac_ids: BTreeSet<String>,
    pub acceptance: Vec<GherkinTriple>,
    pub acceptance_bullets: Vec<String>,
}

/// Whether a declared test case was observed by the last run at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Found,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: String,
    pub title: String,
    pub fr_ids: BTreeSet<String>,
    pub us_ids: BTreeSet<String>,
    pub ac_ids: BTreeSet<String>,
    pub execution: ExecutionStatus,
    pub passed: Option<bool>,
}

/// Parses a requirement document into its typed entity set. Best-effort:
/// absent sections yield empty collections, malformed lines are skipped.
pub fn parse_spec_document(text: &str) -> SpecEntities {
    let sections = split_sections(text);

    let raw_requirement_items = find_section(&sections, FUNCTIONAL_RULES_ALIASES)
        .map(|section| extract_tagged_items(&section.body, "FR"))
        .unwrap_or_default();
    let raw_criterion_items = find_section(&sections, ACCEPTANCE_CRITERIA_ALIASES)
        .map(|section| extract_tagged_items(&section.body, "AC"))
        .unwrap_or_default();

    let requirements = dedupe_items(&raw_requirement_items)
        .into_iter()
        .map(|item| Requirement {
            id: item.id.clone(),
            text: item.text.clone(),
            ordinal: item.ordinal,
        })
        .collect::<Vec<Requirement>>();

    let criteria = dedupe_items(&raw_criterion_items)
        .into_iter()
        .map(|item| AcceptanceCriterion {
            gherkin: extract_gherkin(&item.text),
            id: item.id.clone(),
            text: item.text.clone(),
            ordinal: item.ordinal,
        })
        .collect::<Vec<AcceptanceCriterion>>();

    SpecEntities {
        requirements,
        criteria,
        actors: section_bullets(&sections, ACTORS_ALIASES),
        edge_cases: section_bullets(&sections, EDGE_CASES_ALIASES),
        security_notes: section_bullets(&sections, SECURITY_ALIASES),
        out_of_scope: section_bullets(&sections, OUT_OF_SCOPE_ALIASES),
        ui: find_section(&sections, UI_STRUCTURE_ALIASES)
            .map(|section| extract_ui_structure(&section.body))
            .unwrap_or_default(),
        raw_requirement_items,
        raw_criterion_items,
    }
}

/// Parses a backlog document into user stories. A `- US-<n>: <narrative>`
/// bullet opens a story; its indented bullets (trace lines, acceptance
/// bullets) belong to it until the next non-indented line.
pub fn parse_backlog(text: &str) -> Vec<UserStory> {
    let scope = find_section(&split_sections(text), USER_STORIES_ALIASES)
        .map(|section| section.body.clone())
        .unwrap_or_else(|| text.to_string());

    collect_blocks(&scope, "US")
        .into_iter()
        .map(|block| {
            let mut story = UserStory {
                id: block.item.id,
                narrative: block.item.text,
                fr_ids: BTreeSet::new(),
                ac_ids: BTreeSet::new(),
                acceptance: Vec::new(),
                acceptance_bullets: Vec::new(),
            };

            for bullet in block.bullets {
                if let Some(refs) = parse_trace_line(&bullet) {
                    story.fr_ids.extend(refs.fr_ids);
                    story.ac_ids.extend(refs.ac_ids);
                    continue;
                }

                if let Some(triple) = extract_gherkin(&bullet) {
                    story.acceptance.push(triple);
                }
                story.acceptance_bullets.push(bullet);
            }

            story
        })
        .collect()
}

/// Parses a tests document into test cases. A `- Status: passed|failed`
/// bullet inside the block carries execution evidence; its absence marks the
/// case missing from the last run.
pub fn parse_tests_document(text: &str) -> Vec<TestCase> {
    let scope = find_section(&split_sections(text), TEST_CASES_ALIASES)
        .map(|section| section.body.clone())
        .unwrap_or_else(|| text.to_string());

    collect_blocks(&scope, "TC")
        .into_iter()
        .map(|block| {
            let mut case = TestCase {
                id: block.item.id,
                title: block.item.text,
                fr_ids: BTreeSet::new(),
                us_ids: BTreeSet::new(),
                ac_ids: BTreeSet::new(),
                execution: ExecutionStatus::Missing,
                passed: None,
            };

            for bullet in block.bullets {
                if let Some(refs) = parse_trace_line(&bullet) {
                    case.fr_ids.extend(refs.fr_ids);
                    case.us_ids.extend(refs.us_ids);
                    case.ac_ids.extend(refs.ac_ids);
                    continue;
                }

                if let Some(status) = bullet.strip_prefix("Status:") {
                    match status.trim().to_ascii_lowercase().as_str() {
                        "passed" => {
                            case.execution = ExecutionStatus::Found;
                            case.passed = Some(true);
                        }
                        "failed" => {
                            case.execution = ExecutionStatus::Found;
                            case.passed = Some(false);
                        }
                        _ => {}
                    }
                }
            }

            case
        })
        .collect()
}

struct TaggedBlock {
    item: TaggedItem,
    bullets: Vec<String>,
}

/// Tagged bullets of one family with their indented sub-bullets attached.
/// A block stays open across blank lines and closes at the next non-indented
/// content line.
fn collect_blocks(body: &str, prefix: &str) -> Vec<TaggedBlock> {
    let opener = regex::Regex::new(&format!(
        r"^-\s*(?P<id>{prefix}-\d+)\s*:\s*(?P<text>.+)$"
    ))
    .expect("block opener pattern is static");

    let mut blocks = Vec::<TaggedBlock>::new();
    let mut active: Option<TaggedBlock> = None;

    for line in body.lines() {
        let indented = line.starts_with(' ') || line.starts_with('\t');

        if !indented {
            if let Some(captures) = opener.captures(line.trim_end()) {
                if let Some(block) = active.take() {
                    blocks.push(block);
                }
                active = Some(TaggedBlock {
                    item: TaggedItem {
                        id: captures["id"].to_string(),
                        text: captures["text"].trim().to_string(),
                        ordinal: blocks.len() + 1,
                    },
                    bullets: Vec::new(),
                });
            } else if !line.trim().is_empty() {
                if let Some(block) = active.take() {
                    blocks.push(block);
                }
            }
            continue;
        }

        if let Some(block) = active.as_mut() {
            if let Some(rest) = line.trim().strip_prefix("- ") {
                let value = rest.trim();
                if !value.is_empty() {
                    block.bullets.push(value.to_string());
                }
            }
        }
    }

    if let Some(block) = active.take() {
        blocks.push(block);
    }

    blocks
}

/// First declaration wins; repeats are validation errors, not parse failures.
fn dedupe_items(items: &[TaggedItem]) -> Vec<&TaggedItem> {
    let mut seen = BTreeSet::<&str>::new();
    items
        .iter()
        .filter(|item| seen.insert(item.id.as_str()))
        .collect()
}

fn section_bullets(
    sections: &[super::sections::Section],
    aliases: &[&str],
) -> Vec<String> {
    find_section(sections, aliases)
        .map(|section| extract_bullets(&section.body))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        ExecutionStatus, parse_backlog, parse_spec_document, parse_tests_document,
    };

    const SPEC: &str = "STATUS: DRAFT\n\n## Context\nA coverage audit tool for analysts.\n\n## Actors\n- Compliance analyst\n\n## Functional Rules\n- FR-1: Parse tagged requirement bullets\n- FR-2: Report duplicate identifiers\n\n## Acceptance Criteria\n- AC-1: Given a document, when parsing runs, then tagged items are extracted\n- AC-2: Duplicates are listed when validation runs then the gate blocks\n\n## Edge Cases\n- Empty document yields empty entity sets\n\n## Security Considerations\n- Reports contain no file contents\n";

    const BACKLOG: &str = "## User Stories\n- US-1: As a compliance analyst, I want coverage reports\n  - Trace: FR-1, AC-1\n  - Given a backlog, when audit runs, then gaps are listed\n- US-2: As an operator, I want duplicate warnings\n  - Trace: FR-2, AC-2, FR-2\n";

    const TESTS: &str = "## Test Cases\n- TC-1: parser extracts tagged bullets\n  - Trace: FR-1, US-1, AC-1\n  - Status: passed\n- TC-2: duplicate ids reported\n  - Trace: FR-2, US-2\n  - Status: failed\n- TC-3: planned only\n  - Trace: FR-2\n";

    #[test]
    fn spec_parsing_extracts_typed_entities() {
        let entities = parse_spec_document(SPEC);
        assert_eq!(entities.requirements.len(), 2);
        assert_eq!(entities.requirements[0].id, "FR-1");
        assert_eq!(entities.criteria.len(), 2);
        assert!(
            entities.criteria[0]
                .gherkin
                .as_ref()
                .expect("AC-1 should carry a triple")
                .explicit
        );
        assert!(
            !entities.criteria[1]
                .gherkin
                .as_ref()
                .expect("AC-2 should synthesize a triple")
                .explicit
        );
        assert_eq!(entities.actors, vec!["Compliance analyst"]);
        assert_eq!(entities.edge_cases.len(), 1);
        assert_eq!(entities.security_notes.len(), 1);
    }

    #[test]
    fn reparsing_identical_text_yields_identical_entities() {
        assert_eq!(parse_spec_document(SPEC), parse_spec_document(SPEC));
        assert_eq!(parse_backlog(BACKLOG), parse_backlog(BACKLOG));
    }

    #[test]
    fn backlog_stories_carry_traces_and_acceptance() {
        let stories = parse_backlog(BACKLOG);
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].id, "US-1");
        assert!(stories[0].fr_ids.contains("FR-1"));
        assert!(stories[0].ac_ids.contains("AC-1"));
        assert_eq!(stories[0].acceptance.len(), 1);
        assert_eq!(stories[1].fr_ids.len(), 1, "trace ids deduplicate");
    }

    #[test]
    fn test_cases_carry_execution_evidence() {
        let cases = parse_tests_document(TESTS);
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].execution, ExecutionStatus::Found);
        assert_eq!(cases[0].passed, Some(true));
        assert_eq!(cases[1].passed, Some(false));
        assert_eq!(cases[2].execution, ExecutionStatus::Missing);
        assert!(cases[2].passed.is_none());
        assert!(cases[0].us_ids.contains("US-1"));
    }

    #[test]
    fn duplicate_declarations_keep_the_first_and_stay_visible_raw() {
        let spec = "## Functional Rules\n- FR-1: first\n- FR-1: second\n\n## Acceptance Criteria\n- AC-1: a criterion body\n";
        let entities = parse_spec_document(spec);
        assert_eq!(entities.requirements.len(), 1);
        assert_eq!(entities.requirements[0].text, "first");
        assert_eq!(entities.raw_requirement_items.len(), 2);
    }

    #[test]
    fn unknown_trace_targets_are_kept_for_coverage_reporting() {
        let cases = parse_tests_document("- TC-1: t\n  - Trace: FR-99\n");
        assert!(cases[0].fr_ids.contains("FR-99"));
    }
}
