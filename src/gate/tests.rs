use super::{
    DocStatus, GateContext, IssueCategory, validate_backlog_document,
    validate_discovery_document, validate_plan_document, validate_spec_document,
    validate_tests_document, validate_traceability,
};

fn context_tables() -> (Vec<String>, Vec<String>) {
    let assets = ["game", "sprite", "canvas", "animation"]
        .iter()
        .map(|value| value.to_string())
        .collect();
    let ui = ["screen", "button", "form", "page"]
        .iter()
        .map(|value| value.to_string())
        .collect();
    (assets, ui)
}

fn valid_spec() -> String {
    concat!(
        "STATUS: DRAFT\n\n",
        "## Context\nA traceability audit service for compliance teams.\n\n",
        "## Actors\n- Compliance analyst reviewing coverage\n\n",
        "## Functional Rules\n",
        "- FR-1: Parse tagged requirement bullets from sections\n",
        "- FR-2: Report duplicate requirement identifiers\n",
        "- FR-3: Export coverage matrices as evidence\n\n",
        "## Acceptance Criteria\n",
        "- AC-1: Given a document, when parsing runs, then tagged items are extracted\n",
        "- AC-2: Given duplicates, when validation runs, then the gate reports them\n",
        "- AC-3: Given a backlog, when audit runs, then matrices are written\n\n",
        "## Edge Cases\n- Empty documents yield empty entity sets\n\n",
        "## Security Considerations\n- Evidence files contain no artifact bodies\n"
    )
    .to_string()
}

fn valid_backlog() -> String {
    concat!(
        "## User Stories\n",
        "- US-1: As a compliance analyst, I want coverage audits\n",
        "  - Trace: FR-1, AC-1\n",
        "  - Given a spec, when the audit runs, then gaps are listed\n",
        "- US-2: As a release manager, I want duplicate warnings\n",
        "  - Trace: FR-2, FR-3, AC-2\n",
        "  - Given duplicates, when validation runs, then ids are reported\n"
    )
    .to_string()
}

fn valid_tests() -> String {
    concat!(
        "## Test Cases\n",
        "- TC-1: parser extracts tagged bullets\n",
        "  - Trace: FR-1, US-1, AC-1\n",
        "  - Status: passed\n",
        "- TC-2: duplicates and exports are reported\n",
        "  - Trace: FR-2, FR-3, US-2, AC-2\n",
        "  - Status: passed\n"
    )
    .to_string()
}

#[test]
fn a_complete_spec_draft_passes_every_check() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let issues = validate_spec_document(&valid_spec(), DocStatus::Draft, &ctx);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn validation_is_idempotent_on_an_issue_free_document() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let first = validate_spec_document(&valid_spec(), DocStatus::Draft, &ctx);
    let second = validate_spec_document(&valid_spec(), DocStatus::Draft, &ctx);
    assert!(first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn missing_status_marker_is_a_structure_issue() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let spec = valid_spec().replace("STATUS: DRAFT\n", "");
    let issues = validate_spec_document(&spec, DocStatus::Draft, &ctx);
    assert!(
        issues
            .iter()
            .any(|issue| issue.category == IssueCategory::Structure
                && issue.message.contains("STATUS: DRAFT"))
    );
}

#[test]
fn three_rules_and_one_criterion_report_the_exact_shortfall() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let spec = valid_spec()
        .replace(
            "- AC-2: Given duplicates, when validation runs, then the gate reports them\n",
            "",
        )
        .replace(
            "- AC-3: Given a backlog, when audit runs, then matrices are written\n",
            "",
        );
    let issues = validate_spec_document(&spec, DocStatus::Draft, &ctx);
    assert!(
        issues.iter().any(|issue| issue.message
            == "Coverage gap: 3 Functional Rule(s) but only 1 Acceptance Criterion(a)"),
        "unexpected issues: {issues:?}"
    );
}

#[test]
fn a_triplicated_rule_id_yields_one_issue_naming_it_once() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let spec = valid_spec().replace(
        "- FR-3: Export coverage matrices as evidence\n",
        concat!(
            "- FR-3: Export coverage matrices as evidence\n",
            "- FR-1: Parse tagged requirement bullets again\n",
            "- FR-1: Parse tagged requirement bullets a third time\n",
            "- AC-4: Given extra rules, when counted, then criteria keep pace\n"
        ),
    );
    // Keep the AC count >= FR count so only the duplicate issue fires.
    let spec = spec.replace(
        "## Acceptance Criteria\n",
        "## Acceptance Criteria\n- AC-5: Given another rule, when counted, then parity holds\n",
    );

    let issues = validate_spec_document(&spec, DocStatus::Draft, &ctx);
    let duplicate_issues = issues
        .iter()
        .filter(|issue| issue.message.contains("Duplicate FR id"))
        .collect::<Vec<_>>();
    assert_eq!(duplicate_issues.len(), 1, "unexpected issues: {issues:?}");
    assert!(duplicate_issues[0].message.contains("FR-1"));
    assert!(duplicate_issues[0].message.contains("3 times"));
}

#[test]
fn placeholder_tokens_report_count_and_distinct_set() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let spec = valid_spec().replace(
        "## Edge Cases\n- Empty documents yield empty entity sets\n",
        "## Edge Cases\n- TODO revisit tbd items\n- Empty documents yield empty entity sets, TODO\n",
    );
    let issues = validate_spec_document(&spec, DocStatus::Draft, &ctx);
    let placeholder = issues
        .iter()
        .find(|issue| issue.category == IssueCategory::Placeholder)
        .expect("placeholder issue should fire");
    assert!(placeholder.message.contains("TBD, TODO"));
    assert!(placeholder.message.contains("3 occurrence(s)"));
}

#[test]
fn ai_inferred_marker_blocks_approval() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let spec = valid_spec().replace(
        "- FR-1: Parse tagged requirement bullets from sections\n",
        "- FR-1: Parse tagged requirement bullets from sections (AI-INFERRED)\n",
    );
    let issues = validate_spec_document(&spec, DocStatus::Draft, &ctx);
    assert!(issues.iter().any(|issue| issue.message.contains("AI-inferred")));
}

#[test]
fn game_vocabulary_without_asset_strategy_is_flagged() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let spec = valid_spec().replace(
        "## Context\nA traceability audit service for compliance teams.\n",
        "## Context\nA browser game rendering sprite layers to a canvas.\n",
    );
    let issues = validate_spec_document(&spec, DocStatus::Draft, &ctx);
    assert!(
        issues
            .iter()
            .any(|issue| issue.message.contains("asset strategy")),
        "unexpected issues: {issues:?}"
    );

    let with_assets = spec.replace(
        "## Security Considerations\n",
        "## Asset Strategy\n- Sprite sheets are generated from licensed artwork\n\n## Security Considerations\n",
    );
    let issues = validate_spec_document(&with_assets, DocStatus::Draft, &ctx);
    assert!(
        !issues
            .iter()
            .any(|issue| issue.message.contains("asset strategy"))
    );
}

#[test]
fn fully_traced_artifacts_produce_zero_issues() {
    let issues = validate_traceability(
        &valid_spec(),
        Some(&valid_backlog()),
        Some(&valid_tests()),
    );
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn a_rule_missing_from_the_backlog_is_exactly_one_fr_us_gap() {
    let backlog = valid_backlog().replace("FR-2, FR-3, AC-2", "FR-2, AC-2");
    let tests = valid_tests();
    let issues = validate_traceability(&valid_spec(), Some(&backlog), Some(&tests));

    let fr_us = issues
        .iter()
        .filter(|issue| issue.category == IssueCategory::CoverageFrUs)
        .collect::<Vec<_>>();
    assert_eq!(fr_us.len(), 1, "unexpected issues: {issues:?}");
    assert!(fr_us[0].message.contains("FR-3"));
}

#[test]
fn absent_downstream_artifacts_are_missing_artifact_issues() {
    let issues = validate_traceability(&valid_spec(), None, None);
    let missing = issues
        .iter()
        .filter(|issue| issue.category == IssueCategory::MissingArtifact)
        .count();
    assert_eq!(missing, 2);
    assert!(
        !issues
            .iter()
            .any(|issue| issue.category == IssueCategory::CoverageFrUs),
        "coverage is not judged against absent artifacts"
    );
}

#[test]
fn backlog_stories_with_generic_actors_fail_the_contract() {
    let backlog = valid_backlog().replace("As a compliance analyst", "As a user");
    let issues = validate_backlog_document(&backlog);
    assert!(
        issues
            .iter()
            .any(|issue| issue.category == IssueCategory::StoryContract
                && issue.message.contains("US-1")
                && issue.message.contains("actor"))
    );
}

#[test]
fn backlog_stories_without_gherkin_fail_the_contract() {
    let backlog = valid_backlog().replace(
        "  - Given a spec, when the audit runs, then gaps are listed\n",
        "",
    );
    let issues = validate_backlog_document(&backlog);
    assert!(
        issues
            .iter()
            .any(|issue| issue.category == IssueCategory::StoryContract
                && issue.message.contains("US-1")
                && issue.message.contains("Given/when/then"))
    );
}

#[test]
fn a_clean_backlog_passes_the_story_contract() {
    let issues = validate_backlog_document(&valid_backlog());
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn empty_tests_document_is_a_structure_issue() {
    let issues = validate_tests_document("## Test Cases\nnothing here\n");
    assert!(
        issues
            .iter()
            .any(|issue| issue.message.contains("no test cases"))
    );
}

#[test]
fn discovery_documents_need_their_persona_sections() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let discovery = concat!(
        "## Business value\nCuts audit preparation from days to minutes.\n\n",
        "## Success metric\n- 95% of gates pass on the second attempt\n"
    );
    let issues = validate_discovery_document(discovery, &ctx);
    assert!(
        issues
            .iter()
            .any(|issue| issue.category == IssueCategory::Persona
                && issue.message.contains("Risks & mitigations"))
    );
}

#[test]
fn plan_documents_require_ux_section_only_for_ui_specs() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let plan = concat!(
        "## Components\n- Parser, linker and gate evaluator modules\n\n",
        "## Data flow\nArtifacts flow from the store through the parser into reports.\n\n",
        "## Observability\n- Structured logs for every gate decision\n"
    );

    let ui_spec = "Users press the submit button on the login screen.";
    let issues = validate_plan_document(plan, Some(ui_spec), &ctx);
    assert!(
        issues
            .iter()
            .any(|issue| issue.message.contains("UX/UI")),
        "unexpected issues: {issues:?}"
    );

    let headless_spec = "A queue consumer with no operator surface.";
    let issues = validate_plan_document(plan, Some(headless_spec), &ctx);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn persona_sections_with_placeholder_bodies_are_flagged() {
    let (assets, ui) = context_tables();
    let ctx = GateContext {
        asset_keywords: &assets,
        ui_keywords: &ui,
    };
    let discovery = concat!(
        "## Business value\n<benefit>\n\n",
        "## Success metric\n- 95% of gates pass on the second attempt\n\n",
        "## Risks & mitigations\n- Parser drift is covered by determinism tests\n"
    );
    let issues = validate_discovery_document(discovery, &ctx);
    assert!(
        issues
            .iter()
            .any(|issue| issue.message.contains("'Business value'"))
    );
}
