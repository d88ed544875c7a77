use serde::{Deserialize, Serialize};

use crate::parse::{
    extract_tagged_items, parse_backlog, parse_spec_document, parse_tests_document,
    split_sections,
};

pub mod checks;
pub mod meaningful;
#[cfg(test)]
mod tests;

pub use self::meaningful::{ContentRule, is_meaningful};

/// Machine-readable category attached to every issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    MissingArtifact,
    Structure,
    Placeholder,
    Persona,
    CoverageFrUs,
    CoverageFrTc,
    CoverageUsTc,
    StoryContract,
    DependencyDrift,
    ForbiddenPath,
    ForbiddenImport,
}

impl IssueCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingArtifact => "missing_artifact",
            Self::Structure => "structure",
            Self::Placeholder => "placeholder",
            Self::Persona => "persona",
            Self::CoverageFrUs => "coverage_fr_us",
            Self::CoverageFrTc => "coverage_fr_tc",
            Self::CoverageUsTc => "coverage_us_tc",
            Self::StoryContract => "story_contract",
            Self::DependencyDrift => "dependency_drift",
            Self::ForbiddenPath => "forbidden_path",
            Self::ForbiddenImport => "forbidden_import",
        }
    }
}

/// One accumulated, non-fatal validation finding. Checks never abort early;
/// a gate fails when at least one issue survives to the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub category: IssueCategory,
    pub message: String,
}

impl Issue {
    pub fn new(category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStatus {
    Draft,
    Approved,
}

impl DocStatus {
    pub fn marker_line(self) -> &'static str {
        match self {
            Self::Draft => "STATUS: DRAFT",
            Self::Approved => "STATUS: APPROVED",
        }
    }
}

/// Injected keyword tables the checks consult; no module-level state.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub asset_keywords: &'a [String],
    pub ui_keywords: &'a [String],
}

pub const DISCOVERY_PERSONA_SECTIONS: &[&str] =
    &["Business value", "Success metric", "Risks & mitigations"];
pub const PLAN_PERSONA_SECTIONS: &[&str] = &["Components", "Data flow", "Observability"];

/// Full structural gate over one requirement document.
pub fn validate_spec_document(
    text: &str,
    expected_status: DocStatus,
    ctx: &GateContext<'_>,
) -> Vec<Issue> {
    let mut issues = Vec::<Issue>::new();
    let sections = split_sections(text);
    let entities = parse_spec_document(text);

    checks::check_status_marker(text, expected_status, &mut issues);
    checks::check_spec_sections(&sections, &mut issues);
    checks::check_fr_ac_ratio(
        entities.requirements.len(),
        entities.criteria.len(),
        &mut issues,
    );
    checks::check_duplicate_declarations("FR", &entities.raw_requirement_items, &mut issues);
    checks::check_duplicate_declarations("AC", &entities.raw_criterion_items, &mut issues);
    checks::check_placeholder_tokens(text, &mut issues);
    checks::check_provenance(text, &mut issues);
    checks::check_asset_strategy(text, &sections, ctx, &mut issues);

    issues
}

/// Persona gate over a discovery document.
pub fn validate_discovery_document(text: &str, ctx: &GateContext<'_>) -> Vec<Issue> {
    let mut issues = Vec::<Issue>::new();
    checks::check_persona_sections(text, DISCOVERY_PERSONA_SECTIONS, None, ctx, &mut issues);
    checks::check_placeholder_tokens(text, &mut issues);
    issues
}

/// Persona gate over a plan document; the UX/UI subsection requirement is
/// driven by the spec's vocabulary.
pub fn validate_plan_document(
    text: &str,
    spec_text: Option<&str>,
    ctx: &GateContext<'_>,
) -> Vec<Issue> {
    let mut issues = Vec::<Issue>::new();
    checks::check_persona_sections(text, PLAN_PERSONA_SECTIONS, spec_text, ctx, &mut issues);
    checks::check_placeholder_tokens(text, &mut issues);
    issues
}

/// Story-contract gate over a backlog document.
pub fn validate_backlog_document(text: &str) -> Vec<Issue> {
    let mut issues = Vec::<Issue>::new();
    let stories = parse_backlog(text);

    if stories.is_empty() {
        issues.push(Issue::new(
            IssueCategory::Structure,
            "Backlog declares no user stories",
        ));
    }

    checks::check_duplicate_declarations("US", &extract_tagged_items(text, "US"), &mut issues);
    checks::check_story_contracts(&stories, &mut issues);
    issues
}

/// Structural gate over a tests document.
pub fn validate_tests_document(text: &str) -> Vec<Issue> {
    let mut issues = Vec::<Issue>::new();
    let cases = parse_tests_document(text);

    if cases.is_empty() {
        issues.push(Issue::new(
            IssueCategory::Structure,
            "Tests document declares no test cases",
        ));
    }

    checks::check_duplicate_declarations("TC", &extract_tagged_items(text, "TC"), &mut issues);
    issues
}

/// Cross-artifact trace audit: FR→US, FR→TC and US→TC coverage over the
/// current spec/backlog/tests snapshot.
pub fn validate_traceability(
    spec_text: &str,
    backlog_text: Option<&str>,
    tests_text: Option<&str>,
) -> Vec<Issue> {
    let mut issues = Vec::<Issue>::new();
    let entities = parse_spec_document(spec_text);
    let fr_ids = entities
        .requirements
        .iter()
        .map(|requirement| requirement.id.clone())
        .collect::<Vec<String>>();

    let stories = match backlog_text {
        Some(text) => parse_backlog(text),
        None => {
            issues.push(Issue::new(
                IssueCategory::MissingArtifact,
                "Backlog artifact is absent",
            ));
            Vec::new()
        }
    };
    let cases = match tests_text {
        Some(text) => parse_tests_document(text),
        None => {
            issues.push(Issue::new(
                IssueCategory::MissingArtifact,
                "Tests artifact is absent",
            ));
            Vec::new()
        }
    };

    if backlog_text.is_some() {
        checks::check_fr_story_coverage(&fr_ids, &stories, &mut issues);
    }
    if tests_text.is_some() {
        checks::check_fr_test_coverage(&fr_ids, &cases, &mut issues);
        if backlog_text.is_some() {
            checks::check_story_test_coverage(&stories, &cases, &mut issues);
        }
    }

    issues
}
