use anyhow::Result;

use crate::confidence::{ArtifactPresence, VerificationSignal};
use crate::config::WorkspaceConfig;
use crate::gate::{
    DocStatus, GateContext, Issue, validate_backlog_document, validate_discovery_document,
    validate_plan_document, validate_spec_document, validate_tests_document,
    validate_traceability,
};
use crate::model::{GoDecisionEvidence, ReadinessEvidence, VerificationEvidence};
use crate::store::{ArtifactKind, ArtifactStore};
use crate::util::sha256_text;
use crate::workflow::{NextStep, PostGoVerification, WorkflowArtifactSet, next_step};

/// Everything the scorer and the state machine need, derived fresh from the
/// current artifact snapshot. Nothing here is cached between invocations.
#[derive(Debug)]
pub struct FeatureSnapshot {
    pub artifact_set: WorkflowArtifactSet,
    pub presence: ArtifactPresence,
    pub issues: Vec<Issue>,
    pub verification: VerificationSignal,
    pub next: NextStep,
}

impl FeatureSnapshot {
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

/// Re-reads and re-validates every artifact for one feature.
/// `structure_present` is supplied by the caller because only it knows
/// whether the feature directory layout exists.
pub fn collect_snapshot(
    store: &dyn ArtifactStore,
    cfg: &WorkspaceConfig,
    structure_present: bool,
) -> Result<FeatureSnapshot> {
    let ctx = GateContext {
        asset_keywords: &cfg.asset_keywords,
        ui_keywords: &cfg.ui_keywords,
    };

    let draft_text = store.read(ArtifactKind::DraftSpec)?;
    let approved_text = store.read(ArtifactKind::ApprovedSpec)?;
    let discovery_text = store.read(ArtifactKind::Discovery)?;
    let plan_text = store.read(ArtifactKind::Plan)?;
    let backlog_text = store.read(ArtifactKind::Backlog)?;
    let tests_text = store.read(ArtifactKind::Tests)?;

    let mut issues = Vec::<Issue>::new();

    let spec_valid = match approved_text.as_deref() {
        Some(text) => {
            let spec_issues = validate_spec_document(text, DocStatus::Approved, &ctx);
            let valid = spec_issues.is_empty();
            issues.extend(spec_issues);
            valid
        }
        None => false,
    };

    let discovery_valid = match discovery_text.as_deref() {
        Some(text) => {
            let persona_issues = validate_discovery_document(text, &ctx);
            let valid = persona_issues.is_empty();
            issues.extend(persona_issues);
            valid
        }
        None => false,
    };

    let plan_valid = match plan_text.as_deref() {
        Some(text) => {
            let persona_issues = validate_plan_document(text, approved_text.as_deref(), &ctx);
            let valid = persona_issues.is_empty();
            issues.extend(persona_issues);
            valid
        }
        None => false,
    };

    let backlog_valid = match backlog_text.as_deref() {
        Some(text) => {
            let backlog_issues = validate_backlog_document(text);
            let valid = backlog_issues.is_empty();
            issues.extend(backlog_issues);
            valid
        }
        None => false,
    };

    let tests_valid = match tests_text.as_deref() {
        Some(text) => {
            let tests_issues = validate_tests_document(text);
            let valid = tests_issues.is_empty();
            issues.extend(tests_issues);
            valid
        }
        None => false,
    };

    if let Some(spec) = approved_text.as_deref() {
        if backlog_text.is_some() || tests_text.is_some() {
            issues.extend(validate_traceability(
                spec,
                backlog_text.as_deref(),
                tests_text.as_deref(),
            ));
        }
    }

    let evidence = read_verification_evidence(store)?;
    let verification = classify_verification(
        cfg,
        &evidence,
        approved_text.as_deref(),
        backlog_text.as_deref(),
        tests_text.as_deref(),
    );
    let verification_passed = matches!(
        verification,
        VerificationSignal::Passed { .. } | VerificationSignal::NotRequired
    );

    let scaffold = read_readiness(store, ArtifactKind::ScaffoldReady)?;
    let implement = read_readiness(store, ArtifactKind::ImplementReady)?;
    let build = read_readiness(store, ArtifactKind::BuildReady)?;

    let post_go_verification = evidence.as_ref().and_then(|evidence| {
        evidence.parsed.as_ref().map(|parsed| PostGoVerification {
            succeeded: parsed.status == "passed"
                && !matches!(verification, VerificationSignal::Stale),
            coverage_mode: parsed.coverage_mode.clone(),
            declared_mode: scaffold
                .as_ref()
                .and_then(|readiness| readiness.coverage_mode.clone())
                .unwrap_or_default(),
            declared_count: parsed.declared_count,
            passing_count: parsed.passing_count,
        })
    });

    let go_recorded = match store.read(ArtifactKind::GoDecision)? {
        Some(raw) => serde_json::from_str::<GoDecisionEvidence>(&raw)
            .map(|decision| decision.decision == "go")
            .unwrap_or(false),
        None => false,
    };

    let ship_decided = match store.read(ArtifactKind::DeliveryDecision)? {
        Some(raw) => serde_json::from_str::<crate::model::DeliveryEvidence>(&raw)
            .map(|decision| decision.decision == "ship")
            .unwrap_or(false),
        None => false,
    };

    let artifact_set = WorkflowArtifactSet {
        structure_present,
        draft_present: draft_text.is_some(),
        approved_spec_present: approved_text.is_some(),
        discovery_present: discovery_text.is_some(),
        plan_present: plan_text.is_some(),
        verification_passed,
        go_recorded,
        scaffold_ready: scaffold.is_some(),
        implement_ready: implement.is_some(),
        build_ready: build.is_some(),
        post_go_verification,
        ship_decided,
    };
    let next = next_step(&artifact_set);

    Ok(FeatureSnapshot {
        artifact_set,
        presence: ArtifactPresence {
            approved_spec: spec_valid,
            discovery: discovery_valid,
            plan: plan_valid,
            backlog: backlog_valid,
            tests: tests_valid,
        },
        issues,
        verification,
        next,
    })
}

struct StoredVerification {
    /// `None` when the evidence file exists but cannot be parsed.
    parsed: Option<VerificationEvidence>,
}

fn read_verification_evidence(store: &dyn ArtifactStore) -> Result<Option<StoredVerification>> {
    let Some(raw) = store.read(ArtifactKind::VerificationEvidence)? else {
        return Ok(None);
    };

    Ok(Some(StoredVerification {
        parsed: serde_json::from_str::<VerificationEvidence>(&raw).ok(),
    }))
}

fn read_readiness(
    store: &dyn ArtifactStore,
    kind: ArtifactKind,
) -> Result<Option<ReadinessEvidence>> {
    let Some(raw) = store.read(kind)? else {
        return Ok(None);
    };

    Ok(serde_json::from_str::<ReadinessEvidence>(&raw)
        .ok()
        .filter(|readiness| readiness.status == "ready"))
}

/// Maps stored verification evidence onto the scorer's signal. Evidence whose
/// artifact fingerprints no longer match the current snapshot is stale.
fn classify_verification(
    cfg: &WorkspaceConfig,
    stored: &Option<StoredVerification>,
    approved_text: Option<&str>,
    backlog_text: Option<&str>,
    tests_text: Option<&str>,
) -> VerificationSignal {
    if !cfg.verification_required {
        return VerificationSignal::NotRequired;
    }

    let Some(stored) = stored else {
        return VerificationSignal::Missing;
    };
    let Some(evidence) = stored.parsed.as_ref() else {
        return VerificationSignal::Invalid;
    };

    for fingerprint in &evidence.artifact_fingerprints {
        let current = match fingerprint.kind.as_str() {
            "approved_spec" => approved_text,
            "backlog" => backlog_text,
            "tests" => tests_text,
            _ => continue,
        };
        let matches = current
            .map(|text| sha256_text(text) == fingerprint.sha256)
            .unwrap_or(false);
        if !matches {
            return VerificationSignal::Stale;
        }
    }

    match evidence.status.as_str() {
        "passed" => VerificationSignal::Passed {
            command: evidence.command.clone(),
            manual_override: evidence.manual_override,
            tc_ratio: (evidence.declared_count > 0)
                .then_some((evidence.passing_count, evidence.declared_count)),
        },
        _ => VerificationSignal::Failed,
    }
}
