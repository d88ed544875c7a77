use std::collections::HashSet;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::confidence::score_confidence;
use crate::coverage::{CoverageMatrix, DownstreamEntry, build_coverage_rows};
use crate::model::{DeliveryEvidence, EVIDENCE_SCHEMA_VERSION};
use crate::parse::{parse_spec_document, parse_tests_document};
use crate::policy::PolicyEvaluation;
use crate::snapshot::collect_snapshot;
use crate::store::{ArtifactKind, ArtifactStore, StagedWrites};
use crate::util::now_utc_string;
use crate::workflow::NextStep;

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, structure_present) = super::feature_store(&cfg, &args.feature);
    let snapshot = collect_snapshot(&store, &cfg, structure_present)?;

    if !snapshot.artifact_set.go_recorded {
        info!(next_action = snapshot.next.display_label(), "workflow position");
        bail!("feature '{}' has no recorded go decision", args.feature);
    }

    let Some(spec_text) = store.read(ArtifactKind::ApprovedSpec)? else {
        bail!("feature '{}' has no approved spec", args.feature);
    };
    let tests_text = store.read(ArtifactKind::Tests)?;
    let generated_at = now_utc_string();

    let mut reasons = Vec::<String>::new();

    // AC -> TC coverage with execution evidence as the passing source.
    let entities = parse_spec_document(&spec_text);
    let ac_ids = entities
        .criteria
        .iter()
        .map(|criterion| criterion.id.clone())
        .collect::<Vec<String>>();
    let cases = tests_text
        .as_deref()
        .map(parse_tests_document)
        .unwrap_or_default();
    let passing_cases = cases
        .iter()
        .filter(|case| case.passed == Some(true))
        .map(|case| case.id.clone())
        .collect::<HashSet<String>>();
    let downstream = cases
        .iter()
        .map(|case| DownstreamEntry {
            id: case.id.clone(),
            trace_ids: case.ac_ids.clone(),
        })
        .collect::<Vec<DownstreamEntry>>();
    let rows = build_coverage_rows(&ac_ids, &downstream, &|id| passing_cases.contains(id));
    let matrix = CoverageMatrix::new(&args.feature, "AC", "TC", &generated_at, rows);

    for gap in &matrix.gap_ids {
        reasons.push(format!("{gap} has no passing test case"));
    }

    match snapshot.next {
        NextStep::DeliverPending => {}
        NextStep::VerifyPending => {
            reasons.push("post-go verification is not ready".to_string());
        }
        NextStep::BuildPending => {
            reasons.push("build stages have not reported ready".to_string());
        }
        NextStep::DeliveryComplete => {
            info!(feature = %args.feature, "delivery already complete");
        }
        other => {
            reasons.push(format!(
                "workflow is not at the delivery checkpoint (next: {})",
                other.display_label()
            ));
        }
    }

    if let Some(raw) = store.read(ArtifactKind::PolicyEvaluation)? {
        match serde_json::from_str::<PolicyEvaluation>(&raw) {
            Ok(evaluation) if !evaluation.clean => {
                reasons.push(format!(
                    "policy evaluation has {} open finding(s)",
                    evaluation.issues.len()
                ));
            }
            Ok(_) => {}
            Err(_) => reasons.push("policy evaluation evidence is unreadable".to_string()),
        }
    }

    let report = score_confidence(
        &args.feature,
        snapshot.presence,
        snapshot.issue_count(),
        &snapshot.verification,
        snapshot.next,
        &generated_at,
    );

    let decision = if reasons.is_empty() { "ship" } else { "hold" };
    let evidence = DeliveryEvidence {
        schema_version: EVIDENCE_SCHEMA_VERSION,
        feature: args.feature.clone(),
        decision: decision.to_string(),
        criteria_total: matrix.total_count,
        criteria_covered: matrix.covered_count,
        confidence_score: report.score,
        reasons: reasons.clone(),
        generated_at,
    };

    let mut staged = StagedWrites::new();
    staged.stage(
        ArtifactKind::CoverageAcTc,
        serde_json::to_string_pretty(&matrix)?,
    );
    staged.stage(
        ArtifactKind::DeliveryDecision,
        serde_json::to_string_pretty(&evidence)?,
    );
    staged.flush(&store)?;

    if decision == "hold" {
        for reason in &reasons {
            warn!(reason = %reason, "delivery blocker");
        }
        bail!(
            "delivery held for '{}' with {} reason(s)",
            args.feature,
            reasons.len()
        );
    }

    info!(
        feature = %args.feature,
        criteria_covered = matrix.covered_count,
        criteria_total = matrix.total_count,
        "delivery decision: ship"
    );
    Ok(())
}
