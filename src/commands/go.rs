use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::GoArgs;
use crate::config::WorkspaceConfig;
use crate::confidence::score_confidence;
use crate::model::{EVIDENCE_SCHEMA_VERSION, GoDecisionEvidence};
use crate::snapshot::collect_snapshot;
use crate::store::{ArtifactKind, StagedWrites};
use crate::util::now_utc_string;
use crate::vcs::create_tag;
use crate::workflow::NextStep;

pub fn run(args: GoArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, structure_present) = super::feature_store(&cfg, &args.feature);

    let snapshot = collect_snapshot(&store, &cfg, structure_present)?;
    let report = score_confidence(
        &args.feature,
        snapshot.presence,
        snapshot.issue_count(),
        &snapshot.verification,
        snapshot.next,
        &now_utc_string(),
    );

    if snapshot.next != NextStep::ReadyForHumanApproval {
        info!(next_action = snapshot.next.display_label(), "workflow position");
        bail!(
            "feature '{}' is not awaiting human approval (next: {})",
            args.feature,
            snapshot.next.display_label()
        );
    }
    if !report.release_ready {
        for reason in &report.reasons {
            warn!(reason = %reason, "blocking confidence factor");
        }
        bail!(
            "confidence {} is below the release threshold for '{}'",
            report.score,
            args.feature
        );
    }

    let decision = GoDecisionEvidence {
        schema_version: EVIDENCE_SCHEMA_VERSION,
        feature: args.feature.clone(),
        decision: "go".to_string(),
        rationale: args.rationale.clone(),
        confidence_score: report.score,
        generated_at: now_utc_string(),
    };

    let mut staged = StagedWrites::new();
    staged.stage(
        ArtifactKind::GoDecision,
        serde_json::to_string_pretty(&decision)?,
    );
    staged.flush(&store)?;

    let tag = format!("aitri-go-{}", args.feature);
    if let Err(error) = create_tag(&args.workspace_root, &tag) {
        warn!(tag = %tag, error = %error, "checkpoint tag not written");
    }

    info!(
        feature = %args.feature,
        score = report.score,
        "go decision recorded"
    );
    Ok(())
}
