use anyhow::Result;
use tracing::info;

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::confidence::score_confidence;
use crate::snapshot::collect_snapshot;
use crate::store::{ArtifactKind, StagedWrites};
use crate::util::now_utc_string;

pub fn run(args: FeatureArgs) -> Result<()> {
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

    let mut staged = StagedWrites::new();
    staged.stage(
        ArtifactKind::ConfidenceReport,
        serde_json::to_string_pretty(&report)?,
    );
    staged.flush(&store)?;

    info!(
        feature = %args.feature,
        score = report.score,
        level = report.level.as_str(),
        spec_integrity = report.components.spec_integrity,
        runtime_verification = report.components.runtime_verification,
        release_ready = report.release_ready,
        "confidence computed"
    );
    for reason in &report.reasons {
        info!(reason = %reason, "confidence factor");
    }
    info!(next_action = snapshot.next.display_label(), "workflow position");
    Ok(())
}
