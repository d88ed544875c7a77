use anyhow::Result;
use tracing::info;

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::gate::{
    GateContext, Issue, IssueCategory, validate_discovery_document, validate_plan_document,
};
use crate::store::{ArtifactKind, ArtifactStore};

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, _) = super::feature_store(&cfg, &args.feature);
    let ctx = GateContext {
        asset_keywords: &cfg.asset_keywords,
        ui_keywords: &cfg.ui_keywords,
    };

    let spec_text = store.read(ArtifactKind::ApprovedSpec)?;
    let mut issues = Vec::<Issue>::new();

    match store.read(ArtifactKind::Discovery)? {
        Some(text) => issues.extend(validate_discovery_document(&text, &ctx)),
        None => issues.push(Issue::new(
            IssueCategory::MissingArtifact,
            "Discovery artifact is absent",
        )),
    }

    match store.read(ArtifactKind::Plan)? {
        Some(text) => issues.extend(validate_plan_document(&text, spec_text.as_deref(), &ctx)),
        None => issues.push(Issue::new(
            IssueCategory::MissingArtifact,
            "Plan artifact is absent",
        )),
    }

    if !issues.is_empty() {
        return super::fail_gate(
            &issues,
            "complete the discovery and plan documents, then re-run aitri plan",
        );
    }

    info!(feature = %args.feature, "planning artifacts pass the persona gates");
    info!(next_action = "aitri verify", "record runtime verification next");
    Ok(())
}
