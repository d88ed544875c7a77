use anyhow::{Result, bail};
use tracing::info;

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::gate::{DocStatus, GateContext, validate_spec_document};
use crate::store::{ArtifactKind, ArtifactStore, StagedWrites};

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, _) = super::feature_store(&cfg, &args.feature);

    let Some(draft) = store.read(ArtifactKind::DraftSpec)? else {
        info!(next_action = "aitri draft", "no draft to approve");
        bail!("feature '{}' has no draft spec", args.feature);
    };

    let ctx = GateContext {
        asset_keywords: &cfg.asset_keywords,
        ui_keywords: &cfg.ui_keywords,
    };
    let issues = validate_spec_document(&draft, DocStatus::Draft, &ctx);
    if !issues.is_empty() {
        return super::fail_gate(&issues, "edit the draft and re-run aitri approve");
    }

    let approved = draft.replacen(
        DocStatus::Draft.marker_line(),
        DocStatus::Approved.marker_line(),
        1,
    );

    let mut staged = StagedWrites::new();
    staged.stage(ArtifactKind::ApprovedSpec, approved);
    staged.flush(&store)?;

    info!(feature = %args.feature, "draft approved");
    info!(next_action = "aitri plan", "author discovery and plan documents");
    Ok(())
}
