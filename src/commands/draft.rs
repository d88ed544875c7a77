use anyhow::Result;
use tracing::{info, warn};

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::store::{ArtifactKind, ArtifactStore};

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, structure_present) = super::feature_store(&cfg, &args.feature);

    if !structure_present {
        warn!(feature = %args.feature, "feature structure missing");
        info!(next_action = "aitri init", "initialize the feature first");
        anyhow::bail!("feature '{}' is not initialized", args.feature);
    }

    if store.exists(ArtifactKind::DraftSpec)? {
        warn!(feature = %args.feature, "draft spec already exists; leaving it untouched");
        info!(next_action = "aitri approve", "edit the draft, then gate it");
        return Ok(());
    }

    store.write(ArtifactKind::DraftSpec, &draft_template(&args.feature))?;
    info!(feature = %args.feature, "draft spec template written");
    info!(
        next_action = "aitri approve",
        "replace every placeholder, then gate the draft"
    );
    Ok(())
}

/// Template whose placeholder bullets deliberately fail the approval gate
/// until an author replaces them.
fn draft_template(feature: &str) -> String {
    format!(
        "STATUS: DRAFT\n\n\
         # {feature}\n\n\
         ## Context\n<describe the feature and who needs it>\n\n\
         ## Actors\n- <actor>\n\n\
         ## Functional Rules\n- FR-1: <verifiable rule>\n\n\
         ## Acceptance Criteria\n- AC-1: Given <context>, when <action>, then <expected>\n\n\
         ## Edge Cases\n- <edge case>\n\n\
         ## Security Considerations\n- <security note>\n\n\
         ## Out of Scope\n- <excluded item>\n"
    )
}
