use anyhow::Result;
use tracing::info;

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::util::ensure_directory;

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let feature_root = cfg.feature_root(&args.feature);

    ensure_directory(&feature_root)?;
    ensure_directory(&feature_root.join("evidence"))?;
    ensure_directory(&feature_root.join("build"))?;

    info!(
        feature = %args.feature,
        path = %feature_root.display(),
        "feature structure initialized"
    );
    info!(next_action = "aitri draft", "structure ready");
    Ok(())
}
