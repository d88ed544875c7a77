use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::config::WorkspaceConfig;
use crate::gate::Issue;
use crate::store::FsArtifactStore;

pub mod approve;
pub mod audit;
pub mod backlog;
pub mod confidence;
pub mod deliver;
pub mod draft;
pub mod go;
pub mod init;
pub mod plan;
pub mod policy;
pub mod status;
pub mod verify;

/// Store bound to one feature plus whether its directory layout exists yet.
pub(crate) fn feature_store(cfg: &WorkspaceConfig, feature: &str) -> (FsArtifactStore, bool) {
    let feature_root = cfg.feature_root(feature);
    let structure_present = feature_root.is_dir();
    (FsArtifactStore::new(&feature_root), structure_present)
}

/// Gate failure reporting: the complete named issue list plus the single
/// next action, then a non-zero exit via the error chain.
pub(crate) fn fail_gate(issues: &[Issue], next_action: &str) -> Result<()> {
    for issue in issues {
        warn!(category = issue.category.as_str(), "{}", issue.message);
    }
    info!(next_action = next_action, "gate blocked");
    bail!("gate failed with {} issue(s)", issues.len())
}
