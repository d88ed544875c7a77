use std::fs;

use anyhow::Result;
use tracing::info;

use crate::cli::PolicyArgs;
use crate::config::WorkspaceConfig;
use crate::policy::{
    ChangedFile, POLICY_SCHEMA_VERSION, PolicyEvaluation, PolicyRules, evaluate_policy,
};
use crate::store::{ArtifactKind, StagedWrites};
use crate::util::now_utc_string;
use crate::vcs::changed_files;

pub fn run(args: PolicyArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, _) = super::feature_store(&cfg, &args.feature);
    let repo_root = args
        .repo_root
        .clone()
        .unwrap_or_else(|| args.workspace_root.clone());

    let paths = changed_files(&repo_root)?;
    info!(changed = paths.len(), repo = %repo_root.display(), "inspecting working tree");

    let changed = paths
        .iter()
        .map(|path| ChangedFile {
            path: path.clone(),
            source: fs::read_to_string(repo_root.join(path)).ok(),
        })
        .collect::<Vec<ChangedFile>>();

    let issues = evaluate_policy(
        &changed,
        PolicyRules {
            forbidden_paths: &cfg.forbidden_paths,
            blocked_imports: &cfg.blocked_imports,
        },
        args.dependencies_approved,
    );

    let evaluation = PolicyEvaluation {
        schema_version: POLICY_SCHEMA_VERSION,
        feature: args.feature.clone(),
        generated_at: now_utc_string(),
        changed_files: paths,
        clean: issues.is_empty(),
        issues: issues.clone(),
    };

    let mut staged = StagedWrites::new();
    staged.stage(
        ArtifactKind::PolicyEvaluation,
        serde_json::to_string_pretty(&evaluation)?,
    );
    staged.flush(&store)?;

    if !issues.is_empty() {
        return super::fail_gate(&issues, "resolve the policy findings and re-run aitri policy");
    }

    info!(feature = %args.feature, "policy evaluation clean");
    Ok(())
}
