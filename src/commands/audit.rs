use anyhow::{Result, bail};
use tracing::info;

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::coverage::{CoverageMatrix, DownstreamEntry, build_coverage_rows};
use crate::gate::validate_traceability;
use crate::parse::{parse_backlog, parse_spec_document, parse_tests_document};
use crate::store::{ArtifactKind, ArtifactStore, StagedWrites};
use crate::util::now_utc_string;

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, _) = super::feature_store(&cfg, &args.feature);

    let Some(spec_text) = store.read(ArtifactKind::ApprovedSpec)? else {
        info!(next_action = "aitri approve", "no approved spec to audit against");
        bail!("feature '{}' has no approved spec", args.feature);
    };
    let backlog_text = store.read(ArtifactKind::Backlog)?;
    let tests_text = store.read(ArtifactKind::Tests)?;

    let entities = parse_spec_document(&spec_text);
    let fr_ids = entities
        .requirements
        .iter()
        .map(|requirement| requirement.id.clone())
        .collect::<Vec<String>>();
    let generated_at = now_utc_string();

    let mut staged = StagedWrites::new();

    if let Some(backlog) = backlog_text.as_deref() {
        let stories = parse_backlog(backlog);
        let downstream = stories
            .iter()
            .map(|story| DownstreamEntry {
                id: story.id.clone(),
                trace_ids: story.fr_ids.clone(),
            })
            .collect::<Vec<DownstreamEntry>>();
        let rows = build_coverage_rows(&fr_ids, &downstream, &|_| true);
        let matrix = CoverageMatrix::new(&args.feature, "FR", "US", &generated_at, rows);
        info!(
            covered = matrix.covered_count,
            total = matrix.total_count,
            "FR -> US coverage"
        );
        staged.stage(ArtifactKind::CoverageFrUs, serde_json::to_string_pretty(&matrix)?);
    }

    if let Some(tests) = tests_text.as_deref() {
        let cases = parse_tests_document(tests);

        let fr_downstream = cases
            .iter()
            .map(|case| DownstreamEntry {
                id: case.id.clone(),
                trace_ids: case.fr_ids.clone(),
            })
            .collect::<Vec<DownstreamEntry>>();
        let rows = build_coverage_rows(&fr_ids, &fr_downstream, &|_| true);
        let matrix = CoverageMatrix::new(&args.feature, "FR", "TC", &generated_at, rows);
        info!(
            covered = matrix.covered_count,
            total = matrix.total_count,
            "FR -> TC coverage"
        );
        staged.stage(ArtifactKind::CoverageFrTc, serde_json::to_string_pretty(&matrix)?);

        if let Some(backlog) = backlog_text.as_deref() {
            let us_ids = parse_backlog(backlog)
                .iter()
                .map(|story| story.id.clone())
                .collect::<Vec<String>>();
            let us_downstream = cases
                .iter()
                .map(|case| DownstreamEntry {
                    id: case.id.clone(),
                    trace_ids: case.us_ids.clone(),
                })
                .collect::<Vec<DownstreamEntry>>();
            let rows = build_coverage_rows(&us_ids, &us_downstream, &|_| true);
            let matrix = CoverageMatrix::new(&args.feature, "US", "TC", &generated_at, rows);
            info!(
                covered = matrix.covered_count,
                total = matrix.total_count,
                "US -> TC coverage"
            );
            staged.stage(ArtifactKind::CoverageUsTc, serde_json::to_string_pretty(&matrix)?);
        }
    }

    let issues = validate_traceability(&spec_text, backlog_text.as_deref(), tests_text.as_deref());

    // Matrices are the audit's evidence and record the gaps themselves, so
    // they flush even when the gate blocks.
    staged.flush(&store)?;

    if !issues.is_empty() {
        return super::fail_gate(
            &issues,
            "add trace lines for the uncovered ids and re-run aitri audit",
        );
    }

    info!(feature = %args.feature, "traceability audit clean");
    Ok(())
}
