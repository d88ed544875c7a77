use anyhow::Result;
use tracing::{info, warn};

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::confidence::{ConfidenceReport, VerificationSignal, score_confidence};
use crate::parse::{detect_profile, parse_spec_document};
use crate::snapshot::collect_snapshot;
use crate::store::{ArtifactKind, ArtifactStore};
use crate::util::now_utc_string;

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, structure_present) = super::feature_store(&cfg, &args.feature);

    info!(feature = %args.feature, workspace = %args.workspace_root.display(), "status requested");

    if !structure_present {
        warn!(feature = %args.feature, "feature structure missing");
        info!(next_action = "aitri init", "workflow position");
        return Ok(());
    }

    let snapshot = collect_snapshot(&store, &cfg, structure_present)?;

    let backlog_present = store.exists(ArtifactKind::Backlog)?;
    let tests_present = store.exists(ArtifactKind::Tests)?;
    info!(
        draft = snapshot.artifact_set.draft_present,
        approved_spec = snapshot.artifact_set.approved_spec_present,
        discovery = snapshot.artifact_set.discovery_present,
        plan = snapshot.artifact_set.plan_present,
        backlog = backlog_present,
        tests = tests_present,
        "artifact presence"
    );
    info!(
        spec = snapshot.presence.approved_spec,
        discovery = snapshot.presence.discovery,
        plan = snapshot.presence.plan,
        backlog = snapshot.presence.backlog,
        tests = snapshot.presence.tests,
        "artifact validity"
    );

    if let Some(spec_text) = store
        .read(ArtifactKind::ApprovedSpec)?
        .or(store.read(ArtifactKind::DraftSpec)?)
    {
        let profile = detect_profile(&spec_text, &cfg.detection_rules, &cfg.detection_fallback);
        info!(
            profile = %profile.label,
            confidence = profile.confidence.as_str(),
            matched_patterns = profile.matched_patterns,
            "stack profile"
        );

        let entities = parse_spec_document(&spec_text);
        let explicit_gherkin = entities
            .criteria
            .iter()
            .filter(|criterion| {
                criterion
                    .gherkin
                    .as_ref()
                    .map(|triple| triple.explicit)
                    .unwrap_or(false)
            })
            .count();
        info!(
            functional_rules = entities.requirements.len(),
            acceptance_criteria = entities.criteria.len(),
            explicit_gherkin,
            actors = entities.actors.len(),
            edge_cases = entities.edge_cases.len(),
            security_notes = entities.security_notes.len(),
            out_of_scope = entities.out_of_scope.len(),
            "spec entities"
        );
        for screen in &entities.ui.screens {
            info!(
                screen = %screen.name,
                components = screen.components.len(),
                "ui screen"
            );
        }
        for flow in &entities.ui.flows {
            info!(from = %flow.from, to = %flow.to, "ui flow");
        }
        for reference in &entities.ui.refs {
            info!(
                id = %reference.id,
                path = %reference.path,
                linked_criteria = reference.ac_ids.len(),
                "ui reference"
            );
        }
    }

    match &snapshot.verification {
        VerificationSignal::NotRequired => info!("verification not required"),
        VerificationSignal::Passed { command, .. } => {
            info!(command = %command, "last verification passed")
        }
        VerificationSignal::Stale => warn!("verification evidence is stale"),
        VerificationSignal::Failed => warn!("last verification run failed"),
        VerificationSignal::Invalid => warn!("verification evidence is unreadable"),
        VerificationSignal::Missing => warn!("no verification evidence recorded"),
    }

    if snapshot.issue_count() > 0 {
        warn!(open_issues = snapshot.issue_count(), "validation issues outstanding");
        for issue in &snapshot.issues {
            warn!(category = issue.category.as_str(), "{}", issue.message);
        }
    }

    match store.read(ArtifactKind::ConfidenceReport)? {
        Some(raw) => match serde_json::from_str::<ConfidenceReport>(&raw) {
            Ok(report) => info!(
                score = report.score,
                level = report.level.as_str(),
                release_ready = report.release_ready,
                "recorded confidence"
            ),
            Err(_) => warn!("confidence evidence is unreadable"),
        },
        None => {
            let report = score_confidence(
                &args.feature,
                snapshot.presence,
                snapshot.issue_count(),
                &snapshot.verification,
                snapshot.next,
                &now_utc_string(),
            );
            info!(
                score = report.score,
                level = report.level.as_str(),
                "confidence (not yet recorded)"
            );
        }
    }

    info!(next_action = snapshot.next.display_label(), "workflow position");
    Ok(())
}
