use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::FeatureArgs;
use crate::config::WorkspaceConfig;
use crate::parse::{AcceptanceCriterion, SpecEntities, parse_spec_document};
use crate::store::{ArtifactKind, ArtifactStore};
use crate::trace::select_criteria_for_rule;

pub fn run(args: FeatureArgs) -> Result<()> {
    let cfg = WorkspaceConfig::load(&args.workspace_root)?;
    let (store, _) = super::feature_store(&cfg, &args.feature);

    let Some(spec_text) = store.read(ArtifactKind::ApprovedSpec)? else {
        info!(next_action = "aitri approve", "no approved spec to derive stories from");
        bail!("feature '{}' has no approved spec", args.feature);
    };

    if store.exists(ArtifactKind::Backlog)? {
        warn!(feature = %args.feature, "backlog already exists; leaving it untouched");
        info!(next_action = "aitri audit", "audit the existing backlog instead");
        return Ok(());
    }

    let entities = parse_spec_document(&spec_text);
    if entities.requirements.is_empty() {
        bail!("approved spec for '{}' declares no functional rules", args.feature);
    }

    let backlog = generate_backlog(&entities, &cfg.stopwords);
    store.write(ArtifactKind::Backlog, &backlog)?;

    info!(
        feature = %args.feature,
        stories = entities.requirements.len(),
        "backlog skeleton generated"
    );
    info!(
        next_action = "aitri audit",
        "review the generated traces, then audit"
    );
    Ok(())
}

/// One story per functional rule. Criteria are linked by the affinity
/// heuristic since no explicit traces exist yet; authors adjust the trace
/// lines before auditing.
fn generate_backlog(entities: &SpecEntities, stopwords: &[String]) -> String {
    let actor = entities
        .actors
        .first()
        .map(|actor| actor.as_str())
        .unwrap_or("product owner");

    let mut out = String::from("## User Stories\n");
    for (index, rule) in entities.requirements.iter().enumerate() {
        let selected = select_criteria_for_rule(rule, &entities.criteria, stopwords);

        out.push_str(&format!(
            "- US-{}: As a {actor}, I want {}\n",
            index + 1,
            lowercase_first(&rule.text)
        ));

        let mut trace_ids = vec![rule.id.clone()];
        trace_ids.extend(selected.iter().map(|criterion| criterion.id.clone()));
        out.push_str(&format!("  - Trace: {}\n", trace_ids.join(", ")));

        for criterion in &selected {
            out.push_str(&format!("  - {}\n", acceptance_bullet(criterion)));
        }
    }

    out
}

fn acceptance_bullet(criterion: &AcceptanceCriterion) -> String {
    match &criterion.gherkin {
        Some(triple) => {
            let given = if triple.given.is_empty() {
                "the prepared context"
            } else {
                triple.given.as_str()
            };
            format!("Given {given}, when {}, then {}", triple.when, triple.then)
        }
        None => format!(
            "Given the prepared context, when {}, then the behaviour holds",
            lowercase_first(&criterion.text)
        ),
    }
}

fn lowercase_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
