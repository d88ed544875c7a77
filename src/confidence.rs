use serde::{Deserialize, Serialize};

use crate::workflow::NextStep;

pub const CONFIDENCE_SCHEMA_VERSION: u32 = 1;

const SPEC_INTEGRITY_WEIGHT: f64 = 0.4;
const RUNTIME_VERIFICATION_WEIGHT: f64 = 0.6;
const ARTIFACT_COVERAGE_WEIGHT: f64 = 0.4;
const TRACEABILITY_WEIGHT: f64 = 0.6;
const RUNTIME_FLOOR: u32 = 60;
const SMOKE_PENALTY: u32 = 25;
const MANUAL_OVERRIDE_PENALTY: u32 = 15;
const HIGH_THRESHOLD: u32 = 85;
const MEDIUM_THRESHOLD: u32 = 60;

/// Present-and-valid flags for the five audited artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactPresence {
    pub approved_spec: bool,
    pub discovery: bool,
    pub plan: bool,
    pub backlog: bool,
    pub tests: bool,
}

impl ArtifactPresence {
    fn present_count(self) -> usize {
        [
            self.approved_spec,
            self.discovery,
            self.plan,
            self.backlog,
            self.tests,
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// Outcome of the most recent verification run as the scorer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationSignal {
    /// Verification is not required in this context.
    NotRequired,
    Passed {
        command: String,
        manual_override: bool,
        /// `(passing, declared)` test-case counts when available.
        tc_ratio: Option<(usize, usize)>,
    },
    Stale,
    Failed,
    Invalid,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceComponents {
    pub spec_integrity: u32,
    pub runtime_verification: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceWeights {
    pub spec_integrity: f64,
    pub runtime_verification: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    pub schema_version: u32,
    pub feature: String,
    pub score: u32,
    pub level: ConfidenceLevel,
    pub components: ConfidenceComponents,
    pub weights: ConfidenceWeights,
    pub release_ready: bool,
    pub reasons: Vec<String>,
    pub generated_at: String,
}

/// Pure weighted scorer over the artifact snapshot, the accumulated gate
/// issues and the runtime verification signal.
pub fn score_confidence(
    feature: &str,
    presence: ArtifactPresence,
    issue_count: usize,
    verification: &VerificationSignal,
    next_step: NextStep,
    generated_at: &str,
) -> ConfidenceReport {
    let mut reasons = Vec::<String>::new();

    let spec_integrity = spec_integrity_score(presence, issue_count, &mut reasons);
    let runtime_verification = runtime_verification_score(verification, &mut reasons);

    let score = (SPEC_INTEGRITY_WEIGHT * f64::from(spec_integrity)
        + RUNTIME_VERIFICATION_WEIGHT * f64::from(runtime_verification))
    .round() as u32;

    let level = if score >= HIGH_THRESHOLD {
        ConfidenceLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    let release_ready = next_step == NextStep::ReadyForHumanApproval && score >= HIGH_THRESHOLD;
    if !release_ready && next_step != NextStep::ReadyForHumanApproval {
        reasons.push(format!(
            "workflow is not awaiting human approval (next: {})",
            next_step.display_label()
        ));
    }

    ConfidenceReport {
        schema_version: CONFIDENCE_SCHEMA_VERSION,
        feature: feature.to_string(),
        score,
        level,
        components: ConfidenceComponents {
            spec_integrity,
            runtime_verification,
        },
        weights: ConfidenceWeights {
            spec_integrity: SPEC_INTEGRITY_WEIGHT,
            runtime_verification: RUNTIME_VERIFICATION_WEIGHT,
        },
        release_ready,
        reasons,
        generated_at: generated_at.to_string(),
    }
}

fn spec_integrity_score(
    presence: ArtifactPresence,
    issue_count: usize,
    reasons: &mut Vec<String>,
) -> u32 {
    if !presence.approved_spec {
        reasons.push("no approved requirement document exists".to_string());
        return 0;
    }

    let artifact_coverage = 100.0 * presence.present_count() as f64 / 5.0;
    let traceability = if issue_count == 0 {
        100.0
    } else {
        reasons.push(format!("{issue_count} open validation issue(s)"));
        (50.0 - 10.0 * (issue_count as f64 - 1.0)).max(0.0)
    };

    (ARTIFACT_COVERAGE_WEIGHT * artifact_coverage + TRACEABILITY_WEIGHT * traceability).round()
        as u32
}

fn runtime_verification_score(
    verification: &VerificationSignal,
    reasons: &mut Vec<String>,
) -> u32 {
    match verification {
        VerificationSignal::NotRequired => 100,
        VerificationSignal::Passed {
            command,
            manual_override,
            tc_ratio,
        } => {
            let mut score: u32 = 100;

            if command.contains("smoke") {
                score = score.saturating_sub(SMOKE_PENALTY);
                reasons.push("verification ran in smoke mode".to_string());
            }
            if *manual_override {
                score = score.saturating_sub(MANUAL_OVERRIDE_PENALTY);
                reasons.push("verification command was supplied manually".to_string());
            }
            if let Some((passing, declared)) = tc_ratio {
                if *declared > 0 {
                    let cap = (100.0 * *passing as f64 / *declared as f64).round() as u32;
                    if cap < score {
                        score = cap;
                        reasons.push(format!(
                            "only {passing}/{declared} declared test case(s) passing"
                        ));
                    }
                }
            }

            score.max(RUNTIME_FLOOR)
        }
        VerificationSignal::Stale => {
            reasons.push("verification evidence is stale".to_string());
            55
        }
        VerificationSignal::Failed => {
            reasons.push("last verification run failed".to_string());
            25
        }
        VerificationSignal::Invalid => {
            reasons.push("verification evidence is unreadable".to_string());
            10
        }
        VerificationSignal::Missing => {
            reasons.push("no verification evidence recorded".to_string());
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ArtifactPresence, ConfidenceLevel, VerificationSignal, score_confidence,
    };
    use crate::workflow::NextStep;

    const NOW: &str = "2026-01-01T00:00:00Z";

    fn all_present() -> ArtifactPresence {
        ArtifactPresence {
            approved_spec: true,
            discovery: true,
            plan: true,
            backlog: true,
            tests: true,
        }
    }

    fn passed_clean() -> VerificationSignal {
        VerificationSignal::Passed {
            command: "cargo test".to_string(),
            manual_override: false,
            tc_ratio: None,
        }
    }

    #[test]
    fn no_approved_spec_zeroes_spec_integrity() {
        let presence = ArtifactPresence {
            approved_spec: false,
            ..all_present()
        };
        let report = score_confidence(
            "demo",
            presence,
            0,
            &passed_clean(),
            NextStep::Draft,
            NOW,
        );
        assert_eq!(report.components.spec_integrity, 0);
        assert!(
            report
                .reasons
                .iter()
                .any(|reason| reason.contains("no approved requirement document"))
        );
    }

    #[test]
    fn four_of_five_artifacts_with_clean_validation_score_92() {
        let presence = ArtifactPresence {
            tests: false,
            ..all_present()
        };
        let report = score_confidence(
            "demo",
            presence,
            0,
            &passed_clean(),
            NextStep::ReadyForHumanApproval,
            NOW,
        );
        // artifactCoverage=80, traceabilityScore=100 -> round(0.4*80 + 0.6*100)
        assert_eq!(report.components.spec_integrity, 92);
    }

    #[test]
    fn smoke_command_scores_75_without_ratio_data() {
        let verification = VerificationSignal::Passed {
            command: "npm run test:smoke".to_string(),
            manual_override: false,
            tc_ratio: None,
        };
        let report = score_confidence(
            "demo",
            all_present(),
            0,
            &verification,
            NextStep::ReadyForHumanApproval,
            NOW,
        );
        assert_eq!(report.components.runtime_verification, 75);
    }

    #[test]
    fn penalties_are_floored_at_60() {
        let verification = VerificationSignal::Passed {
            command: "smoke".to_string(),
            manual_override: true,
            tc_ratio: Some((1, 4)),
        };
        let report = score_confidence(
            "demo",
            all_present(),
            0,
            &verification,
            NextStep::ReadyForHumanApproval,
            NOW,
        );
        assert_eq!(report.components.runtime_verification, 60);
    }

    #[test]
    fn tc_ratio_caps_but_never_raises_the_score() {
        let verification = VerificationSignal::Passed {
            command: "cargo test".to_string(),
            manual_override: false,
            tc_ratio: Some((7, 10)),
        };
        let report = score_confidence(
            "demo",
            all_present(),
            0,
            &verification,
            NextStep::ReadyForHumanApproval,
            NOW,
        );
        assert_eq!(report.components.runtime_verification, 70);
    }

    #[test]
    fn failure_statuses_map_to_fixed_scores() {
        for (signal, expected) in [
            (VerificationSignal::Stale, 55),
            (VerificationSignal::Failed, 25),
            (VerificationSignal::Invalid, 10),
            (VerificationSignal::Missing, 0),
        ] {
            let report = score_confidence(
                "demo",
                all_present(),
                0,
                &signal,
                NextStep::Verify,
                NOW,
            );
            assert_eq!(report.components.runtime_verification, expected);
        }
    }

    #[test]
    fn issue_count_degrades_traceability_linearly() {
        // issueCount=3 -> traceability = 50 - 10*2 = 30;
        // specIntegrity = round(0.4*100 + 0.6*30) = 58
        let report = score_confidence(
            "demo",
            all_present(),
            3,
            &passed_clean(),
            NextStep::Approve,
            NOW,
        );
        assert_eq!(report.components.spec_integrity, 58);
    }

    #[test]
    fn many_issues_floor_traceability_at_zero() {
        let report = score_confidence(
            "demo",
            all_present(),
            12,
            &passed_clean(),
            NextStep::Approve,
            NOW,
        );
        // traceability floored at 0 -> specIntegrity = round(0.4*100) = 40
        assert_eq!(report.components.spec_integrity, 40);
    }

    #[test]
    fn release_ready_needs_both_the_state_and_the_score() {
        let report = score_confidence(
            "demo",
            all_present(),
            0,
            &passed_clean(),
            NextStep::ReadyForHumanApproval,
            NOW,
        );
        assert_eq!(report.score, 100);
        assert_eq!(report.level, ConfidenceLevel::High);
        assert!(report.release_ready);

        let pending = score_confidence(
            "demo",
            all_present(),
            0,
            &passed_clean(),
            NextStep::BuildPending,
            NOW,
        );
        assert!(!pending.release_ready);
    }

    #[test]
    fn verification_not_required_scores_100() {
        let report = score_confidence(
            "demo",
            all_present(),
            0,
            &VerificationSignal::NotRequired,
            NextStep::ReadyForHumanApproval,
            NOW,
        );
        assert_eq!(report.components.runtime_verification, 100);
    }
}
