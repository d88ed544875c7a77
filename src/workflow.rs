use serde::{Deserialize, Serialize};

/// The single canonical next action for a feature. Recomputed from scratch
/// on every invocation; nothing about it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Init,
    Draft,
    Approve,
    Plan,
    Verify,
    ReadyForHumanApproval,
    BuildPending,
    VerifyPending,
    DeliverPending,
    DeliveryComplete,
}

impl NextStep {
    /// What to tell the operator to run or wait for.
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Init => "aitri init",
            Self::Draft => "aitri draft",
            Self::Approve => "aitri approve",
            Self::Plan => "aitri plan",
            Self::Verify => "aitri verify",
            Self::ReadyForHumanApproval => "ready_for_human_approval",
            Self::BuildPending => "build_pending",
            Self::VerifyPending => "verify_pending",
            Self::DeliverPending => "deliver_pending",
            Self::DeliveryComplete => "delivery_complete",
        }
    }
}

/// Post-go verification evidence as the state machine sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostGoVerification {
    pub succeeded: bool,
    pub coverage_mode: String,
    pub declared_mode: String,
    pub declared_count: usize,
    pub passing_count: usize,
}

impl PostGoVerification {
    /// Ready means: the run succeeded, it ran in the mode the scaffold
    /// declared, and every declared case passed.
    pub fn is_ready(&self) -> bool {
        self.succeeded
            && !self.declared_mode.is_empty()
            && self.coverage_mode == self.declared_mode
            && self.declared_count > 0
            && self.passing_count == self.declared_count
    }
}

/// Presence/validity flags for one feature, derived from the current
/// artifact snapshot.
#[derive(Debug, Clone, Default)]
pub struct WorkflowArtifactSet {
    pub structure_present: bool,
    pub draft_present: bool,
    pub approved_spec_present: bool,
    pub discovery_present: bool,
    pub plan_present: bool,
    pub verification_passed: bool,
    pub go_recorded: bool,
    pub scaffold_ready: bool,
    pub implement_ready: bool,
    pub build_ready: bool,
    pub post_go_verification: Option<PostGoVerification>,
    pub ship_decided: bool,
}

/// Total transition function, evaluated top-down, first match wins.
pub fn next_step(set: &WorkflowArtifactSet) -> NextStep {
    if set.go_recorded {
        let build_done = (set.scaffold_ready && set.implement_ready) || set.build_ready;
        if !build_done {
            return NextStep::BuildPending;
        }

        let verify_ready = set
            .post_go_verification
            .as_ref()
            .map(PostGoVerification::is_ready)
            .unwrap_or(false);
        if !verify_ready {
            return NextStep::VerifyPending;
        }

        if !set.ship_decided {
            return NextStep::DeliverPending;
        }
        return NextStep::DeliveryComplete;
    }

    if !set.structure_present {
        return NextStep::Init;
    }

    if !set.approved_spec_present {
        if !set.draft_present {
            return NextStep::Draft;
        }
        return NextStep::Approve;
    }

    if !set.discovery_present || !set.plan_present {
        return NextStep::Plan;
    }

    if !set.verification_passed {
        return NextStep::Verify;
    }

    NextStep::ReadyForHumanApproval
}

#[cfg(test)]
mod tests {
    use super::{NextStep, PostGoVerification, WorkflowArtifactSet, next_step};

    fn pre_go_ready() -> WorkflowArtifactSet {
        WorkflowArtifactSet {
            structure_present: true,
            draft_present: true,
            approved_spec_present: true,
            discovery_present: true,
            plan_present: true,
            verification_passed: true,
            ..WorkflowArtifactSet::default()
        }
    }

    fn ready_verification() -> PostGoVerification {
        PostGoVerification {
            succeeded: true,
            coverage_mode: "full".to_string(),
            declared_mode: "full".to_string(),
            declared_count: 4,
            passing_count: 4,
        }
    }

    #[test]
    fn missing_structure_starts_at_init() {
        let set = WorkflowArtifactSet::default();
        assert_eq!(next_step(&set), NextStep::Init);
    }

    #[test]
    fn no_draft_asks_for_a_draft() {
        let set = WorkflowArtifactSet {
            structure_present: true,
            ..WorkflowArtifactSet::default()
        };
        assert_eq!(next_step(&set), NextStep::Draft);
    }

    #[test]
    fn unapproved_draft_asks_for_approval() {
        let set = WorkflowArtifactSet {
            structure_present: true,
            draft_present: true,
            ..WorkflowArtifactSet::default()
        };
        assert_eq!(next_step(&set), NextStep::Approve);
    }

    #[test]
    fn missing_planning_artifacts_ask_for_plan() {
        let set = WorkflowArtifactSet {
            structure_present: true,
            draft_present: true,
            approved_spec_present: true,
            discovery_present: true,
            ..WorkflowArtifactSet::default()
        };
        assert_eq!(next_step(&set), NextStep::Plan);
    }

    #[test]
    fn failed_pre_go_verification_asks_for_verify() {
        let set = WorkflowArtifactSet {
            verification_passed: false,
            ..pre_go_ready()
        };
        assert_eq!(next_step(&set), NextStep::Verify);
    }

    #[test]
    fn everything_present_and_verified_is_ready_for_human_approval() {
        assert_eq!(next_step(&pre_go_ready()), NextStep::ReadyForHumanApproval);
    }

    #[test]
    fn a_go_decision_without_build_readiness_is_build_pending() {
        let set = WorkflowArtifactSet {
            go_recorded: true,
            scaffold_ready: true,
            ..pre_go_ready()
        };
        assert_eq!(next_step(&set), NextStep::BuildPending);
    }

    #[test]
    fn build_readiness_alone_satisfies_the_build_gate() {
        let set = WorkflowArtifactSet {
            go_recorded: true,
            build_ready: true,
            ..pre_go_ready()
        };
        assert_eq!(next_step(&set), NextStep::VerifyPending);
    }

    #[test]
    fn post_go_verification_must_match_the_declared_mode() {
        let verification = PostGoVerification {
            coverage_mode: "smoke".to_string(),
            ..ready_verification()
        };
        let set = WorkflowArtifactSet {
            go_recorded: true,
            scaffold_ready: true,
            implement_ready: true,
            post_go_verification: Some(verification),
            ..pre_go_ready()
        };
        assert_eq!(next_step(&set), NextStep::VerifyPending);
    }

    #[test]
    fn partial_passes_keep_verification_pending() {
        let verification = PostGoVerification {
            passing_count: 3,
            ..ready_verification()
        };
        let set = WorkflowArtifactSet {
            go_recorded: true,
            build_ready: true,
            post_go_verification: Some(verification),
            ..pre_go_ready()
        };
        assert_eq!(next_step(&set), NextStep::VerifyPending);
    }

    #[test]
    fn ready_verification_without_ship_decision_is_deliver_pending() {
        let set = WorkflowArtifactSet {
            go_recorded: true,
            build_ready: true,
            post_go_verification: Some(ready_verification()),
            ..pre_go_ready()
        };
        assert_eq!(next_step(&set), NextStep::DeliverPending);
    }

    #[test]
    fn a_ship_decision_completes_delivery() {
        let set = WorkflowArtifactSet {
            go_recorded: true,
            build_ready: true,
            post_go_verification: Some(ready_verification()),
            ship_decided: true,
            ..pre_go_ready()
        };
        assert_eq!(next_step(&set), NextStep::DeliveryComplete);
    }

    #[test]
    fn the_function_is_total_and_deterministic() {
        let set = pre_go_ready();
        assert_eq!(next_step(&set), next_step(&set));
    }
}
