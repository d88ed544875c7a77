use serde::{Deserialize, Serialize};

pub const EVIDENCE_SCHEMA_VERSION: u32 = 1;

/// SHA-256 of an artifact's text at the time evidence was computed, so later
/// invocations can tell fresh evidence from stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactFingerprint {
    pub kind: String,
    pub sha256: String,
}

/// Persisted outcome of one verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEvidence {
    pub schema_version: u32,
    pub feature: String,
    /// `passed`, `failed` or `verification_timeout`.
    pub status: String,
    pub command: String,
    pub manual_override: bool,
    /// Coverage mode the run executed in (`full` or `smoke`).
    pub coverage_mode: String,
    pub declared_count: usize,
    pub passing_count: usize,
    pub duration_ms: u64,
    pub exit_code: Option<i32>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    pub artifact_fingerprints: Vec<ArtifactFingerprint>,
    pub generated_at: String,
}

/// Build-stage readiness marker written by external build tooling
/// (`scaffold`, `implement` or `build`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessEvidence {
    pub schema_version: u32,
    pub feature: String,
    pub stage: String,
    pub status: String,
    /// Coverage mode the scaffold declares for post-go verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_mode: Option<String>,
    pub generated_at: String,
}

/// The recorded human go decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoDecisionEvidence {
    pub schema_version: u32,
    pub feature: String,
    pub decision: String,
    pub rationale: String,
    pub confidence_score: u32,
    pub generated_at: String,
}

/// The delivery checkpoint outcome: `ship` or `hold` plus the reasons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEvidence {
    pub schema_version: u32,
    pub feature: String,
    pub decision: String,
    pub criteria_total: usize,
    pub criteria_covered: usize,
    pub confidence_score: u32,
    pub reasons: Vec<String>,
    pub generated_at: String,
}
