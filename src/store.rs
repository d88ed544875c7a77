use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::ensure_directory;

/// Every artifact the workflow reads or writes for one feature, keyed by its
/// role rather than its on-disk location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    DraftSpec,
    ApprovedSpec,
    Discovery,
    Plan,
    Backlog,
    Tests,
    VerificationEvidence,
    CoverageFrUs,
    CoverageFrTc,
    CoverageUsTc,
    CoverageAcTc,
    ConfidenceReport,
    PolicyEvaluation,
    GoDecision,
    DeliveryDecision,
    ScaffoldReady,
    ImplementReady,
    BuildReady,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DraftSpec => "draft_spec",
            Self::ApprovedSpec => "approved_spec",
            Self::Discovery => "discovery",
            Self::Plan => "plan",
            Self::Backlog => "backlog",
            Self::Tests => "tests",
            Self::VerificationEvidence => "verification_evidence",
            Self::CoverageFrUs => "coverage_fr_us",
            Self::CoverageFrTc => "coverage_fr_tc",
            Self::CoverageUsTc => "coverage_us_tc",
            Self::CoverageAcTc => "coverage_ac_tc",
            Self::ConfidenceReport => "confidence_report",
            Self::PolicyEvaluation => "policy_evaluation",
            Self::GoDecision => "go_decision",
            Self::DeliveryDecision => "delivery_decision",
            Self::ScaffoldReady => "scaffold_ready",
            Self::ImplementReady => "implement_ready",
            Self::BuildReady => "build_ready",
        }
    }

    pub fn relative_path(self) -> &'static str {
        match self {
            Self::DraftSpec => "spec.draft.md",
            Self::ApprovedSpec => "spec.approved.md",
            Self::Discovery => "discovery.md",
            Self::Plan => "plan.md",
            Self::Backlog => "backlog.md",
            Self::Tests => "tests.md",
            Self::VerificationEvidence => "evidence/verification.json",
            Self::CoverageFrUs => "evidence/coverage_fr_us.json",
            Self::CoverageFrTc => "evidence/coverage_fr_tc.json",
            Self::CoverageUsTc => "evidence/coverage_us_tc.json",
            Self::CoverageAcTc => "evidence/coverage_ac_tc.json",
            Self::ConfidenceReport => "evidence/confidence.json",
            Self::PolicyEvaluation => "evidence/policy.json",
            Self::GoDecision => "evidence/go_decision.json",
            Self::DeliveryDecision => "evidence/delivery.json",
            Self::ScaffoldReady => "build/scaffold.json",
            Self::ImplementReady => "build/implement.json",
            Self::BuildReady => "build/build.json",
        }
    }
}

/// Abstract store for one feature's artifacts. The core never touches the
/// filesystem directly; commands hand it a store and read derived state back.
pub trait ArtifactStore {
    fn read(&self, kind: ArtifactKind) -> Result<Option<String>>;
    fn write(&self, kind: ArtifactKind, text: &str) -> Result<()>;

    fn exists(&self, kind: ArtifactKind) -> Result<bool> {
        Ok(self.read(kind)?.is_some())
    }
}

/// Outputs are staged here while checks run and flushed only once every
/// computation has succeeded, so a failing gate never leaves partial writes.
#[derive(Debug, Default)]
pub struct StagedWrites {
    entries: Vec<(ArtifactKind, String)>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, kind: ArtifactKind, text: String) {
        self.entries.push((kind, text));
    }

    pub fn flush(self, store: &dyn ArtifactStore) -> Result<()> {
        for (kind, text) in self.entries {
            store.write(kind, &text)?;
        }
        Ok(())
    }
}

pub struct FsArtifactStore {
    feature_root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(feature_root: &Path) -> Self {
        Self {
            feature_root: feature_root.to_path_buf(),
        }
    }

    pub fn feature_root(&self) -> &Path {
        &self.feature_root
    }

    fn artifact_path(&self, kind: ArtifactKind) -> PathBuf {
        self.feature_root.join(kind.relative_path())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn read(&self, kind: ArtifactKind) -> Result<Option<String>> {
        let path = self.artifact_path(kind);
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read artifact: {}", path.display()))?;
        Ok(Some(text))
    }

    fn write(&self, kind: ArtifactKind, text: &str) -> Result<()> {
        let path = self.artifact_path(kind);
        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }

        fs::write(&path, text)
            .with_context(|| format!("failed to write artifact: {}", path.display()))
    }
}

/// In-memory double for tests; no disk or process dependency.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    entries: RefCell<HashMap<ArtifactKind, String>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(entries: &[(ArtifactKind, &str)]) -> Self {
        let store = Self::new();
        for (kind, text) in entries {
            store
                .entries
                .borrow_mut()
                .insert(*kind, (*text).to_string());
        }
        store
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn read(&self, kind: ArtifactKind) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(&kind).cloned())
    }

    fn write(&self, kind: ArtifactKind, text: &str) -> Result<()> {
        self.entries.borrow_mut().insert(kind, text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ArtifactKind, ArtifactStore, FsArtifactStore, MemoryArtifactStore, StagedWrites};

    #[test]
    fn memory_store_round_trips_artifacts() {
        let store = MemoryArtifactStore::new();
        assert!(
            store
                .read(ArtifactKind::DraftSpec)
                .expect("read should succeed")
                .is_none()
        );

        store
            .write(ArtifactKind::DraftSpec, "STATUS: DRAFT")
            .expect("write should succeed");
        assert_eq!(
            store
                .read(ArtifactKind::DraftSpec)
                .expect("read should succeed")
                .as_deref(),
            Some("STATUS: DRAFT")
        );
    }

    #[test]
    fn staged_writes_flush_everything_or_nothing() {
        let store = MemoryArtifactStore::new();
        let mut staged = StagedWrites::new();
        staged.stage(ArtifactKind::ApprovedSpec, "STATUS: APPROVED".to_string());
        staged.stage(ArtifactKind::GoDecision, "{}".to_string());

        staged.flush(&store).expect("flush should succeed");
        assert!(
            store
                .exists(ArtifactKind::ApprovedSpec)
                .expect("exists should succeed")
        );
        assert!(
            store
                .exists(ArtifactKind::GoDecision)
                .expect("exists should succeed")
        );
    }

    #[test]
    fn fs_store_reads_back_what_it_writes() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let store = FsArtifactStore::new(&dir.path().join("features/demo"));

        store
            .write(ArtifactKind::Backlog, "## User Stories\n")
            .expect("write should succeed");
        let text = store
            .read(ArtifactKind::Backlog)
            .expect("read should succeed")
            .expect("artifact should exist");
        assert_eq!(text, "## User Stories\n");

        assert!(
            !store
                .exists(ArtifactKind::Tests)
                .expect("exists should succeed")
        );
    }

    #[test]
    fn evidence_kinds_live_under_the_evidence_directory() {
        assert!(
            ArtifactKind::ConfidenceReport
                .relative_path()
                .starts_with("evidence/")
        );
        assert!(
            ArtifactKind::ScaffoldReady
                .relative_path()
                .starts_with("build/")
        );
    }
}
