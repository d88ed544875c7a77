use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const COVERAGE_SCHEMA_VERSION: u32 = 1;

/// One audited upstream ID with the downstream IDs tracing to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRow {
    pub requirement_id: String,
    pub linked_downstream_ids: Vec<String>,
    pub passing_ids: Vec<String>,
    pub covered: bool,
}

/// Persisted coverage evidence for one (upstream family, downstream artifact)
/// pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageMatrix {
    pub schema_version: u32,
    pub feature: String,
    pub upstream_family: String,
    pub downstream_family: String,
    pub generated_at: String,
    pub rows: Vec<CoverageRow>,
    pub covered_count: usize,
    pub total_count: usize,
    pub gap_ids: Vec<String>,
}

impl CoverageMatrix {
    pub fn new(
        feature: &str,
        upstream_family: &str,
        downstream_family: &str,
        generated_at: &str,
        rows: Vec<CoverageRow>,
    ) -> Self {
        let covered_count = rows.iter().filter(|row| row.covered).count();
        let gap_ids = rows
            .iter()
            .filter(|row| !row.covered)
            .map(|row| row.requirement_id.clone())
            .collect::<Vec<String>>();

        Self {
            schema_version: COVERAGE_SCHEMA_VERSION,
            feature: feature.to_string(),
            upstream_family: upstream_family.to_string(),
            downstream_family: downstream_family.to_string(),
            generated_at: generated_at.to_string(),
            total_count: rows.len(),
            covered_count,
            gap_ids,
            rows,
        }
    }
}

/// One downstream entity as the calculator sees it: its ID and the upstream
/// IDs its trace line references.
#[derive(Debug, Clone)]
pub struct DownstreamEntry {
    pub id: String,
    pub trace_ids: BTreeSet<String>,
}

/// Builds one row per upstream ID. `passing` is the execution-evidence
/// source: validation audits pass every linked ID (structural coverage),
/// delivery audits pass only downstream entities whose run succeeded.
/// A row is covered when at least one passing downstream ID references it.
pub fn build_coverage_rows(
    upstream_ids: &[String],
    downstream: &[DownstreamEntry],
    passing: &dyn Fn(&str) -> bool,
) -> Vec<CoverageRow> {
    upstream_ids
        .iter()
        .map(|upstream_id| {
            let linked = downstream
                .iter()
                .filter(|entry| entry.trace_ids.contains(upstream_id))
                .map(|entry| entry.id.clone())
                .collect::<Vec<String>>();
            let passing_ids = linked
                .iter()
                .filter(|id| passing(id))
                .cloned()
                .collect::<Vec<String>>();

            CoverageRow {
                requirement_id: upstream_id.clone(),
                covered: !passing_ids.is_empty(),
                linked_downstream_ids: linked,
                passing_ids,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CoverageMatrix, DownstreamEntry, build_coverage_rows};
    use std::collections::BTreeSet;

    fn entry(id: &str, traces: &[&str]) -> DownstreamEntry {
        DownstreamEntry {
            id: id.to_string(),
            trace_ids: traces
                .iter()
                .map(|value| value.to_string())
                .collect::<BTreeSet<String>>(),
        }
    }

    fn upstream(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn structural_coverage_marks_linked_rows_covered() {
        let rows = build_coverage_rows(
            &upstream(&["FR-1", "FR-2", "FR-3"]),
            &[entry("US-1", &["FR-1", "FR-2"]), entry("US-2", &["FR-2"])],
            &|_| true,
        );

        assert!(rows[0].covered);
        assert_eq!(rows[1].linked_downstream_ids, vec!["US-1", "US-2"]);
        assert!(!rows[2].covered, "FR-3 has no downstream reference");
        assert!(rows[2].passing_ids.is_empty());
    }

    #[test]
    fn execution_evidence_narrows_passing_ids() {
        let rows = build_coverage_rows(
            &upstream(&["AC-1"]),
            &[entry("TC-1", &["AC-1"]), entry("TC-2", &["AC-1"])],
            &|id| id == "TC-2",
        );

        assert_eq!(rows[0].linked_downstream_ids.len(), 2);
        assert_eq!(rows[0].passing_ids, vec!["TC-2"]);
        assert!(rows[0].covered);
    }

    #[test]
    fn linked_but_failing_rows_are_coverage_gaps() {
        let rows = build_coverage_rows(
            &upstream(&["AC-1"]),
            &[entry("TC-1", &["AC-1"])],
            &|_| false,
        );
        assert!(!rows[0].covered, "a failing test does not cover its criterion");
    }

    #[test]
    fn matrix_summarizes_gaps_in_row_order() {
        let rows = build_coverage_rows(
            &upstream(&["FR-1", "FR-2", "FR-3"]),
            &[entry("US-1", &["FR-2"])],
            &|_| true,
        );
        let matrix = CoverageMatrix::new("demo", "FR", "US", "2026-01-01T00:00:00Z", rows);
        assert_eq!(matrix.total_count, 3);
        assert_eq!(matrix.covered_count, 1);
        assert_eq!(matrix.gap_ids, vec!["FR-1", "FR-3"]);
    }
}
