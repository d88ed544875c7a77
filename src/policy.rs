use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::gate::{Issue, IssueCategory};

pub const POLICY_SCHEMA_VERSION: u32 = 1;

/// Dependency manifests whose unapproved modification counts as drift.
const DEPENDENCY_MANIFESTS: &[&str] = &[
    "package.json",
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "Cargo.toml",
    "Cargo.lock",
    "requirements.txt",
    "pyproject.toml",
    "go.mod",
    "go.sum",
];

/// One changed file as the policy checker sees it; `source` is present when
/// the file could be read as text.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyRules<'a> {
    pub forbidden_paths: &'a [String],
    pub blocked_imports: &'a [String],
}

/// Persisted policy evaluation evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyEvaluation {
    pub schema_version: u32,
    pub feature: String,
    pub generated_at: String,
    pub changed_files: Vec<String>,
    pub issues: Vec<Issue>,
    pub clean: bool,
}

/// Runs every policy check over the changed-file set; issues accumulate,
/// nothing aborts early.
pub fn evaluate_policy(
    changed: &[ChangedFile],
    rules: PolicyRules<'_>,
    dependency_change_approved: bool,
) -> Vec<Issue> {
    let mut issues = Vec::<Issue>::new();

    for file in changed {
        for rule in rules.forbidden_paths {
            if matches_path_rule(&file.path, rule) {
                issues.push(Issue::new(
                    IssueCategory::ForbiddenPath,
                    format!("Forbidden path changed: {} (rule: {rule})", file.path),
                ));
            }
        }
    }

    for file in changed {
        let Some(source) = file.source.as_deref() else {
            continue;
        };
        for import in extract_imports(&file.path, source) {
            for blocked in rules.blocked_imports {
                if import_matches(&import, blocked) {
                    issues.push(Issue::new(
                        IssueCategory::ForbiddenImport,
                        format!("Blocked import '{import}' in {}", file.path),
                    ));
                }
            }
        }
    }

    let drifted = changed
        .iter()
        .map(|file| file.path.as_str())
        .filter(|path| {
            let name = path.rsplit('/').next().unwrap_or(path);
            DEPENDENCY_MANIFESTS.contains(&name)
        })
        .collect::<Vec<&str>>();
    if !drifted.is_empty() && !dependency_change_approved {
        issues.push(Issue::new(
            IssueCategory::DependencyDrift,
            format!(
                "Dependency manifest(s) changed without approval: {}",
                drifted.join(", ")
            ),
        ));
    }

    issues
}

/// A path rule matches as a directory/file prefix or as a whole path
/// component.
fn matches_path_rule(path: &str, rule: &str) -> bool {
    let path = path.trim_start_matches("./");
    let rule = rule.trim_start_matches("./").trim_end_matches('/');
    if rule.is_empty() {
        return false;
    }

    if path == rule || path.starts_with(&format!("{rule}/")) {
        return true;
    }

    !rule.contains('/') && path.split('/').any(|component| component == rule)
}

fn import_matches(import: &str, blocked: &str) -> bool {
    import == blocked
        || import.starts_with(&format!("{blocked}/"))
        || import.starts_with(&format!("{blocked}::"))
        || import.starts_with(&format!("{blocked}."))
}

/// Regex-based import extraction across the source syntaxes the policy
/// checker understands; unknown extensions yield nothing.
pub fn extract_imports(path: &str, source: &str) -> Vec<String> {
    let extension = path.rsplit('.').next().unwrap_or_default();
    match extension {
        "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => extract_js_imports(source),
        "py" => extract_python_imports(source),
        "rs" => extract_rust_imports(source),
        "go" => extract_go_imports(source),
        _ => Vec::new(),
    }
}

fn extract_js_imports(source: &str) -> Vec<String> {
    let import_pattern =
        Regex::new(r#"(?m)^\s*import\s+(?:[^'"]*?\s+from\s+)?['"](?P<module>[^'"]+)['"]"#)
            .expect("js import pattern is static");
    let require_pattern = Regex::new(r#"require\(\s*['"](?P<module>[^'"]+)['"]\s*\)"#)
        .expect("js require pattern is static");

    let mut imports = Vec::<String>::new();
    for captures in import_pattern.captures_iter(source) {
        push_unique(&mut imports, captures["module"].to_string());
    }
    for captures in require_pattern.captures_iter(source) {
        push_unique(&mut imports, captures["module"].to_string());
    }
    imports
}

fn extract_python_imports(source: &str) -> Vec<String> {
    let import_pattern = Regex::new(r"(?m)^\s*import\s+(?P<module>[\w.]+)")
        .expect("python import pattern is static");
    let from_pattern = Regex::new(r"(?m)^\s*from\s+(?P<module>[\w.]+)\s+import")
        .expect("python from pattern is static");

    let mut imports = Vec::<String>::new();
    for captures in import_pattern.captures_iter(source) {
        push_unique(&mut imports, captures["module"].to_string());
    }
    for captures in from_pattern.captures_iter(source) {
        push_unique(&mut imports, captures["module"].to_string());
    }
    imports
}

fn extract_rust_imports(source: &str) -> Vec<String> {
    let use_pattern = Regex::new(r"(?m)^\s*(?:pub\s+)?use\s+(?P<module>[A-Za-z_][\w:]*)")
        .expect("rust use pattern is static");

    let mut imports = Vec::<String>::new();
    for captures in use_pattern.captures_iter(source) {
        push_unique(&mut imports, captures["module"].to_string());
    }
    imports
}

/// Single-form `import "x"` plus grouped import blocks.
fn extract_go_imports(source: &str) -> Vec<String> {
    let single_pattern = Regex::new(r#"(?m)^\s*import\s+"(?P<module>[^"]+)""#)
        .expect("go import pattern is static");
    let grouped_pattern =
        Regex::new(r#"^\s*(?:[\w.]+\s+)?"(?P<module>[^"]+)"\s*$"#).expect("go grouped pattern");

    let mut imports = Vec::<String>::new();
    for captures in single_pattern.captures_iter(source) {
        push_unique(&mut imports, captures["module"].to_string());
    }

    let mut in_block = false;
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("import (") {
            in_block = true;
            continue;
        }
        if in_block {
            if trimmed.starts_with(')') {
                in_block = false;
                continue;
            }
            if let Some(captures) = grouped_pattern.captures(line) {
                push_unique(&mut imports, captures["module"].to_string());
            }
        }
    }

    imports
}

fn push_unique(imports: &mut Vec<String>, value: String) {
    if !imports.contains(&value) {
        imports.push(value);
    }
}
