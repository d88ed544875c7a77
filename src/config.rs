use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "aitri.config.json";
pub const DEFAULT_FEATURES_DIR: &str = "features";
pub const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 120_000;

/// Raw on-disk configuration. Every field is optional; absent fields fall
/// back to the built-in defaults. Malformed content is fatal before any core
/// computation runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub features_dir: Option<String>,
    pub verification: Option<VerificationSection>,
    pub policy: Option<PolicySection>,
    pub detection_rules: Option<Vec<DetectionRule>>,
    pub detection_fallback: Option<String>,
    pub stopwords: Option<Vec<String>>,
    pub asset_keywords: Option<Vec<String>>,
    pub ui_keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationSection {
    pub required: Option<bool>,
    pub command: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicySection {
    pub forbidden_paths: Option<Vec<String>>,
    pub blocked_imports: Option<Vec<String>>,
}

/// One keyword-pattern set for stack/domain detection. Patterns are matched
/// case-insensitively as substrings of the whole document.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionRule {
    pub label: String,
    pub patterns: Vec<String>,
}

/// Resolved workspace configuration handed to the core as plain data.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub workspace_root: PathBuf,
    pub features_dir: String,
    pub verification_required: bool,
    pub verification_command: Option<String>,
    pub verification_timeout_ms: u64,
    pub forbidden_paths: Vec<String>,
    pub blocked_imports: Vec<String>,
    pub detection_rules: Vec<DetectionRule>,
    pub detection_fallback: String,
    pub stopwords: Vec<String>,
    pub asset_keywords: Vec<String>,
    pub ui_keywords: Vec<String>,
}

impl WorkspaceConfig {
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let config_path = workspace_root.join(CONFIG_FILE_NAME);
        let file = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            serde_json::from_str::<ConfigFile>(&raw)
                .with_context(|| format!("malformed configuration: {}", config_path.display()))?
        } else {
            ConfigFile::default()
        };

        Self::resolve(workspace_root, file)
    }

    pub fn resolve(workspace_root: &Path, file: ConfigFile) -> Result<Self> {
        let features_dir = file
            .features_dir
            .unwrap_or_else(|| DEFAULT_FEATURES_DIR.to_string());
        validate_features_dir(&features_dir)?;

        let verification = file.verification.unwrap_or_default();
        let policy = file.policy.unwrap_or_default();

        Ok(Self {
            workspace_root: workspace_root.to_path_buf(),
            features_dir,
            verification_required: verification.required.unwrap_or(true),
            verification_command: verification.command,
            verification_timeout_ms: verification
                .timeout_ms
                .unwrap_or(DEFAULT_VERIFICATION_TIMEOUT_MS),
            forbidden_paths: policy.forbidden_paths.unwrap_or_default(),
            blocked_imports: policy.blocked_imports.unwrap_or_default(),
            detection_rules: file.detection_rules.unwrap_or_else(default_detection_rules),
            detection_fallback: file
                .detection_fallback
                .unwrap_or_else(|| "general-web".to_string()),
            stopwords: file.stopwords.unwrap_or_else(default_stopwords),
            asset_keywords: file.asset_keywords.unwrap_or_else(default_asset_keywords),
            ui_keywords: file.ui_keywords.unwrap_or_else(default_ui_keywords),
        })
    }

    pub fn feature_root(&self, feature: &str) -> PathBuf {
        self.workspace_root.join(&self.features_dir).join(feature)
    }
}

/// The feature directory mapping must stay inside the workspace.
fn validate_features_dir(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("features_dir must not be empty");
    }

    if trimmed.starts_with('/') || trimmed.starts_with('\\') || trimmed.contains(':') {
        bail!("features_dir must be a relative path, got: {trimmed}");
    }

    if trimmed
        .split(['/', '\\'])
        .any(|component| component == "..")
    {
        bail!("features_dir must not traverse outside the workspace: {trimmed}");
    }

    Ok(())
}

fn default_detection_rules() -> Vec<DetectionRule> {
    [
        (
            "node-web",
            &["node", "express", "npm", "typescript", "react"][..],
        ),
        ("rust-service", &["rust", "cargo", "tokio", "crate"][..]),
        (
            "python-service",
            &["python", "django", "flask", "fastapi", "pytest"][..],
        ),
        ("go-service", &["golang", "go.mod", "goroutine"][..]),
        (
            "browser-game",
            &["game", "canvas", "sprite", "phaser", "webgl"][..],
        ),
        (
            "static-site",
            &["html", "css", "static site", "landing page"][..],
        ),
    ]
    .into_iter()
    .map(|(label, patterns)| DetectionRule {
        label: label.to_string(),
        patterns: patterns.iter().map(|value| value.to_string()).collect(),
    })
    .collect()
}

fn default_stopwords() -> Vec<String> {
    [
        "that", "with", "this", "from", "have", "will", "must", "shall", "should", "when", "then",
        "given", "into", "been", "being", "were", "also", "such", "only", "upon", "each", "them",
        "they", "their", "there", "where", "while", "would", "could", "after", "before", "within",
        "without", "about", "using", "user", "users", "system", "data", "able",
    ]
    .iter()
    .map(|value| value.to_string())
    .collect()
}

fn default_asset_keywords() -> Vec<String> {
    [
        "game",
        "sprite",
        "animation",
        "canvas",
        "texture",
        "render",
        "pixel",
        "webgl",
        "shader",
        "artwork",
        "visual style",
        "sound effect",
        "icon set",
        "illustration",
    ]
    .iter()
    .map(|value| value.to_string())
    .collect()
}

fn default_ui_keywords() -> Vec<String> {
    [
        "screen",
        "form",
        "button",
        "page",
        "view",
        "layout",
        "click",
        "navigation",
        "modal",
        "dashboard",
        "input field",
    ]
    .iter()
    .map(|value| value.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::{ConfigFile, WorkspaceConfig};
    use std::path::Path;

    #[test]
    fn defaults_resolve_without_a_config_file() {
        let config = WorkspaceConfig::resolve(Path::new("/tmp/ws"), ConfigFile::default())
            .expect("default config should resolve");
        assert_eq!(config.features_dir, "features");
        assert!(config.verification_required);
        assert_eq!(config.verification_timeout_ms, 120_000);
        assert!(!config.detection_rules.is_empty());
        assert!(!config.stopwords.is_empty());
    }

    #[test]
    fn absolute_features_dir_is_rejected() {
        let file = ConfigFile {
            features_dir: Some("/etc/features".to_string()),
            ..ConfigFile::default()
        };
        let error = WorkspaceConfig::resolve(Path::new("/tmp/ws"), file)
            .expect_err("absolute mapping should be fatal");
        assert!(error.to_string().contains("relative path"));
    }

    #[test]
    fn traversing_features_dir_is_rejected() {
        let file = ConfigFile {
            features_dir: Some("work/../../outside".to_string()),
            ..ConfigFile::default()
        };
        let error = WorkspaceConfig::resolve(Path::new("/tmp/ws"), file)
            .expect_err("parent traversal should be fatal");
        assert!(error.to_string().contains("outside the workspace"));
    }

    #[test]
    fn feature_root_joins_mapping_and_feature_name() {
        let config = WorkspaceConfig::resolve(Path::new("/ws"), ConfigFile::default())
            .expect("default config should resolve");
        assert_eq!(
            config.feature_root("checkout"),
            Path::new("/ws/features/checkout")
        );
    }
}
