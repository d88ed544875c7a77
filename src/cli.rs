use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "aitri",
    version,
    about = "Spec-driven traceability and workflow-gate tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the feature directory structure.
    Init(FeatureArgs),
    /// Lay down a draft requirement document template.
    Draft(FeatureArgs),
    /// Gate the draft and promote it to an approved spec.
    Approve(FeatureArgs),
    /// Gate the discovery and plan documents.
    Plan(FeatureArgs),
    /// Generate a backlog skeleton from the approved spec.
    Backlog(FeatureArgs),
    /// Run the verification command and record evidence.
    Verify(VerifyArgs),
    /// Audit cross-artifact traceability and write coverage matrices.
    Audit(FeatureArgs),
    /// Compute the weighted confidence report.
    Confidence(FeatureArgs),
    /// Evaluate change policy over the working tree.
    Policy(PolicyArgs),
    /// Record the human go decision.
    Go(GoArgs),
    /// Run the delivery checkpoint and record the ship/hold decision.
    Deliver(FeatureArgs),
    /// Report artifact state, verification state and the next step.
    Status(FeatureArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FeatureArgs {
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,

    #[arg(long)]
    pub feature: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CoverageMode {
    Full,
    Smoke,
}

impl CoverageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Smoke => "smoke",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,

    #[arg(long)]
    pub feature: String,

    /// Override the auto-detected verification command.
    #[arg(long)]
    pub command: Option<String>,

    /// Directory the verification command runs in; defaults to the
    /// workspace root.
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = CoverageMode::Full)]
    pub coverage_mode: CoverageMode,
}

#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,

    #[arg(long)]
    pub feature: String,

    /// Repository whose working tree is inspected; defaults to the
    /// workspace root.
    #[arg(long)]
    pub repo_root: Option<PathBuf>,

    /// Acknowledge an intended dependency manifest change.
    #[arg(long, default_value_t = false)]
    pub dependencies_approved: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GoArgs {
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,

    #[arg(long)]
    pub feature: String,

    /// Why the human reviewer is approving the feature for build.
    #[arg(long)]
    pub rationale: String,
}
