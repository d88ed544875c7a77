use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Paths with uncommitted changes, from `git status --porcelain`.
pub fn changed_files(repo_root: &Path) -> Result<Vec<String>> {
    let output = run_git(repo_root, &["status", "--porcelain"])?;
    Ok(parse_porcelain(&output))
}

/// Tags matching a prefix, used for checkpoint detection.
pub fn list_tags(repo_root: &Path, prefix: &str) -> Result<Vec<String>> {
    let pattern = format!("{prefix}*");
    let output = run_git(repo_root, &["tag", "--list", &pattern])?;
    Ok(output
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Writes a lightweight checkpoint tag at HEAD.
pub fn create_tag(repo_root: &Path, name: &str) -> Result<()> {
    run_git(repo_root, &["tag", name]).map(|_| ())
}

fn run_git(repo_root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .with_context(|| format!("failed to invoke git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Porcelain lines are `XY <path>` with renames as `XY <old> -> <new>`; the
/// new path is the one policy checks care about.
fn parse_porcelain(output: &str) -> Vec<String> {
    let mut paths = Vec::<String>::new();

    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }

        let path_part = line[3..].trim();
        if path_part.is_empty() {
            continue;
        }

        let path = match path_part.split_once(" -> ") {
            Some((_, renamed)) => renamed,
            None => path_part,
        };
        let path = path.trim_matches('"').to_string();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    paths
}
