use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Last `max_chars` characters of a captured stream, on a char boundary.
pub fn truncate_tail(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    text.chars().skip(total - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{sha256_text, truncate_tail};

    #[test]
    fn sha256_text_is_stable() {
        let first = sha256_text("STATUS: DRAFT");
        let second = sha256_text("STATUS: DRAFT");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn truncate_tail_keeps_short_input_intact() {
        assert_eq!(truncate_tail("short", 10), "short");
    }

    #[test]
    fn truncate_tail_keeps_last_characters() {
        assert_eq!(truncate_tail("abcdefgh", 3), "fgh");
    }
}
