//! Hierarchical key/value configuration parsing.
//!
//! DSAL is handed a [`Config`] by its embedder and consults exactly one key
//! out of it: `dstore.type`, which selects a backend from the registry. The
//! parser itself is intentionally general (INI-style sections, `key = value`
//! lines, `;`/`#` comments) so that an embedder can carry other, unrelated
//! configuration in the same file without DSAL needing to know about it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required option: {0}.{1}")]
    MissingOption(String, String),
}

/// A parsed hierarchical key/value configuration.
///
/// Keys are addressed as `section.key`, e.g. `dstore.type`. A top-level key
/// with no section prefix is stored under the implicit `global` section.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Parse configuration text.
    ///
    /// ```text
    /// [dstore]
    /// type = memory
    /// ```
    pub fn parse(content: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section = String::from("global");

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].to_string();
                sections.entry(current_section.clone()).or_default();
                continue;
            }

            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim().to_string();
                let value = line[eq_pos + 1..].trim().to_string();
                sections
                    .entry(current_section.clone())
                    .or_default()
                    .insert(key, value);
            }
        }

        Self { sections }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Build a config with a single `section.key = value` entry. Handy for
    /// programmatic construction (tests, CLI `--backend` flags) without
    /// going through the text format.
    pub fn with_value(section: &str, key: &str, value: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Self { sections }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    pub fn get_required(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        self.get(section, key)
            .ok_or_else(|| ConfigError::MissingOption(section.to_string(), key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_comments() {
        let cfg = Config::parse(
            "# top comment\n[dstore]\n; inline comment\ntype = memory\nblock_size = 4096\n",
        );
        assert_eq!(cfg.get("dstore", "type"), Some("memory"));
        assert_eq!(cfg.get("dstore", "block_size"), Some("4096"));
    }

    #[test]
    fn missing_key_is_none() {
        let cfg = Config::parse("[dstore]\ntype = memory\n");
        assert_eq!(cfg.get("dstore", "nope"), None);
        assert!(cfg.get_required("dstore", "nope").is_err());
    }

    #[test]
    fn with_value_shortcut() {
        let cfg = Config::with_value("dstore", "type", "memory");
        assert_eq!(cfg.get("dstore", "type"), Some("memory"));
    }
}
