//! Pipeline configuration
//!
//! Built-in defaults pin the SQLite3 Multiple Ciphers release this crate
//! vendors. A TOML file can override any of them; the CLI overrides the file.
//!
//! ```toml
//! tag = "v1.3.4"
//! asset_pattern = "-amalgamation"
//! match_kind = "contains"      # or "glob"
//! http_timeout_secs = 60       # 0 disables the timeout
//!
//! [[rules]]
//! member = "sqlite3ext.h"
//! output = "sqlite3ext.h"
//! ```

use crate::error::{Result, VendorError};
use crate::resolver::AssetMatcher;
use crate::transform::{self, TransformRule};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://api.github.com/repos/utelle/SQLite3MultipleCiphers/releases";

pub const DEFAULT_TAG: &str = "v1.3.4";

pub const DEFAULT_ASSET_PATTERN: &str = "-amalgamation";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// How `asset_pattern` is compared against asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Contains,
    Glob,
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorConfig {
    pub endpoint: String,
    pub tag: String,
    pub asset_pattern: String,
    pub match_kind: MatchKind,
    pub output_dir: PathBuf,
    /// Zero disables the timeout.
    pub http_timeout_secs: u64,
    pub rules: Vec<TransformRule>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            tag: DEFAULT_TAG.to_string(),
            asset_pattern: DEFAULT_ASSET_PATTERN.to_string(),
            match_kind: MatchKind::Contains,
            output_dir: PathBuf::from("."),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            rules: transform::default_rules(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    endpoint: Option<String>,
    tag: Option<String>,
    asset_pattern: Option<String>,
    match_kind: Option<MatchKind>,
    output_dir: Option<PathBuf>,
    http_timeout_secs: Option<u64>,
    rules: Option<Vec<TransformRule>>,
}

impl VendorConfig {
    /// Defaults overlaid with the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| VendorError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
            .map_err(|e| VendorError::Config(format!("{}: {}", path.display(), e)))
    }

    fn from_toml_str(text: &str) -> std::result::Result<Self, String> {
        let file: ConfigToml = toml::from_str(text).map_err(|e| e.to_string())?;
        let mut config = Self::default();
        config.apply(file);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, file: ConfigToml) {
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(tag) = file.tag {
            self.tag = tag;
        }
        if let Some(pattern) = file.asset_pattern {
            self.asset_pattern = pattern;
        }
        if let Some(kind) = file.match_kind {
            self.match_kind = kind;
        }
        if let Some(dir) = file.output_dir {
            self.output_dir = dir;
        }
        if let Some(secs) = file.http_timeout_secs {
            self.http_timeout_secs = secs;
        }
        if let Some(rules) = file.rules {
            self.rules = rules;
        }
    }

    /// Reject rule tables the pipeline cannot honour.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.rules.is_empty() {
            return Err("at least one rule is required".to_string());
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.member.is_empty() || rule.output.is_empty() {
                return Err(format!("rule {} needs both member and output", i + 1));
            }
            if rule.output.contains(['/', '\\']) {
                return Err(format!("rule output '{}' must be a bare file name", rule.output));
            }
            if self.rules[..i].iter().any(|r| r.member == rule.member) {
                return Err(format!("member '{}' appears in more than one rule", rule.member));
            }
            if self.rules[..i].iter().any(|r| r.output == rule.output) {
                return Err(format!("output '{}' appears in more than one rule", rule.output));
            }
        }
        Ok(())
    }

    pub fn matcher(&self) -> Result<AssetMatcher> {
        match self.match_kind {
            MatchKind::Contains => Ok(AssetMatcher::contains(&self.asset_pattern)),
            MatchKind::Glob => AssetMatcher::glob(&self.asset_pattern),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.http_timeout_secs > 0).then(|| Duration::from_secs(self.http_timeout_secs))
    }

    /// Where the output for `rule` is written.
    pub fn output_path(&self, rule: &TransformRule) -> PathBuf {
        self.output_dir.join(&rule.output)
    }
}
