//! amalgam-vendor - refresh vendored amalgamation sources
//!
//! Usage:
//!   amalgam-vendor                         Vendor the pinned release into .
//!   amalgam-vendor --tag v1.4.0 -o vendor  Vendor another tag into vendor/
//!   amalgam-vendor --config amalgam.toml   Read settings from a TOML file

use amalgam_vendor::{MatchKind, VendorConfig, output, pipeline};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "amalgam-vendor")]
#[command(about = "Download a pinned amalgamation release and vendor it as guarded sources")]
#[command(version)]
struct Cli {
    /// TOML file overriding the built-in defaults
    #[arg(short, long, env = "AMALGAM_CONFIG")]
    config: Option<PathBuf>,

    /// Release tag to vendor (exact match)
    #[arg(short, long)]
    tag: Option<String>,

    /// Asset name pattern (substring, or glob with --glob)
    #[arg(short, long)]
    pattern: Option<String>,

    /// Treat --pattern as a glob instead of a substring
    #[arg(long)]
    glob: bool,

    /// Release list endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory the vendored files are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// HTTP timeout in seconds for each request (0 disables it)
    #[arg(long, env = "AMALGAM_HTTP_TIMEOUT")]
    timeout: Option<u64>,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> Result<VendorConfig> {
        let mut config = match &self.config {
            Some(path) => VendorConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => VendorConfig::default(),
        };

        if let Some(tag) = self.tag {
            config.tag = tag;
        }
        if let Some(pattern) = self.pattern {
            config.asset_pattern = pattern;
        }
        if self.glob {
            config.match_kind = MatchKind::Glob;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(secs) = self.timeout {
            config.http_timeout_secs = secs;
        }

        Ok(config)
    }
}

fn run(cli: Cli) -> Result<()> {
    output::set_quiet(cli.quiet);
    let config = cli.into_config()?;

    let report = pipeline::run(&config).map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("{} stage failed", stage))
    })?;

    output::success(&format!(
        "vendored {} file(s) from {}",
        report.written.len(),
        report.asset.name
    ));
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amalgam_vendor::config::{DEFAULT_ASSET_PATTERN, DEFAULT_ENDPOINT, DEFAULT_TAG};
    use tempfile::TempDir;

    fn bare_cli() -> Cli {
        Cli {
            config: None,
            tag: None,
            pattern: None,
            glob: false,
            endpoint: None,
            output_dir: None,
            timeout: None,
            quiet: true,
        }
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let config = bare_cli().into_config().unwrap();
        assert_eq!(config, VendorConfig::default());
    }

    #[test]
    fn test_flags_override_file_override_defaults() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("amalgam.toml");
        std::fs::write(
            &file,
            "tag = \"v1.4.0\"\nendpoint = \"http://mirror.local/releases\"\nhttp_timeout_secs = 5\n",
        )
        .unwrap();

        let cli = Cli {
            config: Some(file),
            tag: Some("v2.0.0".to_string()),
            output_dir: Some(PathBuf::from("vendor")),
            ..bare_cli()
        };
        let config = cli.into_config().unwrap();

        // Flag beats file.
        assert_eq!(config.tag, "v2.0.0");
        assert_eq!(config.output_dir, PathBuf::from("vendor"));
        // File beats defaults.
        assert_eq!(config.endpoint, "http://mirror.local/releases");
        assert_eq!(config.http_timeout_secs, 5);
        // Untouched keys keep their defaults.
        assert_eq!(config.asset_pattern, DEFAULT_ASSET_PATTERN);
        assert_eq!(config.match_kind, MatchKind::Contains);
    }

    #[test]
    fn test_glob_and_timeout_flags() {
        let cli = Cli {
            pattern: Some("*-amalgamation.zip".to_string()),
            glob: true,
            timeout: Some(0),
            ..bare_cli()
        };
        let config = cli.into_config().unwrap();

        assert_eq!(config.match_kind, MatchKind::Glob);
        assert_eq!(config.asset_pattern, "*-amalgamation.zip");
        assert_eq!(config.http_timeout_secs, 0);
        assert_eq!(config.tag, DEFAULT_TAG);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let dir = TempDir::new().unwrap();
        let cli = Cli {
            config: Some(dir.path().join("absent.toml")),
            ..bare_cli()
        };
        let err = cli.into_config().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load config"));
    }
}
