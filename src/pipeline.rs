//! Pipeline orchestration: resolve, fetch, materialize.
//!
//! Runs strictly in sequence and stops at the first error. The archive is
//! owned here for the whole run and its members are visited in the order
//! the archive lists them.

use crate::catalog;
use crate::config::VendorConfig;
use crate::error::Result;
use crate::fetch::{self, ArchiveHandle};
use crate::http;
use crate::output;
use crate::resolver::{self, ResolvedAsset};
use crate::transform;
use std::path::PathBuf;

/// One file written by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Full member name inside the archive.
    pub member: String,
    pub path: PathBuf,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub asset: ResolvedAsset,
    pub written: Vec<Materialized>,
    /// Rule members that never appeared in the archive.
    pub missing: Vec<String>,
}

/// Run the full pipeline described by `config`.
pub fn run(config: &VendorConfig) -> Result<RunReport> {
    let matcher = config.matcher()?;
    let agent = http::agent(config.timeout());

    output::action(&format!("Vendoring {} ({})", config.tag, matcher));

    let catalog = catalog::fetch_catalog(&agent, &config.endpoint)?;
    let asset = resolver::resolve(&catalog, &config.tag, &matcher)?;

    output::detail(&format!("downloading {}", asset.download_url));
    let mut archive = fetch::fetch_archive(&agent, &asset.download_url)?;

    let (written, missing) = extract(&mut archive, config)?;
    for member in &missing {
        output::warning(&format!("{} not found in {}", member, asset.name));
    }

    Ok(RunReport {
        asset,
        written,
        missing,
    })
}

/// Materialize every archive member that has a rule.
///
/// Members without a rule, and directory entries, are skipped. Returns the
/// files written and the rule members that were never seen.
pub fn extract(
    archive: &mut ArchiveHandle,
    config: &VendorConfig,
) -> Result<(Vec<Materialized>, Vec<String>)> {
    let mut written = Vec::new();

    for member in archive.members() {
        if member.is_dir() {
            continue;
        }
        let Some(rule) = transform::rule_for(&config.rules, member.base_name()) else {
            continue;
        };

        let path = config.output_path(rule);
        archive.read_member(member.index, |reader| {
            transform::materialize(reader, &path, rule)
        })?;

        output::detail(&format!("extracted {} -> {}", member.name, rule.output));
        written.push(Materialized {
            member: member.name,
            path,
        });
    }

    let missing = config
        .rules
        .iter()
        .filter(|rule| {
            !written
                .iter()
                .any(|m| fetch::base_name(&m.member) == rule.member)
        })
        .map(|rule| rule.member.clone())
        .collect();

    Ok((written, missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{BINDING_INCLUDE_BLOCK, CLOSING_GUARD, OPENING_GUARD};
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn archive(entries: &[(&str, &str)]) -> ArchiveHandle {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        ArchiveHandle::from_bytes("test.zip", writer.finish().unwrap().into_inner()).unwrap()
    }

    fn config_in(dir: &TempDir) -> VendorConfig {
        VendorConfig {
            output_dir: dir.path().to_path_buf(),
            ..VendorConfig::default()
        }
    }

    #[test]
    fn test_extract_configured_members_only() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut handle = archive(&[
            ("sqlite3mc/sqlite3mc_amalgamation.c", "#include \"sqlite3.h\"\n"),
            ("sqlite3mc/shell.c", "int main(void);\n"),
            ("sqlite3mc/sqlite3mc_amalgamation.h", "#define X 1\n"),
            ("sqlite3mc/sqlite3ext.h", "#include \"sqlite3.h\"\n"),
        ]);

        let (written, missing) = extract(&mut handle, &config).unwrap();

        assert_eq!(written.len(), 3);
        assert!(missing.is_empty());
        assert!(!dir.path().join("shell.c").exists());

        let ext = std::fs::read_to_string(dir.path().join("sqlite3ext.h")).unwrap();
        assert_eq!(
            ext,
            format!("{}{}\n{}", OPENING_GUARD, BINDING_INCLUDE_BLOCK, CLOSING_GUARD)
        );

        let source = std::fs::read_to_string(dir.path().join("sqlite3-binding.c")).unwrap();
        assert!(source.contains("#include \"sqlite3-binding.h\""));
        assert!(!source.contains("#include \"sqlite3.h\""));
    }

    #[test]
    fn test_extract_reports_missing_members() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut handle = archive(&[("sqlite3mc_amalgamation.c", "")]);

        let (written, missing) = extract(&mut handle, &config).unwrap();

        assert_eq!(written.len(), 1);
        assert_eq!(written[0].path, dir.path().join("sqlite3-binding.c"));
        assert_eq!(missing, vec!["sqlite3mc_amalgamation.h", "sqlite3ext.h"]);
    }

    #[test]
    fn test_extract_stops_on_unwritable_output() {
        let dir = TempDir::new().unwrap();
        let config = VendorConfig {
            output_dir: dir.path().join("does-not-exist"),
            ..VendorConfig::default()
        };
        let mut handle = archive(&[("sqlite3ext.h", "x\n")]);

        let err = extract(&mut handle, &config).unwrap_err();
        assert_eq!(err.stage(), "materialize");
    }
}
