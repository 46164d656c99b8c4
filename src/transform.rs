//! Member transformation and materialization
//!
//! Each vendored file is the upstream member wrapped in a preprocessor guard
//! so the host project can switch to the system library with
//! `-DUSE_LIBSQLITE3`. Content is streamed line by line; a line that exactly
//! equals a substitution's trigger is swapped for its replacement block.
//!
//! Output is staged in a temporary file next to the target and renamed into
//! place only after the closing guard has been written, so the target path
//! never holds a half-written file.

use crate::error::{Result, VendorError};
use serde::Deserialize;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// First line of every vendored file.
pub const OPENING_GUARD: &str = "#ifndef USE_LIBSQLITE3\n";

/// Tail of every vendored file. No trailing newline.
pub const CLOSING_GUARD: &str = "#else // USE_LIBSQLITE3\n // If users really want to link against the system sqlite3 we\n// need to make this file a noop.\n #endif";

/// Include line found in the upstream amalgamation.
pub const UPSTREAM_INCLUDE: &str = "#include \"sqlite3.h\"";

/// Redirects the include to the vendored header and silences `assert` under
/// clang, where the amalgamation's assertions abort at runtime.
pub const BINDING_INCLUDE_BLOCK: &str = "#include \"sqlite3-binding.h\"\n#ifdef __clang__\n#define assert(condition) ((void)0)\n#endif\n";

/// Whole-line replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Substitution {
    /// Line to match, without its terminator.
    pub line: String,
    /// Emitted instead of the line, followed by a newline.
    pub replacement: String,
}

impl Substitution {
    /// The include redirect applied to every vendored member.
    pub fn binding_include() -> Self {
        Self {
            line: UPSTREAM_INCLUDE.to_string(),
            replacement: BINDING_INCLUDE_BLOCK.to_string(),
        }
    }
}

/// Maps an archive member (by base name) to its output file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransformRule {
    pub member: String,
    pub output: String,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

impl TransformRule {
    pub fn new(member: &str, output: &str, substitutions: Vec<Substitution>) -> Self {
        Self {
            member: member.to_string(),
            output: output.to_string(),
            substitutions,
        }
    }
}

/// The built-in rule table for the SQLite3 Multiple Ciphers amalgamation.
pub fn default_rules() -> Vec<TransformRule> {
    vec![
        TransformRule::new(
            "sqlite3mc_amalgamation.c",
            "sqlite3-binding.c",
            vec![Substitution::binding_include()],
        ),
        TransformRule::new(
            "sqlite3mc_amalgamation.h",
            "sqlite3-binding.h",
            vec![Substitution::binding_include()],
        ),
        TransformRule::new(
            "sqlite3ext.h",
            "sqlite3ext.h",
            vec![Substitution::binding_include()],
        ),
    ]
}

/// Rule whose member equals `base_name`, if any.
pub fn rule_for<'a>(rules: &'a [TransformRule], base_name: &str) -> Option<&'a TransformRule> {
    rules.iter().find(|r| r.member == base_name)
}

/// Which side of a [`transform`] failed.
#[derive(Debug)]
pub enum StreamError {
    Read(std::io::Error),
    Write(std::io::Error),
}

/// Stream `input` to `output`, wrapped in guards and with substitutions applied.
///
/// Lines are read as bytes so non-UTF-8 content passes through untouched.
/// Every line, including the last one, is written with a `\n` terminator.
pub fn transform<R: BufRead, W: Write>(
    mut input: R,
    output: &mut W,
    substitutions: &[Substitution],
) -> std::result::Result<(), StreamError> {
    let mut emit = |bytes: &[u8]| output.write_all(bytes).map_err(StreamError::Write);

    emit(OPENING_GUARD.as_bytes())?;

    let mut line = Vec::new();
    loop {
        line.clear();
        let n = input.read_until(b'\n', &mut line).map_err(StreamError::Read)?;
        if n == 0 {
            break;
        }
        let text = strip_terminator(&line);

        match substitutions.iter().find(|s| s.line.as_bytes() == text) {
            Some(sub) => emit(sub.replacement.as_bytes())?,
            None => emit(text)?,
        }
        emit(b"\n")?;
    }

    emit(CLOSING_GUARD.as_bytes())
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Transform `input` into `path`, replacing any existing file atomically.
///
/// On error the staged temporary file is removed and `path` is untouched.
pub fn materialize(input: &mut dyn Read, path: &Path, rule: &TransformRule) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".amalgam-vendor-")
        .tempfile_in(dir)
        .map_err(|e| VendorError::io(path, e))?;

    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        transform(BufReader::new(input), &mut writer, &rule.substitutions).map_err(|e| match e {
            StreamError::Read(source) => VendorError::Member {
                member: rule.member.clone(),
                source,
            },
            StreamError::Write(source) => VendorError::io(path, source),
        })?;
        writer.flush().map_err(|e| VendorError::io(path, e))?;
    }

    staged.as_file().sync_all().map_err(|e| VendorError::io(path, e))?;
    set_output_mode(staged.as_file()).map_err(|e| VendorError::io(path, e))?;

    staged
        .persist(path)
        .map_err(|e| VendorError::io(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_output_mode(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_output_mode(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(()) // No-op on non-Unix
}
