//! Error taxonomy for the vendoring pipeline.
//!
//! Every variant is fatal: nothing in the pipeline retries or recovers, so
//! the message only has to say which stage gave up and why.

use std::path::PathBuf;

use thiserror::Error;

/// Stage name of the release list request.
pub const STAGE_CATALOG: &str = "catalog";

/// Stage name of the asset download.
pub const STAGE_DOWNLOAD: &str = "download";

#[derive(Error, Debug)]
pub enum VendorError {
    #[error("{stage} request to {url} failed: {source}")]
    Network {
        stage: &'static str,
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("{stage} response from {url} could not be read: {source}")]
    NetworkRead {
        stage: &'static str,
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse release catalog: {0}")]
    Parse(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid archive from {url}: {source}")]
    Archive {
        url: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("cannot read archive member {member}: {source}")]
    Member {
        member: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VendorError {
    pub(crate) fn network(stage: &'static str, url: &str, source: ureq::Error) -> Self {
        VendorError::Network {
            stage,
            url: url.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VendorError::Io {
            path: path.into(),
            source,
        }
    }

    /// Pipeline stage the error belongs to, used for the one-line diagnostic.
    pub fn stage(&self) -> &'static str {
        match self {
            VendorError::Network { stage, .. } | VendorError::NetworkRead { stage, .. } => *stage,
            VendorError::Parse(_) => STAGE_CATALOG,
            VendorError::NotFound(_) => "resolve",
            VendorError::Archive { .. } => "archive",
            VendorError::Member { .. } | VendorError::Io { .. } => "materialize",
            VendorError::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, VendorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(VendorError::Parse("x".into()).stage(), "catalog");
        let read = VendorError::NetworkRead {
            stage: STAGE_DOWNLOAD,
            url: "https://dl/a.zip".into(),
            source: std::io::Error::other("reset"),
        };
        assert_eq!(read.stage(), "download");
        assert!(read.to_string().starts_with("download response from https://dl/a.zip"));
        assert_eq!(VendorError::NotFound("x".into()).stage(), "resolve");
        assert_eq!(VendorError::Config("x".into()).stage(), "config");
        let io = VendorError::io("out.c", std::io::Error::other("disk full"));
        assert_eq!(io.stage(), "materialize");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = VendorError::io("sqlite3-binding.c", std::io::Error::other("disk full"));
        let msg = err.to_string();
        assert!(msg.contains("sqlite3-binding.c"));
        assert!(msg.contains("disk full"));
    }
}
