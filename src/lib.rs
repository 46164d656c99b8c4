//! Vendors a pinned upstream amalgamation release as guarded C sources.
//!
//! The pipeline resolves a release tag against the project's release list,
//! downloads the matching zip asset into memory and rewrites the selected
//! members so they compile as vendored sources that switch themselves off
//! when the host project links the system library instead.
//!
//! # Example
//!
//! ```no_run
//! use amalgam_vendor::{VendorConfig, pipeline};
//!
//! let config = VendorConfig::default();
//! let report = pipeline::run(&config)?;
//! for file in &report.written {
//!     println!("{}", file.path.display());
//! }
//! # Ok::<(), amalgam_vendor::VendorError>(())
//! ```
//!
//! # Stages
//!
//! - [`catalog`] - fetch the release list
//! - [`resolver`] - pick the release and asset
//! - [`fetch`] - download and open the archive
//! - [`transform`] - guard and rewrite members
//! - [`pipeline`] - run everything in order

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod transform;

pub use config::{MatchKind, VendorConfig};
pub use error::VendorError;
