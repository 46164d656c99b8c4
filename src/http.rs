//! Shared blocking HTTP agent
//!
//! Both pipeline requests go through one `ureq::Agent` so they share the
//! configured timeout and headers.

use std::time::Duration;

/// Sent on every request; GitHub rejects API calls without one.
pub const USER_AGENT: &str = concat!("amalgam-vendor/", env!("CARGO_PKG_VERSION"));

/// Build the agent. `None` means no timeout at all.
pub fn agent(timeout: Option<Duration>) -> ureq::Agent {
    let mut builder = ureq::AgentBuilder::new().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Content length advertised by a response, if any.
pub fn content_length(response: &ureq::Response) -> Option<u64> {
    response
        .header("content-length")
        .and_then(|s| s.parse().ok())
}
