//! Release catalog
//!
//! Fetches the list of releases published for the upstream project. Only the
//! top-level array shape is enforced; individual records are read
//! best-effort and any missing or mistyped field is left empty.

use crate::error::{Result, STAGE_CATALOG, VendorError};
use crate::output;
use serde_json::Value;
use std::io::Read;

/// One downloadable file attached to a release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub download_url: String,
}

/// A published release and its assets, in response order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub assets: Vec<Asset>,
}

/// Releases in the order the endpoint returned them.
pub type Catalog = Vec<Release>;

/// Fetch and parse the release catalog from `endpoint`.
pub fn fetch_catalog(agent: &ureq::Agent, endpoint: &str) -> Result<Catalog> {
    output::detail(&format!("fetching releases from {}", endpoint));

    let response = agent
        .get(endpoint)
        .set("Accept", "application/vnd.github.v3+json")
        .call()
        .map_err(|e| VendorError::network(STAGE_CATALOG, endpoint, e))?;

    let mut body = String::new();
    response
        .into_reader()
        .read_to_string(&mut body)
        .map_err(|e| VendorError::NetworkRead {
            stage: STAGE_CATALOG,
            url: endpoint.to_string(),
            source: e,
        })?;

    parse_catalog(&body)
}

/// Parse a catalog body. Fails only when the body is not a JSON array.
pub fn parse_catalog(body: &str) -> Result<Catalog> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| VendorError::Parse(e.to_string()))?;

    let items = json.as_array().ok_or_else(|| {
        VendorError::Parse(format!("expected a JSON array, got {}", kind(&json)))
    })?;

    Ok(items.iter().map(parse_release).collect())
}

fn parse_release(value: &Value) -> Release {
    let assets = value
        .get("assets")
        .and_then(Value::as_array)
        .map(|assets| assets.iter().map(parse_asset).collect())
        .unwrap_or_default();

    Release {
        tag: string_field(value, &["tag_name"]),
        assets,
    }
}

fn parse_asset(value: &Value) -> Asset {
    Asset {
        // GitHub sends `name`; some mirrors capitalise it.
        name: string_field(value, &["name", "Name"]),
        download_url: string_field(value, &["browser_download_url"]),
    }
}

fn string_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
