//! Asset resolution
//!
//! Pure functions over an immutable catalog: find the release carrying the
//! pinned tag, then pick the asset whose name satisfies the matcher.

use crate::catalog::{Asset, Catalog, Release};
use crate::error::{Result, VendorError};

/// Predicate over asset names.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetMatcher {
    /// Name contains the given substring.
    Contains(String),
    /// Name matches a shell-style glob (e.g. `*-amalgamation.zip`).
    Glob(glob::Pattern),
}

impl AssetMatcher {
    pub fn contains(needle: &str) -> Self {
        AssetMatcher::Contains(needle.to_string())
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        glob::Pattern::new(pattern)
            .map(AssetMatcher::Glob)
            .map_err(|e| VendorError::Config(format!("invalid asset pattern '{}': {}", pattern, e)))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            AssetMatcher::Contains(needle) => name.contains(needle.as_str()),
            AssetMatcher::Glob(pattern) => pattern.matches(name),
        }
    }
}

impl std::fmt::Display for AssetMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetMatcher::Contains(needle) => write!(f, "*{}*", needle),
            AssetMatcher::Glob(pattern) => write!(f, "{}", pattern.as_str()),
        }
    }
}

/// The asset chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub tag: String,
    pub name: String,
    pub download_url: String,
}

/// Find the single release tagged exactly `tag` (case-sensitive).
pub fn find_release<'a>(catalog: &'a Catalog, tag: &str) -> Result<&'a Release> {
    let mut matching = catalog.iter().filter(|r| r.tag == tag);

    let release = matching
        .next()
        .ok_or_else(|| VendorError::NotFound(format!("version not found: {}", tag)))?;

    let extra = matching.count();
    if extra > 0 {
        return Err(VendorError::NotFound(format!(
            "version {} is ambiguous: {} releases carry that tag",
            tag,
            extra + 1
        )));
    }

    Ok(release)
}

/// Select the asset satisfying `matcher`.
///
/// Every asset is visited and the last match is kept, so when several assets
/// match, the one listed last wins. Returns `None` when nothing matches.
pub fn select_asset<'a>(release: &'a Release, matcher: &AssetMatcher) -> Option<&'a Asset> {
    let mut selected = None;
    for asset in &release.assets {
        if matcher.matches(&asset.name) {
            selected = Some(asset);
        }
    }
    selected
}

/// Resolve the download URL for `tag` and `matcher`.
pub fn resolve(catalog: &Catalog, tag: &str, matcher: &AssetMatcher) -> Result<ResolvedAsset> {
    let release = find_release(catalog, tag)?;

    match select_asset(release, matcher) {
        Some(asset) if !asset.download_url.is_empty() => Ok(ResolvedAsset {
            tag: release.tag.clone(),
            name: asset.name.clone(),
            download_url: asset.download_url.clone(),
        }),
        _ => Err(VendorError::NotFound(format!(
            "asset not found: no asset matching '{}' with a download URL in release {}",
            matcher, tag
        ))),
    }
}
