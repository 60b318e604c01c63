//! Canonical URL normalization and fetch-location mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical base of the WHO SMART base IG
pub const SMART_BASE_CANONICAL: &str = "http://smart.who.int/base/";
/// Where the SMART base IG publishes its generated JSON schemas
pub const SMART_BASE_PUBLICATION: &str =
    "https://worldhealthorganization.github.io/smart-base/";

/// A normalized canonical reference, optionally pinned to a version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalRef {
    pub url: String,
    pub version: Option<String>,
}

impl CanonicalRef {
    /// Parse `url` or `url|version`
    ///
    /// Whitespace, any `#fragment` and trailing slashes are dropped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (url, version) = match raw.split_once('|') {
            Some((url, version)) => (url, Some(version.trim())),
            None => (raw, None),
        };
        Self {
            url: normalize_url(url),
            version: version.filter(|v| !v.is_empty()).map(str::to_string),
        }
    }

    /// Cache key: `url` or `url|version`
    pub fn key(&self) -> String {
        match &self.version {
            Some(version) => format!("{}|{}", self.url, version),
            None => self.url.clone(),
        }
    }
}

impl fmt::Display for CanonicalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split_once('#').map_or(url, |(head, _)| head);
    url.trim_end_matches('/').to_string()
}

/// Maps a canonical base to the location its artifacts are published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicationRule {
    pub canonical_base: String,
    pub publication_base: String,
}

impl PublicationRule {
    pub fn new(canonical_base: impl Into<String>, publication_base: impl Into<String>) -> Self {
        Self {
            canonical_base: canonical_base.into(),
            publication_base: publication_base.into(),
        }
    }

    /// `{base}{Type}/{Id}` becomes `{publication}{Type}-{Id}.schema.json`
    fn apply(&self, url: &str) -> Option<String> {
        let base = self.canonical_base.trim_end_matches('/');
        let rest = url.strip_prefix(base)?.strip_prefix('/')?;
        let (kind, id) = rest.split_once('/')?;
        if kind.is_empty() || id.is_empty() || id.contains('/') {
            return None;
        }
        Some(format!(
            "{}/{}-{}.schema.json",
            self.publication_base.trim_end_matches('/'),
            kind,
            id
        ))
    }
}

/// Resolves canonical references to fetchable URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLocator {
    rules: Vec<PublicationRule>,
}

impl Default for CanonicalLocator {
    fn default() -> Self {
        Self::new(vec![PublicationRule::new(
            SMART_BASE_CANONICAL,
            SMART_BASE_PUBLICATION,
        )])
    }
}

impl CanonicalLocator {
    pub fn new(rules: Vec<PublicationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PublicationRule] {
        &self.rules
    }

    /// URL to GET for a canonical reference
    ///
    /// URLs already pointing at a `.json` document are used verbatim, as are URLs
    /// no rule matches.
    pub fn fetch_url(&self, canonical: &CanonicalRef) -> String {
        if canonical.url.ends_with(".json") {
            return canonical.url.clone();
        }
        self.rules
            .iter()
            .find_map(|rule| rule.apply(&canonical.url))
            .unwrap_or_else(|| canonical.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://x.org/ValueSet/A", "http://x.org/ValueSet/A", None)]
    #[case("  http://x.org/ValueSet/A/  ", "http://x.org/ValueSet/A", None)]
    #[case("http://x.org/ValueSet/A#frag", "http://x.org/ValueSet/A", None)]
    #[case("http://x.org/ValueSet/A|1.2.0", "http://x.org/ValueSet/A", Some("1.2.0"))]
    #[case("http://x.org/ValueSet/A|", "http://x.org/ValueSet/A", None)]
    fn test_parse(#[case] raw: &str, #[case] url: &str, #[case] version: Option<&str>) {
        let canonical = CanonicalRef::parse(raw);
        assert_eq!(canonical.url, url);
        assert_eq!(canonical.version.as_deref(), version);
    }

    #[test]
    fn test_key() {
        let canonical = CanonicalRef::parse("http://x.org/ValueSet/A|1.0");
        assert_eq!(canonical.key(), "http://x.org/ValueSet/A|1.0");
        assert_eq!(
            CanonicalRef::parse("http://x.org/ValueSet/A/").key(),
            CanonicalRef::parse("http://x.org/ValueSet/A").key()
        );
    }

    #[test]
    fn test_smart_base_mapping() {
        let locator = CanonicalLocator::default();
        let canonical = CanonicalRef::parse("http://smart.who.int/base/ValueSet/DAKComponentType");
        assert_eq!(
            locator.fetch_url(&canonical),
            "https://worldhealthorganization.github.io/smart-base/ValueSet-DAKComponentType.schema.json"
        );
    }

    #[rstest]
    #[case("https://example.org/schemas/thing.json")]
    #[case("http://other.org/ValueSet/X")]
    #[case("http://smart.who.int/base/ValueSet")]
    fn test_verbatim_urls(#[case] url: &str) {
        let locator = CanonicalLocator::default();
        assert_eq!(locator.fetch_url(&CanonicalRef::parse(url)), url);
    }
}
