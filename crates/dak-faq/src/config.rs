//! Configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file at
//! all) is a valid configuration.
//!
//! ```toml
//! [cache]
//! dir = "/var/cache/dak-faq"
//! freshness_hours = 24
//!
//! [fetch]
//! timeout_secs = 10
//! offline = false
//!
//! [[canonical.publications]]
//! canonical_base = "http://smart.who.int/base/"
//! publication_base = "https://worldhealthorganization.github.io/smart-base/"
//!
//! [execution]
//! batch_concurrency = 4
//! ```

use dak_faq_canonical::PublicationRule;
use dak_faq_canonical::locator::{SMART_BASE_CANONICAL, SMART_BASE_PUBLICATION};
use dak_faq_diagnostics::FaqError;
use dak_faq_types::KnownCanonical;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file named when `--config` is not given
pub const CONFIG_ENV: &str = "DAK_FAQ_CONFIG";
/// Overrides `cache.dir`
pub const CACHE_DIR_ENV: &str = "DAK_FAQ_CACHE_DIR";
/// Overrides `fetch.offline`
pub const OFFLINE_ENV: &str = "DAK_FAQ_OFFLINE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqConfig {
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
    pub canonical: CanonicalConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Durable tier directory; memory only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub freshness_hours: u64,
}

impl CacheConfig {
    /// Freshness window; `None` when it does not fit a duration
    pub fn freshness(&self) -> Option<chrono::Duration> {
        i64::try_from(self.freshness_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            freshness_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Never touch the network; every fetch fails
    pub offline: bool,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            offline: false,
            user_agent: format!("dak-faq/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalConfig {
    pub publications: Vec<PublicationRule>,
    /// Appended to the built-in directory of well-known canonicals
    pub known: Vec<KnownCanonical>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            publications: vec![PublicationRule::new(
                SMART_BASE_CANONICAL,
                SMART_BASE_PUBLICATION,
            )],
            known: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// 1 runs batch members one after another
    pub batch_concurrency: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: 1,
        }
    }
}

impl FaqConfig {
    pub fn from_toml(content: &str) -> Result<Self, FaqError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| FaqError::config(format!("invalid configuration: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, FaqError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| FaqError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, FaqError> {
        toml::to_string_pretty(self).map_err(|e| FaqError::config(e.to_string()))
    }

    /// Explicit path, then `DAK_FAQ_CONFIG`, then defaults; single-field
    /// environment overrides are applied last
    pub fn resolve(cli_config: Option<&Path>) -> Result<Self, FaqError> {
        Self::resolve_with(cli_config, |name| std::env::var(name).ok())
    }

    /// [`FaqConfig::resolve`] reading the environment through `lookup`
    pub fn resolve_with(
        cli_config: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FaqError> {
        let mut config = if let Some(path) = cli_config {
            Self::load_from_file(path)?
        } else if let Some(path) = lookup(CONFIG_ENV).filter(|p| !p.is_empty()) {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), FaqError> {
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            self.cache.dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup(OFFLINE_ENV) {
            self.fetch.offline = parse_flag(&flag).ok_or_else(|| {
                FaqError::config(format!("{} must be a boolean, got '{}'", OFFLINE_ENV, flag))
            })?;
        }
        Ok(())
    }

    fn check(&self) -> Result<(), FaqError> {
        if self.cache.freshness_hours == 0 {
            return Err(FaqError::config("cache.freshness_hours must be at least 1"));
        }
        if self.cache.freshness().is_none() {
            return Err(FaqError::config(format!(
                "cache.freshness_hours is too large: {}",
                self.cache.freshness_hours
            )));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(FaqError::config("fetch.timeout_secs must be at least 1"));
        }
        for rule in &self.canonical.publications {
            if rule.canonical_base.is_empty() || rule.publication_base.is_empty() {
                return Err(FaqError::config(
                    "canonical.publications entries need both bases",
                ));
            }
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dak_faq_types::CanonicalType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = FaqConfig::from_toml("").unwrap();
        assert_eq!(config, FaqConfig::default());
        assert_eq!(config.cache.freshness_hours, 24);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert_eq!(config.execution.batch_concurrency, 1);
        assert_eq!(config.canonical.publications.len(), 1);
    }

    #[test]
    fn test_full_file() {
        let config = FaqConfig::from_toml(
            r#"
            [cache]
            dir = "/tmp/faq-cache"
            freshness_hours = 6

            [fetch]
            timeout_secs = 3
            offline = true

            [[canonical.publications]]
            canonical_base = "http://example.org/fhir/"
            publication_base = "https://example.org/ig/"

            [[canonical.known]]
            url = "http://example.org/fhir/ValueSet/Colors"
            type = "ValueSet"
            title = "Colors"

            [execution]
            batch_concurrency = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/faq-cache")));
        assert_eq!(config.cache.freshness_hours, 6);
        assert!(config.fetch.offline);
        assert_eq!(
            config.canonical.publications,
            vec![PublicationRule::new("http://example.org/fhir/", "https://example.org/ig/")]
        );
        assert_eq!(config.canonical.known[0].resource_type, CanonicalType::ValueSet);
        assert_eq!(config.canonical.known[0].description, "");
        assert_eq!(config.execution.batch_concurrency, 4);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = FaqConfig::from_toml("[fetch]\ntimeout_secs = 0").unwrap_err();
        assert!(matches!(err, FaqError::Config { .. }));
    }

    #[test]
    fn test_rejects_oversized_freshness() {
        let err = FaqConfig::from_toml("[cache]\nfreshness_hours = 9000000000000000").unwrap_err();
        assert!(matches!(err, FaqError::Config { .. }));

        let config = FaqConfig::from_toml("[cache]\nfreshness_hours = 48").unwrap();
        assert_eq!(config.cache.freshness(), Some(chrono::Duration::hours(48)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(FaqConfig::from_toml("[cache\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config =
            FaqConfig::resolve_with(None, env(&[(CACHE_DIR_ENV, "/c"), (OFFLINE_ENV, "yes")]))
                .unwrap();
        assert_eq!(config.cache.dir, Some(PathBuf::from("/c")));
        assert!(config.fetch.offline);
    }

    #[rstest]
    #[case("1", Some(true))]
    #[case("TRUE", Some(true))]
    #[case(" on ", Some(true))]
    #[case("no", Some(false))]
    #[case("", Some(false))]
    #[case("maybe", None)]
    fn test_parse_flag(#[case] value: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_flag(value), expected);
    }

    #[test]
    fn test_bad_offline_flag() {
        assert!(FaqConfig::resolve_with(None, env(&[(OFFLINE_ENV, "maybe")])).is_err());
    }

    #[test]
    fn test_resolution_order() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        let from_env = dir.path().join("env.toml");
        std::fs::write(&explicit, "[execution]\nbatch_concurrency = 2").unwrap();
        std::fs::write(&from_env, "[execution]\nbatch_concurrency = 3").unwrap();
        let vars = [(CONFIG_ENV, from_env.to_str().unwrap())];

        let config = FaqConfig::resolve_with(Some(&explicit), env(&vars)).unwrap();
        assert_eq!(config.execution.batch_concurrency, 2);

        let config = FaqConfig::resolve_with(None, env(&vars)).unwrap();
        assert_eq!(config.execution.batch_concurrency, 3);

        let config = FaqConfig::resolve_with(None, env(&[])).unwrap();
        assert_eq!(config.execution.batch_concurrency, 1);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = FaqConfig::resolve_with(Some(Path::new("/nonexistent/faq.toml")), env(&[]))
            .unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let text = FaqConfig::default().to_toml().unwrap();
        assert_eq!(FaqConfig::from_toml(&text).unwrap(), FaqConfig::default());
    }
}
