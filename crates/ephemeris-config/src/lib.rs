//! Declarative TOML configuration, shared by the API supervisor and the
//! worker subprocess entry point, with environment-variable overrides.
//!
//! Nested-struct shape after the Acteon server's config pattern: a
//! top-level struct composed of per-subsystem structs, each
//! `#[serde(default)]` so a caller's TOML file need only name the
//! fields it wants to change.

use std::env;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ConfigError {
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration, loaded from a TOML file and then patched by
/// the recognized environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EphemerisConfig {
    pub api: ApiConfig,
    pub kernel: KernelConfig,
    pub worker_pool: WorkerPoolConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub time_resolver: TimeResolverConfig,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            kernel: KernelConfig::default(),
            worker_pool: WorkerPoolConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            time_resolver: TimeResolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:8080".to_string(), allowed_origins: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Identifier of the default ephemeris bundle, e.g. `"DE440"`.
    pub bundle_id: String,
    /// Path to the bundle manifest (checksums, coverage windows, file paths).
    pub manifest_path: String,
    /// Path to the NAIF leap-second kernel (`naif0012.tls` or equivalent).
    pub lsk_path: String,
    /// Manifest for the wide-coverage handoff bundle (DE441), consulted
    /// only when `manifest_path`'s bundle does not cover the request epoch.
    pub wide_manifest_path: Option<String>,
    /// Path to the declarative ayanāṃśa registry seed file; `None` uses
    /// the registry's bundled default.
    pub ayanamsha_registry_path: Option<String>,
    /// Path to the IERS Earth-orientation parameter file; `None` uses the
    /// fallback mean-rotation model unconditionally.
    pub eop_path: Option<String>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            bundle_id: "DE440".to_string(),
            manifest_path: "kernels/manifest.toml".to_string(),
            lsk_path: "kernels/naif0012.tls".to_string(),
            wide_manifest_path: None,
            ayanamsha_registry_path: None,
            eop_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,
    pub queue_size: usize,
    pub job_timeout_ms: u64,
    pub max_replacements_per_min: u32,
}

impl WorkerPoolConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2);
        Self { worker_count: cores * 2, queue_size: 64, job_timeout_ms: 30_000, max_replacements_per_min: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub l1_capacity: usize,
    pub l1_ttl_secs: u64,
    /// Connection URL for the distributed L2 backing; `None` runs L1-only.
    pub l2_url: Option<String>,
    pub l2_ttl_secs: u64,
}

impl CacheConfig {
    pub fn l1_ttl(&self) -> Duration {
        Duration::from_secs(self.l1_ttl_secs)
    }

    pub fn l2_ttl(&self) -> Duration {
        Duration::from_secs(self.l2_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { l1_capacity: 10_000, l1_ttl_secs: 3_600, l2_url: None, l2_ttl_secs: 3_600 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitRuleConfig {
    pub path_prefix: Option<String>,
    pub key_source: String,
    pub limit: f64,
    pub period_secs: u64,
}

impl Default for RateLimitRuleConfig {
    fn default() -> Self {
        Self { path_prefix: None, key_source: "client_ip".to_string(), limit: 60.0, period_secs: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub storage_uri: Option<String>,
    pub rules: Vec<RateLimitRuleConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage_uri: None,
            rules: vec![RateLimitRuleConfig {
                path_prefix: Some("/v1/positions".to_string()),
                key_source: "client_ip".to_string(),
                limit: 60.0,
                period_secs: 60,
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeResolverConfig {
    /// Declarative pre-standardization patch table (TOML), consulted only
    /// under the `strict_history` parity profile.
    pub patch_table_path: Option<String>,
    pub geocoder_url: Option<String>,
    pub default_parity_profile: String,
}

impl Default for TimeResolverConfig {
    fn default() -> Self {
        Self { patch_table_path: None, geocoder_url: None, default_parity_profile: "strict_history".to_string() }
    }
}

impl EphemerisConfig {
    /// Parse a TOML document into a config, falling back to defaults for
    /// anything absent.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply the recognized environment variables over `self`, mutating
    /// in place so callers can layer `from_toml` then `apply_env`.
    pub fn apply_env(&mut self) {
        self.apply_env_from(&env::vars().collect::<Vec<_>>());
    }

    /// Testable variant of [`Self::apply_env`] that reads from an
    /// explicit key/value list instead of the process environment.
    pub fn apply_env_from(&mut self, vars: &[(String, String)]) {
        let get = |key: &str| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

        if let Some(bundle) = get("KERNEL_BUNDLE") {
            self.kernel.bundle_id = bundle;
        }
        if let Some(workers) = get("WORKERS").and_then(|v| v.parse().ok()) {
            self.worker_pool.worker_count = workers;
        }
        if let Some(queue_size) = get("QUEUE_SIZE").and_then(|v| v.parse().ok()) {
            self.worker_pool.queue_size = queue_size;
        }
        if let Some(redis_url) = get("REDIS_URL") {
            self.cache.l2_url = Some(redis_url);
        }
        if let Some(storage_uri) = get("RATE_LIMIT_STORAGE_URI") {
            self.rate_limit.storage_uri = Some(storage_uri);
        }
        if let Some(time_resolver_url) = get("TIME_RESOLVER_URL") {
            self.time_resolver.geocoder_url = Some(time_resolver_url);
        }
        if let Some(disable) = get("DISABLE_RATE_LIMIT") {
            self.rate_limit.enabled = !truthy(&disable);
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            self.api.allowed_origins = origins.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_consistent() {
        let cfg = EphemerisConfig::default();
        assert_eq!(cfg.kernel.bundle_id, "DE440");
        assert!(cfg.worker_pool.worker_count >= 2, "default pool sizes at ~2x cores");
        assert_eq!(cfg.worker_pool.job_timeout_ms, 30_000);
        assert!(cfg.rate_limit.enabled);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = EphemerisConfig::from_toml(
            r#"
            [worker_pool]
            worker_count = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.worker_pool.worker_count, 8);
        assert_eq!(cfg.worker_pool.queue_size, 64);
        assert_eq!(cfg.kernel.bundle_id, "DE440");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = EphemerisConfig::from_toml("not = [valid").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_apply_over_file_values() {
        let mut cfg = EphemerisConfig::default();
        cfg.apply_env_from(&[
            ("KERNEL_BUNDLE".to_string(), "DE441".to_string()),
            ("WORKERS".to_string(), "16".to_string()),
            ("DISABLE_RATE_LIMIT".to_string(), "true".to_string()),
            ("ALLOWED_ORIGINS".to_string(), "https://a.example, https://b.example".to_string()),
        ]);
        assert_eq!(cfg.kernel.bundle_id, "DE441");
        assert_eq!(cfg.worker_pool.worker_count, 16);
        assert!(!cfg.rate_limit.enabled);
        assert_eq!(cfg.api.allowed_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn unset_env_vars_leave_defaults_untouched() {
        let mut cfg = EphemerisConfig::default();
        cfg.apply_env_from(&[]);
        assert_eq!(cfg.kernel.bundle_id, "DE440");
    }
}
