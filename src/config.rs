//! Configuration resolution.
//!
//! Four sources are merged into one [`EffectiveConfig`], field by field:
//! CLI flag, then environment variable, then config file, then built-in
//! default. Empty strings count as unset at every level.

use crate::error::ConfigError;
use crate::providers::EnvProvider;
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_API_URL: &str = "https://cmd.xaw.me";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_CACHE_MAX_SIZE: usize = 1000;

pub const ENV_API_URL: &str = "XAW_API_URL";
pub const ENV_PROVIDER: &str = "XAW_PROVIDER";
pub const ENV_API_KEY: &str = "XAW_API_KEY";
pub const ENV_MODEL: &str = "XAW_MODEL";

const APP_DIR: &str = "clixaw";
const CONFIG_FILE: &str = "config.toml";

// =============================================================================
// Config file
// =============================================================================

/// On-disk `config.toml`.
///
/// Sections are preferred; the root-level `api_url`, `provider`, `api_key`
/// and `model` keys are read only when the matching section is absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub api: Option<ApiSection>,
    provider: Option<ProviderEntry>,
    pub cache: Option<CacheSection>,
    pub safety: Option<SafetySection>,
    api_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub url: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: Option<bool>,
    pub ttl: Option<u64>,
    pub max_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SafetySection {
    pub extra_patterns: Vec<String>,
}

/// `provider` is a table in the current layout and a bare name in the legacy one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderEntry {
    Section(ProviderSection),
    Name(String),
}

impl ConfigFile {
    /// Reads and parses a config file.
    ///
    /// Returns `Ok(None)` when the file does not exist. A file that exists
    /// but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let file = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from: {}", path.display());
        Ok(Some(file))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn provider_section(&self) -> Option<&ProviderSection> {
        match &self.provider {
            Some(ProviderEntry::Section(section)) => Some(section),
            _ => None,
        }
    }

    pub fn api_url(&self) -> Option<&str> {
        match &self.api {
            Some(api) => api.url.as_deref(),
            None => self.api_url.as_deref(),
        }
    }

    pub fn provider_name(&self) -> Option<&str> {
        match &self.provider {
            Some(ProviderEntry::Section(section)) => section.name.as_deref(),
            Some(ProviderEntry::Name(name)) => Some(name),
            None => None,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self.provider_section() {
            Some(section) => section.api_key.as_deref(),
            None => self.api_key.as_deref(),
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self.provider_section() {
            Some(section) => section.model.as_deref(),
            None => self.model.as_deref(),
        }
    }

    pub fn timeout(&self) -> Option<u64> {
        self.api.as_ref().and_then(|api| api.timeout)
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Per-user directory holding `config.toml`, `history.json` and `cache.json`.
///
/// `$XDG_CONFIG_HOME/clixaw` if set, otherwise `~/.config/clixaw`.
pub fn config_dir(env: &impl EnvProvider) -> Option<PathBuf> {
    if let Some(xdg) = env.var("XDG_CONFIG_HOME").filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }
    dirs::home_dir().map(|home| home.join(".config").join(APP_DIR))
}

pub fn default_config_path(env: &impl EnvProvider) -> Option<PathBuf> {
    config_dir(env).map(|dir| dir.join(CONFIG_FILE))
}

// =============================================================================
// Effective configuration
// =============================================================================

/// Values supplied explicitly on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub execute: bool,
    pub skip_confirm: bool,
    pub no_cache: bool,
    pub copy: bool,
    pub config_path: Option<PathBuf>,
}

/// Which backend the translation API should use.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderSettings {
    /// The service's default backend; no provider headers are sent.
    Anonymous,
    Custom {
        name: String,
        api_key: String,
        model: Option<String>,
    },
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Custom { name, model, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("api_key", &"<redacted>")
                .field("model", model)
                .finish(),
        }
    }
}

impl ProviderSettings {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Custom { name, .. } => Some(name),
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Custom { model, .. } => model.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_size: DEFAULT_CACHE_MAX_SIZE,
        }
    }
}

/// The merged configuration for one invocation. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub api_url: Url,
    pub provider: ProviderSettings,
    pub execute: bool,
    pub skip_confirm: bool,
    pub timeout: Duration,
    pub use_cache: bool,
    pub copy: bool,
    pub cache: CacheSettings,
    pub extra_danger_patterns: Vec<String>,
    /// The config file that was consulted, whether or not it existed.
    pub config_path: Option<PathBuf>,
}

impl EffectiveConfig {
    /// Locates and reads the config file, then resolves against it.
    pub fn load(flags: &CliOverrides, env: &impl EnvProvider) -> Result<Self, ConfigError> {
        let path = flags
            .config_path
            .clone()
            .or_else(|| default_config_path(env));

        let file = match &path {
            Some(path) => ConfigFile::load(path)?,
            None => {
                warn!("Could not determine config directory, skipping config file");
                None
            }
        };

        let mut config = Self::resolve(flags, env, file.as_ref())?;
        config.config_path = path;
        Ok(config)
    }

    /// Merges the sources in precedence order. Pure; touches no I/O.
    pub fn resolve(
        flags: &CliOverrides,
        env: &impl EnvProvider,
        file: Option<&ConfigFile>,
    ) -> Result<Self, ConfigError> {
        let api_url = pick(
            flags.api_url.as_deref(),
            env.var(ENV_API_URL),
            file.and_then(ConfigFile::api_url),
        )
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let provider = pick(
            flags.provider.as_deref(),
            env.var(ENV_PROVIDER),
            file.and_then(ConfigFile::provider_name),
        );
        let api_key = pick(
            flags.api_key.as_deref(),
            env.var(ENV_API_KEY),
            file.and_then(ConfigFile::api_key),
        );
        let model = pick(
            flags.model.as_deref(),
            env.var(ENV_MODEL),
            file.and_then(ConfigFile::model),
        );

        let timeout_secs = file
            .and_then(ConfigFile::timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let cache_section = file.and_then(|f| f.cache.as_ref());
        let defaults = CacheSettings::default();
        let cache = CacheSettings {
            enabled: cache_section.and_then(|c| c.enabled).unwrap_or(defaults.enabled),
            ttl_secs: cache_section.and_then(|c| c.ttl).unwrap_or(defaults.ttl_secs),
            max_size: cache_section.and_then(|c| c.max_size).unwrap_or(defaults.max_size),
        };

        let extra_danger_patterns = file
            .and_then(|f| f.safety.as_ref())
            .map(|s| s.extra_patterns.clone())
            .unwrap_or_default();

        Ok(Self {
            api_url: parse_api_url(&api_url)?,
            provider: provider_settings(provider, api_key, model),
            execute: flags.execute,
            skip_confirm: flags.skip_confirm,
            timeout: Duration::from_secs(timeout_secs),
            use_cache: cache.enabled && !flags.no_cache,
            copy: flags.copy,
            cache,
            extra_danger_patterns,
            config_path: None,
        })
    }
}

impl EffectiveConfig {
    /// Human-readable summary for `xaw --show-config`. The API key is never shown.
    pub fn write_summary<W: Write>(&self, output: &mut W) -> std::io::Result<()> {
        match &self.config_path {
            Some(path) if path.exists() => writeln!(output, "Configuration file: {} (found)", path.display())?,
            Some(path) => writeln!(output, "Configuration file: {} (not found, using defaults)", path.display())?,
            None => writeln!(output, "Configuration file: none")?,
        }
        writeln!(output, "API URL: {}", self.api_url)?;
        match &self.provider {
            ProviderSettings::Anonymous => writeln!(output, "Provider: default")?,
            ProviderSettings::Custom { name, model, .. } => {
                writeln!(output, "Provider: {}", name)?;
                writeln!(output, "API Key: set")?;
                writeln!(output, "Model: {}", model.as_deref().unwrap_or("provider default"))?;
            }
        }
        writeln!(output, "Timeout: {}s", self.timeout.as_secs())?;
        writeln!(
            output,
            "Cache: {} (ttl {}s, max {} entries)",
            if self.cache.enabled { "enabled" } else { "disabled" },
            self.cache.ttl_secs,
            self.cache.max_size
        )?;
        if !self.extra_danger_patterns.is_empty() {
            writeln!(output, "Extra danger patterns: {}", self.extra_danger_patterns.join(", "))?;
        }

        writeln!(output, "\nEnvironment overrides: {}, {}, {}, {}", ENV_API_URL, ENV_PROVIDER, ENV_API_KEY, ENV_MODEL)?;
        Ok(())
    }
}

/// First non-blank value in precedence order.
fn pick(flag: Option<&str>, env: Option<String>, file: Option<&str>) -> Option<String> {
    [flag.map(str::to_string), env, file.map(str::to_string)]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

fn provider_settings(
    name: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
) -> ProviderSettings {
    match (name, api_key) {
        (Some(name), Some(api_key)) => ProviderSettings::Custom { name, api_key, model },
        (Some(name), None) => {
            warn!("Provider '{}' has no API key, using the default provider", name);
            ProviderSettings::Anonymous
        }
        (None, Some(_)) => {
            warn!("API key set without a provider, using the default provider");
            ProviderSettings::Anonymous
        }
        (None, None) => ProviderSettings::Anonymous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn file(content: &str) -> ConfigFile {
        ConfigFile::parse(content).unwrap()
    }

    const FULL_FILE: &str = r#"
[api]
url = "https://file.example"

[provider]
name = "file-provider"
api_key = "file-key"
model = "file-model"
"#;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_defaults_when_no_source_is_set() {
        let config = EffectiveConfig::resolve(&CliOverrides::default(), &env(&[]), None).unwrap();

        assert_eq!(config.api_url.as_str(), "https://cmd.xaw.me/");
        assert_eq!(config.provider, ProviderSettings::Anonymous);
        assert!(!config.execute);
        assert!(!config.skip_confirm);
        assert!(config.use_cache);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.cache, CacheSettings::default());
    }

    // =========================================================================
    // Precedence
    // =========================================================================

    #[test]
    fn test_file_beats_default() {
        let config =
            EffectiveConfig::resolve(&CliOverrides::default(), &env(&[]), Some(&file(FULL_FILE))).unwrap();

        assert_eq!(config.api_url.as_str(), "https://file.example/");
        assert_eq!(
            config.provider,
            ProviderSettings::Custom {
                name: "file-provider".to_string(),
                api_key: "file-key".to_string(),
                model: Some("file-model".to_string()),
            }
        );
    }

    #[test]
    fn test_env_beats_file() {
        let env = env(&[
            (ENV_API_URL, "https://env.example"),
            (ENV_PROVIDER, "env-provider"),
            (ENV_API_KEY, "env-key"),
            (ENV_MODEL, "env-model"),
        ]);
        let config =
            EffectiveConfig::resolve(&CliOverrides::default(), &env, Some(&file(FULL_FILE))).unwrap();

        assert_eq!(config.api_url.as_str(), "https://env.example/");
        assert_eq!(
            config.provider,
            ProviderSettings::Custom {
                name: "env-provider".to_string(),
                api_key: "env-key".to_string(),
                model: Some("env-model".to_string()),
            }
        );
    }

    #[test]
    fn test_flags_beat_env_and_file() {
        let env = env(&[
            (ENV_API_URL, "https://env.example"),
            (ENV_PROVIDER, "env-provider"),
            (ENV_API_KEY, "env-key"),
            (ENV_MODEL, "env-model"),
        ]);
        let flags = CliOverrides {
            api_url: Some("https://flag.example".to_string()),
            provider: Some("flag-provider".to_string()),
            api_key: Some("flag-key".to_string()),
            model: Some("flag-model".to_string()),
            ..Default::default()
        };
        let config = EffectiveConfig::resolve(&flags, &env, Some(&file(FULL_FILE))).unwrap();

        assert_eq!(config.api_url.as_str(), "https://flag.example/");
        assert_eq!(
            config.provider,
            ProviderSettings::Custom {
                name: "flag-provider".to_string(),
                api_key: "flag-key".to_string(),
                model: Some("flag-model".to_string()),
            }
        );
    }

    #[test]
    fn test_precedence_is_per_field() {
        // Each field comes from a different source.
        let env = env(&[(ENV_API_KEY, "env-key")]);
        let flags = CliOverrides {
            model: Some("flag-model".to_string()),
            ..Default::default()
        };
        let config = EffectiveConfig::resolve(
            &flags,
            &env,
            Some(&file("[provider]\nname = \"file-provider\"\n")),
        )
        .unwrap();

        assert_eq!(config.api_url.as_str(), "https://cmd.xaw.me/");
        assert_eq!(
            config.provider,
            ProviderSettings::Custom {
                name: "file-provider".to_string(),
                api_key: "env-key".to_string(),
                model: Some("flag-model".to_string()),
            }
        );
    }

    #[test]
    fn test_blank_values_fall_through() {
        let env = env(&[(ENV_API_URL, "   ")]);
        let flags = CliOverrides {
            api_url: Some(String::new()),
            ..Default::default()
        };
        let config = EffectiveConfig::resolve(&flags, &env, Some(&file(FULL_FILE))).unwrap();

        assert_eq!(config.api_url.as_str(), "https://file.example/");
    }

    // =========================================================================
    // Provider settings
    // =========================================================================

    #[test]
    fn test_provider_without_key_is_anonymous() {
        let env = env(&[(ENV_PROVIDER, "openai")]);
        let config = EffectiveConfig::resolve(&CliOverrides::default(), &env, None).unwrap();
        assert_eq!(config.provider, ProviderSettings::Anonymous);
    }

    #[test]
    fn test_key_without_provider_is_anonymous() {
        let env = env(&[(ENV_API_KEY, "sk-test")]);
        let config = EffectiveConfig::resolve(&CliOverrides::default(), &env, None).unwrap();
        assert_eq!(config.provider, ProviderSettings::Anonymous);
    }

    #[test]
    fn test_debug_output_redacts_api_key() {
        let provider = ProviderSettings::Custom {
            name: "openai".to_string(),
            api_key: "sk-secret".to_string(),
            model: None,
        };
        let rendered = format!("{:?}", provider);
        assert!(rendered.contains("openai"));
        assert!(!rendered.contains("sk-secret"));
    }

    // =========================================================================
    // Config file parsing
    // =========================================================================

    #[test]
    fn test_legacy_root_level_keys() {
        let legacy = file(
            r#"
api_url = "https://legacy.example"
provider = "gemini"
api_key = "legacy-key"
model = "gemini-pro"
"#,
        );

        assert_eq!(legacy.api_url(), Some("https://legacy.example"));
        assert_eq!(legacy.provider_name(), Some("gemini"));
        assert_eq!(legacy.api_key(), Some("legacy-key"));
        assert_eq!(legacy.model(), Some("gemini-pro"));
    }

    #[test]
    fn test_sections_shadow_root_level_keys() {
        let mixed = file(
            r#"
api_key = "root-key"

[provider]
name = "openai"
"#,
        );

        assert_eq!(mixed.provider_name(), Some("openai"));
        assert_eq!(mixed.api_key(), None);
    }

    #[test]
    fn test_cache_and_safety_sections() {
        let parsed = file(
            r#"
[api]
timeout = 3

[cache]
enabled = false
ttl = 60
max_size = 5

[safety]
extra_patterns = ["git push --force"]
"#,
        );
        let config = EffectiveConfig::resolve(&CliOverrides::default(), &env(&[]), Some(&parsed)).unwrap();

        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(!config.use_cache);
        assert_eq!(
            config.cache,
            CacheSettings {
                enabled: false,
                ttl_secs: 60,
                max_size: 5
            }
        );
        assert_eq!(config.extra_danger_patterns, vec!["git push --force".to_string()]);
    }

    #[test]
    fn test_no_cache_flag_disables_cache() {
        let flags = CliOverrides {
            no_cache: true,
            ..Default::default()
        };
        let config = EffectiveConfig::resolve(&flags, &env(&[]), None).unwrap();
        assert!(!config.use_cache);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = EffectiveConfig::resolve(
            &CliOverrides::default(),
            &env(&[]),
            Some(&file("[api]\ntimeout = 0\n")),
        );
        assert!(matches!(result, Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let flags = CliOverrides {
            api_url: Some("not a url".to_string()),
            ..Default::default()
        };
        let result = EffectiveConfig::resolve(&flags, &env(&[]), None);
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));

        let flags = CliOverrides {
            api_url: Some("ftp://cmd.xaw.me".to_string()),
            ..Default::default()
        };
        let result = EffectiveConfig::resolve(&flags, &env(&[]), None);
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    // =========================================================================
    // Loading from disk
    // =========================================================================

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let flags = CliOverrides {
            config_path: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };

        let config = EffectiveConfig::load(&flags, &env(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "https://cmd.xaw.me/");
        assert_eq!(config.config_path, Some(dir.path().join("absent.toml")));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api\nurl = ").unwrap();
        let flags = CliOverrides {
            config_path: Some(path),
            ..Default::default()
        };

        let result = EffectiveConfig::load(&flags, &env(&[]));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_summary_hides_api_key() {
        let flags = CliOverrides {
            provider: Some("openai".to_string()),
            api_key: Some("sk-hidden".to_string()),
            ..Default::default()
        };
        let config = EffectiveConfig::resolve(&flags, &env(&[]), None).unwrap();

        let mut output = Vec::new();
        config.write_summary(&mut output).unwrap();
        let summary = String::from_utf8(output).unwrap();

        assert!(summary.contains("Provider: openai"));
        assert!(summary.contains("API Key: set"));
        assert!(!summary.contains("sk-hidden"));
    }

    #[test]
    fn test_default_path_honours_xdg_config_home() {
        let dir = TempDir::new().unwrap();
        let app_dir = dir.path().join("clixaw");
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(app_dir.join("config.toml"), "[api]\nurl = \"http://xdg.example\"\n").unwrap();

        let env = env(&[("XDG_CONFIG_HOME", dir.path().to_str().unwrap())]);
        let config = EffectiveConfig::load(&CliOverrides::default(), &env).unwrap();

        assert_eq!(config.api_url.as_str(), "http://xdg.example/");
        assert_eq!(config.config_path, Some(app_dir.join("config.toml")));
    }
}
