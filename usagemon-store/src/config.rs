//! Configuration model and loader.
//!
//! Configuration is read from the first YAML file found in the search order
//! (explicit path, `~/.config/usagemon/config.yaml`, `~/.usagemon.yaml`,
//! `./.usagemon.yaml`), then from the environment, then defaults.
//!
//! Loading never fails: unreadable files, bad YAML and out-of-range values
//! become warnings and the affected fields keep their defaults.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use usagemon_core::{ProviderCredentials, ProviderKind};

use crate::error::StoreError;
use crate::persistence::config_search_paths;

/// Admin API key environment variable.
pub const ENV_ADMIN_API_KEY: &str = "ANTHROPIC_ADMIN_API_KEY";

/// Refresh interval environment variable.
pub const ENV_REFRESH_INTERVAL: &str = "USAGEMON_REFRESH_INTERVAL";

const REFRESH_INTERVAL_RANGE: (u64, u64) = (10, 3600);
const WIDGET_WIDTH_RANGE: (u64, u64) = (30, 100);
const TIMEOUT_RANGE: (u64, u64) = (1, 300);

// ============================================================================
// Enums
// ============================================================================

/// Display currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar.
    #[default]
    Usd,
    /// Euro.
    Eur,
    /// Korean won.
    Krw,
    /// Japanese yen.
    Jpy,
    /// Pound sterling.
    Gbp,
}

impl Currency {
    /// Returns the ISO code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Krw => "KRW",
            Currency::Jpy => "JPY",
            Currency::Gbp => "GBP",
        }
    }

    /// Returns the currency symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Krw => "₩",
            Currency::Jpy => "¥",
            Currency::Gbp => "£",
        }
    }

    /// Looks up a currency by ISO code; unknown codes fall back to USD.
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "KRW" => Ok(Currency::Krw),
            "JPY" => Ok(Currency::Jpy),
            "GBP" => Ok(Currency::Gbp),
            _ => Err("expected one of USD, EUR, KRW, JPY, GBP".to_string()),
        }
    }
}

/// Widget border style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStyle {
    /// `╭─╮` corners.
    #[default]
    Rounded,
    /// `┌─┐` corners.
    Square,
    /// `╔═╗` corners.
    Double,
    /// `+-+` ASCII.
    Simple,
}

impl FromStr for WidgetStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rounded" => Ok(WidgetStyle::Rounded),
            "square" => Ok(WidgetStyle::Square),
            "double" => Ok(WidgetStyle::Double),
            "simple" => Ok(WidgetStyle::Simple),
            _ => Err("expected one of rounded, square, double, simple".to_string()),
        }
    }
}

/// Widget position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Left aligned.
    #[default]
    Left,
    /// Right aligned.
    Right,
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            _ => Err("expected one of left, right".to_string()),
        }
    }
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// A YAML file.
    File,
    /// Environment variables.
    Env,
    /// Built-in defaults.
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSource::File => "file",
            ConfigSource::Env => "env",
            ConfigSource::Default => "default",
        })
    }
}

// ============================================================================
// Resolved Config
// ============================================================================

/// Anthropic Admin API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnthropicConfig {
    /// Admin API key (`sk-ant-admin...`).
    pub admin_api_key: Option<String>,
    /// Whether the cost monitor runs.
    pub enabled: bool,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            admin_api_key: None,
            enabled: true,
        }
    }
}

/// OAuth rate-limit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    /// Whether the rate-limit monitor runs.
    pub enabled: bool,
    /// Whether the profile is fetched alongside rate limits.
    pub show_profile: bool,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_profile: true,
        }
    }
}

/// Dashboard display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Seconds between polls (10..=3600).
    pub refresh_interval: u64,
    /// Show the Admin API cost widget.
    pub show_api_usage: bool,
    /// Show the rate-limit widget.
    pub show_rate_limits: bool,
    /// Display currency.
    pub currency: Currency,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval: 30,
            show_api_usage: true,
            show_rate_limits: true,
            currency: Currency::Usd,
        }
    }
}

/// Widget rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Outer width in columns (30..=100).
    pub width: usize,
    /// Border style.
    pub style: WidgetStyle,
    /// Horizontal position.
    pub position: Position,
    /// Use ANSI colors.
    pub colors: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            width: 42,
            style: WidgetStyle::Rounded,
            position: Position::Left,
            colors: true,
        }
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Per-fetch timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Explicit per-provider settings for the usage aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSourceConfig {
    /// Provider.
    pub kind: ProviderKind,
    /// `false` skips the provider entirely.
    pub enabled: bool,
    /// Explicit credentials; these win over environment credentials.
    pub credentials: ProviderCredentials,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    /// Admin API settings.
    pub anthropic: AnthropicConfig,
    /// OAuth settings.
    pub oauth: OAuthConfig,
    /// Display settings.
    pub display: DisplayConfig,
    /// Widget settings.
    pub widget: WidgetConfig,
    /// Explicit provider blocks, in registry order.
    pub providers: Vec<ProviderSourceConfig>,
    /// Fetch settings.
    pub fetch: FetchConfig,
    /// Show per-model rows in the usage report.
    pub show_model_breakdown: bool,
    /// Compact usage report.
    pub compact_mode: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            anthropic: AnthropicConfig::default(),
            oauth: OAuthConfig::default(),
            display: DisplayConfig::default(),
            widget: WidgetConfig::default(),
            providers: Vec::new(),
            fetch: FetchConfig::default(),
            show_model_breakdown: true,
            compact_mode: false,
        }
    }
}

impl ResolvedConfig {
    /// Returns the refresh interval as a duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.display.refresh_interval)
    }

    /// Returns the per-fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Returns the explicit settings for `kind`, if any.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderSourceConfig> {
        self.providers.iter().find(|p| p.kind == kind)
    }

    /// Returns a copy with every secret masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.anthropic.admin_api_key = copy.anthropic.admin_api_key.as_deref().map(mask_secret);
        for provider in &mut copy.providers {
            provider.credentials.api_key = provider.credentials.api_key.as_deref().map(mask_secret);
        }
        copy
    }
}

/// Masks a secret, keeping only a short prefix.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(10).collect();
    if secret.chars().count() > 10 {
        format!("{prefix}...")
    } else {
        "***".to_string()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Result of [`load_config`].
#[derive(Debug, Clone)]
pub struct LoadConfigResult {
    /// The resolved configuration.
    pub config: ResolvedConfig,
    /// Where it came from.
    pub source: ConfigSource,
    /// File path when `source` is [`ConfigSource::File`].
    pub path: Option<PathBuf>,
    /// Problems encountered while resolving.
    pub warnings: Vec<String>,
}

/// Loads configuration using the process environment and default search paths.
pub fn load_config(custom_path: Option<&Path>) -> LoadConfigResult {
    load_config_with(custom_path, &config_search_paths(), |name| {
        std::env::var(name).ok()
    })
}

/// Loads configuration with explicit search paths and environment lookup.
pub fn load_config_with<F>(
    custom_path: Option<&Path>,
    search_paths: &[PathBuf],
    env: F,
) -> LoadConfigResult
where
    F: Fn(&str) -> Option<String>,
{
    let mut warnings = Vec::new();

    if let Some(path) = custom_path {
        if let Some(result) = load_file(path, &env) {
            return result;
        }
        warn!(path = %path.display(), "Config file not found");
        warnings.push(format!("Config file not found: {}", path.display()));
    }

    for path in search_paths {
        if let Some(result) = load_file(path, &env) {
            return result;
        }
    }

    if let Some(config) = load_from_env(&env, &mut warnings) {
        info!("Loaded configuration from environment");
        return LoadConfigResult {
            config,
            source: ConfigSource::Env,
            path: None,
            warnings,
        };
    }

    debug!("Using default configuration");
    LoadConfigResult {
        config: ResolvedConfig::default(),
        source: ConfigSource::Default,
        path: None,
        warnings,
    }
}

/// Returns `None` when `path` does not exist.
fn load_file<F>(path: &Path, env: &F) -> Option<LoadConfigResult>
where
    F: Fn(&str) -> Option<String>,
{
    if !path.is_file() {
        return None;
    }

    let mut warnings = Vec::new();
    let config = match parse_file(path) {
        Ok(value) => {
            let value = interpolate_env(value, env);
            resolve(&value, &mut warnings)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read config file");
            warnings.push(format!("{}: {e}", path.display()));
            ResolvedConfig::default()
        }
    };

    info!(path = %path.display(), warnings = warnings.len(), "Loaded configuration");
    Some(LoadConfigResult {
        config,
        source: ConfigSource::File,
        path: Some(path.to_path_buf()),
        warnings,
    })
}

fn parse_file(path: &Path) -> Result<Value, StoreError> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    Ok(serde_yaml::from_str(&content)?)
}

fn load_from_env<F>(env: &F, warnings: &mut Vec<String>) -> Option<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let admin_key = env(ENV_ADMIN_API_KEY).filter(|v| !v.trim().is_empty());
    let interval = env(ENV_REFRESH_INTERVAL).filter(|v| !v.trim().is_empty());
    if admin_key.is_none() && interval.is_none() {
        return None;
    }

    let mut config = ResolvedConfig::default();
    if let Some(key) = admin_key {
        config.anthropic.admin_api_key = Some(key);
        config.anthropic.enabled = true;
    }
    if let Some(raw) = interval {
        match raw.trim().parse::<u64>() {
            Ok(secs) if in_range(secs, REFRESH_INTERVAL_RANGE) => {
                config.display.refresh_interval = secs;
            }
            _ => warnings.push(format!(
                "{ENV_REFRESH_INTERVAL}: must be an integer between {} and {} (got {raw})",
                REFRESH_INTERVAL_RANGE.0, REFRESH_INTERVAL_RANGE.1
            )),
        }
    }
    Some(config)
}

/// Replaces `${VAR}` string scalars with the variable's value; unset
/// variables make the field absent.
fn interpolate_env<F>(value: Value, env: &F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => match s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
            Some(var) => env(var.trim()).map_or(Value::Null, Value::String),
            None => Value::String(s),
        },
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, interpolate_env(v, env)))
                .collect(),
        ),
        Value::Sequence(seq) => {
            Value::Sequence(seq.into_iter().map(|v| interpolate_env(v, env)).collect())
        }
        other => other,
    }
}

// ============================================================================
// Field Resolution
// ============================================================================

/// Reads fields out of one YAML mapping, accepting snake_case and camelCase
/// keys and recording a warning for each invalid value.
struct Section<'a> {
    name: &'a str,
    map: Option<&'a Mapping>,
}

impl<'a> Section<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        let map = self.map?;
        let camel = snake_to_camel(key);
        map.get(key)
            .or_else(|| map.get(camel.as_str()))
            .filter(|v| !v.is_null())
    }

    fn child(&self, key: &'a str, warnings: &mut Vec<String>) -> Section<'a> {
        let map = match self.get(key) {
            Some(Value::Mapping(m)) => Some(m),
            Some(_) => {
                warnings.push(format!("{key}: expected a mapping"));
                None
            }
            None => None,
        };
        Section { name: key, map }
    }

    fn path(&self, key: &str) -> String {
        if self.name.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.name)
        }
    }

    fn string(&self, key: &str, warnings: &mut Vec<String>) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                warnings.push(format!("{}: expected a string", self.path(key)));
                None
            }
        }
    }

    fn bool(&self, key: &str, default: bool, warnings: &mut Vec<String>) -> bool {
        match self.get(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s == "true" || s == "false" => s == "true",
            Some(_) => {
                warnings.push(format!("{}: expected a boolean", self.path(key)));
                default
            }
        }
    }

    fn int_in_range(
        &self,
        key: &str,
        range: (u64, u64),
        default: u64,
        warnings: &mut Vec<String>,
    ) -> u64 {
        let Some(value) = self.get(key) else {
            return default;
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if in_range(n, range) => n,
            _ => {
                warnings.push(format!(
                    "{}: must be an integer between {} and {} (got {})",
                    self.path(key),
                    range.0,
                    range.1,
                    describe(value)
                ));
                default
            }
        }
    }

    fn parsed<T: FromStr<Err = String>>(
        &self,
        key: &str,
        default: T,
        warnings: &mut Vec<String>,
    ) -> T {
        let Some(value) = self.get(key) else {
            return default;
        };
        let Value::String(s) = value else {
            warnings.push(format!("{}: expected a string", self.path(key)));
            return default;
        };
        s.parse().unwrap_or_else(|e| {
            warnings.push(format!("{}: {e} (got {s})", self.path(key)));
            default
        })
    }
}

fn resolve(root: &Value, warnings: &mut Vec<String>) -> ResolvedConfig {
    let root = Section {
        name: "",
        map: match root {
            Value::Mapping(m) => Some(m),
            _ => {
                warnings.push("config root must be a mapping".to_string());
                None
            }
        },
    };
    let defaults = ResolvedConfig::default();

    let anthropic = root.child("anthropic", warnings);
    let oauth = root.child("oauth", warnings);
    let display = root.child("display", warnings);
    let widget = root.child("widget", warnings);
    let fetch = root.child("fetch", warnings);

    ResolvedConfig {
        anthropic: AnthropicConfig {
            admin_api_key: anthropic
                .string("admin_api_key", warnings)
                .filter(|k| !k.trim().is_empty()),
            enabled: anthropic.bool("enabled", defaults.anthropic.enabled, warnings),
        },
        oauth: OAuthConfig {
            enabled: oauth.bool("enabled", defaults.oauth.enabled, warnings),
            show_profile: oauth.bool("show_profile", defaults.oauth.show_profile, warnings),
        },
        display: DisplayConfig {
            refresh_interval: display.int_in_range(
                "refresh_interval",
                REFRESH_INTERVAL_RANGE,
                defaults.display.refresh_interval,
                warnings,
            ),
            show_api_usage: display.bool(
                "show_api_usage",
                defaults.display.show_api_usage,
                warnings,
            ),
            show_rate_limits: display.bool(
                "show_rate_limits",
                defaults.display.show_rate_limits,
                warnings,
            ),
            currency: display.parsed("currency", defaults.display.currency, warnings),
        },
        widget: WidgetConfig {
            width: usize::try_from(widget.int_in_range(
                "width",
                WIDGET_WIDTH_RANGE,
                defaults.widget.width as u64,
                warnings,
            ))
            .unwrap_or(defaults.widget.width),
            style: widget.parsed("style", defaults.widget.style, warnings),
            position: widget.parsed("position", defaults.widget.position, warnings),
            colors: widget.bool("colors", defaults.widget.colors, warnings),
        },
        providers: resolve_providers(&root, warnings),
        fetch: FetchConfig {
            timeout_secs: fetch.int_in_range(
                "timeout_secs",
                TIMEOUT_RANGE,
                defaults.fetch.timeout_secs,
                warnings,
            ),
        },
        show_model_breakdown: root.bool(
            "show_model_breakdown",
            defaults.show_model_breakdown,
            warnings,
        ),
        compact_mode: root.bool("compact_mode", defaults.compact_mode, warnings),
    }
}

fn resolve_providers(root: &Section<'_>, warnings: &mut Vec<String>) -> Vec<ProviderSourceConfig> {
    let providers = root.child("providers", warnings);
    if let Some(map) = providers.map {
        for key in map.keys() {
            let known = key
                .as_str()
                .is_some_and(|k| k.parse::<ProviderKind>().is_ok());
            if !known {
                warnings.push(format!("providers: unknown provider {}", describe(key)));
            }
        }
    }

    ProviderKind::all()
        .iter()
        .filter_map(|&kind| {
            let name = kind.cli_name();
            providers.get(name)?;
            let block = Section {
                name,
                map: providers.child(name, warnings).map,
            };
            Some(ProviderSourceConfig {
                kind,
                enabled: block.bool("enabled", true, warnings),
                credentials: ProviderCredentials {
                    api_key: block.string("api_key", warnings),
                    organization_id: block.string("organization_id", warnings),
                    project_id: block.string("project_id", warnings),
                },
            })
        })
        .collect()
}

fn in_range(n: u64, (min, max): (u64, u64)) -> bool {
    (min..=max).contains(&n)
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => "a collection".to_string(),
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_when_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_with(None, &[dir.path().join("missing.yaml")], no_env);
        assert_eq!(result.source, ConfigSource::Default);
        assert!(result.warnings.is_empty());
        assert_eq!(result.config.display.refresh_interval, 30);
        assert_eq!(result.config.widget.width, 42);
        assert!(result.config.show_model_breakdown);
        assert!(!result.config.compact_mode);
    }

    #[test]
    fn test_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.yaml",
            r"
anthropic:
  admin_api_key: sk-ant-admin01-xyz
  enabled: true
oauth:
  showProfile: false
display:
  refresh_interval: 60
  currency: EUR
widget:
  width: 50
  style: double
  position: right
  colors: false
providers:
  openai:
    api_key: sk-openai
    organization_id: org-1
  google:
    enabled: false
fetch:
  timeout_secs: 10
compact_mode: true
",
        );

        let result = load_config_with(Some(&path), &[], no_env);
        assert_eq!(result.source, ConfigSource::File);
        assert_eq!(result.path.as_deref(), Some(path.as_path()));
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);

        let config = result.config;
        assert_eq!(config.anthropic.admin_api_key.as_deref(), Some("sk-ant-admin01-xyz"));
        assert!(!config.oauth.show_profile);
        assert_eq!(config.display.refresh_interval, 60);
        assert_eq!(config.display.currency, Currency::Eur);
        assert_eq!(config.widget.style, WidgetStyle::Double);
        assert_eq!(config.widget.position, Position::Right);
        assert!(!config.widget.colors);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert!(config.compact_mode);

        assert_eq!(config.providers.len(), 2);
        let openai = config.provider(ProviderKind::OpenAI).unwrap();
        assert!(openai.enabled);
        assert_eq!(openai.credentials.organization_id.as_deref(), Some("org-1"));
        assert!(!config.provider(ProviderKind::Google).unwrap().enabled);
        assert!(config.provider(ProviderKind::Anthropic).is_none());
    }

    #[test]
    fn test_invalid_fields_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.yaml",
            "display:\n  refresh_interval: 5\n  currency: BTC\nwidget:\n  width: 42\n  style: fancy\n",
        );

        let result = load_config_with(Some(&path), &[], no_env);
        assert_eq!(result.config.display.refresh_interval, 30);
        assert_eq!(result.config.display.currency, Currency::Usd);
        assert_eq!(result.config.widget.style, WidgetStyle::Rounded);
        assert_eq!(result.warnings.len(), 3);
        assert!(result.warnings[0].starts_with("display.refresh_interval"));
    }

    #[test]
    fn test_env_interpolation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.yaml",
            "anthropic:\n  admin_api_key: ${ADMIN_KEY}\ndisplay:\n  refresh_interval: ${INTERVAL}\n",
        );
        let env: HashMap<&str, &str> = [("ADMIN_KEY", "sk-ant-admin01-env")].into_iter().collect();

        let result = load_config_with(Some(&path), &[], |name| {
            env.get(name).map(|v| (*v).to_string())
        });
        assert_eq!(
            result.config.anthropic.admin_api_key.as_deref(),
            Some("sk-ant-admin01-env")
        );
        // Unset variable leaves the field absent.
        assert_eq!(result.config.display.refresh_interval, 30);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_custom_path_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let found = write(dir.path(), ".usagemon.yaml", "compact_mode: true\n");
        let missing = dir.path().join("nope.yaml");

        let result = load_config_with(Some(&missing), &[found.clone()], no_env);
        assert_eq!(result.source, ConfigSource::File);
        assert_eq!(result.path, Some(found));
        assert!(result.config.compact_mode);
    }

    #[test]
    fn test_missing_custom_path_warns() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let result = load_config_with(Some(&missing), &[], no_env);
        assert_eq!(result.source, ConfigSource::Default);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Config file not found"));
    }

    #[test]
    fn test_env_source() {
        let env: HashMap<&str, &str> = [
            (ENV_ADMIN_API_KEY, "sk-ant-admin01-env"),
            (ENV_REFRESH_INTERVAL, "120"),
        ]
        .into_iter()
        .collect();
        let result = load_config_with(None, &[], |name| env.get(name).map(|v| (*v).to_string()));
        assert_eq!(result.source, ConfigSource::Env);
        assert_eq!(result.config.display.refresh_interval, 120);
        assert!(result.config.anthropic.admin_api_key.is_some());
    }

    #[test]
    fn test_env_interval_out_of_range() {
        let result = load_config_with(None, &[], |name| {
            (name == ENV_REFRESH_INTERVAL).then(|| "3".to_string())
        });
        assert_eq!(result.source, ConfigSource::Env);
        assert_eq!(result.config.display.refresh_interval, 30);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_bad_yaml_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.yaml", "display: [unclosed\n");
        let result = load_config_with(Some(&path), &[], no_env);
        assert_eq!(result.source, ConfigSource::File);
        assert_eq!(result.config, ResolvedConfig::default());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_redacted() {
        let mut config = ResolvedConfig::default();
        config.anthropic.admin_api_key = Some("sk-ant-REDACTED".into());
        config.providers.push(ProviderSourceConfig {
            kind: ProviderKind::OpenRouter,
            enabled: true,
            credentials: ProviderCredentials::with_api_key("short"),
        });

        let redacted = config.redacted();
        assert_eq!(redacted.anthropic.admin_api_key.as_deref(), Some("sk-ant-adm..."));
        assert_eq!(redacted.providers[0].credentials.api_key.as_deref(), Some("***"));
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(Currency::from_code("krw").symbol(), "₩");
        assert_eq!(Currency::from_code("xyz"), Currency::Usd);
        assert_eq!(Currency::Gbp.code(), "GBP");
    }
}
