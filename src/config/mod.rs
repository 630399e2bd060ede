/// Configuration system for Aura.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**, hardcoded in [`schema::AuraConfig::default()`]
/// 2. **User global config**, `~/.aura/config.toml`
/// 3. **Project local config**, `.aura.toml` in the current working directory
/// 4. **Environment variables**, `AURA_*` overrides (highest precedence)
///
/// Later layers override earlier ones. Missing sections in a TOML file fall
/// back to built-in defaults.
///
/// # Usage
///
/// ```rust,ignore
/// use aura::config;
///
/// let cfg = config::load();
/// if cfg.optimizer.enabled {
///     // ...
/// }
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::AuraConfig;

use crate::matching::MatchMode;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved Aura configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> AuraConfig {
    let mut config = AuraConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        merge_config(&mut config, &global);
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        merge_config(&mut config, &project);
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Malformed files are ignored so a typo never takes the assistant down.
fn load_toml_file(path: Option<PathBuf>) -> Option<AuraConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge a loaded config layer into the base config.
///
/// Each layer is deserialized with `serde(default)`, so unset keys already
/// carry the built-in defaults and the overlay can replace the base whole.
fn merge_config(base: &mut AuraConfig, overlay: &AuraConfig) {
    *base = overlay.clone();
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// The per-user state directory: `~/.aura`.
pub fn aura_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".aura"))
}

fn global_config_path() -> Option<PathBuf> {
    aura_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".aura.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~/` in a configured path.
pub fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `AURA_ENABLED`: master switch (`1`/`true`/`yes`/`on`)
/// - `AURA_OPTIMIZER`: call the optimization API
/// - `AURA_API_URL`: optimization API base URL
/// - `AURA_API_TIMEOUT_MS`: request timeout
/// - `AURA_API_TOKEN`: bearer token
/// - `AURA_MATCH_MODE`: `word` or `substring`
/// - `AURA_HISTORY_PATH`: chat history file
/// - `AURA_SPEECH_COMMAND`: speech-to-text command
/// - `AURA_LOGGING`: structured event log
fn apply_env_overrides(config: &mut AuraConfig) {
    if let Ok(val) = std::env::var("AURA_ENABLED") {
        config.general.enabled = is_truthy(&val);
    }

    if let Ok(val) = std::env::var("AURA_OPTIMIZER") {
        config.optimizer.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("AURA_API_URL")
        && !val.is_empty()
    {
        config.optimizer.api_url = val;
    }
    if let Ok(val) = std::env::var("AURA_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.optimizer.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("AURA_API_TOKEN")
        && !val.is_empty()
    {
        config.optimizer.auth_token = Some(val);
    }

    if let Ok(val) = std::env::var("AURA_MATCH_MODE")
        && let Some(mode) = parse_match_mode(&val)
    {
        config.nlp.match_mode = mode;
    }

    if let Ok(val) = std::env::var("AURA_HISTORY_PATH")
        && !val.is_empty()
    {
        config.chat.history_path = Some(val);
    }
    if let Ok(val) = std::env::var("AURA_SPEECH_COMMAND")
        && !val.is_empty()
    {
        config.input.speech_command = Some(val);
    }
    if let Ok(val) = std::env::var("AURA_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a match mode string.
fn parse_match_mode(val: &str) -> Option<MatchMode> {
    match val.to_ascii_lowercase().as_str() {
        "word" | "words" | "word-boundary" => Some(MatchMode::Word),
        "substring" | "contains" => Some(MatchMode::Substring),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.aura/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.aura/ directory")?;
    }

    fs::write(&path, AuraConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `optimizer.api_url`. If no global file exists
/// yet, the defaults are serialized first and then updated.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&AuraConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;

    set_toml_value(&mut value_table, key, value)?;

    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// Optional keys (e.g. `optimizer.auth_token`) are absent from a serialized
/// default config; a missing leaf in an existing section is inserted as a
/// string.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Table(_)) => {
            anyhow::bail!("'{key}' is a section, not a value")
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("YES"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn parse_match_mode_handles_variants() {
        assert_eq!(parse_match_mode("word"), Some(MatchMode::Word));
        assert_eq!(parse_match_mode("Word-Boundary"), Some(MatchMode::Word));
        assert_eq!(parse_match_mode("substring"), Some(MatchMode::Substring));
        assert_eq!(parse_match_mode("contains"), Some(MatchMode::Substring));
        assert_eq!(parse_match_mode("fuzzy"), None);
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/lib/aura/history.json"),
            PathBuf::from("/var/lib/aura/history.json")
        );
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[optimizer]
api_url = "http://localhost:8000"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "optimizer.api_url", "http://grid:9000").unwrap();
        assert_eq!(
            root["optimizer"]["api_url"].as_str(),
            Some("http://grid:9000")
        );
    }

    #[test]
    fn set_toml_value_updates_bool_and_integer() {
        let mut root: toml::Value = toml::from_str(
            r#"
[optimizer]
enabled = true
timeout_ms = 45000
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "optimizer.enabled", "off").unwrap();
        set_toml_value(&mut root, "optimizer.timeout_ms", "2000").unwrap();
        assert_eq!(root["optimizer"]["enabled"].as_bool(), Some(false));
        assert_eq!(root["optimizer"]["timeout_ms"].as_integer(), Some(2000));
    }

    #[test]
    fn set_toml_value_inserts_missing_optional_leaf() {
        let mut root: toml::Value = toml::from_str("[input]\n").unwrap();
        set_toml_value(&mut root, "input.speech_command", "listen").unwrap();
        assert_eq!(root["input"]["speech_command"].as_str(), Some("listen"));
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root: toml::Value = toml::from_str("[chat]\ncontext_limit = 50\n").unwrap();
        assert!(set_toml_value(&mut root, "chat.context_limit", "lots").is_err());
    }

    #[test]
    fn set_toml_value_rejects_invalid_key() {
        let mut root: toml::Value = toml::from_str("[chat]\ncontext_limit = 50\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "chat.", "value").is_err());
    }

    #[test]
    fn show_effective_config_round_trips() {
        let toml_str = show_effective_config().unwrap();
        let _: AuraConfig = toml::from_str(&toml_str).unwrap();
    }
}
