use crate::error::{Result, ShimError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_UPSTREAM_URL: &str = "https://chatjimmy.ai/api/chat";
pub const DEFAULT_MODEL: &str = "llama3.1-8B";
pub const DEFAULT_TOP_K: i64 = 8;
pub const MODEL_OWNER: &str = "chatjimmy";

pub const ENV_ALLOWED_ORIGIN: &str = "ALLOWED_ORIGIN";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_UPSTREAM_URL: &str = "CHATJIMMY_URL";
pub const ENV_MODEL: &str = "CHATJIMMY_MODEL";
pub const ENV_MODELS: &str = "CHATJIMMY_MODELS";
pub const ENV_TOP_K: &str = "CHATJIMMY_TOP_K";

/// Settings for a single invocation. Built fresh per request and passed down
/// by reference; nothing here is shared or mutated across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
    pub allowed_origin: String,
    /// Expected bearer token, already trimmed. Empty means auth is off.
    pub api_key: String,
    pub upstream_url: String,
    pub default_model: String,
    pub models: Vec<String>,
    /// Unparsed; it only takes part in the topK precedence chain.
    pub default_top_k: Option<String>,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self::resolve(&FileConfig::default(), |_| None)
    }
}

impl ShimConfig {
    /// Resolve settings from `lookup` (usually the environment), then the
    /// file layer, then built-in defaults.
    pub fn resolve<F>(file: &FileConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |key: &str, fallback: Option<String>| lookup(key).or(fallback);

        let allowed_origin = setting(ENV_ALLOWED_ORIGIN, file.allowed_origin.clone())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "*".to_string());

        let api_key = setting(ENV_API_KEY, file.api_key.clone())
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        let upstream_url = non_blank(setting(ENV_UPSTREAM_URL, file.upstream.url.clone()))
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());

        let default_model = non_blank(setting(ENV_MODEL, file.upstream.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let file_models = (!file.upstream.models.is_empty()).then(|| file.upstream.models.join(","));
        let models = setting(ENV_MODELS, file_models)
            .map(|raw| parse_model_list(&raw))
            .unwrap_or_default();

        let default_top_k = setting(ENV_TOP_K, file.upstream.top_k.map(|k| k.to_string()));

        Self {
            allowed_origin,
            api_key,
            upstream_url,
            default_model,
            models,
            default_top_k,
        }
    }

    /// Resolve against the process environment with no file layer.
    pub fn from_env() -> Self {
        Self::resolve(&FileConfig::default(), env_lookup)
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Reads a variable from the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated model list, dropping blank entries.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Optional TOML layer underneath the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allowed_origin: None,
            api_key: None,
            upstream: UpstreamConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    8787
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShimError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load an explicit file, or the first one found in the standard
    /// locations. Having no file at all is fine: the environment alone is
    /// enough to run.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(&candidate);
            }
        }

        tracing::debug!("No config file found, using environment only");
        Ok(Self::default())
    }
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("chatjimmy-shim.toml")];

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("chatjimmy-shim").join("config.toml"));
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(".config").join("chatjimmy-shim").join("config.toml"));
        paths.push(home.join(".chatjimmy-shim.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_any_source() {
        let config = ShimConfig::resolve(&FileConfig::default(), |_| None);
        assert_eq!(config.allowed_origin, "*");
        assert_eq!(config.api_key, "");
        assert!(!config.auth_enabled());
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert!(config.models.is_empty());
        assert_eq!(config.default_top_k, None);
    }

    #[test]
    fn test_env_values_are_trimmed_and_blank_falls_back() {
        let config = ShimConfig::resolve(
            &FileConfig::default(),
            lookup_from(&[
                (ENV_API_KEY, "  secret \n"),
                (ENV_MODEL, "   "),
                (ENV_UPSTREAM_URL, ""),
                (ENV_ALLOWED_ORIGIN, ""),
                (ENV_MODELS, " a, ,b ,, "),
                (ENV_TOP_K, "12"),
            ]),
        );
        assert_eq!(config.api_key, "secret");
        assert!(config.auth_enabled());
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.allowed_origin, "*");
        assert_eq!(config.models, vec!["a", "b"]);
        assert_eq!(config.default_top_k.as_deref(), Some("12"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
port = 9000
allowed_origin = "https://file.example"
api_key = "from-file"

[upstream]
url = "https://upstream.example/api/chat"
model = "file-model"
models = ["file-model", "other"]
top_k = 4
"#
        )
        .unwrap();

        let file = FileConfig::load(f.path()).unwrap();
        assert_eq!(file.port, 9000);

        let config = ShimConfig::resolve(&file, lookup_from(&[(ENV_MODEL, "env-model")]));
        assert_eq!(config.allowed_origin, "https://file.example");
        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.upstream_url, "https://upstream.example/api/chat");
        assert_eq!(config.default_model, "env-model");
        assert_eq!(config.models, vec!["file-model", "other"]);
        assert_eq!(config.default_top_k.as_deref(), Some("4"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let f = NamedTempFile::new().unwrap();
        let file = FileConfig::load(f.path()).unwrap();
        assert_eq!(file.port, 8787);
        assert!(file.upstream.models.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = FileConfig::find_and_load(Some(Path::new("/nonexistent/shim.toml")))
            .unwrap_err();
        assert!(matches!(err, ShimError::Config { .. }));
    }

    #[test]
    fn test_parse_model_list() {
        assert_eq!(parse_model_list("x"), vec!["x"]);
        assert!(parse_model_list(" , ,").is_empty());
    }
}
