use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MedgenConfig {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub ollama: OllamaSettings,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub lookup: LookupSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Display name of the person the assistant is helping
    #[serde(default = "default_user")]
    pub user: String,
    /// How many trailing messages feed the rolling context summary
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,
}

fn default_user() -> String {
    "patient".to_string()
}

fn default_context_turns() -> usize {
    6
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            user: default_user(),
            context_turns: default_context_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaSettings {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_ollama_max_tokens")]
    pub max_tokens: u32,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "gemma3:4b".to_string()
}

fn default_ollama_max_tokens() -> u32 {
    4096
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            max_tokens: default_ollama_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Whether routing asks the LLM (vs keyword heuristics only)
    #[serde(default = "default_use_llm")]
    pub use_llm: bool,
}

fn default_use_llm() -> bool {
    true
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            use_llm: default_use_llm(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LookupSettings {
    /// RapidAPI key for the product search endpoint; empty disables lookup
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_lookup_host")]
    pub host: String,
}

impl std::fmt::Debug for LookupSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupSettings")
            .field("api_key", &mask_secret(&self.api_key))
            .field("host", &self.host)
            .finish()
    }
}

fn default_lookup_host() -> String {
    medgen_core::lookup::DEFAULT_HOST.to_string()
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: default_lookup_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// How often reminder tasks compare the clock to their target
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    15
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Mask a secret string for safe display in Debug output / logs.
/// Shows first 3 and last 4 chars for keys longer than 7 chars, otherwise "***".
fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".medgen")
}

impl MedgenConfig {
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path
            .clone()
            .unwrap_or_else(|| config_dir().join("config.toml"));

        if !path.exists() {
            warn!(
                "No config found at {} - using defaults. Run `medgen init` to create one.",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;

        // Expand environment variables before parsing
        let expanded = expand_env_vars(&content);

        let config: Self = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;

        if !config.lookup.api_key.is_empty() && !content.contains("${") {
            warn!(
                "Lookup API key is hardcoded in the config file. For security, use an \
                 environment variable: api_key = \"${{RAPIDAPI_KEY}}\""
            );
        }

        Ok(config)
    }
}

/// Allowlist of environment variable names that may be expanded in config
/// files, so a modified config cannot read arbitrary env vars.
const ALLOWED_ENV_VARS: &[&str] = &["RAPIDAPI_KEY", "OLLAMA_BASE_URL", "HOME", "USER"];

fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        if let Some(start) = result[pos..].find("${") {
            let abs_start = pos + start;
            if let Some(end) = result[abs_start..].find('}') {
                let var_name = result[abs_start + 2..abs_start + end].to_string();

                // Only expand variables in the allowlist
                let value = if ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
                    std::env::var(&var_name).unwrap_or_default()
                } else {
                    warn!(
                        "Skipping expansion of unrecognized env var '{}' in config",
                        var_name
                    );
                    // Leave the ${VAR} unexpanded so it's obvious
                    pos = abs_start + end + 1;
                    continue;
                };

                let value_len = value.len();
                result = format!(
                    "{}{}{}",
                    &result[..abs_start],
                    value,
                    &result[abs_start + end + 1..]
                );
                pos = abs_start + value_len; // Skip past the expanded value
            } else {
                break;
            }
        } else {
            break;
        }
    }
    result
}
