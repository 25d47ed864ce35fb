use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Args;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";

pub fn default_max_rounds() -> u32 {
    8
}

pub fn default_tool_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiSection {
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelSection {
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsSection {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JsonConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

impl JsonConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("paperchat").join("config.json"))
    }

    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: JsonConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

pub struct Config {
    pub api_key: String,
    pub api_endpoint: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub server_command: String,
    pub server_args: Vec<String>,
    pub max_rounds: u32,
    pub tool_timeout: u64,
    pub verbose: bool,
}

impl Config {
    /// Resolution order for every knob: CLI flag > environment variable
    /// > config file > default. The API key is env-only.
    pub fn from_env_and_args(args: &Args) -> Result<Self, String> {
        let json_config = JsonConfig::load().unwrap_or_default();

        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| "OPENAI_API_KEY environment variable not set")?;

        let api_endpoint = args
            .api_endpoint
            .clone()
            .or_else(|| env::var("AI_API_ENDPOINT").ok())
            .or(json_config.api.endpoint.clone())
            .map(|endpoint| normalize_endpoint(&endpoint))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let model = args
            .model
            .clone()
            .or_else(|| env::var("AI_MODEL").ok())
            .or(json_config.model.default_model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let system_prompt = env::var("AI_SYSTEM_PROMPT")
            .ok()
            .or(json_config.model.system_prompt.clone());

        let server_command = args
            .server_command
            .clone()
            .or(json_config.server.command.clone())
            .unwrap_or_else(|| "uv".to_string());

        let server_args = if !args.server_args.is_empty() {
            args.server_args.clone()
        } else {
            json_config
                .server
                .args
                .clone()
                .unwrap_or_else(|| vec!["run".to_string(), "server.py".to_string()])
        };

        let max_rounds = args
            .max_rounds
            .or_else(|| {
                env::var("AI_MAX_TOOL_ROUNDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(json_config.tools.max_rounds);

        let tool_timeout = args
            .tool_timeout
            .or_else(|| env::var("AI_TOOL_TIMEOUT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(json_config.tools.timeout_secs);

        let verbose = args.verbose || env::var("AI_VERBOSE").map(|v| v == "true").unwrap_or(false);

        Ok(Self {
            api_key,
            api_endpoint,
            model,
            system_prompt,
            server_command,
            server_args,
            max_rounds,
            tool_timeout,
            verbose,
        })
    }

    pub fn current_date() -> String {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    }
}

/// Accept base URLs with or without `/v1` and normalize them to a full
/// chat completions endpoint.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.ends_with("/chat/completions") {
        endpoint.to_string()
    } else if endpoint.ends_with("/v1") {
        format!("{}/chat/completions", endpoint)
    } else if endpoint.ends_with("/v1/") {
        format!("{}chat/completions", endpoint)
    } else {
        format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
    }
}
