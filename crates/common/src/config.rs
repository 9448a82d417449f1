use serde::{Deserialize, Serialize};

/// Bounded planning budget: a run either converges within this many
/// orchestration steps or terminates with the exhaustion fallback.
pub const MAX_PLAN_STEPS: usize = 5;

/// Output length ceiling handed to the inference service on every call.
pub const MAX_OUTPUT_TOKENS: u32 = 10_000;

/// Message-boundary marker appended after every streamed reply, success or
/// faulted, so the client knows the stream has ended.
pub const END_OF_MESSAGE_ACK: &str = "ack-end-of-msg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub upload_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the managed inference endpoint.
    pub endpoint: String,
    /// Environment variable holding the API credential.
    pub api_key_env: String,
    /// Default model used when the client does not name one.
    pub default_model_id: String,
}

/// Registry override for a single agent. Entries here replace or extend the
/// built-in agent table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub system_prompt: String,
    #[serde(default)]
    pub output_tag: Option<String>,
    #[serde(default)]
    pub output_tag_list: Option<Vec<String>>,
}

impl SystemConfig {
    pub fn load(path: &str) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SystemConfig = toml::from_str(&content)
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))?;
        Ok(config)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "127.0.0.1:8080".to_string(),
                upload_dir: "./uploads".to_string(),
            },
            model: ModelConfig {
                endpoint: "http://localhost:11434".to_string(),
                api_key_env: "MODEL_API_KEY".to_string(),
                default_model_id: "anthropic.claude-3-sonnet-20240229-v1:0".to_string(),
            },
            agents: Vec::new(),
        }
    }
}
