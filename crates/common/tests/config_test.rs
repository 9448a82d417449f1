use llm_relay_common::config::SystemConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_load_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");

    let config_content = r#"
[server]
listen_addr = "0.0.0.0:9000"
upload_dir = "/tmp/uploads"

[model]
endpoint = "https://bedrock-runtime.us-east-1.amazonaws.com"
api_key_env = "MODEL_API_KEY"
default_model_id = "anthropic.claude-3-sonnet-20240229-v1:0"

[[agents]]
name = "math"
system_prompt = "You solve math problems step by step."

[[agents]]
name = "router"
system_prompt = "Pick the agent best suited for the request."
output_tag = "agent_name"
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = SystemConfig::load(config_path.to_str().unwrap()).unwrap();
    assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
    assert_eq!(config.model.default_model_id, "anthropic.claude-3-sonnet-20240229-v1:0");
    assert_eq!(config.agents.len(), 2);
    assert_eq!(config.agents[1].output_tag.as_deref(), Some("agent_name"));
    assert!(config.agents[0].output_tag.is_none());
}

#[test]
fn test_config_load_missing_file_fails() {
    assert!(SystemConfig::load("/nonexistent/config.toml").is_err());
}

#[test]
fn test_config_agents_default_empty() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("minimal.toml");
    fs::write(
        &config_path,
        r#"
[server]
listen_addr = "127.0.0.1:8080"
upload_dir = "./uploads"

[model]
endpoint = "http://localhost:11434"
api_key_env = "MODEL_API_KEY"
default_model_id = "test-model"
"#,
    )
    .unwrap();

    let config = SystemConfig::load(config_path.to_str().unwrap()).unwrap();
    assert!(config.agents.is_empty());
}
