//! Worker configuration

use crate::error::{Result, WorkerError};
use crate::executor::Provider;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Capability advertised when none are configured
pub const DEFAULT_CAPABILITY: &str = "general";

/// Worker configuration
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Orchestrator base URL
    pub orchestrator_url: String,

    /// Bearer token for the orchestrator
    pub orchestrator_api_key: String,

    /// Display name sent at registration
    pub worker_name: String,

    /// Capability tags sent at registration
    pub capabilities: Vec<String>,

    /// Fixed delay between poll cycles
    pub poll_interval: Duration,

    /// Per-request timeout for orchestrator calls
    pub request_timeout: Option<Duration>,

    /// Execution provider
    pub provider: Provider,

    /// Model identifier for subprocess providers
    pub llm_model: String,

    /// Executable override for subprocess providers
    pub llm_bin: String,

    /// Bound on a single execution (subprocess or remote agent)
    pub llm_timeout: Option<Duration>,

    /// Remote agent base URL
    pub openclaw_url: String,

    /// Remote agent bearer token (empty = no auth)
    pub openclaw_api_key: String,

    /// Mark claimed tasks `in_progress` before executing
    pub report_progress: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:3000".to_string(),
            orchestrator_api_key: "dev_key".to_string(),
            worker_name: "worker-1".to_string(),
            capabilities: vec![DEFAULT_CAPABILITY.to_string()],
            poll_interval: Duration::from_millis(5000),
            request_timeout: Some(Duration::from_secs(30)),
            provider: Provider::Echo,
            llm_model: String::new(),
            llm_bin: String::new(),
            llm_timeout: Some(Duration::from_secs(300)), // 5 minutes
            openclaw_url: "http://localhost:3001".to_string(),
            openclaw_api_key: String::new(),
            report_progress: false,
        }
    }
}

impl WorkerConfig {
    /// Create a new config builder
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    /// Continue building from this config (used for CLI overrides)
    pub fn into_builder(self) -> WorkerConfigBuilder {
        WorkerConfigBuilder { config: self }
    }

    /// Load config from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary key lookup
    ///
    /// Unset and empty keys keep their defaults, except the API keys, model
    /// and binary which are taken verbatim when set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = WorkerConfig::default();

        if let Some(url) = get("ORCH_URL") {
            config.orchestrator_url = url;
        }
        if let Some(key) = lookup("ORCH_API_KEY") {
            config.orchestrator_api_key = key;
        }
        if let Some(name) = get("WORKER_NAME") {
            config.worker_name = name;
        }
        if let Some(caps) = lookup("WORKER_CAPABILITIES") {
            config.capabilities = parse_capabilities(&caps);
        }
        if let Some(ms) = get("POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse_u64("POLL_INTERVAL_MS", &ms)?);
        }
        if let Some(ms) = get("ORCH_TIMEOUT_MS") {
            config.request_timeout = optional_millis(parse_u64("ORCH_TIMEOUT_MS", &ms)?);
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.provider = parse_provider(&provider);
        }
        if let Some(model) = lookup("LLM_MODEL") {
            config.llm_model = model;
        }
        if let Some(bin) = lookup("LLM_BIN") {
            config.llm_bin = bin;
        }
        if let Some(ms) = get("LLM_TIMEOUT_MS") {
            config.llm_timeout = optional_millis(parse_u64("LLM_TIMEOUT_MS", &ms)?);
        }
        if let Some(url) = get("OPENCLAW_URL") {
            config.openclaw_url = url;
        }
        if let Some(key) = lookup("OPENCLAW_API_KEY") {
            config.openclaw_api_key = key;
        }
        if let Some(flag) = get("REPORT_PROGRESS") {
            config.report_progress = parse_bool("REPORT_PROGRESS", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check URLs are usable
    pub fn validate(&self) -> Result<()> {
        validate_url("ORCH_URL", &self.orchestrator_url)?;
        if self.provider == Provider::RemoteAgent {
            validate_url("OPENCLAW_URL", &self.openclaw_url)?;
        }
        if self.worker_name.trim().is_empty() {
            return Err(WorkerError::ConfigError("WORKER_NAME must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_capabilities(raw: &str) -> Vec<String> {
    let caps: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if caps.is_empty() {
        vec![DEFAULT_CAPABILITY.to_string()]
    } else {
        caps
    }
}

/// Unknown provider names run in echo mode rather than stopping the worker
fn parse_provider(value: &str) -> Provider {
    value.parse().unwrap_or_else(|_| {
        warn!("Unknown LLM_PROVIDER '{}', falling back to echo", value.trim());
        Provider::Echo
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| WorkerError::ConfigError(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WorkerError::ConfigError(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

/// `0` means "no limit"
fn optional_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| WorkerError::ConfigError(format!("{} '{}' is not a valid URL: {}", key, value, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(WorkerError::ConfigError(format!(
            "{} must use http or https, got '{}'",
            key,
            url.scheme()
        )));
    }
    Ok(())
}

/// Builder for WorkerConfig
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set orchestrator URL
    pub fn orchestrator_url(mut self, url: &str) -> Self {
        self.config.orchestrator_url = url.to_string();
        self
    }

    /// Set orchestrator API key
    pub fn api_key(mut self, key: &str) -> Self {
        self.config.orchestrator_api_key = key.to_string();
        self
    }

    pub fn worker_name(mut self, name: &str) -> Self {
        self.config.worker_name = name.to_string();
        self
    }

    pub fn capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    /// Set poll interval
    pub fn poll_interval(mut self, duration: Duration) -> Self {
        self.config.poll_interval = duration;
        self
    }

    /// Set poll interval in milliseconds
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval = Duration::from_millis(ms);
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set execution provider
    pub fn provider(mut self, provider: Provider) -> Self {
        self.config.provider = provider;
        self
    }

    pub fn llm_model(mut self, model: &str) -> Self {
        self.config.llm_model = model.to_string();
        self
    }

    pub fn llm_bin(mut self, bin: &str) -> Self {
        self.config.llm_bin = bin.to_string();
        self
    }

    pub fn llm_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.llm_timeout = timeout;
        self
    }

    pub fn openclaw_url(mut self, url: &str) -> Self {
        self.config.openclaw_url = url.to_string();
        self
    }

    pub fn openclaw_api_key(mut self, key: &str) -> Self {
        self.config.openclaw_api_key = key.to_string();
        self
    }

    /// Enable/disable `in_progress` status reports
    pub fn report_progress(mut self, enable: bool) -> Self {
        self.config.report_progress = enable;
        self
    }

    /// Build the config
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}

impl Default for WorkerConfigBuilder {
    fn default() -> Self {
        Self {
            config: WorkerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<WorkerConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.orchestrator_url, "http://localhost:3000");
        assert_eq!(config.orchestrator_api_key, "dev_key");
        assert_eq!(config.worker_name, "worker-1");
        assert_eq!(config.capabilities, vec!["general"]);
        assert_eq!(config.poll_interval, Duration::from_millis(5000));
        assert_eq!(config.provider, Provider::Echo);
        assert_eq!(config.openclaw_url, "http://localhost:3001");
        assert!(!config.report_progress);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ORCH_URL", "https://orch.internal:8443"),
            ("ORCH_API_KEY", "s3cret"),
            ("WORKER_NAME", "gpu-box"),
            ("WORKER_CAPABILITIES", "code, ,review"),
            ("POLL_INTERVAL_MS", "250"),
            ("LLM_PROVIDER", "ollama"),
            ("LLM_MODEL", "llama3"),
            ("LLM_BIN", "/usr/local/bin/ollama"),
            ("LLM_TIMEOUT_MS", "0"),
            ("REPORT_PROGRESS", "yes"),
        ])
        .unwrap();

        assert_eq!(config.orchestrator_api_key, "s3cret");
        assert_eq!(config.worker_name, "gpu-box");
        assert_eq!(config.capabilities, vec!["code", "review"]);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.provider, Provider::Ollama);
        assert_eq!(config.llm_bin, "/usr/local/bin/ollama");
        assert_eq!(config.llm_timeout, None);
        assert!(config.report_progress);
    }

    #[test]
    fn test_blank_capabilities_fall_back() {
        let config = load(&[("WORKER_CAPABILITIES", " , ")]).unwrap();
        assert_eq!(config.capabilities, vec![DEFAULT_CAPABILITY]);
    }

    #[test]
    fn test_bad_poll_interval() {
        let err = load(&[("POLL_INTERVAL_MS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_MS"));
    }

    #[test]
    fn test_bad_url() {
        assert!(load(&[("ORCH_URL", "not a url")]).is_err());
        assert!(load(&[("ORCH_URL", "ftp://example.com")]).is_err());
    }

    #[test]
    fn test_unknown_provider_falls_back_to_echo() {
        let config = load(&[("LLM_PROVIDER", "autogen")]).unwrap();
        assert_eq!(config.provider, Provider::Echo);

        // Never needs the agent URL once it is echo
        let config = load(&[("LLM_PROVIDER", "gpt9"), ("OPENCLAW_URL", "not a url")]).unwrap();
        assert_eq!(config.provider, Provider::Echo);
    }

    #[test]
    fn test_provider_override_revalidates() {
        let config = load(&[("OPENCLAW_URL", "ftp://agent.local")]).unwrap();
        assert!(config.validate().is_ok());

        let overridden = config.into_builder().provider(Provider::RemoteAgent).build();
        let err = overridden.validate().unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(_)));
    }

    #[test]
    fn test_builder_overrides_loaded_config() {
        let config = load(&[("POLL_INTERVAL_MS", "100")])
            .unwrap()
            .into_builder()
            .poll_interval_ms(20)
            .provider(Provider::LlamaCpp)
            .build();

        assert_eq!(config.poll_interval, Duration::from_millis(20));
        assert_eq!(config.provider, Provider::LlamaCpp);
    }
}
