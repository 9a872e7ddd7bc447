use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub drafts: DraftConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Knobs for the planning loop
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard cap on planning iterations per request
    pub max_steps: u32,

    /// Default per-step timeout in milliseconds, used when an agent does
    /// not declare its own
    pub step_timeout_ms: u64,

    /// How many times an unparsable planning response is retried before
    /// planning is reported unavailable
    pub planner_retries: u32,

    /// Conversation turns handed to the planner for context
    pub conversation_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            step_timeout_ms: 30_000,
            planner_retries: 2,
            conversation_window: 10,
        }
    }
}

/// LLM backend settings shared by the planner, reevaluator and composer
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Model used for planning and reevaluation
    pub model: String,

    /// Model used for response composition
    pub composer_model: String,

    /// OpenAI-compatible endpoint base URL
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            composer_model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Draft lifecycle settings
#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
    /// Minutes a pending draft stays resolvable
    pub ttl_minutes: i64,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self { ttl_minutes: 15 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
