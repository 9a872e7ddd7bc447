//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, DraftConfig, LlmConfig, LogFormat, LoggingConfig, OrchestratorConfig,
};
