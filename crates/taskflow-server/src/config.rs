//! Server configuration from flags and environment

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use taskflow_core::{StatusWorkflow, WorkflowConfig};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Status transition table selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WorkflowMode {
    #[default]
    Flat,
    Linear,
}

impl From<WorkflowMode> for StatusWorkflow {
    fn from(mode: WorkflowMode) -> Self {
        match mode {
            WorkflowMode::Flat => StatusWorkflow::Flat,
            WorkflowMode::Linear => StatusWorkflow::Linear,
        }
    }
}

/// Taskflow server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "taskflow-server", version, about = "Taskflow task and notification server")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "TASKFLOW_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// HMAC secret for signing access tokens
    #[arg(long, env = "TASKFLOW_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token lifetime in days
    #[arg(long, env = "TASKFLOW_TOKEN_TTL_DAYS", default_value_t = 30)]
    pub token_ttl_days: i64,

    /// Password reset token lifetime in minutes
    #[arg(long, env = "TASKFLOW_RESET_TOKEN_TTL_MINUTES", default_value_t = 60)]
    pub reset_token_ttl_minutes: i64,

    /// Allowed CORS origin
    #[arg(long, env = "TASKFLOW_CORS_ORIGIN", default_value = "http://localhost:5173")]
    pub cors_origin: String,

    /// Log output format
    #[arg(long, env = "TASKFLOW_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Task status transition table
    #[arg(long, env = "TASKFLOW_STATUS_WORKFLOW", value_enum, default_value_t = WorkflowMode::Flat)]
    pub status_workflow: WorkflowMode,

    /// Maximum accepted request body size
    #[arg(long, env = "TASKFLOW_MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Configuration with defaults and the given secret
    #[must_use]
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            jwt_secret: secret.into(),
            token_ttl_days: 30,
            reset_token_ttl_minutes: 60,
            cors_origin: "http://localhost:5173".to_string(),
            log_format: LogFormat::Text,
            status_workflow: WorkflowMode::Flat,
            max_body_bytes: 1024 * 1024,
        }
    }

    /// Domain configuration derived from the flags
    #[must_use]
    pub fn workflow(&self) -> WorkflowConfig {
        WorkflowConfig::new().with_status_workflow(self.status_workflow.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "taskflow-server",
            "--jwt-secret",
            "s3cret",
            "--status-workflow",
            "linear",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.token_ttl_days, 30);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.workflow().status_workflow, StatusWorkflow::Linear);
    }
}
