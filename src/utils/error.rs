use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Everflow request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Everflow returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("EVERFLOW_API_KEY is missing")]
    MissingApiKey,

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DashError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DashError::Http(_) | DashError::UpstreamStatus { .. } => ErrorCategory::Upstream,
            DashError::MissingApiKey
            | DashError::ConfigError { .. }
            | DashError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            DashError::Validation { .. } => ErrorCategory::Input,
            DashError::Csv(_) | DashError::Io(_) | DashError::Serialization(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DashError::Validation { .. } => ErrorSeverity::Low,
            DashError::Http(_) => ErrorSeverity::Medium,
            // 5xx 通常是暫時性的，其餘視為請求本身有問題
            DashError::UpstreamStatus { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            DashError::UpstreamStatus { .. } => ErrorSeverity::High,
            DashError::Csv(_) | DashError::Serialization(_) => ErrorSeverity::High,
            DashError::MissingApiKey
            | DashError::ConfigError { .. }
            | DashError::InvalidConfigValue { .. }
            | DashError::Io(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DashError::Http(e) if e.is_timeout() => "Everflow did not answer in time".to_string(),
            DashError::Http(_) => "Could not reach the Everflow API".to_string(),
            DashError::UpstreamStatus { status, .. } => {
                format!("Everflow rejected the request (HTTP {})", status)
            }
            DashError::MissingApiKey => {
                "No Everflow API key configured; add EVERFLOW_API_KEY to the environment"
                    .to_string()
            }
            DashError::Validation { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Upstream => match self {
                DashError::UpstreamStatus { status: 401, .. }
                | DashError::UpstreamStatus { status: 403, .. } => {
                    "Check that the Everflow API key is valid and has network access"
                }
                _ => "Check network connectivity and retry; raise `timeout_seconds` if Everflow is slow",
            },
            ErrorCategory::Configuration => {
                "Review the TOML config file and EVERFLOW_* environment variables"
            }
            ErrorCategory::Input => "Use YYYY-MM-DD dates with start_date <= end_date",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    /// 對外回應使用的 HTTP 狀態碼
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DashError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            DashError::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            DashError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("❌ {} (category: {:?})", self, self.category());
        } else {
            tracing::warn!("⚠️ {}", self);
        }

        let message = match &self {
            DashError::UpstreamStatus { body, .. } => body.clone(),
            other => other.user_friendly_message(),
        };

        let body = serde_json::json!({
            "error": true,
            "status": status.as_u16(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_maps_to_same_http_status() {
        let err = DashError::UpstreamStatus {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.category(), ErrorCategory::Upstream);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_invalid_upstream_status_falls_back_to_bad_gateway() {
        let err = DashError::UpstreamStatus {
            status: 1000,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_validation_is_unprocessable() {
        let err = DashError::Validation {
            message: "bad date".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.user_friendly_message(), "bad date");
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_missing_api_key_is_critical_config_error() {
        let err = DashError::MissingApiKey;
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
