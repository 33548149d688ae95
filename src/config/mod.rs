#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{DashError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

pub const DEFAULT_API_URL: &str = "https://api.eflow.team/v1";
pub const DEFAULT_TIMEZONE_ID: i64 = 67;
pub const DEFAULT_CURRENCY_ID: &str = "USD";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_PORT: u16 = 8000;

/// 程式啟動時建立一次，之後以參考或 `Arc` 傳遞
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub everflow: EverflowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EverflowConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timezone_id: i64,
    pub currency_id: String,
    pub timeout_seconds: u64,
}

impl Default for EverflowConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timezone_id: DEFAULT_TIMEZONE_ID,
            currency_id: DEFAULT_CURRENCY_ID.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl EverflowConfig {
    /// 去掉結尾 `/` 的 API base URL
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// 空白或尚未替換的 `${...}` 視為沒有設定
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }

    pub fn masked_api_key(&self) -> String {
        match self.api_key() {
            Some(key) => format!("{}...", key.chars().take(4).collect::<String>()),
            None => "NULL".to_string(),
        }
    }

    /// 除錯端點用的設定快照，不含完整 API key
    pub fn snapshot(&self) -> Value {
        json!({
            "api_url": self.base_url(),
            "api_key": self.masked_api_key(),
            "api_key_empty": self.api_key().is_none(),
            "timezone_id": self.timezone_id,
            "currency_id": self.currency_id,
            "timeout_seconds": self.timeout_seconds,
        })
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DashError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DashError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EVERFLOW_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DashError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 有設定檔就讀檔，再套用環境變數覆寫
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 以 `lookup` 取得 EVERFLOW_* / PORT 覆寫值
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = lookup("EVERFLOW_API_URL") {
            self.everflow.api_url = api_url;
        }
        if let Some(api_key) = lookup("EVERFLOW_API_KEY") {
            self.everflow.api_key = Some(api_key);
        }
        if let Some(timezone_id) = lookup("EVERFLOW_TIMEZONE_ID") {
            self.everflow.timezone_id = parse_override("EVERFLOW_TIMEZONE_ID", &timezone_id)?;
        }
        if let Some(currency_id) = lookup("EVERFLOW_CURRENCY_ID") {
            self.everflow.currency_id = currency_id;
        }
        if let Some(timeout) = lookup("EVERFLOW_TIMEOUT") {
            self.everflow.timeout_seconds = parse_override("EVERFLOW_TIMEOUT", &timeout)?;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_override("PORT", &port)?;
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| DashError::InvalidConfigValue {
            field: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("everflow.api_url", &self.everflow.api_url)?;
        validate_non_empty_string("everflow.currency_id", &self.everflow.currency_id)?;
        validate_range("everflow.timeout_seconds", self.everflow.timeout_seconds, 1, 300)?;
        validate_non_empty_string("server.host", &self.server.host)?;

        if self.everflow.api_key().is_none() {
            // 伺服器仍可啟動，請求時才回報缺少 API key
            tracing::warn!("⚠️ EVERFLOW_API_KEY is not set; Everflow calls will fail");
        }

        Ok(())
    }
}
