use crate::core::orchestrator::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
use crate::core::retry::{RetryPolicy, DEFAULT_MAX_RETRIES};
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichConfig {
    pub orchestrator: Option<OrchestratorConfig>,
    pub retry: Option<RetryConfig>,
    pub services: Option<ServicesConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub base_delay_ms: Option<u64>,
    pub cap_delay_ms: Option<u64>,
    pub default_max_retries: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub dietary_preference: Option<DietaryServiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DietaryServiceConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub max_retries: u32,
    pub timeout_seconds: u64,
    pub bbox_epsilon: f64,
}

impl Default for DietaryServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_OVERPASS_ENDPOINT.to_string(),
            max_retries: 5,
            timeout_seconds: 30,
            bbox_epsilon: 0.00001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "compact" 或 "json"
    pub format: Option<String>,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        let defaults = RetryPolicy::default();
        Self {
            base_delay: config
                .base_delay_ms
                .map_or(defaults.base_delay, Duration::from_millis),
            cap_delay: config
                .cap_delay_ms
                .map_or(defaults.cap_delay, Duration::from_millis),
            default_max_retries: config.default_max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        }
    }
}

impl EnrichConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrichError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OVERPASS_ENDPOINT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EnrichError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn concurrency(&self) -> usize {
        self.orchestrator
            .as_ref()
            .and_then(|o| o.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn dietary_service(&self) -> DietaryServiceConfig {
        self.services
            .as_ref()
            .and_then(|s| s.dietary_preference.clone())
            .unwrap_or_default()
    }

    pub fn json_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range(
            "orchestrator.concurrency",
            self.concurrency(),
            1,
            MAX_CONCURRENCY,
        )?;

        let policy = self.retry_policy();
        if policy.base_delay.is_zero() {
            return Err(EnrichError::InvalidConfigValueError {
                field: "retry.base_delay_ms".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }
        if policy.base_delay > policy.cap_delay {
            return Err(EnrichError::InvalidConfigValueError {
                field: "retry.cap_delay_ms".to_string(),
                value: policy.cap_delay.as_millis().to_string(),
                reason: format!(
                    "Cap must not be below base delay ({} ms)",
                    policy.base_delay.as_millis()
                ),
            });
        }

        let dietary = self.dietary_service();
        if dietary.enabled {
            validation::validate_url("services.dietary_preference.endpoint", &dietary.endpoint)?;
            validation::validate_range(
                "services.dietary_preference.bbox_epsilon",
                dietary.bbox_epsilon,
                f64::MIN_POSITIVE,
                1.0,
            )?;
            validation::validate_positive_number(
                "services.dietary_preference.timeout_seconds",
                dietary.timeout_seconds as usize,
                1,
            )?;
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(EnrichError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for EnrichConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
