use serde::Deserialize;
use std::path::Path;

use crate::error::{SessionError, SessionResult};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次 Evaluator 调用的超时秒数
    pub evaluator_timeout_secs: u64,
    // --- 会话配置 ---
    /// BP 文件大小上限（字节）
    pub max_deck_bytes: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 结果存储配置 ---
    /// 存储后端："json" 或 "rest"
    pub store_backend: String,
    /// JSON 文件存储路径
    pub data_file: String,
    /// REST 存储的 API 地址
    pub store_api_base_url: String,
    /// REST 存储的 API key
    pub store_api_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            evaluator_timeout_secs: 90,
            max_deck_bytes: 10 * 1024 * 1024,
            verbose_logging: false,
            store_backend: "json".to_string(),
            data_file: "data/evaluations.json".to_string(),
            store_api_base_url: String::new(),
            store_api_key: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            evaluator_timeout_secs: std::env::var("EVALUATOR_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.evaluator_timeout_secs),
            max_deck_bytes: std::env::var("MAX_DECK_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_deck_bytes),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            store_backend: std::env::var("STORE_BACKEND").unwrap_or(default.store_backend),
            data_file: std::env::var("DATA_FILE").unwrap_or(default.data_file),
            store_api_base_url: std::env::var("STORE_API_BASE_URL").unwrap_or(default.store_api_base_url),
            store_api_key: std::env::var("STORE_API_KEY").unwrap_or(default.store_api_key),
        }
    }

    /// 从 TOML 文件加载配置
    ///
    /// 文件中缺失的字段取默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SessionError::config_load_failed(path.display().to_string(), e)
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            SessionError::config_load_failed(path.display().to_string(), e)
        })?;
        Ok(config)
    }

    /// 加载配置：存在 config.toml 则以文件为准，否则读取环境变量
    pub fn load() -> Self {
        if Path::new("config.toml").exists() {
            match Self::from_toml_file("config.toml") {
                Ok(config) => return config,
                Err(e) => tracing::warn!("⚠️ 配置文件加载失败，回退到环境变量: {}", e),
            }
        }
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_deck_bytes, 10 * 1024 * 1024);
        assert_eq!(config.store_backend, "json");
        assert_eq!(config.evaluator_timeout_secs, 90);
    }

    #[test]
    fn test_from_toml_partial() {
        let toml_src = r#"
            llm_model_name = "gemini-3.0-pro-preview"
            evaluator_timeout_secs = 30
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.llm_model_name, "gemini-3.0-pro-preview");
        assert_eq!(config.evaluator_timeout_secs, 30);
        // 未给出的字段取默认值
        assert_eq!(config.store_backend, "json");
    }
}
