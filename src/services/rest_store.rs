//! REST 存储 - 业务能力层
//!
//! 面向 Supabase 风格 REST 接口的结果存储后端，
//! 与 JSON 文件存储共用同一个 `ResultStore` 契约

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::models::StoredEvaluationRecord;
use crate::services::result_store::{ResultStore, StoreError};

const EVALUATIONS_TABLE: &str = "evaluations";

/// REST 存储客户端
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// 创建新的 REST 存储客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.store_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, EVALUATIONS_TABLE)
    }
}

#[async_trait]
impl ResultStore for RestStore {
    async fn append(&self, record: &StoredEvaluationRecord) -> Result<(), StoreError> {
        let endpoint = self.table_url();
        debug!("POST {} (记录: {})", endpoint, record.startup_name);

        let response = self
            .client
            .post(&endpoint)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(StoreError::BadStatus {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StoredEvaluationRecord>, StoreError> {
        let endpoint = format!("{}?select=*&order=timestamp.desc", self.table_url());
        debug!("GET {}", endpoint);

        let response = self
            .client
            .get(&endpoint)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(StoreError::BadStatus {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::RequestFailed { endpoint, source: e })
    }
}
