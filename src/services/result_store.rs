//! 结果存储能力契约 - 能力接口层
//!
//! 追加写 + 倒序读，两个操作各自独立失败；
//! `append` 的失败由调用侧隔离，永远不传导给答辩者

use async_trait::async_trait;
use thiserror::Error;

use crate::models::StoredEvaluationRecord;

/// 结果存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取存储文件失败
    #[error("读取存储文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入存储文件失败
    #[error("写入存储文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 记录序列化 / 反序列化失败
    #[error("存储记录序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 网络请求失败
    #[error("存储请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务端返回错误状态
    #[error("存储返回错误状态 ({endpoint}): HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },
}

/// 评审结果持久化能力
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// 追加一条评审记录
    async fn append(&self, record: &StoredEvaluationRecord) -> Result<(), StoreError>;

    /// 读取全部记录，按创建时间倒序（仪表盘读取路径）
    async fn list_all(&self) -> Result<Vec<StoredEvaluationRecord>, StoreError>;
}
