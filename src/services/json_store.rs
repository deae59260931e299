//! JSON 文件存储 - 业务能力层
//!
//! 只负责"评审记录落盘"能力，不关心会话流程
//!
//! 记录以 JSON 数组形式保存在单个文件中，追加时整体读回再写出；
//! 文件缺失或内容为空白按空列表处理

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::StoredEvaluationRecord;
use crate::services::result_store::{ResultStore, StoreError};

/// JSON 文件存储
pub struct JsonFileStore {
    data_file: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }

    fn read_error(&self, source: std::io::Error) -> StoreError {
        StoreError::ReadFailed {
            path: self.data_file.display().to_string(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::WriteFailed {
            path: self.data_file.display().to_string(),
            source,
        }
    }

    /// 读出现有全部记录
    async fn read_records(&self) -> Result<Vec<StoredEvaluationRecord>, StoreError> {
        if !Path::new(&self.data_file).exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.data_file)
            .await
            .map_err(|e| self.read_error(e))?;

        // 空文件按空列表处理
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    async fn write_records(&self, records: &[StoredEvaluationRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.data_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.write_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.data_file, content)
            .await
            .map_err(|e| self.write_error(e))
    }
}

#[async_trait]
impl ResultStore for JsonFileStore {
    async fn append(&self, record: &StoredEvaluationRecord) -> Result<(), StoreError> {
        debug!(
            "追加评审记录: {} ({})",
            record.startup_name,
            self.data_file.display()
        );

        let mut records = self.read_records().await?;
        records.push(record.clone());
        self.write_records(&records).await
    }

    async fn list_all(&self) -> Result<Vec<StoredEvaluationRecord>, StoreError> {
        let mut records = self.read_records().await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryScores;
    use chrono::{Duration, Utc};

    fn record(startup: &str, age_minutes: i64) -> StoredEvaluationRecord {
        let mut record = StoredEvaluationRecord::new(
            startup,
            "创始人",
            CategoryScores::new(7.0, 7.0, 8.0, 8.0, 7.0),
            "总结。",
        );
        record.timestamp = Utc::now() - Duration::minutes(age_minutes);
        record
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("evaluations.json"));

        store.append(&record("老团队", 60)).await.unwrap();
        store.append(&record("新团队", 1)).await.unwrap();

        let records = store.list_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].startup_name, "新团队");
        assert_eq!(records[1].startup_name, "老团队");
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nonexistent.json"));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evaluations.json");
        tokio::fs::write(&path, "  \n").await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_total_score() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("evaluations.json"));

        store.append(&record("车位侠", 0)).await.unwrap();
        let records = store.list_all().await.unwrap();
        assert_eq!(records[0].total_score, 7.4);
        assert_eq!(records[0].total_score, records[0].scores.total());
    }
}
