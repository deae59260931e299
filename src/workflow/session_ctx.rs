//! 会话上下文
//!
//! 封装"谁在答辩"这一信息

use std::fmt::Display;
use uuid::Uuid;

/// 会话上下文
///
/// 包含一次答辩会话所需的全部身份信息
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 会话 ID（仅用于日志显示与排查）
    pub session_id: String,

    /// 团队 / 项目名称
    pub startup_name: String,

    /// 创始人姓名
    pub founder_name: String,
}

impl SessionCtx {
    /// 创建新的会话上下文
    pub fn new(startup_name: impl Into<String>, founder_name: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            startup_name: startup_name.into(),
            founder_name: founder_name.into(),
        }
    }

    /// 日志用短 ID
    pub fn short_id(&self) -> &str {
        &self.session_id[..self.session_id.len().min(8)]
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 #{} 团队#{} 创始人#{}]",
            self.short_id(),
            self.startup_name,
            self.founder_name
        )
    }
}
