use std::fmt;

/// 会话错误类型
///
/// 阶段一 / 阶段二的错误会阻断流程并呈现给答辩者；
/// 持久化错误不在此枚举中（见 `services::result_store::StoreError`），
/// 它只记录日志，永远不会阻断结果页
#[derive(Debug)]
pub enum SessionError {
    /// 配置加载失败
    ConfigLoadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 阶段一失败：Evaluator 调用失败或返回数据违反契约（如问题数 < 5）
    AnalysisFailed {
        reason: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// BP 文件超过大小上限
    DeckTooLarge { size: usize, max: usize },
    /// 转写文本去空白后为空，未发起任何外部调用
    EmptyAnswer,
    /// 同一会话已有一次回答提交在途
    AnswerInProgress,
    /// 回答的题目索引与当前索引不符（跳题或重复提交）
    AnswerOutOfOrder { expected: usize, got: usize },
    /// 在错误的阶段调用了操作
    PhaseViolation {
        expected: &'static str,
        actual: &'static str,
    },
    /// 阶段二失败：单题打分的 Evaluator 调用整体失败
    AnswerScoringFailed {
        question_index: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 尚有问题未回答时调用了 finalize
    IncompleteSession { answered: usize, expected: usize },
    /// 阶段三失败：整场打分的 Evaluator 调用失败，可保留状态重试
    FinalizationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ConfigLoadFailed { path, source } => {
                write!(f, "配置加载失败 ({}): {}", path, source)
            }
            SessionError::AnalysisFailed { reason, source } => match source {
                Some(source) => write!(f, "BP 分析失败 ({}): {}", reason, source),
                None => write!(f, "BP 分析失败: {}", reason),
            },
            SessionError::DeckTooLarge { size, max } => {
                write!(f, "BP 文件过大: {} 字节，上限 {} 字节", size, max)
            }
            SessionError::EmptyAnswer => write!(f, "回答内容为空"),
            SessionError::AnswerInProgress => write!(f, "上一次回答仍在处理中"),
            SessionError::AnswerOutOfOrder { expected, got } => {
                write!(f, "回答顺序错误: 当前应回答第 {} 题，收到第 {} 题", expected, got)
            }
            SessionError::PhaseViolation { expected, actual } => {
                write!(f, "阶段错误: 该操作要求 {} 阶段，当前为 {} 阶段", expected, actual)
            }
            SessionError::AnswerScoringFailed {
                question_index,
                source,
            } => {
                write!(f, "第 {} 题打分失败: {}", question_index + 1, source)
            }
            SessionError::IncompleteSession { answered, expected } => {
                write!(f, "会话未完成: 已回答 {}/{} 题", answered, expected)
            }
            SessionError::FinalizationFailed { source } => {
                write!(f, "最终评分失败: {}", source)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::ConfigLoadFailed { source, .. }
            | SessionError::AnswerScoringFailed { source, .. }
            | SessionError::FinalizationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            SessionError::AnalysisFailed { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

// ========== 便捷构造函数 ==========

impl SessionError {
    /// 创建配置加载错误
    pub fn config_load_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SessionError::ConfigLoadFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// 创建 BP 分析错误（无底层错误，用于契约违反）
    pub fn analysis_contract_violated(reason: impl Into<String>) -> Self {
        SessionError::AnalysisFailed {
            reason: reason.into(),
            source: None,
        }
    }

    /// 创建 BP 分析错误（包装底层错误）
    pub fn analysis_failed(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SessionError::AnalysisFailed {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// 创建单题打分错误
    pub fn answer_scoring_failed(
        question_index: usize,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SessionError::AnswerScoringFailed {
            question_index,
            source: Box::new(source),
        }
    }

    /// 创建最终评分错误
    pub fn finalization_failed(
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SessionError::FinalizationFailed {
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 会话结果类型
pub type SessionResult<T> = Result<T, SessionError>;
