//! Evaluator 能力契约 - 能力接口层
//!
//! 编排器只依赖本契约，不关心具体模型与供应商，测试时可注入替身

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CategoryScores, DeckDocument, PitchDeckAnalysis};

/// Evaluator 能力错误
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容无法解析为约定结构
    #[error("LLM 返回格式无法解析: {detail}")]
    MalformedResponse { detail: String },
    /// 调用超时
    #[error("Evaluator 调用超时 ({seconds} 秒)")]
    Timeout { seconds: u64 },
}

/// 单题打分的原始结果
///
/// score 缺失或非法时为 `None`，是否兜底由编排层决定；
/// feedback 原样透传，任何一层都不得替它编造内容
#[derive(Debug, Clone)]
pub struct AnswerScore {
    pub score: Option<f64>,
    pub feedback: String,
}

/// 整场打分的原始结果
#[derive(Debug, Clone)]
pub struct SessionScores {
    pub scores: CategoryScores,
    pub feedback_summary: String,
}

/// AI 评审能力
///
/// 职责：
/// - 分析 BP 并生成投资人问题
/// - 对单题回答打分
/// - 根据完整问答文稿整体重评五个维度
/// - 不持有会话状态，不关心阶段顺序
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// 分析 BP 文档，提取叙述字段并生成投资人问题
    async fn analyze(&self, document: &DeckDocument) -> Result<PitchDeckAnalysis, EvaluatorError>;

    /// 对单题回答打分并给出点评
    async fn score_answer(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<AnswerScore, EvaluatorError>;

    /// 根据完整问答表现整体重评五个维度
    async fn score_session(
        &self,
        context: &str,
        transcript: &str,
    ) -> Result<SessionScores, EvaluatorError>;
}
