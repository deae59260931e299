//! 单题回答处理流程 - 流程层
//!
//! 核心职责：定义"一个回答"的完整处理流程
//!
//! 流程顺序：
//! 1. 校验回答非空（不发起任何外部调用）
//! 2. Evaluator 打分（带超时）
//! 3. 生成回答记录（score 兜底，feedback 不兜底）

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::{SessionError, SessionResult};
use crate::models::AnswerRecord;
use crate::services::{Evaluator, EvaluatorError};
use crate::utils::logging::truncate_text;
use crate::workflow::session_ctx::SessionCtx;

/// 单题回答处理流程
///
/// - 编排单个回答从校验到成稿的全过程
/// - 不持有会话状态
/// - 只依赖 Evaluator 能力
pub struct AnswerFlow {
    evaluator: Arc<dyn Evaluator>,
    call_timeout: Duration,
}

impl AnswerFlow {
    /// 创建新的回答处理流程
    pub fn new(evaluator: Arc<dyn Evaluator>, call_timeout: Duration) -> Self {
        Self {
            evaluator,
            call_timeout,
        }
    }

    /// 处理一个回答
    ///
    /// # 参数
    /// - `ctx`: 会话上下文
    /// - `context_json`: 序列化后的 BP 分析，作为评审上下文
    /// - `question_index`: 题目索引（从 0 开始）
    /// - `question`: 题目原文
    /// - `raw_answer`: 转写文本（未修剪）
    pub async fn run(
        &self,
        ctx: &SessionCtx,
        context_json: &str,
        question_index: usize,
        question: &str,
        raw_answer: &str,
    ) -> SessionResult<AnswerRecord> {
        // 回答去空白后为空则直接拒绝，不浪费外部调用
        let answer = raw_answer.trim();
        if answer.is_empty() {
            return Err(SessionError::EmptyAnswer);
        }

        info!(
            "[会话 {}] 🎯 第 {} 题打分中: {}",
            ctx.short_id(),
            question_index + 1,
            truncate_text(answer, 80)
        );

        let scored = match timeout(
            self.call_timeout,
            self.evaluator.score_answer(context_json, question, answer),
        )
        .await
        {
            Ok(Ok(scored)) => scored,
            Ok(Err(e)) => {
                return Err(SessionError::answer_scoring_failed(question_index, e));
            }
            Err(_) => {
                return Err(SessionError::answer_scoring_failed(
                    question_index,
                    EvaluatorError::Timeout {
                        seconds: self.call_timeout.as_secs(),
                    },
                ));
            }
        };

        // feedback 不做兜底：空点评视为打分失败
        let feedback = scored.feedback.trim();
        if feedback.is_empty() {
            return Err(SessionError::answer_scoring_failed(
                question_index,
                EvaluatorError::MalformedResponse {
                    detail: "feedback 为空".to_string(),
                },
            ));
        }

        // score 缺失或非法时兜底为 0，保证残缺会话也能走到阶段三
        let score = match scored.score {
            Some(value) if value.is_finite() => value.clamp(0.0, 10.0),
            _ => {
                warn!(
                    "[会话 {}] ⚠️ 第 {} 题 score 缺失或非法，按 0 分计",
                    ctx.short_id(),
                    question_index + 1
                );
                0.0
            }
        };

        info!(
            "[会话 {}] ✓ 第 {} 题得分 {}",
            ctx.short_id(),
            question_index + 1,
            score
        );

        Ok(AnswerRecord {
            question_index,
            question: question.to_string(),
            answer: answer.to_string(),
            score,
            feedback: feedback.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeckDocument, PitchDeckAnalysis};
    use crate::services::{AnswerScore, SessionScores};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 只用于校验调用次数的替身
    struct CountingEvaluator {
        score_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Evaluator for CountingEvaluator {
        async fn analyze(
            &self,
            _document: &DeckDocument,
        ) -> Result<PitchDeckAnalysis, EvaluatorError> {
            unreachable!("测试不应调用 analyze")
        }

        async fn score_answer(
            &self,
            _context: &str,
            _question: &str,
            _answer: &str,
        ) -> Result<AnswerScore, EvaluatorError> {
            self.score_calls.fetch_add(1, Ordering::SeqCst);
            Ok(AnswerScore {
                score: Some(7.0),
                feedback: "清晰。".to_string(),
            })
        }

        async fn score_session(
            &self,
            _context: &str,
            _transcript: &str,
        ) -> Result<SessionScores, EvaluatorError> {
            unreachable!("测试不应调用 score_session")
        }
    }

    #[tokio::test]
    async fn test_empty_answer_rejected_without_evaluator_call() {
        let evaluator = Arc::new(CountingEvaluator {
            score_calls: AtomicUsize::new(0),
        });
        let flow = AnswerFlow::new(evaluator.clone(), Duration::from_secs(5));
        let ctx = SessionCtx::new("车位侠", "王浩");

        let result = flow.run(&ctx, "{}", 0, "问题", "   \n\t ").await;
        assert!(matches!(result, Err(SessionError::EmptyAnswer)));
        assert_eq!(evaluator.score_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_is_trimmed_into_record() {
        let evaluator = Arc::new(CountingEvaluator {
            score_calls: AtomicUsize::new(0),
        });
        let flow = AnswerFlow::new(evaluator, Duration::from_secs(5));
        let ctx = SessionCtx::new("车位侠", "王浩");

        let record = flow.run(&ctx, "{}", 0, "问题", "  我们按撮合抽成  ").await.unwrap();
        assert_eq!(record.answer, "我们按撮合抽成");
        assert_eq!(record.score, 7.0);
        assert_eq!(record.question_index, 0);
    }
}
