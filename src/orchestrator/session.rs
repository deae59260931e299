//! 会话编排器 - 编排层
//!
//! ## 职责
//!
//! 本模块驱动一次答辩会话的三阶段流水线，是会话级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **阶段状态机**：Upload → QA → Results，操作必须在对应阶段发起
//! 2. **顺序保障**：回答按题目索引严格递增追加，跳题 / 重复提交被拒绝
//! 3. **单航道提交**：同一会话同时只允许一次回答在途
//! 4. **最终评分**：整场重评五个维度，总分永远在本地重新计算
//! 5. **持久化隔离**：落库失败只记日志，绝不阻断答辩者看到结果
//!
//! ## 设计特点
//!
//! - **显式依赖**：Evaluator 与 ResultStore 由构造时注入，可替换为测试替身
//! - **会话独占**：一个会话对应一个浏览器标签页，状态只在内存中，重开即丢弃
//! - **无后台工作**：每个操作都是调用方 await 到底的单个异步单元

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{SessionError, SessionResult};
use crate::models::{
    render_transcript, AnswerRecord, DeckDocument, EvaluationResult, PitchDeckAnalysis,
    StoredEvaluationRecord, MAX_INVESTOR_QUESTIONS, MIN_INVESTOR_QUESTIONS,
};
use crate::services::{Evaluator, EvaluatorError, ResultStore};
use crate::workflow::{AnswerFlow, SessionCtx};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Upload,
    Qa,
    Results,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Upload => "Upload",
            Phase::Qa => "QA",
            Phase::Results => "Results",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `submit_answer` 的返回值
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub record: AnswerRecord,
    /// 刚回答的是最后一题；阶段三需要调用方显式发起，不会自动推进
    pub completed: bool,
}

/// 会话内部状态
#[derive(Debug, Default)]
struct SessionState {
    phase: Phase,
    analysis: Option<PitchDeckAnalysis>,
    answers: Vec<AnswerRecord>,
    result: Option<EvaluationResult>,
}

/// 在途提交守卫，释放时归还航道
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 会话编排器
pub struct SessionOrchestrator {
    ctx: SessionCtx,
    evaluator: Arc<dyn Evaluator>,
    store: Arc<dyn ResultStore>,
    answer_flow: AnswerFlow,
    call_timeout: Duration,
    max_deck_bytes: usize,
    state: Mutex<SessionState>,
    answer_in_flight: AtomicBool,
}

impl SessionOrchestrator {
    /// 创建新的会话编排器
    pub fn new(
        ctx: SessionCtx,
        evaluator: Arc<dyn Evaluator>,
        store: Arc<dyn ResultStore>,
        config: &Config,
    ) -> Self {
        let call_timeout = Duration::from_secs(config.evaluator_timeout_secs);
        Self {
            answer_flow: AnswerFlow::new(evaluator.clone(), call_timeout),
            ctx,
            evaluator,
            store,
            call_timeout,
            max_deck_bytes: config.max_deck_bytes,
            state: Mutex::new(SessionState::default()),
            answer_in_flight: AtomicBool::new(false),
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, SessionState> {
        // 锁只在同步段内短暂持有，poison 时直接取回内部状态
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn timeout_error(&self) -> EvaluatorError {
        EvaluatorError::Timeout {
            seconds: self.call_timeout.as_secs(),
        }
    }

    // ========== 阶段一：BP 分析 ==========

    /// 分析 BP 文档并生成投资人问题
    ///
    /// 失败时不保留任何部分状态，阶段停留在 Upload，
    /// 调用方可用同一份文档直接重试
    pub async fn analyze_deck(
        &self,
        document: &DeckDocument,
    ) -> SessionResult<PitchDeckAnalysis> {
        {
            let state = self.state_guard();
            if state.phase != Phase::Upload {
                return Err(SessionError::PhaseViolation {
                    expected: Phase::Upload.as_str(),
                    actual: state.phase.as_str(),
                });
            }
        }

        if document.size() > self.max_deck_bytes {
            return Err(SessionError::DeckTooLarge {
                size: document.size(),
                max: self.max_deck_bytes,
            });
        }

        info!(
            "[会话 {}] 📄 BP 分析中 ({}, {} 字节)...",
            self.ctx.short_id(),
            document.mime_type,
            document.size()
        );

        let analysis = match timeout(self.call_timeout, self.evaluator.analyze(document)).await {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(e)) => {
                error!("[会话 {}] ❌ BP 分析调用失败: {}", self.ctx.short_id(), e);
                return Err(SessionError::analysis_failed("Evaluator 调用失败", e));
            }
            Err(_) => {
                return Err(SessionError::analysis_failed(
                    "Evaluator 调用超时",
                    self.timeout_error(),
                ));
            }
        };

        // 问题数量契约：[5, 7]，不足时绝不补占位问题
        if !analysis.question_count_in_contract() {
            return Err(SessionError::analysis_contract_violated(format!(
                "投资人问题数量为 {}，契约要求 [{}, {}]",
                analysis.investor_questions.len(),
                MIN_INVESTOR_QUESTIONS,
                MAX_INVESTOR_QUESTIONS
            )));
        }

        info!(
            "[会话 {}] ✓ BP 分析完成，生成 {} 个投资人问题",
            self.ctx.short_id(),
            analysis.investor_questions.len()
        );

        {
            let mut state = self.state_guard();
            state.analysis = Some(analysis.clone());
            state.answers.clear();
            state.result = None;
            state.phase = Phase::Qa;
        }

        Ok(analysis)
    }

    // ========== 阶段二：逐题问答 ==========

    /// 提交一题的转写回答
    ///
    /// 索引必须等于当前待答题目的索引；回答按提问顺序追加，
    /// 最后一题回答完通过 `SubmitOutcome::completed` 通知调用方
    pub async fn submit_answer(
        &self,
        question_index: usize,
        transcribed_text: &str,
    ) -> SessionResult<SubmitOutcome> {
        // 单航道：同一会话同时只允许一次提交在途
        let _guard = InFlightGuard::acquire(&self.answer_in_flight)
            .ok_or(SessionError::AnswerInProgress)?;

        let (context_json, question, expected, total) = {
            let state = self.state_guard();
            if state.phase != Phase::Qa {
                return Err(SessionError::PhaseViolation {
                    expected: Phase::Qa.as_str(),
                    actual: state.phase.as_str(),
                });
            }
            let analysis = match state.analysis.as_ref() {
                Some(analysis) => analysis,
                None => {
                    return Err(SessionError::PhaseViolation {
                        expected: Phase::Qa.as_str(),
                        actual: state.phase.as_str(),
                    })
                }
            };

            let expected = state.answers.len();
            let total = analysis.investor_questions.len();
            if question_index != expected || expected >= total {
                return Err(SessionError::AnswerOutOfOrder {
                    expected,
                    got: question_index,
                });
            }

            (
                analysis.context_json(),
                analysis.investor_questions[expected].clone(),
                expected,
                total,
            )
        };

        let record = self
            .answer_flow
            .run(&self.ctx, &context_json, expected, &question, transcribed_text)
            .await?;

        let completed = {
            let mut state = self.state_guard();
            state.answers.push(record.clone());
            state.answers.len() == total
        };

        if completed {
            info!(
                "[会话 {}] ✅ 全部 {} 题已回答，等待调用方发起最终评分",
                self.ctx.short_id(),
                total
            );
        }

        Ok(SubmitOutcome { record, completed })
    }

    // ========== 阶段三：最终评分与落库 ==========

    /// 整场重评并写入结果存储
    ///
    /// Evaluator 失败会保留全部回答，调用方可直接重试；
    /// 每次成功调用都会追加一条持久化记录；
    /// 落库失败只记日志，返回值不受影响
    pub async fn finalize(&self) -> SessionResult<EvaluationResult> {
        let (context_json, transcript) = {
            let state = self.state_guard();
            if state.phase == Phase::Upload {
                return Err(SessionError::PhaseViolation {
                    expected: Phase::Qa.as_str(),
                    actual: state.phase.as_str(),
                });
            }
            let analysis = match state.analysis.as_ref() {
                Some(analysis) => analysis,
                None => {
                    return Err(SessionError::PhaseViolation {
                        expected: Phase::Qa.as_str(),
                        actual: state.phase.as_str(),
                    })
                }
            };

            let expected = analysis.investor_questions.len();
            if state.answers.len() < expected {
                return Err(SessionError::IncompleteSession {
                    answered: state.answers.len(),
                    expected,
                });
            }

            (analysis.context_json(), render_transcript(&state.answers))
        };

        info!("[会话 {}] 📊 最终评分中...", self.ctx.short_id());

        let session_scores = match timeout(
            self.call_timeout,
            self.evaluator.score_session(&context_json, &transcript),
        )
        .await
        {
            Ok(Ok(scores)) => scores,
            Ok(Err(e)) => {
                error!("[会话 {}] ❌ 最终评分调用失败: {}", self.ctx.short_id(), e);
                return Err(SessionError::finalization_failed(e));
            }
            Err(_) => {
                return Err(SessionError::finalization_failed(self.timeout_error()));
            }
        };

        // 范围校验 + 本地计算总分，不信任 Evaluator 返回的任何汇总值
        let result = EvaluationResult::new(session_scores.scores, session_scores.feedback_summary);

        info!(
            "[会话 {}] ✓ 最终评分完成，总分 {}",
            self.ctx.short_id(),
            result.total_score
        );

        // 持久化隔离：落库失败只走日志侧通道，绝不传导给答辩者
        let record = StoredEvaluationRecord::new(
            self.ctx.startup_name.as_str(),
            self.ctx.founder_name.as_str(),
            result.scores,
            result.feedback_summary.as_str(),
        );
        if let Err(e) = self.store.append(&record).await {
            error!(
                "[会话 {}] ❌ 评审记录落库失败（结果照常返回）: {}",
                self.ctx.short_id(),
                e
            );
        }

        {
            let mut state = self.state_guard();
            state.result = Some(result.clone());
            state.phase = Phase::Results;
        }

        Ok(result)
    }

    /// 重置会话，回到 Upload 阶段
    ///
    /// 进行中的会话状态不做任何持久化，重置即丢弃
    pub fn restart(&self) {
        let mut state = self.state_guard();
        *state = SessionState::default();
        info!("[会话 {}] 🔄 会话已重置", self.ctx.short_id());
    }

    // ========== 状态查询 ==========

    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    pub fn phase(&self) -> Phase {
        self.state_guard().phase
    }

    /// 当前待答题目的索引（从 0 开始）
    pub fn current_question_index(&self) -> usize {
        self.state_guard().answers.len()
    }

    pub fn analysis(&self) -> Option<PitchDeckAnalysis> {
        self.state_guard().analysis.clone()
    }

    pub fn answers(&self) -> Vec<AnswerRecord> {
        self.state_guard().answers.clone()
    }

    pub fn result(&self) -> Option<EvaluationResult> {
        self.state_guard().result.clone()
    }
}
