//! # AI Jury
//!
//! 一个用于创业路演自动评审的 Rust 库：上传 BP（Pitch Deck）→ 语音问答 → 评分落库
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 能力接口层（Capabilities）
//! - `services/` 中的 trait - 描述外部能力的契约，支持测试替身注入
//! - `Evaluator` - AI 评审能力（分析 BP / 逐题打分 / 整场打分）
//! - `ResultStore` - 评审结果持久化能力（追加 + 倒序读取）
//! - `Transcriber` - 语音转写能力（编排器只消费最终文本）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 各能力的生产实现，只处理单次调用
//! - `LlmEvaluator` - 基于 LLM API 的评审实现
//! - `JsonFileStore` / `RestStore` - 两种结果存储后端
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个回答"的完整处理流程
//! - `SessionCtx` - 上下文封装（团队名 + 创始人名 + 会话 ID）
//! - `AnswerFlow` - 流程编排（校验 → 打分 → 生成记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 会话编排器，管理三阶段状态机与持久化隔离
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{SessionError, SessionResult};
pub use models::{
    AnswerRecord, CategoryScores, DeckDocument, EvaluationResult, PitchDeckAnalysis,
    StoredEvaluationRecord,
};
pub use orchestrator::{Phase, SessionOrchestrator, SubmitOutcome};
pub use services::{Evaluator, JsonFileStore, LlmEvaluator, RestStore, ResultStore, Transcriber};
pub use workflow::{AnswerFlow, SessionCtx};
