use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// 投资人问题数量下限
pub const MIN_INVESTOR_QUESTIONS: usize = 5;
/// 投资人问题数量上限
pub const MAX_INVESTOR_QUESTIONS: usize = 7;

/// 待分析的 BP 文档（PDF / PPTX 原始字节）
#[derive(Debug, Clone)]
pub struct DeckDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl DeckDocument {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// 渲染为 `data:<mime>;base64,<data>` 形式的 data URI，供多模态消息携带
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// 阶段一产物：BP 分析结果 + 投资人问题列表
///
/// 一经生成不再修改，由会话持有至会话结束
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchDeckAnalysis {
    pub problem: String,
    pub solution: String,
    #[serde(rename = "marketSize")]
    pub market_size: String,
    #[serde(rename = "businessModel")]
    pub business_model: String,
    pub competition: String,
    pub risks: String,
    #[serde(rename = "investorQuestions")]
    pub investor_questions: Vec<String>,
}

impl PitchDeckAnalysis {
    /// 问题数量是否满足契约（[5, 7]）
    pub fn question_count_in_contract(&self) -> bool {
        (MIN_INVESTOR_QUESTIONS..=MAX_INVESTOR_QUESTIONS).contains(&self.investor_questions.len())
    }

    /// 序列化为 JSON 字符串，作为阶段二 / 三的评审上下文
    pub fn context_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
