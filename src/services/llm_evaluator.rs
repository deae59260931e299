//! LLM 评审服务 - 业务能力层
//!
//! 只负责"AI 评审"能力，不关心会话流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）
//! - BP 文档以 data URI 形式随多模态消息上行

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{CategoryScores, DeckDocument, PitchDeckAnalysis};
use crate::services::evaluator::{AnswerScore, Evaluator, EvaluatorError, SessionScores};

const ANALYZE_SYSTEM_PROMPT: &str = "You are an AI Jury member evaluating startup pitch decks. \
     You analyze the provided deck and respond with strictly valid JSON matching the requested schema.";

const SCORING_SYSTEM_PROMPT: &str = "You are an AI Jury member evaluating startup pitches. \
     You respond with strictly valid JSON matching the requested schema.";

/// LLM 评审服务
///
/// 职责：
/// - 调用 LLM API 完成三类评审请求
/// - 提供通用的 LLM 调用接口
/// - 只处理单次调用
/// - 不出现 Vec<AnswerRecord>
/// - 不出现阶段与索引概念
pub struct LlmEvaluator {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmEvaluator {
    /// 创建新的 LLM 评审服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    fn api_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> EvaluatorError {
        EvaluatorError::ApiCallFailed {
            model: self.model_name.clone(),
            source: Box::new(source),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 这是最基础的 LLM 调用接口，三个评审能力都基于此函数。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `attachment`: 随消息上行的文档（可选），以 data URI 形式追加到用户消息中
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        attachment: Option<&DeckDocument>,
    ) -> Result<String, EvaluatorError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| self.api_error(e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        // 构建用户消息内容（支持文档附件）
        let user_msg = if let Some(document) = attachment {
            debug!(
                "携带文档附件: {} ({} 字节)",
                document.mime_type,
                document.size()
            );

            // 多模态消息：文本部分 + 文档 data URI 部分
            let content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: user_message.to_string(),
                    },
                ),
                ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: document.data_uri(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ),
            ];

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(
                    content_parts,
                ))
                .build()
                .map_err(|e| self.api_error(e))?
        } else {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| self.api_error(e))?
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(2048u32)
            .build()
            .map_err(|e| self.api_error(e))?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.api_error(e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| EvaluatorError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait::async_trait]
impl Evaluator for LlmEvaluator {
    async fn analyze(&self, document: &DeckDocument) -> Result<PitchDeckAnalysis, EvaluatorError> {
        let user_message = r#"Analyze the pitch deck provided and extract key information: the problem the startup is trying to solve, their proposed solution, the market size, the business model, the competitive landscape, and any potential risks.

Based on your analysis, generate 5-7 investor-style questions that would help assess the startup's potential. The questions must reference specific details from this deck rather than generic boilerplate, and must collectively cover: problem clarity, feasibility, market sizing, differentiation, monetization, and risk.

Respond with JSON only, using exactly these keys:
{"problem": string, "solution": string, "marketSize": string, "businessModel": string, "competition": string, "risks": string, "investorQuestions": [string, ...]}"#;

        let response = self
            .send_to_llm(user_message, Some(ANALYZE_SYSTEM_PROMPT), Some(document))
            .await?;

        parse_analysis(&response)
    }

    async fn score_answer(
        &self,
        context: &str,
        question: &str,
        answer: &str,
    ) -> Result<AnswerScore, EvaluatorError> {
        let user_message = format!(
            r#"You have analyzed the pitch deck and generated questions. Now you are conducting a voice-based Q&A with the participant.

Pitch Deck Analysis and Generated Questions: {}

Question Asked: {}
Participant Response: {}

Evaluate this specific answer for clarity, feasibility, scalability, innovation, and risk-awareness. Provide a score from 1 to 10 and investor-style feedback of 2-3 sentences.

Respond with JSON only: {{"score": number, "feedback": string}}"#,
            context, question, answer
        );

        let response = self
            .send_to_llm(&user_message, Some(SCORING_SYSTEM_PROMPT), None)
            .await?;

        parse_answer_score(&response)
    }

    async fn score_session(
        &self,
        context: &str,
        transcript: &str,
    ) -> Result<SessionScores, EvaluatorError> {
        let user_message = format!(
            r#"You are an expert evaluator for a startup pitch competition. Use the pitch deck analysis and the full voice Q&A transcript to score the pitch holistically across the entire performance, not as a mechanical average of per-answer scores.

Evaluation Criteria:
- Innovation (0-10)
- Feasibility (0-10)
- Market Potential (0-10)
- Pitch Clarity (0-10)
- Problem-Solution Fit (0-10)

Also provide a feedback summary of 3-5 sentences covering strengths and actionable weaknesses.

Pitch Deck Analysis: {}

Voice Q&A Transcript:
{}

Respond with JSON only, using exactly these keys:
{{"innovationScore": number, "feasibilityScore": number, "marketPotentialScore": number, "pitchClarityScore": number, "problemSolutionFitScore": number, "feedbackSummary": string}}"#,
            context, transcript
        );

        let response = self
            .send_to_llm(&user_message, Some(SCORING_SYSTEM_PROMPT), None)
            .await?;

        parse_session_scores(&response)
    }
}

// ========== 响应解析 ==========

/// 从 LLM 响应中提取 JSON 主体
///
/// 模型偶尔会把 JSON 包在 Markdown 代码围栏或说明文字里
fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    // 优先剥离 ``` 围栏
    if let Ok(re) = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```") {
        if let Some(caps) = re.captures(trimmed) {
            if let Some(body) = caps.get(1) {
                return body.as_str().trim().to_string();
            }
        }
    }

    // 退路：截取首尾大括号之间的内容
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

fn parse_analysis(response: &str) -> Result<PitchDeckAnalysis, EvaluatorError> {
    let body = extract_json(response);
    serde_json::from_str(&body).map_err(|e| EvaluatorError::MalformedResponse {
        detail: format!("BP 分析结果解析失败: {}", e),
    })
}

#[derive(Debug, Deserialize)]
struct RawAnswerScore {
    #[serde(default)]
    score: Option<JsonValue>,
    #[serde(default)]
    feedback: String,
}

/// 宽容地把 score 字段转成数字
///
/// 数字直接取值，数字字符串尝试解析，其余情况视为缺失
fn coerce_score(value: Option<&JsonValue>) -> Option<f64> {
    match value {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_answer_score(response: &str) -> Result<AnswerScore, EvaluatorError> {
    let body = extract_json(response);
    let raw: RawAnswerScore =
        serde_json::from_str(&body).map_err(|e| EvaluatorError::MalformedResponse {
            detail: format!("单题打分结果解析失败: {}", e),
        })?;

    let score = coerce_score(raw.score.as_ref());
    if score.is_none() {
        warn!("LLM 未返回合法的 score 字段: {:?}", raw.score);
    }

    Ok(AnswerScore {
        score,
        feedback: raw.feedback.trim().to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct RawSessionScores {
    #[serde(rename = "innovationScore")]
    innovation_score: f64,
    #[serde(rename = "feasibilityScore")]
    feasibility_score: f64,
    #[serde(rename = "marketPotentialScore")]
    market_potential_score: f64,
    #[serde(rename = "pitchClarityScore")]
    pitch_clarity_score: f64,
    #[serde(rename = "problemSolutionFitScore")]
    problem_solution_fit_score: f64,
    #[serde(rename = "feedbackSummary")]
    feedback_summary: String,
}

fn parse_session_scores(response: &str) -> Result<SessionScores, EvaluatorError> {
    let body = extract_json(response);
    let raw: RawSessionScores =
        serde_json::from_str(&body).map_err(|e| EvaluatorError::MalformedResponse {
            detail: format!("整场打分结果解析失败: {}", e),
        })?;

    Ok(SessionScores {
        scores: CategoryScores::new(
            raw.innovation_score,
            raw.feasibility_score,
            raw.market_potential_score,
            raw.pitch_clarity_score,
            raw.problem_solution_fit_score,
        ),
        feedback_summary: raw.feedback_summary.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let body = extract_json(r#"{"score": 7, "feedback": "ok"}"#);
        assert_eq!(body, r#"{"score": 7, "feedback": "ok"}"#);
    }

    #[test]
    fn test_extract_json_fenced() {
        let response = "```json\n{\"score\": 7}\n```";
        assert_eq!(extract_json(response), "{\"score\": 7}");
    }

    #[test]
    fn test_extract_json_with_prose() {
        let response = "Here is my evaluation:\n{\"score\": 7, \"feedback\": \"good\"}\nThanks.";
        assert_eq!(extract_json(response), "{\"score\": 7, \"feedback\": \"good\"}");
    }

    #[test]
    fn test_coerce_score_variants() {
        assert_eq!(coerce_score(Some(&serde_json::json!(7))), Some(7.0));
        assert_eq!(coerce_score(Some(&serde_json::json!(8.5))), Some(8.5));
        assert_eq!(coerce_score(Some(&serde_json::json!("9"))), Some(9.0));
        assert_eq!(coerce_score(Some(&serde_json::json!("九分"))), None);
        assert_eq!(coerce_score(Some(&serde_json::json!(null))), None);
        assert_eq!(coerce_score(None), None);
    }

    #[test]
    fn test_parse_answer_score_missing_score() {
        let parsed = parse_answer_score(r#"{"feedback": "The answer was vague."}"#).unwrap();
        assert_eq!(parsed.score, None);
        assert_eq!(parsed.feedback, "The answer was vague.");
    }

    #[test]
    fn test_parse_session_scores() {
        let response = r#"```json
        {
            "innovationScore": 7,
            "feasibilityScore": 7,
            "marketPotentialScore": 8,
            "pitchClarityScore": 8,
            "problemSolutionFitScore": 7,
            "feedbackSummary": "Solid pitch with a credible wedge."
        }
        ```"#;
        let parsed = parse_session_scores(response).unwrap();
        assert_eq!(parsed.scores.total(), 7.4);
        assert_eq!(parsed.feedback_summary, "Solid pitch with a credible wedge.");
    }

    #[test]
    fn test_parse_session_scores_missing_field_is_error() {
        let response = r#"{"innovationScore": 7, "feedbackSummary": "incomplete"}"#;
        assert!(parse_session_scores(response).is_err());
    }

    #[test]
    fn test_parse_analysis_contract_fields() {
        let response = r#"{
            "problem": "Parking is scarce",
            "solution": "Shared parking marketplace",
            "marketSize": "10B USD",
            "businessModel": "Take rate on bookings",
            "competition": "Municipal garages",
            "risks": "Regulation",
            "investorQuestions": ["q1", "q2", "q3", "q4", "q5"]
        }"#;
        let analysis = parse_analysis(response).unwrap();
        assert_eq!(analysis.investor_questions.len(), 5);
        assert!(analysis.question_count_in_contract());
    }
}
