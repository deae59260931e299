use serde::{Deserialize, Serialize};

/// 单题回答记录
///
/// 创建后不再修改，按提问顺序追加到会话的回答序列中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// 题目索引（从 0 开始）
    #[serde(rename = "questionIndex")]
    pub question_index: usize,
    pub question: String,
    pub answer: String,
    /// 单题得分，[0, 10]
    pub score: f64,
    pub feedback: String,
}

/// 将回答序列渲染为最终评分用的完整问答文稿
///
/// 逐条格式为 `Q: / A: / Score: / Feedback:`，条目间空一行，顺序与提问顺序一致
pub fn render_transcript(records: &[AnswerRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "Q: {}\nA: {}\nScore: {}\nFeedback: {}",
                r.question, r.answer, r.score, r.feedback
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, score: f64) -> AnswerRecord {
        AnswerRecord {
            question_index: index,
            question: format!("问题 {}", index + 1),
            answer: format!("回答 {}", index + 1),
            score,
            feedback: "条理清晰".to_string(),
        }
    }

    #[test]
    fn test_render_transcript_order_and_format() {
        let transcript = render_transcript(&[record(0, 7.0), record(1, 8.5)]);
        let blocks: Vec<&str> = transcript.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Q: 问题 1\nA: 回答 1\nScore: 7"));
        assert!(blocks[1].contains("Score: 8.5"));
        assert!(blocks[1].contains("Feedback: 条理清晰"));
    }

    #[test]
    fn test_render_transcript_empty() {
        assert_eq!(render_transcript(&[]), "");
    }
}
