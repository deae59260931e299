use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 保留一位小数
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 五个评审维度的分数，各自取值 [0, 10]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub innovation: f64,
    pub feasibility: f64,
    #[serde(rename = "marketPotential")]
    pub market_potential: f64,
    #[serde(rename = "pitchClarity")]
    pub pitch_clarity: f64,
    #[serde(rename = "problemSolutionFit")]
    pub problem_solution_fit: f64,
}

impl CategoryScores {
    pub fn new(
        innovation: f64,
        feasibility: f64,
        market_potential: f64,
        pitch_clarity: f64,
        problem_solution_fit: f64,
    ) -> Self {
        Self {
            innovation,
            feasibility,
            market_potential,
            pitch_clarity,
            problem_solution_fit,
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.innovation,
            self.feasibility,
            self.market_potential,
            self.pitch_clarity,
            self.problem_solution_fit,
        ]
    }

    /// 将各维度裁剪到 [0, 10]，非有限值归零
    pub fn clamped(self) -> Self {
        fn clamp(v: f64) -> f64 {
            if v.is_finite() {
                v.clamp(0.0, 10.0)
            } else {
                0.0
            }
        }
        Self {
            innovation: clamp(self.innovation),
            feasibility: clamp(self.feasibility),
            market_potential: clamp(self.market_potential),
            pitch_clarity: clamp(self.pitch_clarity),
            problem_solution_fit: clamp(self.problem_solution_fit),
        }
    }

    /// 总分 = 五个维度的算术平均，保留一位小数
    ///
    /// 全系统只允许用这一个函数计算总分，会话结束与仪表盘侧不得另行定义
    pub fn total(&self) -> f64 {
        let sum: f64 = self.as_array().iter().sum();
        round_to_tenth(sum / 5.0)
    }
}

/// 阶段三产物：最终评审结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(flatten)]
    pub scores: CategoryScores,
    /// 本地计算的总分，不信任 Evaluator 返回的任何汇总值
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "feedbackSummary")]
    pub feedback_summary: String,
}

impl EvaluationResult {
    pub fn new(scores: CategoryScores, feedback_summary: impl Into<String>) -> Self {
        let scores = scores.clamped();
        Self {
            total_score: scores.total(),
            scores,
            feedback_summary: feedback_summary.into(),
        }
    }
}

/// 写入结果存储的持久化记录
///
/// 字段名与仪表盘读取的 evaluations.json 架构一致
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvaluationRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "startupName")]
    pub startup_name: String,
    #[serde(rename = "founderName")]
    pub founder_name: String,
    #[serde(flatten)]
    pub scores: CategoryScores,
    /// 写入时由五个维度分数计算，下游永远不得用别的公式重算
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "feedbackSummary")]
    pub feedback_summary: String,
}

impl StoredEvaluationRecord {
    pub fn new(
        startup_name: impl Into<String>,
        founder_name: impl Into<String>,
        scores: CategoryScores,
        feedback_summary: impl Into<String>,
    ) -> Self {
        let scores = scores.clamped();
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            startup_name: startup_name.into(),
            founder_name: founder_name.into(),
            total_score: scores.total(),
            scores,
            feedback_summary: feedback_summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_mean_rounded_to_tenth() {
        let scores = CategoryScores::new(9.0, 8.0, 9.0, 10.0, 8.0);
        assert_eq!(scores.total(), 8.8);
    }

    #[test]
    fn test_total_exact_values() {
        assert_eq!(CategoryScores::new(7.0, 7.0, 8.0, 8.0, 7.0).total(), 7.4);
        assert_eq!(CategoryScores::new(0.0, 0.0, 0.0, 0.0, 0.0).total(), 0.0);
        assert_eq!(CategoryScores::new(10.0, 10.0, 10.0, 10.0, 10.0).total(), 10.0);
    }

    #[test]
    fn test_total_rounding() {
        // 7.666... -> 7.7
        let scores = CategoryScores::new(7.0, 7.0, 8.0, 8.0, 8.333);
        assert_eq!(scores.total(), 7.7);
    }

    #[test]
    fn test_total_stays_in_range() {
        for raw in [
            [0.0, 0.0, 0.0, 0.0, 0.0],
            [10.0, 10.0, 10.0, 10.0, 10.0],
            [3.3, 6.7, 9.9, 0.1, 5.5],
        ] {
            let total = CategoryScores::new(raw[0], raw[1], raw[2], raw[3], raw[4]).total();
            assert!((0.0..=10.0).contains(&total), "总分越界: {}", total);
        }
    }

    #[test]
    fn test_clamped_handles_out_of_range_and_nan() {
        let scores = CategoryScores::new(-3.0, 12.0, f64::NAN, 5.0, 10.0).clamped();
        assert_eq!(scores.innovation, 0.0);
        assert_eq!(scores.feasibility, 10.0);
        assert_eq!(scores.market_potential, 0.0);
        assert_eq!(scores.pitch_clarity, 5.0);
    }

    #[test]
    fn test_stored_record_total_computed_at_write_time() {
        let record = StoredEvaluationRecord::new(
            "车位侠",
            "王浩",
            CategoryScores::new(7.0, 7.0, 8.0, 8.0, 7.0),
            "方向清晰，执行有待验证。",
        );
        assert_eq!(record.total_score, record.scores.total());
        assert_eq!(record.total_score, 7.4);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_stored_record_schema_field_names() {
        let record = StoredEvaluationRecord::new(
            "车位侠",
            "王浩",
            CategoryScores::new(7.0, 7.0, 8.0, 8.0, 7.0),
            "总结。",
        );
        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "id",
            "timestamp",
            "startupName",
            "founderName",
            "totalScore",
            "innovation",
            "feasibility",
            "marketPotential",
            "pitchClarity",
            "problemSolutionFit",
            "feedbackSummary",
        ] {
            assert!(json.get(key).is_some(), "缺少字段: {}", key);
        }
    }
}
