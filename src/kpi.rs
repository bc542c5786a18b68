use serde::{Deserialize, Serialize};

/// Achievement of a KPI against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiStatus {
    NotApplicable,
    Achieved,
    NotAchieved,
}

/// Renderer-neutral colour tag for a KPI result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticColor {
    Neutral,
    Positive,
    Negative,
}

impl SemanticColor {
    pub fn css_class(self) -> &'static str {
        match self {
            SemanticColor::Neutral => "neutral",
            SemanticColor::Positive => "positive",
            SemanticColor::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiResult {
    pub status: KpiStatus,
    pub deviation_text: String,
    pub formatted_value: String,
    pub formatted_target: String,
    pub semantic_color: SemanticColor,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub value: f64,
    pub target: f64,
    #[serde(default = "default_higher_is_better")]
    pub higher_is_better: bool,
    #[serde(default)]
    pub is_percentage: bool,
}

fn default_higher_is_better() -> bool {
    true
}

const NOT_APPLICABLE: &str = "N/A";

/// Classifies `value` against `target` and formats both for display.
///
/// A zero target has no meaningful percentage deviation, so it always
/// yields [`KpiStatus::NotApplicable`]. Non-finite inputs are treated the
/// same way.
pub fn evaluate_kpi(value: f64, target: f64, higher_is_better: bool, is_percentage: bool) -> KpiResult {
    let formatted_value = format_number(value, is_percentage);
    let formatted_target = format_number(target, is_percentage);

    if target == 0.0 || !value.is_finite() || !target.is_finite() {
        return KpiResult {
            status: KpiStatus::NotApplicable,
            deviation_text: NOT_APPLICABLE.to_string(),
            formatted_value,
            formatted_target,
            semantic_color: SemanticColor::Neutral,
        };
    }

    let (achieved, deviation) = if higher_is_better {
        (value >= target, (value - target) / target * 100.0)
    } else {
        (value <= target, (target - value) / target * 100.0)
    };

    let (status, sign, semantic_color) = if achieved {
        (KpiStatus::Achieved, '+', SemanticColor::Positive)
    } else {
        (KpiStatus::NotAchieved, '-', SemanticColor::Negative)
    };

    KpiResult {
        status,
        deviation_text: format!("{sign}{:.1}%", deviation.abs()),
        formatted_value,
        formatted_target,
        semantic_color,
    }
}

fn format_number(number: f64, is_percentage: bool) -> String {
    if !number.is_finite() {
        return NOT_APPLICABLE.to_string();
    }
    if is_percentage {
        format!("{number:.1}%")
    } else {
        format!("{number:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_target_is_not_applicable() {
        for value in [-5.0, 0.0, 42.0, 1e9] {
            let result = evaluate_kpi(value, 0.0, true, false);
            assert_eq!(result.status, KpiStatus::NotApplicable);
            assert_eq!(result.deviation_text, "N/A");
            assert_eq!(result.semantic_color, SemanticColor::Neutral);
        }
        let lower = evaluate_kpi(3.0, 0.0, false, true);
        assert_eq!(lower.status, KpiStatus::NotApplicable);
        assert_eq!(lower.formatted_target, "0.0%");
    }

    #[test]
    fn value_equal_to_target_is_achieved() {
        let result = evaluate_kpi(100.0, 100.0, true, false);
        assert_eq!(result.status, KpiStatus::Achieved);
        assert_eq!(result.deviation_text, "+0.0%");
        assert_eq!(result.semantic_color, SemanticColor::Positive);
    }

    #[test]
    fn higher_is_better_over_target() {
        let result = evaluate_kpi(120.0, 100.0, true, false);
        assert_eq!(result.status, KpiStatus::Achieved);
        assert_eq!(result.deviation_text, "+20.0%");
        assert_eq!(result.formatted_value, "120.0");
        assert_eq!(result.formatted_target, "100.0");
    }

    #[test]
    fn higher_is_better_under_target() {
        let result = evaluate_kpi(75.0, 100.0, true, false);
        assert_eq!(result.status, KpiStatus::NotAchieved);
        assert_eq!(result.deviation_text, "-25.0%");
        assert_eq!(result.semantic_color, SemanticColor::Negative);
    }

    #[test]
    fn lower_is_better_under_target_is_positive() {
        let result = evaluate_kpi(80.0, 100.0, false, false);
        assert_eq!(result.status, KpiStatus::Achieved);
        assert_eq!(result.deviation_text, "+20.0%");
    }

    #[test]
    fn lower_is_better_over_target_is_negative() {
        let result = evaluate_kpi(120.0, 100.0, false, false);
        assert_eq!(result.status, KpiStatus::NotAchieved);
        assert_eq!(result.deviation_text, "-20.0%");
        assert_eq!(result.semantic_color, SemanticColor::Negative);
    }

    #[test]
    fn percentage_formatting_rounds_to_one_decimal() {
        let result = evaluate_kpi(55.26, 50.0, true, true);
        assert_eq!(result.formatted_value, "55.3%");
        assert_eq!(result.formatted_target, "50.0%");
        assert_eq!(result.status, KpiStatus::Achieved);
    }

    #[test]
    fn non_finite_inputs_are_not_applicable() {
        let nan = evaluate_kpi(f64::NAN, 10.0, true, false);
        assert_eq!(nan.status, KpiStatus::NotApplicable);
        assert_eq!(nan.formatted_value, "N/A");
        assert_eq!(nan.formatted_target, "10.0");

        let inf = evaluate_kpi(10.0, f64::INFINITY, false, false);
        assert_eq!(inf.status, KpiStatus::NotApplicable);
        assert_eq!(inf.formatted_target, "N/A");
    }

    #[test]
    fn evaluate_request_defaults() {
        let request: EvaluateRequest = serde_json::from_str(r#"{"value": 1, "target": 2}"#).unwrap();
        assert!(request.higher_is_better);
        assert!(!request.is_percentage);
    }
}
