use serde::Serialize;

use crate::expr;
use crate::geometry::Point;

/// Absolute tolerance used when grading a partial derivative.
pub const GRADING_TOLERANCE: f64 = 0.05;

/// Outcome of grading one learner expression against one analytic value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub matches: bool,
    pub user_value: Option<f64>,
    /// Why evaluation failed, when it did. A failure always means `matches == false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Evaluate `user_expr` at the question's own `point` and compare it with
/// `correct_value`.
pub fn check(user_expr: &str, point: Point, correct_value: f64, tolerance: f64) -> CheckOutcome {
    match expr::evaluate(user_expr, point) {
        Ok(user_value) => CheckOutcome {
            matches: (user_value - correct_value).abs() < tolerance,
            user_value: Some(user_value),
            diagnostic: None,
        },
        Err(e) => CheckOutcome {
            matches: false,
            user_value: None,
            diagnostic: Some(e.to_string()),
        },
    }
}
