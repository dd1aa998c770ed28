//! Question lifecycle: `Idle -> Active -> Graded -> Active -> ...`.
//!
//! A session owns its random source, the catalog, the single live question
//! and the running stats. Every transition goes through `&mut self`, so the
//! caller serializes user actions.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::arrow::{compute_arrow, GradientSegment, DEFAULT_ARROW_LENGTH};
use crate::catalog::{Catalog, Coefficients, FamilyId, FunctionInstance};
use crate::checker::{check, CheckOutcome, GRADING_TOLERANCE};
use crate::error::{GradError, GradResult};
use crate::geometry::{Point, Point3, ScalarField};
use crate::sampler::{sample, SamplingOptions, SurfaceGrid};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Practice points, posed or explored, never leave `[-MAX_POINT_RANGE, MAX_POINT_RANGE]`.
pub const MAX_POINT_RANGE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tolerance: f64,
    /// Question points have integer coordinates in `[-point_range, point_range]`.
    pub point_range: u32,
    pub surface: SamplingOptions,
    pub arrow_length: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tolerance: GRADING_TOLERANCE,
            point_range: 2,
            surface: SamplingOptions::default(),
            arrow_length: DEFAULT_ARROW_LENGTH,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> GradResult<()> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(GradError::Configuration(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.point_range > MAX_POINT_RANGE {
            return Err(GradError::Configuration(format!(
                "point range must be at most {MAX_POINT_RANGE}, got {}",
                self.point_range
            )));
        }
        if !(self.arrow_length > 0.0 && self.arrow_length.is_finite()) {
            return Err(GradError::Configuration(format!(
                "arrow length must be positive, got {}",
                self.arrow_length
            )));
        }
        self.surface.validate()
    }
}

// ---------------------------------------------------------------------------
// Session data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Active,
    Graded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub attempted: u32,
    pub correct: u32,
}

impl SessionStats {
    pub fn accuracy(&self) -> Option<f64> {
        (self.attempted > 0).then(|| f64::from(self.correct) / f64::from(self.attempted))
    }
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: String,
    pub instance: FunctionInstance,
    pub point: Point,
    pub posed_at: DateTime<Utc>,
    answered: bool,
    correct: Option<bool>,
}

impl Question {
    fn new(instance: FunctionInstance, point: Point) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            instance,
            point,
            posed_at: Utc::now(),
            answered: false,
            correct: None,
        }
    }

    pub fn answered(&self) -> bool {
        self.answered
    }

    pub fn correct(&self) -> Option<bool> {
        self.correct
    }

    pub fn correct_gradient(&self) -> (f64, f64) {
        self.instance.gradient_at(self.point)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// What the UI shows when a question is posed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub family: FamilyId,
    pub template_text: &'static str,
    pub substituted_coefficients: Coefficients,
    pub formula: String,
    pub point: Point,
}

/// Plain geometry for an external renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    pub surface: SurfaceGrid,
    pub evaluation_point: Point3,
    pub gradient_arrow: GradientSegment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosedQuestion {
    pub question: QuestionView,
    pub render: RenderPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub dfdx_verdict: CheckOutcome,
    pub dfdy_verdict: CheckOutcome,
    #[serde(rename = "correctDfDx")]
    pub correct_dfdx: f64,
    #[serde(rename = "correctDfDy")]
    pub correct_dfdy: f64,
    pub correct: bool,
    pub solution_steps: Vec<String>,
    pub updated_stats: SessionStats,
}

/// Ad hoc look at a family outside the quiz flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exploration {
    pub family: FamilyId,
    pub formula: String,
    pub coefficients: Coefficients,
    pub point: Point,
    pub value: f64,
    pub dfdx: f64,
    pub dfdy: f64,
    pub render: RenderPayload,
}

// ---------------------------------------------------------------------------
// QuestionSession
// ---------------------------------------------------------------------------

pub struct QuestionSession<R: Rng> {
    rng: R,
    catalog: Catalog,
    config: SessionConfig,
    state: SessionState,
    question: Option<Question>,
    stats: SessionStats,
}

impl<R: Rng> QuestionSession<R> {
    /// Start a session over the built-in catalog. Fails fast on a bad config.
    pub fn new(rng: R, config: SessionConfig) -> GradResult<Self> {
        Self::with_catalog(rng, Catalog::builtin()?, config)
    }

    pub fn with_catalog(rng: R, catalog: Catalog, config: SessionConfig) -> GradResult<Self> {
        config.validate()?;
        Ok(Self {
            rng,
            catalog,
            config,
            state: SessionState::Idle,
            question: None,
            stats: SessionStats::default(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Drop the live question and zero the stats.
    pub fn reset(&mut self) {
        info!(
            attempted = self.stats.attempted,
            correct = self.stats.correct,
            "session reset"
        );
        self.question = None;
        self.stats = SessionStats::default();
        self.state = SessionState::Idle;
    }

    /// Pose a fresh question. Allowed from `Idle` and `Graded`.
    pub fn new_question(&mut self) -> GradResult<PosedQuestion> {
        if self.state == SessionState::Active {
            warn!("new question requested while one is still open");
            return Err(GradError::InvalidState(
                "the current question has not been graded yet".into(),
            ));
        }

        let family = self.catalog.random_family(&mut self.rng);
        let instance = self.catalog.generate(family, &mut self.rng)?;
        let point = Point::random(&mut self.rng, self.config.point_range);
        let render = self.render(&instance, point)?;

        let question = Question::new(instance, point);
        info!(question = %question.id, %family, %point, "question posed");
        let view = question_view(&question);

        self.question = Some(question);
        self.state = SessionState::Active;

        Ok(PosedQuestion {
            question: view,
            render,
        })
    }

    /// Move on from a graded question.
    pub fn skip(&mut self) -> GradResult<PosedQuestion> {
        if self.state != SessionState::Graded {
            warn!(state = ?self.state, "skip rejected");
            return Err(GradError::InvalidState(
                "only a graded question can be skipped".into(),
            ));
        }
        if let Some(q) = &self.question {
            info!(question = %q.id, "question skipped");
        }
        self.new_question()
    }

    /// Grade both partial derivatives of the live question.
    pub fn submit(&mut self, user_dfdx: &str, user_dfdy: &str) -> GradResult<Feedback> {
        if self.state != SessionState::Active {
            warn!(state = ?self.state, "submit rejected");
            return Err(GradError::InvalidState(match self.state {
                SessionState::Idle => "no question has been posed".into(),
                _ => "this question has already been graded".into(),
            }));
        }
        if user_dfdx.trim().is_empty() || user_dfdy.trim().is_empty() {
            return Err(GradError::Validation(
                "enter both partial derivatives before submitting".into(),
            ));
        }

        let tolerance = self.config.tolerance;
        let question = self
            .question
            .as_mut()
            .ok_or_else(|| GradError::InvalidState("no question has been posed".into()))?;

        let (correct_dfdx, correct_dfdy) = question.correct_gradient();
        let dfdx_verdict = check(user_dfdx, question.point, correct_dfdx, tolerance);
        let dfdy_verdict = check(user_dfdy, question.point, correct_dfdy, tolerance);
        let correct = dfdx_verdict.matches && dfdy_verdict.matches;

        question.answered = true;
        question.correct = Some(correct);
        self.stats.attempted += 1;
        if correct {
            self.stats.correct += 1;
        }
        self.state = SessionState::Graded;

        info!(
            question = %question.id,
            correct,
            attempted = self.stats.attempted,
            "question graded"
        );

        Ok(Feedback {
            dfdx_verdict,
            dfdy_verdict,
            correct_dfdx,
            correct_dfdy,
            correct,
            solution_steps: solution_steps(&question.instance, question.point),
            updated_stats: self.stats,
        })
    }

    pub fn question_view(&self) -> Option<QuestionView> {
        self.question.as_ref().map(question_view)
    }

    /// Renderer geometry for the live question.
    pub fn render_payload(&self) -> GradResult<RenderPayload> {
        let question = self
            .question
            .as_ref()
            .ok_or_else(|| GradError::InvalidState("no question has been posed".into()))?;
        self.render(&question.instance, question.point)
    }

    /// Generate a throwaway instance of `family` and describe it at `point`.
    /// The live question and the stats are left alone.
    pub fn explore(&mut self, family: FamilyId, point: Point) -> GradResult<Exploration> {
        let bound = f64::from(MAX_POINT_RANGE);
        if !(point.x.abs() <= bound && point.y.abs() <= bound) {
            return Err(GradError::Validation(format!(
                "exploration point {point} is outside [-{MAX_POINT_RANGE}, {MAX_POINT_RANGE}]"
            )));
        }
        let instance = self.catalog.generate(family, &mut self.rng)?;
        let render = self.render(&instance, point)?;
        let (dfdx, dfdy) = instance.gradient_at(point);
        Ok(Exploration {
            family,
            formula: instance.formula(),
            coefficients: instance.coefficients().clone(),
            point,
            value: instance.value_at(point),
            dfdx,
            dfdy,
            render,
        })
    }

    fn render(&self, instance: &FunctionInstance, point: Point) -> GradResult<RenderPayload> {
        Ok(RenderPayload {
            surface: sample(instance, point, self.config.surface)?,
            evaluation_point: Point3::new(point.x, point.y, instance.value_at(point)),
            gradient_arrow: compute_arrow(instance, point, self.config.arrow_length),
        })
    }
}

fn question_view(question: &Question) -> QuestionView {
    let family = question.instance.family();
    QuestionView {
        id: question.id.clone(),
        family,
        template_text: family.templates().function,
        substituted_coefficients: question.instance.coefficients().clone(),
        formula: question.instance.formula(),
        point: question.point,
    }
}

/// Print a value the way a learner would write it: integers without a
/// fractional part, everything else to four decimals.
pub fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.4}")
    }
}

/// Step-by-step derivation of both partials at `point`.
pub fn solution_steps(instance: &FunctionInstance, point: Point) -> Vec<String> {
    let (note_x, note_y) = instance.derivation_notes();
    let (dfdx, dfdy) = instance.gradient_at(point);
    let at = format!("({}, {})", format_value(point.x), format_value(point.y));
    vec![
        format!("f(x, y) = {}", instance.formula()),
        format!("∂f/∂x: {note_x}"),
        format!("∂f/∂x = {}", instance.partial_x_formula()),
        format!("∂f/∂x at {at} = {}", format_value(dfdx)),
        format!("∂f/∂y: {note_y}"),
        format!("∂f/∂y = {}", instance.partial_y_formula()),
        format!("∂f/∂y at {at} = {}", format_value(dfdy)),
        format!("∇f{at} = ({}, {})", format_value(dfdx), format_value(dfdy)),
    ]
}
