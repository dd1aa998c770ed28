pub mod arrow;
pub mod catalog;
pub mod checker;
pub mod error;
pub mod expr;
pub mod geometry;
pub mod sampler;
pub mod session;

pub use arrow::{compute_arrow, GradientSegment, DEFAULT_ARROW_LENGTH};
pub use catalog::{
    Catalog, CoefficientRule, Coefficients, FamilyId, FunctionFamily, FunctionInstance, Templates,
};
pub use checker::{check, CheckOutcome, GRADING_TOLERANCE};
pub use error::{GradError, GradResult, Span};
pub use geometry::{Point, Point3, ScalarField};
pub use sampler::{sample, SamplingOptions, SurfaceGrid, MAX_SAMPLES_PER_AXIS};
pub use session::{
    Exploration, Feedback, PosedQuestion, Question, QuestionSession, QuestionView, RenderPayload,
    SessionConfig, SessionState, SessionStats, MAX_POINT_RANGE,
};
