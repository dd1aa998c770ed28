use serde::{Deserialize, Serialize};

use crate::error::{GradError, GradResult};
use crate::geometry::{Point, ScalarField};

/// Slack so that a final sample landing on the window edge up to rounding
/// error is kept.
const EDGE_EPSILON: f64 = 1e-9;

/// Largest number of samples allowed along one axis.
pub const MAX_SAMPLES_PER_AXIS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    pub half_range: f64,
    pub step: f64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            half_range: 5.0,
            step: 0.3,
        }
    }
}

impl SamplingOptions {
    pub fn validate(&self) -> GradResult<()> {
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(GradError::Configuration(format!(
                "sampling step must be positive, got {}",
                self.step
            )));
        }
        if !(self.half_range > 0.0 && self.half_range.is_finite()) {
            return Err(GradError::Configuration(format!(
                "sampling half-range must be positive, got {}",
                self.half_range
            )));
        }
        let per_axis = 2.0 * self.half_range / self.step;
        if per_axis > MAX_SAMPLES_PER_AXIS as f64 {
            return Err(GradError::Configuration(format!(
                "sampling window of {} with step {} needs {per_axis:.0} samples per axis, \
                 more than {MAX_SAMPLES_PER_AXIS}",
                2.0 * self.half_range,
                self.step
            )));
        }
        Ok(())
    }
}

/// Function values on a rectangular window. `z[row][col]` is the value at
/// `(x[col], y[row])`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Vec<f64>>,
}

impl SurfaceGrid {
    pub fn rows(&self) -> usize {
        self.z.len()
    }

    pub fn cols(&self) -> usize {
        self.z.first().map_or(0, Vec::len)
    }
}

fn axis(center: f64, half_range: f64, step: f64) -> Vec<f64> {
    let start = center - half_range;
    let end = center + half_range;
    // Multiply instead of accumulating so the samples do not drift.
    (0..)
        .map(|i| start + i as f64 * step)
        .take_while(|v| *v <= end + EDGE_EPSILON)
        .collect()
}

/// Sample `field` on the square window centred on `center`.
pub fn sample<F: ScalarField + ?Sized>(
    field: &F,
    center: Point,
    options: SamplingOptions,
) -> GradResult<SurfaceGrid> {
    options.validate()?;

    let x = axis(center.x, options.half_range, options.step);
    let y = axis(center.y, options.half_range, options.step);
    let z = y
        .iter()
        .map(|&yi| x.iter().map(|&xi| field.value(xi, yi)).collect())
        .collect();

    Ok(SurfaceGrid { x, y, z })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FamilyId, FunctionInstance};

    fn saddle() -> FunctionInstance {
        FunctionInstance::new(FamilyId::Saddle, [("a", 2), ("b", 1)]).unwrap()
    }

    #[test]
    fn test_default_window_shape() {
        let center = Point::new(1.0, -2.0);
        let grid = sample(&saddle(), center, SamplingOptions::default()).unwrap();
        let step = 0.3;

        assert!((grid.x[0] - (center.x - 5.0)).abs() < step);
        assert!((grid.x[grid.x.len() - 1] - (center.x + 5.0)).abs() < step);
        assert!((grid.y[0] - (center.y - 5.0)).abs() < step);
        assert!((grid.y[grid.y.len() - 1] - (center.y + 5.0)).abs() < step);
        assert_eq!(grid.rows(), grid.y.len());
        assert_eq!(grid.cols(), grid.x.len());
        // 10 / 0.3 = 33.3, so 34 samples per axis
        assert_eq!(grid.x.len(), 34);
    }

    #[test]
    fn test_values_are_row_major_over_y() {
        let inst = saddle();
        let grid = sample(
            &inst,
            Point::default(),
            SamplingOptions {
                half_range: 1.0,
                step: 0.5,
            },
        )
        .unwrap();
        assert_eq!(grid.x, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(grid.y, grid.x);
        for (r, &yi) in grid.y.iter().enumerate() {
            for (c, &xi) in grid.x.iter().enumerate() {
                assert_eq!(grid.z[r][c], inst.value(xi, yi));
            }
        }
    }

    #[test]
    fn test_exact_end_is_included() {
        let xs = axis(0.0, 1.5, 0.3);
        assert_eq!(xs.len(), 11);
        assert!((xs[10] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let inst = saddle();
        let a = sample(&inst, Point::new(0.5, 0.5), SamplingOptions::default()).unwrap();
        let b = sample(&inst, Point::new(0.5, 0.5), SamplingOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let options = SamplingOptions {
            half_range: 5.0,
            step: 1e-6,
        };
        assert!(matches!(
            options.validate(),
            Err(GradError::Configuration(_))
        ));
        assert!(sample(&saddle(), Point::default(), options).is_err());

        let fine = SamplingOptions {
            half_range: 5.0,
            step: 0.02,
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let options = SamplingOptions {
            half_range: 5.0,
            step: 0.0,
        };
        assert!(sample(&saddle(), Point::default(), options).is_err());
    }
}
