use serde::Serialize;

use crate::geometry::{Point, Point3, ScalarField};

pub const DEFAULT_ARROW_LENGTH: f64 = 0.3;

/// Fixed-length arrow along the gradient direction, drawn flat at the height
/// of f at the start point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientSegment {
    pub start: Point3,
    pub end: Point3,
}

impl GradientSegment {
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

pub fn compute_arrow<F: ScalarField + ?Sized>(
    field: &F,
    point: Point,
    visual_length: f64,
) -> GradientSegment {
    let (dfdx, dfdy) = field.gradient_at(point);
    let z = field.value_at(point);
    let magnitude = dfdx.hypot(dfdy);

    // A vanishing or overflowing gradient has no usable direction.
    let (dx, dy) = if magnitude.is_finite() && magnitude > 0.0 {
        (
            dfdx / magnitude * visual_length,
            dfdy / magnitude * visual_length,
        )
    } else {
        (0.0, 0.0)
    };

    GradientSegment {
        start: Point3::new(point.x, point.y, z),
        end: Point3::new(point.x + dx, point.y + dy, z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FamilyId, FunctionInstance};

    #[test]
    fn test_stationary_point_collapses() {
        let inst = FunctionInstance::new(FamilyId::Saddle, [("a", 1), ("b", 3)]).unwrap();
        let seg = compute_arrow(&inst, Point::new(0.0, 0.0), DEFAULT_ARROW_LENGTH);
        assert!(seg.is_degenerate());
        assert_eq!(seg.start, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_length_and_direction() {
        let inst = FunctionInstance::new(FamilyId::Saddle, [("a", 2), ("b", 1)]).unwrap();
        let p = Point::new(1.0, -1.0);
        let seg = compute_arrow(&inst, p, 0.3);

        let dx = seg.end.x - seg.start.x;
        let dy = seg.end.y - seg.start.y;
        assert!((dx.hypot(dy) - 0.3).abs() < 1e-12);
        // gradient (4, 2) points along (2, 1)
        assert!((dx / dy - 2.0).abs() < 1e-12);
        assert!(dx > 0.0 && dy > 0.0);
    }

    #[test]
    fn test_overflowing_gradient_collapses() {
        let inst =
            FunctionInstance::new(FamilyId::Exponential, [("a", 1), ("c", 1), ("d", 1)]).unwrap();
        let seg = compute_arrow(&inst, Point::new(800.0, 0.0), DEFAULT_ARROW_LENGTH);
        assert!(seg.is_degenerate());
        assert_eq!((seg.end.x, seg.end.y), (800.0, 0.0));
    }

    #[test]
    fn test_height_is_flat() {
        let inst = FunctionInstance::new(FamilyId::Saddle, [("a", 2), ("b", 1)]).unwrap();
        let seg = compute_arrow(&inst, Point::new(1.0, -1.0), 0.3);
        assert_eq!(seg.start.z, 1.0);
        assert_eq!(seg.end.z, 1.0);
    }
}
