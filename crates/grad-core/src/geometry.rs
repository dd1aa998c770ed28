use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point in the x-y practice plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Integer-valued point with both coordinates drawn uniformly from
    /// `[-range, range]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, range: u32) -> Self {
        let r = i64::from(range);
        Self {
            x: rng.gen_range(-r..=r) as f64,
            y: rng.gen_range(-r..=r) as f64,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A scalar function of two variables together with its exact partials.
///
/// The sampler and the arrow computer only need this contract, not the
/// catalog that produced the function.
pub trait ScalarField {
    /// Calculates f(x, y)
    fn value(&self, x: f64, y: f64) -> f64;

    /// Calculates ∂f/∂x
    fn partial_x(&self, x: f64, y: f64) -> f64;

    /// Calculates ∂f/∂y
    fn partial_y(&self, x: f64, y: f64) -> f64;

    fn value_at(&self, p: Point) -> f64 {
        self.value(p.x, p.y)
    }

    fn gradient_at(&self, p: Point) -> (f64, f64) {
        (self.partial_x(p.x, p.y), self.partial_y(p.x, p.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_point_is_integer_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = Point::random(&mut rng, 2);
            assert!((-2.0..=2.0).contains(&p.x));
            assert!((-2.0..=2.0).contains(&p.y));
            assert_eq!(p.x.fract(), 0.0);
            assert_eq!(p.y.fract(), 0.0);
        }
    }

    #[test]
    fn test_point_display() {
        assert_eq!(Point::new(1.0, -0.5).to_string(), "(1, -0.5)");
    }
}
