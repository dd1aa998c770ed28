//! Built-in function families and their concrete instances.
//!
//! Each family is a tag plus hand-derived closed forms. An instance is a
//! family tag and a coefficient record; evaluation and both partial
//! derivatives are plain functions keyed by the tag.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GradError, GradResult};
use crate::geometry::ScalarField;

// ---------------------------------------------------------------------------
// FamilyId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyId {
    Quadratic,
    Exponential,
    Sinusoidal,
    Saddle,
}

impl FamilyId {
    pub const ALL: [FamilyId; 4] = [
        Self::Quadratic,
        Self::Exponential,
        Self::Sinusoidal,
        Self::Saddle,
    ];

    /// Coefficient names every instance of this family must carry.
    pub fn coefficient_names(self) -> &'static [&'static str] {
        match self {
            Self::Quadratic => &["a", "b", "c", "d", "e"],
            Self::Exponential => &["a", "c", "d"],
            Self::Sinusoidal => &["a", "b", "c"],
            Self::Saddle => &["a", "b"],
        }
    }

    /// Formula templates, written in the learner expression grammar so the
    /// rendered text can be evaluated back.
    pub fn templates(self) -> Templates {
        match self {
            Self::Quadratic => Templates {
                function: "{a}*x^2 + {b}*x*y + {c}*y^2 + {d}*x + {e}*y",
                partial_x: "{2a}*x + {b}*y + {d}",
                partial_y: "{b}*x + {2c}*y + {e}",
            },
            Self::Exponential => Templates {
                function: "{a}*exp(x) + {c}*exp(y) + {d}",
                partial_x: "{a}*exp(x)",
                partial_y: "{c}*exp(y)",
            },
            Self::Sinusoidal => Templates {
                function: "sin({a}*x) + cos({b}*y) + {c}",
                partial_x: "{a}*cos({a}*x)",
                partial_y: "{-b}*sin({b}*y)",
            },
            Self::Saddle => Templates {
                function: "{a}*x^2 - {b}*y^2",
                partial_x: "{2a}*x",
                partial_y: "{-2b}*y",
            },
        }
    }

    /// One line per variable describing how the partial is obtained.
    fn derivation_notes(self) -> (&'static str, &'static str) {
        match self {
            Self::Quadratic => (
                "hold y constant: d/dx(a*x^2) = 2a*x, d/dx(b*x*y) = b*y, d/dx(d*x) = d; the y-only terms vanish",
                "hold x constant: d/dy(b*x*y) = b*x, d/dy(c*y^2) = 2c*y, d/dy(e*y) = e; the x-only terms vanish",
            ),
            Self::Exponential => (
                "hold y constant: d/dx(a*exp(x)) = a*exp(x); c*exp(y) and d are constants",
                "hold x constant: d/dy(c*exp(y)) = c*exp(y); a*exp(x) and d are constants",
            ),
            Self::Sinusoidal => (
                "chain rule with y held constant: d/dx(sin(a*x)) = a*cos(a*x)",
                "chain rule with x held constant: d/dy(cos(b*y)) = -b*sin(b*y)",
            ),
            Self::Saddle => (
                "hold y constant: d/dx(a*x^2) = 2a*x; b*y^2 is a constant",
                "hold x constant: d/dy(-b*y^2) = -2b*y; a*x^2 is a constant",
            ),
        }
    }

    /// Values for the derived placeholders (`{2a}`, `{-b}`, ...) used by the
    /// partial-derivative templates.
    fn derived(self, coefficients: &Coefficients) -> Vec<(String, i64)> {
        let k = |name: &str| coefficients.get(name).unwrap_or(0);
        match self {
            Self::Quadratic => vec![("2a".into(), 2 * k("a")), ("2c".into(), 2 * k("c"))],
            Self::Exponential => Vec::new(),
            Self::Sinusoidal => vec![("-b".into(), -k("b"))],
            Self::Saddle => vec![("2a".into(), 2 * k("a")), ("-2b".into(), -2 * k("b"))],
        }
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quadratic => write!(f, "quadratic"),
            Self::Exponential => write!(f, "exponential"),
            Self::Sinusoidal => write!(f, "sinusoidal"),
            Self::Saddle => write!(f, "saddle"),
        }
    }
}

impl std::str::FromStr for FamilyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quadratic" => Ok(Self::Quadratic),
            "exponential" => Ok(Self::Exponential),
            "sinusoidal" => Ok(Self::Sinusoidal),
            "saddle" => Ok(Self::Saddle),
            _ => Err(format!("invalid family: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Templates {
    pub function: &'static str,
    pub partial_x: &'static str,
    pub partial_y: &'static str,
}

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Coefficients(BTreeMap<String, i64>);

impl Coefficients {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i64) {
        self.0.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<const N: usize> From<[(&str, i64); N]> for Coefficients {
    fn from(pairs: [(&str, i64); N]) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<BTreeMap<String, i64>> for Coefficients {
    fn from(map: BTreeMap<String, i64>) -> Self {
        Self(map)
    }
}

impl fmt::Display for Coefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Replace every `{name}` placeholder whose name matches exactly. Unknown
/// placeholders are left as written. Afterwards `+ -n` becomes `- n` and
/// `- -n` becomes `+ n`.
pub fn render_template<'a>(
    template: &str,
    values: impl IntoIterator<Item = (&'a str, i64)> + Clone,
) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match values.clone().into_iter().find(|(k, _)| *k == name) {
                    Some((_, v)) => out.push_str(&v.to_string()),
                    None => out.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out.replace("+ -", "- ").replace("- -", "+ ")
}

fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                names.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    names
}

// ---------------------------------------------------------------------------
// CoefficientRule / FunctionFamily
// ---------------------------------------------------------------------------

/// Uniform integer range for one coefficient, optionally skipping one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoefficientRule {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
    pub exclude: Option<i64>,
}

impl CoefficientRule {
    pub const fn new(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            min,
            max,
            exclude: None,
        }
    }

    pub const fn non_zero(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            min,
            max,
            exclude: Some(0),
        }
    }

    pub fn admits(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value) && self.exclude != Some(value)
    }

    fn validate(&self) -> GradResult<()> {
        if self.min > self.max {
            return Err(GradError::Configuration(format!(
                "coefficient '{}' has empty range [{}, {}]",
                self.name, self.min, self.max
            )));
        }
        if self.min == self.max && self.exclude == Some(self.min) {
            return Err(GradError::Configuration(format!(
                "coefficient '{}' excludes the only value in its range",
                self.name
            )));
        }
        Ok(())
    }

    /// Draw uniformly from `[min, max]`, re-drawing while the excluded value
    /// comes up. Only call on a validated rule.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        loop {
            let v = rng.gen_range(self.min..=self.max);
            if self.exclude != Some(v) {
                return v;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionFamily {
    pub id: FamilyId,
    pub name: &'static str,
    pub template: &'static str,
    pub rules: Vec<CoefficientRule>,
}

impl FunctionFamily {
    pub fn new(id: FamilyId, name: &'static str, rules: Vec<CoefficientRule>) -> Self {
        Self {
            id,
            name,
            template: id.templates().function,
            rules,
        }
    }

    fn validate(&self) -> GradResult<()> {
        for rule in &self.rules {
            rule.validate()?;
        }
        for name in self.id.coefficient_names() {
            if !self.rules.iter().any(|r| r.name == *name) {
                return Err(GradError::Configuration(format!(
                    "family '{}' has no rule for coefficient '{name}'",
                    self.id
                )));
            }
        }

        // Every placeholder must resolve, either to a coefficient or to a
        // derived value.
        let probe: Coefficients = self
            .id
            .coefficient_names()
            .iter()
            .map(|n| ((*n).to_string(), 1))
            .collect::<BTreeMap<_, _>>()
            .into();
        let derived = self.id.derived(&probe);
        let templates = self.id.templates();
        for template in [templates.function, templates.partial_x, templates.partial_y] {
            for name in placeholders(template) {
                let known =
                    probe.get(name).is_some() || derived.iter().any(|(k, _)| k == name);
                if !known {
                    return Err(GradError::Configuration(format!(
                        "family '{}' template uses unknown placeholder '{{{name}}}'",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Catalog {
    families: Vec<FunctionFamily>,
}

impl Catalog {
    /// The four built-in families.
    pub fn builtin() -> GradResult<Self> {
        Self::new(vec![
            FunctionFamily::new(
                FamilyId::Quadratic,
                "Quadratic",
                vec![
                    CoefficientRule::non_zero("a", -3, 3),
                    CoefficientRule::non_zero("b", -3, 3),
                    CoefficientRule::non_zero("c", -3, 3),
                    CoefficientRule::non_zero("d", -2, 2),
                    CoefficientRule::non_zero("e", -2, 2),
                ],
            ),
            FunctionFamily::new(
                FamilyId::Exponential,
                "Exponential",
                vec![
                    CoefficientRule::new("a", 1, 3),
                    CoefficientRule::new("c", 1, 3),
                    CoefficientRule::non_zero("d", -2, 2),
                ],
            ),
            FunctionFamily::new(
                FamilyId::Sinusoidal,
                "Sinusoidal",
                vec![
                    CoefficientRule::new("a", 1, 3),
                    CoefficientRule::new("b", 1, 3),
                    CoefficientRule::non_zero("c", -2, 2),
                ],
            ),
            FunctionFamily::new(
                FamilyId::Saddle,
                "Saddle",
                vec![CoefficientRule::new("a", 1, 3), CoefficientRule::new("b", 1, 3)],
            ),
        ])
    }

    /// Build a catalog, rejecting any misconfigured family up front.
    pub fn new(families: Vec<FunctionFamily>) -> GradResult<Self> {
        if families.is_empty() {
            return Err(GradError::Configuration("catalog has no families".into()));
        }
        for family in &families {
            family.validate()?;
        }
        Ok(Self { families })
    }

    pub fn families(&self) -> &[FunctionFamily] {
        &self.families
    }

    pub fn family(&self, id: FamilyId) -> GradResult<&FunctionFamily> {
        self.families
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| {
                GradError::Configuration(format!("family '{id}' is not in the catalog"))
            })
    }

    /// Pick a family uniformly at random.
    pub fn random_family<R: Rng + ?Sized>(&self, rng: &mut R) -> FamilyId {
        self.families[rng.gen_range(0..self.families.len())].id
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        id: FamilyId,
        rng: &mut R,
    ) -> GradResult<FunctionInstance> {
        let family = self.family(id)?;
        let mut coefficients = Coefficients::default();
        for rule in &family.rules {
            coefficients.insert(rule.name, rule.sample(rng));
        }
        debug!("generated {id} instance with {coefficients}");
        FunctionInstance::new(id, coefficients)
    }
}

// ---------------------------------------------------------------------------
// FunctionInstance
// ---------------------------------------------------------------------------

/// One concrete member of a family. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionInstance {
    family: FamilyId,
    coefficients: Coefficients,
}

impl FunctionInstance {
    /// Coefficients are not range-checked here, only required to be present,
    /// so callers may build degenerate instances on purpose.
    pub fn new(family: FamilyId, coefficients: impl Into<Coefficients>) -> GradResult<Self> {
        let coefficients = coefficients.into();
        for name in family.coefficient_names() {
            if coefficients.get(name).is_none() {
                return Err(GradError::Configuration(format!(
                    "{family} instance is missing coefficient '{name}'"
                )));
            }
        }
        Ok(Self {
            family,
            coefficients,
        })
    }

    pub fn family(&self) -> FamilyId {
        self.family
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    fn k(&self, name: &str) -> f64 {
        self.coefficients.get(name).unwrap_or(0) as f64
    }

    fn render(&self, template: &str) -> String {
        let derived = self.family.derived(&self.coefficients);
        let values: Vec<(&str, i64)> = self
            .coefficients
            .iter()
            .chain(derived.iter().map(|(k, v)| (k.as_str(), *v)))
            .collect();
        render_template(template, values)
    }

    /// f(x, y) with the coefficients substituted.
    pub fn formula(&self) -> String {
        self.render(self.family.templates().function)
    }

    /// Symbolic ∂f/∂x with the coefficients substituted.
    pub fn partial_x_formula(&self) -> String {
        self.render(self.family.templates().partial_x)
    }

    /// Symbolic ∂f/∂y with the coefficients substituted.
    pub fn partial_y_formula(&self) -> String {
        self.render(self.family.templates().partial_y)
    }

    pub fn derivation_notes(&self) -> (&'static str, &'static str) {
        self.family.derivation_notes()
    }
}

impl ScalarField for FunctionInstance {
    fn value(&self, x: f64, y: f64) -> f64 {
        match self.family {
            FamilyId::Quadratic => {
                let (a, b, c) = (self.k("a"), self.k("b"), self.k("c"));
                let (d, e) = (self.k("d"), self.k("e"));
                a * x * x + b * x * y + c * y * y + d * x + e * y
            }
            FamilyId::Exponential => self.k("a") * x.exp() + self.k("c") * y.exp() + self.k("d"),
            FamilyId::Sinusoidal => {
                (self.k("a") * x).sin() + (self.k("b") * y).cos() + self.k("c")
            }
            FamilyId::Saddle => self.k("a") * x * x - self.k("b") * y * y,
        }
    }

    fn partial_x(&self, x: f64, y: f64) -> f64 {
        match self.family {
            FamilyId::Quadratic => 2.0 * self.k("a") * x + self.k("b") * y + self.k("d"),
            FamilyId::Exponential => self.k("a") * x.exp(),
            FamilyId::Sinusoidal => {
                let a = self.k("a");
                a * (a * x).cos()
            }
            FamilyId::Saddle => 2.0 * self.k("a") * x,
        }
    }

    fn partial_y(&self, x: f64, y: f64) -> f64 {
        match self.family {
            FamilyId::Quadratic => self.k("b") * x + 2.0 * self.k("c") * y + self.k("e"),
            FamilyId::Exponential => self.k("c") * y.exp(),
            FamilyId::Sinusoidal => {
                let b = self.k("b");
                -b * (b * y).sin()
            }
            FamilyId::Saddle => -2.0 * self.k("b") * y,
        }
    }
}
