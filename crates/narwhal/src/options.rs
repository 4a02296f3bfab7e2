use crate::error::{Diagnostic, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How the seed coordinates are derived from the level rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One horizontal band per level, top to bottom.
    #[default]
    Row,
    /// One concentric ring per level around the canvas center.
    Radial,
}

impl std::str::FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "row" | "rows" => Ok(Self::Row),
            "radial" => Ok(Self::Radial),
            other => Err(Error::InvalidOption {
                key: "strategy".to_string(),
                message: format!("expected `row` or `radial`, got `{other}`"),
            }),
        }
    }
}

/// Layout configuration. JSON keys are camelCase (`K` and `C` keep their physics names).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Spring constant for edge attraction.
    #[serde(rename = "K")]
    pub spring: f64,
    /// Repulsion constant (`C / d²`).
    #[serde(rename = "C")]
    pub repulsion: f64,
    /// Velocity retention per iteration, strictly between 0 and 1.
    pub damping: f64,
    pub iterations: usize,
    /// Spring rest length, also the floor of the pairwise overlap spacing.
    pub min_dist: f64,
    pub default_node_width: f64,
    pub default_node_height: f64,
    pub container_width: f64,
    pub container_height: f64,
    pub container_padding: f64,
    /// Minimum vertical distance between a parent and each of its children.
    pub level_offset: f64,
    /// A child moves `1 / level_coef` of the way towards its parents' mean x per repair pass.
    pub level_coef: f64,
    pub strategy: Strategy,
    /// Ring count cap for [`Strategy::Radial`]; deeper levels share the outermost ring.
    pub radial_levels: usize,
    /// Whether relation edges pull their endpoints together like dependency edges.
    pub relation_attraction: bool,
    pub max_velocity: Option<f64>,
    /// Repulsion multiplier applied while two node footprints overlap.
    pub overlap_scale: f64,
    /// Stop relaxing once no node moves further than this in one iteration.
    pub convergence_epsilon: Option<f64>,
    /// Upper bound on post-relaxation repair passes.
    pub settle_passes: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            spring: 0.05,
            repulsion: 20_000.0,
            damping: 0.85,
            iterations: 300,
            min_dist: 100.0,
            default_node_width: 80.0,
            default_node_height: 40.0,
            container_width: 800.0,
            container_height: 600.0,
            container_padding: 20.0,
            level_offset: 100.0,
            level_coef: 4.0,
            strategy: Strategy::Row,
            radial_levels: 6,
            relation_attraction: false,
            max_velocity: Some(50.0),
            overlap_scale: 2.0,
            convergence_epsilon: None,
            settle_passes: 500,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsPatch {
    #[serde(rename = "K")]
    spring: Option<f64>,
    #[serde(rename = "C")]
    repulsion: Option<f64>,
    damping: Option<f64>,
    iterations: Option<usize>,
    min_dist: Option<f64>,
    default_node_width: Option<f64>,
    default_node_height: Option<f64>,
    container_width: Option<f64>,
    container_height: Option<f64>,
    container_padding: Option<f64>,
    level_offset: Option<f64>,
    level_coef: Option<f64>,
    strategy: Option<Strategy>,
    radial_levels: Option<usize>,
    relation_attraction: Option<bool>,
    max_velocity: Option<f64>,
    overlap_scale: Option<f64>,
    convergence_epsilon: Option<f64>,
    settle_passes: Option<usize>,
    #[serde(flatten)]
    unknown: BTreeMap<String, Value>,
}

impl LayoutOptions {
    /// Builds options from a JSON object, starting from the defaults.
    ///
    /// Unknown keys are ignored with a warning and reported as [`Diagnostic::UnknownOption`];
    /// malformed or out-of-range values are errors.
    pub fn from_json(value: &Value) -> Result<(Self, Vec<Diagnostic>)> {
        let mut opts = Self::default();
        let diagnostics = opts.merge_json(value)?;
        Ok((opts, diagnostics))
    }

    pub fn from_json_str(text: &str) -> Result<(Self, Vec<Diagnostic>)> {
        let value: Value = serde_json::from_str(text).map_err(|err| Error::InvalidOption {
            key: "<document>".to_string(),
            message: err.to_string(),
        })?;
        Self::from_json(&value)
    }

    /// Overrides the fields present in `value`, then re-validates the whole set.
    pub fn merge_json(&mut self, value: &Value) -> Result<Vec<Diagnostic>> {
        if !value.is_object() {
            return Err(Error::InvalidOption {
                key: "<document>".to_string(),
                message: "layout options must be a JSON object".to_string(),
            });
        }
        let patch = OptionsPatch::deserialize(value).map_err(|err| Error::InvalidOption {
            key: "<document>".to_string(),
            message: err.to_string(),
        })?;

        let mut diagnostics = Vec::new();
        for key in patch.unknown.keys() {
            tracing::warn!(key = key.as_str(), "unknown layout option ignored");
            diagnostics.push(Diagnostic::UnknownOption { key: key.clone() });
        }

        macro_rules! apply {
            ($target:ident, $patch:ident; $($field:ident),* $(,)?) => {
                $(if let Some(v) = $patch.$field {
                    $target.$field = v;
                })*
            };
        }
        apply!(
            self, patch;
            spring,
            repulsion,
            damping,
            iterations,
            min_dist,
            default_node_width,
            default_node_height,
            container_width,
            container_height,
            container_padding,
            level_offset,
            level_coef,
            strategy,
            radial_levels,
            relation_attraction,
            overlap_scale,
            settle_passes,
        );
        if patch.max_velocity.is_some() {
            self.max_velocity = patch.max_velocity;
        }
        if patch.convergence_epsilon.is_some() {
            self.convergence_epsilon = patch.convergence_epsilon;
        }

        self.validate()?;
        Ok(diagnostics)
    }

    pub fn validate(&self) -> Result<()> {
        fn invalid(key: &str, message: impl Into<String>) -> Error {
            Error::InvalidOption {
                key: key.to_string(),
                message: message.into(),
            }
        }
        fn finite_non_negative(key: &str, v: f64) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(invalid(key, format!("expected a finite non-negative number, got {v}")))
            }
        }
        fn finite_positive(key: &str, v: f64) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(invalid(key, format!("expected a finite positive number, got {v}")))
            }
        }

        finite_non_negative("K", self.spring)?;
        finite_non_negative("C", self.repulsion)?;
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(invalid(
                "damping",
                format!("expected a value in (0, 1), got {}", self.damping),
            ));
        }
        if self.iterations == 0 {
            return Err(invalid("iterations", "expected a positive integer"));
        }
        finite_positive("minDist", self.min_dist)?;
        finite_positive("defaultNodeWidth", self.default_node_width)?;
        finite_positive("defaultNodeHeight", self.default_node_height)?;
        finite_positive("containerWidth", self.container_width)?;
        finite_positive("containerHeight", self.container_height)?;
        finite_non_negative("containerPadding", self.container_padding)?;
        if 2.0 * self.container_padding >= self.container_width.min(self.container_height) {
            return Err(invalid(
                "containerPadding",
                "padding leaves no room inside the container",
            ));
        }
        finite_non_negative("levelOffset", self.level_offset)?;
        if !(self.level_coef.is_finite() && self.level_coef >= 1.0) {
            return Err(invalid(
                "levelCoef",
                format!("expected a finite number >= 1, got {}", self.level_coef),
            ));
        }
        if self.radial_levels == 0 {
            return Err(invalid("radialLevels", "expected a positive integer"));
        }
        if let Some(v) = self.max_velocity {
            finite_positive("maxVelocity", v)?;
        }
        finite_non_negative("overlapScale", self.overlap_scale)?;
        if let Some(v) = self.convergence_epsilon {
            finite_positive("convergenceEpsilon", v)?;
        }
        Ok(())
    }

    pub(crate) fn inner_width(&self) -> f64 {
        self.container_width - 2.0 * self.container_padding
    }

    pub(crate) fn inner_height(&self) -> f64 {
        self.container_height - 2.0 * self.container_padding
    }
}
