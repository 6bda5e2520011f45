use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};

/// Side length, in pixels, of the square drawing canvas case images are shown on.
pub const CANVAS_SIDE: usize = 448;

/// Added to the Dice denominator so two empty masks score 0.0 instead of NaN.
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// What to do when the annotation and reference grids differ in size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizePolicy {
    /// Fail with `DimensionMismatch`.
    #[default]
    Reject,
    /// Resample the annotation onto the reference grid before binarizing.
    ResizeAnnotation,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    #[default]
    Nearest,
    Bilinear,
}

/// Channel weighting used to collapse a colour reference to one channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LuminanceWeights {
    /// ITU-R BT.601: 0.299 R + 0.587 G + 0.114 B
    #[default]
    Bt601,
    /// ITU-R BT.709: 0.2126 R + 0.7152 G + 0.0722 B
    Bt709,
    /// Unweighted mean of the colour channels.
    Average,
}

impl LuminanceWeights {
    pub fn weights(self) -> [f32; 3] {
        match self {
            LuminanceWeights::Bt601 => [0.299, 0.587, 0.114],
            LuminanceWeights::Bt709 => [0.2126, 0.7152, 0.0722],
            LuminanceWeights::Average => [1.0 / 3.0; 3],
        }
    }

    #[inline]
    pub fn luma(self, r: f32, g: f32, b: f32) -> f32 {
        let [wr, wg, wb] = self.weights();
        wr * r + wg * g + wb * b
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub size_policy: SizePolicy,
    pub filter: ResizeFilter,
    pub luminance: LuminanceWeights,
    pub epsilon: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            size_policy: SizePolicy::Reject,
            filter: ResizeFilter::Nearest,
            luminance: LuminanceWeights::Bt601,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl ScoreConfig {
    /// Same-size inputs only.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Accepts annotations captured at canvas resolution and maps them onto
    /// the reference grid with nearest-neighbour sampling.
    pub fn canvas() -> Self {
        Self {
            size_policy: SizePolicy::ResizeAnnotation,
            ..Self::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: ScoreConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(ScoreError::invalid(format!(
                "epsilon must be a positive finite number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
