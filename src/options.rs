use serde::{Deserialize, Serialize};
use crate::color::ColorInput;
use crate::error::{SketchError, SketchResult};
use crate::patterns::{Mode, PatternParams};

/// Everything a caller can tune. Field names follow the JS option bag.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SketchOptions {
    /// Frame ticks per second.
    pub custom_frame_rate: f64,
    /// Fade overlay alpha per tick, out of 255.
    pub inc_fade: f64,
    pub max_branch_length_low: f64,
    pub max_branch_length_high: f64,
    pub min_root_length: f64,
    pub root_count: u32,
    pub branch_iterations: u32,
    pub branch_stroke_weight: f64,
    pub background_color: ColorInput,
    pub drawing_color: ColorInput,
    pub mode: Mode,
    pub rgb_inc: [f64; 3],
    pub color_range: f64,
    pub inverted_fade: bool,
}

impl Default for SketchOptions {
    fn default() -> Self {
        SketchOptions {
            custom_frame_rate: 2.0,
            inc_fade: 3.0,
            max_branch_length_low: 25.0,
            max_branch_length_high: 50.0,
            min_root_length: 10.0,
            root_count: 12,
            branch_iterations: 3,
            branch_stroke_weight: 0.9,
            background_color: ColorInput::from("#ffffff"),
            drawing_color: ColorInput::from("#000000"),
            mode: Mode::Root,
            rgb_inc: [0.0; 3],
            color_range: 0.0,
            inverted_fade: false,
        }
    }
}

impl SketchOptions {
    pub fn validate(&self) -> SketchResult<()> {
        if !self.custom_frame_rate.is_finite() || self.custom_frame_rate <= 0.0 {
            return Err(SketchError::InvalidOption {
                name: "customFrameRate",
                reason: format!("must be a positive number, got {}", self.custom_frame_rate),
            });
        }
        if !self.branch_stroke_weight.is_finite() || self.branch_stroke_weight < 0.0 {
            return Err(SketchError::InvalidOption {
                name: "branchStrokeWeight",
                reason: format!("must not be negative, got {}", self.branch_stroke_weight),
            });
        }
        Ok(())
    }

    /// Milliseconds between frame ticks.
    pub fn frame_interval_ms(&self) -> i32 {
        (1000.0 / self.custom_frame_rate).round().max(1.0) as i32
    }

    /// Fade overlay alpha in `[0, 1]`.
    pub fn fade_alpha(&self) -> f64 {
        (self.inc_fade / 255.0).clamp(0.0, 1.0)
    }

    /// Parameters of the light pattern drawn while the pointer moves.
    pub fn base_params(&self, x: f64, y: f64) -> PatternParams {
        PatternParams {
            x,
            y,
            count: self.root_count,
            length_low: self.max_branch_length_low,
            length_high: self.max_branch_length_high,
            min_length: self.min_root_length,
            depth: self.branch_iterations,
        }
    }
}
