//! Recursive branch generators.
//!
//! Each generator fans `count` segments out of the origin and lets every
//! segment grow children until the depth budget runs out. All endpoints are
//! clamped to the surface before they are drawn or grown from.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_6, TAU};
use kurbo::{Line, Point, Vec2};
use serde::{Deserialize, Serialize};
use crate::error::{SketchError, SketchResult};
use crate::random::RandomSource;
use crate::surface::Surface;

/// Extra branches, length and depth a click adds on top of the hover pattern.
pub const CLICK_EXTRA_COUNT: u32 = 5;
pub const CLICK_EXTRA_LENGTH: f64 = 30.0;
pub const CLICK_EXTRA_DEPTH: u32 = 2;

const RIGHT_ANGLES: [f64; 2] = [FRAC_PI_2, -FRAC_PI_2];

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
    #[default]
    Root,
    RightAngle,
    Spiral,
}

impl TryFrom<u8> for Mode {
    type Error = SketchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Root),
            1 => Ok(Mode::RightAngle),
            2 => Ok(Mode::Spiral),
            other => Err(SketchError::InvalidMode(other)),
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> u8 {
        match mode {
            Mode::Root => 0,
            Mode::RightAngle => 1,
            Mode::Spiral => 2,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct PatternParams {
    pub x: f64,
    pub y: f64,
    pub count: u32,
    pub length_low: f64,
    pub length_high: f64,
    pub min_length: f64,
    pub depth: u32,
}

impl PatternParams {
    /// The denser burst drawn on click.
    pub fn amplified(&self) -> Self {
        PatternParams {
            count: self.count.saturating_add(CLICK_EXTRA_COUNT),
            length_low: self.length_low + CLICK_EXTRA_LENGTH,
            length_high: self.length_high + CLICK_EXTRA_LENGTH,
            min_length: self.min_length + CLICK_EXTRA_LENGTH,
            depth: self.depth.saturating_add(CLICK_EXTRA_DEPTH),
            ..*self
        }
    }
}

impl Mode {
    pub fn generate<S, R>(self, surface: &mut S, rng: &mut R, params: &PatternParams) -> SketchResult<()>
    where
        S: Surface + ?Sized,
        R: RandomSource,
    {
        match self {
            Mode::Root => draw_roots(surface, rng, params),
            Mode::RightAngle => draw_right_angle_lines(surface, rng, params),
            Mode::Spiral => draw_spiral_branches(surface, rng, params),
        }
    }
}

/// Draws one clamped segment and returns where it ended.
fn segment<S>(surface: &mut S, from: Point, angle: f64, length: f64) -> SketchResult<Point>
where
    S: Surface + ?Sized,
{
    let end = surface.clamp(from + Vec2::from_angle(angle) * length);
    surface.line(Line::new(from, end))?;
    Ok(end)
}

/// Top-level fan shared by all modes: one `max_length` per call, then
/// `count` segments with their own angle and length.
fn fan_out<S, R, A, G>(
    surface: &mut S,
    rng: &mut R,
    params: &PatternParams,
    mut angle: A,
    mut grow: G,
) -> SketchResult<()>
where
    S: Surface + ?Sized,
    R: RandomSource,
    A: FnMut(&mut R) -> f64,
    G: FnMut(&mut S, &mut R, Point, f64, f64, u32) -> SketchResult<()>,
{
    let origin = Point::new(params.x, params.y);
    let max_length = rng.range(params.length_low, params.length_high);
    for _ in 0..params.count {
        let a = angle(rng);
        let length = rng.range(params.min_length, max_length);
        let end = segment(surface, origin, a, length)?;
        grow(surface, rng, end, a, length, params.depth)?;
    }
    Ok(())
}

pub fn draw_roots<S, R>(surface: &mut S, rng: &mut R, params: &PatternParams) -> SketchResult<()>
where
    S: Surface + ?Sized,
    R: RandomSource,
{
    fan_out(surface, rng, params, |rng| rng.range(0.0, TAU), root_branch::<S, R>)
}

/// 2-3 children, each within ±30° of the parent, all 50-80% of its length.
pub fn root_branch<S, R>(surface: &mut S, rng: &mut R, from: Point, angle: f64, length: f64, depth: u32) -> SketchResult<()>
where
    S: Surface + ?Sized,
    R: RandomSource,
{
    if depth == 0 {
        return Ok(());
    }
    let children = rng.int_range(2, 4);
    let child_length = length * rng.range(0.5, 0.8);
    for _ in 0..children {
        let child_angle = angle + rng.range(-FRAC_PI_6, FRAC_PI_6);
        let end = segment(surface, from, child_angle, child_length)?;
        root_branch(surface, rng, end, child_angle, child_length, depth - 1)?;
    }
    Ok(())
}

pub fn draw_right_angle_lines<S, R>(surface: &mut S, rng: &mut R, params: &PatternParams) -> SketchResult<()>
where
    S: Surface + ?Sized,
    R: RandomSource,
{
    fan_out(surface, rng, params, |rng| rng.pick(&RIGHT_ANGLES), right_angle_branch::<S, R>)
}

/// Two children, each turned a quarter turn either way.
pub fn right_angle_branch<S, R>(surface: &mut S, rng: &mut R, from: Point, angle: f64, length: f64, depth: u32) -> SketchResult<()>
where
    S: Surface + ?Sized,
    R: RandomSource,
{
    if depth == 0 {
        return Ok(());
    }
    let child_length = length * rng.range(0.5, 0.8);
    for _ in 0..2 {
        let child_angle = angle + rng.pick(&RIGHT_ANGLES);
        let end = segment(surface, from, child_angle, child_length)?;
        right_angle_branch(surface, rng, end, child_angle, child_length, depth - 1)?;
    }
    Ok(())
}

pub fn draw_spiral_branches<S, R>(surface: &mut S, rng: &mut R, params: &PatternParams) -> SketchResult<()>
where
    S: Surface + ?Sized,
    R: RandomSource,
{
    fan_out(surface, rng, params, |rng| rng.range(0.0, TAU), spiral_branch::<S, R>)
}

/// 2-3 children sharing one rotation of 0.2-0.5 quarter turns and one
/// 60-90% length factor, both drawn fresh at every level.
pub fn spiral_branch<S, R>(surface: &mut S, rng: &mut R, from: Point, angle: f64, length: f64, depth: u32) -> SketchResult<()>
where
    S: Surface + ?Sized,
    R: RandomSource,
{
    if depth == 0 {
        return Ok(());
    }
    let child_length = length * rng.range(0.6, 0.9);
    let spiral_factor = rng.range(0.2, 0.5);
    let children = rng.int_range(2, 4);
    let child_angle = angle + spiral_factor * FRAC_PI_2;
    for _ in 0..children {
        let end = segment(surface, from, child_angle, child_length)?;
        spiral_branch(surface, rng, end, child_angle, child_length, depth - 1)?;
    }
    Ok(())
}
