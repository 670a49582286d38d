//! Event orchestration for one tracing canvas.
//!
//! A `Sketch` owns the surface, the color cycle and the viewport for a single
//! instance. The host feeds it setup, frame, pointer, click and resize events;
//! each public handler runs behind [`isolate`] so a failed draw is logged and
//! the next event is handled normally.

use kurbo::Point;
use serde::Serialize;
use crate::color::{ColorCycler, Rgb};
use crate::error::SketchResult;
use crate::logging::isolate;
use crate::options::SketchOptions;
use crate::random::RandomSource;
use crate::surface::Surface;
use crate::viewport::{Viewport, ViewportTracker, POINTER_PADDING};

/// Replaces the default fade on every frame tick.
pub trait FrameHook {
    fn on_frame(&mut self, surface: &mut dyn Surface, inside: bool) -> SketchResult<()>;
}

impl<F> FrameHook for F
where
    F: FnMut(&mut dyn Surface, bool) -> SketchResult<()>,
{
    fn on_frame(&mut self, surface: &mut dyn Surface, inside: bool) -> SketchResult<()> {
        self(surface, inside)
    }
}

/// Replaces the default pattern for pointer moves or clicks.
pub trait PointerHook {
    fn on_pointer(&mut self, surface: &mut dyn Surface, inside: bool, x: f64, y: f64) -> SketchResult<()>;
}

impl<F> PointerHook for F
where
    F: FnMut(&mut dyn Surface, bool, f64, f64) -> SketchResult<()>,
{
    fn on_pointer(&mut self, surface: &mut dyn Surface, inside: bool, x: f64, y: f64) -> SketchResult<()> {
        self(surface, inside, x, y)
    }
}

/// Caller overrides. A present hook fully replaces the built-in behavior.
#[derive(Default)]
pub struct Hooks {
    pub draw: Option<Box<dyn FrameHook>>,
    pub stroke: Option<Box<dyn PointerHook>>,
    pub click: Option<Box<dyn PointerHook>>,
}

impl Hooks {
    pub fn with_draw<H: FrameHook + 'static>(mut self, hook: H) -> Self {
        self.draw = Some(Box::new(hook));
        self
    }

    pub fn with_stroke<H: PointerHook + 'static>(mut self, hook: H) -> Self {
        self.stroke = Some(Box::new(hook));
        self
    }

    pub fn with_click<H: PointerHook + 'static>(mut self, hook: H) -> Self {
        self.click = Some(Box::new(hook));
        self
    }
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Uninitialized,
    Ready,
    Resizing,
}

/// Resolved per-instance drawing state, created by a successful setup.
struct Palette {
    background: Rgb,
    cycler: ColorCycler,
}

pub struct Sketch<S: Surface, R: RandomSource> {
    options: SketchOptions,
    hooks: Hooks,
    rng: R,
    surface: Option<S>,
    palette: Option<Palette>,
    viewport: ViewportTracker,
    pointer: Option<Point>,
    phase: Phase,
}

#[derive(Serialize)]
struct Snapshot {
    phase: Phase,
    viewport: Option<Viewport>,
    pointer: Option<(f64, f64)>,
    color: Option<Rgb>,
    direction: Option<f64>,
}

impl<S: Surface, R: RandomSource> Sketch<S, R> {
    pub fn new(options: SketchOptions, hooks: Hooks, rng: R) -> Self {
        Sketch {
            options,
            hooks,
            rng,
            surface: None,
            palette: None,
            viewport: ViewportTracker::default(),
            pointer: None,
            phase: Phase::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> &SketchOptions {
        &self.options
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Gives the surface back, leaving the sketch uninitialized.
    pub fn take_surface(&mut self) -> Option<S> {
        self.phase = Phase::Uninitialized;
        self.palette = None;
        self.surface.take()
    }

    pub fn current_color(&self) -> Option<Rgb> {
        self.palette.as_ref().map(|p| p.cycler.current())
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport.get()
    }

    /// Whether the last known pointer position is inside the padded viewport.
    pub fn pointer_inside(&self) -> bool {
        self.pointer
            .map_or(false, |p| self.viewport.is_inside(p.x, p.y, POINTER_PADDING))
    }

    pub fn snapshot(&self) -> String {
        let snapshot = Snapshot {
            phase: self.phase,
            viewport: self.viewport.get(),
            pointer: self.pointer.map(|p| (p.x, p.y)),
            color: self.current_color(),
            direction: self.palette.as_ref().map(|p| p.cycler.direction()),
        };
        serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn setup(&mut self, surface: S) -> bool {
        isolate("setup", || self.try_setup(surface))
    }

    pub fn frame(&mut self) -> bool {
        isolate("frame", || self.try_frame())
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) -> bool {
        isolate("pointer move", || self.try_pointer(x, y))
    }

    pub fn pointer_dragged(&mut self, x: f64, y: f64) -> bool {
        isolate("pointer drag", || self.try_pointer(x, y))
    }

    pub fn clicked(&mut self, x: f64, y: f64) -> bool {
        isolate("click", || self.try_click(x, y))
    }

    pub fn resized(&mut self, width: f64, height: f64) -> bool {
        isolate("resize", || self.try_resize(width, height))
    }

    fn try_setup(&mut self, mut surface: S) -> SketchResult<()> {
        let background = self.options.background_color.resolve()?;
        let drawing = self.options.drawing_color.resolve()?;

        surface.background(background)?;
        surface.set_stroke_weight(self.options.branch_stroke_weight)?;
        surface.set_stroke(drawing)?;

        self.viewport.measure(surface.width(), surface.height());
        self.palette = Some(Palette {
            background,
            cycler: ColorCycler::new(drawing, self.options.rgb_inc, self.options.color_range),
        });
        self.surface = Some(surface);
        self.phase = Phase::Ready;
        Ok(())
    }

    fn try_frame(&mut self) -> SketchResult<()> {
        let inside = self.pointer_inside();
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        if let Some(hook) = self.hooks.draw.as_mut() {
            return hook.on_frame(surface, inside);
        }
        if inside {
            let fade = if self.options.inverted_fade { Rgb::BLACK } else { Rgb::WHITE };
            surface.overlay(fade, self.options.fade_alpha())?;
        }
        Ok(())
    }

    fn try_pointer(&mut self, x: f64, y: f64) -> SketchResult<()> {
        self.pointer = Some(Point::new(x, y));
        if !self.viewport.is_inside(x, y, POINTER_PADDING) {
            return Ok(());
        }
        let (Some(surface), Some(palette)) = (self.surface.as_mut(), self.palette.as_mut()) else {
            return Ok(());
        };

        // A failing stroke hook leaves the color where it was; a failing
        // built-in pattern still advances it.
        let drawn = match self.hooks.stroke.as_mut() {
            Some(hook) => {
                hook.on_pointer(surface, true, x, y)?;
                Ok(())
            }
            None => self.options.mode.generate(surface, &mut self.rng, &self.options.base_params(x, y)),
        };

        if palette.cycler.is_active() {
            let next = palette.cycler.advance();
            surface.set_stroke(next)?;
        }
        drawn
    }

    fn try_click(&mut self, x: f64, y: f64) -> SketchResult<()> {
        self.pointer = Some(Point::new(x, y));
        if !self.viewport.is_inside(x, y, POINTER_PADDING) {
            return Ok(());
        }
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };

        if let Some(hook) = self.hooks.click.as_mut() {
            return hook.on_pointer(surface, true, x, y);
        }
        // A custom stroke owns the pointer entirely; no default burst.
        if self.hooks.stroke.is_some() {
            return Ok(());
        }
        let params = self.options.base_params(x, y).amplified();
        self.options.mode.generate(surface, &mut self.rng, &params)
    }

    fn try_resize(&mut self, width: f64, height: f64) -> SketchResult<()> {
        let (Some(surface), Some(palette)) = (self.surface.as_mut(), self.palette.as_ref()) else {
            return Ok(());
        };
        self.phase = Phase::Resizing;
        let resized = surface.resize(width, height);
        self.viewport.measure(surface.width(), surface.height());
        let painted = resized.and_then(|()| surface.background(palette.background));
        self.phase = Phase::Ready;
        painted
    }
}
