use kurbo::{Line, Point};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};
use crate::color::Rgb;
use crate::error::{SketchError, SketchResult};

/// Drawing target for the pattern generators and the orchestrator.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn line(&mut self, line: Line) -> SketchResult<()>;
    fn set_stroke(&mut self, color: Rgb) -> SketchResult<()>;
    fn set_stroke_weight(&mut self, weight: f64) -> SketchResult<()>;
    /// Opaque fill of the whole surface.
    fn background(&mut self, color: Rgb) -> SketchResult<()>;
    /// Translucent fill of the whole surface; `alpha` is in `[0, 1]`.
    fn overlay(&mut self, color: Rgb, alpha: f64) -> SketchResult<()>;
    fn resize(&mut self, width: f64, height: f64) -> SketchResult<()>;

    /// Clamps a point to the pixel bounds of the surface.
    fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.width().max(0.0)), p.y.clamp(0.0, self.height().max(0.0)))
    }
}

/// A `<canvas>` element and its 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    stroke: Rgb,
    stroke_weight: f64,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> SketchResult<Self> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| SketchError::Canvas("2d context not supported".into()))?
            .dyn_into()
            .map_err(|_| SketchError::Canvas("context is not 2d".into()))?;
        Ok(CanvasSurface { canvas, ctx, stroke: Rgb::BLACK, stroke_weight: 1.0 })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    fn apply_stroke_state(&self) {
        self.ctx.set_stroke_style_str(&self.stroke.to_css());
        self.ctx.set_line_width(self.stroke_weight);
    }

    fn fill_all(&self, css: &str) {
        self.ctx.save();
        self.ctx.set_fill_style_str(css);
        self.ctx.fill_rect(0.0, 0.0, self.width(), self.height());
        self.ctx.restore();
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    fn line(&mut self, line: Line) -> SketchResult<()> {
        self.ctx.begin_path();
        self.ctx.move_to(line.p0.x, line.p0.y);
        self.ctx.line_to(line.p1.x, line.p1.y);
        self.ctx.stroke();
        Ok(())
    }

    fn set_stroke(&mut self, color: Rgb) -> SketchResult<()> {
        self.stroke = color;
        self.apply_stroke_state();
        Ok(())
    }

    fn set_stroke_weight(&mut self, weight: f64) -> SketchResult<()> {
        self.stroke_weight = weight;
        self.apply_stroke_state();
        Ok(())
    }

    fn background(&mut self, color: Rgb) -> SketchResult<()> {
        self.fill_all(&color.to_css());
        Ok(())
    }

    fn overlay(&mut self, color: Rgb, alpha: f64) -> SketchResult<()> {
        self.fill_all(&color.to_css_alpha(alpha));
        Ok(())
    }

    fn resize(&mut self, width: f64, height: f64) -> SketchResult<()> {
        self.canvas.set_width(width.max(0.0) as u32);
        self.canvas.set_height(height.max(0.0) as u32);
        // Resizing a canvas resets its context state.
        self.apply_stroke_state();
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Line(Line),
    Stroke(Rgb),
    StrokeWeight(f64),
    Background(Rgb),
    Overlay(Rgb, f64),
    Resize(f64, f64),
}

/// Headless surface that records every call.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        RecordingSurface { width, height, ops: Vec::new() }
    }

    pub fn lines(&self) -> Vec<Line> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Line(l) => Some(*l),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn line(&mut self, line: Line) -> SketchResult<()> {
        self.ops.push(Op::Line(line));
        Ok(())
    }

    fn set_stroke(&mut self, color: Rgb) -> SketchResult<()> {
        self.ops.push(Op::Stroke(color));
        Ok(())
    }

    fn set_stroke_weight(&mut self, weight: f64) -> SketchResult<()> {
        self.ops.push(Op::StrokeWeight(weight));
        Ok(())
    }

    fn background(&mut self, color: Rgb) -> SketchResult<()> {
        self.ops.push(Op::Background(color));
        Ok(())
    }

    fn overlay(&mut self, color: Rgb, alpha: f64) -> SketchResult<()> {
        self.ops.push(Op::Overlay(color, alpha));
        Ok(())
    }

    fn resize(&mut self, width: f64, height: f64) -> SketchResult<()> {
        self.width = width;
        self.height = height;
        self.ops.push(Op::Resize(width, height));
        Ok(())
    }
}
