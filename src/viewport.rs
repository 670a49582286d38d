use serde::Serialize;

/// Margin used when no explicit padding is asked for.
pub const FRAME_PADDING: f64 = 10.0;
/// Margin used for every pointer and fade check.
pub const POINTER_PADDING: f64 = 20.0;

#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport { width, height }
    }

    pub fn contains(&self, x: f64, y: f64, padding: f64) -> bool {
        x >= -padding && x <= self.width + padding && y >= -padding && y <= self.height + padding
    }
}

/// Last measured size of the host container. Unmeasured means nothing is inside.
#[derive(Default, Clone, Debug)]
pub struct ViewportTracker {
    current: Option<Viewport>,
}

impl ViewportTracker {
    pub fn measure(&mut self, width: f64, height: f64) {
        self.current = Some(Viewport::new(width, height));
    }

    pub fn get(&self) -> Option<Viewport> {
        self.current
    }

    pub fn is_inside(&self, x: f64, y: f64, padding: f64) -> bool {
        self.current.map_or(false, |v| v.contains(x, y, padding))
    }

    pub fn is_inside_default(&self, x: f64, y: f64) -> bool {
        self.is_inside(x, y, FRAME_PADDING)
    }
}
