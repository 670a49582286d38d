pub mod error;
pub mod logging;
pub mod random;
pub mod color;
pub mod viewport;
pub mod surface;
pub mod patterns;
pub mod options;
pub mod sketch;
pub mod component;

pub use color::{ColorCycler, ColorInput, Rgb};
pub use component::TracingCanvas;
pub use error::{SketchError, SketchResult};
pub use options::SketchOptions;
pub use patterns::{Mode, PatternParams};
pub use sketch::{FrameHook, Hooks, PointerHook, Sketch};
pub use surface::{CanvasSurface, RecordingSurface, Surface};
pub use viewport::Viewport;
