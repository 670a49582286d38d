use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent};
use crate::error::{describe_js, SketchError, SketchResult};
use crate::options::SketchOptions;
use crate::random::MathRandom;
use crate::sketch::{FrameHook, Hooks, PointerHook, Sketch};
use crate::surface::{CanvasSurface, Surface};

type CanvasSketch = Sketch<CanvasSurface, MathRandom>;

const PLACEHOLDER_TEXT: &str = "Loading…";

/// Numeric style properties that stay unitless, in CSS property form.
const UNITLESS_PROPERTIES: &[&str] = &[
    "animation-iteration-count",
    "aspect-ratio",
    "border-image-outset",
    "border-image-slice",
    "border-image-width",
    "box-flex",
    "box-flex-group",
    "box-ordinal-group",
    "column-count",
    "columns",
    "fill-opacity",
    "flex",
    "flex-grow",
    "flex-negative",
    "flex-order",
    "flex-positive",
    "flex-shrink",
    "flood-opacity",
    "font-weight",
    "grid-area",
    "grid-column",
    "grid-column-end",
    "grid-column-span",
    "grid-column-start",
    "grid-row",
    "grid-row-end",
    "grid-row-span",
    "grid-row-start",
    "line-clamp",
    "line-height",
    "opacity",
    "order",
    "orphans",
    "scale",
    "stop-opacity",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "tab-size",
    "widows",
    "z-index",
    "zoom",
];

/// A JS function standing in for one of the sketch hooks. It is called with
/// the canvas 2D context, the containment flag and, for pointer hooks, the
/// pointer position.
struct JsHook {
    callback: js_sys::Function,
    context: CanvasRenderingContext2d,
}

impl JsHook {
    fn call(&self, args: &js_sys::Array) -> SketchResult<()> {
        self.callback
            .apply(&JsValue::NULL, args)
            .map(|_| ())
            .map_err(|e| SketchError::Hook(describe_js(&e)))
    }
}

impl FrameHook for JsHook {
    fn on_frame(&mut self, _surface: &mut dyn Surface, inside: bool) -> SketchResult<()> {
        self.call(&js_sys::Array::of2(&self.context, &JsValue::from_bool(inside)))
    }
}

impl PointerHook for JsHook {
    fn on_pointer(&mut self, _surface: &mut dyn Surface, inside: bool, x: f64, y: f64) -> SketchResult<()> {
        self.call(&js_sys::Array::of4(
            &self.context,
            &JsValue::from_bool(inside),
            &JsValue::from_f64(x),
            &JsValue::from_f64(y),
        ))
    }
}

/// JS hook functions registered by the caller. They outlive any one canvas;
/// `dirty` means the sketch has not been given the current set yet.
#[derive(Default)]
struct HookSet {
    draw: Option<js_sys::Function>,
    stroke: Option<js_sys::Function>,
    click: Option<js_sys::Function>,
    dirty: bool,
}

/// Rebuilds the sketch hooks from `set` against the current 2D context.
/// Without a mounted surface the set stays dirty until the next mount.
fn sync_hooks(set: &RefCell<HookSet>, sketch: &mut CanvasSketch) {
    let mut set = set.borrow_mut();
    if !set.dirty {
        return;
    }
    let Some(context) = sketch.surface().map(|s| s.context().clone()) else {
        return;
    };
    let bind = |callback: &Option<js_sys::Function>| {
        callback.clone().map(|callback| JsHook { callback, context: context.clone() })
    };
    *sketch.hooks_mut() = Hooks {
        draw: bind(&set.draw).map(|h| Box::new(h) as Box<dyn FrameHook>),
        stroke: bind(&set.stroke).map(|h| Box::new(h) as Box<dyn PointerHook>),
        click: bind(&set.click).map(|h| Box::new(h) as Box<dyn PointerHook>),
    };
    set.dirty = false;
}

/// Runs one event against the sketch. A hook that re-enters the page while
/// the sketch is handling another event gets this one dropped and logged.
fn dispatch<F>(sketch: &RefCell<CanvasSketch>, hooks: &RefCell<HookSet>, event: &str, handler: F)
where
    F: FnOnce(&mut CanvasSketch),
{
    match sketch.try_borrow_mut() {
        Ok(mut sketch) => {
            sync_hooks(hooks, &mut sketch);
            handler(&mut sketch);
        }
        Err(_) => {
            crate::console_error!("canvas-trace: {} skipped: {}", event, SketchError::Busy);
        }
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

struct Mounted {
    canvas: HtmlCanvasElement,
    listeners: Vec<Listener>,
    interval: Option<(i32, Closure<dyn FnMut()>)>,
}

impl Mounted {
    /// Unregisters everything from the page. `in_use` means one of the
    /// closures may be on the stack right now, so they are leaked to the JS
    /// garbage collector instead of being freed under it.
    fn unwire(self, window: Option<&web_sys::Window>, in_use: bool) -> HtmlCanvasElement {
        for listener in &self.listeners {
            let _ = listener
                .target
                .remove_event_listener_with_callback(listener.kind, listener.closure.as_ref().unchecked_ref());
        }
        if let (Some((id, _)), Some(window)) = (&self.interval, window) {
            window.clear_interval_with_handle(*id);
        }
        if in_use {
            for listener in self.listeners {
                listener.closure.forget();
            }
            if let Some((_, tick)) = self.interval {
                tick.forget();
            }
        }
        self.canvas
    }
}

/// Browser host for a tracing sketch: owns the container, keeps caller content
/// in an overlay above the canvas and wires window events to the sketch.
#[wasm_bindgen]
pub struct TracingCanvas {
    container: HtmlElement,
    overlay: HtmlElement,
    placeholder: Option<HtmlElement>,
    sketch: Rc<RefCell<CanvasSketch>>,
    hooks: Rc<RefCell<HookSet>>,
    mounted: Option<Mounted>,
}

/// Turns a JS style key (`backgroundColor`) into a CSS property (`background-color`).
pub fn css_property_name(key: &str) -> String {
    if key.starts_with("--") || key.contains('-') {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// CSS text for one style entry. Numbers get `px` unless they are zero, a
/// custom property or a unitless property; empty strings, booleans, null and
/// nested values are dropped.
pub fn css_value(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => {
            let n = n.as_f64()?;
            let text = format_number(n);
            let property = css_property_name(key);
            if n == 0.0 || property.starts_with("--") || UNITLESS_PROPERTIES.contains(&property.as_str()) {
                Some(text)
            } else {
                Some(format!("{}px", text))
            }
        }
        _ => None,
    }
}

/// DOM attribute name for a container prop (`className` -> `class`).
pub fn attribute_name(key: &str) -> &str {
    match key {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    }
}

/// Attribute text for a container prop. `true` sets an empty attribute;
/// `false`, null and nested values leave the attribute off.
pub fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(true) => Some(String::new()),
        _ => None,
    }
}

pub fn default_container_style() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("width".to_string(), Value::from("100%")),
        ("height".to_string(), Value::from("400px")),
    ])
}

pub fn is_browser() -> bool {
    js_sys::global().dyn_into::<web_sys::Window>().is_ok()
}

fn apply_style(element: &HtmlElement, style: &BTreeMap<String, Value>) -> SketchResult<()> {
    let css = element.style();
    for (key, value) in style {
        if let Some(text) = css_value(key, value) {
            css.set_property(&css_property_name(key), &text)?;
        }
    }
    Ok(())
}

fn apply_attributes(element: &HtmlElement, attributes: &BTreeMap<String, Value>) -> SketchResult<()> {
    for (key, value) in attributes {
        if let Some(text) = attribute_value(value) {
            element.set_attribute(attribute_name(key), &text)?;
        }
    }
    Ok(())
}

fn create_div(document: &web_sys::Document) -> SketchResult<HtmlElement> {
    document
        .create_element("div")?
        .dyn_into::<HtmlElement>()
        .map_err(|_| SketchError::Canvas("created element is not an HtmlElement".into()))
}

fn pointer_position(canvas: &HtmlCanvasElement, event: &MouseEvent) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    (event.client_x() as f64 - rect.left(), event.client_y() as f64 - rect.top())
}

fn listen<F>(mounted: &mut Mounted, target: &EventTarget, kind: &'static str, handler: F) -> SketchResult<()>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    mounted.listeners.push(Listener { target: target.clone(), kind, closure });
    Ok(())
}

fn parse_options(options: JsValue) -> SketchResult<SketchOptions> {
    let options: SketchOptions = if options.is_undefined() || options.is_null() {
        SketchOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };
    options.validate()?;
    Ok(options)
}

fn parse_bag(bag: JsValue, name: &'static str) -> SketchResult<Option<BTreeMap<String, Value>>> {
    if bag.is_undefined() || bag.is_null() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(bag)
        .map(Some)
        .map_err(|e| SketchError::InvalidOption { name, reason: e.to_string() })
}

#[wasm_bindgen]
impl TracingCanvas {
    /// Prepares `container`: applies `style` and `attributes`, moves its
    /// current children into the overlay slot and shows a placeholder until
    /// `mount` succeeds.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container: HtmlElement,
        options: JsValue,
        style: JsValue,
        attributes: JsValue,
    ) -> Result<TracingCanvas, JsValue> {
        console_error_panic_hook::set_once();

        if !is_browser() {
            return Err(SketchError::NotBrowser.into());
        }
        let document = container.owner_document().ok_or(SketchError::MissingContainer)?;
        let options = parse_options(options)?;
        let style = parse_bag(style, "style")?.unwrap_or_else(default_container_style);
        let attributes = parse_bag(attributes, "attributes")?.unwrap_or_default();

        apply_attributes(&container, &attributes)?;
        apply_style(&container, &style)?;
        container.style().set_property("position", "relative")?;

        let overlay = create_div(&document)?;
        apply_style(
            &overlay,
            &BTreeMap::from([
                ("position".to_string(), Value::from("absolute")),
                ("top".to_string(), Value::from(0)),
                ("left".to_string(), Value::from(0)),
                ("width".to_string(), Value::from("100%")),
                ("height".to_string(), Value::from("100%")),
                ("zIndex".to_string(), Value::from(10)),
            ]),
        )?;
        while let Some(child) = container.first_child() {
            overlay.append_child(&child)?;
        }

        let placeholder = create_div(&document)?;
        placeholder.set_text_content(Some(PLACEHOLDER_TEXT));
        container.append_child(&placeholder)?;
        container.append_child(&overlay)?;

        Ok(TracingCanvas {
            container,
            overlay,
            placeholder: Some(placeholder),
            sketch: Rc::new(RefCell::new(Sketch::new(options, Hooks::default(), MathRandom))),
            hooks: Rc::new(RefCell::new(HookSet::default())),
            mounted: None,
        })
    }

    /// Called as `(ctx, inside)` on every frame instead of the fade.
    pub fn set_draw_hook(&mut self, callback: js_sys::Function) {
        self.hooks.borrow_mut().draw = Some(callback);
        self.refresh_hooks();
    }

    /// Called as `(ctx, inside, x, y)` on pointer moves instead of the pattern.
    pub fn set_stroke_hook(&mut self, callback: js_sys::Function) {
        self.hooks.borrow_mut().stroke = Some(callback);
        self.refresh_hooks();
    }

    /// Called as `(ctx, inside, x, y)` on clicks instead of the burst.
    pub fn set_click_hook(&mut self, callback: js_sys::Function) {
        self.hooks.borrow_mut().click = Some(callback);
        self.refresh_hooks();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        let sketch = self.sketch.try_borrow().map_err(|_| SketchError::Busy)?;
        Ok(sketch.snapshot())
    }

    pub fn options(&self) -> Result<JsValue, JsValue> {
        let sketch = self.sketch.try_borrow().map_err(|_| SketchError::Busy)?;
        Ok(serde_wasm_bindgen::to_value(sketch.options())?)
    }

    /// Creates the canvas, runs setup and starts listening. If setup fails the
    /// placeholder stays up and nothing is wired.
    pub fn mount(&mut self) -> Result<(), JsValue> {
        if self.mounted.is_some() {
            return Ok(());
        }
        let window = web_sys::window().ok_or(SketchError::NotBrowser)?;
        let document = self.container.owner_document().ok_or(SketchError::MissingContainer)?;
        let mut sketch = self.sketch.try_borrow_mut().map_err(|_| SketchError::Busy)?;

        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SketchError::Canvas("created element is not a canvas".into()))?;
        canvas.set_width(self.container.offset_width().max(0) as u32);
        canvas.set_height(self.container.offset_height().max(0) as u32);
        canvas.style().set_property("display", "block")?;
        self.container.insert_before(&canvas, Some(&self.overlay))?;

        let surface = match CanvasSurface::new(canvas.clone()) {
            Ok(surface) => surface,
            Err(e) => {
                canvas.remove();
                return Err(e.into());
            }
        };
        if !sketch.setup(surface) {
            canvas.remove();
            return Ok(());
        }
        if let Some(placeholder) = self.placeholder.take() {
            placeholder.remove();
        }
        self.hooks.borrow_mut().dirty = true;
        sync_hooks(&self.hooks, &mut sketch);
        let interval_ms = sketch.options().frame_interval_ms();
        let frame_rate = sketch.options().custom_frame_rate;
        drop(sketch);

        self.mounted = Some(Mounted { canvas: canvas.clone(), listeners: Vec::new(), interval: None });
        if let Err(e) = self.wire(&window, &canvas, interval_ms) {
            self.destroy();
            return Err(e.into());
        }
        crate::console_log!("canvas-trace: mounted {}x{} at {} fps", canvas.width(), canvas.height(), frame_rate);
        Ok(())
    }

    /// Stops listening, stops the frame timer and removes the canvas. Caller
    /// content stays in the container and registered hooks are rebound on the
    /// next mount.
    pub fn destroy(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        let canvas = match self.sketch.try_borrow_mut() {
            Ok(mut sketch) => {
                let canvas = mounted.unwire(web_sys::window().as_ref(), false);
                sketch.take_surface();
                *sketch.hooks_mut() = Hooks::default();
                canvas
            }
            // Called from inside one of this canvas's own hooks.
            Err(_) => mounted.unwire(web_sys::window().as_ref(), true),
        };
        self.hooks.borrow_mut().dirty = true;
        canvas.remove();
    }
}

impl TracingCanvas {
    /// Registers window listeners and the frame timer on the mounted canvas.
    fn wire(&mut self, window: &web_sys::Window, canvas: &HtmlCanvasElement, interval_ms: i32) -> SketchResult<()> {
        let target: EventTarget = window.clone().into();
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };

        let (sketch, hooks) = (self.sketch.clone(), self.hooks.clone());
        let tracked = canvas.clone();
        listen(mounted, &target, "mousemove", move |event: Event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let (x, y) = pointer_position(&tracked, event);
                let dragging = event.buttons() != 0;
                dispatch(&sketch, &hooks, "mousemove", |sketch| {
                    if dragging {
                        sketch.pointer_dragged(x, y);
                    } else {
                        sketch.pointer_moved(x, y);
                    }
                });
            }
        })?;

        let (sketch, hooks) = (self.sketch.clone(), self.hooks.clone());
        let tracked = canvas.clone();
        listen(mounted, &target, "click", move |event: Event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let (x, y) = pointer_position(&tracked, event);
                dispatch(&sketch, &hooks, "click", |sketch| {
                    sketch.clicked(x, y);
                });
            }
        })?;

        let (sketch, hooks) = (self.sketch.clone(), self.hooks.clone());
        let container = self.container.clone();
        listen(mounted, &target, "resize", move |_: Event| {
            let width = container.offset_width() as f64;
            let height = container.offset_height() as f64;
            dispatch(&sketch, &hooks, "resize", |sketch| {
                sketch.resized(width, height);
            });
        })?;

        let (sketch, hooks) = (self.sketch.clone(), self.hooks.clone());
        let tick = Closure::wrap(Box::new(move || {
            dispatch(&sketch, &hooks, "frame", |sketch| {
                sketch.frame();
            });
        }) as Box<dyn FnMut()>);
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            interval_ms,
        )?;
        mounted.interval = Some((id, tick));
        Ok(())
    }

    /// Marks the hook set changed and hands it to the sketch if it is free.
    /// When a hook replaces hooks mid-event the swap waits for the next event.
    fn refresh_hooks(&mut self) {
        self.hooks.borrow_mut().dirty = true;
        if let Ok(mut sketch) = self.sketch.try_borrow_mut() {
            sync_hooks(&self.hooks, &mut sketch);
        }
    }
}

impl Drop for TracingCanvas {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Builds a `TracingCanvas` and mounts it in one call.
#[wasm_bindgen(js_name = mountTracingCanvas)]
pub fn mount_tracing_canvas(
    container: HtmlElement,
    options: JsValue,
    style: JsValue,
    attributes: JsValue,
) -> Result<TracingCanvas, JsValue> {
    let mut canvas = TracingCanvas::new(container, options, style, attributes)?;
    canvas.mount()?;
    Ok(canvas)
}
