#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use canvas_trace::{SketchOptions, TracingCanvas};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Event, HtmlElement, MouseEvent, MouseEventInit};

wasm_bindgen_test_configure!(run_in_browser);

fn window() -> web_sys::Window {
    web_sys::window().unwrap()
}

fn container() -> HtmlElement {
    let document = window().document().unwrap();
    let div = document
        .create_element("div")
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    div.set_inner_html("<p id=\"caption\">hello</p>");
    document.body().unwrap().append_child(&div).unwrap();
    div
}

fn bag(entries: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value).unwrap();
    }
    object.into()
}

fn mounted(div: &HtmlElement, options: JsValue) -> TracingCanvas {
    let mut canvas = TracingCanvas::new(div.clone(), options, JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    canvas.mount().unwrap();
    assert!(canvas.is_mounted());
    canvas
}

fn canvases(container: &HtmlElement) -> u32 {
    container.query_selector_all("canvas").unwrap().length()
}

fn canvas_element(container: &HtmlElement) -> web_sys::Element {
    container.query_selector("canvas").unwrap().unwrap()
}

/// Client coordinates `(dx, dy)` pixels into the mounted canvas.
fn client_point(container: &HtmlElement, dx: f64, dy: f64) -> (i32, i32) {
    let rect = canvas_element(container).get_bounding_client_rect();
    ((rect.left() + dx).round() as i32, (rect.top() + dy).round() as i32)
}

fn fire_mouse(kind: &str, x: i32, y: i32, buttons: u16) {
    let init = MouseEventInit::new();
    init.set_client_x(x);
    init.set_client_y(y);
    init.set_buttons(buttons);
    let event = MouseEvent::new_with_mouse_event_init_dict(kind, &init).unwrap();
    window().dispatch_event(&event).unwrap();
}

fn fire_resize() {
    window().dispatch_event(&Event::new("resize").unwrap()).unwrap();
}

fn state(canvas: &TracingCanvas) -> serde_json::Value {
    serde_json::from_str(&canvas.snapshot().unwrap()).unwrap()
}

/// A JS hook that bumps `window[name]` on every call.
fn counter(name: &str) -> Function {
    Function::new_no_args(&format!("window.{0} = (window.{0} || 0) + 1;", name))
}

fn count(name: &str) -> f64 {
    Reflect::get(&window(), &JsValue::from_str(name)).unwrap().as_f64().unwrap_or(0.0)
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        window()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

#[wasm_bindgen_test]
fn mount_replaces_placeholder_with_canvas() {
    let div = container();
    let mut canvas = TracingCanvas::new(div.clone(), JsValue::UNDEFINED, JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    assert!(div.text_content().unwrap().contains("Loading"));
    assert_eq!(canvases(&div), 0);

    canvas.mount().unwrap();
    assert!(canvas.is_mounted());
    assert_eq!(canvases(&div), 1);
    assert!(!div.text_content().unwrap().contains("Loading"));
    // Caller content moved into the overlay, still present.
    assert!(div.query_selector("#caption").unwrap().is_some());
    assert_eq!(state(&canvas)["phase"], "Ready");

    canvas.destroy();
    assert!(!canvas.is_mounted());
    assert_eq!(canvases(&div), 0);
    assert!(div.query_selector("#caption").unwrap().is_some());
}

#[wasm_bindgen_test]
fn invalid_color_keeps_placeholder() {
    let div = container();
    let options = bag(&[("drawingColor", "blue-ish".into())]);
    let mut canvas = TracingCanvas::new(div.clone(), options, JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    canvas.mount().unwrap();
    assert!(!canvas.is_mounted());
    assert_eq!(canvases(&div), 0);
    assert!(div.text_content().unwrap().contains("Loading"));
}

#[wasm_bindgen_test]
fn named_and_functional_colors_mount() {
    let div = container();
    let options = bag(&[("drawingColor", "red".into()), ("backgroundColor", "rgb(10, 20, 30)".into())]);
    let canvas = mounted(&div, options);
    assert_eq!(state(&canvas)["color"]["r"], 255.0);
}

#[wasm_bindgen_test]
fn invalid_frame_rate_is_rejected() {
    let div = container();
    let options = serde_wasm_bindgen::to_value(&SketchOptions { custom_frame_rate: 0.0, ..SketchOptions::default() }).unwrap();
    assert!(TracingCanvas::new(div, options, JsValue::UNDEFINED, JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn style_numbers_and_attributes_reach_the_container() {
    let div = container();
    let style = bag(&[("width", "100%".into()), ("height", 250.into()), ("zIndex", 10.into())]);
    let attributes = bag(&[
        ("className", "hero".into()),
        ("data-testid", "trace".into()),
        ("hidden", false.into()),
    ]);
    let _canvas = TracingCanvas::new(div.clone(), JsValue::UNDEFINED, style, attributes).unwrap();
    let css = div.style();
    assert_eq!(css.get_property_value("height").unwrap(), "250px");
    assert_eq!(css.get_property_value("z-index").unwrap(), "10");
    assert_eq!(css.get_property_value("width").unwrap(), "100%");
    assert_eq!(div.class_name(), "hero");
    assert_eq!(div.get_attribute("data-testid").as_deref(), Some("trace"));
    assert!(!div.has_attribute("hidden"));
}

#[wasm_bindgen_test]
fn mousemove_updates_pointer() {
    let div = container();
    let canvas = mounted(&div, JsValue::UNDEFINED);
    assert!(state(&canvas)["pointer"].is_null());

    let (x, y) = client_point(&div, 40.0, 30.0);
    fire_mouse("mousemove", x, y, 0);
    let rect = canvas_element(&div).get_bounding_client_rect();
    let pointer = &state(&canvas)["pointer"];
    assert_eq!(pointer[0].as_f64(), Some(x as f64 - rect.left()));
    assert_eq!(pointer[1].as_f64(), Some(y as f64 - rect.top()));
}

#[wasm_bindgen_test]
fn click_hook_gets_context_and_position() {
    let div = container();
    let mut canvas = mounted(&div, JsValue::UNDEFINED);
    canvas.set_click_hook(Function::new_with_args(
        "ctx, inside, x, y",
        "window.__traceClick = { canvas: ctx.canvas, inside: inside, x: x };",
    ));

    let (x, y) = client_point(&div, 50.0, 50.0);
    fire_mouse("click", x, y, 0);
    let seen = Reflect::get(&window(), &"__traceClick".into()).unwrap();
    assert_eq!(Reflect::get(&seen, &"canvas".into()).unwrap(), JsValue::from(canvas_element(&div)));
    assert_eq!(Reflect::get(&seen, &"inside".into()).unwrap(), JsValue::TRUE);
    assert!(Reflect::get(&seen, &"x".into()).unwrap().as_f64().is_some());
}

#[wasm_bindgen_test]
fn resize_event_remeasures_container() {
    let div = container();
    let canvas = mounted(&div, JsValue::UNDEFINED);
    div.style().set_property("width", "300px").unwrap();
    div.style().set_property("height", "120px").unwrap();
    fire_resize();

    let viewport = &state(&canvas)["viewport"];
    assert_eq!(viewport["width"], 300.0);
    assert_eq!(viewport["height"], 120.0);
    let element = canvas_element(&div).dyn_into::<web_sys::HtmlCanvasElement>().unwrap();
    assert_eq!((element.width(), element.height()), (300, 120));
}

#[wasm_bindgen_test]
fn destroy_detaches_listeners() {
    let div = container();
    let mut canvas = mounted(&div, JsValue::UNDEFINED);
    let (x, y) = client_point(&div, 40.0, 30.0);
    canvas.destroy();

    fire_mouse("mousemove", x, y, 0);
    fire_mouse("click", x, y, 0);
    assert!(state(&canvas)["pointer"].is_null());
    assert_eq!(state(&canvas)["phase"], "Uninitialized");
}

#[wasm_bindgen_test(async)]
async fn destroy_stops_frame_timer() {
    let div = container();
    let mut canvas = TracingCanvas::new(
        div.clone(),
        bag(&[("customFrameRate", 50.into())]),
        JsValue::UNDEFINED,
        JsValue::UNDEFINED,
    )
    .unwrap();
    canvas.set_draw_hook(counter("__traceFrames"));
    canvas.mount().unwrap();

    sleep(200).await;
    let running = count("__traceFrames");
    assert!(running > 0.0);

    canvas.destroy();
    let stopped = count("__traceFrames");
    sleep(200).await;
    assert_eq!(count("__traceFrames"), stopped);
}

#[wasm_bindgen_test]
fn throwing_hook_does_not_stop_later_events() {
    let div = container();
    let mut canvas = mounted(&div, JsValue::UNDEFINED);
    canvas.set_stroke_hook(Function::new_no_args("throw new Error('boom');"));

    let (x, y) = client_point(&div, 40.0, 30.0);
    fire_mouse("mousemove", x, y, 0);
    assert!(!state(&canvas)["pointer"].is_null());

    canvas.set_stroke_hook(counter("__traceStrokes"));
    let (x, y) = client_point(&div, 60.0, 30.0);
    fire_mouse("mousemove", x, y, 0);
    assert_eq!(count("__traceStrokes"), 1.0);
}

#[wasm_bindgen_test]
fn remount_rebinds_hooks_to_the_new_canvas() {
    let div = container();
    let mut canvas = TracingCanvas::new(div.clone(), JsValue::UNDEFINED, JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    canvas.set_click_hook(Function::new_with_args("ctx", "window.__traceCanvas = ctx.canvas;"));
    let last_canvas = || Reflect::get(&window(), &"__traceCanvas".into()).unwrap();

    canvas.mount().unwrap();
    let (x, y) = client_point(&div, 50.0, 50.0);
    fire_mouse("click", x, y, 0);
    let first = last_canvas();
    assert_eq!(first, JsValue::from(canvas_element(&div)));

    canvas.destroy();
    canvas.mount().unwrap();
    let (x, y) = client_point(&div, 50.0, 50.0);
    fire_mouse("click", x, y, 0);
    let second = last_canvas();
    assert_ne!(first, second);
    assert_eq!(second, JsValue::from(canvas_element(&div)));
}

#[wasm_bindgen_test]
fn hooks_can_call_back_into_the_component() {
    let div = container();
    let canvas = Rc::new(RefCell::new(mounted(&div, JsValue::UNDEFINED)));
    let busy = Rc::new(RefCell::new(Vec::new()));

    let (inner, seen) = (canvas.clone(), busy.clone());
    let hook = Closure::wrap(Box::new(move |_ctx: JsValue| {
        let mut canvas = inner.borrow_mut();
        seen.borrow_mut().push(canvas.snapshot().is_err());
        seen.borrow_mut().push(canvas.options().is_err());
        canvas.set_stroke_hook(counter("__traceReplaced"));
    }) as Box<dyn FnMut(JsValue)>);
    canvas.borrow_mut().set_click_hook(hook.as_ref().unchecked_ref::<Function>().clone());

    let (x, y) = client_point(&div, 50.0, 50.0);
    fire_mouse("click", x, y, 0);
    assert_eq!(*busy.borrow(), vec![true, true]);

    // The stroke hook set mid-click takes over from the next event.
    fire_mouse("mousemove", x, y, 0);
    assert_eq!(count("__traceReplaced"), 1.0);
    assert!(canvas.borrow().snapshot().is_ok());
}
