use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SketchError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("Invalid drawing mode: {0} (expected 0, 1 or 2)")]
    InvalidMode(u8),

    #[error("Canvas call failed: {0}")]
    Canvas(String),

    #[error("Hook threw: {0}")]
    Hook(String),

    #[error("Not running in a browser")]
    NotBrowser,

    #[error("Container is not available")]
    MissingContainer,

    #[error("Sketch is busy handling another event")]
    Busy,
}

/// Renders a thrown JS value for diagnostics. Strings and `Error` objects keep
/// their message; anything else falls back to its debug form.
pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;
        if let Some(err) = value.dyn_ref::<js_sys::Error>() {
            return String::from(err.message());
        }
    }
    format!("{:?}", value)
}

impl From<JsValue> for SketchError {
    fn from(value: JsValue) -> Self {
        SketchError::Canvas(describe_js(&value))
    }
}

impl From<serde_wasm_bindgen::Error> for SketchError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        SketchError::InvalidOption { name: "options", reason: e.to_string() }
    }
}

impl From<SketchError> for JsValue {
    fn from(e: SketchError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub type SketchResult<T> = Result<T, SketchError>;
