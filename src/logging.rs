use crate::error::SketchResult;

#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        web_sys::console::log_1(&format!($($arg)*).into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        #[cfg(debug_assertions)]
        println!($($arg)*);
    }
}

#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => {
        web_sys::console::error_1(&format!($($arg)*).into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    }
}

/// Runs one externally triggered handler. A failure is logged against the
/// event that caused it and then dropped, so the next event is handled as
/// usual. Returns whether the handler succeeded.
pub fn isolate<F>(event: &str, handler: F) -> bool
where
    F: FnOnce() -> SketchResult<()>,
{
    match handler() {
        Ok(()) => true,
        Err(e) => {
            crate::console_error!("canvas-trace: {} failed: {}", event, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SketchError;

    #[test]
    fn isolate_reports_success() {
        assert!(isolate("frame", || Ok(())));
    }

    #[test]
    fn isolate_swallows_errors() {
        let handled = isolate("click", || Err(SketchError::Hook("boom".into())));
        assert!(!handled);
        // The boundary stays usable after a failure.
        assert!(isolate("click", || Ok(())));
    }
}
