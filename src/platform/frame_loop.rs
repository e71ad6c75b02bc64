//! Cancellable requestAnimationFrame loop

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

struct LoopInner {
    running: Cell<bool>,
    /// Pending request id
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl LoopInner {
    fn schedule(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let callback = self.callback.borrow();
        if let Some(callback) = callback.as_ref() {
            let id = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
            self.handle.set(Some(id));
        }
        Ok(())
    }

    fn cancel(&self) {
        self.running.set(false);
        if let Some(id) = self.handle.take()
            && let Some(window) = web_sys::window()
        {
            let _ = window.cancel_animation_frame(id);
        }
    }
}

/// Calls `frame(timestamp_ms)` once per display refresh until stopped or
/// dropped. Must not be dropped from inside its own callback.
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

impl FrameLoop {
    pub fn start<F>(mut frame: F) -> Result<Self, JsValue>
    where
        F: FnMut(f64) + 'static,
    {
        let inner = Rc::new(LoopInner {
            running: Cell::new(true),
            handle: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let callback = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            let Some(inner) = weak.upgrade() else { return };
            inner.handle.set(None);
            if !inner.running.get() {
                return;
            }
            frame(time);
            if inner.running.get()
                && let Err(e) = inner.schedule()
            {
                log::error!("Frame loop stopped: {:?}", e);
                inner.running.set(false);
            }
        });
        *inner.callback.borrow_mut() = Some(callback);
        inner.schedule()?;

        Ok(Self { inner })
    }

    /// Cancel the pending frame; no further callbacks run
    pub fn stop(&self) {
        self.inner.cancel();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.inner.cancel();
        log::info!("Frame loop stopped");
    }
}
