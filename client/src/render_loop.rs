use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into at most one `requestAnimationFrame` callback.
///
/// Cloning shares the same pending frame.
#[derive(Clone)]
pub struct FrameScheduler {
    shared: Rc<FrameState>,
}

struct FrameState {
    window: Option<web_sys::Window>,
    pending: Cell<Option<i32>>,
    paint: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameScheduler {
    pub fn new(paint: impl Fn() + 'static) -> Self {
        let shared = Rc::new(FrameState {
            window: web_sys::window(),
            pending: Cell::new(None),
            paint: RefCell::new(None),
        });

        let weak = Rc::downgrade(&shared);
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Some(state) = weak.upgrade() {
                state.pending.set(None);
            }
            paint();
        });
        *shared.paint.borrow_mut() = Some(callback);

        Self { shared }
    }

    /// Ask for a repaint on the next animation frame. Repeated calls before the
    /// frame fires are free.
    pub fn request(&self) {
        if self.shared.pending.get().is_some() {
            return;
        }
        let Some(window) = self.shared.window.as_ref() else {
            return;
        };
        let paint = self.shared.paint.borrow();
        let Some(callback) = paint.as_ref() else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            self.shared.pending.set(Some(id));
        }
    }
}

impl Drop for FrameState {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take()
            && let Some(window) = self.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
    }
}
