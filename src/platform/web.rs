//! Browser platform: interval timers, clock and viewport

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::{LoopKind, Scheduler, TimerHandle};
use crate::sim::Viewport;

/// Wall clock in milliseconds
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Current window size, or the reference size when it cannot be read
pub fn viewport() -> Viewport {
    let Some(window) = web_sys::window() else {
        return Viewport::default();
    };
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
    match (dim(window.inner_width()), dim(window.inner_height())) {
        (Some(w), Some(h)) => Viewport::new(w as f32, h as f32),
        _ => Viewport::default(),
    }
}

/// `setInterval`-backed scheduler.
///
/// A timer may be cancelled from inside its own callback (a crash ends the
/// gameplay loop mid-tick), so cancelled closures are parked in `retired`
/// and only dropped on a later cancel, once they can no longer be running.
pub struct BrowserScheduler {
    on_tick: Rc<dyn Fn(LoopKind)>,
    live: Vec<(TimerHandle, Closure<dyn FnMut()>)>,
    retired: Vec<Closure<dyn FnMut()>>,
}

impl BrowserScheduler {
    pub fn new(on_tick: Rc<dyn Fn(LoopKind)>) -> Self {
        Self {
            on_tick,
            live: Vec::new(),
            retired: Vec::new(),
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn start_interval(&mut self, kind: LoopKind, period_ms: f64) -> TimerHandle {
        let on_tick = self.on_tick.clone();
        let closure = Closure::<dyn FnMut()>::new(move || on_tick(kind));
        let id = web_sys::window()
            .and_then(|w| {
                w.set_interval_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    period_ms.round() as i32,
                )
                .ok()
            })
            .unwrap_or_else(|| {
                log::error!("setInterval failed for {:?} loop", kind);
                -1
            });
        let handle = TimerHandle(id);
        self.live.push((handle, closure));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(handle.0);
        }
        // Everything retired earlier was cleared before this call stack began
        self.retired.clear();
        if let Some(pos) = self.live.iter().position(|(h, _)| *h == handle) {
            let (_, closure) = self.live.remove(pos);
            self.retired.push(closure);
        }
    }
}
