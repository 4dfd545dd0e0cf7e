use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// At most one pending frame task; requests made while one is pending are
/// coalesced into it.
#[derive(Debug, Default)]
pub(crate) struct FrameThrottle {
	pending: Cell<bool>,
}

impl FrameThrottle {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Returns `true` when the caller should schedule a frame task.
	pub(crate) fn request(&self) -> bool {
		!self.pending.replace(true)
	}

	/// Called by the frame task before it does its work.
	pub(crate) fn begin_frame(&self) {
		self.pending.set(false);
	}

	/// Run `task` on the next animation frame unless a task is already queued.
	pub(crate) fn run(self: &Rc<Self>, task: impl FnOnce() + 'static) {
		if !self.request() {
			return;
		}
		let this = self.clone();
		schedule_frame(move || {
			this.begin_frame();
			task();
		});
	}

	/// Run `task` once the current task finishes, before the browser paints.
	/// Used for node moves, which already arrive at most once per frame; a
	/// new animation frame would draw the links one frame late.
	pub(crate) fn run_before_paint(self: &Rc<Self>, task: impl FnOnce() + 'static) {
		if !self.request() {
			return;
		}
		let this = self.clone();
		schedule_microtask(move || {
			this.begin_frame();
			task();
		});
	}
}

pub(crate) fn schedule_frame(f: impl FnOnce() + 'static) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let cb = Closure::once_into_js(f);
	let _ = window.request_animation_frame(cb.unchecked_ref());
}

pub(crate) fn schedule_after(ms: u32, f: impl FnOnce() + 'static) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let cb = Closure::once_into_js(f);
	let _ = window
		.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), ms as i32);
}

pub(crate) fn schedule_microtask(f: impl FnOnce() + 'static) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let cb = Closure::once_into_js(f);
	window.queue_microtask(cb.unchecked_ref());
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn burst_of_requests_schedules_once() {
		let throttle = FrameThrottle::new();
		let scheduled = (0..25).filter(|_| throttle.request()).count();
		assert_eq!(scheduled, 1);
	}

	#[test]
	fn next_frame_accepts_a_new_request() {
		let throttle = FrameThrottle::new();
		assert!(throttle.request());
		assert!(!throttle.request());
		throttle.begin_frame();
		assert!(throttle.request());
		assert!(!throttle.request());
	}
}
