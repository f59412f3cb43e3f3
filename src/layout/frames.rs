//! Frame scheduling for animated layouts.
//!
//! An animated layout runs one chunk of simulation per frame and hands
//! control back to the host in between. The host decides what a frame is:
//! a browser uses `requestAnimationFrame`, a native loop or a test pumps a
//! [`QueuedFrames`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Runs a callback at the next frame boundary.
///
/// A scheduler that cannot run a frame should drop it: an animated run whose
/// frame is dropped unrun finishes and stops counting as running.
pub trait FrameScheduler {
	/// Queues `frame` to run once, later.
	fn request_frame(&self, frame: Box<dyn FnOnce()>);
}

/// Frames waiting for the host to run them, oldest first.
///
/// Pending frames hold on to this queue, so dropping the last outside handle
/// does not free them. Call [`QueuedFrames::clear`] to abandon them.
#[derive(Default)]
pub struct QueuedFrames {
	pending: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl QueuedFrames {
	/// An empty queue.
	pub fn new() -> Self {
		Self::default()
	}

	/// Frames waiting to run.
	pub fn pending(&self) -> usize {
		self.pending.borrow().len()
	}

	/// Runs the oldest pending frame. Returns `false` if there was none.
	pub fn run_next(&self) -> bool {
		let frame = self.pending.borrow_mut().pop_front();
		match frame {
			Some(frame) => {
				frame();
				true
			}
			None => false,
		}
	}

	/// Runs frames until none are left, including frames scheduled by the
	/// frames being run. Returns how many ran.
	pub fn run_all(&self) -> usize {
		let mut ran = 0;
		while self.run_next() {
			ran += 1;
		}
		ran
	}

	/// Drops every pending frame without running it. Returns how many were
	/// dropped.
	pub fn clear(&self) -> usize {
		let dropped: Vec<_> = self.pending.borrow_mut().drain(..).collect();
		dropped.len()
	}
}

impl FrameScheduler for QueuedFrames {
	fn request_frame(&self, frame: Box<dyn FnOnce()>) {
		self.pending.borrow_mut().push_back(frame);
	}
}

/// Schedules frames with `window.requestAnimationFrame`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct AnimationFrameScheduler;

#[cfg(target_arch = "wasm32")]
impl FrameScheduler for AnimationFrameScheduler {
	fn request_frame(&self, frame: Box<dyn FnOnce()>) {
		use wasm_bindgen::JsCast;
		use wasm_bindgen::closure::Closure;

		let Some(window) = web_sys::window() else {
			log::warn!("no window to schedule an animation frame on, running it now");
			frame();
			return;
		};
		let slot = Rc::new(RefCell::new(Some(frame)));
		let pending = slot.clone();
		let cb = Closure::once_into_js(move || {
			let frame = pending.borrow_mut().take();
			if let Some(frame) = frame {
				frame();
			}
		});
		if let Err(err) = window.request_animation_frame(cb.unchecked_ref()) {
			log::warn!("requestAnimationFrame failed, dropping the frame: {:?}", err);
			let dropped = slot.borrow_mut().take();
			drop(dropped);
		}
	}
}

/// Handle to an animated layout run.
///
/// Cloning shares the same run. The run counts toward
/// [`LayoutEngine::is_running`](super::LayoutEngine::is_running) until it
/// finishes, is cancelled or loses its pending frame.
#[derive(Clone, Debug, Default)]
pub struct AnimationHandle {
	cancelled: Rc<Cell<bool>>,
	finished: Rc<Cell<bool>>,
	active: Rc<Cell<usize>>,
}

impl AnimationHandle {
	/// Registers a new run on `active`.
	pub(crate) fn start(active: &Rc<Cell<usize>>) -> Self {
		active.set(active.get() + 1);
		Self {
			active: active.clone(),
			..Self::default()
		}
	}

	pub(crate) fn finished() -> Self {
		let handle = Self::default();
		handle.finished.set(true);
		handle
	}

	/// Stops the run. It is released at once; a chunk that is executing right
	/// now still completes, but no further chunk runs.
	pub fn cancel(&self) {
		self.cancelled.set(true);
		self.mark_finished();
	}

	/// True once [`cancel`](Self::cancel) was called on any clone.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled.get()
	}

	/// True once the run has delivered its last step, was cancelled or lost
	/// its pending frame.
	pub fn is_finished(&self) -> bool {
		self.finished.get()
	}

	/// Releases the run. Only the first call has an effect.
	pub(crate) fn mark_finished(&self) {
		if self.finished.replace(true) {
			return;
		}
		self.active.set(self.active.get().saturating_sub(1));
	}
}
