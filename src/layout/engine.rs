use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use log::{debug, warn};

use super::frames::{AnimationHandle, FrameScheduler};
use super::scale::Canvas;
use super::settings::LayoutSettings;
use super::state::{ForceGraphBackend, Simulation, SimulationBackend};
use super::types::{EdgeWeightFn, GraphData};
use crate::error::LayoutError;
use crate::track::{LayoutNode, Position, Track};

/// Progress report from an animated layout.
#[derive(Debug)]
pub struct AnimationStep<'a> {
	/// Nodes with their current normalized positions.
	pub nodes: &'a [LayoutNode],
	/// Simulation iterations run so far.
	pub iterations: usize,
	/// True for the last step of the run.
	pub done: bool,
}

/// Positions layout nodes on a canvas with a force simulation.
///
/// Every entry point returns a position for every input node. Simulation
/// failures are logged and replaced with random placement.
pub struct LayoutEngine {
	settings: LayoutSettings,
	backend: Box<dyn SimulationBackend>,
	weigh: Option<Box<EdgeWeightFn>>,
	active: Rc<Cell<usize>>,
}

impl Default for LayoutEngine {
	fn default() -> Self {
		Self::new(LayoutSettings::default())
	}
}

impl LayoutEngine {
	/// Engine on the `force_graph` backend, without edge weights.
	pub fn new(settings: LayoutSettings) -> Self {
		Self {
			settings,
			backend: Box::new(ForceGraphBackend),
			weigh: None,
			active: Rc::new(Cell::new(0)),
		}
	}

	/// Replaces the simulation backend.
	pub fn with_backend(mut self, backend: impl SimulationBackend + 'static) -> Self {
		self.backend = Box::new(backend);
		self
	}

	/// Weighs edges by their endpoint tracks. Weights above 1 pull the
	/// endpoints closer, scaled by `edge_weight_influence`.
	pub fn with_edge_weights<F>(mut self, weigh: F) -> Self
	where
		F: Fn(&Track, &Track) -> f32 + 'static,
	{
		self.weigh = Some(Box::new(weigh));
		self
	}

	/// Settings the engine was built with.
	pub fn settings(&self) -> &LayoutSettings {
		&self.settings
	}

	/// True while any layout, including an animated one, is in progress.
	pub fn is_running(&self) -> bool {
		self.active.get() > 0
	}

	/// Lays out `nodes` from scratch and returns them with positions set.
	pub fn compute_positions(
		&self,
		mut nodes: Vec<LayoutNode>,
		width: f64,
		height: f64,
	) -> Vec<LayoutNode> {
		if nodes.is_empty() {
			return nodes;
		}
		let _running = RunningGuard::enter(&self.active);
		let canvas = Canvas::new(width, height, self.settings.padding);
		let graph = GraphData::from_layout_nodes(&nodes, self.weigh.as_deref());
		debug!(
			"computing layout for {} nodes over {} iterations",
			nodes.len(),
			self.settings.iterations
		);

		match self.simulate(&graph, self.settings.iterations) {
			Ok(raw) => canvas.place(&mut nodes, &raw, self.settings.log_mode),
			Err(err) => {
				warn!("layout failed, placing nodes randomly: {}", err);
				canvas.scatter(&mut nodes, &mut rand::thread_rng());
			}
		}
		nodes
	}

	/// Adds `new` nodes to an existing layout.
	///
	/// Existing nodes with a position are pinned there while a shorter
	/// simulation places the rest; then everything is renormalized together,
	/// so old nodes can still shift on the canvas. New nodes whose id is
	/// already present are dropped.
	pub fn update_with_new_nodes(
		&self,
		existing: Vec<LayoutNode>,
		new: Vec<LayoutNode>,
		width: f64,
		height: f64,
	) -> Vec<LayoutNode> {
		let pinned = existing.len();
		let mut seen: HashSet<String> = existing.iter().map(|n| n.id.clone()).collect();
		let mut nodes = existing;
		for node in new {
			if seen.insert(node.id.clone()) {
				nodes.push(node);
			} else {
				warn!("node {} is already laid out, skipping", node.id);
			}
		}
		if nodes.is_empty() {
			return nodes;
		}

		let _running = RunningGuard::enter(&self.active);
		let canvas = Canvas::new(width, height, self.settings.padding);
		let mut graph = GraphData::from_layout_nodes(&nodes, self.weigh.as_deref());
		graph.pin_prefix(&nodes, pinned);
		debug!(
			"updating layout: {} existing, {} new, {} iterations",
			pinned,
			nodes.len() - pinned,
			self.settings.incremental_iterations
		);

		match self.simulate(&graph, self.settings.incremental_iterations) {
			Ok(raw) => canvas.place(&mut nodes, &raw, self.settings.log_mode),
			Err(err) => {
				warn!("incremental layout failed, placing nodes randomly: {}", err);
				canvas.scatter(&mut nodes, &mut rand::thread_rng());
			}
		}
		nodes
	}

	/// Lays out `nodes` over several frames.
	///
	/// The iteration budget is split into `steps` chunks (rounding up). Each
	/// frame from `scheduler` runs one chunk and then calls `on_step` with the
	/// normalized positions so far. Cancel through the returned handle.
	pub fn compute_animated<F>(
		&self,
		nodes: Vec<LayoutNode>,
		width: f64,
		height: f64,
		steps: usize,
		scheduler: Rc<dyn FrameScheduler>,
		on_step: F,
	) -> AnimationHandle
	where
		F: FnMut(AnimationStep<'_>) + 'static,
	{
		if nodes.is_empty() {
			return AnimationHandle::finished();
		}

		let total = self.settings.iterations;
		let chunk = total.div_ceil(steps.max(1));
		let graph = GraphData::from_layout_nodes(&nodes, self.weigh.as_deref());
		let sim = guarded(|| self.backend.build(&graph, &self.settings));
		let handle = AnimationHandle::start(&self.active);
		debug!(
			"animating layout for {} nodes: {} iterations in chunks of {}",
			nodes.len(),
			total,
			chunk
		);

		let run = AnimatedRun {
			sim,
			nodes,
			canvas: Canvas::new(width, height, self.settings.padding),
			log_mode: self.settings.log_mode,
			chunk,
			remaining: total,
			completed: 0,
			on_step,
			handle: handle.clone(),
		};
		schedule(Rc::new(RefCell::new(run)), scheduler);
		handle
	}

	fn simulate(&self, graph: &GraphData, iterations: usize) -> Result<Vec<Position>, LayoutError> {
		guarded(|| {
			let mut sim = self.backend.build(graph, &self.settings)?;
			sim.advance(iterations)?;
			checked_positions(&*sim, graph.nodes.len(), iterations)
		})
	}
}

/// An animated layout between frames.
struct AnimatedRun<F> {
	sim: Result<Box<dyn Simulation>, LayoutError>,
	nodes: Vec<LayoutNode>,
	canvas: Canvas,
	log_mode: bool,
	chunk: usize,
	remaining: usize,
	completed: usize,
	on_step: F,
	handle: AnimationHandle,
}

impl<F> AnimatedRun<F>
where
	F: FnMut(AnimationStep<'_>),
{
	/// Runs one chunk. Returns `true` if another frame is needed.
	fn frame(&mut self) -> bool {
		if self.handle.is_cancelled() {
			debug!("animated layout cancelled after {} iterations", self.completed);
			return false;
		}

		let take = self.chunk.min(self.remaining);
		let expected = self.nodes.len();
		let completed = self.completed + take;
		let result = match &mut self.sim {
			Ok(sim) => guarded(|| {
				sim.advance(take)?;
				checked_positions(&**sim, expected, completed)
			}),
			Err(err) => Err(LayoutError::Backend(err.to_string())),
		};

		let done = match result {
			Ok(raw) => {
				self.remaining -= take;
				self.completed = completed;
				self.canvas.place(&mut self.nodes, &raw, self.log_mode);
				self.remaining == 0
			}
			Err(err) => {
				warn!("animated layout failed, placing nodes randomly: {}", err);
				self.canvas.scatter(&mut self.nodes, &mut rand::thread_rng());
				true
			}
		};

		(self.on_step)(AnimationStep {
			nodes: &self.nodes,
			iterations: self.completed,
			done,
		});
		if done {
			self.handle.mark_finished();
		}
		!done
	}
}

fn schedule<F>(run: Rc<RefCell<AnimatedRun<F>>>, scheduler: Rc<dyn FrameScheduler>)
where
	F: FnMut(AnimationStep<'_>) + 'static,
{
	let next = scheduler.clone();
	let mut unrun = UnrunFrame(Some(run.borrow().handle.clone()));
	scheduler.request_frame(Box::new(move || {
		unrun.disarm();
		let again = run.borrow_mut().frame();
		if again {
			schedule(run, next);
		}
	}));
}

/// Releases an animated run whose pending frame is dropped without running.
struct UnrunFrame(Option<AnimationHandle>);

impl UnrunFrame {
	fn disarm(&mut self) {
		self.0 = None;
	}
}

impl Drop for UnrunFrame {
	fn drop(&mut self) {
		if let Some(handle) = self.0.take() {
			if !handle.is_finished() {
				warn!("animation frame dropped before it ran, ending the run");
				handle.mark_finished();
			}
		}
	}
}

/// Raw positions from `sim`, rejected unless there is one finite position per
/// node.
fn checked_positions(
	sim: &dyn Simulation,
	expected: usize,
	iterations: usize,
) -> Result<Vec<Position>, LayoutError> {
	let raw = sim.positions();
	if raw.len() != expected {
		return Err(LayoutError::Backend(format!(
			"expected {} positions, got {}",
			expected,
			raw.len()
		)));
	}
	if raw.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
		return Err(LayoutError::Diverged { iterations });
	}
	Ok(raw)
}

/// Runs `f`, turning a panic into [`LayoutError::Panicked`].
fn guarded<T>(f: impl FnOnce() -> Result<T, LayoutError>) -> Result<T, LayoutError> {
	panic::catch_unwind(AssertUnwindSafe(f))
		.unwrap_or_else(|payload| Err(LayoutError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	payload
		.downcast_ref::<&str>()
		.map(|s| s.to_string())
		.or_else(|| payload.downcast_ref::<String>().cloned())
		.unwrap_or_else(|| "unknown panic".to_string())
}

/// Counts a synchronous layout as running until dropped.
struct RunningGuard<'a>(&'a Cell<usize>);

impl<'a> RunningGuard<'a> {
	fn enter(active: &'a Cell<usize>) -> Self {
		active.set(active.get() + 1);
		Self(active)
	}
}

impl Drop for RunningGuard<'_> {
	fn drop(&mut self) {
		self.0.set(self.0.get().saturating_sub(1));
	}
}
