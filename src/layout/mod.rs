//! Force-directed layout of the connection graph.

mod engine;
mod frames;
/// Mapping raw simulation coordinates onto the canvas.
pub mod scale;
mod settings;
mod state;
mod types;

pub use engine::{AnimationStep, LayoutEngine};
#[cfg(target_arch = "wasm32")]
pub use frames::AnimationFrameScheduler;
pub use frames::{AnimationHandle, FrameScheduler, QueuedFrames};
pub use settings::LayoutSettings;
pub use state::{ForceGraphBackend, ForceGraphState, SEED_RADIUS, Simulation, SimulationBackend};
pub use types::{EdgeWeightFn, GraphData, GraphLink, GraphNode};
