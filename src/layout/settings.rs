use force_graph::SimulationParameters;
use serde::{Deserialize, Serialize};

/// Tunables for the layout engine.
///
/// Missing fields fall back to the defaults when deserializing, so a host can
/// override just the values it cares about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
	/// Iterations for a cold layout.
	pub iterations: usize,
	/// Iterations when adding nodes to an existing layout.
	pub incremental_iterations: usize,
	/// Pull toward the origin, applied every iteration.
	pub gravity: f32,
	/// Multiplier on node repulsion.
	pub scaling_ratio: f32,
	/// Exponent applied to edge weights. Only matters with a weight function.
	pub edge_weight_influence: f32,
	/// Compress raw coordinates logarithmically before normalizing.
	pub log_mode: bool,
	/// Canvas margin kept free on every side.
	pub padding: f64,
	/// Default number of frames for animated layouts.
	pub animation_steps: usize,
	/// Spatial-partitioning approximation of repulsion. Not supported: the
	/// simulation always computes exact pairwise repulsion, and setting this
	/// only logs a warning.
	pub approximate_repulsion: bool,

	/// Repulsion strength between every pair of nodes.
	pub force_charge: f32,
	/// Spring constant of an edge.
	pub force_spring: f32,
	/// Upper bound on the force applied to a node per step.
	pub force_max: f32,
	/// Upper bound on node speed.
	pub node_speed: f32,
	/// Fraction of velocity kept between steps.
	pub damping_factor: f32,
	/// Seconds advanced per iteration.
	pub time_step: f32,
}

impl Default for LayoutSettings {
	fn default() -> Self {
		Self {
			iterations: 500,
			incremental_iterations: 100,
			gravity: 1.0,
			scaling_ratio: 1.0,
			edge_weight_influence: 1.0,
			log_mode: false,
			padding: 50.0,
			animation_steps: 30,
			approximate_repulsion: false,
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			time_step: 0.016,
		}
	}
}

impl LayoutSettings {
	/// Parses a (possibly partial) JSON object of overrides.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	pub(crate) fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge * self.scaling_ratio,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}
