use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};
use log::{debug, warn};

use super::settings::LayoutSettings;
use super::types::GraphData;
use crate::error::LayoutError;
use crate::track::Position;

/// Radius of the ring unseeded nodes start on.
pub const SEED_RADIUS: f64 = 100.0;
const NODE_MASS: f32 = 10.0;
/// Fraction of the distance to the center removed per second at gravity 1.
const GRAVITY_PULL: f32 = 0.05;
/// Upper bound on the per-iteration pull from a weighted edge.
const MAX_WEIGHT_PULL: f32 = 0.25;

/// A running force simulation.
pub trait Simulation {
	/// Runs `iterations` more steps.
	fn advance(&mut self, iterations: usize) -> Result<(), LayoutError>;

	/// Raw coordinates, one per input node, in input order.
	fn positions(&self) -> Vec<Position>;
}

/// Builds simulations for the layout engine.
pub trait SimulationBackend {
	/// Creates a simulation seeded from `data`.
	fn build(
		&self,
		data: &GraphData,
		settings: &LayoutSettings,
	) -> Result<Box<dyn Simulation>, LayoutError>;
}

/// The default backend, driven by `force_graph`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForceGraphBackend;

impl SimulationBackend for ForceGraphBackend {
	fn build(
		&self,
		data: &GraphData,
		settings: &LayoutSettings,
	) -> Result<Box<dyn Simulation>, LayoutError> {
		Ok(Box::new(ForceGraphState::new(data, settings)))
	}
}

/// `force_graph` simulation plus centering gravity and weighted-edge pull.
///
/// Each node's user data is its slot in the input order.
pub struct ForceGraphState {
	graph: ForceGraph<usize, ()>,
	len: usize,
	/// Weighted edges with their extra pull factor (`weight^influence - 1`).
	weighted: Vec<(DefaultNodeIdx, DefaultNodeIdx, f32)>,
	center: (f32, f32),
	gravity: f32,
	spring: f32,
	dt: f32,
	iterations: usize,
}

impl ForceGraphState {
	/// Seeds a simulation from `data`.
	pub fn new(data: &GraphData, settings: &LayoutSettings) -> Self {
		if settings.approximate_repulsion {
			warn!("approximate repulsion is not supported, using exact pairwise repulsion");
		}
		let mut graph = ForceGraph::new(settings.simulation_parameters());
		let center = ring_center(data);
		let free = data.nodes.iter().filter(|n| n.seed.is_none()).count().max(1);
		let mut idx_by_slot = Vec::with_capacity(data.nodes.len());
		let mut ring_slot = 0;

		for (slot, node) in data.nodes.iter().enumerate() {
			let (x, y) = match node.seed {
				Some(pos) => (pos.x as f32, pos.y as f32),
				None => {
					let angle = (ring_slot as f64) * 2.0 * PI / free as f64;
					ring_slot += 1;
					(
						(center.0 as f64 + SEED_RADIUS * angle.cos()) as f32,
						(center.1 as f64 + SEED_RADIUS * angle.sin()) as f32,
					)
				}
			};

			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: NODE_MASS,
				is_anchor: node.pinned,
				user_data: slot,
			});
			idx_by_slot.push(idx);
		}

		let mut weighted = Vec::new();
		for link in &data.links {
			let (Some(&src), Some(&tgt)) = (idx_by_slot.get(link.source), idx_by_slot.get(link.target))
			else {
				continue;
			};
			graph.add_edge(src, tgt, EdgeData::default());

			let extra = link.weight.powf(settings.edge_weight_influence) - 1.0;
			if extra.is_finite() && extra > 0.0 {
				weighted.push((src, tgt, extra));
			}
		}

		debug!(
			"force simulation: {} nodes, {} links ({} weighted)",
			data.nodes.len(),
			data.links.len(),
			weighted.len()
		);

		Self {
			graph,
			len: data.nodes.len(),
			weighted,
			center,
			gravity: settings.gravity,
			spring: settings.force_spring,
			dt: settings.time_step,
			iterations: 0,
		}
	}

	/// Total iterations run so far.
	pub fn iterations(&self) -> usize {
		self.iterations
	}

	fn apply_gravity(&mut self) {
		let k = (self.gravity * GRAVITY_PULL * self.dt).clamp(0.0, 1.0);
		if k == 0.0 {
			return;
		}
		let (cx, cy) = self.center;
		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			node.data.x -= (node.data.x - cx) * k;
			node.data.y -= (node.data.y - cy) * k;
		});
	}

	fn apply_edge_weights(&mut self) {
		if self.weighted.is_empty() {
			return;
		}
		let mut coords = vec![(0.0_f32, 0.0_f32); self.len];
		let mut slots = HashMap::with_capacity(self.len);
		self.graph.visit_nodes(|node| {
			if let Some(c) = coords.get_mut(node.data.user_data) {
				*c = (node.x(), node.y());
			}
			slots.insert(node.index(), node.data.user_data);
		});

		let mut shift = vec![(0.0_f32, 0.0_f32); self.len];
		for &(a, b, extra) in &self.weighted {
			let (Some(&sa), Some(&sb)) = (slots.get(&a), slots.get(&b)) else {
				continue;
			};
			let ((ax, ay), (bx, by)) = (coords[sa], coords[sb]);
			let k = (self.spring * extra * self.dt).min(MAX_WEIGHT_PULL);
			let (dx, dy) = ((bx - ax) * k, (by - ay) * k);
			shift[sa].0 += dx;
			shift[sa].1 += dy;
			shift[sb].0 -= dx;
			shift[sb].1 -= dy;
		}

		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some(&(dx, dy)) = shift.get(node.data.user_data) {
				node.data.x += dx;
				node.data.y += dy;
			}
		});
	}

	fn is_finite(&self) -> bool {
		let mut finite = true;
		self.graph.visit_nodes(|node| {
			finite &= node.x().is_finite() && node.y().is_finite();
		});
		finite
	}
}

impl Simulation for ForceGraphState {
	fn advance(&mut self, iterations: usize) -> Result<(), LayoutError> {
		for _ in 0..iterations {
			self.graph.update(self.dt);
			self.apply_gravity();
			self.apply_edge_weights();
			self.iterations += 1;
		}
		if !self.is_finite() {
			return Err(LayoutError::Diverged {
				iterations: self.iterations,
			});
		}
		Ok(())
	}

	fn positions(&self) -> Vec<Position> {
		let mut out = vec![Position::default(); self.len];
		self.graph.visit_nodes(|node| {
			if let Some(p) = out.get_mut(node.data.user_data) {
				*p = Position::new(node.x() as f64, node.y() as f64);
			}
		});
		out
	}
}

/// Gravity center and ring center: the mean of the seeded nodes, or the
/// origin when nothing is seeded.
fn ring_center(data: &GraphData) -> (f32, f32) {
	let seeds: Vec<Position> = data.nodes.iter().filter_map(|n| n.seed).collect();
	if seeds.is_empty() {
		return (0.0, 0.0);
	}
	let n = seeds.len() as f64;
	let (sx, sy) = seeds
		.iter()
		.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
	((sx / n) as f32, (sy / n) as f32)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layout::types::{GraphLink, GraphNode};

	fn graph(n: usize, links: &[(usize, usize)]) -> GraphData {
		GraphData {
			nodes: (0..n)
				.map(|i| GraphNode {
					id: i.to_string(),
					seed: None,
					pinned: false,
				})
				.collect(),
			links: links
				.iter()
				.map(|&(source, target)| GraphLink {
					source,
					target,
					weight: 1.0,
				})
				.collect(),
		}
	}

	#[test]
	fn unseeded_nodes_start_on_ring() {
		let state = ForceGraphState::new(&graph(4, &[]), &LayoutSettings::default());
		for p in state.positions() {
			let r = (p.x * p.x + p.y * p.y).sqrt();
			assert!((r - SEED_RADIUS).abs() < 1e-3, "radius {r}");
		}
	}

	#[test]
	fn pinned_nodes_do_not_move() {
		let mut data = graph(3, &[(0, 1), (1, 2)]);
		data.nodes[0].seed = Some(Position::new(400.0, 300.0));
		data.nodes[0].pinned = true;

		let mut state = ForceGraphState::new(&data, &LayoutSettings::default());
		state.advance(50).unwrap();
		assert_eq!(state.iterations(), 50);
		let p = state.positions()[0];
		assert!((p.x - 400.0).abs() < 1e-3 && (p.y - 300.0).abs() < 1e-3);
	}

	#[test]
	fn advance_keeps_coordinates_finite() {
		let mut state = ForceGraphState::new(
			&graph(6, &[(0, 1), (1, 2), (3, 4)]),
			&LayoutSettings::default(),
		);
		state.advance(200).unwrap();
		assert!(
			state
				.positions()
				.iter()
				.all(|p| p.x.is_finite() && p.y.is_finite())
		);
	}
}
