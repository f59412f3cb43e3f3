use std::collections::{HashMap, HashSet};

use log::warn;

use crate::track::{LayoutNode, Position, Track};

/// Edge weight derived from the two endpoint tracks.
pub type EdgeWeightFn = dyn Fn(&Track, &Track) -> f32;

/// A node as the simulation sees it.
#[derive(Clone, Debug)]
pub struct GraphNode {
	/// Track id.
	pub id: String,
	/// Starting point in simulation space. Unseeded nodes are placed on a ring.
	pub seed: Option<Position>,
	/// Pinned nodes keep their seed position for the whole run.
	pub pinned: bool,
}

/// An undirected edge between two nodes.
#[derive(Clone, Debug)]
pub struct GraphLink {
	/// Index into [`GraphData::nodes`].
	pub source: usize,
	/// Index into [`GraphData::nodes`].
	pub target: usize,
	/// 1 for a plain edge. Larger weights pull harder.
	pub weight: f32,
}

/// Undirected graph handed to a simulation backend.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
	/// Nodes in snapshot order.
	pub nodes: Vec<GraphNode>,
	/// One link per connected pair.
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// Builds the graph from a layout snapshot.
	///
	/// Each undirected pair becomes one link. Connections to ids that are not
	/// part of `nodes` are logged and skipped. Nodes keep their input order.
	pub fn from_layout_nodes(nodes: &[LayoutNode], weigh: Option<&EdgeWeightFn>) -> Self {
		let id_to_idx: HashMap<&str, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id.as_str(), i))
			.collect();
		let mut seen: HashSet<(usize, usize)> = HashSet::new();
		let mut links = Vec::new();

		for (src, node) in nodes.iter().enumerate() {
			for target in &node.connections {
				let Some(&tgt) = id_to_idx.get(target.as_str()) else {
					warn!("skipping edge {} -> {}: target not in layout", node.id, target);
					continue;
				};
				if src == tgt || !seen.insert((src.min(tgt), src.max(tgt))) {
					continue;
				}
				let weight = weigh.map_or(1.0, |f| f(&node.track, &nodes[tgt].track));
				links.push(GraphLink {
					source: src,
					target: tgt,
					weight,
				});
			}
		}

		Self {
			nodes: nodes
				.iter()
				.map(|node| GraphNode {
					id: node.id.clone(),
					seed: None,
					pinned: false,
				})
				.collect(),
			links,
		}
	}

	/// Seeds and pins the first `count` nodes at their known positions.
	///
	/// Nodes without a position stay free.
	pub fn pin_prefix(&mut self, nodes: &[LayoutNode], count: usize) {
		for (graph_node, node) in self.nodes.iter_mut().zip(nodes).take(count) {
			if let Some(pos) = node.position {
				graph_node.seed = Some(pos);
				graph_node.pinned = true;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str, connections: &[&str]) -> LayoutNode {
		LayoutNode::new(
			Track::new(id, id, "Artist", ["rock"]),
			connections.iter().map(|c| c.to_string()).collect(),
		)
	}

	#[test]
	fn symmetric_connections_make_one_link() {
		let nodes = vec![node("a", &["b"]), node("b", &["a"])];
		let graph = GraphData::from_layout_nodes(&nodes, None);
		assert_eq!(graph.links.len(), 1);
		assert_eq!((graph.links[0].source, graph.links[0].target), (0, 1));
		assert_eq!(graph.links[0].weight, 1.0);
	}

	#[test]
	fn missing_targets_are_skipped() {
		let nodes = vec![node("a", &["b", "ghost"]), node("b", &["a"])];
		let graph = GraphData::from_layout_nodes(&nodes, None);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.links.len(), 1);
	}

	#[test]
	fn weights_come_from_hook() {
		let nodes = vec![node("a", &["b"]), node("b", &["a"])];
		let weigh: &EdgeWeightFn = &|_: &Track, _: &Track| 3.0;
		let graph = GraphData::from_layout_nodes(&nodes, Some(weigh));
		assert_eq!(graph.links[0].weight, 3.0);
	}

	#[test]
	fn pinning_needs_a_position() {
		let mut nodes = vec![node("a", &[]), node("b", &[]), node("c", &[])];
		nodes[0].position = Some(Position::new(1.0, 2.0));
		let mut graph = GraphData::from_layout_nodes(&nodes, None);
		graph.pin_prefix(&nodes, 2);
		assert!(graph.nodes[0].pinned);
		assert_eq!(graph.nodes[0].seed, Some(Position::new(1.0, 2.0)));
		assert!(!graph.nodes[1].pinned);
		assert!(!graph.nodes[2].pinned);
	}
}
