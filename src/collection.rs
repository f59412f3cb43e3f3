//! The song collection and its genre connection graph.
//!
//! Connections are decided once, when a track is added, by comparing it with
//! every track already present. Later additions only add edges incident to
//! themselves. The relation is kept symmetric and free of self-loops, and it
//! never references a track that is not in the collection.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::genre::has_match;
use crate::track::{LayoutNode, Position, Track};

/// Tracks keyed by id plus the symmetric genre connection relation.
#[derive(Debug, Default)]
pub struct SongCollection {
	tracks: HashMap<String, Track>,
	order: Vec<String>,
	connections: HashMap<String, BTreeSet<String>>,
	positions: HashMap<String, Position>,
}

impl SongCollection {
	/// Empty collection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a track and links it to every compatible track already present.
	///
	/// Returns `false` and leaves the collection untouched if a track with the
	/// same id exists.
	pub fn add_track(&mut self, track: Track) -> bool {
		if self.tracks.contains_key(&track.id) {
			return false;
		}

		let id = track.id.clone();
		let linked: Vec<String> = self
			.order
			.iter()
			.filter(|other| {
				self.tracks
					.get(*other)
					.is_some_and(|o| has_match(&o.genres, &track.genres))
			})
			.cloned()
			.collect();

		for other in &linked {
			self.connections
				.entry(other.clone())
				.or_default()
				.insert(id.clone());
		}
		if !linked.is_empty() {
			self.connections
				.insert(id.clone(), linked.into_iter().collect());
		}

		debug!(
			"added track {} ({} connections)",
			id,
			self.connections.get(&id).map_or(0, BTreeSet::len)
		);
		self.order.push(id.clone());
		self.tracks.insert(id, track);
		true
	}

	/// Removes a track and every connection touching it.
	pub fn remove_track(&mut self, id: &str) -> bool {
		if self.tracks.remove(id).is_none() {
			return false;
		}
		self.order.retain(|o| o != id);
		self.positions.remove(id);

		for other in self.connections.remove(id).unwrap_or_default() {
			if let Some(back) = self.connections.get_mut(&other) {
				back.remove(id);
				if back.is_empty() {
					self.connections.remove(&other);
				}
			}
		}
		debug!("removed track {}", id);
		true
	}

	/// Tracks directly connected to `id`, ordered by id.
	pub fn connected(&self, id: &str) -> Vec<&Track> {
		self.connections
			.get(id)
			.into_iter()
			.flatten()
			.filter_map(|other| self.tracks.get(other))
			.collect()
	}

	/// Symmetric connection test.
	pub fn are_connected(&self, a: &str, b: &str) -> bool {
		self.connections.get(a).is_some_and(|set| set.contains(b))
	}

	/// Drops every track, connection and remembered position.
	pub fn clear(&mut self) {
		self.tracks.clear();
		self.order.clear();
		self.connections.clear();
		self.positions.clear();
	}

	/// Snapshot of every track with its last known position and a copy of its
	/// connections, in insertion order.
	pub fn export_nodes(&self) -> Vec<LayoutNode> {
		self.tracks()
			.map(|track| LayoutNode {
				id: track.id.clone(),
				track: track.clone(),
				position: self.positions.get(&track.id).copied(),
				connections: self
					.connections
					.get(&track.id)
					.map(|set| set.iter().cloned().collect())
					.unwrap_or_default(),
			})
			.collect()
	}

	/// Remembers positions produced by the layout engine.
	///
	/// Nodes for tracks no longer in the collection are ignored.
	pub fn record_positions(&mut self, nodes: &[LayoutNode]) {
		for node in nodes {
			if let (Some(pos), true) = (node.position, self.tracks.contains_key(&node.id)) {
				self.positions.insert(node.id.clone(), pos);
			}
		}
	}

	/// Tracks in insertion order.
	pub fn tracks(&self) -> impl Iterator<Item = &Track> {
		self.order.iter().filter_map(|id| self.tracks.get(id))
	}

	/// Track by id.
	pub fn get(&self, id: &str) -> Option<&Track> {
		self.tracks.get(id)
	}

	/// True if a track with `id` is in the collection.
	pub fn contains(&self, id: &str) -> bool {
		self.tracks.contains_key(id)
	}

	/// Number of tracks.
	pub fn len(&self) -> usize {
		self.tracks.len()
	}

	/// True when there are no tracks.
	pub fn is_empty(&self) -> bool {
		self.tracks.is_empty()
	}

	/// Number of undirected connections.
	pub fn edge_count(&self) -> usize {
		self.connections.values().map(BTreeSet::len).sum::<usize>() / 2
	}
}
