//! User-facing actions over a collection, a layout engine and a catalog.
//!
//! A front end binds its buttons to these methods and shows the returned
//! [`Notice`]s. Nothing here renders.

use std::rc::Rc;

use log::info;
use thiserror::Error;

use crate::catalog::{CatalogClient, search_tracks};
use crate::collection::SongCollection;
use crate::layout::{AnimationHandle, AnimationStep, FrameScheduler, LayoutEngine};
use crate::track::{LayoutNode, Track};

const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Something to tell the user instead of doing what they asked.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Notice {
	/// The search box was blank.
	#[error("Type something to search for")]
	EmptyQuery,

	/// The catalog returned nothing, or could not be reached.
	#[error("No tracks found for \"{0}\"")]
	NoResults(String),

	/// The track is already collected.
	#[error("\"{0}\" is already in your collection")]
	AlreadyAdded(String),

	/// No such track in the search results or the collection.
	#[error("Track {0} is not available")]
	NotFound(String),

	/// Nothing to lay out.
	#[error("Add some tracks before drawing the graph")]
	EmptyCollection,

	/// Clearing needs confirmation; carries the track count.
	#[error("This removes all {0} tracks. Confirm to continue")]
	ConfirmClear(usize),

	/// Another layout has not finished.
	#[error("A layout is already running")]
	LayoutBusy,
}

/// One user's collection, search results and layout engine.
pub struct Session<C> {
	catalog: C,
	collection: SongCollection,
	engine: LayoutEngine,
	results: Vec<Track>,
	search_limit: usize,
}

impl<C: CatalogClient> Session<C> {
	/// Empty session searching `catalog`.
	pub fn new(catalog: C, engine: LayoutEngine) -> Self {
		Self {
			catalog,
			collection: SongCollection::new(),
			engine,
			results: Vec::new(),
			search_limit: DEFAULT_SEARCH_LIMIT,
		}
	}

	/// Caps how many tracks a search returns.
	pub fn with_search_limit(mut self, limit: usize) -> Self {
		self.search_limit = limit;
		self
	}

	/// The tracks collected so far.
	pub fn collection(&self) -> &SongCollection {
		&self.collection
	}

	/// The layout engine, e.g. to check whether a layout is running.
	pub fn engine(&self) -> &LayoutEngine {
		&self.engine
	}

	/// Results of the last successful search.
	pub fn results(&self) -> &[Track] {
		&self.results
	}

	/// Replaces the search results. Previous results are kept on failure.
	pub fn search(&mut self, query: &str) -> Result<&[Track], Notice> {
		let query = query.trim();
		if query.is_empty() {
			return Err(Notice::EmptyQuery);
		}
		let found = search_tracks(&self.catalog, query, self.search_limit);
		if found.is_empty() {
			return Err(Notice::NoResults(query.to_string()));
		}
		info!("search {:?}: {} results", query, found.len());
		self.results = found;
		Ok(&self.results)
	}

	/// Adds a track from the current search results.
	pub fn add(&mut self, id: &str) -> Result<(), Notice> {
		let track = self
			.results
			.iter()
			.find(|t| t.id == id)
			.cloned()
			.ok_or_else(|| Notice::NotFound(id.to_string()))?;
		self.add_track(track)
	}

	/// Adds a track that did not come from a search.
	pub fn add_track(&mut self, track: Track) -> Result<(), Notice> {
		let title = track.title.clone();
		if !self.collection.add_track(track) {
			return Err(Notice::AlreadyAdded(title));
		}
		info!("added {:?}, collection has {} tracks", title, self.collection.len());
		Ok(())
	}

	/// Removes a track and its connections.
	pub fn remove(&mut self, id: &str) -> Result<(), Notice> {
		if !self.collection.remove_track(id) {
			return Err(Notice::NotFound(id.to_string()));
		}
		info!("removed {}, collection has {} tracks", id, self.collection.len());
		Ok(())
	}

	/// Empties the collection once the user has confirmed.
	///
	/// Without confirmation a non-empty collection is left alone and the
	/// notice says how many tracks would go. Returns how many were removed.
	pub fn clear(&mut self, confirmed: bool) -> Result<usize, Notice> {
		let count = self.collection.len();
		if count > 0 && !confirmed {
			return Err(Notice::ConfirmClear(count));
		}
		self.collection.clear();
		info!("cleared {} tracks", count);
		Ok(count)
	}

	/// Lays out the whole collection and remembers the positions.
	pub fn layout(&mut self, width: f64, height: f64) -> Result<Vec<LayoutNode>, Notice> {
		let nodes = self.snapshot()?;
		let nodes = self.engine.compute_positions(nodes, width, height);
		self.collection.record_positions(&nodes);
		Ok(nodes)
	}

	/// Places tracks added since the last layout, keeping the others where
	/// they were as far as possible.
	pub fn layout_new(&mut self, width: f64, height: f64) -> Result<Vec<LayoutNode>, Notice> {
		let (existing, new): (Vec<_>, Vec<_>) = self
			.snapshot()?
			.into_iter()
			.partition(|n| n.position.is_some());
		let nodes = self
			.engine
			.update_with_new_nodes(existing, new, width, height);
		self.collection.record_positions(&nodes);
		Ok(nodes)
	}

	/// Starts an animated layout of the collection as it is now.
	///
	/// The run works on a snapshot; pass the final nodes to
	/// [`Session::record_positions`] to keep them.
	pub fn animate_layout<F>(
		&self,
		width: f64,
		height: f64,
		scheduler: Rc<dyn FrameScheduler>,
		on_step: F,
	) -> Result<AnimationHandle, Notice>
	where
		F: FnMut(AnimationStep<'_>) + 'static,
	{
		let nodes = self.snapshot()?;
		let steps = self.engine.settings().animation_steps;
		Ok(self
			.engine
			.compute_animated(nodes, width, height, steps, scheduler, on_step))
	}

	/// Stores positions from a finished layout.
	pub fn record_positions(&mut self, nodes: &[LayoutNode]) {
		self.collection.record_positions(nodes);
	}

	fn snapshot(&self) -> Result<Vec<LayoutNode>, Notice> {
		if self.engine.is_running() {
			return Err(Notice::LayoutBusy);
		}
		if self.collection.is_empty() {
			return Err(Notice::EmptyCollection);
		}
		Ok(self.collection.export_nodes())
	}
}
