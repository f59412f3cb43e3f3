//! Session flows against an in-memory catalog.

use std::collections::HashMap;
use std::rc::Rc;

use genre_graph::catalog::ArtistRef;
use genre_graph::layout::QueuedFrames;
use genre_graph::{
	CatalogClient, CatalogError, CatalogTrack, LayoutEngine, LayoutSettings, Notice, Session,
};
use pretty_assertions::assert_eq;

struct MemoryCatalog {
	tracks: Vec<CatalogTrack>,
	genres: HashMap<String, Vec<String>>,
	offline: bool,
}

impl MemoryCatalog {
	fn new() -> Self {
		let artist = |id: &str, name: &str| ArtistRef {
			id: id.into(),
			name: name.into(),
		};
		let track = |id: &str, title: &str, artists: Vec<ArtistRef>| CatalogTrack {
			id: id.into(),
			title: title.into(),
			artists,
		};
		Self {
			tracks: vec![
				track("t1", "Glass Hours", vec![artist("a1", "Pale Rooms")]),
				track("t2", "Static Bloom", vec![artist("a2", "Neon Harbor")]),
				track(
					"t3",
					"Late Set",
					vec![artist("a3", "Blue Ninth"), artist("a1", "Pale Rooms")],
				),
				track("t4", "No Tags", vec![artist("a4", "Nobody")]),
			],
			genres: HashMap::from([
				("a1".to_string(), vec!["Indie Rock".to_string()]),
				("a2".to_string(), vec!["rock".to_string(), "shoegaze".to_string()]),
				("a3".to_string(), vec!["jazz".to_string()]),
			]),
			offline: false,
		}
	}
}

impl CatalogClient for MemoryCatalog {
	fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>, CatalogError> {
		if self.offline {
			return Err(CatalogError::Request("offline".into()));
		}
		let query = query.to_lowercase();
		Ok(self
			.tracks
			.iter()
			.filter(|t| query == "*" || t.title.to_lowercase().contains(&query))
			.take(limit)
			.cloned()
			.collect())
	}

	fn artist_genres(
		&self,
		artist_ids: &[String],
	) -> Result<HashMap<String, Vec<String>>, CatalogError> {
		Ok(artist_ids
			.iter()
			.filter_map(|id| self.genres.get(id).map(|g| (id.clone(), g.clone())))
			.collect())
	}
}

fn session() -> Session<MemoryCatalog> {
	let settings = LayoutSettings {
		iterations: 40,
		incremental_iterations: 10,
		animation_steps: 4,
		..LayoutSettings::default()
	};
	Session::new(MemoryCatalog::new(), LayoutEngine::new(settings))
}

#[test]
fn search_add_and_layout() {
	let mut s = session();
	let found = s.search("*").unwrap();
	assert_eq!(found.len(), 4);
	assert_eq!(found[2].artist, "Blue Ninth, Pale Rooms");
	assert_eq!(found[2].genres, vec!["jazz", "indie rock"]);
	assert_eq!(found[3].genres, vec!["unknown"]);

	for id in ["t1", "t2", "t3", "t4"] {
		s.add(id).unwrap();
	}
	assert!(s.collection().are_connected("t1", "t2"));
	assert!(s.collection().are_connected("t1", "t3"));
	assert!(s.collection().are_connected("t2", "t3"));
	assert!(s.collection().connected("t4").is_empty());

	let nodes = s.layout(640.0, 480.0).unwrap();
	assert_eq!(nodes.len(), 4);
	assert!(
		s.collection()
			.export_nodes()
			.iter()
			.all(|n| n.position.is_some())
	);
}

#[test]
fn user_facing_notices() {
	let mut s = session();
	assert_eq!(s.search("  ").unwrap_err(), Notice::EmptyQuery);
	assert_eq!(
		s.search("nothing like this").unwrap_err(),
		Notice::NoResults("nothing like this".into())
	);
	assert_eq!(s.layout(640.0, 480.0).unwrap_err(), Notice::EmptyCollection);
	assert_eq!(s.add("t1").unwrap_err(), Notice::NotFound("t1".into()));

	s.search("glass").unwrap();
	s.add("t1").unwrap();
	assert_eq!(
		s.add("t1").unwrap_err(),
		Notice::AlreadyAdded("Glass Hours".into())
	);
	assert_eq!(s.collection().len(), 1);
	assert_eq!(s.remove("t9").unwrap_err(), Notice::NotFound("t9".into()));
	assert_eq!(
		Notice::AlreadyAdded("Glass Hours".into()).to_string(),
		"\"Glass Hours\" is already in your collection"
	);
}

#[test]
fn clear_needs_confirmation() {
	let mut s = session();
	s.search("*").unwrap();
	s.add("t1").unwrap();
	s.add("t2").unwrap();

	assert_eq!(s.clear(false).unwrap_err(), Notice::ConfirmClear(2));
	assert_eq!(s.collection().len(), 2);
	assert_eq!(s.clear(true).unwrap(), 2);
	assert!(s.collection().is_empty());
	assert_eq!(s.clear(false).unwrap(), 0);
}

#[test]
fn offline_catalog_reads_as_no_results() {
	let mut s = session();
	s.search("*").unwrap();
	let mut catalog = MemoryCatalog::new();
	catalog.offline = true;
	let mut offline = Session::new(catalog, LayoutEngine::default());
	assert_eq!(offline.search("glass").unwrap_err(), Notice::NoResults("glass".into()));
	assert!(offline.results().is_empty());
	assert_eq!(s.results().len(), 4);
}

#[test]
fn layout_new_places_only_the_newcomers_freely() {
	let mut s = session();
	s.search("*").unwrap();
	s.add("t1").unwrap();
	s.add("t2").unwrap();
	s.layout(640.0, 480.0).unwrap();

	s.add("t3").unwrap();
	let nodes = s.layout_new(640.0, 480.0).unwrap();
	let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	assert_eq!(ids, vec!["t1", "t2", "t3"]);
	assert!(nodes.iter().all(|n| n.position.is_some()));
}

#[test]
fn animated_layout_blocks_other_layouts_until_done() {
	let mut s = session();
	s.search("*").unwrap();
	s.add("t1").unwrap();
	s.add("t2").unwrap();

	let frames = Rc::new(QueuedFrames::new());
	let last = Rc::new(std::cell::RefCell::new(Vec::new()));
	let sink = last.clone();
	let handle = s
		.animate_layout(640.0, 480.0, frames.clone(), move |step| {
			if step.done {
				*sink.borrow_mut() = step.nodes.to_vec();
			}
		})
		.unwrap();

	assert_eq!(s.layout(640.0, 480.0).unwrap_err(), Notice::LayoutBusy);
	assert_eq!(frames.run_all(), 4);
	assert!(handle.is_finished());

	s.record_positions(&last.borrow());
	assert!(
		s.collection()
			.export_nodes()
			.iter()
			.all(|n| n.position.is_some())
	);
	assert!(s.layout(640.0, 480.0).is_ok());
}

#[test]
fn cancelled_animation_frees_the_session_without_another_frame() {
	let mut s = session();
	s.search("*").unwrap();
	s.add("t1").unwrap();
	s.add("t2").unwrap();

	let frames = Rc::new(QueuedFrames::new());
	let handle = s
		.animate_layout(640.0, 480.0, frames.clone(), |_| {})
		.unwrap();
	assert_eq!(s.layout(640.0, 480.0).unwrap_err(), Notice::LayoutBusy);

	handle.cancel();
	assert!(!s.engine().is_running());
	assert!(s.layout(640.0, 480.0).is_ok());
	assert_eq!(frames.pending(), 1);
}
