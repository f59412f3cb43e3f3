use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::genre::normalize_genres;

/// A song as the collection sees it.
///
/// Genre tags are normalized on construction: lower-cased, de-duplicated and
/// never empty (see [`crate::genre::UNKNOWN_GENRE`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
	/// Catalog id, unique within a collection.
	pub id: String,
	/// Display title.
	pub title: String,
	/// Single artist or comma-joined collaborators.
	pub artist: String,
	/// Normalized genre tags.
	pub genres: Vec<String>,
	/// When the track was created locally.
	pub added_at: DateTime<Utc>,
}

impl Track {
	/// Builds a track stamped with the current time.
	pub fn new<I, S>(
		id: impl Into<String>,
		title: impl Into<String>,
		artist: impl Into<String>,
		genres: I,
	) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			id: id.into(),
			title: title.into(),
			artist: artist.into(),
			genres: normalize_genres(genres),
			added_at: Utc::now(),
		}
	}
}

/// A point on the layout canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// Horizontal coordinate, growing to the right.
	pub x: f64,
	/// Vertical coordinate, growing downward.
	pub y: f64,
}

impl Position {
	/// Shorthand constructor.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// True when both coordinates lie inside `[min, max]` on their axis.
	pub fn within(&self, min: Position, max: Position) -> bool {
		(min.x..=max.x).contains(&self.x) && (min.y..=max.y).contains(&self.y)
	}
}

/// A track plus the layout's view of it.
///
/// `connections` is a copy taken at export time. Later changes to the
/// collection are not reflected here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
	/// Same as `track.id`.
	pub id: String,
	/// The track this node stands for.
	pub track: Track,
	/// `None` until the layout engine assigns one.
	pub position: Option<Position>,
	/// Ids of connected tracks.
	pub connections: Vec<String>,
}

impl LayoutNode {
	/// Node with no position yet.
	pub fn new(track: Track, connections: Vec<String>) -> Self {
		Self {
			id: track.id.clone(),
			track,
			position: None,
			connections,
		}
	}
}
