//! Boundary to the remote music catalog.
//!
//! The catalog itself (HTTP, credentials, token refresh) lives behind
//! [`CatalogClient`]. This module turns what a client returns into
//! [`Track`]s and absorbs client failures so callers only ever see a list.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::track::Track;

/// An artist credited on a catalog track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
	/// Catalog artist id, used for genre lookup.
	pub id: String,
	/// Display name.
	pub name: String,
}

/// A track as the catalog returns it, before genre enrichment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
	/// Catalog track id.
	pub id: String,
	/// Track name.
	#[serde(rename = "name")]
	pub title: String,
	/// Credited artists, main artist first.
	#[serde(default)]
	pub artists: Vec<ArtistRef>,
}

/// Search and artist lookup against a remote catalog.
///
/// Implementations own authentication; a call that needs a fresh credential
/// is expected to obtain it before returning.
pub trait CatalogClient {
	/// Up to `limit` tracks matching `query`.
	fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>, CatalogError>;

	/// Genre tags per artist id. Artists without data may be omitted.
	fn artist_genres(
		&self,
		artist_ids: &[String],
	) -> Result<HashMap<String, Vec<String>>, CatalogError>;
}

/// Builds a [`Track`] from a catalog track and per-artist genres.
///
/// Collaborators are comma-joined. Genres from every artist are merged and
/// normalized; a track with no genre data gets the `unknown` tag.
pub fn enrich(raw: &CatalogTrack, genres: &HashMap<String, Vec<String>>) -> Track {
	let artist = raw
		.artists
		.iter()
		.map(|a| a.name.as_str())
		.collect::<Vec<_>>()
		.join(", ");
	let tags = raw
		.artists
		.iter()
		.filter_map(|a| genres.get(&a.id))
		.flatten();
	Track::new(raw.id.clone(), raw.title.clone(), artist, tags)
}

/// Searches the catalog and returns enriched tracks.
///
/// A blank query returns nothing without contacting the catalog. A failed
/// search is logged and returns nothing; a failed genre lookup is logged and
/// leaves every track tagged `unknown`.
pub fn search_tracks<C>(client: &C, query: &str, limit: usize) -> Vec<Track>
where
	C: CatalogClient + ?Sized,
{
	let query = query.trim();
	if query.is_empty() {
		debug!("ignoring empty search query");
		return Vec::new();
	}

	let raw = match client.search(query, limit) {
		Ok(raw) => raw,
		Err(err) => {
			warn!("search for {:?} failed: {}", query, err);
			return Vec::new();
		}
	};

	let mut artist_ids: Vec<String> = Vec::new();
	for artist in raw.iter().flat_map(|t| &t.artists) {
		if !artist_ids.contains(&artist.id) {
			artist_ids.push(artist.id.clone());
		}
	}

	let genres = if artist_ids.is_empty() {
		HashMap::new()
	} else {
		client.artist_genres(&artist_ids).unwrap_or_else(|err| {
			warn!("genre lookup for {} artists failed: {}", artist_ids.len(), err);
			HashMap::new()
		})
	};

	debug!("search for {:?} returned {} tracks", query, raw.len());
	raw.iter().map(|t| enrich(t, &genres)).collect()
}

#[derive(Deserialize)]
struct SearchResponse {
	tracks: Page<CatalogTrack>,
}

#[derive(Deserialize)]
struct Page<T> {
	#[serde(default = "Vec::new")]
	items: Vec<T>,
}

#[derive(Deserialize)]
struct ArtistsResponse {
	artists: Vec<ArtistGenres>,
}

#[derive(Deserialize)]
struct ArtistGenres {
	id: String,
	#[serde(default)]
	genres: Vec<String>,
}

/// Decodes a `{"tracks": {"items": [...]}}` search body.
pub fn parse_search_response(json: &str) -> Result<Vec<CatalogTrack>, CatalogError> {
	let response: SearchResponse = serde_json::from_str(json)?;
	Ok(response.tracks.items)
}

/// Decodes a `{"artists": [{"id": ..., "genres": [...]}]}` body.
pub fn parse_artists_response(json: &str) -> Result<HashMap<String, Vec<String>>, CatalogError> {
	let response: ArtistsResponse = serde_json::from_str(json)?;
	Ok(response
		.artists
		.into_iter()
		.map(|a| (a.id, a.genres))
		.collect())
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use pretty_assertions::assert_eq;

	use super::*;
	use crate::genre::UNKNOWN_GENRE;

	struct FakeCatalog {
		tracks: Vec<CatalogTrack>,
		genres: Result<HashMap<String, Vec<String>>, String>,
		searches: Cell<usize>,
	}

	impl CatalogClient for FakeCatalog {
		fn search(&self, _query: &str, limit: usize) -> Result<Vec<CatalogTrack>, CatalogError> {
			self.searches.set(self.searches.get() + 1);
			Ok(self.tracks.iter().take(limit).cloned().collect())
		}

		fn artist_genres(
			&self,
			_artist_ids: &[String],
		) -> Result<HashMap<String, Vec<String>>, CatalogError> {
			self.genres.clone().map_err(CatalogError::Request)
		}
	}

	fn raw(id: &str, artists: &[(&str, &str)]) -> CatalogTrack {
		CatalogTrack {
			id: id.into(),
			title: format!("Song {id}"),
			artists: artists
				.iter()
				.map(|&(id, name)| ArtistRef {
					id: id.into(),
					name: name.into(),
				})
				.collect(),
		}
	}

	#[test]
	fn enrich_merges_collaborator_genres() {
		let genres = HashMap::from([
			("a1".to_string(), vec!["Indie Rock".to_string(), "pop".to_string()]),
			("a2".to_string(), vec!["indie rock".to_string(), "Shoegaze".to_string()]),
		]);
		let track = enrich(&raw("t", &[("a1", "Alpha"), ("a2", "Beta")]), &genres);
		assert_eq!(track.artist, "Alpha, Beta");
		assert_eq!(track.genres, vec!["indie rock", "pop", "shoegaze"]);
	}

	#[test]
	fn blank_query_skips_the_client() {
		let catalog = FakeCatalog {
			tracks: vec![raw("t", &[("a1", "Alpha")])],
			genres: Ok(HashMap::new()),
			searches: Cell::new(0),
		};
		assert!(search_tracks(&catalog, "   ", 10).is_empty());
		assert_eq!(catalog.searches.get(), 0);
	}

	#[test]
	fn failed_genre_lookup_falls_back_to_unknown() {
		let catalog = FakeCatalog {
			tracks: vec![raw("t1", &[("a1", "Alpha")]), raw("t2", &[("a2", "Beta")])],
			genres: Err("rate limited".into()),
			searches: Cell::new(0),
		};
		let tracks = search_tracks(&catalog, "alpha", 1);
		assert_eq!(tracks.len(), 1);
		assert_eq!(tracks[0].genres, vec![UNKNOWN_GENRE]);
	}

	#[test]
	fn parses_search_and_artist_bodies() {
		let tracks = parse_search_response(
			r#"{"tracks": {"items": [
				{"id": "1", "name": "One", "artists": [{"id": "a", "name": "A"}]},
				{"id": "2", "name": "Two"}
			]}}"#,
		)
		.unwrap();
		assert_eq!(tracks.len(), 2);
		assert_eq!(tracks[0].title, "One");
		assert!(tracks[1].artists.is_empty());

		let genres =
			parse_artists_response(r#"{"artists": [{"id": "a", "genres": ["rock"]}, {"id": "b"}]}"#)
				.unwrap();
		assert_eq!(genres["a"], vec!["rock"]);
		assert!(genres["b"].is_empty());

		assert!(matches!(
			parse_search_response("{\"tracks\": 3}"),
			Err(CatalogError::Decode(_))
		));
	}
}
