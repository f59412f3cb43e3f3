//! Search a music catalog, collect tracks, link the ones that share genres and
//! lay the resulting graph out with a force simulation.
//!
//! [`SongCollection`] owns the tracks and their genre connections,
//! [`LayoutEngine`] positions an exported snapshot of them on a canvas, and
//! [`Session`] ties both to a [`CatalogClient`] for a front end.

pub mod catalog;
pub mod collection;
/// Error types.
pub mod error;
pub mod genre;
pub mod layout;
pub mod session;
/// Tracks and positioned layout nodes.
pub mod track;

pub use catalog::{CatalogClient, CatalogTrack, search_tracks};
pub use collection::SongCollection;
pub use error::{CatalogError, LayoutError};
pub use layout::{LayoutEngine, LayoutSettings};
pub use session::{Notice, Session};
pub use track::{LayoutNode, Position, Track};

// Pulled in only to enable its browser entropy source for `rand`.
#[cfg(target_arch = "wasm32")]
use getrandom as _;

/// Initialize logging and panic hooks for the WASM target.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
	use log::{Level, info};

	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}
