use thiserror::Error;

/// Why a force simulation could not produce positions.
///
/// The layout engine never returns these to callers; it logs them and falls
/// back to random placement.
#[derive(Debug, Error)]
pub enum LayoutError {
	/// A coordinate became NaN or infinite.
	#[error("simulation diverged after {iterations} iterations")]
	Diverged {
		/// Iterations run when it was noticed.
		iterations: usize,
	},

	/// The backend panicked; carries the panic message.
	#[error("simulation panicked: {0}")]
	Panicked(String),

	/// The backend reported an error or returned malformed output.
	#[error("simulation backend failed: {0}")]
	Backend(String),
}

/// Failures reported by a catalog client.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// No usable credential.
	#[error("authentication failed: {0}")]
	Auth(String),

	/// Transport failure or an error status.
	#[error("catalog request failed: {0}")]
	Request(String),

	/// The response body did not have the expected shape.
	#[error("malformed catalog response: {0}")]
	Decode(#[from] serde_json::Error),
}
