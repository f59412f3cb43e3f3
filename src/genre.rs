//! Genre compatibility rules.
//!
//! Two genre labels match when one contains the other, ignoring case. This is
//! deliberately loose: `"rock"` and `"indie rock"` match, `"jazz"` and
//! `"metal"` do not. There is no stemming and no genre taxonomy.

/// Sentinel tag for tracks whose artists carry no genre data.
pub const UNKNOWN_GENRE: &str = "unknown";

/// True when either label is a case-insensitive substring of the other.
pub fn genres_match(a: &str, b: &str) -> bool {
	let (a, b) = (a.to_lowercase(), b.to_lowercase());
	a.contains(&b) || b.contains(&a)
}

/// True when at least one pair across the two sets matches.
pub fn has_match<A, B>(a: &[A], b: &[B]) -> bool
where
	A: AsRef<str>,
	B: AsRef<str>,
{
	a.iter()
		.any(|ga| b.iter().any(|gb| genres_match(ga.as_ref(), gb.as_ref())))
}

/// Number of matching word pairs between two genre sets.
///
/// Every genre label is split on whitespace and each word of `a` is compared
/// with each word of `b` using the same containment rule as [`genres_match`].
/// Connections never consult this; it feeds the optional edge weighting of
/// the layout engine.
pub fn match_score<A, B>(a: &[A], b: &[B]) -> usize
where
	A: AsRef<str>,
	B: AsRef<str>,
{
	let words_b: Vec<&str> = b
		.iter()
		.flat_map(|g| g.as_ref().split_whitespace())
		.collect();

	a.iter()
		.flat_map(|g| g.as_ref().split_whitespace())
		.map(|wa| words_b.iter().filter(|wb| genres_match(wa, wb)).count())
		.sum()
}

/// Lower-cases, trims and de-duplicates genre tags, keeping first-seen order.
///
/// Falls back to [`UNKNOWN_GENRE`] when nothing usable remains.
pub fn normalize_genres<I, S>(genres: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut out: Vec<String> = Vec::new();
	for genre in genres {
		let genre = genre.as_ref().trim().to_lowercase();
		if !genre.is_empty() && !out.contains(&genre) {
			out.push(genre);
		}
	}
	if out.is_empty() {
		out.push(UNKNOWN_GENRE.to_string());
	}
	out
}
