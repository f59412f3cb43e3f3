use rand::Rng;

use crate::track::{LayoutNode, Position};

/// Drawable area with a margin kept free on every side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
	/// Full width.
	pub width: f64,
	/// Full height.
	pub height: f64,
	/// Margin on every side, at most half of either dimension.
	pub padding: f64,
}

impl Canvas {
	/// Clamps the padding so that `padding <= dimension - padding` holds on
	/// both axes.
	pub fn new(width: f64, height: f64, padding: f64) -> Self {
		let (width, height) = (width.max(0.0), height.max(0.0));
		let padding = padding.max(0.0).min(width / 2.0).min(height / 2.0);
		Self {
			width,
			height,
			padding,
		}
	}

	/// Top-left corner of the usable area.
	pub fn min(&self) -> Position {
		Position::new(self.padding, self.padding)
	}

	/// Bottom-right corner of the usable area.
	pub fn max(&self) -> Position {
		Position::new(self.width - self.padding, self.height - self.padding)
	}

	/// True if `pos` lies within the usable area.
	pub fn contains(&self, pos: Position) -> bool {
		pos.within(self.min(), self.max())
	}

	/// Stretches `raw` over the usable area using its bounding box and writes
	/// the results into `nodes`.
	///
	/// A degenerate axis (one node, or all nodes aligned) uses a range of 1,
	/// which puts every node on the low edge of that axis.
	pub fn place(&self, nodes: &mut [LayoutNode], raw: &[Position], log_mode: bool) {
		let compressed;
		let raw: &[Position] = if log_mode {
			compressed = log_compress(raw);
			&compressed
		} else {
			raw
		};

		let (lo, hi) = bounds(raw);
		let range = |lo: f64, hi: f64| if hi - lo > f64::EPSILON { hi - lo } else { 1.0 };
		let (rx, ry) = (range(lo.x, hi.x), range(lo.y, hi.y));
		let (min, max) = (self.min(), self.max());

		for (node, p) in nodes.iter_mut().zip(raw) {
			let x = min.x + (p.x - lo.x) / rx * (max.x - min.x);
			let y = min.y + (p.y - lo.y) / ry * (max.y - min.y);
			node.position = Some(Position::new(x.clamp(min.x, max.x), y.clamp(min.y, max.y)));
		}
	}

	/// Gives every node an independent uniform-random position.
	pub fn scatter<R: Rng + ?Sized>(&self, nodes: &mut [LayoutNode], rng: &mut R) {
		let (min, max) = (self.min(), self.max());
		for node in nodes {
			node.position = Some(Position::new(
				rng.gen_range(min.x..=max.x),
				rng.gen_range(min.y..=max.y),
			));
		}
	}
}

/// Per-axis minimum and maximum.
fn bounds(raw: &[Position]) -> (Position, Position) {
	raw.iter().fold(
		(
			Position::new(f64::INFINITY, f64::INFINITY),
			Position::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
		),
		|(lo, hi), p| {
			(
				Position::new(lo.x.min(p.x), lo.y.min(p.y)),
				Position::new(hi.x.max(p.x), hi.y.max(p.y)),
			)
		},
	)
}

/// Pulls every point toward the centroid so its distance `r` becomes
/// `ln(1 + r)`.
pub fn log_compress(raw: &[Position]) -> Vec<Position> {
	if raw.is_empty() {
		return Vec::new();
	}
	let n = raw.len() as f64;
	let (cx, cy) = raw
		.iter()
		.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x / n, sy + p.y / n));

	raw.iter()
		.map(|p| {
			let (dx, dy) = (p.x - cx, p.y - cy);
			let r = (dx * dx + dy * dy).sqrt();
			if r <= f64::EPSILON {
				return Position::new(cx, cy);
			}
			let k = r.ln_1p() / r;
			Position::new(cx + dx * k, cy + dy * k)
		})
		.collect()
}
