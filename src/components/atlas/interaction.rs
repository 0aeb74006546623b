//! Surface-agnostic input: drag-to-pin, viewport zoom/pan and selection.

use super::solver::Point;

/// Viewport transform: `screen = sim * k + (x, y)`. Applied only at render time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Uniform scale.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	/// No pan, no zoom.
	pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, k: 1.0 };

	/// Simulation → screen.
	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Screen → simulation.
	pub fn invert(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	/// Zoom by `factor` keeping the screen point `at` fixed, with `k` clamped to `bounds`.
	pub fn zoom_at(&self, at: Point, factor: f64, bounds: (f64, f64)) -> Self {
		let k = (self.k * factor).clamp(bounds.0, bounds.1);
		let ratio = k / self.k;
		Self {
			x: at.x - (at.x - self.x) * ratio,
			y: at.y - (at.y - self.y) * ratio,
			k,
		}
	}

	/// Translate by a screen-space delta.
	pub fn pan_by(&self, dx: f64, dy: f64) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
			k: self.k,
		}
	}

	/// On-screen radius of a circle of simulation radius `r`. Zoomed in it grows
	/// with `sqrt(k)` so dense regions stay readable; zoomed out it shrinks with
	/// `k`, never past the spacing the collision force keeps.
	pub fn screen_radius(&self, r: f64) -> f64 {
		r * self.k.sqrt().min(self.k)
	}
}

/// The capability any rendering surface drives. Every call is infallible:
/// ids that are unknown or currently filtered out make the call a no-op.
pub trait Interaction {
	/// Pin `id` at its current position and warm the simulation.
	fn on_drag_start(&mut self, id: &str);
	/// Move the pinned `id` to a simulation-space position.
	fn on_drag_move(&mut self, id: &str, pos: Point);
	/// Release `id` back to the forces.
	fn on_drag_end(&mut self, id: &str);
	/// Replace the viewport transform.
	fn on_zoom(&mut self, transform: ViewTransform);
	/// Select `id`, or clear the selection with `None`.
	fn on_select(&mut self, id: Option<&str>);
}
