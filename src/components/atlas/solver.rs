//! Damped velocity relaxation under five forces with a decaying temperature.
//!
//! Each [`Simulation::step`] runs one integration pass:
//! - link springs pull connected bodies toward `link_distance`
//! - short-range charge pushes nearby bodies apart
//! - collision keeps rendered circles (plus padding) from overlapping
//! - column attraction pulls `x` toward the body's lane center
//! - timeline attraction pulls `y` toward the body's scaled year
//!
//! Forces only touch velocities. Positions of every free body are written in a
//! single pass at the end of the step, and pinned bodies are never written by
//! the solver (they still push and pull on their neighbours).

use rustc_hash::FxHashMap;

use super::config::AtlasConfig;

/// A 2-D point in simulation space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}

	/// True when both coordinates are finite.
	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

/// The individually toggleable forces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForceKind {
	/// Spring along each edge.
	Link,
	/// Pairwise short-range repulsion.
	Charge,
	/// Overlap avoidance keyed to rendered radius.
	Collision,
	/// Attraction to the lane center.
	Column,
	/// Attraction to the scaled birth year.
	Timeline,
}

impl ForceKind {
	/// Every force, in application order.
	pub const ALL: [ForceKind; 5] = [
		ForceKind::Link,
		ForceKind::Charge,
		ForceKind::Collision,
		ForceKind::Column,
		ForceKind::Timeline,
	];

	fn bit(self) -> u8 {
		1 << self as u8
	}
}

/// Set of enabled forces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForceSet(u8);

impl Default for ForceSet {
	fn default() -> Self {
		Self::all()
	}
}

impl ForceSet {
	/// All five forces.
	pub fn all() -> Self {
		Self(ForceKind::ALL.iter().fold(0, |acc, k| acc | k.bit()))
	}

	/// No forces at all.
	pub fn none() -> Self {
		Self(0)
	}

	/// Whether `kind` is enabled.
	pub fn contains(self, kind: ForceKind) -> bool {
		self.0 & kind.bit() != 0
	}

	/// Enable or disable `kind`. Returns true when the set changed.
	pub fn set(&mut self, kind: ForceKind, enabled: bool) -> bool {
		let before = self.0;
		if enabled {
			self.0 |= kind.bit();
		} else {
			self.0 &= !kind.bit();
		}
		before != self.0
	}

	/// Builder form of [`ForceSet::set`].
	pub fn with(mut self, kind: ForceKind, enabled: bool) -> Self {
		self.set(kind, enabled);
		self
	}
}

/// Mutable simulation fields of one node, parallel to the graph model's arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
	pub pos: Point,
	pub vel: Point,
	/// Rendered radius in simulation units.
	pub radius: f64,
	/// Lane center (x) and scaled year (y) this body is attracted to.
	pub target: Point,
	/// Largest `|pos.x - target.x|` the forces may push a free body to.
	/// A body already beyond it may only move back toward the target.
	pub slack: f64,
	pub pin: Option<Point>,
	/// Hidden bodies take no part in the simulation.
	pub active: bool,
}

impl Body {
	/// A free, active body at rest on `pos`.
	pub fn new(pos: Point, target: Point, radius: f64) -> Self {
		Self {
			pos,
			vel: Point::default(),
			radius,
			target,
			slack: f64::INFINITY,
			pin: None,
			active: true,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Spring {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SolverParams {
	link_strength: f64,
	link_distance: f64,
	charge_strength: f64,
	charge_distance_min: f64,
	charge_distance_max: f64,
	collision_strength: f64,
	collision_padding: f64,
	column_strength: f64,
	timeline_strength: f64,
	velocity_decay: f64,
	alpha_min: f64,
	alpha_decay: f64,
	max_displacement: f64,
}

impl From<&AtlasConfig> for SolverParams {
	fn from(c: &AtlasConfig) -> Self {
		Self {
			link_strength: c.link_strength,
			link_distance: c.link_distance,
			charge_strength: c.charge_strength,
			charge_distance_min: c.charge_distance_min,
			charge_distance_max: c.charge_distance_max,
			collision_strength: c.collision_strength,
			collision_padding: c.collision_padding,
			column_strength: c.column_strength,
			timeline_strength: c.timeline_strength,
			velocity_decay: c.velocity_decay,
			alpha_min: c.alpha_min,
			alpha_decay: c.alpha_decay,
			max_displacement: c.max_displacement,
		}
	}
}

/// Uniform bucket grid over active bodies, rebuilt per pass.
struct Grid {
	cell: f64,
	buckets: FxHashMap<(i64, i64), Vec<usize>>,
}

impl Grid {
	fn build(bodies: &[Body], cell: f64, predicted: bool) -> Self {
		let mut grid = Self {
			cell,
			buckets: FxHashMap::default(),
		};
		for (i, b) in bodies.iter().enumerate().filter(|(_, b)| b.active) {
			let (x, y) = if predicted {
				(b.pos.x + b.vel.x, b.pos.y + b.vel.y)
			} else {
				(b.pos.x, b.pos.y)
			};
			grid.buckets.entry(grid.key(x, y)).or_default().push(i);
		}
		grid
	}

	fn key(&self, x: f64, y: f64) -> (i64, i64) {
		((x / self.cell).floor() as i64, (y / self.cell).floor() as i64)
	}

	/// Indices in the 3x3 block of cells around `(x, y)`.
	fn around(&self, x: f64, y: f64) -> impl Iterator<Item = usize> + '_ {
		let (cx, cy) = self.key(x, y);
		(-1..=1)
			.flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
			.filter_map(|k| self.buckets.get(&k))
			.flatten()
			.copied()
	}
}

/// Move from `from` to `to` without ending up farther than `slack` from
/// `center`, unless already out there and heading back in.
fn bounded_x(from: f64, to: f64, center: f64, slack: f64) -> f64 {
	let (lo, hi) = (center - slack, center + slack);
	if to > hi {
		hi.max(from.min(to))
	} else if to < lo {
		lo.min(from.max(to))
	} else {
		to
	}
}

/// Tiny deterministic offset for coincident bodies.
fn jiggle(state: &mut u32) -> f64 {
	*state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
	(*state as f64 / u32::MAX as f64 - 0.5) * 1e-6
}

/// Positions, velocities, enabled forces and temperature for one dataset.
#[derive(Clone, Debug)]
pub struct Simulation {
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	forces: ForceSet,
	params: SolverParams,
	alpha: f64,
	alpha_target: f64,
	stopped: bool,
	ticks: u64,
	seed: u32,
}

impl Simulation {
	/// A hot simulation (alpha = 1) over `bodies`, without links.
	pub fn new(bodies: Vec<Body>, config: &AtlasConfig) -> Self {
		Self {
			bodies,
			springs: Vec::new(),
			forces: ForceSet::all(),
			params: SolverParams::from(config),
			alpha: 1.0,
			alpha_target: 0.0,
			stopped: false,
			ticks: 0,
			seed: 1,
		}
	}

	/// Replace the spring set. Pairs touching an inactive body, or looping on
	/// one body, are ignored. Stiffness is split by the smaller endpoint degree
	/// and the correction is biased toward the less connected endpoint.
	pub fn set_links(&mut self, pairs: impl IntoIterator<Item = (usize, usize)>) {
		let pairs = pairs
			.into_iter()
			.filter(|&(s, t)| {
				s != t
					&& self.bodies.get(s).is_some_and(|b| b.active)
					&& self.bodies.get(t).is_some_and(|b| b.active)
			})
			.collect::<Vec<_>>();

		let mut degree = vec![0usize; self.bodies.len()];
		for &(s, t) in &pairs {
			degree[s] += 1;
			degree[t] += 1;
		}
		self.springs = pairs
			.into_iter()
			.map(|(source, target)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Spring {
					source,
					target,
					strength: self.params.link_strength / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();
	}

	/// Number of live springs.
	pub fn link_count(&self) -> usize {
		self.springs.len()
	}

	/// All bodies, indexed like the graph model.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// One body.
	pub fn body(&self, i: usize) -> Option<&Body> {
		self.bodies.get(i)
	}

	/// Current temperature.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Temperature the simulation is drifting toward.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Integration passes run so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Enabled forces.
	pub fn forces(&self) -> ForceSet {
		self.forces
	}

	/// Toggle one force. Returns true when the set changed.
	pub fn set_force(&mut self, kind: ForceKind, enabled: bool) -> bool {
		self.forces.set(kind, enabled)
	}

	/// Raise the temperature to at least `alpha`, keeping the current layout.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
	}

	/// Set the temperature the simulation decays toward.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.max(0.0);
	}

	/// True once the temperature fell below the rest threshold with nothing holding it up.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min
	}

	/// Halt for good; further steps are no-ops.
	pub fn stop(&mut self) {
		self.stopped = true;
	}

	/// Whether [`Simulation::stop`] was called.
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Move the attraction point of a body.
	pub fn set_target(&mut self, i: usize, target: Point) {
		if let Some(b) = self.bodies.get_mut(i) {
			b.target = target;
		}
	}

	/// Bound the horizontal reach of a body around its target. Negative or NaN
	/// slack is treated as zero.
	pub fn set_slack(&mut self, i: usize, slack: f64) {
		if let Some(b) = self.bodies.get_mut(i) {
			b.slack = if slack > 0.0 { slack } else { 0.0 };
		}
	}

	/// Include or exclude a body. Excluded bodies lose their velocity and pin.
	pub fn set_active(&mut self, i: usize, active: bool) {
		if let Some(b) = self.bodies.get_mut(i) {
			b.active = active;
			if !active {
				b.vel = Point::default();
				b.pin = None;
			}
		}
	}

	/// Reset a body to rest at `at`, e.g. when it re-enters the layout.
	pub fn place(&mut self, i: usize, at: Point) {
		if let Some(b) = self.bodies.get_mut(i) {
			b.pos = at;
			b.vel = Point::default();
		}
	}

	/// Fix a body at `at`. The position is written immediately.
	pub fn pin(&mut self, i: usize, at: Point) {
		if let Some(b) = self.bodies.get_mut(i).filter(|b| b.active) {
			b.pin = Some(at);
			b.pos = at;
			b.vel = Point::default();
		}
	}

	/// Release a pinned body back to the forces.
	pub fn unpin(&mut self, i: usize) {
		if let Some(b) = self.bodies.get_mut(i) {
			b.pin = None;
		}
	}

	/// Number of pinned bodies.
	pub fn pinned_count(&self) -> usize {
		self.bodies.iter().filter(|b| b.pin.is_some()).count()
	}

	/// Run one integration pass. Returns false, without touching anything, when
	/// stopped or at rest.
	pub fn step(&mut self) -> bool {
		if self.stopped || self.is_settled() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let alpha = self.alpha;

		if self.forces.contains(ForceKind::Link) {
			self.apply_links(alpha);
		}
		if self.forces.contains(ForceKind::Charge) {
			self.apply_charge(alpha);
		}
		if self.forces.contains(ForceKind::Collision) {
			self.apply_collision();
		}
		if self.forces.contains(ForceKind::Column) {
			let k = self.params.column_strength * alpha;
			for b in self.bodies.iter_mut().filter(|b| b.active) {
				b.vel.x += (b.target.x - b.pos.x) * k;
			}
		}
		if self.forces.contains(ForceKind::Timeline) {
			let k = self.params.timeline_strength * alpha;
			for b in self.bodies.iter_mut().filter(|b| b.active) {
				b.vel.y += (b.target.y - b.pos.y) * k;
			}
		}

		self.integrate();
		self.ticks += 1;
		true
	}

	fn apply_links(&mut self, alpha: f64) {
		let distance = self.params.link_distance;
		for s in &self.springs {
			let (a, b) = (&self.bodies[s.source], &self.bodies[s.target]);
			let mut dx = b.pos.x + b.vel.x - a.pos.x - a.vel.x;
			let mut dy = b.pos.y + b.vel.y - a.pos.y - a.vel.y;
			if dx == 0.0 && dy == 0.0 {
				dx = jiggle(&mut self.seed);
				dy = jiggle(&mut self.seed);
			}
			let l = dx.hypot(dy);
			let k = (l - distance) / l * alpha * s.strength;
			let (fx, fy) = (dx * k, dy * k);

			let b = &mut self.bodies[s.target];
			b.vel.x -= fx * s.bias;
			b.vel.y -= fy * s.bias;
			let a = &mut self.bodies[s.source];
			a.vel.x += fx * (1.0 - s.bias);
			a.vel.y += fy * (1.0 - s.bias);
		}
	}

	fn apply_charge(&mut self, alpha: f64) {
		let p = self.params;
		let (min2, max2) = (p.charge_distance_min.powi(2), p.charge_distance_max.powi(2));
		let grid = Grid::build(&self.bodies, p.charge_distance_max, false);

		for i in 0..self.bodies.len() {
			if !self.bodies[i].active {
				continue;
			}
			let origin = self.bodies[i].pos;
			let (mut ax, mut ay) = (0.0, 0.0);
			for j in grid.around(origin.x, origin.y) {
				if j == i {
					continue;
				}
				let other = self.bodies[j].pos;
				let (mut dx, mut dy) = (other.x - origin.x, other.y - origin.y);
				let mut l2 = dx * dx + dy * dy;
				if l2 >= max2 {
					continue;
				}
				if dx == 0.0 && dy == 0.0 {
					dx = jiggle(&mut self.seed);
					dy = jiggle(&mut self.seed);
					l2 = dx * dx + dy * dy;
				}
				if l2 < min2 {
					l2 = (min2 * l2).sqrt();
				}
				ax += dx * p.charge_strength * alpha / l2;
				ay += dy * p.charge_strength * alpha / l2;
			}
			let b = &mut self.bodies[i];
			b.vel.x += ax;
			b.vel.y += ay;
		}
	}

	fn apply_collision(&mut self) {
		let p = self.params;
		let pad = p.collision_padding / 2.0;
		let max_r = self
			.bodies
			.iter()
			.filter(|b| b.active)
			.map(|b| b.radius + pad)
			.fold(0.0, f64::max);
		if max_r <= 0.0 {
			return;
		}
		let grid = Grid::build(&self.bodies, max_r * 2.0, true);

		for i in 0..self.bodies.len() {
			if !self.bodies[i].active {
				continue;
			}
			let bi = &self.bodies[i];
			let (xi, yi) = (bi.pos.x + bi.vel.x, bi.pos.y + bi.vel.y);
			let ri = bi.radius + pad;
			let neighbours = grid.around(xi, yi).filter(|&j| j > i).collect::<Vec<_>>();

			for j in neighbours {
				let (bi, bj) = (&self.bodies[i], &self.bodies[j]);
				let rj = bj.radius + pad;
				let r = ri + rj;
				let mut dx = bi.pos.x + bi.vel.x - bj.pos.x - bj.vel.x;
				let mut dy = bi.pos.y + bi.vel.y - bj.pos.y - bj.vel.y;
				let mut l2 = dx * dx + dy * dy;
				if l2 >= r * r {
					continue;
				}
				if dx == 0.0 && dy == 0.0 {
					dx = jiggle(&mut self.seed);
					dy = jiggle(&mut self.seed);
					l2 = dx * dx + dy * dy;
				}
				let l = l2.sqrt();
				let k = (r - l) / l * p.collision_strength;
				let (fx, fy) = (dx * k, dy * k);
				let share = rj * rj / (ri * ri + rj * rj);

				let bi = &mut self.bodies[i];
				bi.vel.x += fx * share;
				bi.vel.y += fy * share;
				let bj = &mut self.bodies[j];
				bj.vel.x -= fx * (1.0 - share);
				bj.vel.y -= fy * (1.0 - share);
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.params.velocity_decay;
		let max_step = self.params.max_displacement;
		for b in self.bodies.iter_mut().filter(|b| b.active) {
			if let Some(pin) = b.pin {
				b.pos = pin;
				b.vel = Point::default();
				continue;
			}
			b.vel.x *= keep;
			b.vel.y *= keep;
			let speed = b.vel.x.hypot(b.vel.y);
			if speed > max_step {
				b.vel.x *= max_step / speed;
				b.vel.y *= max_step / speed;
			}
			if !b.vel.is_finite() {
				b.vel = Point::default();
			}
			let x = bounded_x(b.pos.x, b.pos.x + b.vel.x, b.target.x, b.slack);
			if x != b.pos.x + b.vel.x {
				b.vel.x = 0.0;
			}
			b.pos.x = x;
			b.pos.y += b.vel.y;
			if !b.pos.is_finite() {
				b.pos = b.target;
				b.vel = Point::default();
			}
		}
	}
}
