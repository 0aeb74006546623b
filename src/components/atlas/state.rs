use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use log::{debug, info};

use super::config::AtlasConfig;
use super::error::Result;
use super::highlight::{EdgeVisual, HighlightState, NodeVisual, ZoomContext, label_threshold};
use super::interaction::{Interaction, ViewTransform};
use super::lanes::{Lane, LaneMap};
use super::model::{GraphModel, Node, NodeIdx};
use super::scale::TemporalScale;
use super::solver::{Body, ForceKind, Point, Simulation};
use super::types::AtlasData;

/// Minimum pointer slop around a node, in screen pixels.
pub const HIT_RADIUS: f64 = 8.0;

/// Which nodes take part in the layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeFilter {
	/// Lane labels whose nodes are hidden.
	pub hidden_categories: HashSet<String>,
	/// Inclusive birth-year window. Nodes without a year are never hidden by it.
	pub years: Option<(i32, i32)>,
}

impl NodeFilter {
	fn accepts(&self, node: &Node, lane: &Lane) -> bool {
		if self.hidden_categories.contains(&lane.label) {
			return false;
		}
		match (self.years, node.year) {
			(Some((lo, hi)), Some(year)) => (lo..=hi).contains(&year),
			_ => true,
		}
	}
}

/// Notifications for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AtlasEvent {
	/// A node was selected.
	NodeClicked(String),
	/// The selection was cleared.
	SelectionCleared,
	/// A lane header was clicked; carries the lane label.
	LaneClicked(String),
}

/// Line segment of a rendered edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSegment {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
}

/// Everything a renderer needs about one visible node.
#[derive(Clone, Copy, Debug)]
pub struct NodeView<'a> {
	pub idx: NodeIdx,
	pub node: &'a Node,
	/// Simulation-space position.
	pub pos: Point,
	/// Simulation-space radius.
	pub radius: f64,
	pub visual: NodeVisual,
}

type Listener = Box<dyn FnMut(&AtlasEvent)>;

/// Radius for an importance weight: grows with the weight and saturates at
/// `max_radius`. `reference` is the weight that gets ~63% of the span.
pub fn radius_for(weight: f64, reference: f64, config: &AtlasConfig) -> f64 {
	let span = config.max_radius - config.min_radius;
	if reference <= 0.0 || weight <= 0.0 {
		return config.min_radius;
	}
	config.min_radius + span * (1.0 - (-weight / reference).exp())
}

/// One loaded dataset: graph model, lanes, scale, simulation and interaction state.
pub struct AtlasEngine {
	config: AtlasConfig,
	canonical: Vec<String>,
	model: GraphModel,
	lanes: LaneMap,
	scale: TemporalScale,
	sim: Simulation,
	highlight: HighlightState,
	transform: ViewTransform,
	filter: NodeFilter,
	dragging: Option<NodeIdx>,
	width: f64,
	height: f64,
	listeners: Vec<Listener>,
}

impl AtlasEngine {
	/// Build the engine for `data` in a `width` x `height` viewport.
	pub fn new(data: &AtlasData, config: AtlasConfig, width: f64, height: f64) -> Result<Self> {
		config.validate()?;
		let model = GraphModel::build(data);

		let mut canonical: Vec<String> = Vec::new();
		for label in config.canonical_order.iter().chain(&data.schools) {
			if !canonical.contains(label) {
				canonical.push(label.clone());
			}
		}

		let lanes = LaneMap::assign(model.nodes(), &canonical, &config, width);
		let scale = TemporalScale::fit(model.nodes().iter().map(|n| n.year), height, &config);

		let positive = model
			.nodes()
			.iter()
			.map(|n| n.weight)
			.filter(|w| *w > 0.0)
			.collect::<Vec<_>>();
		let reference = if positive.is_empty() {
			0.0
		} else {
			positive.iter().sum::<f64>() / positive.len() as f64
		};

		let mut lane_fill = vec![0usize; lanes.lanes().len()];
		let bodies = model
			.nodes()
			.iter()
			.map(|node| {
				let lane = lanes.lane_for(node.category.as_deref());
				let target = Point::new(lane.x, scale.position(node.year));
				let rank = lane_fill[lane.index];
				lane_fill[lane.index] += 1;
				let radius = radius_for(node.weight, reference, &config);
				Body {
					slack: lane_slack(&lanes, radius),
					..Body::new(seed_position(target, rank), target, radius)
				}
			})
			.collect();

		let mut sim = Simulation::new(bodies, &config);
		sim.set_links(model.edges().iter().filter_map(|e| e.endpoints()).map(|(s, t)| (s.0, t.0)));

		let highlight = HighlightState {
			label_threshold: label_threshold(
				model.nodes().iter().map(|n| n.weight),
				config.label_top_share,
			),
			..Default::default()
		};

		info!(
			"atlas ready: {} nodes, {} lanes, {} links, viewport {width}x{height}",
			model.len(),
			lanes.lanes().len(),
			sim.link_count()
		);

		Ok(Self {
			config,
			canonical,
			model,
			lanes,
			scale,
			sim,
			highlight,
			transform: ViewTransform::IDENTITY,
			filter: NodeFilter::default(),
			dragging: None,
			width,
			height,
			listeners: Vec::new(),
		})
	}

	pub fn config(&self) -> &AtlasConfig {
		&self.config
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	/// Current lanes. Re-fetch after resize or filter changes.
	pub fn lanes(&self) -> &LaneMap {
		&self.lanes
	}

	/// Current year scale.
	pub fn scale(&self) -> &TemporalScale {
		&self.scale
	}

	/// Read-only view of the simulation.
	pub fn simulation(&self) -> &Simulation {
		&self.sim
	}

	/// Current viewport transform.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn filter(&self) -> &NodeFilter {
		&self.filter
	}

	/// Register an event listener.
	pub fn subscribe(&mut self, listener: impl FnMut(&AtlasEvent) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	fn emit(&mut self, event: AtlasEvent) {
		debug!("atlas event {event:?}");
		for listener in &mut self.listeners {
			listener(&event);
		}
	}

	// -- simulation lifecycle --

	/// One solver tick. Returns whether the simulation is still moving.
	pub fn tick(&mut self) -> bool {
		self.sim.step()
	}

	/// Tick until at rest or `max_ticks` passes ran. Returns the passes run.
	pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
		(0..max_ticks).take_while(|_| self.sim.step()).count()
	}

	/// True when nothing is moving and nothing holds the temperature up.
	pub fn is_settled(&self) -> bool {
		self.sim.is_settled()
	}

	/// Tear down: no further tick does anything.
	pub fn stop(&mut self) {
		self.sim.stop();
		self.dragging = None;
		info!("atlas stopped after {} ticks", self.sim.ticks());
	}

	/// Whether [`AtlasEngine::stop`] was called.
	pub fn is_stopped(&self) -> bool {
		self.sim.is_stopped()
	}

	fn reanneal(&mut self) {
		debug!("re-annealing at alpha {}", self.config.reheat_alpha);
		self.sim.reheat(self.config.reheat_alpha);
	}

	/// Enable or disable one force, re-annealing when it changes.
	pub fn set_force_enabled(&mut self, kind: ForceKind, enabled: bool) {
		if self.sim.set_force(kind, enabled) {
			debug!("{kind:?} force {}", if enabled { "on" } else { "off" });
			self.reanneal();
		}
	}

	/// Whether a force is enabled.
	pub fn force_enabled(&self, kind: ForceKind) -> bool {
		self.sim.forces().contains(kind)
	}

	/// Adapt lanes and scale to a new viewport and re-anneal from the current layout.
	/// A stopped engine ignores resizes.
	pub fn resize(&mut self, width: f64, height: f64) {
		if self.is_stopped()
			|| !(width.is_finite() && height.is_finite())
			|| (width, height) == (self.width, self.height)
		{
			return;
		}
		info!("atlas resized to {width}x{height}");
		self.width = width;
		self.height = height;
		self.scale = TemporalScale::fit(self.model.nodes().iter().map(|n| n.year), height, &self.config);
		self.relayout();
	}

	/// Replace the node filter. Hidden nodes leave the simulation; visible ones
	/// keep their positions as a warm start.
	pub fn set_filter(&mut self, filter: NodeFilter) {
		if filter == self.filter {
			return;
		}
		self.filter = filter;

		// Accept against the full-dataset lanes so hiding is stable across refilters.
		let all = LaneMap::assign(self.model.nodes(), &self.canonical, &self.config, self.width);
		let mut shown = 0usize;
		for (i, node) in self.model.nodes().iter().enumerate() {
			let visible = self.filter.accepts(node, all.lane_for(node.category.as_deref()));
			let was = self.sim.bodies()[i].active;
			if visible && !was {
				let target = self.sim.bodies()[i].target;
				self.sim.place(i, target);
			}
			self.sim.set_active(i, visible);
			shown += usize::from(visible);
		}

		let is_visible = |idx: NodeIdx, sim: &Simulation| sim.bodies()[idx.0].active;
		if self.highlight.selected.is_some_and(|s| !is_visible(s, &self.sim)) {
			self.highlight.selected = None;
		}
		if self.dragging.is_some_and(|d| !is_visible(d, &self.sim)) {
			self.dragging = None;
		}
		let sim = &self.sim;
		self.highlight.matches.retain(|m| is_visible(*m, sim));
		if self.sim.pinned_count() == 0 {
			self.sim.set_alpha_target(0.0);
		}

		debug!("filter applied, {shown} of {} nodes visible", self.model.len());
		self.relayout();
		if self
			.highlight
			.focus
			.as_deref()
			.is_some_and(|f| self.lanes.get(f).is_none())
		{
			self.highlight.focus = None;
		}
	}

	/// Re-derive lanes from the visible nodes, retarget, relink and re-anneal.
	fn relayout(&mut self) {
		let visible = self
			.model
			.nodes()
			.iter()
			.zip(self.sim.bodies())
			.filter(|(_, b)| b.active)
			.map(|(n, _)| n)
			.collect::<Vec<_>>();
		self.lanes = LaneMap::assign(visible, &self.canonical, &self.config, self.width);
		for (i, node) in self.model.nodes().iter().enumerate() {
			let target = Point::new(
				self.lanes.lane_for(node.category.as_deref()).x,
				self.scale.position(node.year),
			);
			self.sim.set_target(i, target);
			self.sim.set_slack(i, lane_slack(&self.lanes, self.sim.bodies()[i].radius));
		}
		self.sim.set_links(
			self.model
				.edges()
				.iter()
				.filter_map(|e| e.endpoints())
				.map(|(s, t)| (s.0, t.0)),
		);
		self.reanneal();
	}

	// -- focus, search, selection --

	/// Focus a lane: nodes of other lanes dim and stop accepting input.
	pub fn set_focus(&mut self, label: Option<&str>) {
		let label = label.filter(|l| self.lanes.get(l).is_some());
		self.highlight.focus = label.map(String::from);
		if let Some(sel) = self.highlight.selected {
			if !self.highlight.in_focus(&self.model, &self.lanes, sel) {
				self.highlight.selected = None;
			}
		}
	}

	/// Currently focused lane.
	pub fn focus(&self) -> Option<&str> {
		self.highlight.focus.as_deref()
	}

	/// Lane header clicked: toggle focus on it and notify listeners.
	pub fn click_lane(&mut self, label: &str) {
		if self.lanes.get(label).is_none() {
			return;
		}
		if self.focus() == Some(label) {
			self.set_focus(None);
		} else {
			self.set_focus(Some(label));
		}
		self.emit(AtlasEvent::LaneClicked(label.to_string()));
	}

	/// Lane under a screen-space x.
	pub fn lane_at_screen(&self, sx: f64) -> Option<&Lane> {
		let p = self.transform.invert(Point::new(sx, 0.0));
		self.lanes.lane_at(p.x)
	}

	/// Replace the search-match set. Unknown ids are ignored.
	pub fn set_search_matches<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
		self.highlight.matches = ids
			.into_iter()
			.filter_map(|id| self.model.lookup(id))
			.filter(|idx| self.sim.bodies()[idx.0].active)
			.collect();
	}

	/// Selected node id.
	pub fn selected(&self) -> Option<&str> {
		self.highlight.selected.map(|i| self.model.node(i).id.as_str())
	}

	/// Undirected neighbours of `id`, in arena order.
	pub fn neighbors_of(&self, id: &str) -> Vec<&str> {
		self.model
			.lookup(id)
			.map(|idx| {
				self.model
					.neighbors(idx)
					.iter()
					.map(|n| self.model.node(*n).id.as_str())
					.collect()
			})
			.unwrap_or_default()
	}

	fn visible_idx(&self, id: &str) -> Option<NodeIdx> {
		self.model
			.lookup(id)
			.filter(|idx| self.sim.bodies()[idx.0].active)
	}

	// -- viewport --

	/// Zoom by `factor` around a screen point.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let t = self.transform.zoom_at(
			Point::new(sx, sy),
			factor,
			(self.config.min_zoom, self.config.max_zoom),
		);
		self.on_zoom(t);
	}

	/// Pan by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let t = self.transform.pan_by(dx, dy);
		self.on_zoom(t);
	}

	/// Screen → simulation.
	pub fn screen_to_sim(&self, sx: f64, sy: f64) -> Point {
		self.transform.invert(Point::new(sx, sy))
	}

	/// Topmost interactive node under a screen point.
	pub fn node_at_screen(&self, sx: f64, sy: f64) -> Option<&str> {
		let at = Point::new(sx, sy);
		self.visible_nodes()
			.filter(|v| v.visual.interactive)
			.filter(|v| {
				let reach = self.transform.screen_radius(v.radius).max(HIT_RADIUS);
				self.transform.apply(v.pos).distance(at) <= reach
			})
			.last()
			.map(|v| v.node.id.as_str())
	}

	// -- snapshots --

	fn zoom_context(&self) -> ZoomContext {
		ZoomContext {
			k: self.transform.k,
			reveal_at: self.config.label_reveal_zoom,
		}
	}

	/// Visible nodes with position, radius and visual state, in arena order.
	pub fn visible_nodes(&self) -> impl Iterator<Item = NodeView<'_>> + '_ {
		let zoom = self.zoom_context();
		self.model
			.nodes()
			.iter()
			.zip(self.sim.bodies())
			.enumerate()
			.filter(|(_, (_, b))| b.active)
			.map(move |(i, (node, body))| NodeView {
				idx: NodeIdx(i),
				node,
				pos: body.pos,
				radius: body.radius,
				visual: self
					.highlight
					.node_visual(&self.model, &self.lanes, NodeIdx(i), zoom),
			})
	}

	/// Edges whose endpoints are both visible, keyed by their index in the dataset.
	pub fn visible_edges(&self) -> impl Iterator<Item = (usize, EdgeSegment, EdgeVisual)> + '_ {
		let bodies = self.sim.bodies();
		self.model
			.edges()
			.iter()
			.enumerate()
			.filter_map(move |(i, edge)| {
				let (s, t) = edge.endpoints()?;
				let (a, b) = (&bodies[s.0], &bodies[t.0]);
				if !(a.active && b.active) {
					return None;
				}
				let segment = EdgeSegment {
					x1: a.pos.x,
					y1: a.pos.y,
					x2: b.pos.x,
					y2: b.pos.y,
				};
				Some((i, segment, self.highlight.edge_visual(&self.model, &self.lanes, (s, t))))
			})
	}

	/// Position of a visible node.
	pub fn position(&self, id: &str) -> Option<Point> {
		self.visible_idx(id).map(|idx| self.sim.bodies()[idx.0].pos)
	}

	/// Rendered radius of a node in simulation units.
	pub fn rendered_radius(&self, id: &str) -> Option<f64> {
		self.model.lookup(id).map(|idx| self.sim.bodies()[idx.0].radius)
	}

	/// `{id -> position}` for every visible node.
	pub fn positions(&self) -> HashMap<String, Point> {
		self.visible_nodes()
			.map(|v| (v.node.id.clone(), v.pos))
			.collect()
	}

	/// `{edge index -> segment}` for every renderable edge.
	pub fn edge_segments(&self) -> HashMap<usize, EdgeSegment> {
		self.visible_edges().map(|(i, s, _)| (i, s)).collect()
	}

	/// `{id -> visual}` for every visible node.
	pub fn highlight(&self) -> HashMap<String, NodeVisual> {
		self.visible_nodes()
			.map(|v| (v.node.id.clone(), v.visual))
			.collect()
	}
}

impl Interaction for AtlasEngine {
	fn on_drag_start(&mut self, id: &str) {
		let Some(idx) = self.visible_idx(id) else {
			return;
		};
		if let Some(prev) = self.dragging.take() {
			self.sim.unpin(prev.0);
		}
		let at = self.sim.bodies()[idx.0].pos;
		self.sim.pin(idx.0, at);
		self.dragging = Some(idx);
		self.sim.set_alpha_target(self.config.drag_alpha_target);
		self.sim.reheat(self.config.drag_alpha_target);
		debug!("drag start {id}");
	}

	fn on_drag_move(&mut self, id: &str, pos: Point) {
		let Some(idx) = self.visible_idx(id) else {
			return;
		};
		if self.dragging == Some(idx) && pos.is_finite() {
			self.sim.pin(idx.0, pos);
		}
	}

	fn on_drag_end(&mut self, id: &str) {
		let Some(idx) = self.model.lookup(id) else {
			return;
		};
		if self.dragging != Some(idx) {
			return;
		}
		self.dragging = None;
		self.sim.unpin(idx.0);
		if self.sim.pinned_count() == 0 {
			self.sim.set_alpha_target(0.0);
		}
		debug!("drag end {id}");
	}

	fn on_zoom(&mut self, transform: ViewTransform) {
		if !(transform.x.is_finite() && transform.y.is_finite() && transform.k.is_finite()) {
			return;
		}
		self.transform = ViewTransform {
			k: transform.k.clamp(self.config.min_zoom, self.config.max_zoom),
			..transform
		};
	}

	fn on_select(&mut self, id: Option<&str>) {
		match id {
			Some(id) => {
				let Some(idx) = self.visible_idx(id) else {
					return;
				};
				if !self.highlight.in_focus(&self.model, &self.lanes, idx) {
					return;
				}
				self.highlight.selected = Some(idx);
				self.emit(AtlasEvent::NodeClicked(id.to_string()));
			}
			None => {
				if self.highlight.selected.take().is_some() {
					self.emit(AtlasEvent::SelectionCleared);
				}
			}
		}
	}
}

/// Horizontal reach that keeps a circle of `radius` inside its lane.
fn lane_slack(lanes: &LaneMap, radius: f64) -> f64 {
	(lanes.lane_width() / 2.0 - radius).max(0.0)
}

/// Phyllotaxis offset around the target so nodes sharing a lane and year
/// start apart.
fn seed_position(target: Point, rank: usize) -> Point {
	let golden = PI * (3.0 - 5f64.sqrt());
	let r = 4.0 * (0.5 + rank as f64).sqrt();
	let a = rank as f64 * golden;
	Point::new(target.x + r * a.cos(), target.y + r * a.sin())
}
