//! Layout properties checked end to end through the engine API.

use influence_atlas::{
	AtlasConfig, AtlasData, AtlasEngine, ForceKind, Interaction, LaneMap, LanePolicy, NodeFilter,
	Point, RawLink, RawNode,
};

const YEAR_SECS: i64 = 31_556_952;
const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 600.0;
const MAX_TICKS: usize = 10_000;

fn born(year: i64) -> i64 {
	(year - 1970) * YEAR_SECS + YEAR_SECS / 2
}

fn node(id: &str, school: Option<&str>, year: Option<i64>, score: f64) -> RawNode {
	RawNode {
		id: id.into(),
		name: None,
		school: school.map(String::from),
		born: year.map(born),
		score: Some(score),
	}
}

fn link(source: &str, target: &str) -> RawLink {
	RawLink {
		source: source.into(),
		target: target.into(),
	}
}

fn data(nodes: Vec<RawNode>, links: Vec<RawLink>) -> AtlasData {
	AtlasData {
		nodes,
		links,
		schools: vec![],
	}
}

fn settled(data: &AtlasData, config: AtlasConfig) -> AtlasEngine {
	let mut engine = AtlasEngine::new(data, config, WIDTH, HEIGHT).expect("valid config");
	engine.run_until_settled(MAX_TICKS);
	assert!(engine.is_settled());
	engine
}

fn abc() -> AtlasData {
	data(
		vec![
			node("A", Some("Classical"), Some(1850), 0.5),
			node("B", Some("Keynesian"), Some(1950), 0.5),
			node("C", Some("Keynesian"), Some(1980), 0.5),
		],
		vec![link("B", "A"), link("C", "B")],
	)
}

/// Three schools, a cross-lane chain and a same-lane chain.
fn woven() -> AtlasData {
	let schools = ["Classical", "Keynesian", "Marxian"];
	let nodes = (0..24)
		.map(|i| {
			node(
				&format!("n{i}"),
				Some(schools[i % 3]),
				Some(1700 + 12 * i as i64),
				0.1 + (i % 5) as f64 * 0.2,
			)
		})
		.collect();
	let mut links = (1..24)
		.map(|i| link(&format!("n{i}"), &format!("n{}", i - 1)))
		.collect::<Vec<_>>();
	links.extend((3..24).map(|i| link(&format!("n{i}"), &format!("n{}", i - 3))));
	data(nodes, links)
}

fn target_y(engine: &AtlasEngine, id: &str) -> f64 {
	let model = engine.model();
	let idx = model.lookup(id).expect("known id");
	engine.scale().position(model.node(idx).year)
}

#[test]
fn test_no_overlap_after_convergence() {
	let mut nodes = (0..8)
		.map(|i| node(&format!("k{i}"), Some("Keynesian"), Some(1950), 0.1 + i as f64 * 0.1))
		.collect::<Vec<_>>();
	nodes.push(node("smith", Some("Classical"), Some(1800), 0.9));
	let crowd = data(nodes, vec![link("k0", "smith"), link("k1", "k0")]);

	for dataset in [crowd, woven()] {
		let engine = settled(&dataset, AtlasConfig::default());
		let padding = engine.config().collision_padding;
		let placed = engine
			.visible_nodes()
			.map(|v| (v.node.id.clone(), v.pos, v.radius))
			.collect::<Vec<_>>();
		for (i, (a, pa, ra)) in placed.iter().enumerate() {
			for (b, pb, rb) in &placed[i + 1..] {
				let gap = pa.distance(*pb) - (ra + rb + padding);
				assert!(gap > -0.5, "{a} and {b} overlap by {}", -gap);
			}
		}
	}
}

#[test]
fn test_timeline_bounds_y_only_while_enabled() {
	let pair = data(
		vec![
			node("early", Some("Keynesian"), Some(1800), 0.5),
			node("late", Some("Keynesian"), Some(2000), 0.5),
		],
		vec![link("late", "early")],
	);
	let mut engine = settled(&pair, AtlasConfig::default());
	for id in ["early", "late"] {
		let dy = engine.position(id).expect("visible").y - target_y(&engine, id);
		assert!(dy.abs() < 30.0, "{id} is {dy} off its year");
	}

	engine.set_force_enabled(ForceKind::Timeline, false);
	assert!(!engine.is_settled());
	engine.run_until_settled(MAX_TICKS);
	let drift = ["early", "late"]
		.iter()
		.map(|id| (engine.position(id).expect("visible").y - target_y(&engine, id)).abs())
		.fold(0.0, f64::max);
	assert!(drift > 30.0, "link should pull the pair off the timeline, drift {drift}");
}

#[test]
fn test_timeline_toggle_restores_positions() {
	let mut engine = settled(&woven(), AtlasConfig::default());
	let before = engine.positions();

	engine.set_force_enabled(ForceKind::Timeline, false);
	engine.run_until_settled(MAX_TICKS);
	engine.set_force_enabled(ForceKind::Timeline, true);
	engine.run_until_settled(MAX_TICKS);

	for (id, was) in &before {
		let now = engine.position(id).expect("visible");
		let dy = now.y - target_y(&engine, id);
		assert!(dy.abs() < 30.0, "{id} is {dy} off its year");
		assert!((now.y - was.y).abs() < 10.0, "{id} moved from {} to {}", was.y, now.y);
	}
}

#[test]
fn test_column_dominates_links() {
	let engine = settled(&woven(), AtlasConfig::default());
	let lanes = engine.lanes();
	assert!(lanes.lanes().len() >= 2);
	let half = lanes.lane_width() / 2.0;

	for view in engine.visible_nodes() {
		let own = lanes.lane_for(view.node.category.as_deref());
		let dx = (view.pos.x - own.x).abs();
		assert!(dx < half, "{} strayed {dx} from {}", view.node.id, own.label);
		for other in lanes.lanes().iter().filter(|l| l.index != own.index) {
			assert!(dx < (view.pos.x - other.x).abs());
		}
	}
}

/// A thousand people over every default school, born in five tight eras.
fn crowded() -> AtlasData {
	let schools = AtlasConfig::default().canonical_order;
	let nodes = (0..1000)
		.map(|i| {
			let era = 1750 + 50 * (i % 5) as i64;
			node(
				&format!("p{i}"),
				Some(schools[(i / 5) % schools.len()].as_str()),
				Some(era + (i * 7 % 40) as i64),
				0.05 + (i * 13 % 20) as f64 * 0.05,
			)
		})
		.collect();
	let links = (1..1000)
		.map(|i| link(&format!("p{i}"), &format!("p{}", i - 1)))
		.chain((0..1000).map(|i| link(&format!("p{i}"), &format!("p{}", (i * 37 + 11) % 1000))))
		.collect();
	data(nodes, links)
}

#[test]
fn test_column_dominates_in_crowded_lanes() {
	let mut engine = AtlasEngine::new(&crowded(), AtlasConfig::default(), 1200.0, 800.0)
		.expect("valid config");
	engine.run_until_settled(MAX_TICKS);
	assert!(engine.is_settled());

	let lanes = engine.lanes();
	assert_eq!(lanes.lanes().len(), 11);
	let half = lanes.lane_width() / 2.0;
	let padding = engine.config().collision_padding;

	let placed = engine.visible_nodes().collect::<Vec<_>>();
	assert_eq!(placed.len(), 1000);
	for view in &placed {
		let own = lanes.lane_for(view.node.category.as_deref());
		let dx = (view.pos.x - own.x).abs();
		assert!(dx < half, "{} strayed {dx} from {}", view.node.id, own.label);
		assert_eq!(lanes.lane_at(view.pos.x).map(|l| l.index), Some(own.index));
	}
	for (i, a) in placed.iter().enumerate() {
		for b in &placed[i + 1..] {
			let gap = a.pos.distance(b.pos) - (a.radius + b.radius + padding);
			assert!(gap > -0.5, "{} and {} overlap by {}", a.node.id, b.node.id, -gap);
		}
	}
}

#[test]
fn test_lane_assignment_is_idempotent() {
	let engine = AtlasEngine::new(&woven(), AtlasConfig::default(), WIDTH, HEIGHT).expect("valid");
	let config = engine.config();
	let canonical = &config.canonical_order;
	let first = LaneMap::assign(engine.model().nodes(), canonical, config, WIDTH);
	let second = LaneMap::assign(engine.model().nodes(), canonical, config, WIDTH);
	assert_eq!(first, second);
	assert_eq!(first.lanes(), engine.lanes().lanes());
}

#[test]
fn test_pinned_node_holds_drag_coordinate() {
	let mut engine = settled(&abc(), AtlasConfig::default());
	let grab = Point::new(123.0, 77.0);

	engine.on_drag_start("B");
	engine.on_drag_move("B", grab);
	for _ in 0..50 {
		engine.tick();
		assert_eq!(engine.position("B"), Some(grab));
	}
	assert!(!engine.is_settled());
	// The anchor still pulls on its neighbours.
	let c = engine.position("C").expect("visible");
	assert!(c.y < target_y(&engine, "C"));

	engine.on_drag_end("B");
	engine.tick();
	assert_ne!(engine.position("B"), Some(grab));
	assert_eq!(engine.simulation().pinned_count(), 0);
}

#[test]
fn test_classical_keynesian_scenario() {
	let engine = settled(&abc(), AtlasConfig::default());
	let lanes = engine.lanes();
	let classical = lanes.get("Classical").expect("lane");
	let keynesian = lanes.get("Keynesian").expect("lane");
	assert!(classical.index < keynesian.index);
	assert!(classical.x < keynesian.x);

	let [a, b, c] = ["A", "B", "C"].map(|id| engine.position(id).expect("visible"));
	assert!(a.x < b.x);
	assert!(a.y < b.y && b.y < c.y);
	assert!(a.distance(b) < a.distance(c));
	assert_eq!(engine.edge_segments().len(), 2);
	assert_eq!(engine.neighbors_of("B"), vec!["A", "C"]);
}

#[test]
fn test_undated_unknown_node_lands_in_fallback_band() {
	let config = AtlasConfig {
		lane_policy: LanePolicy::CanonicalOnly,
		..Default::default()
	};
	let mut dataset = abc();
	dataset.nodes.push(node("quesnay", Some("Physiocrat"), None, 0.0));
	dataset.nodes.push(node("anon", Some("   "), Some(99_999), 0.2));

	let engine = settled(&dataset, config);
	let lanes = engine.lanes();
	assert!(lanes.get("Physiocrat").is_none());
	let fallback = lanes.fallback();
	let bottom = engine.scale().range().1;

	for id in ["quesnay", "anon"] {
		let p = engine.position(id).expect("visible");
		assert!(p.is_finite());
		assert_eq!(lanes.lane_at(p.x).map(|l| l.index), Some(fallback.index));
		assert!(p.y > bottom, "{id} at {} is above the undated band", p.y);
	}
}

#[test]
fn test_filter_hides_nodes_and_absorbs_stale_drags() {
	let mut engine = settled(&abc(), AtlasConfig::default());
	engine.on_drag_start("A");

	engine.set_filter(NodeFilter {
		hidden_categories: ["Classical".to_string()].into(),
		years: None,
	});
	engine.on_drag_end("A");
	engine.on_drag_move("A", Point::new(0.0, 0.0));
	assert_eq!(engine.position("A"), None);
	assert_eq!(engine.simulation().pinned_count(), 0);
	assert!(engine.lanes().get("Classical").is_none());
	assert_eq!(engine.edge_segments().keys().copied().collect::<Vec<_>>(), vec![1]);

	engine.run_until_settled(MAX_TICKS);
	engine.set_filter(NodeFilter::default());
	engine.run_until_settled(MAX_TICKS);
	assert!(engine.position("A").is_some_and(Point::is_finite));
	assert_eq!(engine.edge_segments().len(), 2);
}

#[test]
fn test_degenerate_datasets_settle() {
	let empty = settled(&AtlasData::default(), AtlasConfig::default());
	assert!(empty.positions().is_empty());
	assert_eq!(empty.lanes().lanes().len(), 1);

	let undated = data(
		vec![node("x", None, None, 0.0), node("y", None, None, 0.0)],
		vec![link("x", "y"), link("x", "ghost")],
	);
	let engine = settled(&undated, AtlasConfig::default());
	assert!(engine.scale().is_degenerate());
	assert!(engine.positions().values().all(|p| p.is_finite()));
	assert_eq!(engine.edge_segments().len(), 1);
}

#[test]
fn test_zoom_moves_projection_not_layout() {
	let mut engine = settled(&abc(), AtlasConfig::default());
	let before = engine.positions();
	let a = before["A"];

	engine.zoom_at(0.0, 0.0, 2.0);
	engine.pan_by(10.0, -5.0);
	assert_eq!(engine.positions(), before);

	let t = engine.transform();
	let screen = t.apply(a);
	assert_eq!(engine.node_at_screen(screen.x, screen.y), Some("A"));
	assert_eq!(engine.node_at_screen(a.x, a.y).filter(|id| *id == "A"), None);
}
