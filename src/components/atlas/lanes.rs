//! Category → lane (column) assignment.

use rustc_hash::{FxHashMap, FxHashSet};

use super::config::{AtlasConfig, LanePolicy};
use super::model::Node;

/// A vertical strip reserved for one category.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
	/// Category label.
	pub label: String,
	/// Left-to-right position.
	pub index: usize,
	/// Horizontal center in simulation space.
	pub x: f64,
}

/// Ordered lanes plus lookup. Rebuilt whenever the visible node set or the
/// viewport width changes; callers must not cache lane positions.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneMap {
	lanes: Vec<Lane>,
	by_label: FxHashMap<String, usize>,
	fallback: usize,
	width: f64,
}

impl LaneMap {
	/// Derive lanes from the categories present in `nodes`: canonical order
	/// first, then (policy permitting) unlisted categories in first-seen order,
	/// then the fallback lane if nothing placed it already.
	pub fn assign<'a>(
		nodes: impl IntoIterator<Item = &'a Node>,
		canonical: &[String],
		config: &AtlasConfig,
		viewport_width: f64,
	) -> Self {
		let mut present: Vec<&str> = Vec::new();
		let mut present_set: FxHashSet<&str> = FxHashSet::default();
		for node in nodes {
			if let Some(cat) = node.category.as_deref() {
				if present_set.insert(cat) {
					present.push(cat);
				}
			}
		}

		let mut order: Vec<&str> = Vec::new();
		let mut placed: FxHashSet<&str> = FxHashSet::default();
		for cat in canonical.iter().map(String::as_str) {
			if present_set.contains(cat) && placed.insert(cat) {
				order.push(cat);
			}
		}
		if config.lane_policy == LanePolicy::AppendUnlisted {
			for &cat in &present {
				if placed.insert(cat) {
					order.push(cat);
				}
			}
		}
		let fallback_label = config.fallback_lane.as_str();
		if placed.insert(fallback_label) {
			order.push(fallback_label);
		}

		let count = order.len();
		let width = if viewport_width.is_finite() && viewport_width > 0.0 {
			(viewport_width / count as f64).max(config.min_lane_width)
		} else {
			config.min_lane_width
		};

		let lanes = order
			.iter()
			.enumerate()
			.map(|(index, label)| Lane {
				label: (*label).to_string(),
				index,
				x: index as f64 * width + width / 2.0,
			})
			.collect::<Vec<_>>();
		let by_label = lanes
			.iter()
			.map(|lane| (lane.label.clone(), lane.index))
			.collect::<FxHashMap<_, _>>();
		let fallback = by_label[fallback_label];

		Self {
			lanes,
			by_label,
			fallback,
			width,
		}
	}

	/// Lanes in left-to-right order.
	pub fn lanes(&self) -> &[Lane] {
		&self.lanes
	}

	/// Width of every lane.
	pub fn lane_width(&self) -> f64 {
		self.width
	}

	/// Total width spanned by all lanes.
	pub fn total_width(&self) -> f64 {
		self.width * self.lanes.len() as f64
	}

	/// The lane catching unknown categories.
	pub fn fallback(&self) -> &Lane {
		&self.lanes[self.fallback]
	}

	/// Lane for a category; unknown or missing categories get the fallback lane.
	pub fn lane_for(&self, category: Option<&str>) -> &Lane {
		let idx = category
			.and_then(|c| self.by_label.get(c).copied())
			.unwrap_or(self.fallback);
		&self.lanes[idx]
	}

	/// Lane by label, without falling back.
	pub fn get(&self, label: &str) -> Option<&Lane> {
		self.by_label.get(label).map(|&i| &self.lanes[i])
	}

	/// Lane containing simulation-space `x`.
	pub fn lane_at(&self, x: f64) -> Option<&Lane> {
		if !(x >= 0.0) {
			return None;
		}
		self.lanes.get((x / self.width).floor() as usize)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(category: Option<&str>) -> Node {
		Node {
			id: String::new(),
			label: String::new(),
			category: category.map(String::from),
			born: None,
			year: None,
			weight: 0.0,
		}
	}

	fn order(labels: &[&str]) -> Vec<String> {
		labels.iter().map(|s| s.to_string()).collect()
	}

	fn labels(map: &LaneMap) -> Vec<&str> {
		map.lanes().iter().map(|l| l.label.as_str()).collect()
	}

	#[test]
	fn test_canonical_first_then_first_seen() {
		let nodes = [
			node(Some("Marxian")),
			node(Some("Keynesian")),
			node(Some("Behavioral")),
			node(Some("Classical")),
			node(Some("Marxian")),
		];
		let map = LaneMap::assign(
			&nodes,
			&order(&["Classical", "Austrian School", "Keynesian"]),
			&AtlasConfig::default(),
			1000.0,
		);
		assert_eq!(labels(&map), ["Classical", "Keynesian", "Marxian", "Behavioral", "Other"]);
		assert_eq!(map.lane_width(), 200.0);
		assert_eq!(map.lanes()[0].x, 100.0);
		assert_eq!(map.lanes()[3].x, 700.0);
	}

	#[test]
	fn test_fallback_lane_always_exists() {
		let nodes: [Node; 0] = [];
		let map = LaneMap::assign(&nodes, &order(&["Classical"]), &AtlasConfig::default(), 500.0);
		assert_eq!(labels(&map), ["Other"]);
		assert_eq!(map.lane_for(Some("Classical")).label, "Other");
		assert_eq!(map.lane_for(None).label, "Other");
	}

	#[test]
	fn test_fallback_keeps_canonical_position() {
		let nodes = [node(Some("Other")), node(Some("Keynesian"))];
		let map = LaneMap::assign(&nodes, &order(&["Other", "Keynesian"]), &AtlasConfig::default(), 400.0);
		assert_eq!(labels(&map), ["Other", "Keynesian"]);
		assert_eq!(map.fallback().index, 0);
	}

	#[test]
	fn test_canonical_only_routes_unlisted_to_fallback() {
		let cfg = AtlasConfig {
			lane_policy: LanePolicy::CanonicalOnly,
			..Default::default()
		};
		let nodes = [node(Some("Keynesian")), node(Some("Phrenology"))];
		let map = LaneMap::assign(&nodes, &order(&["Keynesian"]), &cfg, 400.0);
		assert_eq!(labels(&map), ["Keynesian", "Other"]);
		assert_eq!(map.lane_for(Some("Phrenology")).label, "Other");
	}

	#[test]
	fn test_min_lane_width_and_hit_test() {
		let nodes = [node(Some("A")), node(Some("B")), node(Some("C"))];
		let map = LaneMap::assign(&nodes, &[], &AtlasConfig::default(), 100.0);
		assert_eq!(map.lane_width(), 90.0);
		assert_eq!(map.total_width(), 360.0);
		assert_eq!(map.lane_at(95.0).map(|l| l.label.as_str()), Some("B"));
		assert_eq!(map.lane_at(-1.0), None);
		assert_eq!(map.lane_at(1000.0), None);
	}

	#[test]
	fn test_assignment_is_idempotent() {
		let nodes = [node(Some("B")), node(None), node(Some("A"))];
		let canonical = order(&["A"]);
		let cfg = AtlasConfig::default();
		assert_eq!(
			LaneMap::assign(&nodes, &canonical, &cfg, 900.0),
			LaneMap::assign(&nodes, &canonical, &cfg, 900.0)
		);
	}
}
