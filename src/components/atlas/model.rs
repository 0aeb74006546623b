//! Normalised node/edge model with derived year and undirected adjacency.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};
use log::{info, warn};
use rustc_hash::FxHashMap;

use super::types::AtlasData;

/// Earliest year treated as plausible.
pub const MIN_YEAR: i32 = -3000;
/// Latest year treated as plausible.
pub const MAX_YEAR: i32 = 3000;

/// Position of a node in the arena. Stable for the lifetime of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub usize);

/// Immutable domain data of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub label: String,
	/// Category label, `None` when blank or missing.
	pub category: Option<String>,
	/// Raw birth timestamp.
	pub born: Option<i64>,
	/// Birth year, `None` when the timestamp is missing or implausible.
	pub year: Option<i32>,
	/// Non-negative importance weight.
	pub weight: f64,
}

/// One relation, kept even when an endpoint is unknown.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	/// Influenced entity id.
	pub source: String,
	/// Influencing entity id.
	pub target: String,
	/// Resolved endpoints, `None` for dangling references.
	pub ends: Option<(NodeIdx, NodeIdx)>,
}

impl Edge {
	/// Resolved endpoints of a non-degenerate edge.
	pub fn endpoints(&self) -> Option<(NodeIdx, NodeIdx)> {
		self.ends.filter(|(s, t)| s != t)
	}
}

/// Convert a Unix timestamp (seconds, negative before 1970) to a proleptic Gregorian year.
pub fn year_from_timestamp(secs: i64) -> Option<i32> {
	DateTime::<Utc>::from_timestamp(secs, 0)
		.map(|dt| dt.year())
		.filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
}

/// Nodes, edges and adjacency built from a raw dataset.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: FxHashMap<String, NodeIdx>,
	adjacency: Vec<BTreeSet<NodeIdx>>,
}

impl GraphModel {
	/// Build the model. Anomalies are absorbed: blank or duplicate ids are
	/// skipped, bad timestamps yield no year, dangling edges stay unresolved.
	pub fn build(data: &AtlasData) -> Self {
		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut index = FxHashMap::default();

		for raw in &data.nodes {
			let id = raw.id.trim();
			if id.is_empty() {
				warn!("skipping node with blank id");
				continue;
			}
			if index.contains_key(id) {
				warn!("duplicate node id {id}, keeping first occurrence");
				continue;
			}
			let category = raw
				.school
				.as_deref()
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(String::from);
			let label = raw
				.name
				.as_deref()
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.unwrap_or(id)
				.to_string();
			let weight = raw.score.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(0.0);

			index.insert(id.to_string(), NodeIdx(nodes.len()));
			nodes.push(Node {
				id: id.to_string(),
				label,
				category,
				born: raw.born,
				year: raw.born.and_then(year_from_timestamp),
				weight,
			});
		}

		let mut adjacency = vec![BTreeSet::new(); nodes.len()];
		let mut dangling = 0usize;
		let edges = data
			.links
			.iter()
			.map(|link| {
				let ends = match (index.get(link.source.trim()), index.get(link.target.trim())) {
					(Some(&s), Some(&t)) => Some((s, t)),
					_ => {
						dangling += 1;
						None
					}
				};
				if let Some((s, t)) = ends {
					if s != t {
						adjacency[s.0].insert(t);
						adjacency[t.0].insert(s);
					}
				}
				Edge {
					source: link.source.clone(),
					target: link.target.clone(),
					ends,
				}
			})
			.collect::<Vec<_>>();

		if dangling > 0 {
			warn!("{dangling} links reference unknown nodes");
		}
		info!("built graph with {} nodes and {} edges", nodes.len(), edges.len());

		Self {
			nodes,
			edges,
			index,
			adjacency,
		}
	}

	/// All nodes in input order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// All edges in input order, dangling ones included.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Node by arena index.
	pub fn node(&self, idx: NodeIdx) -> &Node {
		&self.nodes[idx.0]
	}

	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// True when the model has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Resolve an identifier.
	pub fn lookup(&self, id: &str) -> Option<NodeIdx> {
		self.index.get(id).copied()
	}

	/// Undirected neighbours.
	pub fn neighbors(&self, idx: NodeIdx) -> &BTreeSet<NodeIdx> {
		&self.adjacency[idx.0]
	}

	/// Nodes that influenced `idx` (targets of its outgoing links).
	pub fn influences_of(&self, idx: NodeIdx) -> Vec<NodeIdx> {
		self.directed(|s, t| (s == idx).then_some(t))
	}

	/// Nodes influenced by `idx` (sources of its incoming links).
	pub fn influenced(&self, idx: NodeIdx) -> Vec<NodeIdx> {
		self.directed(|s, t| (t == idx).then_some(s))
	}

	fn directed(&self, pick: impl Fn(NodeIdx, NodeIdx) -> Option<NodeIdx>) -> Vec<NodeIdx> {
		let mut out = self
			.edges
			.iter()
			.filter_map(Edge::endpoints)
			.filter_map(|(s, t)| pick(s, t))
			.collect::<Vec<_>>();
		out.sort_unstable();
		out.dedup();
		out
	}
}
