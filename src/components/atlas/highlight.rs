//! Visual state derived from the model and interaction state. Never touches layout.

use rustc_hash::FxHashSet;

use super::lanes::LaneMap;
use super::model::{GraphModel, NodeIdx};

/// Opacity of nodes outside the focused category.
pub const DIM_OPACITY: f64 = 0.08;
/// Opacity of nodes unrelated to the current selection.
pub const FADE_OPACITY: f64 = 0.25;
/// Resting edge opacity.
pub const EDGE_OPACITY: f64 = 0.35;
/// Opacity of edges touching the selected node.
pub const EMPHASIS_OPACITY: f64 = 0.9;

/// Per-node visual flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeVisual {
	pub opacity: f64,
	/// Whether the node accepts pointer input.
	pub interactive: bool,
	/// Whether its label should be drawn.
	pub label_visible: bool,
	/// In the current search-match set.
	pub matched: bool,
	/// Selected, or a neighbour of the selected node.
	pub highlighted: bool,
}

/// Per-edge visual flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeVisual {
	pub opacity: f64,
	/// Touches the selected node.
	pub emphasized: bool,
}

/// Weight at or above which a node is in the top `share` of `weights`.
/// `None` when nothing qualifies (empty input, zero share, or all-zero weights).
pub fn label_threshold(weights: impl IntoIterator<Item = f64>, share: f64) -> Option<f64> {
	let mut sorted = weights.into_iter().filter(|w| w.is_finite()).collect::<Vec<_>>();
	if sorted.is_empty() || share <= 0.0 {
		return None;
	}
	sorted.sort_by(|a, b| b.total_cmp(a));
	let count = ((sorted.len() as f64 * share).ceil() as usize).clamp(1, sorted.len());
	Some(sorted[count - 1]).filter(|t| *t > 0.0)
}

/// Focus, selection and search state, plus the label cutoff for the dataset.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	/// Focused lane label; nodes of other lanes dim and go inert.
	pub focus: Option<String>,
	/// Selected node.
	pub selected: Option<NodeIdx>,
	/// Search matches supplied by the host.
	pub matches: FxHashSet<NodeIdx>,
	/// Importance cutoff for always-on labels.
	pub label_threshold: Option<f64>,
}

/// Viewport facts that affect labels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomContext {
	/// Current zoom.
	pub k: f64,
	/// Zoom from which every label is drawn.
	pub reveal_at: f64,
}

impl HighlightState {
	/// Whether `idx` belongs to the focused lane (always true without focus).
	pub fn in_focus(&self, model: &GraphModel, lanes: &LaneMap, idx: NodeIdx) -> bool {
		self.focus.as_deref().is_none_or(|focus| {
			lanes.lane_for(model.node(idx).category.as_deref()).label == focus
		})
	}

	/// Whether `idx` is the selected node or one of its neighbours.
	pub fn is_highlighted(&self, model: &GraphModel, idx: NodeIdx) -> bool {
		self.selected
			.is_some_and(|sel| sel == idx || model.neighbors(sel).contains(&idx))
	}

	/// Visual flags for one node.
	pub fn node_visual(
		&self,
		model: &GraphModel,
		lanes: &LaneMap,
		idx: NodeIdx,
		zoom: ZoomContext,
	) -> NodeVisual {
		let focused = self.in_focus(model, lanes, idx);
		let highlighted = self.is_highlighted(model, idx);
		let matched = self.matches.contains(&idx);

		let opacity = if !focused {
			DIM_OPACITY
		} else if self.selected.is_some() && !highlighted {
			FADE_OPACITY
		} else {
			1.0
		};
		let important = self
			.label_threshold
			.is_some_and(|t| model.node(idx).weight >= t);
		let label_visible =
			focused && (important || highlighted || matched || zoom.k >= zoom.reveal_at);

		NodeVisual {
			opacity,
			interactive: focused,
			label_visible,
			matched,
			highlighted,
		}
	}

	/// Visual flags for an edge between two visible nodes.
	pub fn edge_visual(
		&self,
		model: &GraphModel,
		lanes: &LaneMap,
		(source, target): (NodeIdx, NodeIdx),
	) -> EdgeVisual {
		let emphasized = self
			.selected
			.is_some_and(|sel| sel == source || sel == target);
		let focused = self.in_focus(model, lanes, source) && self.in_focus(model, lanes, target);
		let opacity = if !focused {
			DIM_OPACITY
		} else if emphasized {
			EMPHASIS_OPACITY
		} else if self.selected.is_some() {
			EDGE_OPACITY * FADE_OPACITY
		} else {
			EDGE_OPACITY
		};
		EdgeVisual { opacity, emphasized }
	}
}
