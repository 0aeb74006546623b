use serde::Deserialize;

use super::error::{Error, Result};

/// How categories missing from the canonical order are laned.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LanePolicy {
	/// Present-but-unlisted categories get their own lane, in first-seen order.
	#[default]
	AppendUnlisted,
	/// Only canonical categories get lanes; everything else goes to the fallback lane.
	CanonicalOnly,
}

/// Tunables for the whole engine. Every field has a default, so a host can
/// override any subset from JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
	/// Preferred left-to-right lane order.
	pub canonical_order: Vec<String>,
	/// Label of the lane that catches unknown categories. Always present.
	pub fallback_lane: String,
	/// Handling of categories not in `canonical_order`.
	pub lane_policy: LanePolicy,
	/// Lanes never get narrower than this, even if they overflow the viewport.
	pub min_lane_width: f64,

	/// Years added on both sides of the observed range.
	pub year_padding: f64,
	/// Fraction of viewport height where the earliest year sits.
	pub top_fraction: f64,
	/// Fraction of viewport height where the latest year sits.
	pub bottom_fraction: f64,
	/// Fraction of viewport height for nodes without a valid year.
	pub missing_year_fraction: f64,

	/// Radius of a node with zero weight.
	pub min_radius: f64,
	/// Radius approached by the heaviest nodes.
	pub max_radius: f64,
	/// Share of nodes (by weight) whose labels are always shown.
	pub label_top_share: f64,
	/// Zoom level from which every visible label is drawn.
	pub label_reveal_zoom: f64,

	/// Link spring stiffness, divided by the smaller endpoint degree.
	pub link_strength: f64,
	/// Rest length of a link.
	pub link_distance: f64,
	/// Pairwise charge; negative repels.
	pub charge_strength: f64,
	/// Charge is ignored beyond this distance.
	pub charge_distance_max: f64,
	/// Charge distance floor, avoids blow-ups for near-coincident nodes.
	pub charge_distance_min: f64,
	/// Overlap correction per tick, 0..=1.
	pub collision_strength: f64,
	/// Gap kept between rendered circles.
	pub collision_padding: f64,
	/// Pull of x toward the lane center.
	pub column_strength: f64,
	/// Pull of y toward the scaled birth year.
	pub timeline_strength: f64,

	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Below this temperature the simulation is at rest.
	pub alpha_min: f64,
	/// Per-tick approach rate of alpha to its target.
	pub alpha_decay: f64,
	/// Temperature restored on filter, resize or force toggles.
	pub reheat_alpha: f64,
	/// Alpha target held while any node is pinned.
	pub drag_alpha_target: f64,
	/// Largest distance a node may travel in one tick.
	pub max_displacement: f64,

	pub min_zoom: f64,
	pub max_zoom: f64,
}

impl Default for AtlasConfig {
	fn default() -> Self {
		Self {
			canonical_order: [
				"Classical",
				"Classical/Neoclassical",
				"Marxian",
				"Austrian School",
				"Institutional",
				"Keynesian",
				"Chicago School",
				"New Keynesian",
				"Game Theory",
				"Behavioral",
			]
			.into_iter()
			.map(String::from)
			.collect(),
			fallback_lane: "Other".into(),
			lane_policy: LanePolicy::AppendUnlisted,
			min_lane_width: 90.0,

			year_padding: 5.0,
			top_fraction: 0.1,
			bottom_fraction: 0.88,
			missing_year_fraction: 0.95,

			min_radius: 3.0,
			max_radius: 12.0,
			label_top_share: 0.15,
			label_reveal_zoom: 2.5,

			link_strength: 0.05,
			link_distance: 60.0,
			charge_strength: -30.0,
			charge_distance_max: 60.0,
			charge_distance_min: 1.0,
			collision_strength: 0.9,
			collision_padding: 1.0,
			column_strength: 0.8,
			timeline_strength: 0.6,

			velocity_decay: 0.4,
			alpha_min: 0.001,
			// 1 - alpha_min^(1/300): ~300 ticks from a full start to rest.
			alpha_decay: 0.022_776,
			reheat_alpha: 0.5,
			drag_alpha_target: 0.3,
			max_displacement: 40.0,

			min_zoom: 0.1,
			max_zoom: 10.0,
		}
	}
}

impl AtlasConfig {
	/// Defaults overridden by whatever fields `src` sets.
	pub fn from_json(src: &str) -> Result<Self> {
		Ok(serde_json::from_str(src)?)
	}

	/// Reject values that would make the scale or the solver meaningless.
	pub fn validate(&self) -> Result<()> {
		fn invalid(field: &'static str, reason: impl Into<String>) -> Result<()> {
			Err(Error::InvalidConfig {
				field,
				reason: reason.into(),
			})
		}

		if self.fallback_lane.trim().is_empty() {
			return invalid("fallback_lane", "must not be blank");
		}
		if !(self.min_lane_width > 0.0) {
			return invalid("min_lane_width", "must be positive");
		}
		if !(self.year_padding >= 0.0) {
			return invalid("year_padding", "must not be negative");
		}
		if !(0.0..=1.0).contains(&self.top_fraction)
			|| !(0.0..=1.0).contains(&self.bottom_fraction)
			|| self.top_fraction >= self.bottom_fraction
		{
			return invalid(
				"top_fraction",
				format!(
					"need 0 <= top ({}) < bottom ({}) <= 1",
					self.top_fraction, self.bottom_fraction
				),
			);
		}
		if !(0.0..=1.0).contains(&self.missing_year_fraction) {
			return invalid("missing_year_fraction", "must be within 0..=1");
		}
		if !(self.min_radius > 0.0) || self.max_radius < self.min_radius {
			return invalid("max_radius", "need 0 < min_radius <= max_radius");
		}
		if !(0.0..=1.0).contains(&self.label_top_share) {
			return invalid("label_top_share", "must be within 0..=1");
		}
		if !(self.velocity_decay > 0.0 && self.velocity_decay <= 1.0) {
			return invalid("velocity_decay", "must be within (0, 1]");
		}
		if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
			return invalid("alpha_decay", "must be within (0, 1)");
		}
		if !(self.alpha_min > 0.0) {
			return invalid("alpha_min", "must be positive");
		}
		if !(self.max_displacement > 0.0) {
			return invalid("max_displacement", "must be positive");
		}
		if !(self.charge_distance_min > 0.0) || self.charge_distance_max < self.charge_distance_min {
			return invalid(
				"charge_distance_max",
				"need 0 < charge_distance_min <= charge_distance_max",
			);
		}
		if !(self.min_zoom > 0.0) || self.max_zoom < self.min_zoom {
			return invalid("max_zoom", "need 0 < min_zoom <= max_zoom");
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_is_valid() {
		AtlasConfig::default().validate().unwrap();
	}

	#[test]
	fn test_partial_json_keeps_defaults() {
		let cfg = AtlasConfig::from_json(r#"{"column_strength": 1.2, "lane_policy": "canonical_only"}"#)
			.unwrap();
		assert_eq!(cfg.column_strength, 1.2);
		assert_eq!(cfg.lane_policy, LanePolicy::CanonicalOnly);
		assert_eq!(cfg.fallback_lane, "Other");
	}

	#[test]
	fn test_inverted_fractions_rejected() {
		let cfg = AtlasConfig {
			top_fraction: 0.9,
			bottom_fraction: 0.1,
			..Default::default()
		};
		let err = cfg.validate().unwrap_err();
		assert!(matches!(err, Error::InvalidConfig { field: "top_fraction", .. }));
	}

	#[test]
	fn test_zero_velocity_decay_rejected() {
		let cfg = AtlasConfig {
			velocity_decay: 0.0,
			..Default::default()
		};
		assert!(cfg.validate().is_err());
	}
}
