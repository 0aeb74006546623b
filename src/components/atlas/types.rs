//! Raw dataset schema as produced by the acquisition pipeline.

use serde::Deserialize;

use super::error::Result;

/// One biographical entity before normalisation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawNode {
	/// Stable identifier.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Category label (school of thought).
	#[serde(default, alias = "category")]
	pub school: Option<String>,
	/// Birth timestamp in seconds since the Unix epoch.
	#[serde(default)]
	pub born: Option<i64>,
	/// Importance weight, e.g. a PageRank score.
	#[serde(default, alias = "weight")]
	pub score: Option<f64>,
}

/// A directed "source was influenced by target" relation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawLink {
	/// Influenced entity.
	pub source: String,
	/// Influencing entity.
	pub target: String,
}

/// Full dataset handed to the engine.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AtlasData {
	/// Entities.
	#[serde(default)]
	pub nodes: Vec<RawNode>,
	/// Relations.
	#[serde(default, alias = "edges")]
	pub links: Vec<RawLink>,
	/// Category labels known to the pipeline, used as a secondary lane order.
	#[serde(default)]
	pub schools: Vec<String>,
}

impl AtlasData {
	/// Parse the pipeline's JSON graph document.
	pub fn from_json(src: &str) -> Result<Self> {
		Ok(serde_json::from_str(src)?)
	}
}
