/// Failures surfaced at construction time. Per-tick and interaction calls never fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The dataset document could not be parsed.
	#[error("dataset is not valid graph JSON: {0}")]
	Dataset(#[from] serde_json::Error),
	/// A configuration value would make the layout meaningless.
	#[error("invalid layout config `{field}`: {reason}")]
	InvalidConfig {
		/// Offending field.
		field: &'static str,
		/// What is wrong with it.
		reason: String,
	},
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
