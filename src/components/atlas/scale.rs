//! Birth year → vertical pixel mapping.

use super::config::AtlasConfig;

/// Linear, invertible year scale with earlier years nearer the top.
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalScale {
	domain: (f64, f64),
	range: (f64, f64),
	missing_y: f64,
	degenerate: bool,
}

impl TemporalScale {
	/// Fit the scale to the valid years among `years` for a viewport of `height`.
	/// Missing years are ignored for the domain; with no valid year at all every
	/// year maps to the middle of the range.
	pub fn fit(years: impl IntoIterator<Item = Option<i32>>, height: f64, config: &AtlasConfig) -> Self {
		let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
		let bounds = years
			.into_iter()
			.flatten()
			.fold(None, |acc: Option<(i32, i32)>, y| match acc {
				Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
				None => Some((y, y)),
			});

		let range = (height * config.top_fraction, height * config.bottom_fraction);
		let missing_y = height * config.missing_year_fraction;
		match bounds {
			Some((lo, hi)) => {
				let domain = (lo as f64 - config.year_padding, hi as f64 + config.year_padding);
				Self {
					domain,
					range,
					missing_y,
					degenerate: domain.1 <= domain.0,
				}
			}
			None => Self {
				domain: (0.0, 0.0),
				range,
				missing_y,
				degenerate: true,
			},
		}
	}

	/// Padded year domain.
	pub fn domain(&self) -> (f64, f64) {
		self.domain
	}

	/// Pixel range, top first.
	pub fn range(&self) -> (f64, f64) {
		self.range
	}

	/// True when the scale collapsed to a single point.
	pub fn is_degenerate(&self) -> bool {
		self.degenerate
	}

	/// Pixel row for a year.
	pub fn y(&self, year: f64) -> f64 {
		if self.degenerate {
			return (self.range.0 + self.range.1) / 2.0;
		}
		let t = (year - self.domain.0) / (self.domain.1 - self.domain.0);
		self.range.0 + t * (self.range.1 - self.range.0)
	}

	/// Year at a pixel row; `None` for a degenerate scale.
	pub fn invert(&self, y: f64) -> Option<f64> {
		if self.degenerate || self.range.1 == self.range.0 {
			return None;
		}
		let t = (y - self.range.0) / (self.range.1 - self.range.0);
		Some(self.domain.0 + t * (self.domain.1 - self.domain.0))
	}

	/// Target row for a node: its scaled year, or the bottom band when it has none.
	pub fn position(&self, year: Option<i32>) -> f64 {
		match year {
			Some(year) => self.y(year as f64),
			None => self.missing_y,
		}
	}

	/// Row of the band holding nodes without a year.
	pub fn missing_band(&self) -> f64 {
		self.missing_y
	}

	/// Round years inside the domain, every `step` years, with their rows.
	pub fn ticks(&self, step: i32) -> Vec<(i32, f64)> {
		if self.degenerate || step <= 0 {
			return Vec::new();
		}
		let first = (self.domain.0 / step as f64).ceil() as i32 * step;
		(0..)
			.map(|i| first + i * step)
			.take_while(|&year| year as f64 <= self.domain.1)
			.map(|year| (year, self.y(year as f64)))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg() -> AtlasConfig {
		AtlasConfig {
			year_padding: 5.0,
			top_fraction: 0.1,
			bottom_fraction: 0.9,
			missing_year_fraction: 0.95,
			..Default::default()
		}
	}

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn test_earlier_years_sit_higher() {
		let scale = TemporalScale::fit([Some(1850), None, Some(1980), Some(1950)], 600.0, &cfg());
		assert_eq!(scale.domain(), (1845.0, 1985.0));
		assert!(close(scale.y(1845.0), 60.0));
		assert!(close(scale.y(1985.0), 540.0));
		assert!(scale.y(1850.0) < scale.y(1950.0));
		assert!(scale.y(1950.0) < scale.y(1980.0));
	}

	#[test]
	fn test_invert_round_trips() {
		let scale = TemporalScale::fit([Some(1700), Some(2000)], 800.0, &cfg());
		let y = scale.y(1883.0);
		assert!((scale.invert(y).unwrap() - 1883.0).abs() < 1e-9);
	}

	#[test]
	fn test_missing_years_use_bottom_band() {
		let scale = TemporalScale::fit([Some(1900), None], 1000.0, &cfg());
		assert!(close(scale.position(None), 950.0));
		assert!(scale.position(None) > scale.range().1);
	}

	#[test]
	fn test_no_valid_years_is_degenerate_not_fatal() {
		let scale = TemporalScale::fit([None, None], 400.0, &cfg());
		assert!(scale.is_degenerate());
		assert!(close(scale.y(1900.0), 200.0));
		assert_eq!(scale.y(1900.0), scale.y(2000.0));
		assert_eq!(scale.invert(100.0), None);
		assert!(scale.ticks(50).is_empty());

		let empty = TemporalScale::fit(std::iter::empty(), 400.0, &cfg());
		assert!(empty.is_degenerate());
	}

	#[test]
	fn test_single_year_without_padding_collapses() {
		let cfg = AtlasConfig {
			year_padding: 0.0,
			..cfg()
		};
		let scale = TemporalScale::fit([Some(1900), Some(1900)], 400.0, &cfg);
		assert!(scale.is_degenerate());
		assert!(scale.y(1900.0).is_finite());
	}

	#[test]
	fn test_ticks_cover_domain() {
		let scale = TemporalScale::fit([Some(1851), Some(1949)], 600.0, &cfg());
		let years: Vec<i32> = scale.ticks(50).into_iter().map(|(y, _)| y).collect();
		assert_eq!(years, vec![1850, 1900, 1950]);
	}
}
