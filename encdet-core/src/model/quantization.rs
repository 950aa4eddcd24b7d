use std::fmt;
use std::str::FromStr;

use crate::error::EncdetError;

/// Rule mapping a normalized score onto one byte and back.
///
/// Every strategy derives a single scalar `base` from the largest normalized
/// score of the table (`peak = max_cell / norm`):
/// - `Linear`: `base = peak / 255`, byte = `round(v * 255 / base)`,
///   score = `byte * base / 255`
/// - `SingleLog`: `base = e^(ln(peak + 1) / 255)`, byte = `round(log_base(v + 1))`,
///   score = `base^byte - 1`
/// - `DoubleLog`: `base = e^(ln(ln(peak + 1) + 1) / 255)`,
///   byte = `round(log_base(ln(v + 1) + 1))`, score = `e^(base^byte - 1) - 1`
///
/// Bytes are saturated to `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantization {
	#[default]
	Linear,
	SingleLog,
	DoubleLog,
}

impl Quantization {
	/// Computes the scale factor for a table whose largest normalized score is `peak`.
	pub fn base(self, peak: f64) -> f64 {
		match self {
			Quantization::Linear => peak / 255.0,
			Quantization::SingleLog => ((peak + 1.0).ln() / 255.0).exp(),
			Quantization::DoubleLog => (((peak + 1.0).ln() + 1.0).ln() / 255.0).exp(),
		}
	}

	/// Maps a normalized score onto a byte.
	pub fn encode(self, value: f64, base: f64) -> u8 {
		let position = match self {
			Quantization::Linear if base > 0.0 => value * 255.0 / base,
			Quantization::SingleLog if base > 1.0 => (value + 1.0).ln() / base.ln(),
			Quantization::DoubleLog if base > 1.0 => ((value + 1.0).ln() + 1.0).ln() / base.ln(),
			// Degenerate base: the table is empty
			_ => 0.0,
		};
		position.round().clamp(0.0, 255.0) as u8
	}

	/// Reconstructs a normalized score from a stored byte.
	pub fn decode(self, byte: u8, base: f64) -> f64 {
		match self {
			Quantization::Linear => f64::from(byte) * base / 255.0,
			Quantization::SingleLog => base.powi(i32::from(byte)) - 1.0,
			Quantization::DoubleLog => (base.powi(i32::from(byte)) - 1.0).exp() - 1.0,
		}
	}

	/// Name accepted by `from_str`.
	pub fn name(self) -> &'static str {
		match self {
			Quantization::Linear => "linear",
			Quantization::SingleLog => "single-log",
			Quantization::DoubleLog => "double-log",
		}
	}
}

impl fmt::Display for Quantization {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Quantization {
	type Err = EncdetError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"linear" => Ok(Quantization::Linear),
			"single-log" | "log" => Ok(Quantization::SingleLog),
			"double-log" | "log2" => Ok(Quantization::DoubleLog),
			other => Err(EncdetError::Config(format!(
				"unknown quantization '{other}', expected linear, single-log or double-log"
			))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linear_follows_scale_formula() {
		let base = Quantization::Linear.base(255.0);
		assert_eq!(base, 1.0);
		assert_eq!(Quantization::Linear.encode(0.5, base), 128);
		assert_eq!(Quantization::Linear.decode(128, base), 128.0 / 255.0);
		// Values above `base` saturate
		assert_eq!(Quantization::Linear.encode(2.0, base), 255);
	}

	#[test]
	fn log_strategies_map_peak_to_top_byte() {
		for strategy in [Quantization::SingleLog, Quantization::DoubleLog] {
			let peak = 0.8;
			let base = strategy.base(peak);
			assert_eq!(strategy.encode(peak, base), 255);
			assert_eq!(strategy.encode(0.0, base), 0);
			assert!((strategy.decode(255, base) - peak).abs() < 1e-9);
			assert_eq!(strategy.decode(0, base), 0.0);
		}
	}

	#[test]
	fn empty_table_encodes_to_zero() {
		for strategy in [Quantization::Linear, Quantization::SingleLog, Quantization::DoubleLog] {
			let base = strategy.base(0.0);
			assert_eq!(strategy.encode(0.0, base), 0);
		}
	}

	#[test]
	fn parses_names() {
		assert_eq!("linear".parse::<Quantization>().unwrap(), Quantization::Linear);
		assert_eq!("Single-Log".parse::<Quantization>().unwrap(), Quantization::SingleLog);
		assert_eq!("double-log".parse::<Quantization>().unwrap(), Quantization::DoubleLog);
		assert!("cubic".parse::<Quantization>().is_err());
		assert_eq!(Quantization::default().to_string(), "linear");
	}
}
