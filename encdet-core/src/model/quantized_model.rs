use std::io::{self, Write};

use log::info;

use super::frequency_matrix::FrequencyMatrix;
use super::quantization::Quantization;
use super::scoring_model::{euclidean_norm, write_c_array, ScoringModel};

/// Normalized model keeping one byte per stored cell.
///
/// The normalized value `cell / norm` of every cell is mapped onto `0..=255`
/// by a [`Quantization`] strategy chosen at construction. Only the bytes and
/// the scalar `base` are needed to reconstruct scores, which makes the table
/// cheap to embed in other programs.
///
/// # Invariants
/// - `table.len() == size * size`
/// - With `Linear`, every reconstructed score is at most `max_cell / norm`
#[derive(Debug, Clone)]
pub struct QuantizedModel {
	size: usize,
	factor: usize,
	strategy: Quantization,
	base: f64,
	table: Vec<u8>,
	average_error: f64,
}

impl QuantizedModel {
	/// Builds a linearly quantized model.
	pub fn new(matrix: &FrequencyMatrix) -> Self {
		Self::with_strategy(matrix, Quantization::default())
	}

	/// Builds a model with an explicit quantization strategy.
	///
	/// Logs the average relative reconstruction error over the non-zero cells.
	pub fn with_strategy(matrix: &FrequencyMatrix, strategy: Quantization) -> Self {
		let norm = euclidean_norm(matrix);
		let normalized: Vec<f64> = match norm {
			Some(norm) => matrix.cells().iter().map(|&value| value as f64 / norm).collect(),
			None => vec![0.0; matrix.cells().len()],
		};
		let peak = norm.map_or(0.0, |norm| matrix.biggest() as f64 / norm);
		let base = strategy.base(peak);

		let table: Vec<u8> = normalized.iter().map(|&value| strategy.encode(value, base)).collect();

		let mut delta = 0.0;
		let mut count = 0usize;
		for (&value, &byte) in normalized.iter().zip(&table) {
			if value > 0.0 {
				delta += (value - strategy.decode(byte, base)).abs() / value;
				count += 1;
			}
		}
		let average_error = if count == 0 { 0.0 } else { delta / count as f64 };
		info!(
			"quantized {size}x{size} table ({strategy}): base={base}, average relative error={percent:.4}%",
			size = matrix.size(),
			percent = average_error * 100.0
		);

		Self {
			size: matrix.size(),
			factor: matrix.factor(),
			strategy,
			base,
			table,
			average_error,
		}
	}

	/// Scale factor written next to the exported table.
	pub fn base(&self) -> f64 {
		self.base
	}

	/// Strategy used to build the table.
	pub fn strategy(&self) -> Quantization {
		self.strategy
	}

	/// Stored byte at stored coordinates.
	pub fn byte(&self, i: usize, j: usize) -> u8 {
		self.table[i * self.size + j]
	}

	/// Average of `|normalized - reconstructed| / normalized` over non-zero cells.
	pub fn average_error(&self) -> f64 {
		self.average_error
	}
}

impl ScoringModel for QuantizedModel {
	fn size(&self) -> usize {
		self.size
	}

	fn score(&self, i: u8, j: u8) -> f64 {
		let byte = self.byte(usize::from(i) / self.factor, usize::from(j) / self.factor);
		self.strategy.decode(byte, self.base)
	}

	fn write_table(&self, out: &mut dyn Write) -> io::Result<()> {
		writeln!(out, "const double base={};", self.base)?;
		write_c_array(out, "unsigned char", self.size, |i, j| self.byte(i, j))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linear_scores_stay_below_peak() {
		let m = FrequencyMatrix::from_cells(2, vec![10, 0, 0, 5]).unwrap();
		let model = QuantizedModel::new(&m);
		let peak = 10.0 / 125f64.sqrt();
		assert!((model.base() - peak / 255.0).abs() < 1e-12);
		for i in [0u8, 200] {
			for j in [0u8, 200] {
				assert!(model.score(i, j) <= peak);
			}
		}
		assert!(model.score(0, 0) > 0.0);
		assert_eq!(model.score(0, 200), 0.0);
		assert!(model.average_error().is_finite());
		assert!(model.average_error() >= 0.0);
	}

	#[test]
	fn log_strategies_reconstruct_peak() {
		let m = FrequencyMatrix::from_cells(2, vec![100, 1, 40, 7]).unwrap();
		let peak = 100.0 / (100f64 * 100.0 + 1.0 + 1600.0 + 49.0).sqrt();
		for strategy in [Quantization::SingleLog, Quantization::DoubleLog] {
			let model = QuantizedModel::with_strategy(&m, strategy);
			assert_eq!(model.byte(0, 0), 255);
			assert!((model.score(0, 0) - peak).abs() < 1e-9);
			assert!(model.average_error() < 0.1);
		}
	}

	#[test]
	fn empty_matrix_has_zero_error() {
		let m = FrequencyMatrix::from_cells(4, vec![0; 16]).unwrap();
		let model = QuantizedModel::new(&m);
		assert_eq!(model.average_error(), 0.0);
		assert_eq!(model.score(255, 255), 0.0);
	}

	#[test]
	fn exports_base_then_byte_table() {
		let m = FrequencyMatrix::from_cells(2, vec![0, 0, 0, 0]).unwrap();
		let mut out = Vec::new();
		QuantizedModel::new(&m).write_table(&mut out).unwrap();
		assert_eq!(
			String::from_utf8(out).unwrap(),
			"const double base=0;\nconst unsigned char vector[2][2] = {\n\t{0,0,},\n\t{0,0,},\n};\n"
		);
	}
}
