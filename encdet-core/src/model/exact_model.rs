use std::io::{self, Write};

use super::frequency_matrix::FrequencyMatrix;
use super::scoring_model::{euclidean_norm, write_c_array, ScoringModel};

/// Normalized model keeping one `f64` per stored cell.
///
/// `score(i, j) = cell(i, j) / norm`, where `norm` is the Euclidean norm of
/// the source matrix. The squared scores of all stored cells sum to 1 (an
/// all-zero matrix yields an all-zero model).
#[derive(Debug, Clone)]
pub struct ExactModel {
	size: usize,
	factor: usize,
	table: Vec<f64>,
}

impl ExactModel {
	/// Builds the normalized table of `matrix`.
	pub fn new(matrix: &FrequencyMatrix) -> Self {
		let table = match euclidean_norm(matrix) {
			Some(norm) => matrix.cells().iter().map(|&value| value as f64 / norm).collect(),
			None => vec![0.0; matrix.cells().len()],
		};
		Self {
			size: matrix.size(),
			factor: matrix.factor(),
			table,
		}
	}

	/// Normalized value at stored coordinates.
	pub fn normalized(&self, i: usize, j: usize) -> f64 {
		self.table[i * self.size + j]
	}
}

impl ScoringModel for ExactModel {
	fn size(&self) -> usize {
		self.size
	}

	fn score(&self, i: u8, j: u8) -> f64 {
		self.normalized(usize::from(i) / self.factor, usize::from(j) / self.factor)
	}

	fn write_table(&self, out: &mut dyn Write) -> io::Result<()> {
		write_c_array(out, "double", self.size, |i, j| self.normalized(i, j))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scores_are_unit_normalized() {
		let m = FrequencyMatrix::from_cells(2, vec![3, 0, 0, 4]).unwrap();
		let model = ExactModel::new(&m);
		assert!((model.score(0, 0) - 0.6).abs() < 1e-12);
		assert!((model.score(200, 255) - 0.8).abs() < 1e-12);
		assert_eq!(model.score(0, 128), 0.0);
	}

	#[test]
	fn empty_matrix_scores_zero() {
		let m = FrequencyMatrix::from_cells(1, vec![0]).unwrap();
		let model = ExactModel::new(&m);
		assert_eq!(model.score(17, 42), 0.0);
	}

	#[test]
	fn exports_double_table() {
		let m = FrequencyMatrix::from_cells(2, vec![0; 4]).unwrap();
		let mut out = Vec::new();
		ExactModel::new(&m).write_table(&mut out).unwrap();
		assert_eq!(
			String::from_utf8(out).unwrap(),
			"const double vector[2][2] = {\n\t{0,0,},\n\t{0,0,},\n};\n"
		);
	}

	#[test]
	fn export_writes_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("sjis.c");
		let m = FrequencyMatrix::from_cells(1, vec![7]).unwrap();
		ExactModel::new(&m).export(&path).unwrap();
		let text = std::fs::read_to_string(&path).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines[0], "const double vector[1][1] = {");
		let value: f64 = lines[1].trim_start_matches("\t{").trim_end_matches(",},").parse().unwrap();
		assert!((value - 1.0).abs() < 1e-12);
		assert_eq!(lines[2], "};");
	}
}
