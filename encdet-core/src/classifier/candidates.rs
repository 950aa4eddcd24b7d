use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::{EncdetError, Result};
use crate::model::exact_model::ExactModel;
use crate::model::frequency_matrix::FrequencyMatrix;
use crate::model::quantization::Quantization;
use crate::model::quantized_model::QuantizedModel;
use crate::model::scoring_model::ScoringModel;

/// One candidate encoding: its raw counts and its normalized model.
///
/// The raw matrix feeds the exact judge, the model feeds the quantized judge.
#[derive(Debug, Clone)]
pub struct Candidate {
	label: String,
	matrix: Arc<FrequencyMatrix>,
	model: Arc<dyn ScoringModel>,
}

impl Candidate {
	/// Pairs a matrix with an already built model.
	pub fn new(label: impl Into<String>, matrix: Arc<FrequencyMatrix>, model: Arc<dyn ScoringModel>) -> Self {
		Self { label: label.into(), matrix, model }
	}

	/// Builds the quantized model of `matrix` with the given strategy.
	pub fn quantized(label: impl Into<String>, matrix: Arc<FrequencyMatrix>, strategy: Quantization) -> Self {
		let model = Arc::new(QuantizedModel::with_strategy(&matrix, strategy));
		Self::new(label, matrix, model)
	}

	/// Builds the full-precision model of `matrix`.
	pub fn exact(label: impl Into<String>, matrix: Arc<FrequencyMatrix>) -> Self {
		let model = Arc::new(ExactModel::new(&matrix));
		Self::new(label, matrix, model)
	}

	/// Same label and matrix with a full-precision model.
	pub fn to_exact(&self) -> Self {
		Self::exact(self.label.clone(), Arc::clone(&self.matrix))
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn matrix(&self) -> &FrequencyMatrix {
		&self.matrix
	}

	pub fn model(&self) -> &dyn ScoringModel {
		self.model.as_ref()
	}

	/// Raw count of the byte pair `(i, j)`.
	pub fn count(&self, i: u8, j: u8) -> u64 {
		self.matrix.score(i, j)
	}

	/// Normalized score of the byte pair `(i, j)`.
	pub fn score(&self, i: u8, j: u8) -> f64 {
		self.model.score(i, j)
	}

	/// Writes the model's coefficient table to `path`.
	pub fn export(&self, path: &Path) -> Result<()> {
		self.model.export(path)
	}
}

/// Validated, ordered set of candidates sharing one resolution.
///
/// Built once, then shared read-only by every classification.
///
/// # Invariants
/// - At least one candidate, labels are unique
/// - Every matrix and every model have the same size
/// - `weights[c] * sum_of_squares(c) == combined_factor` for every candidate
///   with a non-zero matrix, `weights[c] == 0` otherwise
#[derive(Debug)]
pub struct CandidateSet {
	candidates: Vec<Candidate>,
	size: usize,
	combined_factor: BigUint,
	weights: Vec<BigUint>,
}

impl CandidateSet {
	/// Validates the candidates and precomputes the exact-judge weights.
	///
	/// The combined factor is the square of the product of every non-zero
	/// candidate's sum of squares. Dividing it by one candidate's sum of
	/// squares is exact, so each candidate gets an integer weight and the exact
	/// judge never needs floating normalization.
	///
	/// # Errors
	/// - `Config` if the set is empty or a label is repeated
	/// - `Dimension` if two matrices, or a matrix and its model, differ in size
	pub fn new(candidates: Vec<Candidate>) -> Result<Self> {
		let first = candidates
			.first()
			.ok_or_else(|| EncdetError::Config("candidate set is empty".to_owned()))?;
		let size = first.matrix.size();

		let mut labels = HashSet::new();
		for candidate in &candidates {
			if !labels.insert(candidate.label.as_str()) {
				return Err(EncdetError::Config(format!("duplicate candidate label '{}'", candidate.label)));
			}
			if candidate.matrix.size() != size {
				return Err(EncdetError::Dimension {
					operation: "candidate set",
					left: size,
					right: candidate.matrix.size(),
				});
			}
			if candidate.model.size() != size {
				return Err(EncdetError::Dimension {
					operation: "candidate model",
					left: size,
					right: candidate.model.size(),
				});
			}
		}

		let mut product = BigUint::one();
		for candidate in &candidates {
			let squares = candidate.matrix.sum_of_squares();
			if !squares.is_zero() {
				product *= squares;
			}
		}
		let combined_factor = &product * &product;
		let weights = candidates
			.iter()
			.map(|candidate| {
				let squares = candidate.matrix.sum_of_squares();
				if squares.is_zero() { BigUint::zero() } else { &combined_factor / squares }
			})
			.collect();

		Ok(Self { candidates, size, combined_factor, weights })
	}

	/// Shared resolution of every candidate.
	pub fn size(&self) -> usize {
		self.size
	}

	pub fn len(&self) -> usize {
		self.candidates.len()
	}

	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}

	/// Candidates in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
		self.candidates.iter()
	}

	/// Looks a candidate up by label.
	pub fn get(&self, label: &str) -> Option<&Candidate> {
		self.candidates.iter().find(|candidate| candidate.label == label)
	}

	/// Square of the product of every non-zero sum of squares.
	pub fn combined_factor(&self) -> &BigUint {
		&self.combined_factor
	}

	/// `combined_factor / sum_of_squares` of the candidate at `index`.
	pub(crate) fn weight(&self, index: usize) -> &BigUint {
		&self.weights[index]
	}

	pub(crate) fn candidate(&self, index: usize) -> &Candidate {
		&self.candidates[index]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn matrix(size: usize, cells: &[u64]) -> Arc<FrequencyMatrix> {
		Arc::new(FrequencyMatrix::from_cells(size, cells.to_vec()).unwrap())
	}

	#[test]
	fn precomputes_combined_factor() {
		let set = CandidateSet::new(vec![
			Candidate::exact("sjis", matrix(2, &[10, 0, 0, 5])),
			Candidate::exact("utf8", matrix(2, &[0, 8, 3, 0])),
		])
		.unwrap();
		// (125 * 73)^2
		assert_eq!(*set.combined_factor(), BigUint::from(9125u32 * 9125));
		assert_eq!(*set.weight(0), BigUint::from(9125u32 * 73));
		assert_eq!(*set.weight(1), BigUint::from(9125u32 * 125));
		assert_eq!(set.get("utf8").map(Candidate::label), Some("utf8"));
	}

	#[test]
	fn empty_matrix_does_not_zero_the_factor() {
		let set = CandidateSet::new(vec![
			Candidate::exact("sjis", matrix(1, &[2])),
			Candidate::exact("empty", matrix(1, &[0])),
		])
		.unwrap();
		assert_eq!(*set.combined_factor(), BigUint::from(16u32));
		assert_eq!(*set.weight(0), BigUint::from(4u32));
		assert!(set.weight(1).is_zero());
	}

	#[test]
	fn rejects_mismatched_sizes() {
		let result = CandidateSet::new(vec![
			Candidate::exact("sjis", matrix(2, &[1; 4])),
			Candidate::exact("utf8", matrix(4, &[1; 16])),
		]);
		assert!(matches!(result, Err(EncdetError::Dimension { operation: "candidate set", .. })));
	}

	#[test]
	fn rejects_model_of_other_size() {
		let small = matrix(2, &[1; 4]);
		let big = matrix(4, &[1; 16]);
		let model: Arc<dyn ScoringModel> = Arc::new(ExactModel::new(&big));
		let result = CandidateSet::new(vec![Candidate::new("sjis", small, model)]);
		assert!(matches!(result, Err(EncdetError::Dimension { operation: "candidate model", .. })));
	}

	#[test]
	fn rejects_empty_and_duplicates() {
		assert!(matches!(CandidateSet::new(Vec::new()), Err(EncdetError::Config(_))));
		let result = CandidateSet::new(vec![
			Candidate::exact("sjis", matrix(1, &[1])),
			Candidate::exact("sjis", matrix(1, &[2])),
		]);
		assert!(matches!(result, Err(EncdetError::Config(_))));
	}
}
