use std::sync::Arc;

use encdet_core::{ExactModel, FrequencyMatrix, Quantization, QuantizedModel, ScoringModel};
use proptest::prelude::*;

/// Sizes dividing 256 that keep the generated matrices small.
fn matrix_strategy() -> impl Strategy<Value = FrequencyMatrix> {
	prop::sample::select(vec![1usize, 2, 4, 8, 16]).prop_flat_map(|size| {
		prop::collection::vec(0u64..=u64::from(u32::MAX), size * size)
			.prop_map(move |cells| FrequencyMatrix::from_cells(size, cells).unwrap())
	})
}

fn stored_scores(model: &dyn ScoringModel, factor: usize) -> Vec<f64> {
	let size = model.size();
	let mut scores = Vec::with_capacity(size * size);
	for i in 0..size {
		for j in 0..size {
			scores.push(model.score((i * factor) as u8, (j * factor) as u8));
		}
	}
	scores
}

proptest! {
	#[test]
	fn prop_downscale_preserves_total(m in matrix_strategy(), shift in 0u32..5) {
		let m = Arc::new(m);
		let target = m.size() >> shift.min(m.size().trailing_zeros());
		let small = m.downscale(target).unwrap();
		prop_assert_eq!(small.size(), target);
		prop_assert_eq!(small.total(), m.total());
	}

	#[test]
	fn prop_mask_and_inverse_sum_to_original(
		(m, k) in matrix_strategy().prop_flat_map(|m| {
			let size = m.size();
			(Just(m), prop::collection::vec(0u64..3, size * size))
		})
	) {
		let size = m.size();
		let mask = FrequencyMatrix::from_cells(size, k).unwrap();
		let kept = m.mask(&mask).unwrap();
		let dropped = m.mask_invert(&mask).unwrap();
		for i in 0..size {
			for j in 0..size {
				prop_assert_eq!(kept.cell(i, j) + dropped.cell(i, j), m.cell(i, j));
			}
		}
	}

	#[test]
	fn prop_exact_model_has_unit_norm(m in matrix_strategy()) {
		prop_assume!(m.biggest() > 0);
		let model = ExactModel::new(&m);
		let squares: f64 = stored_scores(&model, m.factor()).iter().map(|s| s * s).sum();
		prop_assert!((squares - 1.0).abs() < 1e-9, "sum of squares {}", squares);
	}

	#[test]
	fn prop_linear_quantized_scores_are_bounded(m in matrix_strategy()) {
		prop_assume!(m.biggest() > 0);
		let model = QuantizedModel::with_strategy(&m, Quantization::Linear);
		let norm = ExactModel::new(&m);
		let peak = stored_scores(&norm, m.factor()).into_iter().fold(0.0, f64::max);
		for score in stored_scores(&model, m.factor()) {
			prop_assert!(score >= 0.0);
			prop_assert!(score <= peak * (1.0 + 1e-12));
		}
		prop_assert!(model.average_error().is_finite());
		prop_assert!(model.average_error() >= 0.0);
	}

	#[test]
	fn prop_log_quantized_error_is_finite(m in matrix_strategy()) {
		for strategy in [Quantization::SingleLog, Quantization::DoubleLog] {
			let model = QuantizedModel::with_strategy(&m, strategy);
			prop_assert!(model.average_error().is_finite());
			prop_assert!(model.average_error() >= 0.0);
		}
	}
}
