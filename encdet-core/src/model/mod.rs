//! Bigram statistics and the scoring models derived from them.
//!
//! - Raw bigram count matrices (`FrequencyMatrix`)
//! - The scoring capability shared by all models (`ScoringModel`)
//! - Full-precision normalized tables (`ExactModel`)
//! - One-byte quantized tables (`QuantizedModel`, `Quantization`)
//! - Load-or-build of candidate models from a dictionary (`training`)

/// Square bigram count matrix with down-sampling, masking and cached aggregates.
pub mod frequency_matrix;

/// Capability shared by every normalized model, plus table export helpers.
pub mod scoring_model;

/// Normalized model storing one `f64` per cell.
pub mod exact_model;

/// Normalized model storing one byte per cell.
pub mod quantized_model;

/// Construction-time quantization strategies.
pub mod quantization;

/// Candidate construction from training files, with a binary cache.
pub mod training;
