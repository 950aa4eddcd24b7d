//! Bigram-based character encoding estimation library.
//!
//! This crate compares the byte-bigram distribution of an input stream with
//! pre-trained reference distributions, one per candidate encoding:
//! - Bigram frequency matrices (loading, down-sampling, masking, aggregates)
//! - Normalized scoring models (exact `f64` and one-byte quantized tables)
//! - A classifier running three independent judges over a labeled corpus
//! - Training helpers (load-or-build with a binary cache, table export)

/// Frequency matrices, scoring models and model training.
pub mod model;

/// Candidate sets, per-file classification and corpus testing.
pub mod classifier;

/// Crate-wide error type.
pub mod error;

/// Recursive collection of corpus files.
pub mod corpus;

/// Training configuration (dictionary location, labels, resolution).
pub mod config;

/// I/O utilities (binary matrix reading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use classifier::candidates::{Candidate, CandidateSet};
pub use classifier::reference::{ChardetngJudge, ReferenceGuess, ReferenceJudge};
pub use classifier::verdict::{FileVerdict, TestReport, Verdict};
pub use classifier::Classifier;
pub use config::TrainingConfig;
pub use corpus::FileSet;
pub use error::{EncdetError, Result};
pub use model::exact_model::ExactModel;
pub use model::frequency_matrix::FrequencyMatrix;
pub use model::quantization::Quantization;
pub use model::quantized_model::QuantizedModel;
pub use model::scoring_model::ScoringModel;
pub use model::training::{build_candidates, export_tables, prepare_matrix};
