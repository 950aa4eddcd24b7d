use std::io;

use thiserror::Error;

/// Errors raised while loading matrices, building models or configuring a run.
///
/// Per-file failures during classification are not reported through this
/// type; they are collected in [`crate::TestReport`] instead.
#[derive(Debug, Error)]
pub enum EncdetError {
	/// A matrix, mask or cache file does not describe a valid N×N layout.
	#[error("invalid matrix format: {0}")]
	Format(String),

	/// Two matrices (or a matrix and a model) have incompatible sizes.
	#[error("dimension mismatch in {operation}: {left} vs {right}")]
	Dimension {
		operation: &'static str,
		left: usize,
		right: usize,
	},

	/// A block sum no longer fits in a 64-bit count.
	#[error("count overflow: {0}")]
	Overflow(String),

	/// Invalid configuration value.
	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] io::Error),

	#[error("model cache error: {0}")]
	Cache(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, EncdetError>;
