use std::path::{Path, PathBuf};

use crate::error::{EncdetError, Result};
use crate::io::normalize_folder;
use crate::model::frequency_matrix::FINE_SIZE;
use crate::model::quantization::Quantization;

/// Parameters used to build a candidate set from a training dictionary.
///
/// The dictionary directory holds one `<label>.vec` matrix per candidate and
/// receives the `<label>_<size>.bin` caches.
///
/// # Invariants
/// - `labels` is non-empty and free of duplicates
/// - `target_size`, when set, divides 256
#[derive(Debug, Clone)]
pub struct TrainingConfig {
	dictionary: PathBuf,
	labels: Vec<String>,
	target_size: Option<usize>,

	/// Optional mask applied to every matrix before down-scaling.
	pub mask: Option<PathBuf>,

	/// Quantization rule of the candidate models.
	pub strategy: Quantization,

	/// Number of raw bytes handed to the reference judge (`None` = all read bytes).
	pub prefix_limit: Option<usize>,

	/// Whether prepared matrices are cached next to the dictionary.
	pub use_cache: bool,
}

impl TrainingConfig {
	/// Creates a configuration that keeps the loaded matrix size, with the
	/// default strategy.
	///
	/// `"."` and `"./"` resolve to the current directory.
	///
	/// # Errors
	/// Returns `Config` if `labels` is empty or contains duplicates.
	pub fn new<P, I, S>(dictionary: P, labels: I) -> Result<Self>
	where
		P: AsRef<Path>,
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut config = Self {
			dictionary: normalize_folder(dictionary.as_ref()),
			labels: Vec::new(),
			target_size: None,
			mask: None,
			strategy: Quantization::default(),
			prefix_limit: None,
			use_cache: true,
		};
		config.set_labels(labels)?;
		Ok(config)
	}

	pub fn dictionary(&self) -> &Path {
		&self.dictionary
	}

	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	/// Resolution the matrices are down-scaled to, `None` to keep the size
	/// of the training files.
	pub fn target_size(&self) -> Option<usize> {
		self.target_size
	}

	/// Replaces the candidate labels.
	///
	/// # Errors
	/// Returns `Config` if the list is empty or contains duplicates.
	pub fn set_labels<I, S>(&mut self, labels: I) -> Result<()>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
		if labels.is_empty() {
			return Err(EncdetError::Config("at least one label is required".to_owned()));
		}
		for (index, label) in labels.iter().enumerate() {
			if label.trim().is_empty() {
				return Err(EncdetError::Config("labels cannot be empty".to_owned()));
			}
			if labels[..index].contains(label) {
				return Err(EncdetError::Config(format!("label '{label}' is listed twice")));
			}
		}
		self.labels = labels;
		Ok(())
	}

	/// Sets the resolution the matrices are down-scaled to.
	///
	/// # Errors
	/// Returns `Config` if `size` does not divide 256.
	pub fn set_target_size(&mut self, size: usize) -> Result<()> {
		if size == 0 || FINE_SIZE % size != 0 {
			return Err(EncdetError::Config(format!("target size must divide {FINE_SIZE}, got {size}")));
		}
		self.target_size = Some(size);
		Ok(())
	}
}
