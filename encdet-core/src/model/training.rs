use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::classifier::candidates::{Candidate, CandidateSet};
use crate::config::TrainingConfig;
use crate::error::{EncdetError, Result};
use crate::io::{build_cache_path, build_matrix_path};
use super::frequency_matrix::FrequencyMatrix;

/// Identity of the mask a cached matrix was built with.
///
/// Only the non-zero pattern matters to masking, so the mask is kept as a
/// bit per cell.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
struct MaskKey {
	size: usize,
	flags: Vec<u8>,
}

impl MaskKey {
	fn of(mask: &FrequencyMatrix) -> Self {
		let mut flags = vec![0u8; mask.cells().len().div_ceil(8)];
		for (index, &value) in mask.cells().iter().enumerate() {
			if value != 0 {
				flags[index / 8] |= 1 << (index % 8);
			}
		}
		Self { size: mask.size(), flags }
	}
}

/// Cache file contents, as read back.
#[derive(Deserialize)]
struct CachedMatrix {
	mask: Option<MaskKey>,
	matrix: FrequencyMatrix,
}

/// Cache file contents, as written.
#[derive(Serialize)]
struct CacheEntry<'a> {
	mask: Option<&'a MaskKey>,
	matrix: &'a FrequencyMatrix,
}

fn read_cache(path: &Path) -> Result<CachedMatrix> {
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}

fn write_cache(path: &Path, entry: &CacheEntry<'_>) -> Result<()> {
	let bytes = postcard::to_stdvec(entry)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Loads the prepared (masked, down-scaled) matrix of one label.
///
/// If a binary cache `<dictionary>/<label>_<size>.bin` (`<label>.bin` when no
/// target size is set) exists and caching is enabled, it is decoded with
/// `postcard`. Otherwise the training matrix `<dictionary>/<label>.vec` is
/// loaded, masked, down-scaled and written to the cache for the next run.
///
/// # Notes
/// - The cache records the mask it was built with; a cache built with
///   another mask (or none) is rebuilt.
/// - A cache of the wrong size, or one that cannot be read or decoded, is
///   rebuilt. Failing to write the cache only logs a warning.
///
/// # Errors
/// - `Format` / `Dimension` if the training or mask files are inconsistent
/// - `Io` if the training matrix cannot be read
pub fn prepare_matrix(config: &TrainingConfig, label: &str, mask: Option<&FrequencyMatrix>) -> Result<Arc<FrequencyMatrix>> {
	let target = config.target_size();
	let mask_key = mask.map(MaskKey::of);
	let cache_path = build_cache_path(config.dictionary(), label, target);
	if config.use_cache && cache_path.exists() {
		match read_cache(&cache_path) {
			Ok(cached) if cached.mask != mask_key => {
				info!("{label}: cache {} was built with another mask, rebuilding", cache_path.display());
			}
			Ok(cached) if target.is_some_and(|size| cached.matrix.size() != size) => {
				warn!("{label}: ignoring cache {} of size {}", cache_path.display(), cached.matrix.size());
			}
			Ok(cached) => {
				let size = cached.matrix.size();
				info!("{label}: loaded cached {size}x{size} matrix from {}", cache_path.display());
				return Ok(Arc::new(cached.matrix));
			}
			Err(e) => warn!("{label}: unreadable cache {}, rebuilding: {e}", cache_path.display()),
		}
	}

	let source = FrequencyMatrix::load(build_matrix_path(config.dictionary(), label))?;
	let masked = match mask {
		Some(mask) => source.mask(mask)?,
		None => source,
	};
	let size = target.unwrap_or(masked.size());
	let matrix = Arc::new(masked).downscale(size)?;
	info!("{label}: prepared {size}x{size} matrix, {} bigrams", matrix.total());

	if config.use_cache {
		let entry = CacheEntry { mask: mask_key.as_ref(), matrix: matrix.as_ref() };
		if let Err(e) = write_cache(&cache_path, &entry) {
			warn!("{label}: cannot write cache {}: {e}", cache_path.display());
		}
	}
	Ok(matrix)
}

/// Builds the candidate set described by `config`.
///
/// The mask is loaded once; each label is prepared on its own thread and the
/// results are collected through a channel, then ordered like the labels.
///
/// # Errors
/// Returns the first preparation error, or a candidate-set validation error.
pub fn build_candidates(config: &TrainingConfig) -> Result<CandidateSet> {
	let mask = match &config.mask {
		Some(path) => {
			let mask = FrequencyMatrix::load(path)?;
			info!("loaded mask {} ({}x{})", path.display(), mask.size(), mask.size());
			Some(Arc::new(mask))
		}
		None => None,
	};

	let (tx, rx) = mpsc::channel();
	for (index, label) in config.labels().iter().enumerate() {
		let tx = tx.clone();
		let config = config.clone();
		let label = label.clone();
		let mask = mask.clone();

		thread::spawn(move || {
			let result = prepare_matrix(&config, &label, mask.as_deref())
				.map(|matrix| Candidate::quantized(label, matrix, config.strategy));
			// The receiver may be gone after an earlier failure
			let _ = tx.send((index, result));
		});
	}
	drop(tx);

	let mut slots: Vec<Option<Candidate>> = vec![None; config.labels().len()];
	for (index, result) in rx.iter() {
		slots[index] = Some(result?);
	}

	let mut candidates = Vec::with_capacity(slots.len());
	for (slot, label) in slots.into_iter().zip(config.labels()) {
		let candidate = slot.ok_or_else(|| EncdetError::Config(format!("{label}: model construction did not complete")))?;
		candidates.push(candidate);
	}
	CandidateSet::new(candidates)
}

/// Writes `<label>.c` for every candidate into `directory`.
///
/// Returns the written paths in candidate order.
pub fn export_tables<P: AsRef<Path>>(candidates: &CandidateSet, directory: P) -> Result<Vec<PathBuf>> {
	let mut written = Vec::with_capacity(candidates.len());
	for candidate in candidates.iter() {
		let path = directory.as_ref().join(format!("{}.c", candidate.label()));
		candidate.export(&path)?;
		written.push(path);
	}
	Ok(written)
}
