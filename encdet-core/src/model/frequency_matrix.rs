use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{EncdetError, Result};
use crate::io::{create_buffered, decode_u32_le};

/// Width of the fine coordinate space (every possible byte value).
pub const FINE_SIZE: usize = 256;

/// Number of buckets of the value-distribution export.
const DISTRIBUTION_BUCKETS: usize = 100;

/// Square matrix of bigram occurrence counts.
///
/// Cell `(i, j)` counts how often the byte pair `(i, j)` was observed in a
/// training corpus. The matrix may be stored at a coarser resolution than the
/// full 256×256 byte-pair space: with `size = N`, a fine coordinate is mapped
/// onto the stored grid by dividing it by `factor = 256 / N`.
///
/// # Invariants
/// - `size` divides 256 and is non-zero
/// - `cells.len() == size * size` (row-major)
/// - Cells are never mutated after construction, so the cached aggregates
///   stay valid for the lifetime of the instance
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(try_from = "RawMatrix")]
pub struct FrequencyMatrix {
	size: usize,
	cells: Vec<u64>,

	#[serde(skip)]
	sum_of_squares: OnceLock<BigUint>,
	#[serde(skip)]
	total: OnceLock<u128>,
	#[serde(skip)]
	biggest: OnceLock<u64>,
	#[serde(skip)]
	smallest: OnceLock<Option<u64>>,
}

/// Wire shape of a cached matrix, validated on the way in.
#[derive(Deserialize)]
struct RawMatrix {
	size: usize,
	cells: Vec<u64>,
}

impl TryFrom<RawMatrix> for FrequencyMatrix {
	type Error = EncdetError;

	fn try_from(raw: RawMatrix) -> Result<Self> {
		Self::from_cells(raw.size, raw.cells)
	}
}

impl FrequencyMatrix {
	/// Loads a training (or mask) matrix from a flat file of little-endian
	/// `u32` counts, row-major.
	///
	/// The size is `floor(sqrt(byte_length / 4))`.
	///
	/// # Errors
	/// - `Format` if the length is not exactly `size * size` words, or if the
	///   size does not divide 256
	/// - `Io` if the file cannot be read
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = fs::read(path)?;
		let words = bytes.len() / 4;
		let size = words.isqrt();
		if bytes.len() % 4 != 0 || size * size != words {
			return Err(EncdetError::Format(format!(
				"{}: {} bytes do not form a square matrix of u32 counts",
				path.display(),
				bytes.len()
			)));
		}
		Self::from_cells(size, decode_u32_le(&bytes))
	}

	/// Builds a matrix from row-major cells.
	///
	/// # Errors
	/// Returns `Format` if `size` does not divide 256 or if the number of cells
	/// is not `size * size`.
	pub fn from_cells(size: usize, cells: Vec<u64>) -> Result<Self> {
		if size == 0 || FINE_SIZE % size != 0 {
			return Err(EncdetError::Format(format!("matrix size {size} does not divide {FINE_SIZE}")));
		}
		if cells.len() != size * size {
			return Err(EncdetError::Format(format!(
				"expected {} cells for a {size}x{size} matrix, got {}",
				size * size,
				cells.len()
			)));
		}
		Ok(Self::from_validated(size, cells))
	}

	fn from_validated(size: usize, cells: Vec<u64>) -> Self {
		Self {
			size,
			cells,
			sum_of_squares: OnceLock::new(),
			total: OnceLock::new(),
			biggest: OnceLock::new(),
			smallest: OnceLock::new(),
		}
	}

	/// Returns the stored resolution `N`.
	pub fn size(&self) -> usize {
		self.size
	}

	/// Returns how many fine coordinates map onto one stored row or column.
	pub fn factor(&self) -> usize {
		FINE_SIZE / self.size
	}

	/// Returns the row-major stored cells.
	pub fn cells(&self) -> &[u64] {
		&self.cells
	}

	/// Returns the stored cell at stored coordinates.
	///
	/// # Panics
	/// Panics if `i` or `j` is not below `size()`.
	pub fn cell(&self, i: usize, j: usize) -> u64 {
		self.cells[i * self.size + j]
	}

	/// Returns the count for the byte pair `(i, j)` (fine coordinates).
	pub fn score(&self, i: u8, j: u8) -> u64 {
		let factor = self.factor();
		self.cell(usize::from(i) / factor, usize::from(j) / factor)
	}

	/// Reduces the resolution to `target` by summing square blocks.
	///
	/// When `target` is the current size, the same shared instance is returned.
	///
	/// # Errors
	/// - `Dimension` if `target` does not divide the current size
	/// - `Overflow` if a block sum does not fit in a `u64`
	pub fn downscale(self: &Arc<Self>, target: usize) -> Result<Arc<Self>> {
		if target == 0 || self.size % target != 0 {
			return Err(EncdetError::Dimension {
				operation: "downscale",
				left: self.size,
				right: target,
			});
		}
		if target == self.size {
			return Ok(Arc::clone(self));
		}

		let block = self.size / target;
		let mut cells = vec![0u64; target * target];
		for i in 0..self.size {
			for j in 0..self.size {
				let index = (i / block) * target + j / block;
				cells[index] = cells[index].checked_add(self.cell(i, j)).ok_or_else(|| {
					EncdetError::Overflow(format!("block ({}, {}) while downscaling to {target}", i / block, j / block))
				})?;
			}
		}
		Ok(Arc::new(Self::from_validated(target, cells)))
	}

	/// Keeps only the cells where `mask` is non-zero.
	///
	/// # Errors
	/// Returns `Dimension` if the sizes differ.
	pub fn mask(&self, mask: &Self) -> Result<Self> {
		self.select(mask, "mask", |keep| keep)
	}

	/// Keeps only the cells where `mask` is zero.
	///
	/// For every cell, `mask(k) + mask_invert(k)` equals the original count.
	///
	/// # Errors
	/// Returns `Dimension` if the sizes differ.
	pub fn mask_invert(&self, mask: &Self) -> Result<Self> {
		self.select(mask, "mask_invert", |keep| !keep)
	}

	fn select(&self, mask: &Self, operation: &'static str, keep: impl Fn(bool) -> bool) -> Result<Self> {
		if mask.size != self.size {
			return Err(EncdetError::Dimension {
				operation,
				left: self.size,
				right: mask.size,
			});
		}
		let cells = self
			.cells
			.iter()
			.zip(&mask.cells)
			.map(|(&value, &flag)| if keep(flag != 0) { value } else { 0 })
			.collect();
		Ok(Self::from_validated(self.size, cells))
	}

	/// Sum of squared cells, in arbitrary precision.
	pub fn sum_of_squares(&self) -> &BigUint {
		self.sum_of_squares.get_or_init(|| {
			self.cells
				.iter()
				.map(|&value| BigUint::from(u128::from(value) * u128::from(value)))
				.sum()
		})
	}

	/// Sum of all cells.
	pub fn total(&self) -> u128 {
		*self.total.get_or_init(|| self.cells.iter().map(|&value| u128::from(value)).sum())
	}

	/// Largest cell (0 for an all-zero matrix).
	pub fn biggest(&self) -> u64 {
		*self.biggest.get_or_init(|| self.cells.iter().copied().max().unwrap_or(0))
	}

	/// Smallest non-zero cell, `None` when every cell is zero.
	pub fn smallest_non_zero(&self) -> Option<u64> {
		*self.smallest.get_or_init(|| self.cells.iter().copied().filter(|&value| value > 0).min())
	}

	/// Writes the bucketed value distribution as CSV.
	///
	/// Three rows (`cnt`, `Log`, `Log2`) histogram the non-zero, non-maximal
	/// cells over 100 buckets on a linear, logarithmic and double-logarithmic
	/// scale. Each cell is a spreadsheet formula `=<count*100>/<total>`.
	pub fn write_distribution_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
		write!(out, ",")?;
		for bucket in 1..=DISTRIBUTION_BUCKETS {
			write!(out, "{bucket},")?;
		}
		writeln!(out)?;

		let max = self.biggest();
		let max_log = (max as f64 + 1.0).ln();
		let max_log_log = (max_log + 1.0).ln();
		let bucket = |position: f64| (position as usize).min(DISTRIBUTION_BUCKETS - 1);

		let mut linear = [0u64; DISTRIBUTION_BUCKETS];
		let mut single_log = [0u64; DISTRIBUTION_BUCKETS];
		let mut double_log = [0u64; DISTRIBUTION_BUCKETS];
		let mut total = 0u64;
		for &value in &self.cells {
			if value == 0 || value == max {
				continue;
			}
			let log = (value as f64 + 1.0).ln();
			linear[bucket((u128::from(value) * 100 / u128::from(max)) as f64)] += 1;
			single_log[bucket(log * 100.0 / max_log)] += 1;
			double_log[bucket((log + 1.0).ln() * 100.0 / max_log_log)] += 1;
			total += 1;
		}

		for (name, counts) in [("cnt", &linear), ("Log", &single_log), ("Log2", &double_log)] {
			write!(out, "{name},")?;
			for count in counts {
				write!(out, "={}/{total},", count * 100)?;
			}
			writeln!(out)?;
		}
		Ok(())
	}

	/// Writes the value distribution CSV to `path`.
	pub fn export_distribution<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let mut out = create_buffered(path)?;
		self.write_distribution_csv(&mut out)?;
		out.flush()?;
		Ok(())
	}
}
