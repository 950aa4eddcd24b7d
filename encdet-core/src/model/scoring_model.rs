use std::f64::consts::LN_2;
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::path::Path;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::error::Result;
use crate::io::create_buffered;
use super::frequency_matrix::FrequencyMatrix;

/// A read-only, normalized view of a candidate's bigram statistics.
///
/// Scores are non-negative and proportional to how likely a byte pair is
/// under the candidate encoding. Implementations are immutable once built,
/// which makes them shareable across classification threads.
pub trait ScoringModel: Send + Sync + fmt::Debug {
	/// Stored resolution `N` of the underlying table.
	fn size(&self) -> usize;

	/// Score of the byte pair `(i, j)` (fine coordinates).
	fn score(&self, i: u8, j: u8) -> f64;

	/// Writes the coefficient table as a C declaration.
	fn write_table(&self, out: &mut dyn Write) -> io::Result<()>;

	/// Writes the coefficient table to `path` (created or truncated).
	fn export(&self, path: &Path) -> Result<()> {
		let mut out = create_buffered(path)?;
		self.write_table(&mut out)?;
		out.flush()?;
		Ok(())
	}
}

/// Euclidean norm of a matrix, `e^(ln(sum of squares) / 2)`.
///
/// Returns `None` for an all-zero matrix.
pub(crate) fn euclidean_norm(matrix: &FrequencyMatrix) -> Option<f64> {
	let squares = matrix.sum_of_squares();
	if squares.is_zero() {
		return None;
	}
	Some((ln_big(squares) / 2.0).exp())
}

/// Natural logarithm of an arbitrarily large integer.
///
/// Only the 64 most significant bits take part in the mantissa; the rest is
/// accounted for as a power of two.
pub(crate) fn ln_big(value: &BigUint) -> f64 {
	let shift = value.bits().saturating_sub(64);
	let top = (value >> shift).to_u64().map_or(f64::MAX, |top| top as f64);
	top.ln() + shift as f64 * LN_2
}

/// Writes `const <c_type> vector[N][N] = { ... };`, one row per line,
/// every element followed by a comma.
pub(crate) fn write_c_array<T: Display>(
	out: &mut dyn Write,
	c_type: &str,
	size: usize,
	value: impl Fn(usize, usize) -> T,
) -> io::Result<()> {
	writeln!(out, "const {c_type} vector[{size}][{size}] = {{")?;
	for i in 0..size {
		write!(out, "\t{{")?;
		for j in 0..size {
			write!(out, "{},", value(i, j))?;
		}
		writeln!(out, "}},")?;
	}
	writeln!(out, "}};")
}
