use std::fmt;
use std::path::{Path, PathBuf};

use super::reference::ReferenceGuess;

/// Outcome of one judge for one input.
///
/// `PlainAscii` and `NoEvidence` are distinct inconclusive outcomes: the first
/// means no bigram survived the ASCII-skip rule, the second means non-ASCII
/// bigrams were seen but no single candidate accumulated the strictly largest
/// positive score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
	Detected(String),
	PlainAscii,
	NoEvidence,
}

impl Verdict {
	/// Label of the winning candidate, if any.
	pub fn label(&self) -> Option<&str> {
		match self {
			Verdict::Detected(label) => Some(label),
			Verdict::PlainAscii | Verdict::NoEvidence => None,
		}
	}

	pub fn is_conclusive(&self) -> bool {
		matches!(self, Verdict::Detected(_))
	}

	/// Whether this verdict names `label`.
	pub fn matches(&self, label: &str) -> bool {
		self.label() == Some(label)
	}
}

impl fmt::Display for Verdict {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Verdict::Detected(label) => f.write_str(label),
			Verdict::PlainAscii => f.write_str("ascii"),
			Verdict::NoEvidence => f.write_str("no-evidence"),
		}
	}
}

/// The three verdicts produced for one file, plus stream statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FileVerdict {
	pub exact: Verdict,
	pub quantized: Verdict,
	pub reference: ReferenceGuess,
	/// Bigrams that survived the ASCII-skip rule.
	pub scored_bigrams: u64,
	/// Scored bigrams where at least one candidate had a positive count.
	pub qualifying_bigrams: u64,
	/// Bytes consumed before the stream ended or the cutoff was reached.
	pub bytes_read: u64,
}

/// A corpus file that could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
	pub path: PathBuf,
	pub message: String,
}

/// Per-judge match counts over a labeled corpus.
///
/// `total` counts every file of the corpus, failed ones included; failed files
/// never count as matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestReport {
	pub exact_matches: u64,
	pub quantized_matches: u64,
	pub reference_matches: u64,
	pub total: u64,
	pub failures: Vec<FileFailure>,
}

impl TestReport {
	/// Number of files that could not be classified.
	pub fn failed(&self) -> u64 {
		self.failures.len() as u64
	}

	/// Records the outcome of one file against the corpus label.
	pub(crate) fn record(&mut self, path: &Path, label: &str, outcome: std::io::Result<FileVerdict>) {
		self.total += 1;
		match outcome {
			Ok(verdict) => {
				if verdict.exact.matches(label) {
					self.exact_matches += 1;
				}
				if verdict.quantized.matches(label) {
					self.quantized_matches += 1;
				}
				if verdict.reference.label() == Some(label) {
					self.reference_matches += 1;
				}
			}
			Err(e) => self.failures.push(FileFailure {
				path: path.to_path_buf(),
				message: e.to_string(),
			}),
		}
	}

	/// Adds the counts of a partial report (one worker's share) to this one.
	pub fn merge(&mut self, other: TestReport) {
		self.exact_matches += other.exact_matches;
		self.quantized_matches += other.quantized_matches;
		self.reference_matches += other.reference_matches;
		self.total += other.total;
		self.failures.extend(other.failures);
	}
}
