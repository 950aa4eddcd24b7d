//! Classification of byte streams against a set of candidate encodings.
//!
//! - Validated candidate sets with precomputed exact-judge weights (`CandidateSet`)
//! - Per-stream evidence accumulation with the ASCII-skip rule
//! - Exact, quantized and reference verdicts (`Verdict`, `FileVerdict`)
//! - Corpus-level match counting across worker threads (`Classifier::test`)

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use log::{debug, warn};

use crate::corpus::FileSet;
use evidence::Evidence;
use candidates::CandidateSet;
use reference::{ChardetngJudge, ReferenceJudge};
use verdict::{FileVerdict, TestReport};

/// Candidates and the exact-judge weights shared by every classification.
pub mod candidates;

/// Per-stream accumulators and the ASCII-skip rule.
pub mod evidence;

/// External reference detector.
pub mod reference;

/// Verdicts and corpus reports.
pub mod verdict;

/// Runs the three judges over the files of one labeled corpus.
///
/// # Responsibilities
/// - Stream each file bigram by bigram, skipping ASCII-only pairs
/// - Stop after `cutoff` qualifying bigrams
/// - Produce exact, quantized and reference verdicts
/// - Count, per judge, the files whose verdict equals the corpus label
pub struct Classifier {
	candidates: Arc<CandidateSet>,
	files: FileSet,
	label: String,
	judge: Box<dyn ReferenceJudge>,
	prefix_limit: Option<usize>,
}

impl Classifier {
	/// Creates a classifier for a corpus whose files are all encoded as `label`.
	///
	/// Uses [`ChardetngJudge`] as the reference judge and keeps every consumed
	/// byte for it.
	pub fn new(candidates: Arc<CandidateSet>, files: FileSet, label: impl Into<String>) -> Self {
		Self {
			candidates,
			files,
			label: label.into(),
			judge: Box::new(ChardetngJudge),
			prefix_limit: None,
		}
	}

	/// Replaces the reference judge.
	pub fn with_judge(mut self, judge: Box<dyn ReferenceJudge>) -> Self {
		self.judge = judge;
		self
	}

	/// Caps the number of raw bytes handed to the reference judge.
	pub fn with_prefix_limit(mut self, limit: Option<usize>) -> Self {
		self.prefix_limit = limit;
		self
	}

	/// Label of the corpus.
	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn candidates(&self) -> &CandidateSet {
		&self.candidates
	}

	pub fn files(&self) -> &FileSet {
		&self.files
	}

	/// Classifies one file.
	///
	/// `cutoff` is the number of qualifying bigrams after which reading stops;
	/// 0 reads the whole file.
	///
	/// # Errors
	/// Returns the I/O error if the file cannot be opened or read.
	pub fn classify<P: AsRef<Path>>(&self, path: P, cutoff: u64) -> io::Result<FileVerdict> {
		let file = File::open(path)?;
		self.classify_reader(file, cutoff)
	}

	/// Classifies any byte stream.
	pub fn classify_reader<R: Read>(&self, reader: R, cutoff: u64) -> io::Result<FileVerdict> {
		let mut evidence = Evidence::new(self.candidates.len(), self.prefix_limit);
		let mut bytes = BufReader::new(reader).bytes();

		if let Some(first) = bytes.next() {
			let mut prev = first?;
			evidence.capture(prev);
			for byte in bytes {
				let cur = byte?;
				evidence.capture(cur);
				if evidence.observe(&self.candidates, prev, cur) && cutoff > 0 && evidence.qualifying_bigrams >= cutoff {
					break;
				}
				prev = cur;
			}
		}

		Ok(FileVerdict {
			exact: evidence.exact_verdict(&self.candidates),
			quantized: evidence.quantized_verdict(&self.candidates),
			reference: self.judge.judge(evidence.prefix()),
			scored_bigrams: evidence.scored_bigrams,
			qualifying_bigrams: evidence.qualifying_bigrams,
			bytes_read: evidence.bytes_read,
		})
	}

	/// Classifies every file of the corpus and counts matches per judge.
	///
	/// Files are split into chunks processed by `num_cpus` scoped workers; each
	/// worker sends its partial report through a channel and the partials are
	/// merged at the end. Unreadable files are logged, counted in `total` and
	/// listed in `failures`.
	pub fn test(&self, cutoff: u64) -> TestReport {
		let files: Vec<&Path> = self.files.iter().collect();
		if files.is_empty() {
			return TestReport::default();
		}
		let workers = num_cpus::get().max(1);
		let chunk_size = files.len().div_ceil(workers);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for chunk in files.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial = TestReport::default();
					for &path in chunk {
						let outcome = self.classify(path, cutoff);
						match &outcome {
							Ok(verdict) => debug!(
								"{}: exact={} quantized={} reference={:?}",
								path.display(),
								verdict.exact,
								verdict.quantized,
								verdict.reference
							),
							Err(e) => warn!("{}: skipped, {e}", path.display()),
						}
						partial.record(path, &self.label, outcome);
					}
					// The receiver outlives the scope
					let _ = tx.send(partial);
				});
			}
		});
		drop(tx);

		let mut report = TestReport::default();
		for partial in rx.iter() {
			report.merge(partial);
		}
		report.failures.sort_by(|a, b| a.path.cmp(&b.path));
		report
	}
}
