use num_bigint::BigUint;
use num_traits::Zero;

use super::candidates::CandidateSet;
use super::verdict::Verdict;

/// Whether a byte counts as plain text for the ASCII-skip rule
/// (printable, tab, LF, FF, CR).
pub fn is_ascii_class(byte: u8) -> bool {
	matches!(byte, 0x20..=0x7e | 0x09 | 0x0a | 0x0c | 0x0d)
}

/// Running per-candidate scores for one input stream.
///
/// Created fresh for every file and consumed into verdicts.
#[derive(Debug)]
pub(crate) struct Evidence {
	raw: Vec<BigUint>,
	normalized: Vec<f64>,
	pub(crate) scored_bigrams: u64,
	pub(crate) qualifying_bigrams: u64,
	pub(crate) bytes_read: u64,
	prefix: Vec<u8>,
	prefix_limit: Option<usize>,
}

impl Evidence {
	pub(crate) fn new(candidates: usize, prefix_limit: Option<usize>) -> Self {
		Self {
			raw: vec![BigUint::zero(); candidates],
			normalized: vec![0.0; candidates],
			scored_bigrams: 0,
			qualifying_bigrams: 0,
			bytes_read: 0,
			prefix: Vec::new(),
			prefix_limit,
		}
	}

	/// Keeps a consumed byte for the reference judge, up to the prefix limit.
	pub(crate) fn capture(&mut self, byte: u8) {
		self.bytes_read += 1;
		if self.prefix_limit.is_none_or(|limit| self.prefix.len() < limit) {
			self.prefix.push(byte);
		}
	}

	/// Raw bytes kept for the reference judge.
	pub(crate) fn prefix(&self) -> &[u8] {
		&self.prefix
	}

	/// Scores the bigram `(prev, cur)` against every candidate.
	///
	/// ASCII-only bigrams are ignored. Returns `true` when the bigram
	/// qualifies, i.e. at least one candidate has a positive count for it.
	pub(crate) fn observe(&mut self, candidates: &CandidateSet, prev: u8, cur: u8) -> bool {
		if is_ascii_class(prev) && is_ascii_class(cur) {
			return false;
		}
		self.scored_bigrams += 1;

		let mut qualifying = false;
		for (index, candidate) in candidates.iter().enumerate() {
			let count = candidate.count(prev, cur);
			if count > 0 {
				self.raw[index] += count;
				self.normalized[index] += candidate.score(prev, cur);
				qualifying = true;
			}
		}
		if qualifying {
			self.qualifying_bigrams += 1;
		}
		qualifying
	}

	/// Exact judge: maximizes `raw² × combined_factor / sum_of_squares` in
	/// arbitrary precision.
	pub(crate) fn exact_verdict(&self, candidates: &CandidateSet) -> Verdict {
		let scores: Vec<BigUint> = self
			.raw
			.iter()
			.enumerate()
			.map(|(index, raw)| raw * raw * candidates.weight(index))
			.collect();
		self.verdict(candidates, &scores, |score| !score.is_zero())
	}

	/// Quantized judge: maximizes the accumulated normalized score.
	pub(crate) fn quantized_verdict(&self, candidates: &CandidateSet) -> Verdict {
		self.verdict(candidates, &self.normalized, |score| *score > 0.0)
	}

	fn verdict<T: PartialOrd>(&self, candidates: &CandidateSet, scores: &[T], positive: impl Fn(&T) -> bool) -> Verdict {
		if self.scored_bigrams == 0 {
			return Verdict::PlainAscii;
		}
		match unique_max(scores, positive) {
			Some(index) => Verdict::Detected(candidates.candidate(index).label().to_owned()),
			None => Verdict::NoEvidence,
		}
	}
}

/// Index of the strictly largest positive score, `None` when no score is
/// positive or when the maximum is shared.
fn unique_max<T: PartialOrd>(scores: &[T], positive: impl Fn(&T) -> bool) -> Option<usize> {
	let mut best: Option<usize> = None;
	let mut tied = false;
	for (index, score) in scores.iter().enumerate() {
		if !positive(score) {
			continue;
		}
		match best {
			Some(current) if *score > scores[current] => {
				best = Some(index);
				tied = false;
			}
			Some(current) if *score == scores[current] => tied = true,
			Some(_) => (),
			None => best = Some(index),
		}
	}
	if tied { None } else { best }
}
