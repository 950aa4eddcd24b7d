use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use encdet_core::{
	Candidate, CandidateSet, Classifier, FileSet, FrequencyMatrix, Quantization, ReferenceGuess, ReferenceJudge,
	Verdict,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct FixedJudge(ReferenceGuess);

impl ReferenceJudge for FixedJudge {
	fn judge(&self, _data: &[u8]) -> ReferenceGuess {
		self.0
	}
}

fn matrix(size: usize, cells: &[u64]) -> Arc<FrequencyMatrix> {
	Arc::new(FrequencyMatrix::from_cells(size, cells.to_vec()).unwrap())
}

fn two_candidates() -> Arc<CandidateSet> {
	Arc::new(
		CandidateSet::new(vec![
			Candidate::quantized("sjis", matrix(2, &[10, 0, 0, 5]), Quantization::Linear),
			Candidate::quantized("utf8", matrix(2, &[0, 8, 3, 0]), Quantization::Linear),
		])
		.unwrap(),
	)
}

fn classifier(files: FileSet, label: &str) -> Classifier {
	Classifier::new(two_candidates(), files, label).with_judge(Box::new(FixedJudge(ReferenceGuess::Sjis)))
}

#[test]
fn repeated_low_bigram_selects_sjis() {
	let classifier = classifier(FileSet::default(), "sjis");
	let input = [0x01u8; 6];
	let verdict = classifier.classify_reader(&input[..], 100).unwrap();
	assert_eq!(verdict.qualifying_bigrams, 5);
	assert_eq!(verdict.exact, Verdict::Detected("sjis".into()));
	assert_eq!(verdict.quantized, Verdict::Detected("sjis".into()));
}

#[test]
fn high_low_bigram_selects_utf8() {
	let classifier = classifier(FileSet::default(), "utf8");
	// 0x01 -> 0x80 lands on stored cell (0, 1), only utf8 counts it
	let input = [0x01u8, 0x80, 0x01, 0x80];
	let verdict = classifier.classify_reader(&input[..], 0).unwrap();
	assert_eq!(verdict.exact, Verdict::Detected("utf8".into()));
	assert_eq!(verdict.quantized, Verdict::Detected("utf8".into()));
}

#[test]
fn all_ascii_input_is_inconclusive() {
	let classifier = classifier(FileSet::default(), "sjis");
	let input = b"Plain text only.\tTabs,\r\nnew lines\x0cand form feeds ~!";
	let verdict = classifier.classify_reader(&input[..], 0).unwrap();
	assert_eq!(verdict.scored_bigrams, 0);
	assert_eq!(verdict.exact, Verdict::PlainAscii);
	assert_eq!(verdict.quantized, Verdict::PlainAscii);
	assert!(!verdict.exact.is_conclusive());
}

#[test]
fn identical_candidates_never_win() {
	let cells = [7, 3, 1, 9];
	let set = CandidateSet::new(vec![
		Candidate::quantized("euc", matrix(2, &cells), Quantization::Linear),
		Candidate::quantized("jis", matrix(2, &cells), Quantization::Linear),
	])
	.unwrap();
	let classifier = Classifier::new(Arc::new(set), FileSet::default(), "euc");
	let input = [0x90u8, 0x10, 0xe0, 0x85, 0x02];
	let verdict = classifier.classify_reader(&input[..], 0).unwrap();
	assert!(verdict.qualifying_bigrams > 0);
	assert_eq!(verdict.exact, Verdict::NoEvidence);
	assert_eq!(verdict.quantized, Verdict::NoEvidence);
}

#[test]
fn cutoff_ignores_leading_ascii() {
	let classifier = classifier(FileSet::default(), "sjis");
	let mut input = b"a long run of ascii text ".repeat(20);
	input.extend_from_slice(&[0x01, 0x01, 0x80, 0x01]);
	let verdict = classifier.classify_reader(input.as_slice(), 1).unwrap();
	assert_eq!(verdict.qualifying_bigrams, 1);
	assert_eq!(verdict.bytes_read, input.len() as u64 - 3);
}

#[test]
fn corpus_test_counts_matches_and_failures() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("a.txt"), [0x01u8; 10]).unwrap();
	fs::write(dir.path().join("b.txt"), [0x01u8, 0x80, 0x01, 0x80]).unwrap();
	fs::write(dir.path().join("c.txt"), b"ascii only").unwrap();
	let mut paths: Vec<PathBuf> = FileSet::collect(dir.path()).iter().map(PathBuf::from).collect();
	paths.push(dir.path().join("missing.txt"));

	let report = classifier(FileSet::from_paths(paths), "sjis").test(50);
	assert_eq!(report.total, 4);
	assert_eq!(report.exact_matches, 1);
	assert_eq!(report.quantized_matches, 1);
	assert_eq!(report.reference_matches, 3);
	assert_eq!(report.failed(), 1);
	assert_eq!(report.failures[0].path, dir.path().join("missing.txt"));
}

#[test]
fn verdicts_are_deterministic_and_parallel_totals_match() {
	let dir = tempfile::tempdir().unwrap();
	let mut rng = StdRng::seed_from_u64(0x5eed);
	for index in 0..40 {
		let len = rng.random_range(2..400);
		let bytes: Vec<u8> = (0..len).map(|_| rng.random::<u8>()).collect();
		fs::write(dir.path().join(format!("{index:02}.bin")), bytes).unwrap();
	}
	let files = FileSet::collect(dir.path());
	assert_eq!(files.len(), 40);
	let classifier = classifier(files.clone(), "utf8");

	let mut expected_exact = 0;
	let mut expected_quantized = 0;
	for path in files.iter() {
		let first = classifier.classify(path, 30).unwrap();
		let second = classifier.classify(path, 30).unwrap();
		assert_eq!(first, second);
		expected_exact += u64::from(first.exact.matches("utf8"));
		expected_quantized += u64::from(first.quantized.matches("utf8"));
	}

	let report = classifier.test(30);
	assert_eq!(report.total, 40);
	assert_eq!(report.failed(), 0);
	assert_eq!(report.exact_matches, expected_exact);
	assert_eq!(report.quantized_matches, expected_quantized);
	assert_eq!(report.reference_matches, 0);
}
