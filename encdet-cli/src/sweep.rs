use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use encdet_core::{build_candidates, export_tables, Classifier, FileSet, TestReport, TrainingConfig};

/// Match counts of one sweep resolution, one column per cutoff.
///
/// Rows keep the order of the estimate CSV: exact-judge scores per label,
/// `total`, then the quantized (`_DBL`) and reference (`_EXT`) scores per
/// label, `total_DBL` and `total_EXT`.
struct SweepTable {
	rows: Vec<(String, Vec<(u64, u64)>)>,
}

impl SweepTable {
	fn new(labels: &[String]) -> Self {
		let mut names: Vec<String> = labels.to_vec();
		names.push("total".to_owned());
		for label in labels {
			names.push(format!("{label}_DBL"));
			names.push(format!("{label}_EXT"));
		}
		names.push("total_DBL".to_owned());
		names.push("total_EXT".to_owned());

		Self { rows: names.into_iter().map(|name| (name, Vec::new())).collect() }
	}

	fn push(&mut self, row: &str, matches: u64, total: u64) {
		if let Some((_, cells)) = self.rows.iter_mut().find(|(name, _)| name == row) {
			cells.push((matches, total));
		}
	}

	fn write<W: Write>(&self, mut out: W, cutoffs: u64) -> io::Result<()> {
		write!(out, ",")?;
		for cutoff in 1..=cutoffs {
			write!(out, "{cutoff},")?;
		}
		writeln!(out)?;

		for (name, cells) in &self.rows {
			write!(out, "{name},")?;
			for (matches, total) in cells {
				write!(out, "={matches}/{total},")?;
			}
			writeln!(out)?;
		}
		out.flush()
	}
}

#[derive(Default)]
struct Totals {
	exact: (u64, u64),
	quantized: (u64, u64),
	reference: (u64, u64),
}

impl Totals {
	fn add(&mut self, report: &TestReport) {
		self.exact.0 += report.exact_matches;
		self.exact.1 += report.total;
		self.quantized.0 += report.quantized_matches;
		self.quantized.1 += report.total;
		// Corpora the reference detector never recognizes are left out of its total.
		if report.reference_matches > 0 {
			self.reference.0 += report.reference_matches;
			self.reference.1 += report.total;
		}
	}
}

fn ratio(matches: u64, total: u64) -> f64 {
	if total == 0 { 0.0 } else { matches as f64 / total as f64 }
}

/// Runs the full estimation sweep.
///
/// For every size: builds the candidates, exports their tables to `out`, then
/// tests each `<corpus>/<label>` directory for cutoffs `1..=max_cutoff` and
/// writes `out/estimate_<size>.csv`.
pub fn run(
	config: &mut TrainingConfig,
	corpus: &Path,
	sizes: &[usize],
	max_cutoff: u64,
	out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
	std::fs::create_dir_all(out)?;
	let labels = config.labels().to_vec();

	for &size in sizes {
		info!("doing test size:{size}");
		config.set_target_size(size)?;
		let candidates = Arc::new(build_candidates(config)?);
		for path in export_tables(&candidates, out)? {
			info!("exported {}", path.display());
		}

		let classifiers: Vec<Classifier> = labels
			.iter()
			.map(|label| {
				let files = FileSet::collect(corpus.join(label));
				if files.is_empty() {
					warn!("no test files for {label} under {}", corpus.display());
				}
				Classifier::new(Arc::clone(&candidates), files, label.as_str()).with_prefix_limit(config.prefix_limit)
			})
			.collect();

		let mut table = SweepTable::new(&labels);
		for cutoff in 1..=max_cutoff {
			info!("doing test stage:{size}-{cutoff}");
			let mut totals = Totals::default();

			for classifier in &classifiers {
				let label = classifier.label();
				let report = classifier.test(cutoff);
				for failure in &report.failures {
					warn!("{label}: cannot read {}: {}", failure.path.display(), failure.message);
				}

				info!(
					"stage:{size}-{cutoff} enc:{label}\tscore:{}/{}={:.4} dbl:{}/{}={:.4} ext:{}/{}={:.4}",
					report.exact_matches,
					report.total,
					ratio(report.exact_matches, report.total),
					report.quantized_matches,
					report.total,
					ratio(report.quantized_matches, report.total),
					report.reference_matches,
					report.total,
					ratio(report.reference_matches, report.total),
				);

				table.push(label, report.exact_matches, report.total);
				table.push(&format!("{label}_DBL"), report.quantized_matches, report.total);
				table.push(&format!("{label}_EXT"), report.reference_matches, report.total);
				totals.add(&report);
			}

			let (exact, quantized, reference) = (totals.exact, totals.quantized, totals.reference);
			info!("stage:{size}-{cutoff} enc:total\tscore:{}/{}={:.4}", exact.0, exact.1, ratio(exact.0, exact.1));
			info!("stage:{size}-{cutoff} enc:total_DBL\tscore:{}/{}={:.4}", quantized.0, quantized.1, ratio(quantized.0, quantized.1));
			info!("stage:{size}-{cutoff} enc:total_EXT\tscore:{}/{}={:.4}", reference.0, reference.1, ratio(reference.0, reference.1));
			table.push("total", exact.0, exact.1);
			table.push("total_DBL", quantized.0, quantized.1);
			table.push("total_EXT", reference.0, reference.1);
		}

		let path = out.join(format!("estimate_{size}.csv"));
		table.write(BufWriter::new(File::create(&path)?), max_cutoff)?;
		info!("wrote {}", path.display());
	}

	Ok(())
}
