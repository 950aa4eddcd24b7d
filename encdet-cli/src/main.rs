use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;

use encdet_core::{build_candidates, export_tables, Candidate, CandidateSet, Classifier, FileSet, FrequencyMatrix, Quantization, TrainingConfig};

mod sweep;

/// Bigram-based encoding estimation: model sweeps, single-file checks and
/// matrix diagnostics.
#[derive(Parser)]
#[command(name = "encdet", version, about)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Scores every labeled corpus for a range of resolutions and cutoffs
	Sweep(SweepArgs),
	/// Prints the three verdicts of one file
	Classify(ClassifyArgs),
	/// Writes the coefficient table of every candidate as C source
	Export {
		#[command(flatten)]
		model: ModelArgs,

		/// Resolution of the models
		#[arg(long, default_value_t = 8)]
		size: usize,

		/// Output directory of the `<label>.c` files
		#[arg(long, default_value = ".")]
		out: PathBuf,

		/// Writes the full-precision `double` tables instead of the quantized ones
		#[arg(long)]
		exact: bool,
	},
	/// Writes the value distribution of a training matrix as CSV
	Distribution {
		/// Training matrix (flat little-endian u32 counts)
		matrix: PathBuf,
		/// Output CSV file
		output: PathBuf,
	},
}

/// Where the training matrices live and how models are built from them.
#[derive(Args)]
struct ModelArgs {
	/// Directory holding `<label>.vec` training matrices
	#[arg(long, default_value = "./dic")]
	dict: PathBuf,

	/// Mask applied to every matrix before down-scaling
	#[arg(long)]
	mask: Option<PathBuf>,

	/// Candidate labels, in priority order
	#[arg(long, value_delimiter = ',', default_value = "sjis,euc,jis,utf8")]
	labels: Vec<String>,

	/// Quantization strategy: linear, single-log or double-log
	#[arg(long, default_value = "linear")]
	strategy: Quantization,

	/// Maximum number of raw bytes passed to the reference judge
	#[arg(long)]
	prefix_limit: Option<usize>,

	/// Rebuild prepared matrices instead of reading `<label>_<size>.bin`
	#[arg(long)]
	no_cache: bool,
}

impl ModelArgs {
	fn training_config(&self) -> Result<TrainingConfig, Box<dyn std::error::Error>> {
		let mut config = TrainingConfig::new(&self.dict, self.labels.iter().cloned())?;
		config.mask = self.mask.clone();
		config.strategy = self.strategy;
		config.prefix_limit = self.prefix_limit;
		config.use_cache = !self.no_cache;
		Ok(config)
	}
}

#[derive(Args)]
struct SweepArgs {
	#[command(flatten)]
	model: ModelArgs,

	/// Root holding one corpus directory per label (`<corpus>/<label>/...`)
	#[arg(long, default_value = ".")]
	corpus: PathBuf,

	/// Resolutions to test, each dividing 256
	#[arg(long, value_delimiter = ',', default_value = "8")]
	sizes: Vec<usize>,

	/// Cutoffs 1..=max-cutoff are tested
	#[arg(long, default_value_t = 100)]
	max_cutoff: u64,

	/// Directory receiving the exported tables and the estimate CSVs
	#[arg(long, default_value = ".")]
	out: PathBuf,
}

#[derive(Args)]
struct ClassifyArgs {
	#[command(flatten)]
	model: ModelArgs,

	/// File to classify
	file: PathBuf,

	/// Resolution of the models
	#[arg(long, default_value_t = 8)]
	size: usize,

	/// Qualifying bigrams after which reading stops (0 reads everything)
	#[arg(long, default_value_t = 0)]
	cutoff: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	match Cli::parse().command {
		Command::Sweep(args) => {
			let mut config = args.model.training_config()?;
			sweep::run(&mut config, &args.corpus, &args.sizes, args.max_cutoff, &args.out)?;
		}
		Command::Classify(args) => {
			let mut config = args.model.training_config()?;
			config.set_target_size(args.size)?;
			let candidates = build_candidates(&config)?;
			let classifier = Classifier::new(candidates.into(), FileSet::default(), "")
				.with_prefix_limit(config.prefix_limit);
			let verdict = classifier.classify(&args.file, args.cutoff)?;
			println!("file:      {}", args.file.display());
			println!("exact:     {}", verdict.exact);
			println!("quantized: {}", verdict.quantized);
			println!("reference: {:?}", verdict.reference);
			println!("bigrams:   {} scored, {} qualifying", verdict.scored_bigrams, verdict.qualifying_bigrams);
		}
		Command::Export { model, size, out, exact } => {
			let mut config = model.training_config()?;
			config.set_target_size(size)?;
			let mut candidates = build_candidates(&config)?;
			if exact {
				candidates = CandidateSet::new(candidates.iter().map(Candidate::to_exact).collect())?;
			}
			std::fs::create_dir_all(&out)?;
			for path in export_tables(&candidates, &out)? {
				info!("exported {}", path.display());
			}
		}
		Command::Distribution { matrix, output } => {
			let m = FrequencyMatrix::load(&matrix)?;
			m.export_distribution(&output)?;
			info!("wrote distribution of {} ({}x{}) to {}", matrix.display(), m.size(), m.size(), output.display());
		}
	}

	Ok(())
}
