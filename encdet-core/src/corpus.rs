use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

/// List of corpus files, collected by a depth-first walk.
///
/// Symbolic links are not followed; entries that cannot be read are logged
/// and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
	files: Vec<PathBuf>,
}

impl FileSet {
	/// Collects every regular file below `root`.
	///
	/// A root that is itself a file yields that file; a missing root yields an
	/// empty set. Entries are visited in file-name order, so the result is
	/// stable across runs.
	pub fn collect<P: AsRef<Path>>(root: P) -> Self {
		let mut files = Vec::new();
		for entry in WalkDir::new(root).sort_by_file_name() {
			match entry {
				Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
				Ok(_) => (),
				Err(e) => warn!("skipping unreadable corpus entry: {e}"),
			}
		}
		Self { files }
	}

	/// Wraps an explicit list of files.
	pub fn from_paths<I, P>(paths: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		Self { files: paths.into_iter().map(Into::into).collect() }
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Path> {
		self.files.iter().map(PathBuf::as_path)
	}
}
