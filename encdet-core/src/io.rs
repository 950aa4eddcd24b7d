use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::env;

/// Decodes a flat little-endian `u32` sequence into 64-bit counts.
///
/// Trailing bytes that do not form a full word are ignored; callers validate
/// the length beforehand.
pub(crate) fn decode_u32_le(bytes: &[u8]) -> Vec<u64> {
	bytes
		.chunks_exact(4)
		.map(|word| u64::from(u32::from_le_bytes([word[0], word[1], word[2], word[3]])))
		.collect()
}

/// Builds the cache path of a prepared matrix.
///
/// Examples:
/// - `dic` + `"sjis"` + `Some(8)` → `dic/sjis_8.bin`
/// - `dic` + `"sjis"` + `None` → `dic/sjis.bin`
pub(crate) fn build_cache_path<P: AsRef<Path>>(dictionary: P, label: &str, size: Option<usize>) -> PathBuf {
	let mut output = PathBuf::from(dictionary.as_ref());
	match size {
		Some(size) => output.push(format!("{label}_{size}")),
		None => output.push(label),
	}
	output.set_extension("bin");
	output
}

/// Builds the path of a training matrix (`<dictionary>/<label>.vec`).
pub(crate) fn build_matrix_path<P: AsRef<Path>>(dictionary: P, label: &str) -> PathBuf {
	let mut output = PathBuf::from(dictionary.as_ref());
	output.push(label);
	output.set_extension("vec");
	output
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder(input: &Path) -> PathBuf {
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Creates (or truncates) a file and wraps it in a buffered writer.
pub(crate) fn create_buffered<P: AsRef<Path>>(path: P) -> io::Result<BufWriter<File>> {
	Ok(BufWriter::new(File::create(path)?))
}
