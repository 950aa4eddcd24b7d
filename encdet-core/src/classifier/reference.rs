use chardetng::EncodingDetector;
use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8};

const ESC: u8 = 0x1b;

/// Guess returned by a reference encoding detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceGuess {
	Ascii,
	Jis,
	Euc,
	Sjis,
	Utf16,
	Utf8,
	Unknown,
}

impl ReferenceGuess {
	/// Candidate label corresponding to the guess, if the guess names one.
	pub fn label(self) -> Option<&'static str> {
		match self {
			ReferenceGuess::Jis => Some("jis"),
			ReferenceGuess::Euc => Some("euc"),
			ReferenceGuess::Sjis => Some("sjis"),
			ReferenceGuess::Utf8 => Some("utf8"),
			ReferenceGuess::Ascii | ReferenceGuess::Utf16 | ReferenceGuess::Unknown => None,
		}
	}

	fn from_encoding(encoding: &'static Encoding) -> Self {
		if encoding == SHIFT_JIS {
			ReferenceGuess::Sjis
		} else if encoding == EUC_JP {
			ReferenceGuess::Euc
		} else if encoding == ISO_2022_JP {
			ReferenceGuess::Jis
		} else if encoding == UTF_8 {
			ReferenceGuess::Utf8
		} else if encoding == UTF_16LE || encoding == UTF_16BE {
			ReferenceGuess::Utf16
		} else {
			ReferenceGuess::Unknown
		}
	}
}

/// Third-party detector consulted for comparison.
///
/// Receives the raw prefix captured while classifying a file.
pub trait ReferenceJudge: Send + Sync {
	fn judge(&self, data: &[u8]) -> ReferenceGuess;
}

/// Reference judge backed by `chardetng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChardetngJudge;

impl ReferenceJudge for ChardetngJudge {
	fn judge(&self, data: &[u8]) -> ReferenceGuess {
		if let Some((encoding, _)) = Encoding::for_bom(data) {
			return ReferenceGuess::from_encoding(encoding);
		}
		if data.is_empty() {
			return ReferenceGuess::Unknown;
		}
		if data.is_ascii() && !data.contains(&ESC) {
			return ReferenceGuess::Ascii;
		}

		let mut detector = EncodingDetector::new();
		detector.feed(data, true);
		ReferenceGuess::from_encoding(detector.guess(None, true))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_labels() {
		assert_eq!(ReferenceGuess::Sjis.label(), Some("sjis"));
		assert_eq!(ReferenceGuess::Jis.label(), Some("jis"));
		assert_eq!(ReferenceGuess::Ascii.label(), None);
		assert_eq!(ReferenceGuess::Unknown.label(), None);
	}

	#[test]
	fn detects_plain_ascii_and_boms() {
		let judge = ChardetngJudge;
		assert_eq!(judge.judge(b"hello world\n"), ReferenceGuess::Ascii);
		assert_eq!(judge.judge(b""), ReferenceGuess::Unknown);
		assert_eq!(judge.judge(&[0xef, 0xbb, 0xbf, b'a']), ReferenceGuess::Utf8);
		assert_eq!(judge.judge(&[0xff, 0xfe, b'a', 0]), ReferenceGuess::Utf16);
	}

	#[test]
	fn detects_utf8_japanese() {
		let text = "日本語のテキストです。文字コードを判定します。".repeat(4);
		assert_eq!(ChardetngJudge.judge(text.as_bytes()), ReferenceGuess::Utf8);
	}
}
