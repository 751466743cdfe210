//! Decoding of escaped post text into display text.
//!
//! Text tokens come out of the page with up to four layers of encoding on
//! top of each other. [`normalize`] peels them in a fixed order:
//!
//! 1. literal backslash sequences left by nested JSON encoding
//!    (`\/`, `\n`, `\r`, `\t`, `\"`),
//! 2. `\uXXXX` escapes (and `\\`),
//! 3. UTF-16 surrogate pairs produced by step 2,
//! 4. `%XX` percent-encoding,
//! 5. surrounding whitespace.
//!
//! A step that cannot decode its input hands that input to the next step
//! unchanged and is listed in [`Normalized::degraded`]. Normalization itself
//! never fails.

use std::borrow::Cow;

/// Decoding steps that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStep {
    UnicodeEscapes,
    Surrogates,
    PercentDecoding,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("truncated \\u escape at byte {offset}")]
    TruncatedUnicodeEscape { offset: usize },
    #[error("{count} unpaired UTF-16 surrogate(s)")]
    UnpairedSurrogates { count: usize },
    #[error("percent-decoded bytes are not valid UTF-8")]
    InvalidPercentEncoding,
}

impl NormalizeError {
    pub fn step(&self) -> NormalizeStep {
        match self {
            NormalizeError::TruncatedUnicodeEscape { .. } => NormalizeStep::UnicodeEscapes,
            NormalizeError::UnpairedSurrogates { .. } => NormalizeStep::Surrogates,
            NormalizeError::InvalidPercentEncoding => NormalizeStep::PercentDecoding,
        }
    }
}

/// Result of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// Steps that failed, in pipeline order.
    pub errors: Vec<NormalizeError>,
}

impl Normalized {
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn degraded(&self) -> Vec<NormalizeStep> {
        self.errors.iter().map(NormalizeError::step).collect()
    }
}

/// Decode a raw text token. See the module docs for the step order.
pub fn normalize(raw: &str) -> Normalized {
    let mut errors = Vec::new();

    let unescaped = unescape_literals(raw);

    let units = match decode_unicode_escapes(&unescaped) {
        Ok(units) => units,
        Err(e) => {
            errors.push(e);
            unescaped.chars().map(Unit::Char).collect()
        }
    };

    let (joined, unpaired) = reassemble_surrogates(&units);
    if unpaired > 0 {
        errors.push(NormalizeError::UnpairedSurrogates { count: unpaired });
    }

    let decoded = match percent_decode(&joined) {
        Ok(text) => text,
        Err(e) => {
            errors.push(e);
            Cow::Borrowed(joined.as_str())
        }
    };

    Normalized {
        text: decoded.trim().to_string(),
        errors,
    }
}

/// [`normalize`] without the diagnostics.
pub fn normalize_text(raw: &str) -> String {
    normalize(raw).text
}

fn unescape_literals(raw: &str) -> String {
    raw.replace("\\/", "/")
        .replace("\\n", "\n")
        .replace("\\r", "")
        .replace("\\t", "\t")
        .replace("\\\"", "\"")
}

/// Either a literal character or a UTF-16 code unit from a `\uXXXX` escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Char(char),
    Code(u16),
}

fn decode_unicode_escapes(s: &str) -> Result<Vec<Unit>, NormalizeError> {
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch != '\\' {
            out.push(Unit::Char(ch));
            continue;
        }
        match chars.peek().map(|&(_, c)| c) {
            Some('u') => {
                chars.next();
                let hex: String = (0..4)
                    .filter_map(|_| chars.next_if(|(_, c)| c.is_ascii_hexdigit()))
                    .map(|(_, c)| c)
                    .collect();
                if hex.len() != 4 {
                    return Err(NormalizeError::TruncatedUnicodeEscape { offset });
                }
                let code = u16::from_str_radix(&hex, 16)
                    .map_err(|_| NormalizeError::TruncatedUnicodeEscape { offset })?;
                out.push(Unit::Code(code));
            }
            Some('\\') => {
                chars.next();
                out.push(Unit::Char('\\'));
            }
            _ => out.push(Unit::Char('\\')),
        }
    }
    Ok(out)
}

/// Join runs of code units into characters. Returns the text and the number
/// of unpaired surrogates that were replaced with U+FFFD.
fn reassemble_surrogates(units: &[Unit]) -> (String, usize) {
    let mut out = String::with_capacity(units.len());
    let mut unpaired = 0;
    let mut run: Vec<u16> = Vec::new();

    let mut flush = |run: &mut Vec<u16>, out: &mut String| {
        for decoded in char::decode_utf16(run.drain(..)) {
            match decoded {
                Ok(c) => out.push(c),
                Err(_) => {
                    unpaired += 1;
                    out.push(char::REPLACEMENT_CHARACTER);
                }
            }
        }
    };

    for unit in units {
        match unit {
            Unit::Code(code) => run.push(*code),
            Unit::Char(c) => {
                flush(&mut run, &mut out);
                out.push(*c);
            }
        }
    }
    flush(&mut run, &mut out);

    (out, unpaired)
}

fn percent_decode(s: &str) -> Result<Cow<'_, str>, NormalizeError> {
    if !s.contains('%') {
        return Ok(Cow::Borrowed(s));
    }
    urlencoding::decode(s).map_err(|_| NormalizeError::InvalidPercentEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_output() {
        let n = normalize("");
        assert_eq!(n.text, "");
        assert!(!n.is_degraded());
    }

    #[test]
    fn literal_escapes_are_unwrapped() {
        assert_eq!(normalize_text(r"Hello\/World"), "Hello/World");
        assert_eq!(normalize_text(r"line one\nline two"), "line one\nline two");
        assert_eq!(normalize_text(r"a\r\nb"), "a\nb");
        assert_eq!(normalize_text(r"col\tcol"), "col\tcol");
        assert_eq!(normalize_text(r#"she said \"hi\""#), "she said \"hi\"");
    }

    #[test]
    fn unicode_escapes_decode() {
        assert_eq!(normalize_text(r"caf\u00e9"), "café");
        assert_eq!(normalize_text(r"\u4f60\u597d"), "你好");
    }

    #[test]
    fn surrogate_pairs_become_one_character() {
        let n = normalize(r"party \ud83c\udf89 time");
        assert_eq!(n.text, "party 🎉 time");
        assert_eq!(n.text.chars().filter(|c| *c == '🎉').count(), 1);
        assert!(!n.is_degraded());
    }

    #[test]
    fn unpaired_surrogate_is_replaced_and_reported() {
        let n = normalize(r"broken \ud83c here");
        assert_eq!(n.text, "broken \u{FFFD} here");
        assert_eq!(n.degraded(), vec![NormalizeStep::Surrogates]);
    }

    #[test]
    fn truncated_escape_degrades_only_that_step() {
        let n = normalize(r"bad \u12 but 100%25 sure");
        assert_eq!(n.degraded(), vec![NormalizeStep::UnicodeEscapes]);
        // step 2 fell back, step 4 still ran
        assert_eq!(n.text, r"bad \u12 but 100% sure");
    }

    #[test]
    fn percent_sequences_decode() {
        assert_eq!(normalize_text("hello%20world"), "hello world");
        assert_eq!(normalize_text("50% off"), "50% off");
    }

    #[test]
    fn invalid_utf8_after_percent_decoding_falls_back() {
        let n = normalize("raw %FF byte");
        assert_eq!(n.text, "raw %FF byte");
        assert_eq!(n.degraded(), vec![NormalizeStep::PercentDecoding]);
    }

    #[test]
    fn escaped_backslash_is_collapsed() {
        assert_eq!(normalize_text(r"C:\\Users"), r"C:\Users");
        assert_eq!(normalize_text(r"\\u0041"), r"\u0041");
    }

    #[test]
    fn unknown_escapes_are_kept() {
        assert_eq!(normalize_text(r"a\qb"), r"a\qb");
        assert_eq!(normalize_text(r"trailing\"), r"trailing\");
    }

    #[test]
    fn clean_text_is_idempotent() {
        for text in ["plain words", "  padded  ", "emoji 🎉 and 你好", "tabs\tand\nnewlines"] {
            let once = normalize_text(text);
            assert_eq!(normalize_text(&once), once);
        }
    }

    #[test]
    fn printable_ascii_round_trips_to_trimmed_input() {
        let text = "  Just a (normal) post: 1 + 2 = 3!  ";
        assert_eq!(normalize_text(text), text.trim());
    }
}
