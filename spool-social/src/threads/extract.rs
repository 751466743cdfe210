//! Turning a single fragment into post records.
//!
//! A fragment that parses as JSON is walked as a tree; anything else is
//! scanned with patterns for `"taken_at":<digits>` and `"text":"<string>"`.
//! Either way the tokens are paired by a [`PairingPolicy`] and each pair is
//! converted independently, so one bad pair never costs the others.
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

use super::fragments::{Fragment, FragmentKind};
use super::normalize::normalize;
use super::pairing::PairingPolicy;
use super::types::{PartialExtractionError, PostRecord, TextToken, TimestampToken};

const TIMESTAMP_KEY: &str = "taken_at";
const TEXT_KEY: &str = "text";

static TIMESTAMP_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""taken_at"\s*:\s*(\d+)"#).expect("timestamp pattern compiles")
});

static TEXT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"text"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("text pattern compiles")
});

/// What a fragment turned out to be after a parse attempt.
#[derive(Debug)]
pub enum Payload<'a> {
    Structured(Value),
    Opaque(&'a str),
}

impl<'a> Payload<'a> {
    pub fn classify(fragment: &Fragment<'a>) -> Self {
        if fragment.kind == FragmentKind::ScriptJson {
            let trimmed = fragment.text.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(fragment.text) {
                    Ok(value) => return Payload::Structured(value),
                    Err(e) => tracing::debug!(
                        offset = fragment.range.start,
                        error = %e,
                        "fragment is not valid json, falling back to pattern scan"
                    ),
                }
            }
        }
        Payload::Opaque(fragment.text)
    }

    /// Timestamp and text tokens in order of appearance.
    pub fn tokens(&self) -> (Vec<TimestampToken>, Vec<TextToken<'a>>) {
        match self {
            Payload::Structured(value) => {
                let mut collector = TreeTokens::default();
                collector.walk(value);
                (collector.timestamps, collector.texts)
            }
            Payload::Opaque(text) => scan_tokens(*text),
        }
    }
}

fn scan_tokens(text: &str) -> (Vec<TimestampToken>, Vec<TextToken<'_>>) {
    let timestamps = TIMESTAMP_TOKEN
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| TimestampToken {
            raw: m.as_str().to_string(),
            position: m.start(),
        })
        .collect();
    let texts = TEXT_TOKEN
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| TextToken {
            raw: Cow::Borrowed(m.as_str()),
            position: m.start(),
        })
        .collect();
    (timestamps, texts)
}

#[derive(Default)]
struct TreeTokens {
    timestamps: Vec<TimestampToken>,
    texts: Vec<TextToken<'static>>,
    seen: usize,
}

impl TreeTokens {
    fn walk(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if key == TIMESTAMP_KEY {
                        let raw = match child {
                            Value::Number(n) => Some(n.to_string()),
                            Value::String(s) if is_digits(s) => Some(s.clone()),
                            _ => None,
                        };
                        if let Some(raw) = raw {
                            let position = self.next();
                            self.timestamps.push(TimestampToken { raw, position });
                            continue;
                        }
                    } else if key == TEXT_KEY {
                        if let Value::String(s) = child {
                            let position = self.next();
                            self.texts.push(TextToken {
                                raw: Cow::Owned(s.clone()),
                                position,
                            });
                            continue;
                        }
                    }
                    self.walk(child);
                }
            }
            Value::Array(items) => items.iter().for_each(|item| self.walk(item)),
            _ => {}
        }
    }

    fn next(&mut self) -> usize {
        self.seen += 1;
        self.seen - 1
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Records built from one fragment plus what was dropped on the way.
#[derive(Debug, Default)]
pub struct FragmentReport {
    pub records: Vec<PostRecord>,
    pub pairs: usize,
    pub skipped: Vec<PartialExtractionError>,
    /// Records whose text only partially decoded.
    pub degraded: usize,
}

/// Records from a fragment; see [`extract_with_report`].
pub fn extract(fragment: &Fragment<'_>, policy: &dyn PairingPolicy) -> Vec<PostRecord> {
    extract_with_report(fragment, policy).records
}

pub fn extract_with_report(fragment: &Fragment<'_>, policy: &dyn PairingPolicy) -> FragmentReport {
    let payload = Payload::classify(fragment);
    let (timestamps, texts) = payload.tokens();
    let pairs = policy.pair(timestamps, texts);

    let mut report = FragmentReport {
        pairs: pairs.len(),
        ..FragmentReport::default()
    };

    for (ts, text) in pairs {
        match build_record(&ts, &text, &mut report.degraded) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                tracing::debug!(
                    fragment_offset = fragment.range.start,
                    timestamp_position = ts.position,
                    text_position = text.position,
                    error = %e,
                    "skipping pair"
                );
                report.skipped.push(e);
            }
        }
    }

    report
}

fn build_record(
    ts: &TimestampToken,
    text: &TextToken<'_>,
    degraded: &mut usize,
) -> Result<PostRecord, PartialExtractionError> {
    let secs: u64 = ts
        .raw
        .parse()
        .map_err(|_| PartialExtractionError::BadTimestamp { raw: ts.raw.clone() })?;

    let normalized = normalize(&text.raw);
    if normalized.is_degraded() {
        *degraded += 1;
        tracing::debug!(
            position = text.position,
            steps = ?normalized.degraded(),
            "text decoded with fallbacks"
        );
    }
    if normalized.text.is_empty() {
        return Err(PartialExtractionError::EmptyText {
            position: text.position,
        });
    }

    PostRecord::new(secs, normalized.text)
        .ok_or(PartialExtractionError::TimestampOutOfRange { secs })
}
