use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Display format for post timestamps, rendered in local time.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 9999-12-31T00:00:00Z. Later epochs could render with a five-digit year in
/// some timezones.
pub const MAX_EPOCH_SECS: u64 = 253_402_214_400;

/// One extracted post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    timestamp: DateTime<Utc>,
    text: String,
}

impl PostRecord {
    /// Build a record from an epoch value and already-normalized text.
    ///
    /// Returns `None` when the text is blank or the epoch is past
    /// [`MAX_EPOCH_SECS`].
    pub fn new(epoch_secs: u64, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        if epoch_secs > MAX_EPOCH_SECS {
            return None;
        }
        let secs = i64::try_from(epoch_secs).ok()?;
        let timestamp = DateTime::from_timestamp(secs, 0)?;
        Some(Self { timestamp, text })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn epoch_secs(&self) -> i64 {
        self.timestamp.timestamp()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// `YYYY-MM-DD HH:MM:SS` in the local timezone.
    pub fn formatted_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format(TIME_FORMAT)
            .to_string()
    }

    /// Identity used to collapse duplicates: formatted time plus text.
    pub fn dedup_key(&self) -> String {
        format!("{}-{}", self.formatted_time(), self.text)
    }

    pub fn to_view(&self) -> PostView {
        PostView {
            time: self.formatted_time(),
            text: self.text.clone(),
        }
    }
}

/// Caller-facing rendering of a [`PostRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub time: String,
    pub text: String,
}

/// A `taken_at` value as found in the page, not yet converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampToken {
    pub raw: String,
    /// Byte offset in the fragment, or document-order index for parsed JSON.
    pub position: usize,
}

/// A `text` value with its JSON string delimiters stripped, still escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToken<'a> {
    pub raw: Cow<'a, str>,
    pub position: usize,
}

/// The pipeline ran but nothing usable came out of the page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionFailure {
    #[error("no posts found, or the account is private")]
    NoPostsFound,
}

/// A single pair that was dropped during extraction. Never surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartialExtractionError {
    #[error("timestamp `{raw}` is not a non-negative integer")]
    BadTimestamp { raw: String },
    #[error("timestamp {secs} is outside the representable range")]
    TimestampOutOfRange { secs: u64 },
    #[error("text at position {position} is empty after normalization")]
    EmptyText { position: usize },
}
