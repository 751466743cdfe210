//! Strategies for matching timestamp tokens with text tokens.
//!
//! Tokens are scraped independently, so something has to decide which
//! `taken_at` belongs to which `text`. The only strategy today is
//! [`PositionalPairing`]: the Nth timestamp goes with the Nth text. That
//! holds while the page lists both fields once per post in the same order;
//! when it doesn't, posts get the wrong time rather than an error.
use super::types::{TextToken, TimestampToken};

pub trait PairingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn pair<'a>(
        &self,
        timestamps: Vec<TimestampToken>,
        texts: Vec<TextToken<'a>>,
    ) -> Vec<(TimestampToken, TextToken<'a>)>;
}

/// Zip tokens in order of appearance; trailing tokens of the longer list are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalPairing;

impl PairingPolicy for PositionalPairing {
    fn name(&self) -> &'static str {
        "positional"
    }

    fn pair<'a>(
        &self,
        timestamps: Vec<TimestampToken>,
        texts: Vec<TextToken<'a>>,
    ) -> Vec<(TimestampToken, TextToken<'a>)> {
        if timestamps.len() != texts.len() {
            tracing::debug!(
                timestamps = timestamps.len(),
                texts = texts.len(),
                dropped = timestamps.len().abs_diff(texts.len()),
                "token counts differ, dropping unmatched trailing tokens"
            );
        }
        timestamps.into_iter().zip(texts).collect()
    }
}
