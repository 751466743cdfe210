use std::collections::HashSet;

use super::types::PostRecord;

/// Dedup, order newest-first, and cap.
///
/// The first record for each [`PostRecord::dedup_key`] wins. Sorting is
/// stable, so records sharing a timestamp keep their extraction order. A
/// `max_posts` of `Some(0)` means no cap.
pub fn finalize<I>(records: I, max_posts: Option<usize>) -> Vec<PostRecord>
where
    I: IntoIterator<Item = PostRecord>,
{
    let mut seen = HashSet::new();
    let mut unique: Vec<PostRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.dedup_key()))
        .collect();

    unique.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));

    if let Some(limit) = max_posts.filter(|n| *n > 0) {
        unique.truncate(limit);
    }
    unique
}
