//! Page in, posts out.
use rayon::prelude::*;
use std::sync::Arc;

use super::extract::{FragmentReport, extract_with_report};
use super::finalize::finalize;
use super::fragments::locate;
use super::pairing::{PairingPolicy, PositionalPairing};
use super::types::{ExtractionFailure, PostRecord};

/// Extraction settings. Stateless between runs; cheap to clone and share.
#[derive(Clone)]
pub struct Pipeline {
    policy: Arc<dyn PairingPolicy>,
    parallel: bool,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            policy: Arc::new(PositionalPairing),
            parallel: false,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("policy", &self.policy.name())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: Arc<dyn PairingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Extract fragments on the rayon pool. Output order is unaffected.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Extract, dedup, sort and cap the posts in `page`.
    ///
    /// ```
    /// use spool_social::threads::{ExtractionFailure, Pipeline};
    ///
    /// let page = r#"<script type="application/json">{"taken_at":1700000000,"text":"hi"}</script>"#;
    /// let posts = Pipeline::new().run(page, None).unwrap();
    /// assert_eq!(posts[0].text(), "hi");
    ///
    /// assert_eq!(Pipeline::new().run("<html></html>", None), Err(ExtractionFailure::NoPostsFound));
    /// ```
    pub fn run(
        &self,
        page: &str,
        max_posts: Option<usize>,
    ) -> Result<Vec<PostRecord>, ExtractionFailure> {
        let fragments = locate(page);
        let policy = self.policy.as_ref();

        let reports: Vec<FragmentReport> = if self.parallel && fragments.len() > 1 {
            fragments
                .par_iter()
                .map(|f| extract_with_report(f, policy))
                .collect()
        } else {
            fragments
                .iter()
                .map(|f| extract_with_report(f, policy))
                .collect()
        };

        let pairs: usize = reports.iter().map(|r| r.pairs).sum();
        let skipped: usize = reports.iter().map(|r| r.skipped.len()).sum();
        let degraded: usize = reports.iter().map(|r| r.degraded).sum();
        let candidates = reports.into_iter().flat_map(|r| r.records);
        let posts = finalize(candidates, max_posts);

        tracing::info!(
            fragments = fragments.len(),
            pairs,
            skipped,
            degraded,
            kept = posts.len(),
            policy = self.policy.name(),
            "extraction finished"
        );

        if posts.is_empty() {
            return Err(ExtractionFailure::NoPostsFound);
        }
        Ok(posts)
    }
}

/// [`Pipeline::run`] with default settings.
pub fn run(page: &str, max_posts: Option<usize>) -> Result<Vec<PostRecord>, ExtractionFailure> {
    Pipeline::default().run(page, max_posts)
}
