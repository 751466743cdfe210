use super::client::{FetchError, ProfileFetcher};
use super::pipeline::Pipeline;
use super::types::{ExtractionFailure, PostRecord};

/// Either half of a scrape can fail; each has its own user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
}

/// Fetch a profile and run the extraction pipeline over it.
pub struct ThreadsScraper<F> {
    fetcher: F,
    pipeline: Pipeline,
    default_max_posts: Option<usize>,
}

impl<F: ProfileFetcher> ThreadsScraper<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            pipeline: Pipeline::default(),
            default_max_posts: None,
        }
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Limit used when [`Self::user_posts`] is called without one.
    pub fn with_default_max_posts(mut self, max_posts: Option<usize>) -> Self {
        self.default_max_posts = max_posts;
        self
    }

    pub async fn user_posts(
        &self,
        username: &str,
        max_posts: Option<usize>,
    ) -> Result<Vec<PostRecord>, ScrapeError> {
        let page = self.fetcher.fetch_profile(username).await?;
        let limit = max_posts.or(self.default_max_posts);
        let posts = self.pipeline.run(&page, limit)?;
        tracing::info!(username, posts = posts.len(), "profile scraped");
        Ok(posts)
    }
}
