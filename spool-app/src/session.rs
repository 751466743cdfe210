use anyhow::Result;
use spool_social::threads::{ProfileFetcher, ThreadsScraper};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::cli::{self, Prompt};
use crate::display;

pub struct Session<F> {
    scraper: ThreadsScraper<F>,
    json: bool,
}

impl<F: ProfileFetcher> Session<F> {
    pub fn new(scraper: ThreadsScraper<F>, json: bool) -> Self {
        Self { scraper, json }
    }

    /// Fetch one user and render the outcome. Fetch and extraction failures
    /// are rendered as messages, not returned as errors.
    pub async fn render_user(&self, username: &str, max_posts: Option<usize>) -> Result<String> {
        match self.scraper.user_posts(username, max_posts).await {
            Ok(posts) if self.json => Ok(display::render_json(&posts)?),
            Ok(posts) => Ok(display::render_posts(&posts)),
            Err(e) => {
                tracing::info!(username, error = %e, "no posts shown");
                Ok(format!("\n{e}\n"))
            }
        }
    }

    /// Prompt loop: username, then post count, until `exit` or end of input.
    pub async fn interactive<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            output
                .write_all(b"\nUsername to look up (type 'exit' to quit): ")
                .await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let username = match cli::parse_username_line(&line) {
                Prompt::Exit => break,
                Prompt::Blank => continue,
                Prompt::User(name) => name,
            };

            output
                .write_all(b"How many posts? (press Enter for all): ")
                .await?;
            output.flush().await?;
            let max_posts = match lines.next_line().await? {
                Some(line) => cli::parse_post_count(&line),
                None => None,
            };

            let banner = format!("\nFetching posts for @{}...\n", username.trim_start_matches('@'));
            output.write_all(banner.as_bytes()).await?;
            let rendered = self.render_user(&username, max_posts).await?;
            output.write_all(rendered.as_bytes()).await?;
        }
        output.flush().await?;
        Ok(())
    }
}
