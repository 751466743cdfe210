use clap::Parser;
use std::path::PathBuf;

/// Pull recent posts from a public Threads profile.
#[derive(Debug, Parser)]
#[command(name = "spool", version)]
pub struct Args {
    /// Config file; skipped when it does not exist.
    #[arg(long, short, env = "SPOOL_CONFIG", default_value = "spool.yaml")]
    pub config: PathBuf,

    /// Fetch this user once and exit instead of prompting.
    #[arg(long, short)]
    pub user: Option<String>,

    /// Maximum number of posts to show; also the answer to a blank post-count prompt.
    #[arg(long, short = 'n')]
    pub max_posts: Option<usize>,

    /// Print posts as JSON.
    #[arg(long)]
    pub json: bool,

    /// Mirror logs to stderr.
    #[arg(long, short)]
    pub verbose: bool,
}

pub const EXIT_COMMAND: &str = "exit";

/// What a line typed at the username prompt asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Prompt {
    Exit,
    Blank,
    User(String),
}

pub fn parse_username_line(line: &str) -> Prompt {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Prompt::Blank
    } else if trimmed.eq_ignore_ascii_case(EXIT_COMMAND) {
        Prompt::Exit
    } else {
        Prompt::User(trimmed.to_string())
    }
}

/// Digits set a limit; anything else (including a blank line) means all posts.
pub fn parse_post_count(line: &str) -> Option<usize> {
    let trimmed = line.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
