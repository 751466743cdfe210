use anyhow::{Context, Result};
use clap::Parser;
use spool_common::observability::init_logging;
use spool_config::{SpoolConfig, SpoolConfigLoader};
use spool_social::threads::{FetchConfig, Pipeline, ThreadsClient, ThreadsScraper};
use tokio::io::{AsyncWriteExt, BufReader};

mod cli;
mod display;
mod session;

use cli::Args;
use session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // File is optional; env overrides win.
    let cfg: SpoolConfig = SpoolConfigLoader::new()
        .with_optional_file(&args.config)
        .load()
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    let mut log_config = cfg.logging.to_log_config();
    log_config.emit_stderr |= args.verbose;
    let log_path = init_logging(log_config)?;
    tracing::debug!(
        log_path = %log_path.display(),
        base_url = %cfg.fetch.base_url,
        parallel = cfg.extract.parallel,
        "starting spool"
    );

    let client = ThreadsClient::new(&FetchConfig::from(cfg.fetch.clone()))
        .context("failed to build http client")?;
    let pipeline = Pipeline::new().with_parallel(cfg.extract.parallel);
    let scraper = ThreadsScraper::new(client)
        .with_pipeline(pipeline)
        .with_default_max_posts(args.max_posts.or(cfg.extract.max_posts));
    let session = Session::new(scraper, args.json);

    match args.user {
        Some(user) => {
            let rendered = session.render_user(&user, None).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            session.interactive(stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}
