use anyhow::{Context, Result};
use clap::Parser;
use log_follower::{Config, Consumer, DateTimeLayout, SeekPosition, checkpoint};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CHECKPOINT_EVERY: u64 = 1000;

/// Print the lines of a rotated log as they are written
#[derive(Parser, Debug)]
#[command(name = "log-follower", version, about)]
struct Args {
    /// Directory holding the rotated files
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dir: PathBuf,

    /// strftime pattern of the file names, e.g. %Y%m%d%H.log
    #[arg(short = 'p', long = "pattern")]
    pattern: String,

    /// File to start from instead of the current schedule slot
    #[arg(long = "resume", value_name = "FILE")]
    resume: Option<PathBuf>,

    /// Byte offset into the --resume file
    #[arg(long = "offset", default_value_t = 0, requires = "resume")]
    offset: u64,

    /// Load the start position from and save progress to this file
    #[arg(long = "checkpoint", value_name = "PATH")]
    checkpoint: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(long = "poll-interval-ms", default_value_t = 1000)]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let location = match (&args.resume, &args.checkpoint) {
        (Some(file), _) => Some(SeekPosition::new(file.clone(), args.offset)),
        (None, Some(path)) => checkpoint::load(path)
            .await
            .with_context(|| format!("reading checkpoint {}", path.display()))?,
        (None, None) => None,
    };

    let mut config = Config::new(DateTimeLayout::new(&args.dir, &args.pattern))
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms));
    if let Some(location) = location {
        config = config.with_location(location);
    }

    let mut consumer = Consumer::new(config).await?;
    let mut last: Option<SeekPosition> = None;
    let mut delivered = 0u64;

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                consumer.close();
                break Ok(());
            }
            line = consumer.next_line() => {
                let Some(mut line) = line else { break Ok(()) };
                if let Some(e) = line.error.take() {
                    break Err(anyhow::Error::new(e).context("following stopped"));
                }

                println!("{}", line.text);
                last = Some(line.resume_position());
                delivered += 1;

                if delivered % CHECKPOINT_EVERY == 0 {
                    save(&args.checkpoint, &last).await?;
                }
            }
        }
    };

    save(&args.checkpoint, &last).await?;
    outcome
}

async fn save(path: &Option<PathBuf>, position: &Option<SeekPosition>) -> Result<()> {
    if let (Some(path), Some(position)) = (path, position) {
        checkpoint::store(path, position)
            .await
            .with_context(|| format!("writing checkpoint {}", path.display()))?;
    }
    Ok(())
}
