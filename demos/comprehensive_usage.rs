use log_follower::{Config, Consumer, DateTimeLayout, SeekPosition, checkpoint};
use std::path::Path;
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    println!("=== Log Follower Comprehensive Example ===\n");

    // Example 1: Daily files, starting from today's file
    println!("1. Daily files - reading today's file:");
    daily_usage().await?;

    println!("\n{}\n", "=".repeat(50));

    // Example 2: Resume from a saved position
    println!("2. Resume - continuing from a checkpoint:");
    resume_usage().await?;

    println!("\n{}\n", "=".repeat(50));

    // Example 3: Tell and close
    println!("3. Tell - inspecting the read position:");
    tell_usage().await?;

    Ok(())
}

async fn daily_usage() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new(DateTimeLayout::new("logs", "app.%Y-%m-%d.log"))
        .with_poll_interval(Duration::from_millis(200));
    let mut lines = Consumer::new(config).await?;

    match tokio::time::timeout(Duration::from_millis(500), lines.next()).await {
        Ok(Some(line)) => match line.error {
            None => println!("  📦 {}", line.text),
            Some(e) => eprintln!("  ❌ Error: {}", e),
        },
        Ok(None) => println!("  ℹ️  Stream ended"),
        Err(_) => println!("  ⏰ Timeout - no new content in file"),
    }

    Ok(())
}

async fn resume_usage() -> Result<(), Box<dyn std::error::Error>> {
    let saved = Path::new("logs/position.json");
    let Some(position) = checkpoint::load(saved).await? else {
        println!("  ℹ️  No checkpoint at {}", saved.display());
        return Ok(());
    };

    println!("  ▶️  Resuming {} at byte {}", position.path.display(), position.offset);
    let config = Config::new(DateTimeLayout::new("logs", "%Y%m%d%H.log")).with_location(position);
    let mut lines = Consumer::new(config).await?;

    let mut last: Option<SeekPosition> = None;
    while let Ok(Some(line)) = tokio::time::timeout(Duration::from_millis(500), lines.next()).await {
        if let Some(e) = line.error {
            eprintln!("  ❌ Error: {}", e);
            break;
        }
        println!("  📦 {}", line.text);
        last = Some(line.resume_position());
    }

    if let Some(position) = last {
        checkpoint::store(saved, &position).await?;
        println!("  💾 Saved {} at byte {}", position.path.display(), position.offset);
    }

    Ok(())
}

async fn tell_usage() -> Result<(), Box<dyn std::error::Error>> {
    let lines = Consumer::new(Config::new(DateTimeLayout::new("logs", "%Y%m%d%H.log"))).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    match lines.tell() {
        Some(position) => println!("  📍 {} @ {}", position.path.display(), position.offset),
        None => println!("  📍 No file open"),
    }

    lines.close();
    lines.close();
    println!("  🔒 Closed (tell = {:?})", lines.tell());

    Ok(())
}
