use log_follower::{DateTimeLayout, follow_log};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Follow hourly files such as logs/2024010110.log, starting with the current hour
    let mut lines = follow_log(DateTimeLayout::new("logs", "%Y%m%d%H.log")).await?;

    println!("Following logs/%Y%m%d%H.log ...");

    let mut count = 0;
    while let Some(line) = lines.next().await {
        if let Some(e) = line.error {
            eprintln!("Error: {}", e);
            break;
        }

        println!("[{}] {}", line.source_file.display(), line.text);

        count += 1;
        if count >= 10 {
            // Only show the first few lines for demo
            break;
        }
    }

    Ok(())
}
