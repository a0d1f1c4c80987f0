use std::path::Path;

use anyhow::Context;
use tokio::io::AsyncWriteExt;

use shorts_media::{check_ffmpeg, check_ffprobe};
use shorts_worker::PublisherConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PublisherConfig::from_env().context("loading configuration")?;

    println!(
        "publisher-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("creating {}", config.work_dir.display()))?;

    let ffmpeg = check_ffmpeg().context("ffmpeg not available")?;
    println!("publisher-selfcheck: ffmpeg at {}", ffmpeg.display());
    match check_ffprobe() {
        Ok(path) => println!("publisher-selfcheck: ffprobe at {}", path.display()),
        Err(e) => println!("publisher-selfcheck: warning: {} (videos will be published unprobed)", e),
    }

    ensure_appendable(&config.ledger_path).await?;
    ensure_appendable(&config.audit_log_path).await?;

    println!(
        "publisher-selfcheck: publishing at {:?} with ±{} min jitter",
        config
            .publish_times
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        config.jitter_minutes
    );
    println!("publisher-selfcheck: ok");
    Ok(())
}

/// Open for append without writing anything.
async fn ensure_appendable(path: &Path) -> anyhow::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("{} is not writable", path.display()))?;
    file.flush().await?;
    Ok(())
}
