//! Shorts publisher binary.

use std::sync::Arc;

use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{error, info};

use shorts_google::{DriveClient, DriveConfig, YouTubeClient, YouTubeConfig};
use shorts_media::FfmpegInspector;
use shorts_worker::{
    init_tracing, AuditLog, JitteredScheduler, MetadataPools, MetadataSynthesizer,
    PipelineSettings, PublicationLedger, PublishPipeline, PublisherConfig, PublisherError,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting shorts-publisher");

    let config = match PublisherConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            if e.is_fatal() {
                error!("Cannot start without credentials: {}", e);
            } else {
                error!("Invalid configuration: {}", e);
            }
            std::process::exit(1);
        }
    };
    info!("Publisher config: {:?}", config);

    let pipeline = match build_pipeline(&config).await {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!("Failed to initialize publisher: {}", e);
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    if config.run_on_start {
        info!("Running once at startup");
        pipeline.run_once("startup").await;
    }

    let mut scheduler = JitteredScheduler::new(config.publish_times.clone(), config.jitter_minutes);
    let mut rng = StdRng::from_os_rng();
    let times = scheduler.arm(&mut rng, pipeline.clone(), Local::now());
    info!(
        "Publishing daily at {}",
        times.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    );

    scheduler.run_until_shutdown(shutdown_rx).await;

    info!("Publisher shutdown complete");
}

async fn build_pipeline(config: &PublisherConfig) -> Result<PublishPipeline, PublisherError> {
    let drive = DriveClient::from_service_account_json(
        config.service_account_json.expose(),
        DriveConfig {
            folder_id: config.drive_folder_id.clone(),
            ..DriveConfig::default()
        },
    )
    .map_err(|e| PublisherError::config(format!("SERVICE_ACCOUNT_JSON: {}", e)))?;

    let youtube = YouTubeClient::from_token_json(config.token_json.expose(), YouTubeConfig::default())
        .map_err(|e| PublisherError::config(format!("TOKEN_JSON: {}", e)))?;

    let ledger = PublicationLedger::open(&config.ledger_path).await?;
    let audit = AuditLog::new(&config.audit_log_path);
    let synthesizer = MetadataSynthesizer::new(MetadataPools::with_overrides(
        config.hashtags.clone(),
        config.keywords.clone(),
    ));

    Ok(PublishPipeline::new(
        Arc::new(drive),
        Arc::new(youtube),
        Arc::new(FfmpegInspector::with_timeout(config.ffmpeg_timeout_secs)),
        synthesizer,
        PipelineSettings::from(config),
        ledger,
        audit,
        StdRng::from_os_rng(),
    ))
}
