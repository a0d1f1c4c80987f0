//! The publish pipeline.
//!
//! One run picks at most one unpublished asset and drives it through
//! `Selected -> Downloaded -> Validated -> Repaired|Unchanged -> MetadataReady
//! -> Uploaded -> PostActionsDone -> Committed`. Rejections and failures end
//! the run early. The ledger is only written in `Committed`, and the run's
//! scratch directory is removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, warn, Instrument};

use shorts_google::{AssetSource, GoogleError, Publisher, UploadRequest};
use shorts_media::{MediaInspector, RepairOutcome, ValidationRules};
use shorts_models::{PublishMetadata, PublishRecord, RemoteAsset, VideoProperties, Visibility};

use crate::audit::AuditLog;
use crate::config::PublisherConfig;
use crate::error::{PublisherError, PublisherResult};
use crate::ledger::PublicationLedger;
use crate::logging::RunLogger;
use crate::metadata::MetadataSynthesizer;
use crate::retry::{retry_async, RetryConfig};

const THUMBNAIL_FILE_NAME: &str = "thumbnail.jpg";

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Selected,
    Downloaded,
    Validated,
    Repaired,
    Unchanged,
    MetadataReady,
    Uploaded,
    PostActionsDone,
    Committed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Selected => "selected",
            PipelineStage::Downloaded => "downloaded",
            PipelineStage::Validated => "validated",
            PipelineStage::Repaired => "repaired",
            PipelineStage::Unchanged => "unchanged",
            PipelineStage::MetadataReady => "metadata_ready",
            PipelineStage::Uploaded => "uploaded",
            PipelineStage::PostActionsDone => "post_actions_done",
            PipelineStage::Committed => "committed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing left to publish
    NoCandidates,
    /// Uploaded and committed to the ledger
    Published(PublishRecord),
    /// Failed validation; not ledgered, eligible again later
    Rejected { asset: String, issues: Vec<String> },
    /// A stage failed; the asset was not ledgered
    Failed {
        asset: Option<String>,
        /// Last stage reached before the failure
        stage: PipelineStage,
        error: PublisherError,
    },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::NoCandidates => "no_candidates",
            RunOutcome::Published(_) => "published",
            RunOutcome::Rejected { .. } => "rejected",
            RunOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, RunOutcome::Published(_))
    }
}

/// Per-run knobs taken from [`PublisherConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub validation: ValidationRules,
    pub hard_cap_secs: f64,
    pub category_id: String,
    pub visibility: Visibility,
    pub first_comment: Option<String>,
    pub set_thumbnail: bool,
    pub work_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            validation: ValidationRules::default(),
            hard_cap_secs: 60.0,
            category_id: "22".to_string(),
            visibility: Visibility::Public,
            first_comment: None,
            set_thumbnail: false,
            work_dir: std::env::temp_dir(),
        }
    }
}

impl From<&PublisherConfig> for PipelineSettings {
    fn from(config: &PublisherConfig) -> Self {
        Self {
            validation: config.validation.clone(),
            hard_cap_secs: config.hard_cap_secs,
            category_id: config.category_id.clone(),
            visibility: config.visibility,
            first_comment: config.first_comment.clone(),
            set_thumbnail: config.set_thumbnail,
            work_dir: config.work_dir.clone(),
        }
    }
}

/// Scratch directory owned by one run.
///
/// Removed explicitly at the end of the run, and by `Drop` if the run is
/// abandoned part way.
struct Scratch {
    dir: tempfile::TempDir,
}

impl Scratch {
    async fn create(parent: &Path) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(parent).await?;
        let dir = tempfile::Builder::new()
            .prefix("shorts-run-")
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed scratch directory {}", path.display()),
            Err(e) => warn!("Failed to remove scratch directory {}: {}", path.display(), e),
        }
    }
}

/// Pick one candidate uniformly at random.
pub fn select_candidate<'a, R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &'a [RemoteAsset],
) -> Option<&'a RemoteAsset> {
    if candidates.is_empty() {
        return None;
    }
    candidates.get(rng.random_range(0..candidates.len()))
}

type StageResult<T> = Result<T, (PipelineStage, PublisherError)>;

/// Drives one asset from storage to the platform.
pub struct PublishPipeline {
    source: Arc<dyn AssetSource>,
    publisher: Arc<dyn Publisher>,
    inspector: Arc<dyn MediaInspector>,
    synthesizer: MetadataSynthesizer,
    settings: PipelineSettings,
    ledger: Mutex<PublicationLedger>,
    audit: AuditLog,
    rng: Mutex<StdRng>,
    retry: RetryConfig,
}

impl PublishPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn AssetSource>,
        publisher: Arc<dyn Publisher>,
        inspector: Arc<dyn MediaInspector>,
        synthesizer: MetadataSynthesizer,
        settings: PipelineSettings,
        ledger: PublicationLedger,
        audit: AuditLog,
        rng: StdRng,
    ) -> Self {
        Self {
            source,
            publisher,
            inspector,
            synthesizer,
            settings,
            ledger: Mutex::new(ledger),
            audit,
            rng: Mutex::new(rng),
            retry: RetryConfig::new("storage"),
        }
    }

    /// Override the storage retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn is_published(&self, name: &str) -> bool {
        self.ledger.lock().await.is_published(name)
    }

    /// Execute one run. Never panics on collaborator errors; everything is
    /// reported through the returned outcome.
    pub async fn run_once(&self, trigger: &str) -> RunOutcome {
        let run = RunLogger::new(trigger);
        let span = run.create_span();

        async {
            run.log_start("looking for an unpublished asset");
            let outcome = self.run_inner(&run).await;
            self.report(&run, &outcome);
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self, run: &RunLogger) -> RunOutcome {
        let listed = match retry_async(
            &self.retry.named("storage_list"),
            GoogleError::is_retryable,
            || self.source.list_video_assets(),
        )
        .await
        {
            Ok(listed) => listed,
            Err(e) => {
                return RunOutcome::Failed {
                    asset: None,
                    stage: PipelineStage::Selected,
                    error: PublisherError::Storage(e),
                }
            }
        };

        let candidates: Vec<RemoteAsset> = {
            let ledger = self.ledger.lock().await;
            listed
                .into_iter()
                .filter(|a| a.has_video_extension() && !ledger.is_published(&a.name))
                .filter(|a| {
                    let storable = PublicationLedger::can_record(&a.name);
                    if !storable {
                        warn!(asset = ?a.name, "Skipping asset whose name cannot be recorded in the ledger");
                    }
                    storable
                })
                .collect()
        };

        let asset = {
            let mut rng = self.rng.lock().await;
            match select_candidate(&mut *rng, &candidates) {
                Some(asset) => asset.clone(),
                None => return RunOutcome::NoCandidates,
            }
        };
        run.log_progress(&format!(
            "selected {} out of {} candidates",
            asset.name,
            candidates.len()
        ));

        let scratch = match Scratch::create(&self.settings.work_dir).await {
            Ok(scratch) => scratch,
            Err(e) => {
                return RunOutcome::Failed {
                    asset: Some(asset.name),
                    stage: PipelineStage::Selected,
                    error: PublisherError::Io(e),
                }
            }
        };

        let outcome = match self.publish_asset(run, &asset, scratch.path()).await {
            Ok(outcome) => outcome,
            Err((stage, error)) => RunOutcome::Failed {
                asset: Some(asset.name.clone()),
                stage,
                error,
            },
        };

        scratch.cleanup();
        outcome
    }

    async fn publish_asset(
        &self,
        run: &RunLogger,
        asset: &RemoteAsset,
        scratch: &Path,
    ) -> StageResult<RunOutcome> {
        let local = retry_async(
            &self.retry.named("storage_download"),
            GoogleError::is_retryable,
            || self.source.download_asset(asset, scratch),
        )
        .await
        .map_err(|e| (PipelineStage::Selected, PublisherError::Storage(e)))?;
        debug!(asset = %asset.name, stage = %PipelineStage::Downloaded, "Downloaded to {}", local.display());

        let probe = self.inspector.probe(&local).await;
        let assessment = self.settings.validation.assess(&probe);
        if !assessment.verdict.admitted() {
            return Ok(RunOutcome::Rejected {
                asset: asset.name.clone(),
                issues: assessment.verdict.issue_messages(),
            });
        }
        let mut notes = assessment.notes;
        for note in &notes {
            run.log_warning(note);
        }

        let repair = match assessment.properties {
            Some(props) if props.duration > self.settings.hard_cap_secs => {
                self.inspector
                    .trim(&local, props.duration, self.settings.hard_cap_secs)
                    .await
            }
            _ => RepairOutcome::Unchanged(local.clone()),
        };
        if let Some(note) = repair.note() {
            if matches!(repair, RepairOutcome::Failed { .. }) {
                run.log_warning(&note);
            }
            notes.push(note);
        }
        let stage = match repair {
            RepairOutcome::Trimmed { .. } => PipelineStage::Repaired,
            _ => PipelineStage::Unchanged,
        };
        let publish_path = repair.path().to_path_buf();
        debug!(asset = %asset.name, stage = %stage, "Publishing {}", publish_path.display());

        let metadata = {
            let mut rng = self.rng.lock().await;
            self.synthesizer.synthesize(&mut *rng, &asset.name)
        };

        let request = UploadRequest::from_metadata(
            &metadata,
            &self.settings.category_id,
            self.settings.visibility,
        );
        let video_id = self
            .publisher
            .upload_video(&publish_path, &request)
            .await
            .map_err(|e| (PipelineStage::MetadataReady, PublisherError::Upload(e)))?;
        run.log_progress(&format!("uploaded {} as {}", asset.name, video_id));

        for failure in self.post_actions(&video_id, &publish_path, scratch).await {
            run.log_warning(&failure.to_string());
            notes.push(failure.to_string());
        }

        self.commit(run, asset, &video_id, &metadata, notes, assessment.properties)
            .await
    }

    /// Best-effort actions on the published video; returns what failed.
    async fn post_actions(
        &self,
        video_id: &str,
        video: &Path,
        scratch: &Path,
    ) -> Vec<PublisherError> {
        let mut failures = Vec::new();

        if let Some(text) = &self.settings.first_comment {
            if let Err(e) = self.publisher.post_comment(video_id, text).await {
                failures.push(PublisherError::post_action(format!("comment: {}", e)));
            }
        }

        if self.settings.set_thumbnail {
            if let Err(e) = self.replace_thumbnail(video_id, video, scratch).await {
                failures.push(e);
            }
        }

        failures
    }

    async fn replace_thumbnail(
        &self,
        video_id: &str,
        video: &Path,
        scratch: &Path,
    ) -> PublisherResult<()> {
        let image = scratch.join(THUMBNAIL_FILE_NAME);
        self.inspector.thumbnail(video, &image).await?;
        self.publisher
            .set_thumbnail(video_id, &image)
            .await
            .map_err(|e| PublisherError::post_action(format!("thumbnail: {}", e)))
    }

    async fn commit(
        &self,
        run: &RunLogger,
        asset: &RemoteAsset,
        video_id: &str,
        metadata: &PublishMetadata,
        notes: Vec<String>,
        properties: Option<VideoProperties>,
    ) -> StageResult<RunOutcome> {
        self.ledger
            .lock()
            .await
            .mark_published(&asset.name)
            .await
            .map_err(|e| (PipelineStage::PostActionsDone, e))?;

        let record = PublishRecord::new(&asset.name, video_id, metadata)
            .with_notes(notes)
            .with_properties(properties);

        // The ledger already excludes the asset; a missing audit row is logged only.
        if let Err(e) = self.audit.append(&record).await {
            run.log_error(&format!("published {} but audit append failed: {}", asset.name, e));
        }

        Ok(RunOutcome::Published(record))
    }

    fn report(&self, run: &RunLogger, outcome: &RunOutcome) {
        metrics::counter!("shorts_publish_runs_total", "outcome" => outcome.label()).increment(1);

        match outcome {
            RunOutcome::NoCandidates => run.log_completion("no unpublished videos available"),
            RunOutcome::Published(record) => {
                run.log_completion(&format!("{} -> {}", record.source_name, record.platform_url))
            }
            RunOutcome::Rejected { asset, issues } => {
                warn!(run_id = %run.run_id(), asset = %asset, issues = ?issues, "Asset rejected");
            }
            RunOutcome::Failed {
                asset,
                stage,
                error,
            } => {
                let asset = asset.as_deref().unwrap_or("-");
                if *stage == PipelineStage::PostActionsDone {
                    error!(
                        run_id = %run.run_id(),
                        asset = %asset,
                        stage = %stage,
                        "Video was uploaded but could not be recorded: {}",
                        error
                    );
                } else {
                    error!(run_id = %run.run_id(), asset = %asset, stage = %stage, "Run failed: {}", error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_select_candidate_covers_every_index() {
        let assets: Vec<RemoteAsset> = (0..4)
            .map(|i| RemoteAsset::new(format!("id{}", i), format!("clip{}.mp4", i)))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits = [0u32; 4];

        for _ in 0..400 {
            let picked = select_candidate(&mut rng, &assets).unwrap();
            let idx = assets.iter().position(|a| a == picked).unwrap();
            hits[idx] += 1;
        }
        assert!(hits.iter().all(|&h| h > 50));
    }

    #[test]
    fn test_select_candidate_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_candidate(&mut rng, &[]).is_none());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(RunOutcome::NoCandidates.label(), "no_candidates");
        assert_eq!(PipelineStage::MetadataReady.to_string(), "metadata_ready");
    }
}
