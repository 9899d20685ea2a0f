//! Result retrieval: poll job status, resolve the asset manifest, then
//! download every asset concurrently.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use url::Url;

use crate::client::RodinClient;
use crate::error::{Result, RodinError};
use crate::types::{AssetManifest, DownloadOutcome, DownloadRequest, JobStatus, PREVIEW_ASSET};

/// Verdict of a single status poll
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PollStep {
    /// Jobs still in progress
    Continue,
    /// Every reported job is done, including when none are reported
    Ready,
    /// A job failed or was canceled
    Failed,
}

impl PollStep {
    pub(crate) fn evaluate(statuses: &[JobStatus]) -> Self {
        if statuses.iter().any(JobStatus::is_failure) {
            Self::Failed
        } else if statuses.iter().all(|status| *status == JobStatus::Done) {
            Self::Ready
        } else {
            Self::Continue
        }
    }
}

impl RodinClient {
    /// Retrieve the results of a task if it has finished
    ///
    /// Polls the task's status up to the configured number of attempts.
    /// Once every job is done, resolves the asset manifest and downloads all
    /// assets into `request.target_dir` concurrently, retrying each asset on
    /// its own. Returns [`DownloadOutcome::NotFinished`] when the poll budget
    /// runs out first.
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::TaskFailed`] if a job failed or was canceled, and
    /// the first error of any other phase. Files already written are kept.
    pub async fn try_download_result(&self, request: &DownloadRequest) -> Result<DownloadOutcome> {
        if !self.wait_for_jobs(&request.subscription_key).await? {
            tracing::info!(task_uuid = %request.task_uuid, "task not finished yet");
            return Ok(DownloadOutcome::NotFinished);
        }

        let manifest = self.asset_manifest(&request.task_uuid).await?;

        tracing::info!(
            task_uuid = %request.task_uuid,
            assets = manifest.len(),
            directory = %request.target_dir.display(),
            "downloading task assets"
        );

        let files = self.fetch_all(&manifest, &request.target_dir).await?;
        let preview = manifest
            .contains(PREVIEW_ASSET)
            .then(|| request.target_dir.join(PREVIEW_ASSET));

        Ok(DownloadOutcome::Completed {
            directory: request.target_dir.clone(),
            files,
            preview,
        })
    }

    /// Poll until every job is done; `false` if the attempt budget ran out
    async fn wait_for_jobs(&self, subscription_key: &str) -> Result<bool> {
        let max_attempts = self.poll.max_attempts;

        for attempt in 1..=max_attempts {
            let statuses = self.job_statuses(subscription_key).await?;

            match PollStep::evaluate(&statuses) {
                PollStep::Ready => return Ok(true),
                PollStep::Failed => {
                    tracing::warn!(?statuses, "generation task failed");
                    return Err(RodinError::TaskFailed { statuses });
                }
                PollStep::Continue => {
                    tracing::debug!(attempt, max_attempts, ?statuses, "jobs still running");

                    if attempt < max_attempts {
                        tokio::time::sleep(self.poll.interval).await;
                    }
                }
            }
        }

        Ok(false)
    }

    /// Download every manifest entry into `directory`
    ///
    /// All downloads run at once; the first failure resolves the whole call
    /// and drops the downloads still in flight.
    async fn fetch_all(&self, manifest: &AssetManifest, directory: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(directory)
            .await
            .map_err(|source| RodinError::Io {
                path: directory.to_path_buf(),
                source,
            })?;

        let downloads = manifest.iter().map(|(name, url)| {
            let path = directory.join(name);
            async move {
                self.fetch_with_retry(name, url, &path).await?;
                Ok::<_, RodinError>(path)
            }
        });

        try_join_all(downloads).await
    }

    async fn fetch_with_retry(&self, name: &str, url: &Url, path: &Path) -> Result<()> {
        let max_attempts = self.download.max_attempts;
        let mut attempt = 1;

        loop {
            match self.fetch_asset(url, path).await {
                Ok(()) => return Ok(()),
                Err(error) if attempt < max_attempts => {
                    tracing::warn!(asset = name, attempt, max_attempts, %error, "asset download failed, retrying");
                    tokio::time::sleep(self.download.retry_delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    tracing::error!(asset = name, attempts = attempt, %error, "asset download failed");
                    return Err(error);
                }
            }
        }
    }
}
