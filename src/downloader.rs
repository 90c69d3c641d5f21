use crate::error::GraphDlError;
use crate::types::{DownloadReport, DownloadStatus, DownloadSummary, SessionCookies};
use indicatif::ProgressBar;
use log::{error, info, warn};
use reqwest::header::COOKIE;
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
    retry_ceiling: u32,
    parallelism: Option<usize>,
    progress: ProgressBar,
}

impl Downloader {
    /// `parallelism: None` starts every download at once.
    pub fn new(
        retry_ceiling: u32,
        request_timeout: Duration,
        parallelism: Option<usize>,
    ) -> Result<Self, GraphDlError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(request_timeout).build()?,
            retry_ceiling,
            parallelism,
            progress: ProgressBar::hidden(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Fetches every queued chart concurrently and waits for all of them.
    pub async fn download_all(
        &self,
        entries: BTreeMap<String, PathBuf>,
        cookies: &SessionCookies,
        output_dir: &Path,
    ) -> DownloadSummary {
        let start_time = Instant::now();
        let total_downloads = entries.len();
        self.progress.set_length(total_downloads as u64);

        let limiter = self.parallelism.map(|n| Arc::new(Semaphore::new(n)));
        let mut tasks = JoinSet::new();

        for (url, output_path) in entries {
            let downloader = self.clone();
            let cookies = cookies.clone();
            let limiter = limiter.clone();
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                downloader.download_file(url, output_path, &cookies).await
            });
        }

        let mut reports = Vec::with_capacity(total_downloads);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    self.progress.set_message(
                        report
                            .output_path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                            .to_string(),
                    );
                    reports.push(report);
                }
                Err(e) => error!("Download task aborted: {}", e),
            }
            self.progress.inc(1);
        }
        self.progress.finish_with_message("done");

        let successful_downloads = reports
            .iter()
            .filter(|r| r.status == DownloadStatus::Success)
            .count();
        let total_bytes_downloaded = reports.iter().map(|r| r.bytes_downloaded).sum();

        let summary = DownloadSummary {
            total_downloads,
            successful_downloads,
            failed_downloads: total_downloads - successful_downloads,
            total_bytes_downloaded,
            total_duration: start_time.elapsed(),
            reports,
        };

        if total_downloads > 0 {
            if let Err(e) = write_stats_csv(&summary, output_dir).await {
                error!("Failed to write stats CSV: {}", e);
            }
        }

        summary
    }

    /// Retries until a 200 arrives or the ceiling is reached.
    async fn download_file(&self, url: String, output_path: PathBuf, cookies: &SessionCookies) -> DownloadReport {
        let start_time = Instant::now();
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.retry_ceiling {
            attempts += 1;
            match self.fetch_once(&url, &output_path, cookies).await {
                Ok(bytes) => {
                    info!("Successfully saved: {}", output_path.display());
                    return DownloadReport {
                        url,
                        output_path,
                        status: DownloadStatus::Success,
                        attempts,
                        bytes_downloaded: bytes,
                        duration: start_time.elapsed(),
                        error: None,
                    };
                }
                Err(e) => {
                    warn!("{}", retry_message(&e, &url, attempts, self.retry_ceiling));
                    last_error = Some(e.to_string());
                }
            }
        }

        let failure = GraphDlError::DownloadError(format!(
            "{} after {} attempts{}",
            url,
            attempts,
            last_error.map(|e| format!(" (last: {})", e)).unwrap_or_default()
        ));
        error!("{}", failure);

        DownloadReport {
            url,
            output_path,
            status: DownloadStatus::Failed,
            attempts,
            bytes_downloaded: 0,
            duration: start_time.elapsed(),
            error: Some(failure.to_string()),
        }
    }

    async fn fetch_once(&self, url: &str, output_path: &Path, cookies: &SessionCookies) -> Result<u64, GraphDlError> {
        let resp = self
            .client
            .post(url)
            .header(COOKIE, cookies.header_value())
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(GraphDlError::DownloadError(format!("Got {}", status)));
        }

        let body = resp.bytes().await?;
        tokio::fs::write(output_path, &body).await?;
        Ok(body.len() as u64)
    }
}

fn retry_message(err: &GraphDlError, url: &str, attempt: u32, ceiling: u32) -> String {
    match err {
        GraphDlError::DownloadError(msg) => format!("{} for {}, retry {}/{}", msg, url, attempt, ceiling),
        other => format!("Error downloading {}: {}, retry {}/{}", url, other, attempt, ceiling),
    }
}

async fn write_stats_csv(summary: &DownloadSummary, output_dir: &Path) -> Result<(), GraphDlError> {
    tokio::fs::create_dir_all(output_dir).await?;

    let stats_path = output_dir.join("download_stats.csv");
    let mut wtr = csv::WriterBuilder::new().from_path(stats_path)?;

    wtr.write_record([
        "Filename",
        "Status",
        "Attempts",
        "Size (KB)",
        "Duration (s)",
        "URL",
        "Error",
    ])?;

    for report in &summary.reports {
        let filename = report
            .output_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        wtr.write_record(&[
            filename.to_string(),
            format!("{:?}", report.status),
            report.attempts.to_string(),
            format!("{:.2}", report.bytes_downloaded as f64 / 1024.0),
            format!("{:.2}", report.duration.as_secs_f64()),
            report.url.clone(),
            report.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
