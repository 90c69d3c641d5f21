use crate::api::ApiClient;
use crate::auth;
use crate::config::Config;
use crate::downloader::Downloader;
use crate::error::GraphDlError;
use crate::queue::build_queue;
use crate::types::DownloadSummary;
use indicatif::ProgressBar;
use log::info;

#[derive(Debug)]
pub struct RunOutcome {
    pub skipped_hosts: Vec<String>,
    pub already_present: usize,
    pub summary: DownloadSummary,
}

/// Login, enumerate, queue, download. Only a failed login aborts the run.
pub async fn run(config: &Config, progress: ProgressBar) -> Result<RunOutcome, GraphDlError> {
    let cookies = auth::login(
        &config.login_url(),
        &config.username,
        &config.password,
        config.request_timeout,
    )
    .await?;
    info!("Successfully authenticated with Zabbix");

    let api = ApiClient::new(config.api_url.as_str(), &config.api_token, config.request_timeout)?;
    let queue = build_queue(&api, config).await?;

    if queue.is_empty() {
        info!("No images to download.");
    } else {
        info!("Starting download of {} images...", queue.len());
    }

    let downloader = Downloader::new(config.retry_ceiling, config.request_timeout, config.parallelism)?
        .with_progress(progress);
    let summary = downloader
        .download_all(queue.entries, &cookies, &config.output_dir)
        .await;
    info!(
        "All downloads completed: {} succeeded, {} failed",
        summary.successful_downloads, summary.failed_downloads
    );

    Ok(RunOutcome {
        skipped_hosts: queue.skipped_hosts,
        already_present: queue.already_present,
        summary,
    })
}
