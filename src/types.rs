use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Graph window shared by every URL and file name of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HostRecord {
    #[serde(rename = "hostid")]
    pub host_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ItemRecord {
    #[serde(rename = "itemid")]
    pub item_id: String,
    #[serde(rename = "hostid")]
    pub host_id: String,
    pub name: String,
}

/// Serialized `Cookie` header value obtained at login.
///
/// The session is never refreshed: if it expires mid-run, chart requests
/// fail and are retried as ordinary HTTP failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookies(String);

impl SessionCookies {
    pub fn new(header: impl Into<String>) -> Self {
        Self(header.into())
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }
}

/// Chart URL to destination path. Keyed by URL, so duplicates collapse.
#[derive(Debug, Default)]
pub struct DownloadQueue {
    pub entries: BTreeMap<String, PathBuf>,
    pub skipped_hosts: Vec<String>,
    pub already_present: usize,
}

impl DownloadQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadStatus {
    Success,
    Failed,
}

#[derive(Debug)]
pub struct DownloadReport {
    pub url: String,
    pub output_path: PathBuf,
    pub status: DownloadStatus,
    pub attempts: u32,
    pub bytes_downloaded: u64,
    pub duration: Duration,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub total_downloads: usize,
    pub successful_downloads: usize,
    pub failed_downloads: usize,
    pub total_bytes_downloaded: u64,
    pub total_duration: Duration,
    pub reports: Vec<DownloadReport>,
}
