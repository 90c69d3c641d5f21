use crate::cli::Cli;
use crate::error::GraphDlError;
use crate::types::TimeRange;
use chrono::NaiveDateTime;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything a run needs, validated up front.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub api_token: String,
    pub username: String,
    pub password: String,
    pub hosts: Vec<String>,
    pub time_range: TimeRange,
    pub width: u32,
    pub height: u32,
    pub retry_ceiling: u32,
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
    pub parallelism: Option<usize>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, GraphDlError> {
        let api_url = parse_api_url(&cli.api_url)?;

        let start = parse_timestamp("from", &cli.from)?;
        let end = parse_timestamp("to", &cli.to)?;
        if end < start {
            return Err(GraphDlError::ConfigError(format!(
                "time window ends ({}) before it starts ({})",
                cli.to, cli.from
            )));
        }

        if cli.hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(GraphDlError::ConfigError("no host names given".into()));
        }
        if cli.width == 0 || cli.height == 0 {
            return Err(GraphDlError::ConfigError(format!(
                "image dimensions must be non-zero, got {}x{}",
                cli.width, cli.height
            )));
        }
        if cli.parallelism == Some(0) {
            return Err(GraphDlError::ConfigError("parallelism must be at least 1".into()));
        }

        Ok(Self {
            api_url,
            api_token: cli.api_token,
            username: cli.username,
            password: cli.password,
            hosts: cli.hosts.into_iter().filter(|h| !h.trim().is_empty()).collect(),
            time_range: TimeRange { start, end },
            width: cli.width,
            height: cli.height,
            retry_ceiling: cli.retries,
            request_timeout: Duration::from_secs(cli.timeout),
            output_dir: cli.output_dir,
            parallelism: cli.parallelism,
        })
    }

    /// Scheme, host and port of the API URL. Login and chart export live here.
    pub fn server_base(&self) -> String {
        let host = self.api_url.host_str().unwrap_or_default();
        match self.api_url.port() {
            Some(port) => format!("{}://{}:{}", self.api_url.scheme(), host, port),
            None => format!("{}://{}", self.api_url.scheme(), host),
        }
    }

    pub fn login_url(&self) -> String {
        format!("{}/", self.server_base())
    }
}

fn parse_api_url(raw: &str) -> Result<Url, GraphDlError> {
    if raw.trim().is_empty() {
        return Err(GraphDlError::ConfigError("API URL is empty".into()));
    }
    let url = Url::parse(raw.trim())
        .map_err(|e| GraphDlError::ConfigError(format!("invalid API URL {}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(GraphDlError::ConfigError(format!(
            "API URL must be an absolute http(s) URL, got {}",
            raw
        )));
    }
    Ok(url)
}

fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime, GraphDlError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        GraphDlError::ConfigError(format!(
            "--{} must look like YYYY-MM-DD HH:MM:SS, got {:?}: {}",
            field, raw, e
        ))
    })
}
