use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download Zabbix item graphs for a fixed time window", long_about = None)]
pub struct Cli {
    /// Zabbix JSON-RPC endpoint, e.g. https://zabbix.example.com/api_jsonrpc.php
    #[arg(long)]
    pub api_url: String,

    /// API bearer token
    #[arg(long, env = "ZABBIX_API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Web UI login name
    #[arg(short, long)]
    pub username: String,

    /// Web UI password
    #[arg(short, long, env = "ZABBIX_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Host name to export graphs for (repeatable)
    #[arg(long = "host", required = true)]
    pub hosts: Vec<String>,

    /// Start of the time window (YYYY-MM-DD HH:MM:SS)
    #[arg(long, default_value = "2024-12-23 00:00:00")]
    pub from: String,

    /// End of the time window (YYYY-MM-DD HH:MM:SS)
    #[arg(long, default_value = "2025-12-24 00:00:00")]
    pub to: String,

    /// Image width in pixels
    #[arg(long, default_value = "1920")]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "200")]
    pub height: u32,

    /// Maximum attempts per image
    #[arg(short, long, default_value = "500")]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Directory receiving one subdirectory per host
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Cap on concurrent downloads (unbounded when omitted)
    #[arg(long)]
    pub parallelism: Option<usize>,
}
