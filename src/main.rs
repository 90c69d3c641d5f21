mod api;
mod auth;
mod chart;
mod cli;
mod config;
mod downloader;
mod error;
mod pipeline;
mod queue;
mod types;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting Zabbix graph downloader");

    let cli = Cli::parse();
    let config = config::Config::from_cli(cli).context("invalid arguments")?;
    info!(
        "Exporting {} host(s), {} -> {}, {}x{} px, up to {} attempts per image",
        config.hosts.len(),
        config.time_range.start,
        config.time_range.end,
        config.width,
        config.height,
        config.retry_ceiling
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("progress bar template")?
            .progress_chars("#>-"),
    );

    let outcome = match pipeline::run(&config, pb).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Run aborted: {}", e);
            eprintln!("{}", "Authentication or setup failed, nothing was downloaded".red());
            return Err(e.into());
        }
    };
    let summary = &outcome.summary;

    println!("\n{}", "Download Summary:".bold());
    println!("Queued images: {}", summary.total_downloads);
    println!("Already on disk: {}", outcome.already_present);
    println!("Succeeded: {}", summary.successful_downloads.to_string().green());
    println!("Failed: {}", summary.failed_downloads.to_string().red());
    println!("Total data transferred: {:.2} MB", summary.total_bytes_downloaded as f64 / 1_048_576.0);
    println!("Total duration: {:.2?}", summary.total_duration);

    if !outcome.skipped_hosts.is_empty() {
        println!("\n{}", "Skipped hosts:".yellow().bold());
        for host in &outcome.skipped_hosts {
            println!("- {}", host.yellow());
        }
    }

    if summary.failed_downloads > 0 {
        println!("\n{}", "Failed Downloads:".red().bold());
        for report in summary.reports.iter().filter(|r| r.status == types::DownloadStatus::Failed) {
            println!("✗ {} after {} attempts", report.output_path.display().to_string().red(), report.attempts);
            println!("  URL: {}", report.url);
        }
        anyhow::bail!("{} downloads failed", summary.failed_downloads);
    }

    println!("\n{}", "All downloads completed successfully".green());
    Ok(())
}
