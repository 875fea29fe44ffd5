mod cli;
mod settings;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use chrono::Local;
use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn, level_for_verbosity, LogTarget};
use harvester_core::{HarvestReport, StopReason};
use harvester_engine::{
    site_from_snapshot, CsvExporter, Harvester, SimSession, StopHandle, WebDriverSession,
};
use url::Url;

use crate::cli::Args;
use crate::settings::{load_settings, RunSettings, SettingsFile};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let target = match args.log_file.clone() {
        Some(path) => LogTarget::Both(path),
        None => LogTarget::Terminal,
    };
    engine_logging::initialize(target, level_for_verbosity(args.verbose));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let file = match &args.config {
        Some(path) => load_settings(path)?,
        None => SettingsFile::default(),
    };
    let mut settings = RunSettings::resolve(&args, file, Local::now().date_naive());
    if let Some(snapshot) = &settings.replay {
        settings.harvest.base_url = snapshot_url(snapshot)?;
    }

    let harvester =
        Harvester::new(settings.harvest.clone()).context("invalid harvest settings")?;
    stop_on_interrupt(harvester.stop_handle());

    let report = match &settings.replay {
        Some(snapshot) => {
            let html = fs::read_to_string(snapshot)
                .with_context(|| format!("could not read snapshot {}", snapshot.display()))?;
            let site = site_from_snapshot(&html, &settings.harvest.layout)
                .with_context(|| format!("could not replay snapshot {}", snapshot.display()))?;
            engine_info!("Replaying snapshot path={}", snapshot.display());
            harvester.run(&SimSession::new(site)).await?
        }
        None => {
            let session =
                WebDriverSession::connect(&settings.browser, settings.harvest.layout.clone())
                    .await
                    .with_context(|| {
                        format!(
                            "could not start a browser session at {} (is chromedriver running?)",
                            settings.browser.webdriver_url
                        )
                    })?;
            harvester.run(&session).await?
        }
    };

    log_summary(&report);
    if report.records.is_empty() {
        engine_warn!("No data was scraped");
        return Ok(());
    }

    let exporter = CsvExporter::new(settings.output_dir.clone());
    let summary = exporter
        .export(&settings.output_filename, &report.records)
        .with_context(|| format!("could not save records to {}", exporter.dir().display()))?;
    engine_info!(
        "Scraping completed records={} path={}",
        summary.record_count,
        summary.output_path.display()
    );
    Ok(())
}

fn snapshot_url(snapshot: &Path) -> anyhow::Result<String> {
    let absolute = fs::canonicalize(snapshot)
        .with_context(|| format!("snapshot {} not found", snapshot.display()))?;
    let url = Url::from_file_path(&absolute)
        .map_err(|()| anyhow!("snapshot path {} is not absolute", absolute.display()))?;
    Ok(url.to_string())
}

fn stop_on_interrupt(stop: StopHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            engine_warn!("Interrupt received, stopping after the current page");
            stop.request_stop();
        }
    });
}

fn log_summary(report: &HarvestReport) {
    engine_info!(
        "Harvest report reason={} pages={} last_page={} records={} page_size={:?}",
        report.stop_reason,
        report.pages_scraped,
        report.last_page,
        report.records.len(),
        report.page_size
    );
    let rows = &report.rows;
    if rows.rejected() > 0 {
        engine_info!(
            "Rejected rows unknown_layout={} missing_required={} unreadable={}",
            rows.unknown_layout,
            rows.missing_required,
            rows.unreadable
        );
    }
    match report.stop_reason {
        StopReason::NavigationFailure => {
            engine_warn!("Pagination broke off; the saved file may be incomplete")
        }
        StopReason::NoTable => engine_warn!("The data table was not found"),
        StopReason::Cancelled => engine_warn!("Harvest was interrupted"),
        StopReason::CapReached | StopReason::Exhausted => {}
    }
}
