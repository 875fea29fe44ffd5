//! Run settings: built-in defaults, overridden by a RON settings file,
//! overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use harvester_core::{HarvestConfig, PageCap, PageLayout};
use harvester_engine::BrowserSettings;
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};

use crate::cli::Args;

const DEFAULT_OUTPUT_DIR: &str = "data";

/// Contents of a `--config` file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub base_url: Option<String>,
    pub output_filename: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_pages: Option<i64>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub headless: Option<bool>,
    pub webdriver_url: Option<String>,
    pub layout: LayoutSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutSettings {
    pub table_id: Option<String>,
    pub page_size_id: Option<String>,
    pub pager_class: Option<String>,
    pub postback_marker: Option<String>,
    pub ellipsis_label: Option<String>,
}

impl LayoutSettings {
    fn apply(self, layout: &mut PageLayout) {
        let fields = [
            (self.table_id, &mut layout.table_id),
            (self.page_size_id, &mut layout.page_size_id),
            (self.pager_class, &mut layout.pager_class),
            (self.postback_marker, &mut layout.postback_marker),
            (self.ellipsis_label, &mut layout.ellipsis_label),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Parse settings text. `Some(..)` may be left out around optional values.
pub fn parse_settings(text: &str) -> Result<SettingsFile, ron::error::SpannedError> {
    ron::Options::default()
        .with_default_extension(Extensions::IMPLICIT_SOME)
        .from_str(text)
}

pub fn load_settings(path: &Path) -> anyhow::Result<SettingsFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read settings file {}", path.display()))?;
    parse_settings(&text)
        .with_context(|| format!("could not parse settings file {}", path.display()))
}

/// Everything one run needs, fully resolved.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub harvest: HarvestConfig,
    pub browser: BrowserSettings,
    pub output_dir: PathBuf,
    pub output_filename: String,
    pub replay: Option<PathBuf>,
}

pub fn default_output_filename(today: NaiveDate) -> String {
    format!("lunchcheck_{}.csv", today.format("%Y%m%d"))
}

impl RunSettings {
    pub fn resolve(args: &Args, file: SettingsFile, today: NaiveDate) -> Self {
        let mut harvest = HarvestConfig::default();
        file.layout.apply(&mut harvest.layout);

        if let Some(url) = args.base_url.clone().or(file.base_url) {
            harvest.base_url = url;
        }
        if let Some(size) = args.page_size.or(file.page_size) {
            harvest.desired_page_size = size;
        }
        if let Some(raw) = args.max_pages.or(file.max_pages) {
            harvest.max_pages = PageCap::from_raw(raw);
        }
        if let Some(secs) = args.timeout_secs.or(file.timeout_secs) {
            harvest.timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = file.settle_delay_ms {
            harvest.settle_delay = Duration::from_millis(millis);
        }

        let mut browser = BrowserSettings::default();
        if let Some(headless) = args.headless.or(file.headless) {
            browser.headless = headless;
        }
        if let Some(url) = args.webdriver_url.clone().or(file.webdriver_url) {
            browser.webdriver_url = url;
        }

        Self {
            harvest,
            browser,
            output_dir: args
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            output_filename: args
                .output_filename
                .clone()
                .or(file.output_filename)
                .unwrap_or_else(|| default_output_filename(today)),
            replay: args.replay.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_core::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = RunSettings::resolve(&Args::default(), SettingsFile::default(), today());
        assert_eq!(settings.harvest.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.harvest.desired_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.harvest.max_pages, PageCap::Unbounded);
        assert_eq!(settings.harvest.timeout, DEFAULT_TIMEOUT);
        assert!(!settings.browser.headless);
        assert_eq!(settings.output_dir, PathBuf::from("data"));
        assert_eq!(settings.output_filename, "lunchcheck_20240307.csv");
        assert!(settings.harvest.validate().is_ok());
    }

    #[test]
    fn flags_override_file_values() {
        let file = parse_settings(
            r#"(
                base_url: "https://mirror.example/LC_Directory.aspx",
                max_pages: 4,
                page_size: 100,
                headless: true,
                settle_delay_ms: 0,
                layout: (pager_class: "grid-pager"),
            )"#,
        )
        .unwrap();
        let args = Args {
            max_pages: Some(-1),
            output_filename: Some("run.csv".to_string()),
            ..Args::default()
        };

        let settings = RunSettings::resolve(&args, file, today());
        assert_eq!(settings.harvest.base_url, "https://mirror.example/LC_Directory.aspx");
        assert_eq!(settings.harvest.max_pages, PageCap::Unbounded);
        assert_eq!(settings.harvest.desired_page_size, 100);
        assert_eq!(settings.harvest.settle_delay, Duration::ZERO);
        assert_eq!(settings.harvest.layout.pager_class, "grid-pager");
        assert_eq!(
            settings.harvest.layout.table_id,
            PageLayout::default().table_id
        );
        assert!(settings.browser.headless);
        assert_eq!(settings.output_filename, "run.csv");
    }

    #[test]
    fn unknown_settings_are_rejected() {
        assert!(parse_settings("(max_page: 3)").is_err());
    }

    #[test]
    fn settings_file_is_loaded_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("harvest.ron");
        fs::write(&path, "(output_dir: \"exports\", timeout_secs: 10)").unwrap();

        let file = load_settings(&path).unwrap();
        assert_eq!(file.output_dir, Some(PathBuf::from("exports")));
        assert_eq!(file.timeout_secs, Some(10));
        assert!(load_settings(&dir.path().join("missing.ron")).is_err());
    }
}
