use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Harvest the Lunch-Check restaurant directory into a CSV file.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "lunchcheck_harvester", version)]
pub struct Args {
    /// Listing page to start from.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Name of the CSV file [default: lunchcheck_<YYYYMMDD>.csv]
    #[arg(long, value_name = "NAME")]
    pub output_filename: Option<String>,

    /// Directory the CSV file is written to [default: data]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after this many pages; -1 means no limit.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub max_pages: Option<i64>,

    /// Rows per page to request from the site [default: 500]
    #[arg(long, value_name = "ROWS")]
    pub page_size: Option<u32>,

    /// Upper bound for every individual wait, in seconds [default: 3]
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Run the browser without a window [default: false]
    #[arg(long, value_name = "BOOL")]
    pub headless: Option<bool>,

    /// WebDriver server to drive Chrome through [default: http://localhost:9515]
    ///
    /// The harvester does not start one itself: run `chromedriver --port=9515`
    /// (matching your Chrome version) before a live harvest. Not needed with
    /// --replay.
    #[arg(long, value_name = "URL")]
    pub webdriver_url: Option<String>,

    /// RON settings file; flags given here take precedence over it.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Harvest a saved listing page instead of the live site.
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write the log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn negative_page_cap_is_accepted() {
        let args = Args::try_parse_from(["lunchcheck_harvester", "--max-pages", "-1", "-vv"])
            .expect("valid arguments");
        assert_eq!(args.max_pages, Some(-1));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn headless_takes_an_explicit_value() {
        let args = Args::try_parse_from(["lunchcheck_harvester", "--headless", "false"])
            .expect("valid arguments");
        assert_eq!(args.headless, Some(false));
        assert!(Args::try_parse_from(["lunchcheck_harvester", "--headless", "maybe"]).is_err());
    }

    #[test]
    fn webdriver_help_says_chromedriver_must_be_running() {
        let command = Args::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == "webdriver_url")
            .expect("webdriver_url argument");
        let help = arg.get_long_help().expect("long help").to_string();
        assert!(help.contains("chromedriver --port=9515"));
        assert!(help.contains("--replay"));
    }
}
