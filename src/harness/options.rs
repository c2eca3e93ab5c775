//! Run options.
//!
//! Defaults match the layout the checker is usually deployed with: `default.cfg` and `tests.csv` in the working
//! directory next to `./ursulalogchecktester`.

use std::path::PathBuf;
use std::time::Duration;

use super::invoker::WaitPolicy;

pub const DEFAULT_CONFIG: &str = "default.cfg";
pub const DEFAULT_CATALOG: &str = "tests.csv";
pub const DEFAULT_CHECKER: &str = "./ursulalogchecktester";

/// How run progress is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

/// Options for one harness run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Checker config; also the source of the shared secret
    pub config_path: PathBuf,
    /// Test catalog
    pub catalog_path: PathBuf,
    /// Checker executable
    pub checker_path: PathBuf,
    /// How long to wait for each checker invocation
    pub wait: WaitPolicy,
    pub format: OutputFormat,
    /// Print timings and catalog positions
    pub verbose: bool,
    /// ANSI colors in console output
    pub color: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG),
            catalog_path: PathBuf::from(DEFAULT_CATALOG),
            checker_path: PathBuf::from(DEFAULT_CHECKER),
            wait: WaitPolicy::Unbounded,
            format: OutputFormat::Console,
            verbose: false,
            color: false,
        }
    }
}

impl RunOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    pub fn with_checker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checker_path = path.into();
        self
    }

    /// Kill any checker that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.wait = WaitPolicy::Timeout(timeout);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}
