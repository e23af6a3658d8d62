use std::path::PathBuf;

use crate::career::prompt::DEFAULT_PROMPT_INTERVAL_TICKS;

pub const DEFAULT_CATALOG_PATH: &str = "./config/careers/careers.json";

/// Startup settings for a [`CareerServer`](crate::core::world::CareerServer).
#[derive(Debug, Clone)]
pub struct CareerConfig {
    pub catalog_path: PathBuf,
    pub prompt_interval_ticks: u64,
}

impl Default for CareerConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            prompt_interval_ticks: DEFAULT_PROMPT_INTERVAL_TICKS,
        }
    }
}

impl CareerConfig {
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }
}
