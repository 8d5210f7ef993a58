//! Bot configuration loader.

use std::path::Path;

use game_core::BotConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`BotConfig`] from TOML files.
///
/// Every section and field is optional; omitted values keep their defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<BotConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<BotConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
