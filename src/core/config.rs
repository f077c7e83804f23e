use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_EDIT_BLOCK_LOOKAHEAD};
use crate::core::error::RenderError;
use crate::core::message::MessageKind;
use crate::stream::renderer::RenderOptions;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// UI theme name ("dark" or "light")
    pub theme: Option<String>,
    /// Recognize SEARCH/REPLACE edit blocks in non-user messages
    pub edit_blocks: Option<bool>,
    /// Lines after an opening fence searched for a SEARCH marker
    pub edit_block_lookahead: Option<usize>,
    /// Merge adjacent blocks once a message is complete
    pub compact_on_complete: Option<bool>,
    /// Bytes per chunk when replaying a file
    pub chunk_size: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Config, RenderError> {
        let config_path = Self::get_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, RenderError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents).map_err(|err| {
                RenderError::Config(format!("{}: {err}", config_path.display()))
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), RenderError> {
        let config_path = Self::get_config_path()?;
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|err| RenderError::Config(err.to_string()))?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf, RenderError> {
        let proj_dirs = ProjectDirs::from("org", "markstream", "markstream").ok_or_else(|| {
            RenderError::Config("failed to determine config directory".to_string())
        })?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    pub fn edit_blocks_enabled(&self) -> bool {
        self.edit_blocks.unwrap_or(true)
    }

    pub fn compact_on_complete(&self) -> bool {
        self.compact_on_complete.unwrap_or(true)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.filter(|n| *n > 0).unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    /// Parsing options for messages of `kind`.
    pub fn render_options(&self, kind: MessageKind) -> RenderOptions {
        RenderOptions {
            edit_blocks: self.edit_blocks_enabled() && !kind.is_user(),
            edit_block_lookahead: self
                .edit_block_lookahead
                .unwrap_or(DEFAULT_EDIT_BLOCK_LOOKAHEAD),
        }
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.theme {
            Some(theme) => println!("  theme: {theme}"),
            None => println!("  theme: (unset)"),
        }
        match self.edit_blocks_enabled() {
            true => println!("  edit-blocks: on"),
            false => println!("  edit-blocks: off"),
        }
        println!(
            "  edit-block-lookahead: {}",
            self.edit_block_lookahead
                .unwrap_or(DEFAULT_EDIT_BLOCK_LOOKAHEAD)
        );
        match self.compact_on_complete() {
            true => println!("  compact-on-complete: on"),
            false => println!("  compact-on-complete: off"),
        }
        println!("  chunk-size: {}", self.chunk_size());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("nonexistent_config.toml");

        let config = Config::load_from_path(&config_path).expect("Failed to load config");

        assert_eq!(config, Config::default());
        assert!(config.edit_blocks_enabled());
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            theme: Some("light".to_string()),
            edit_blocks: Some(false),
            edit_block_lookahead: Some(40),
            compact_on_complete: None,
            chunk_size: Some(64),
        };
        config.save_to_path(&config_path).expect("Failed to save config");

        let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "theme = [").unwrap();

        let err = Config::load_from_path(&config_path).unwrap_err();
        assert!(matches!(err, RenderError::Config(ref msg) if msg.contains("config.toml")));
    }

    #[test]
    fn test_render_options_respect_kind() {
        let config = Config {
            edit_block_lookahead: Some(10),
            ..Config::default()
        };
        let assistant = config.render_options(MessageKind::Assistant);
        assert!(assistant.edit_blocks);
        assert_eq!(assistant.edit_block_lookahead, 10);
        assert!(!config.render_options(MessageKind::User).edit_blocks);

        let off = Config {
            edit_blocks: Some(false),
            ..Config::default()
        };
        assert!(!off.render_options(MessageKind::Assistant).edit_blocks);
    }

    #[test]
    fn test_zero_chunk_size_falls_back() {
        let config = Config {
            chunk_size: Some(0),
            ..Config::default()
        };
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
    }
}
