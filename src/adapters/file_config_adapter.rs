//! INI file configuration adapter.

use crate::domain::error::PortviewError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
    /// Directory relative input/output paths are resolved against.
    base_dir: Option<PathBuf>,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PortviewError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| PortviewError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Ok(Self { config, base_dir })
    }

    pub fn from_string(content: &str) -> Result<Self, PortviewError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| PortviewError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self {
            config,
            base_dir: None,
        })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        let raw = PathBuf::from(self.get_non_empty(section, key)?);
        match &self.base_dir {
            Some(base) if raw.is_relative() => Some(base.join(raw)),
            _ => Some(raw),
        }
    }
}
