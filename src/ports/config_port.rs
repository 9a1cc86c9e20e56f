//! Configuration access port.

use std::path::PathBuf;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Like `get_string`, but blank values count as absent.
    fn get_non_empty(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// A path-valued key. Implementations may resolve relative paths against
    /// wherever the configuration came from.
    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_non_empty(section, key).map(PathBuf::from)
    }
}
