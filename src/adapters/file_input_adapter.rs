//! Reads the three input tables from disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::error::PortviewError;
use crate::ports::config_port::ConfigPort;
use crate::ports::input_port::{InputPort, RawInputs};

pub struct FileInputAdapter {
    transactions: Option<PathBuf>,
    symbols: Option<PathBuf>,
    quotes: Option<PathBuf>,
}

impl FileInputAdapter {
    pub fn new(transactions: PathBuf, symbols: PathBuf, quotes: PathBuf) -> Self {
        Self {
            transactions: Some(transactions),
            symbols: Some(symbols),
            quotes: Some(quotes),
        }
    }

    /// Paths from the `[inputs]` section. Absent keys leave the table unset,
    /// which the pipeline reports as missing input.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        Self {
            transactions: config.get_path("inputs", "transactions"),
            symbols: config.get_path("inputs", "symbols"),
            quotes: config.get_path("inputs", "quotes"),
        }
    }

    fn read(path: &Option<PathBuf>) -> Result<Option<String>, PortviewError> {
        path.as_deref().map(read_table).transpose()
    }
}

fn read_table(path: &Path) -> Result<String, PortviewError> {
    fs::read_to_string(path).map_err(|e| PortviewError::InputRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl InputPort for FileInputAdapter {
    fn load(&self) -> Result<RawInputs, PortviewError> {
        let raw = RawInputs {
            transactions: Self::read(&self.transactions)?,
            symbols: Self::read(&self.symbols)?,
            quotes: Self::read(&self.quotes)?,
        };
        info!("loaded input tables from disk");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_all_three() {
        let dir = TempDir::new().unwrap();
        let adapter = FileInputAdapter::new(
            write(&dir, "tx.csv", "Symbol\nAAA\n"),
            write(&dir, "s.csv", "Symbol,Name,Sector\n"),
            write(&dir, "q.csv", "Symbol,Date,Close\n"),
        );
        let raw = adapter.load().unwrap();
        assert_eq!(raw.transactions.as_deref(), Some("Symbol\nAAA\n"));
        assert!(raw.require().is_ok());
    }

    #[test]
    fn unreadable_file_is_input_read() {
        let dir = TempDir::new().unwrap();
        let adapter = FileInputAdapter::new(
            dir.path().join("missing.csv"),
            write(&dir, "s.csv", ""),
            write(&dir, "q.csv", ""),
        );
        let err = adapter.load().unwrap_err();
        assert!(matches!(err, PortviewError::InputRead { path, .. } if path.ends_with("missing.csv")));
    }

    #[test]
    fn unset_path_leaves_table_missing() {
        let dir = TempDir::new().unwrap();
        write(&dir, "tx.csv", "Symbol\n");
        let ini = write(&dir, "portview.ini", "[inputs]\ntransactions = tx.csv\n");
        let config = FileConfigAdapter::from_file(&ini).unwrap();
        let raw = FileInputAdapter::from_config(&config).load().unwrap();
        assert!(raw.transactions.is_some());
        assert!(raw.symbols.is_none());
        assert!(raw.quotes.is_none());
    }
}
