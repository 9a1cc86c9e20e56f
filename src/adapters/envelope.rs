//! JSON envelope carrying the three raw tables.
//!
//! The envelope stores text only; importing it re-runs the pipeline, so an
//! export/import round trip reproduces the same `PortfolioData`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::PortviewError;
use crate::ports::input_port::{InputPort, RawInputs};

pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u32,
    pub transactions: String,
    pub symbols: String,
    pub quotes: String,
}

impl Envelope {
    /// Wrap raw tables. All three must be present.
    pub fn from_inputs(raw: &RawInputs) -> Result<Self, PortviewError> {
        let (transactions, symbols, quotes) = raw.require()?;
        Ok(Envelope {
            version: ENVELOPE_VERSION,
            transactions: transactions.to_string(),
            symbols: symbols.to_string(),
            quotes: quotes.to_string(),
        })
    }

    pub fn into_inputs(self) -> RawInputs {
        RawInputs::new(self.transactions, self.symbols, self.quotes)
    }

    pub fn to_json(&self) -> Result<String, PortviewError> {
        serde_json::to_string_pretty(self).map_err(|e| PortviewError::Envelope {
            reason: e.to_string(),
        })
    }

    pub fn from_json(text: &str) -> Result<Self, PortviewError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| PortviewError::Envelope {
                reason: e.to_string(),
            })?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(PortviewError::Envelope {
                reason: format!(
                    "unsupported version {} (expected {})",
                    envelope.version, ENVELOPE_VERSION
                ),
            });
        }
        Ok(envelope)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), PortviewError> {
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "wrote envelope");
        Ok(())
    }
}

/// Input source backed by an envelope file on disk.
pub struct EnvelopeAdapter {
    path: PathBuf,
}

impl EnvelopeAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl InputPort for EnvelopeAdapter {
    fn load(&self) -> Result<RawInputs, PortviewError> {
        let text = fs::read_to_string(&self.path).map_err(|e| PortviewError::InputRead {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        let envelope = Envelope::from_json(&text)?;
        info!(path = %self.path.display(), "loaded envelope");
        Ok(envelope.into_inputs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Table;
    use tempfile::NamedTempFile;

    fn raw() -> RawInputs {
        RawInputs::new(
            "Symbol,Account\nAAA,IRA\n".into(),
            "Symbol,Name,Sector\n".into(),
            "Symbol,Date,Close\n".into(),
        )
    }

    #[test]
    fn json_has_version_and_tables() {
        let json = Envelope::from_inputs(&raw()).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["transactions"], "Symbol,Account\nAAA,IRA\n");
    }

    #[test]
    fn file_round_trip_preserves_text() {
        let file = NamedTempFile::new().unwrap();
        Envelope::from_inputs(&raw())
            .unwrap()
            .write_to(file.path())
            .unwrap();
        let loaded = EnvelopeAdapter::new(file.path().to_path_buf())
            .load()
            .unwrap();
        assert_eq!(loaded, raw());
    }

    #[test]
    fn export_requires_all_tables() {
        let mut partial = raw();
        partial.quotes = None;
        let err = Envelope::from_inputs(&partial).unwrap_err();
        assert!(matches!(
            err,
            PortviewError::InputMissing {
                table: Table::Quotes
            }
        ));
    }

    #[test]
    fn wrong_version_rejected() {
        let text = r#"{"version":2,"transactions":"","symbols":"","quotes":""}"#;
        assert!(matches!(
            Envelope::from_json(text),
            Err(PortviewError::Envelope { reason }) if reason.contains("version 2")
        ));
    }

    #[test]
    fn missing_field_rejected() {
        let text = r#"{"version":1,"transactions":""}"#;
        assert!(matches!(
            Envelope::from_json(text),
            Err(PortviewError::Envelope { .. })
        ));
    }
}
