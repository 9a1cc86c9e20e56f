//! JSON report adapter: the whole `PortfolioData` as one document.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::error::PortviewError;
use crate::domain::portfolio::PortfolioData;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render(&self, data: &PortfolioData) -> Result<String, PortviewError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };
        rendered.map_err(|e| PortviewError::Io(std::io::Error::other(e)))
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, data: &PortfolioData, output_path: &Path) -> Result<(), PortviewError> {
        fs::write(output_path, self.render(data)?)?;
        info!(path = %output_path.display(), "wrote portfolio json");
        Ok(())
    }
}

/// Read a previously written report back.
pub fn read_report(path: &Path) -> Result<PortfolioData, PortviewError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| PortviewError::Io(std::io::Error::other(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_portfolio_renders() {
        let json = JsonReportAdapter::new(false)
            .render(&PortfolioData::empty())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["holdings"].as_array().unwrap().is_empty());
        assert_eq!(value["summary"]["total_value"], 0.0);
    }

    #[test]
    fn written_report_reads_back() {
        let file = NamedTempFile::new().unwrap();
        JsonReportAdapter::new(true)
            .write(&PortfolioData::empty(), file.path())
            .unwrap();
        assert_eq!(read_report(file.path()).unwrap(), PortfolioData::empty());
    }
}
