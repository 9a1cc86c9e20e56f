//! Report output port.

use std::path::Path;

use crate::domain::error::PortviewError;
use crate::domain::portfolio::PortfolioData;

/// Port for writing a built portfolio somewhere.
pub trait ReportPort {
    fn write(&self, data: &PortfolioData, output_path: &Path) -> Result<(), PortviewError>;
}
