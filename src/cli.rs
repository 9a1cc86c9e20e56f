//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_report_adapter::{write_series, CsvReportAdapter};
use crate::adapters::envelope::{Envelope, EnvelopeAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_input_adapter::FileInputAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::config_validation::{
    portfolio_config, validate_inputs_config, validate_portfolio_config,
};
use crate::domain::error::PortviewError;
use crate::domain::measures::{
    account_breakdown, sector_allocation, select_holdings, summarize, time_series,
    AccountFilter, HoldingView,
};
use crate::domain::portfolio::{PortfolioConfig, PortfolioData};
use crate::pipeline::process;
use crate::ports::config_port::ConfigPort;
use crate::ports::input_port::InputPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT: &str = "portfolio.json";

#[derive(Parser, Debug)]
#[command(name = "portview", about = "Portfolio holdings and history from transaction extracts")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the portfolio and write it as JSON
    Process {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        holdings_csv: Option<PathBuf>,
    },
    /// Print one holdings view as CSV
    Holdings {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value = "open")]
        view: HoldingView,
        #[arg(long)]
        account: Option<String>,
        /// Also print value by sector
        #[arg(long)]
        sectors: bool,
    },
    /// Print the valuation time series as CSV
    Series {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: Option<String>,
    },
    /// Bundle the configured input tables into a JSON envelope
    Export {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Rebuild the portfolio from a JSON envelope
    Import {
        #[arg(short, long)]
        envelope: PathBuf,
        /// Portfolio settings; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Process {
            config,
            output,
            holdings_csv,
        } => run_process(&config, output.as_deref(), holdings_csv.as_deref()),
        Command::Holdings {
            config,
            view,
            account,
            sectors,
        } => run_holdings(&config, view, account.as_deref(), sectors),
        Command::Series { config, account } => run_series(&config, account.as_deref()),
        Command::Export { config, output } => run_export(&config, &output),
        Command::Import {
            envelope,
            config,
            output,
        } => run_import(&envelope, config.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PortviewError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Load and validate the config, read the inputs it names, build.
pub fn load_portfolio(config_path: &Path) -> Result<(FileConfigAdapter, PortfolioData), PortviewError> {
    let config = load_config(config_path)?;
    validate_inputs_config(&config)?;
    let settings = portfolio_config(&config)?;
    let raw = FileInputAdapter::from_config(&config).load()?;
    let data = process(&raw, &settings)?;
    Ok((config, data))
}

fn run_process(
    config_path: &Path,
    output: Option<&Path>,
    holdings_csv: Option<&Path>,
) -> Result<(), PortviewError> {
    let (config, data) = load_portfolio(config_path)?;
    print_summary(&data);

    let output = output
        .map(Path::to_path_buf)
        .or_else(|| config.get_path("output", "path"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    write_report(config.get_bool("output", "pretty", true), &data, &output)?;

    if let Some(csv_path) = holdings_csv
        .map(Path::to_path_buf)
        .or_else(|| config.get_path("output", "holdings_csv"))
    {
        CsvReportAdapter::new(HoldingView::Open, AccountFilter::All).write(&data, &csv_path)?;
        eprintln!("Holdings written to: {}", csv_path.display());
    }
    computation_status(&data)
}

fn write_report(pretty: bool, data: &PortfolioData, output: &Path) -> Result<(), PortviewError> {
    JsonReportAdapter::new(pretty).write(data, output)?;
    eprintln!("\nPortfolio written to: {}", output.display());
    Ok(())
}

/// Failed accounts still produce a report, but the run exits non-zero.
fn computation_status(data: &PortfolioData) -> Result<(), PortviewError> {
    if data.has_failures() {
        Err(PortviewError::AccountsFailed {
            count: data.failed_accounts.len(),
        })
    } else {
        Ok(())
    }
}

fn run_holdings(
    config_path: &Path,
    view: HoldingView,
    account: Option<&str>,
    sectors: bool,
) -> Result<(), PortviewError> {
    let (_, data) = load_portfolio(config_path)?;
    let filter = AccountFilter::from_option(account);
    let holdings = select_holdings(&data, view, &filter);

    CsvReportAdapter::write_holdings(holdings, std::io::stdout().lock())?;

    let totals = summarize(holdings);
    eprintln!(
        "\n{} holdings, value {:.2}, cost {:.2}, unrealized {:+.2} ({:.2}%), realized {:+.2}",
        totals.count,
        totals.value,
        totals.cost,
        totals.unrealized_gain,
        totals.unrealized_pct,
        totals.realized_gain,
    );

    if sectors {
        eprintln!("\n=== Sector Allocation ===");
        for share in sector_allocation(holdings) {
            eprintln!("  {:<24} {:>14.2}  {:>6.2}%", share.sector, share.value, share.share_pct);
        }
    }
    Ok(())
}

fn run_series(config_path: &Path, account: Option<&str>) -> Result<(), PortviewError> {
    let (_, data) = load_portfolio(config_path)?;
    let points = time_series(&data, &AccountFilter::from_option(account));
    let mut out = std::io::stdout().lock();
    write_series(points, &mut out)?;
    out.flush()?;
    eprintln!("{} points", points.len());
    Ok(())
}

fn run_export(config_path: &Path, output: &Path) -> Result<(), PortviewError> {
    let config = load_config(config_path)?;
    validate_inputs_config(&config)?;
    let raw = FileInputAdapter::from_config(&config).load()?;
    Envelope::from_inputs(&raw)?.write_to(output)?;
    eprintln!("Envelope written to: {}", output.display());
    Ok(())
}

fn run_import(
    envelope: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), PortviewError> {
    let config = config_path.map(load_config).transpose()?;
    let settings = match &config {
        Some(c) => portfolio_config(c)?,
        None => PortfolioConfig::default(),
    };

    eprintln!("Importing envelope {}", envelope.display());
    let raw = EnvelopeAdapter::new(envelope.to_path_buf()).load()?;
    let data = process(&raw, &settings)?;
    print_summary(&data);

    let output = output
        .map(Path::to_path_buf)
        .or_else(|| config.as_ref().and_then(|c| c.get_path("output", "path")))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let pretty = config.as_ref().is_none_or(|c| c.get_bool("output", "pretty", true));
    write_report(pretty, &data, &output)?;
    computation_status(&data)
}

fn run_validate(config_path: &Path) -> Result<(), PortviewError> {
    let config = load_config(config_path)?;
    validate_inputs_config(&config)?;
    validate_portfolio_config(&config)?;
    let settings = portfolio_config(&config)?;

    eprintln!("\nInputs:");
    for key in ["transactions", "symbols", "quotes"] {
        if let Some(path) = config.get_path("inputs", key) {
            let marker = if path.exists() { "" } else { "  (not found)" };
            eprintln!("  {key}: {}{marker}", path.display());
        }
    }
    eprintln!("\nPortfolio:");
    eprintln!(
        "  benchmark_symbol: {}",
        settings.benchmark_symbol.as_deref().unwrap_or("(none)")
    );
    eprintln!("  zero_quantity_epsilon: {}", settings.epsilon);

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

pub fn print_summary(data: &PortfolioData) {
    let s = &data.summary;
    eprintln!("\n=== Portfolio Summary ===");
    eprintln!("Total Value:      {:.2}", s.total_value);
    eprintln!("Cash:             {:.2}", s.cash);
    eprintln!("Equity:           {:.2}", s.equity);
    eprintln!("Realized Gain:    {:+.2}", s.realized_gain);
    eprintln!("Unrealized Gain:  {:+.2}", s.unrealized_gain);
    eprintln!("Open Holdings:    {}", s.holdings);
    eprintln!("Closed Positions: {}", data.closed_positions.len());

    if let Some(last) = data.time_series.last() {
        eprintln!("\n=== Accounts on {} ===", last.date);
        for (account, value) in account_breakdown(data, last.date) {
            eprintln!("  {:<24} {:>14.2}", account, value);
        }
    }

    for failure in &data.failed_accounts {
        eprintln!("warning: account {} failed: {}", failure.account, failure.error);
    }
}
