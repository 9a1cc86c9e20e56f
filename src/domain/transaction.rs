//! Transaction records and lifecycle status tags.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle tag carried by every transaction row.
///
/// Matching is trimmed and case-insensitive. `Cleared-RE` and its common
/// misspelling `Clered -RE` both mean a cleared position whose proceeds were
/// reinvested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusTag {
    OpenItems,
    OpenDeposits,
    ClosedDeposits,
    YtdClear,
    PydClear,
    Cleared,
    ClearedReinvested,
    TimeDeposit,
    Other(String),
}

/// Aggregation bucket a status tag routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    OpenPosition,
    ClosedPosition,
    OpenDeposit,
    ClosedDeposit,
}

impl StatusTag {
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .to_ascii_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        match key.as_str() {
            "open items" => StatusTag::OpenItems,
            "open deposits" => StatusTag::OpenDeposits,
            "closed deposits" => StatusTag::ClosedDeposits,
            "ytd clear" => StatusTag::YtdClear,
            "pyd clear" => StatusTag::PydClear,
            "cleared" => StatusTag::Cleared,
            "cleared-re" | "clered -re" => StatusTag::ClearedReinvested,
            "time deposit" => StatusTag::TimeDeposit,
            _ => StatusTag::Other(raw.trim().to_string()),
        }
    }

    /// `None` for unrecognized tags, which stay out of positional views.
    pub fn class(&self) -> Option<StatusClass> {
        match self {
            StatusTag::OpenItems => Some(StatusClass::OpenPosition),
            StatusTag::OpenDeposits => Some(StatusClass::OpenDeposit),
            StatusTag::ClosedDeposits => Some(StatusClass::ClosedDeposit),
            StatusTag::YtdClear
            | StatusTag::PydClear
            | StatusTag::Cleared
            | StatusTag::ClearedReinvested
            | StatusTag::TimeDeposit => Some(StatusClass::ClosedPosition),
            StatusTag::Other(_) => None,
        }
    }

    pub fn is_time_deposit(&self) -> bool {
        matches!(self, StatusTag::TimeDeposit)
    }

    /// Label used in holding views. Reinvested variants collapse to `Cleared`.
    pub fn display(&self) -> &str {
        match self {
            StatusTag::OpenItems => "Open Items",
            StatusTag::OpenDeposits => "Open Deposits",
            StatusTag::ClosedDeposits => "Closed Deposits",
            StatusTag::YtdClear => "YTD Clear",
            StatusTag::PydClear => "PYD Clear",
            StatusTag::Cleared | StatusTag::ClearedReinvested => "Cleared",
            StatusTag::TimeDeposit => "Time Deposit",
            StatusTag::Other(raw) => raw,
        }
    }
}

impl StatusClass {
    /// Status label for views grouped without a per-row status.
    pub fn label(self) -> &'static str {
        match self {
            StatusClass::OpenPosition => "Open Items",
            StatusClass::ClosedPosition => "Cleared",
            StatusClass::OpenDeposit => "Open Deposits",
            StatusClass::ClosedDeposit => "Closed Deposits",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, StatusClass::ClosedPosition | StatusClass::ClosedDeposit)
    }

    pub fn is_fixed_income(self) -> bool {
        matches!(self, StatusClass::OpenDeposit | StatusClass::ClosedDeposit)
    }
}

/// One ledger event. Signed fields already encode direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub symbol: String,
    pub account: String,
    /// Normalized `YYYY-MM-DD`, or the raw text if it could not be parsed.
    pub date: String,
    pub status: StatusTag,
    pub quantity_change: f64,
    pub cost_change: f64,
    pub realized: f64,
    pub cash_impact: f64,
    pub net_price: f64,
    pub debit: f64,
}

impl Transaction {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    pub fn class(&self) -> Option<StatusClass> {
        self.status.class()
    }
}
