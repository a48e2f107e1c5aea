//! Heuristic layout detection for freshly parsed sheets.

use crate::error::{AnalyticsError, Result};
use crate::fields::{KeyedRow, LogicalField};
use crate::schema::{CellValue, RawTable, ReportShape};
use log::debug;

/// Three-way classification of a header row. Pure; callers who need a hard
/// answer use [`detect_shape`], which turns `Unrecognized` into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    OutletSummary,
    CashierLedger,
    Unrecognized,
}

/// Column labels whose presence marks an outlet-based financial summary.
const OUTLET_METRIC_MARKERS: [&str; 5] =
    ["direct income", "total revenue", "cogs", "ebitda", "pbt"];

/// Tokens that disqualify a cell from being a cashier name: sheet
/// boilerplate, currency/percent headers and month labels.
const NAME_BOILERPLATE: [&str; 8] = [
    "Unnamed",
    "Consolidated",
    "Particulars",
    "Rs.",
    "%",
    "NaN",
    "nan",
    "0.1",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn classify_header(header: &[CellValue]) -> ShapeKind {
    let label = |idx: usize| -> String {
        header
            .get(idx)
            .and_then(|c| c.as_text())
            .unwrap_or("")
            .to_lowercase()
    };

    let has_outlet_column = label(0).contains("outlet");
    let has_manager_column = label(1).contains("manager");
    let has_financial_metrics = header.iter().any(|cell| {
        cell.as_text().is_some_and(|t| {
            let t = t.to_lowercase();
            OUTLET_METRIC_MARKERS.iter().any(|m| t.contains(m)) || t.contains("ebidta")
        })
    });

    if has_outlet_column && has_manager_column && has_financial_metrics {
        return ShapeKind::OutletSummary;
    }

    if KeyedRow::header_has(header, LogicalField::MetricLabel)
        && KeyedRow::header_has(header, LogicalField::Quantity)
        && KeyedRow::header_has(header, LogicalField::Amount)
    {
        return ShapeKind::CashierLedger;
    }

    ShapeKind::Unrecognized
}

/// Classifies a parsed table, falling back to the cashier name-row scan for
/// headerless ledger grids. Unclassifiable input is an error, never a
/// silently empty result.
pub fn detect_shape(table: &RawTable) -> Result<ReportShape> {
    let header = table
        .header()
        .ok_or_else(|| AnalyticsError::ShapeDetection("the file contains no data".to_string()))?;

    match classify_header(header) {
        ShapeKind::OutletSummary => Ok(ReportShape::OutletSummary),
        ShapeKind::CashierLedger => Ok(ReportShape::CashierLedger),
        ShapeKind::Unrecognized => {
            // Ledger grids carry no conventional header; a row of cashier
            // names within the first few rows identifies them instead.
            let looks_like_grid = table.rows.iter().any(|r| r.len() > 5);
            match find_cashier_header(table) {
                Ok(_) => Ok(ReportShape::CashierLedger),
                Err(err) if looks_like_grid => Err(err),
                Err(_) => Err(AnalyticsError::ShapeDetection(
                    "header row matches neither an outlet summary nor a cashier ledger"
                        .to_string(),
                )),
            }
        }
    }
}

/// Locates the row carrying cashier names in a ledger grid.
///
/// Scans the first three rows for one with at least three plausible name
/// tokens past the label columns; falls back to row 0 with whatever names
/// it holds. Returns the row index and the names in column order.
pub fn find_cashier_header(table: &RawTable) -> Result<(usize, Vec<String>)> {
    for (idx, row) in table.rows.iter().take(3).enumerate() {
        if row.len() <= 5 {
            continue;
        }
        let names = candidate_names(row);
        if names.len() >= 3 {
            debug!("cashier name row found at index {} ({} names)", idx, names.len());
            return Ok((idx, names));
        }
    }

    if let Some(first) = table.rows.first() {
        let names = candidate_names(first);
        if !names.is_empty() {
            debug!("falling back to row 0 for cashier names ({} found)", names.len());
            return Ok((0, names));
        }
    }

    Err(AnalyticsError::CashierNameExtraction(
        "no row in the first three contains plausible cashier names".to_string(),
    ))
}

fn candidate_names(row: &[CellValue]) -> Vec<String> {
    row.iter()
        .enumerate()
        .filter(|(idx, _)| *idx > 2)
        .filter_map(|(_, cell)| cell.as_text())
        .filter(|text| text.len() > 2 && is_plausible_name(text))
        .map(|text| text.to_string())
        .collect()
}

fn is_plausible_name(text: &str) -> bool {
    !NAME_BOILERPLATE.iter().any(|token| text.contains(token))
        && !MONTH_NAMES.iter().any(|month| text.contains(month))
}
