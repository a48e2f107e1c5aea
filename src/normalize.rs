//! Converts shape-specific raw rows into the canonical record schema.

use crate::error::{AnalyticsError, Result};
use crate::fields::{KeyedRow, LogicalField, UNKNOWN};
use crate::schema::{
    CanonicalRecord, CellValue, InterestType, LedgerMetrics, OutletMetrics, RawTable, ReportShape,
    ShapeMetrics,
};
use crate::shape::find_cashier_header;
use chrono::Local;
use log::{debug, info, warn};

/// Columns an outlet grid is read from, by fixed position after the three
/// identity columns: Direct Income, TOTAL REVENUE, COGS, Outlet Expenses,
/// EBIDTA, Finance Cost, PBT, WASTAGE.
const OUTLET_METRIC_BASE: usize = 3;

/// Ledger grids lay out one amount/percent/spacer triple per cashier,
/// starting at this column.
const LEDGER_FIRST_AMOUNT_COLUMN: usize = 4;
const LEDGER_COLUMN_STRIDE: usize = 3;

/// PBT and EBITDA are not itemized per cashier in ledger grids; the source
/// reports estimate them as fixed fractions of the line amount.
const LEDGER_PBT_ESTIMATE: f64 = 0.10;
const LEDGER_EBITDA_ESTIMATE: f64 = 0.15;

pub fn normalize(
    table: &RawTable,
    shape: ReportShape,
    filename: &str,
) -> Result<Vec<CanonicalRecord>> {
    let records = match shape {
        ReportShape::OutletSummary => normalize_outlet_summary(table, filename)?,
        ReportShape::CashierLedger => {
            if table.header().is_some_and(is_transaction_header) {
                normalize_transactions(table, filename)?
            } else {
                normalize_ledger_grid(table, filename)?
            }
        }
    };
    info!(
        "normalized {} records from '{}' ({:?})",
        records.len(),
        filename,
        shape
    );
    Ok(records)
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn header_row_index(table: &RawTable) -> Option<usize> {
    table
        .rows
        .iter()
        .position(|row| row.iter().any(|c| !c.is_blank()))
}

fn cell_number(row: &[CellValue], idx: usize) -> f64 {
    row.get(idx).map(CellValue::as_number).unwrap_or(0.0)
}

fn cell_text(row: &[CellValue], idx: usize) -> Option<&str> {
    row.get(idx).and_then(CellValue::as_text)
}

/// One record per data row; columns are positional. Interest sub-components
/// are picked up by header label when the source carries them (the backend
/// processing path emits them as named columns).
fn normalize_outlet_summary(table: &RawTable, filename: &str) -> Result<Vec<CanonicalRecord>> {
    let Some(header_idx) = header_row_index(table) else {
        return Ok(Vec::new());
    };
    let header = &table.rows[header_idx];

    let labelled = |label: &str| -> Option<usize> {
        header
            .iter()
            .position(|cell| cell.as_text().is_some_and(|t| t.eq_ignore_ascii_case(label)))
    };
    // Backend-produced tables interleave interest columns before PBT, so
    // header labels win over fixed positions when both are available.
    let metric_column = |label: &str, offset: usize| -> usize {
        labelled(label).unwrap_or(OUTLET_METRIC_BASE + offset)
    };
    let direct_income_col = metric_column("Direct Income", 0);
    let total_revenue_col = metric_column("TOTAL REVENUE", 1);
    let cogs_col = metric_column("COGS", 2);
    let expenses_col = metric_column("Outlet Expenses", 3);
    let ebitda_col = labelled("EBIDTA")
        .or_else(|| labelled("EBITDA"))
        .unwrap_or(OUTLET_METRIC_BASE + 4);
    let finance_cost_col = metric_column("Finance Cost", 5);
    let pbt_col = metric_column("PBT", 6);
    let wastage_col = metric_column("WASTAGE", 7);

    let interest_column = |kind: InterestType| -> Option<usize> {
        header
            .iter()
            .position(|cell| cell.as_text() == Some(kind.label()))
    };
    let interest_columns: Vec<(InterestType, Option<usize>)> = InterestType::ALL
        .into_iter()
        .map(|kind| (kind, interest_column(kind)))
        .collect();

    let default_period = today();
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in &table.rows[header_idx + 1..] {
        let populated = row.iter().filter(|c| !c.is_blank()).count();
        if populated < 5 {
            skipped += 1;
            continue;
        }
        let Some(outlet) = cell_text(row, 0).filter(|t| !CellValue::text(*t).is_blank()) else {
            skipped += 1;
            continue;
        };

        let manager = cell_text(row, 1).unwrap_or(UNKNOWN).to_string();
        let period = cell_text(row, 2)
            .map(str::to_string)
            .unwrap_or_else(|| default_period.clone());

        let mut metrics = OutletMetrics {
            direct_income: cell_number(row, direct_income_col),
            total_revenue: cell_number(row, total_revenue_col),
            cogs: cell_number(row, cogs_col),
            outlet_expenses: cell_number(row, expenses_col),
            ebitda: cell_number(row, ebitda_col),
            finance_cost: cell_number(row, finance_cost_col),
            pbt: cell_number(row, pbt_col),
            wastage: cell_number(row, wastage_col),
            ..OutletMetrics::default()
        };
        for (kind, column) in &interest_columns {
            let Some(idx) = column else { continue };
            let value = cell_number(row, *idx);
            match kind {
                InterestType::BankCharges => metrics.bank_charges = value,
                InterestType::Borrowings => metrics.borrowings = value,
                InterestType::VehicleLoan => metrics.vehicle_loan_interest = value,
                InterestType::Mg => metrics.mg = value,
                InterestType::FinanceCost => metrics.finance_cost = value,
            }
        }

        records.push(CanonicalRecord {
            outlet: outlet.to_string(),
            manager,
            period,
            metric_label: "Outlet Summary".to_string(),
            category: "Financial Summary".to_string(),
            amount: metrics.total_revenue,
            quantity: 1.0,
            percentage: 0.0,
            source_filename: filename.to_string(),
            metrics: ShapeMetrics::OutletSummary(metrics),
        });
    }

    if skipped > 0 {
        warn!(
            "'{}': skipped {} outlet rows with blank identity or too few columns",
            filename, skipped
        );
    }
    Ok(records)
}

/// Sparse grid layout: metric-name rows against repeating cashier
/// amount/percentage column groups. Zero-amount cells emit nothing; the
/// grids are mostly empty by construction.
fn normalize_ledger_grid(table: &RawTable, filename: &str) -> Result<Vec<CanonicalRecord>> {
    let (header_idx, cashiers) = find_cashier_header(table)?;
    let start_row = (header_idx + 1).max(2);
    let period = today();

    let mut records = Vec::new();
    for row in table.rows.iter().skip(start_row) {
        let Some(label) = row.first().filter(|c| !c.is_blank()).and_then(|c| c.as_text()) else {
            continue;
        };

        for (position, cashier) in cashiers.iter().enumerate() {
            let col = LEDGER_FIRST_AMOUNT_COLUMN + position * LEDGER_COLUMN_STRIDE;
            if col >= row.len() {
                break;
            }
            let amount = cell_number(row, col);
            if amount <= 0.0 {
                continue;
            }
            let percentage = cell_number(row, col + 1);

            records.push(CanonicalRecord {
                outlet: "All Outlets".to_string(),
                manager: cashier.clone(),
                period: period.clone(),
                metric_label: label.to_string(),
                category: "Financial Metric".to_string(),
                amount,
                quantity: 1.0,
                percentage,
                source_filename: filename.to_string(),
                metrics: ShapeMetrics::CashierLedger(LedgerMetrics {
                    gross_amount: amount,
                    unit_price: amount,
                    discount_percent: 0.0,
                    gst_percent: 0.0,
                    pbt: amount * LEDGER_PBT_ESTIMATE,
                    ebitda: amount * LEDGER_EBITDA_ESTIMATE,
                }),
            });
        }
    }

    debug!(
        "'{}': ledger grid with {} cashiers produced {} records",
        filename,
        cashiers.len(),
        records.len()
    );
    Ok(records)
}

fn is_transaction_header(header: &[CellValue]) -> bool {
    KeyedRow::header_has(header, LogicalField::MetricLabel)
        && KeyedRow::header_has(header, LogicalField::Quantity)
        && KeyedRow::header_has(header, LogicalField::Amount)
}

/// Required column groups for header-keyed transaction exports.
const REQUIRED_TRANSACTION_COLUMNS: [(&str, &[&str]); 5] = [
    ("Date/Month", &["Date", "Month"]),
    ("Product Name", &["Product Name", "Item Name"]),
    ("Category", &["Category"]),
    ("Quantity", &["Quantity", "Qty"]),
    ("Total Amount", &["Total Amount (₹)", "Total Sales"]),
];

/// Header-keyed transaction rows (the plain CSV export path). Each row is
/// already one transaction; all fields resolve through the alias tables.
fn normalize_transactions(table: &RawTable, filename: &str) -> Result<Vec<CanonicalRecord>> {
    let Some(header_idx) = header_row_index(table) else {
        return Ok(Vec::new());
    };
    let header = table.rows[header_idx].clone();

    let has_column = |options: &[&str]| {
        options.iter().any(|name| {
            header
                .iter()
                .any(|cell| cell.as_text().is_some_and(|t| t.eq_ignore_ascii_case(name)))
        })
    };
    let missing: Vec<&str> = REQUIRED_TRANSACTION_COLUMNS
        .iter()
        .filter(|(_, options)| !has_column(options))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AnalyticsError::MissingColumns(missing.join(", ")));
    }

    let default_period = today();
    let mut records = Vec::new();

    for cells in &table.rows[header_idx + 1..] {
        let row = KeyedRow::new(&header, cells);
        let Some(metric_label) = row.resolve_text(LogicalField::MetricLabel) else {
            continue;
        };

        let number_at = |column: &str| row.get(column).map(CellValue::as_number).unwrap_or(0.0);
        let amount = row.resolve_number(LogicalField::Amount);
        let gross = match row.get("Gross Amount") {
            Some(cell) if !cell.is_blank() => cell.as_number(),
            _ => amount,
        };
        let unit_price = match row.get("Unit Price (₹)") {
            Some(cell) if !cell.is_blank() => cell.as_number(),
            _ => amount,
        };
        let ebitda = match row.get("EBITDA") {
            Some(cell) if !cell.is_blank() => cell.as_number(),
            _ => number_at("EBIDTA"),
        };

        records.push(CanonicalRecord {
            outlet: row.resolve_text_or(LogicalField::OutletIdentity, UNKNOWN),
            manager: row.resolve_text_or(LogicalField::ManagerIdentity, UNKNOWN),
            period: row.resolve_text_or(LogicalField::Period, &default_period),
            metric_label,
            category: row.resolve_text_or(LogicalField::Category, UNKNOWN),
            amount,
            quantity: row.resolve_number(LogicalField::Quantity),
            percentage: number_at("Percentage"),
            source_filename: filename.to_string(),
            metrics: ShapeMetrics::CashierLedger(LedgerMetrics {
                gross_amount: gross,
                unit_price,
                discount_percent: number_at("Discount (%)"),
                gst_percent: number_at("GST (%)"),
                pbt: number_at("PBT"),
                ebitda,
            }),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::detect_shape;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::text(*c)).collect()
    }

    fn outlet_table() -> RawTable {
        RawTable::new(vec![
            text_row(&[
                "Outlet",
                "Outlet Manager",
                "Month",
                "Direct Income",
                "TOTAL REVENUE",
                "COGS",
                "Outlet Expenses",
                "EBIDTA",
                "Finance Cost",
                "PBT",
                "WASTAGE",
            ]),
            text_row(&[
                "Akshaya Nagar",
                "Shijoy",
                "2024-01",
                "1000",
                "5000",
                "2000",
                "1000",
                "1500",
                "0",
                "800",
                "100",
            ]),
        ])
    }

    #[test]
    fn test_outlet_summary_scenario() {
        let records = normalize(&outlet_table(), ReportShape::OutletSummary, "data5.xlsx").unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.outlet, "Akshaya Nagar");
        assert_eq!(record.manager, "Shijoy");
        assert_eq!(record.period, "2024-01");
        assert_eq!(record.amount, 5000.0);

        let metrics = record.outlet_metrics().unwrap();
        assert_eq!(metrics.total_revenue, 5000.0);
        assert_eq!(metrics.cogs, 2000.0);
        assert_eq!(metrics.pbt, 800.0);
        assert_eq!(metrics.wastage, 100.0);
    }

    #[test]
    fn test_outlet_rows_skip_blank_and_short() {
        let mut table = outlet_table();
        table.rows.push(text_row(&["", "Nobody", "2024-01", "1", "2", "3", "4", "5", "6", "7", "8"]));
        table.rows.push(text_row(&["NaN", "Nobody", "2024-01", "1", "2", "3", "4", "5", "6", "7", "8"]));
        table.rows.push(text_row(&["Jayanagar", "Anand", "2024-01"]));

        let records = normalize(&table, ReportShape::OutletSummary, "data5.xlsx").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_normalization_totality_on_qualifying_rows() {
        let mut table = outlet_table();
        for i in 0..10 {
            table.rows.push(text_row(&[
                &format!("Outlet {}", i),
                "Manager",
                "2024-02",
                "10",
                "20",
                "5",
                "3",
                "4",
                "0",
                "2",
                "1",
            ]));
        }
        let records = normalize(&table, ReportShape::OutletSummary, "f.csv").unwrap();
        assert_eq!(records.len(), 11);
    }

    #[test]
    fn test_interest_columns_by_header_label() {
        let table = RawTable::new(vec![
            text_row(&[
                "Outlet",
                "Outlet Manager",
                "Month",
                "Direct Income",
                "TOTAL REVENUE",
                "COGS",
                "Outlet Expenses",
                "EBIDTA",
                "Finance Cost",
                "PBT",
                "WASTAGE",
                "01-Bank Charges",
                "02-Interest on Borrowings",
                "03-Interest on Vehicle Loan",
                "04-MG",
            ]),
            text_row(&[
                "Koramangala",
                "Ranjith",
                "2024-03",
                "100",
                "9000",
                "400",
                "300",
                "200",
                "150",
                "600",
                "50",
                "500",
                "120",
                "80",
                "40",
            ]),
        ]);

        let records = normalize(&table, ReportShape::OutletSummary, "pl.xlsx").unwrap();
        let record = &records[0];
        assert_eq!(record.interest(InterestType::BankCharges), 500.0);
        assert_eq!(record.interest(InterestType::Borrowings), 120.0);
        assert_eq!(record.interest(InterestType::VehicleLoan), 80.0);
        assert_eq!(record.interest(InterestType::Mg), 40.0);
        assert_eq!(record.interest(InterestType::FinanceCost), 150.0);
        assert_eq!(record.total_interest(), 740.0);
    }

    #[test]
    fn test_ledger_grid_sparsity_filter() {
        let table = RawTable::new(vec![
            text_row(&["Particulars", "Consolidated", "%", "", "Ravi Kumar", "%", "", "Anita Rao", "%", "", "Suresh B", "%"]),
            text_row(&[]),
            text_row(&["Direct Income", "100", "1", "", "40", "0.4", "", "0", "0", "", "25", "0.2"]),
            text_row(&["NaN"]),
            text_row(&["COGS", "60", "1", "", "30", "0.5", "", "30", "0.5", "", "0", "0"]),
        ]);

        let records = normalize(&table, ReportShape::CashierLedger, "grid.xlsx").unwrap();
        // Zero-amount cashier cells produce no record.
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.amount > 0.0));
        assert!(records.iter().all(|r| r.shape() == ReportShape::CashierLedger));

        let ravi_direct = records
            .iter()
            .find(|r| r.manager == "Ravi Kumar" && r.metric_label == "Direct Income")
            .unwrap();
        assert_eq!(ravi_direct.amount, 40.0);
        assert_eq!(ravi_direct.percentage, 0.4);
        let ledger = ravi_direct.ledger_metrics().unwrap();
        assert!((ledger.pbt - 4.0).abs() < 1e-9);
        assert!((ledger.ebitda - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_transaction_rows_resolve_aliases() {
        let table = RawTable::new(vec![
            text_row(&["Date", "Item Name", "Category", "Qty", "Total Sales", "Cashier Name", "Store Name"]),
            text_row(&["2024-05-02", "Mysore Pak", "Sweets", "3", "450", "Anita Rao", "Jayanagar"]),
            text_row(&["2024-05-02", "", "Sweets", "1", "100", "Anita Rao", "Jayanagar"]),
        ]);

        let records = normalize(&table, ReportShape::CashierLedger, "sales.csv").unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.outlet, "Jayanagar");
        assert_eq!(record.manager, "Anita Rao");
        assert_eq!(record.period, "2024-05");
        assert_eq!(record.metric_label, "Mysore Pak");
        assert_eq!(record.amount, 450.0);
        assert_eq!(record.quantity, 3.0);
    }

    #[test]
    fn test_transaction_headers_match_any_case() {
        // Detection accepts lowercase headers, so column lookup must too.
        let table = RawTable::new(vec![
            text_row(&["date", "item name", "category", "qty", "total sales"]),
            text_row(&["2024-05-02", "Mysore Pak", "Sweets", "3", "450"]),
        ]);

        let shape = detect_shape(&table).unwrap();
        let records = normalize(&table, shape, "lower.csv").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metric_label, "Mysore Pak");
        assert_eq!(records[0].amount, 450.0);
        assert_eq!(records[0].quantity, 3.0);
    }

    #[test]
    fn test_transaction_missing_columns() {
        let table = RawTable::new(vec![
            text_row(&["Product Name", "Quantity", "Total Sales"]),
            text_row(&["Thing", "1", "10"]),
        ]);
        let err = normalize(&table, ReportShape::CashierLedger, "bad.csv").unwrap_err();
        match err {
            AnalyticsError::MissingColumns(names) => {
                assert!(names.contains("Date/Month"));
                assert!(names.contains("Category"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_round_trip_aliasing_never_unknown_for_real_outlets() {
        let records = normalize(&outlet_table(), ReportShape::OutletSummary, "f.xlsx").unwrap();
        assert_ne!(records[0].text(crate::fields::LogicalField::OutletIdentity), UNKNOWN);

        let grid = RawTable::new(vec![
            text_row(&["Particulars", "x", "%", "", "Ravi Kumar", "%", "", "Anita Rao", "%", "", "Suresh B", "%"]),
            text_row(&[]),
            text_row(&["PBT", "10", "1", "", "10", "1", "", "0", "0", "", "0", "0"]),
        ]);
        let shape = detect_shape(&grid).unwrap();
        let records = normalize(&grid, shape, "g.xlsx").unwrap();
        assert!(!records.is_empty());
        assert_ne!(records[0].text(crate::fields::LogicalField::OutletIdentity), UNKNOWN);
    }
}
