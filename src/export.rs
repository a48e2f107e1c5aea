//! CSV generation for the current filtered or aggregated view. Every field
//! is quoted (inner quotes doubled) so the output survives spreadsheet
//! round trips regardless of cell content.

use crate::aggregate::AggregateRow;
use crate::error::Result;
use crate::schema::{CanonicalRecord, InterestType, LedgerMetrics, OutletMetrics};
use csv::{QuoteStyle, WriterBuilder};
use std::collections::BTreeMap;

/// Download name used by the presentation layer.
pub const DEFAULT_EXPORT_FILENAME: &str = "restaurant_sales_data.csv";

const RECORD_HEADER: [&str; 25] = [
    "Outlet",
    "Outlet Manager",
    "Month",
    "Product Name",
    "Category",
    "Total Amount (₹)",
    "Quantity",
    "Percentage",
    "Direct Income",
    "TOTAL REVENUE",
    "COGS",
    "Outlet Expenses",
    "EBIDTA",
    "Finance Cost",
    "01-Bank Charges",
    "02-Interest on Borrowings",
    "03-Interest on Vehicle Loan",
    "04-MG",
    "PBT",
    "WASTAGE",
    "Gross Amount",
    "Unit Price (₹)",
    "Discount (%)",
    "GST (%)",
    "Upload Filename",
];

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn record_fields(record: &CanonicalRecord) -> Vec<String> {
    let outlet = record.outlet_metrics().cloned().unwrap_or_default();
    let ledger = record.ledger_metrics().cloned().unwrap_or_else(|| LedgerMetrics {
        // Outlet rows expose their revenue under the ledger headings too,
        // the way the source reports flatten them.
        gross_amount: outlet.total_revenue,
        unit_price: outlet.total_revenue,
        pbt: outlet.pbt,
        ebitda: outlet.ebitda,
        ..LedgerMetrics::default()
    });
    let OutletMetrics {
        direct_income,
        total_revenue,
        cogs,
        outlet_expenses,
        ebitda,
        finance_cost,
        pbt,
        wastage,
        ..
    } = outlet;
    let (pbt_value, ebitda_value) = match record.ledger_metrics() {
        Some(m) => (m.pbt, m.ebitda),
        None => (pbt, ebitda),
    };

    vec![
        record.outlet.clone(),
        record.manager.clone(),
        record.period.clone(),
        record.metric_label.clone(),
        record.category.clone(),
        fmt_num(record.amount),
        fmt_num(record.quantity),
        fmt_num(record.percentage),
        fmt_num(direct_income),
        fmt_num(total_revenue),
        fmt_num(cogs),
        fmt_num(outlet_expenses),
        fmt_num(ebitda_value),
        fmt_num(finance_cost),
        fmt_num(record.interest(InterestType::BankCharges)),
        fmt_num(record.interest(InterestType::Borrowings)),
        fmt_num(record.interest(InterestType::VehicleLoan)),
        fmt_num(record.interest(InterestType::Mg)),
        fmt_num(pbt_value),
        fmt_num(wastage),
        fmt_num(ledger.gross_amount),
        fmt_num(ledger.unit_price),
        fmt_num(ledger.discount_percent),
        fmt_num(ledger.gst_percent),
        record.source_filename.clone(),
    ]
}

/// Serializes records with a fixed header row. Output field count and order
/// match [`RECORD_HEADER`] exactly.
pub fn records_to_csv(records: &[CanonicalRecord]) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(&mut buf);
        writer.write_record(RECORD_HEADER)?;
        for record in records {
            writer.write_record(record_fields(record))?;
        }
        writer.flush()?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Serializes aggregator output as `group,sum,count,average` rows, in the
/// map's key order.
pub fn aggregates_to_csv(
    rows: &BTreeMap<String, AggregateRow>,
    group_label: &str,
) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(&mut buf);
        writer.write_record([group_label, "Sum", "Count", "Average"])?;
        for (key, row) in rows {
            writer.write_record([
                key.clone(),
                fmt_num(row.sum),
                row.count.to_string(),
                fmt_num(row.average),
            ])?;
        }
        writer.flush()?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
