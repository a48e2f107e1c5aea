use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single spreadsheet cell as produced by the parsing collaborators.
///
/// Backend JSON payloads and locally parsed CSV both funnel into this type,
/// so the normalizer never sees which path a row travelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Trimmed text content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t)
                }
            }
            _ => None,
        }
    }

    /// Lenient numeric coercion. Parse failures and non-finite values
    /// coerce to 0.0, never NaN or infinity.
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Number(n) if n.is_finite() => *n,
            CellValue::Number(_) => 0.0,
            CellValue::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| !matches!(c, ',' | '₹' | '%'))
                    .collect();
                cleaned.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
            }
            CellValue::Null => 0.0,
        }
    }

    /// Blank cells: missing, empty/whitespace text, or the literal NaN
    /// markers pandas leaves behind in exported sheets.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Number(n) => n.is_nan(),
            CellValue::Text(s) => {
                let t = s.trim();
                t.is_empty() || t == "NaN" || t == "nan"
            }
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Number(n) => CellValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => CellValue::Text(b.to_string()),
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Column order the processing backend emits for outlet summaries. Keyed
/// rows are laid out in this order so positional parsing sees the same
/// table regardless of which path produced it.
pub const CANONICAL_COLUMN_ORDER: &[&str] = &[
    "Outlet",
    "Outlet Manager",
    "Month",
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
];

/// A freshly parsed sheet: positional rows of cells. Row 0 is usually the
/// header, but cashier ledgers bury their header a few rows down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// First row with at least one non-blank cell.
    pub fn header(&self) -> Option<&[CellValue]> {
        self.rows
            .iter()
            .find(|row| row.iter().any(|c| !c.is_blank()))
            .map(|row| row.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds a table from keyed rows (backend JSON or header-keyed CSV).
    /// The header row is synthesized from the first row's keys, canonical
    /// columns first, remaining keys in their map order.
    pub fn from_keyed_rows(rows: &[Map<String, Value>]) -> Self {
        let Some(first) = rows.first() else {
            return Self::default();
        };

        let mut header: Vec<String> = CANONICAL_COLUMN_ORDER
            .iter()
            .filter(|name| first.contains_key(**name))
            .map(|name| (*name).to_string())
            .collect();
        for key in first.keys() {
            if !header.iter().any(|h| h == key) {
                header.push(key.clone());
            }
        }

        let mut out = Vec::with_capacity(rows.len() + 1);
        out.push(header.iter().map(|h| CellValue::text(h.clone())).collect());
        for row in rows {
            out.push(
                header
                    .iter()
                    .map(|key| row.get(key).map(CellValue::from_json).unwrap_or(CellValue::Null))
                    .collect(),
            );
        }
        Self::new(out)
    }
}

/// Which of the two source layouts produced a record. Determines which
/// aggregation branch applies downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportShape {
    OutletSummary,
    CashierLedger,
}

/// Financial metrics carried by a one-row-per-outlet summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutletMetrics {
    pub direct_income: f64,
    pub total_revenue: f64,
    pub cogs: f64,
    pub outlet_expenses: f64,
    pub ebitda: f64,
    pub finance_cost: f64,
    pub pbt: f64,
    pub wastage: f64,
    pub bank_charges: f64,
    pub borrowings: f64,
    pub vehicle_loan_interest: f64,
    pub mg: f64,
}

/// Per-transaction metrics carried by cashier ledger records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerMetrics {
    pub gross_amount: f64,
    pub unit_price: f64,
    pub discount_percent: f64,
    pub gst_percent: f64,
    pub pbt: f64,
    pub ebitda: f64,
}

/// Shape-specific payload of a canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeMetrics {
    OutletSummary(OutletMetrics),
    CashierLedger(LedgerMetrics),
}

/// The unified in-memory entity every view computes over. Produced only by
/// the normalizer; treated as read-only everywhere downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub outlet: String,
    pub manager: String,
    pub period: String,
    pub metric_label: String,
    pub category: String,
    pub amount: f64,
    pub quantity: f64,
    pub percentage: f64,
    /// Provenance tag, never displayed as business data.
    pub source_filename: String,
    pub metrics: ShapeMetrics,
}

impl CanonicalRecord {
    pub fn shape(&self) -> ReportShape {
        match self.metrics {
            ShapeMetrics::OutletSummary(_) => ReportShape::OutletSummary,
            ShapeMetrics::CashierLedger(_) => ReportShape::CashierLedger,
        }
    }

    pub fn outlet_metrics(&self) -> Option<&OutletMetrics> {
        match &self.metrics {
            ShapeMetrics::OutletSummary(m) => Some(m),
            ShapeMetrics::CashierLedger(_) => None,
        }
    }

    pub fn ledger_metrics(&self) -> Option<&LedgerMetrics> {
        match &self.metrics {
            ShapeMetrics::CashierLedger(m) => Some(m),
            ShapeMetrics::OutletSummary(_) => None,
        }
    }

    /// Value of a named interest sub-component. Ledger records never
    /// populate interest fields, so they always read 0 here.
    pub fn interest(&self, kind: InterestType) -> f64 {
        match self.outlet_metrics() {
            Some(m) => match kind {
                InterestType::BankCharges => m.bank_charges,
                InterestType::Borrowings => m.borrowings,
                InterestType::VehicleLoan => m.vehicle_loan_interest,
                InterestType::Mg => m.mg,
                InterestType::FinanceCost => m.finance_cost,
            },
            None => 0.0,
        }
    }

    /// Sum of the named sub-components, excluding the aggregate
    /// Finance Cost line to avoid double counting.
    pub fn total_interest(&self) -> f64 {
        self.interest(InterestType::BankCharges)
            + self.interest(InterestType::Borrowings)
            + self.interest(InterestType::VehicleLoan)
            + self.interest(InterestType::Mg)
    }
}

/// Interest cost sub-components tracked in outlet P&L sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterestType {
    BankCharges,
    Borrowings,
    VehicleLoan,
    Mg,
    FinanceCost,
}

impl InterestType {
    pub const ALL: [InterestType; 5] = [
        InterestType::BankCharges,
        InterestType::Borrowings,
        InterestType::VehicleLoan,
        InterestType::Mg,
        InterestType::FinanceCost,
    ];

    /// Display label, matching the source-sheet line names.
    pub fn label(&self) -> &'static str {
        match self {
            InterestType::BankCharges => "01-Bank Charges",
            InterestType::Borrowings => "02-Interest on Borrowings",
            InterestType::VehicleLoan => "03-Interest on Vehicle Loan",
            InterestType::Mg => "04-MG",
            InterestType::FinanceCost => "Finance Cost",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion_never_nan() {
        assert_eq!(CellValue::text("1,234.5").as_number(), 1234.5);
        assert_eq!(CellValue::text("₹500").as_number(), 500.0);
        assert_eq!(CellValue::text("garbage").as_number(), 0.0);
        assert_eq!(CellValue::Null.as_number(), 0.0);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), 0.0);
        assert_eq!(CellValue::Number(f64::INFINITY).as_number(), 0.0);
    }

    #[test]
    fn test_blank_detection() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::text("  ").is_blank());
        assert!(CellValue::text("NaN").is_blank());
        assert!(!CellValue::text("Akshaya Nagar").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_keyed_rows_use_canonical_order() {
        let json = serde_json::json!([
            { "Month": "2024-01", "Outlet": "Jayanagar", "Outlet Manager": "Shijoy", "TOTAL REVENUE": 5000 }
        ]);
        let rows: Vec<Map<String, Value>> = serde_json::from_value(json).unwrap();
        let table = RawTable::from_keyed_rows(&rows);

        let header: Vec<&str> = table.rows[0].iter().filter_map(|c| c.as_text()).collect();
        assert_eq!(header, vec!["Outlet", "Outlet Manager", "Month", "TOTAL REVENUE"]);
        assert_eq!(table.rows[1][0], CellValue::text("Jayanagar"));
        assert_eq!(table.rows[1][3].as_number(), 5000.0);
    }

    #[test]
    fn test_interest_reads_zero_on_ledger_records() {
        let record = CanonicalRecord {
            outlet: "All Outlets".to_string(),
            manager: "Ravi".to_string(),
            period: "2024-01".to_string(),
            metric_label: "COGS".to_string(),
            category: "Financial Metric".to_string(),
            amount: 100.0,
            quantity: 1.0,
            percentage: 0.0,
            source_filename: "ledger.xlsx".to_string(),
            metrics: ShapeMetrics::CashierLedger(LedgerMetrics::default()),
        };
        assert_eq!(record.interest(InterestType::BankCharges), 0.0);
        assert_eq!(record.total_interest(), 0.0);
    }
}
