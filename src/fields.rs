//! The field resolver: the single place where source-column alias chains
//! are defined. Every component that needs "the outlet of this row" or
//! "the amount of this row" goes through here, whether it is looking at a
//! raw keyed row during normalization or a canonical record afterwards.

use crate::schema::{CanonicalRecord, CellValue};

/// Fallback identity for genuinely blank source cells.
pub const UNKNOWN: &str = "Unknown";

/// Shape-agnostic semantic field names, resolved to shape-specific source
/// columns via alias priority lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    OutletIdentity,
    ManagerIdentity,
    Period,
    MetricLabel,
    Category,
    Amount,
    Quantity,
}

impl LogicalField {
    /// Source-column aliases in fixed priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LogicalField::OutletIdentity => &["Outlet", "Outlet Name", "Branch", "Store Name"],
            LogicalField::ManagerIdentity => {
                &["Outlet Manager", "Cluster Manager", "Cashier", "Cashier Name"]
            }
            // "Date" is handled separately: its first 7 characters form the period.
            LogicalField::Period => &["Month"],
            LogicalField::MetricLabel => &["Product Name", "Item Name"],
            LogicalField::Category => &["Category"],
            LogicalField::Amount => &["Total Amount (₹)", "Total Sales", "TOTAL REVENUE"],
            LogicalField::Quantity => &["Quantity", "Qty"],
        }
    }
}

/// Logical fields covered by the free-text search predicate.
pub const SEARCHABLE_FIELDS: [LogicalField; 5] = [
    LogicalField::OutletIdentity,
    LogicalField::ManagerIdentity,
    LogicalField::Category,
    LogicalField::MetricLabel,
    LogicalField::Period,
];

/// A data row paired with its header, giving alias-based access to cells
/// during normalization.
#[derive(Debug, Clone, Copy)]
pub struct KeyedRow<'a> {
    header: &'a [CellValue],
    cells: &'a [CellValue],
}

impl<'a> KeyedRow<'a> {
    pub fn new(header: &'a [CellValue], cells: &'a [CellValue]) -> Self {
        Self { header, cells }
    }

    /// Cell under the given column label, matched on trimmed text. Case
    /// does not matter, consistent with header-based shape detection.
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        let idx = self
            .header
            .iter()
            .position(|cell| cell.as_text().is_some_and(|t| t.eq_ignore_ascii_case(column)))?;
        self.cells.get(idx)
    }

    /// First non-blank value among the field's aliases.
    pub fn resolve_text(&self, field: LogicalField) -> Option<String> {
        for alias in field.aliases() {
            if let Some(cell) = self.get(alias) {
                if !cell.is_blank() {
                    if let Some(text) = cell.as_text() {
                        return Some(text.to_string());
                    }
                    // Numeric months and the like still count as present.
                    return Some(trim_number(cell.as_number()));
                }
            }
        }
        if field == LogicalField::Period {
            // Fall back to the first 7 characters of a full date (YYYY-MM).
            if let Some(date) = self.get("Date").and_then(|c| c.as_text()) {
                let prefix: String = date.chars().take(7).collect();
                if !prefix.is_empty() {
                    return Some(prefix);
                }
            }
        }
        None
    }

    pub fn resolve_text_or(&self, field: LogicalField, fallback: &str) -> String {
        self.resolve_text(field).unwrap_or_else(|| fallback.to_string())
    }

    /// First non-blank numeric value among the aliases; 0.0 when absent.
    pub fn resolve_number(&self, field: LogicalField) -> f64 {
        for alias in field.aliases() {
            if let Some(cell) = self.get(alias) {
                if !cell.is_blank() {
                    return cell.as_number();
                }
            }
        }
        0.0
    }

    /// Whether the header satisfies at least one alias of the field.
    pub fn header_has(header: &[CellValue], field: LogicalField) -> bool {
        field.aliases().iter().any(|alias| {
            header
                .iter()
                .any(|cell| cell.as_text().is_some_and(|t| t.eq_ignore_ascii_case(alias)))
        })
    }
}

fn trim_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl CanonicalRecord {
    /// Resolved text value of a logical field. Identity fields fall back to
    /// `"Unknown"`; the normalizer guarantees they are already non-empty.
    pub fn text(&self, field: LogicalField) -> &str {
        let value = match field {
            LogicalField::OutletIdentity => &self.outlet,
            LogicalField::ManagerIdentity => &self.manager,
            LogicalField::Period => &self.period,
            LogicalField::MetricLabel => &self.metric_label,
            LogicalField::Category => &self.category,
            LogicalField::Amount | LogicalField::Quantity => return "",
        };
        if value.is_empty() {
            UNKNOWN
        } else {
            value
        }
    }

    /// Resolved numeric value of a logical field; 0.0 for text fields.
    pub fn number(&self, field: LogicalField) -> f64 {
        match field {
            LogicalField::Amount => self.amount,
            LogicalField::Quantity => self.quantity,
            _ => 0.0,
        }
    }
}
