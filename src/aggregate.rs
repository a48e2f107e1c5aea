//! Groups filtered records and reduces numeric fields into summary rows.
//! Every view (dashboard KPIs, charts, tables, interest analysis) converges
//! on this one grouping contract instead of re-deriving its own reduce.

use crate::fields::LogicalField;
use crate::schema::{CanonicalRecord, InterestType, ReportShape};
use serde::Serialize;
use std::collections::BTreeMap;

/// How a group's raw values collapse into the reported figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Average,
    Count,
}

/// A numeric field to reduce over. Outlet-summary records read the
/// dedicated column; cashier-ledger records fall back to substring
/// matching on the metric label, which is the only signal that shape
/// carries. Both EBITDA spellings map to the same metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Amount,
    Quantity,
    DirectIncome,
    TotalRevenue,
    Cogs,
    OutletExpenses,
    Ebitda,
    FinanceCost,
    Pbt,
    Wastage,
    GrossAmount,
    Interest(InterestType),
    TotalInterest,
}

impl Metric {
    pub fn of(&self, record: &CanonicalRecord) -> f64 {
        match self {
            Metric::Amount => record.amount,
            Metric::Quantity => record.quantity,
            Metric::Interest(kind) => record.interest(*kind),
            Metric::TotalInterest => record.total_interest(),
            Metric::GrossAmount => match record.ledger_metrics() {
                Some(m) => m.gross_amount,
                None => record.amount,
            },
            _ => match record.shape() {
                ReportShape::OutletSummary => self.outlet_column(record),
                ReportShape::CashierLedger => self.ledger_fallback(record),
            },
        }
    }

    fn outlet_column(&self, record: &CanonicalRecord) -> f64 {
        let Some(m) = record.outlet_metrics() else {
            return 0.0;
        };
        match self {
            Metric::DirectIncome => m.direct_income,
            Metric::TotalRevenue => m.total_revenue,
            Metric::Cogs => m.cogs,
            Metric::OutletExpenses => m.outlet_expenses,
            Metric::Ebitda => m.ebitda,
            Metric::FinanceCost => m.finance_cost,
            Metric::Pbt => m.pbt,
            Metric::Wastage => m.wastage,
            _ => 0.0,
        }
    }

    /// Ledger rows carry their metric as a labelled line item; the amount
    /// counts toward a metric only when the label names it.
    fn ledger_fallback(&self, record: &CanonicalRecord) -> f64 {
        let label = record.metric_label.to_lowercase();
        let matched = match self {
            Metric::DirectIncome => label.contains("direct income"),
            Metric::TotalRevenue => label.contains("total revenue"),
            Metric::Cogs => label.contains("cogs"),
            Metric::OutletExpenses => label.contains("outlet expenses"),
            Metric::Ebitda => label.contains("ebitda") || label.contains("ebidta"),
            Metric::FinanceCost => label.contains("finance cost"),
            Metric::Pbt => label.contains("pbt"),
            Metric::Wastage => label.contains("wastage"),
            _ => false,
        };
        if matched {
            record.amount
        } else {
            0.0
        }
    }
}

/// One reduced group. Never mutated after aggregation; views recompute
/// from scratch on every filter change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub sum: f64,
    pub count: usize,
    pub average: f64,
}

impl AggregateRow {
    pub fn value(&self, reducer: Reducer) -> f64 {
        match reducer {
            Reducer::Sum => self.sum,
            Reducer::Average => self.average,
            Reducer::Count => self.count as f64,
        }
    }
}

/// Groups records by the resolved `group_by` field and reduces `metric`
/// within each group. The returned map carries no presentation order;
/// sorting is the caller's concern (see [`ranked_by_sum`]).
pub fn aggregate(
    records: &[CanonicalRecord],
    group_by: LogicalField,
    metric: Metric,
) -> BTreeMap<String, AggregateRow> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for record in records {
        let key = record.text(group_by).to_string();
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += metric.of(record);
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| {
            (
                key,
                AggregateRow {
                    sum,
                    count,
                    average: average_per_group(sum, count),
                },
            )
        })
        .collect()
}

/// Caller-side sorting helper for revenue-ranked views: descending by sum,
/// ties broken by key for determinism.
pub fn ranked_by_sum(rows: &BTreeMap<String, AggregateRow>) -> Vec<(&str, &AggregateRow)> {
    let mut out: Vec<(&str, &AggregateRow)> =
        rows.iter().map(|(k, v)| (k.as_str(), v)).collect();
    out.sort_by(|a, b| b.1.sum.total_cmp(&a.1.sum).then_with(|| a.0.cmp(b.0)));
    out
}

fn share_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole) * 100.0
    } else {
        0.0
    }
}

pub fn profit_margin(pbt: f64, total_revenue: f64) -> f64 {
    share_of(pbt, total_revenue)
}

pub fn interest_rate(total_interest: f64, total_revenue: f64) -> f64 {
    share_of(total_interest, total_revenue)
}

pub fn wastage_rate(wastage: f64, total_revenue: f64) -> f64 {
    share_of(wastage, total_revenue)
}

pub fn average_per_group(sum: f64, count: usize) -> f64 {
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

/// Four-tier qualitative label derived from interest rate. Boundaries are
/// lower-inclusive: exactly 5.0 is Good, not Excellent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EfficiencyClass {
    Excellent,
    Good,
    Average,
    Poor,
}

impl EfficiencyClass {
    pub fn from_interest_rate(rate: f64) -> Self {
        if rate < 5.0 {
            EfficiencyClass::Excellent
        } else if rate < 10.0 {
            EfficiencyClass::Good
        } else if rate < 15.0 {
            EfficiencyClass::Average
        } else {
            EfficiencyClass::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EfficiencyClass::Excellent => "Excellent",
            EfficiencyClass::Good => "Good",
            EfficiencyClass::Average => "Average",
            EfficiencyClass::Poor => "Poor",
        }
    }
}

impl std::fmt::Display for EfficiencyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Dashboard headline figures over a (filtered, capped) record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub direct_income: f64,
    pub total_revenue: f64,
    pub cogs: f64,
    pub outlet_expenses: f64,
    pub ebitda: f64,
    pub pbt: f64,
    pub wastage: f64,
    pub profit_margin: f64,
    pub active_managers: usize,
    pub top_manager: Option<String>,
    pub average_outlet_income: f64,
}

impl FinancialSummary {
    pub fn compute(records: &[CanonicalRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let sum = |metric: Metric| records.iter().map(|r| metric.of(r)).sum::<f64>();
        let total_revenue = sum(Metric::TotalRevenue);
        let pbt = sum(Metric::Pbt);

        let by_manager = aggregate(records, LogicalField::ManagerIdentity, Metric::Amount);
        let top_manager = ranked_by_sum(&by_manager)
            .first()
            .filter(|(_, row)| row.sum > 0.0)
            .map(|(name, _)| name.to_string());

        let by_outlet = aggregate(records, LogicalField::OutletIdentity, Metric::Amount);

        Self {
            direct_income: sum(Metric::DirectIncome),
            total_revenue,
            cogs: sum(Metric::Cogs),
            outlet_expenses: sum(Metric::OutletExpenses),
            ebitda: sum(Metric::Ebitda),
            pbt,
            wastage: sum(Metric::Wastage),
            profit_margin: profit_margin(pbt, total_revenue),
            active_managers: by_manager.len(),
            top_manager,
            average_outlet_income: average_per_group(total_revenue, by_outlet.len()),
        }
    }
}

/// Interest cost totals for one sub-component across a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterestBreakdown {
    pub interest_type: InterestType,
    pub total_amount: f64,
    pub outlet_count: usize,
    pub share_pct: f64,
}

/// Breakdown by interest type; when `only` is set the analysis is limited
/// to that single type (its share is then 100% or 0%).
pub fn interest_breakdown(
    records: &[CanonicalRecord],
    only: Option<InterestType>,
) -> Vec<InterestBreakdown> {
    let kinds: Vec<InterestType> = match only {
        Some(kind) => vec![kind],
        None => InterestType::ALL.to_vec(),
    };

    let mut rows: Vec<InterestBreakdown> = kinds
        .into_iter()
        .map(|kind| {
            let total_amount: f64 = records.iter().map(|r| r.interest(kind)).sum();
            let outlet_count = records.iter().filter(|r| r.interest(kind) > 0.0).count();
            InterestBreakdown {
                interest_type: kind,
                total_amount,
                outlet_count,
                share_pct: 0.0,
            }
        })
        .collect();

    let grand_total: f64 = rows.iter().map(|r| r.total_amount).sum();
    for row in &mut rows {
        row.share_pct = share_of(row.total_amount, grand_total);
    }
    rows
}

/// Per-outlet interest position, ready for efficiency ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletInterest {
    pub outlet: String,
    pub manager: String,
    pub total_interest: f64,
    pub revenue: f64,
    pub interest_rate: f64,
    pub efficiency: EfficiencyClass,
}

/// One row per record carrying any interest cost, with the derived rate
/// against that record's revenue. Zero-interest records are dropped.
pub fn outlet_interest_comparison(records: &[CanonicalRecord]) -> Vec<OutletInterest> {
    records
        .iter()
        .filter_map(|record| {
            let total_interest = record.total_interest();
            if total_interest <= 0.0 {
                return None;
            }
            let revenue = Metric::TotalRevenue.of(record);
            let rate = interest_rate(total_interest, revenue);
            Some(OutletInterest {
                outlet: record.outlet.clone(),
                manager: record.manager.clone(),
                total_interest,
                revenue,
                interest_rate: rate,
                efficiency: EfficiencyClass::from_interest_rate(rate),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LedgerMetrics, OutletMetrics, ShapeMetrics};

    fn outlet_record(outlet: &str, manager: &str, metrics: OutletMetrics) -> CanonicalRecord {
        let amount = metrics.total_revenue;
        CanonicalRecord {
            outlet: outlet.to_string(),
            manager: manager.to_string(),
            period: "2024-01".to_string(),
            metric_label: "Outlet Summary".to_string(),
            category: "Financial Summary".to_string(),
            amount,
            quantity: 1.0,
            percentage: 0.0,
            source_filename: "pl.xlsx".to_string(),
            metrics: ShapeMetrics::OutletSummary(metrics),
        }
    }

    fn ledger_record(manager: &str, label: &str, amount: f64) -> CanonicalRecord {
        CanonicalRecord {
            outlet: "All Outlets".to_string(),
            manager: manager.to_string(),
            period: "2024-01-01".to_string(),
            metric_label: label.to_string(),
            category: "Financial Metric".to_string(),
            amount,
            quantity: 1.0,
            percentage: 0.0,
            source_filename: "grid.xlsx".to_string(),
            metrics: ShapeMetrics::CashierLedger(LedgerMetrics::default()),
        }
    }

    #[test]
    fn test_sum_by_manager_scenario() {
        let records = vec![outlet_record(
            "Akshaya Nagar",
            "Shijoy",
            OutletMetrics {
                direct_income: 1000.0,
                total_revenue: 5000.0,
                cogs: 2000.0,
                outlet_expenses: 1000.0,
                ebitda: 1500.0,
                pbt: 800.0,
                wastage: 100.0,
                ..OutletMetrics::default()
            },
        )];

        let rows = aggregate(&records, LogicalField::ManagerIdentity, Metric::TotalRevenue);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows["Shijoy"].sum, 5000.0);
        assert_eq!(rows["Shijoy"].count, 1);
        assert_eq!(rows["Shijoy"].value(Reducer::Average), 5000.0);
        assert_eq!(rows["Shijoy"].value(Reducer::Count), 1.0);
    }

    #[test]
    fn test_ledger_metric_fallback_by_label() {
        let records = vec![
            ledger_record("Ravi", "TOTAL REVENUE", 400.0),
            ledger_record("Ravi", "COGS", 150.0),
            ledger_record("Anita", "Total Revenue (net)", 300.0),
            ledger_record("Anita", "EBIDTA", 90.0),
        ];

        let revenue: f64 = records.iter().map(|r| Metric::TotalRevenue.of(r)).sum();
        assert_eq!(revenue, 700.0);
        let cogs: f64 = records.iter().map(|r| Metric::Cogs.of(r)).sum();
        assert_eq!(cogs, 150.0);
        let ebitda: f64 = records.iter().map(|r| Metric::Ebitda.of(r)).sum();
        assert_eq!(ebitda, 90.0);
    }

    #[test]
    fn test_ranked_by_sum_descending() {
        let records = vec![
            outlet_record("A", "M1", OutletMetrics { total_revenue: 100.0, ..Default::default() }),
            outlet_record("B", "M2", OutletMetrics { total_revenue: 900.0, ..Default::default() }),
            outlet_record("C", "M3", OutletMetrics { total_revenue: 500.0, ..Default::default() }),
        ];
        let rows = aggregate(&records, LogicalField::OutletIdentity, Metric::TotalRevenue);
        let ranked = ranked_by_sum(&rows);
        let keys: Vec<&str> = ranked.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_derived_metric_safety_on_zero_revenue() {
        assert_eq!(profit_margin(500.0, 0.0), 0.0);
        assert_eq!(interest_rate(500.0, 0.0), 0.0);
        assert_eq!(wastage_rate(500.0, 0.0), 0.0);
        assert_eq!(average_per_group(0.0, 0), 0.0);
        assert!(profit_margin(250.0, 1000.0) == 25.0);
    }

    #[test]
    fn test_efficiency_class_boundaries() {
        assert_eq!(EfficiencyClass::from_interest_rate(4.999), EfficiencyClass::Excellent);
        assert_eq!(EfficiencyClass::from_interest_rate(5.0), EfficiencyClass::Good);
        assert_eq!(EfficiencyClass::from_interest_rate(9.999), EfficiencyClass::Good);
        assert_eq!(EfficiencyClass::from_interest_rate(10.0), EfficiencyClass::Average);
        assert_eq!(EfficiencyClass::from_interest_rate(15.0), EfficiencyClass::Poor);
    }

    #[test]
    fn test_financial_summary() {
        let records = vec![
            outlet_record(
                "Akshaya Nagar",
                "Shijoy",
                OutletMetrics { total_revenue: 5000.0, pbt: 800.0, ..Default::default() },
            ),
            outlet_record(
                "Koramangala",
                "Ranjith",
                OutletMetrics { total_revenue: 9000.0, pbt: 1200.0, ..Default::default() },
            ),
        ];

        let summary = FinancialSummary::compute(&records);
        assert_eq!(summary.total_revenue, 14000.0);
        assert_eq!(summary.pbt, 2000.0);
        assert_eq!(summary.active_managers, 2);
        assert_eq!(summary.top_manager.as_deref(), Some("Ranjith"));
        assert_eq!(summary.average_outlet_income, 7000.0);
        assert!((summary.profit_margin - 2000.0 / 14000.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_interest_breakdown_shares() {
        let records = vec![
            outlet_record(
                "A",
                "M",
                OutletMetrics { total_revenue: 1000.0, bank_charges: 300.0, borrowings: 100.0, ..Default::default() },
            ),
            outlet_record(
                "B",
                "M",
                OutletMetrics { total_revenue: 1000.0, bank_charges: 100.0, ..Default::default() },
            ),
        ];

        let rows = interest_breakdown(&records, None);
        let bank = rows
            .iter()
            .find(|r| r.interest_type == InterestType::BankCharges)
            .unwrap();
        assert_eq!(bank.total_amount, 400.0);
        assert_eq!(bank.outlet_count, 2);
        assert_eq!(bank.share_pct, 80.0);

        let only = interest_breakdown(&records, Some(InterestType::Borrowings));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].share_pct, 100.0);
    }

    #[test]
    fn test_outlet_interest_comparison() {
        let records = vec![
            outlet_record(
                "A",
                "M",
                OutletMetrics { total_revenue: 10000.0, bank_charges: 400.0, ..Default::default() },
            ),
            outlet_record("B", "M", OutletMetrics { total_revenue: 5000.0, ..Default::default() }),
        ];

        let rows = outlet_interest_comparison(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].outlet, "A");
        assert_eq!(rows[0].interest_rate, 4.0);
        assert_eq!(rows[0].efficiency, EfficiencyClass::Excellent);
    }
}
