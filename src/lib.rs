//! # Outlet Analytics
//!
//! Normalization, filtering and aggregation core for multi-outlet
//! restaurant financial reports.
//!
//! ## Core Concepts
//!
//! - **Raw table**: positional rows of cells, produced by either the CSV
//!   parser or the processing backend (the two upload paths converge here)
//! - **Shape detection**: classifies a table as an outlet-based financial
//!   summary or a cashier/transaction ledger
//! - **Canonical record**: the shape-tagged entity every downstream view
//!   computes over; numeric cells coerce to 0, never NaN
//! - **Field resolver**: one alias table resolving logical fields (outlet
//!   identity, manager identity, period, ...) across both shapes
//! - **Filter + aggregate**: pure, eagerly recomputed passes parameterized
//!   per view; capping is the explicit final stage
//!
//! ## Example
//!
//! ```rust
//! use outlet_analytics::*;
//!
//! let csv = "\
//! Outlet,Outlet Manager,Month,Direct Income,TOTAL REVENUE,COGS,Outlet Expenses,EBIDTA,Finance Cost,PBT,WASTAGE
//! Akshaya Nagar,Shijoy,2024-01,1000,5000,2000,1000,1500,0,800,100
//! Koramangala,Ranjith,2024-01,2000,9000,3500,1200,2500,100,1400,150
//! ";
//!
//! let mut session = AnalyticsSession::new();
//! session.ingest_csv("outlet_pl.csv", csv).unwrap();
//!
//! let filtered = session.filtered(&FilterSpec::default().with_manager("Shijoy"));
//! let by_manager = aggregate(&filtered, LogicalField::ManagerIdentity, Metric::TotalRevenue);
//! assert_eq!(by_manager["Shijoy"].sum, 5000.0);
//! ```

pub mod aggregate;
pub mod directory;
pub mod error;
pub mod export;
pub mod fields;
pub mod filter;
pub mod normalize;
pub mod paging;
pub mod schema;
pub mod shape;
pub mod upload;

pub use aggregate::{
    aggregate, interest_breakdown, outlet_interest_comparison, ranked_by_sum, AggregateRow,
    EfficiencyClass, FinancialSummary, InterestBreakdown, Metric, OutletInterest, Reducer,
};
pub use directory::{StoreDirectory, StoreEntry};
pub use error::{AnalyticsError, Result};
pub use export::{aggregates_to_csv, records_to_csv, DEFAULT_EXPORT_FILENAME};
pub use fields::{KeyedRow, LogicalField, SEARCHABLE_FIELDS, UNKNOWN};
pub use filter::{apply_filters, AmountRange, FilterSpec};
pub use normalize::normalize;
pub use paging::{limit, paginate, Page, DEFAULT_METRICS_CAP, DEFAULT_PAGE_SIZE, DEFAULT_TABLE_CAP};
pub use schema::{
    CanonicalRecord, CellValue, InterestType, LedgerMetrics, OutletMetrics, RawTable, ReportShape,
    ShapeMetrics, CANONICAL_COLUMN_ORDER,
};
pub use shape::{classify_header, detect_shape, find_cashier_header, ShapeKind};
pub use upload::{
    parse_backend_payload, parse_csv, validate_upload, BackendResponse, MAX_UPLOAD_BYTES,
};

use log::info;

/// Dropdown options a view can offer, derived from the current records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub outlets: Vec<String>,
    pub managers: Vec<String>,
    pub periods: Vec<String>,
    pub interest_types: Vec<InterestType>,
}

/// Session state: the canonical record collection plus the store
/// directory. Records only grow (per upload); the directory is editable
/// through the admin surface. Nothing is persisted; the session is the
/// lifetime of the data.
#[derive(Debug, Default)]
pub struct AnalyticsSession {
    records: Vec<CanonicalRecord>,
    files: Vec<String>,
    directory: StoreDirectory,
}

impl AnalyticsSession {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            files: Vec::new(),
            directory: StoreDirectory::seeded(),
        }
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn directory(&self) -> &StoreDirectory {
        &self.directory
    }

    /// Admin access to the store directory.
    pub fn directory_mut(&mut self) -> &mut StoreDirectory {
        &mut self.directory
    }

    /// Uploaded filenames in ingest order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn records_for_file(&self, filename: &str) -> Vec<&CanonicalRecord> {
        self.records
            .iter()
            .filter(|r| r.source_filename == filename)
            .collect()
    }

    /// Validates, parses and ingests CSV text. Returns the number of
    /// records added.
    pub fn ingest_csv(&mut self, filename: &str, content: &str) -> Result<usize> {
        validate_upload(filename, content.len() as u64)?;
        let table = parse_csv(content)?;
        self.ingest_table(&table, filename)
    }

    /// Ingests a backend payload, or falls back to parsing `fallback_csv`
    /// locally when the backend reported failure.
    pub fn ingest_backend_or_csv(
        &mut self,
        filename: &str,
        payload: &str,
        fallback_csv: &str,
    ) -> Result<usize> {
        match parse_backend_payload(payload)? {
            Some(table) => self.ingest_table(&table, filename),
            None => self.ingest_csv(filename, fallback_csv),
        }
    }

    /// Detects the table's shape, normalizes it and appends the records.
    /// Zero produced records is an error, never a silent no-op.
    pub fn ingest_table(&mut self, table: &RawTable, filename: &str) -> Result<usize> {
        let shape = detect_shape(table)?;
        let records = normalize(table, shape, filename)?;
        if records.is_empty() {
            return Err(AnalyticsError::EmptyResult {
                filename: filename.to_string(),
                reason: "no data rows found".to_string(),
            });
        }

        let added = records.len();
        self.records.extend(records);
        if !self.files.iter().any(|f| f == filename) {
            self.files.push(filename.to_string());
        }
        info!(
            "session now holds {} records across {} files",
            self.records.len(),
            self.files.len()
        );
        Ok(added)
    }

    /// The matching subset under the given filter selection.
    pub fn filtered(&self, spec: &FilterSpec) -> Vec<CanonicalRecord> {
        apply_filters(&self.records, spec, &self.directory)
    }

    /// Dashboard headline figures for the filtered set.
    pub fn summary(&self, spec: &FilterSpec) -> FinancialSummary {
        FinancialSummary::compute(&self.filtered(spec))
    }

    /// Distinct values per filter dimension, sorted, for dropdowns.
    pub fn filter_options(&self) -> FilterOptions {
        let mut outlets: Vec<String> = self.records.iter().map(|r| r.outlet.clone()).collect();
        outlets.sort();
        outlets.dedup();

        let mut managers: Vec<String> = self.records.iter().map(|r| r.manager.clone()).collect();
        managers.sort();
        managers.dedup();

        let mut periods: Vec<String> = self.records.iter().map(|r| r.period.clone()).collect();
        periods.sort();
        periods.dedup();

        let interest_types: Vec<InterestType> = InterestType::ALL
            .into_iter()
            .filter(|kind| self.records.iter().any(|r| r.interest(*kind) > 0.0))
            .collect();

        FilterOptions {
            outlets,
            managers,
            periods,
            interest_types,
        }
    }
}
