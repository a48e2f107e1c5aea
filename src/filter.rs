//! Composes independent predicates over the canonical record collection.
//! A record passes iff it satisfies every constrained dimension; predicate
//! order never affects the result.

use crate::directory::StoreDirectory;
use crate::fields::{LogicalField, SEARCHABLE_FIELDS};
use crate::schema::{CanonicalRecord, InterestType};

/// Optional numeric bounds on the record amount. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmountRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AmountRange {
    pub fn contains(&self, amount: f64) -> bool {
        self.min.is_none_or(|min| amount >= min) && self.max.is_none_or(|max| amount <= max)
    }
}

/// Active filter selection for one view. `None` on a dimension means no
/// constraint (the UI's "all" sentinel).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub outlet: Option<String>,
    pub manager: Option<String>,
    pub period: Option<String>,
    pub category: Option<String>,
    pub interest_type: Option<InterestType>,
    pub amount_range: AmountRange,
    pub search: Option<String>,
}

impl FilterSpec {
    /// Maps the UI sentinel "all" (or blank) to an unconstrained dimension.
    pub fn selection(value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn with_outlet(mut self, value: &str) -> Self {
        self.outlet = Self::selection(value);
        self
    }

    pub fn with_manager(mut self, value: &str) -> Self {
        self.manager = Self::selection(value);
        self
    }

    pub fn with_period(mut self, value: &str) -> Self {
        self.period = Self::selection(value);
        self
    }

    pub fn with_category(mut self, value: &str) -> Self {
        self.category = Self::selection(value);
        self
    }

    pub fn with_interest_type(mut self, value: InterestType) -> Self {
        self.interest_type = Some(value);
        self
    }

    pub fn with_amount_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.amount_range = AmountRange { min, max };
        self
    }

    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self
    }

    /// Whether a single record satisfies every constrained dimension.
    /// Short-circuits on the first failing predicate.
    pub fn matches(&self, record: &CanonicalRecord, directory: &StoreDirectory) -> bool {
        if let Some(outlet) = &self.outlet {
            if record.text(LogicalField::OutletIdentity) != outlet {
                return false;
            }
        }
        if let Some(manager) = &self.manager {
            if record.text(LogicalField::ManagerIdentity) != manager {
                return false;
            }
        }
        if let Some(period) = &self.period {
            if record.text(LogicalField::Period) != period {
                return false;
            }
        }
        if let Some(category) = &self.category {
            // Category is indirect: the outlet's directory entry decides.
            let outlet = record.text(LogicalField::OutletIdentity);
            if directory.category_of(outlet) != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(kind) = self.interest_type {
            // Also an implicit shape filter: ledger records never carry
            // interest sub-fields, so they read 0 and fail here.
            if record.interest(kind) <= 0.0 {
                return false;
            }
        }
        if !self.amount_range.contains(record.amount) {
            return false;
        }
        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            let hit = SEARCHABLE_FIELDS
                .iter()
                .any(|field| record.text(*field).to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// The matching subset of `records`, in input order. Pure and deterministic
/// for identical `(records, spec)` input.
pub fn apply_filters(
    records: &[CanonicalRecord],
    spec: &FilterSpec,
    directory: &StoreDirectory,
) -> Vec<CanonicalRecord> {
    records
        .iter()
        .filter(|r| spec.matches(r, directory))
        .cloned()
        .collect()
}
