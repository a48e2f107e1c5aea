use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid upload '{filename}': {reason}")]
    FileValidation { filename: String, reason: String },

    #[error("Could not recognize the report layout: {0}. Check that the file has the required columns (Outlet/Outlet Manager for outlet summaries, or Product Name/Quantity/Total Amount for ledgers)")]
    ShapeDetection(String),

    #[error("Could not identify cashier names in the financial report: {0}")]
    CashierNameExtraction(String),

    #[error("File '{filename}' was recognized but produced no records: {reason}")]
    EmptyResult { filename: String, reason: String },

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
