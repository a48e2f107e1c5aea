//! The input boundary: upload validation, CSV text parsing and the
//! optional processing-backend payload. Both paths produce the same
//! [`RawTable`], so normalization never knows which one ran.

use crate::error::{AnalyticsError, Result};
use crate::schema::{CellValue, RawTable};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Uploads above this size are rejected outright.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const VALID_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Rejects wrong extensions and oversized files before any parsing starts,
/// leaving session state untouched.
pub fn validate_upload(filename: &str, size_bytes: u64) -> Result<()> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !VALID_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AnalyticsError::FileValidation {
            filename: filename.to_string(),
            reason: "please upload a CSV or Excel file".to_string(),
        });
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(AnalyticsError::FileValidation {
            filename: filename.to_string(),
            reason: "file size must be less than 10MB".to_string(),
        });
    }
    Ok(())
}

/// Parses delimited text into a raw table. Cells are trimmed and stripped
/// of stray quote characters; malformed lines are logged and skipped, never
/// fatal to the whole upload.
pub fn parse_csv(content: &str) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut malformed = 0usize;
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(err) => {
                malformed += 1;
                debug!("skipping malformed CSV line: {err}");
                continue;
            }
        };
        rows.push(record.iter().map(clean_cell).collect());
    }
    if malformed > 0 {
        warn!("{malformed} malformed CSV lines skipped");
    }
    Ok(RawTable::new(rows))
}

fn clean_cell(raw: &str) -> CellValue {
    let cleaned: String = raw.chars().filter(|c| *c != '"' && *c != '\'').collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        CellValue::Null
    } else {
        CellValue::text(trimmed)
    }
}

/// Response envelope of the optional processing backend.
#[derive(Debug, Deserialize)]
pub struct BackendResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Decodes a backend payload. `Ok(None)` signals an unsuccessful response;
/// the caller is expected to fall back to local parsing.
pub fn parse_backend_payload(json: &str) -> Result<Option<RawTable>> {
    let response: BackendResponse = serde_json::from_str(json)?;
    if !response.success {
        warn!(
            "backend processing failed, falling back to local parsing: {}",
            response.error.as_deref().unwrap_or("no error detail")
        );
        return Ok(None);
    }
    if let Some(message) = &response.message {
        debug!("backend message: {message}");
    }
    Ok(Some(RawTable::from_keyed_rows(&response.data)))
}
