use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use super::model::RawPlant;
use crate::error::DataSourceError;

// ---------------------------------------------------------------------------
// Required columns
// ---------------------------------------------------------------------------

const TREATMENT_TYPE: &str = "treatment_type";
const SUBREGION: &str = "Subregion";
const CAPACITY: &str = "Capacity";
const LAT: &str = "Lat";
const LON: &str = "Lon";

/// Columns kept from the source, in the order they are reported.
pub const REQUIRED_COLUMNS: [&str; 5] = [TREATMENT_TYPE, SUBREGION, CAPACITY, LAT, LON];

/// Cell contents read as "no value": pandas' default NA strings.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load plant rows from a delimited file.  Dispatch by extension.
///
/// * `.tsv` / `.tab` – tab separated
/// * anything else   – comma separated
///
/// Rows with a missing value in any required column are dropped.
pub fn load_file(path: &Path) -> Result<Vec<RawPlant>, DataSourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let delimiter = match ext.as_str() {
        "tsv" | "tab" => b'\t',
        _ => b',',
    };

    let file = File::open(path).map_err(|source| DataSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = load_reader(file, delimiter)?;
    info!("loaded {} plant rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Load plant rows from any reader holding a header row plus data rows.
pub fn load_reader<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawPlant>, DataSourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::locate(&headers)?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = record
            .position()
            .map_or(row_no + 2, |pos| pos.line() as usize);
        match columns.parse_row(&record, line)? {
            Some(row) => rows.push(row),
            None => {
                debug!("dropping line {line}: missing required value");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        info!("dropped {dropped} rows with missing values");
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Header lookup
// ---------------------------------------------------------------------------

/// Positions of the required columns within a header row.
struct ColumnIndex {
    treatment_type: usize,
    subregion: usize,
    capacity: usize,
    lat: usize,
    lon: usize,
}

impl ColumnIndex {
    fn locate(headers: &csv::StringRecord) -> Result<Self, DataSourceError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let position = |name: &str| {
            let wanted = normalize_header(name);
            normalized.iter().position(|h| *h == wanted)
        };

        let found: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| position(*c)).collect();
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .zip(&found)
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(DataSourceError::MissingColumn { columns: missing });
        }

        let at = |i: usize| found[i].unwrap_or_default();
        Ok(ColumnIndex {
            treatment_type: at(0),
            subregion: at(1),
            capacity: at(2),
            lat: at(3),
            lon: at(4),
        })
    }

    /// `Ok(None)` when a required cell is missing.
    fn parse_row(
        &self,
        record: &csv::StringRecord,
        line: usize,
    ) -> Result<Option<RawPlant>, DataSourceError> {
        let cell = |idx: usize| record.get(idx).map(str::trim).filter(|v| !is_missing(v));

        let (Some(treatment_type), Some(subregion), Some(capacity), Some(lat), Some(lon)) = (
            cell(self.treatment_type),
            cell(self.subregion),
            cell(self.capacity),
            cell(self.lat),
            cell(self.lon),
        ) else {
            return Ok(None);
        };

        let capacity = parse_number(capacity, line, CAPACITY)?;
        if capacity < 0.0 {
            return Err(DataSourceError::NegativeCapacity {
                line,
                value: capacity,
            });
        }

        Ok(Some(RawPlant {
            treatment_type: treatment_type.to_string(),
            subregion: subregion.to_string(),
            capacity,
            lat: parse_number(lat, line, LAT)?,
            lon: parse_number(lon, line, LON)?,
        }))
    }
}

/// `" Capacity "`, `"capacity"` and `"CAPACITY"` all match; so do
/// `treatment_type`, `Treatment Type` and `treatment-type`.
fn normalize_header(h: &str) -> String {
    h.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

/// `inf`, `NAN` and friends parse as `f64` but are not usable values.
fn parse_number(value: &str, line: usize, column: &'static str) -> Result<f64, DataSourceError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DataSourceError::InvalidNumber {
            line,
            column,
            value: value.to_string(),
        }),
    }
}
